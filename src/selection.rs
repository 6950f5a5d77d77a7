// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Selection algebra over the package graph
//!
//! A selection expression is a list of tokens applied left to right:
//!
//! | Token       | Effect                                                     |
//! |-------------|------------------------------------------------------------|
//! | `+`         | following tokens select (the initial mode)                 |
//! | `-`         | following tokens deselect                                  |
//! | `pkg`       | exactly `pkg`                                              |
//! | `pkg:`      | `pkg` and everything that transitively depends on it       |
//! | `:pkg`      | `pkg` and everything it transitively requires              |
//! | `from:to`   | every package on a dependency path from `from` down to `to`|
//!
//! The last token touching a package decides whether it is selected. The
//! result always follows the index's definition order.

use crate::error::Result;
use crate::graph::PackageIndex;
use crate::types::PackageDefinition;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Ordered, deduplicated set of packages chosen for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection<'a> {
    packages: Vec<&'a PackageDefinition>,
}

impl<'a> Selection<'a> {
    /// Selected packages in definition order
    #[must_use]
    pub fn packages(&self) -> &[&'a PackageDefinition] {
        &self.packages
    }

    /// Iterate over the selected packages
    pub fn iter(&self) -> impl Iterator<Item = &'a PackageDefinition> + '_ {
        self.packages.iter().copied()
    }

    /// Names of the selected packages
    #[must_use]
    pub fn names(&self) -> Vec<&'a str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    /// Number of selected packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if nothing was selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Evaluate a selection expression against the package index
pub fn resolve_selection<'a, S: AsRef<str>>(
    index: &'a PackageIndex,
    tokens: &[S],
) -> Result<Selection<'a>> {
    let mut selected = vec![false; index.len()];
    let mut include = true;

    for token in tokens {
        let token = token.as_ref();
        match token {
            "+" => include = true,
            "-" => include = false,
            _ => match token.split_once(':') {
                None => selected[index.position(token)?] = include,
                Some(("", "")) => debug!("Skipping empty range"),
                Some((from, "")) => {
                    for pos in index.dependent_closure(index.position(from)?) {
                        selected[pos] = include;
                    }
                }
                Some(("", to)) => {
                    for pos in index.required_closure(index.position(to)?) {
                        selected[pos] = include;
                    }
                }
                Some((from, to)) => {
                    let from = index.position(from)?;
                    let cone: HashSet<usize> =
                        index.required_closure(index.position(to)?).into_iter().collect();
                    for pos in index.dependent_closure(from) {
                        if cone.contains(&pos) {
                            selected[pos] = include;
                        }
                    }
                }
            },
        }
        trace!("Applied {:?} (include: {})", token, include);
    }

    let packages: Vec<_> = selected
        .iter()
        .enumerate()
        .filter(|&(_, &on)| on)
        .map(|(pos, _)| index.at(pos))
        .collect();

    debug!("Selected {} of {} packages", packages.len(), index.len());

    Ok(Selection { packages })
}
