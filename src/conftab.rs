// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Conftab: configure options for the workspace and for each package
//!
//! ```text
//! --prefix=/opt/stage        <- global section
//!
//! [zlib]
//! --enable-static            <- options for zlib only
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// One section of the conftab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConftabSection {
    /// Package name; empty for the global section
    pub pkg_name: String,
    /// Section text, every line newline-terminated
    pub definition: String,
}

/// Parsed conftab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conftab {
    /// Text before the first package header
    pub global_section: ConftabSection,
    /// Package sections in file order
    pub package_sections: Vec<ConftabSection>,
}

fn section_header(line: &str) -> Option<&str> {
    let name = line.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    (!name.is_empty()).then_some(name)
}

fn option_lines(definition: &str) -> impl Iterator<Item = String> + '_ {
    definition
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
}

impl Conftab {
    /// Parse conftab text
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut conftab = Self::default();

        for line in text.lines() {
            if let Some(name) = section_header(line) {
                conftab.package_sections.push(ConftabSection {
                    pkg_name: name.to_string(),
                    definition: String::new(),
                });
                continue;
            }
            let current = conftab
                .package_sections
                .last_mut()
                .unwrap_or(&mut conftab.global_section);
            current.definition.push_str(line);
            current.definition.push('\n');
        }

        conftab
    }

    /// Read a conftab file; a missing file is an empty conftab
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::fs(path, err)),
        }
    }

    /// Get a package section
    #[must_use]
    pub fn section(&self, pkg_name: &str) -> Option<&ConftabSection> {
        self.package_sections.iter().find(|s| s.pkg_name == pkg_name)
    }

    /// Conftab for a new selection: the global section, existing sections
    /// of selected packages, and empty sections for the rest, in selection
    /// order.
    #[must_use]
    pub fn retain_selection(&self, selection: &[&str]) -> Self {
        Self {
            global_section: self.global_section.clone(),
            package_sections: selection
                .iter()
                .map(|&name| {
                    self.section(name).cloned().unwrap_or_else(|| ConftabSection {
                        pkg_name: name.to_string(),
                        definition: String::new(),
                    })
                })
                .collect(),
        }
    }

    /// Arguments for a package's configure script: global options followed
    /// by the package's own, one per non-comment line
    #[must_use]
    pub fn configure_args(&self, pkg_name: &str) -> Vec<String> {
        let mut args: Vec<String> = option_lines(&self.global_section.definition).collect();
        if let Some(section) = self.section(pkg_name) {
            args.extend(option_lines(&section.definition));
        }
        args
    }
}
