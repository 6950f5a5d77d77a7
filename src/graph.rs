// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Package dependency graph with petgraph backing for traversals

use crate::error::{Error, Result};
use crate::types::PackageDefinition;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use std::collections::HashMap;

/// All known packages in definition order, plus a name lookup.
///
/// Edges point from a package to each package it requires, so a forward
/// walk yields the required closure and a reversed walk yields the
/// dependent closure. Node `i` of the graph is package `i`.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    graph: DiGraph<(), ()>,
    packages: Vec<PackageDefinition>,
    positions: HashMap<String, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

impl PackageIndex {
    /// Build an index that keeps the given order.
    ///
    /// The `dependent` list of every package is recomputed from the
    /// `required` lists of the others.
    pub fn new(mut packages: Vec<PackageDefinition>) -> Result<Self> {
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (pos, package) in packages.iter().enumerate() {
            if let Some(&first) = positions.get(&package.name) {
                return Err(Error::DuplicatePackage {
                    name: package.name.clone(),
                    first: packages[first].pathname.clone(),
                    second: package.pathname.clone(),
                });
            }
            positions.insert(package.name.clone(), pos);
        }

        let mut graph = DiGraph::with_capacity(packages.len(), 0);
        for _ in &packages {
            graph.add_node(());
        }

        let mut edges = Vec::new();
        for (pos, package) in packages.iter().enumerate() {
            for required in &package.required {
                let target = positions.get(required).copied().ok_or_else(|| {
                    Error::MissingDependency {
                        package: package.name.clone(),
                        required: required.clone(),
                    }
                })?;
                edges.push((pos, target));
            }
        }

        for package in &mut packages {
            package.dependent.clear();
        }
        for &(from, to) in &edges {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
            let dependent = packages[from].name.clone();
            packages[to].dependent.push(dependent);
        }

        Ok(Self {
            graph,
            packages,
            positions,
        })
    }

    /// Build an index ordered so that every package follows the packages
    /// it requires. Ties keep the given order.
    pub fn sorted(packages: Vec<PackageDefinition>) -> Result<Self> {
        let unordered = Self::new(packages)?;

        let mut marks = vec![Mark::New; unordered.len()];
        let mut order = Vec::with_capacity(unordered.len());
        for pos in 0..unordered.len() {
            unordered.visit(pos, &mut marks, &mut order)?;
        }

        let mut slots: Vec<Option<PackageDefinition>> =
            unordered.packages.into_iter().map(Some).collect();
        let reordered = order
            .into_iter()
            .filter_map(|pos| slots[pos].take())
            .collect();

        Self::new(reordered)
    }

    fn visit(&self, pos: usize, marks: &mut [Mark], order: &mut Vec<usize>) -> Result<()> {
        match marks[pos] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                return Err(Error::CircularDependency(self.packages[pos].name.clone()));
            }
            Mark::New => {}
        }

        marks[pos] = Mark::Active;
        for required in &self.packages[pos].required {
            self.visit(self.positions[required], marks, order)?;
        }
        marks[pos] = Mark::Done;
        order.push(pos);

        Ok(())
    }

    /// Number of packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// All packages in definition order
    #[must_use]
    pub fn packages(&self) -> &[PackageDefinition] {
        &self.packages
    }

    /// Get a package by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageDefinition> {
        self.positions.get(name).map(|&pos| &self.packages[pos])
    }

    /// Get the package at a definition-order position
    #[must_use]
    pub fn at(&self, pos: usize) -> &PackageDefinition {
        &self.packages[pos]
    }

    /// Definition-order position of a package
    pub fn position(&self, name: &str) -> Result<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownPackage(name.to_string()))
    }

    /// `pos` and every package it transitively requires, breadth-first
    #[must_use]
    pub fn required_closure(&self, pos: usize) -> Vec<usize> {
        let mut bfs = Bfs::new(&self.graph, NodeIndex::new(pos));
        let mut closure = Vec::new();
        while let Some(node) = bfs.next(&self.graph) {
            closure.push(node.index());
        }
        closure
    }

    /// `pos` and every package that transitively depends on it, breadth-first
    #[must_use]
    pub fn dependent_closure(&self, pos: usize) -> Vec<usize> {
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, NodeIndex::new(pos));
        let mut closure = Vec::new();
        while let Some(node) = bfs.next(reversed) {
            closure.push(node.index());
        }
        closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageType;

    fn make_package(name: &str, requires: &[&str]) -> PackageDefinition {
        PackageDefinition::new(
            name,
            PackageType::Library,
            format!("/src/{name}/autoforge.toml"),
        )
        .with_requires(requires.iter().copied())
    }

    fn names(index: &PackageIndex, positions: &[usize]) -> Vec<String> {
        let mut names: Vec<_> = positions.iter().map(|&p| index.at(p).name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_dependents_are_inverse_of_requires() {
        let index = PackageIndex::new(vec![
            make_package("a", &[]),
            make_package("b", &["a"]),
            make_package("c", &["a", "b"]),
        ])
        .unwrap();

        assert_eq!(index.get("a").unwrap().dependent, vec!["b", "c"]);
        assert_eq!(index.get("b").unwrap().dependent, vec!["c"]);
        assert!(index.get("c").unwrap().dependent.is_empty());

        for package in index.packages() {
            for required in &package.required {
                assert!(index.get(required).unwrap().dependent.contains(&package.name));
            }
        }
    }

    #[test]
    fn test_missing_dependency() {
        let err = PackageIndex::new(vec![make_package("a", &["zlib"])]).unwrap_err();
        assert!(matches!(err, Error::MissingDependency { ref required, .. } if required == "zlib"));
    }

    #[test]
    fn test_duplicate_package() {
        let err = PackageIndex::new(vec![make_package("a", &[]), make_package("a", &[])])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicatePackage { .. }));
    }

    #[test]
    fn test_sorted_puts_requirements_first() {
        let index = PackageIndex::sorted(vec![
            make_package("app", &["net", "util"]),
            make_package("net", &["util"]),
            make_package("util", &[]),
            make_package("docs", &[]),
        ])
        .unwrap();

        let order: Vec<_> = index.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, vec!["util", "net", "app", "docs"]);
    }

    #[test]
    fn test_sorted_rejects_cycles() {
        let err = PackageIndex::sorted(vec![
            make_package("a", &["b"]),
            make_package("b", &["a"]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::CircularDependency(_)));
    }

    #[test]
    fn test_closures_include_root() {
        let index = PackageIndex::new(vec![
            make_package("a", &[]),
            make_package("b", &["a"]),
            make_package("c", &["b"]),
        ])
        .unwrap();

        assert_eq!(names(&index, &index.required_closure(2)), vec!["a", "b", "c"]);
        assert_eq!(names(&index, &index.dependent_closure(0)), vec!["a", "b", "c"]);
        assert_eq!(names(&index, &index.dependent_closure(2)), vec!["c"]);
    }

    #[test]
    fn test_position_unknown() {
        let index = PackageIndex::default();
        assert!(matches!(index.position("x"), Err(Error::UnknownPackage(_))));
    }
}
