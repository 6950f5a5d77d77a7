// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Property tests for the selection algebra on random dependency graphs

use autoforge::graph::PackageIndex;
use autoforge::selection::resolve_selection;
use autoforge::types::{PackageDefinition, PackageType};
use proptest::prelude::*;

/// A random DAG: package `i` may require any package `j < i`
fn dag() -> impl Strategy<Value = (usize, Vec<bool>)> {
    (1usize..8).prop_flat_map(|n| (Just(n), proptest::collection::vec(any::<bool>(), n * n)))
}

fn build_index(n: usize, edges: &[bool]) -> PackageIndex {
    let packages = (0..n)
        .map(|i| {
            let requires: Vec<String> = (0..i).filter(|&j| edges[i * n + j]).map(name).collect();
            PackageDefinition::new(name(i), PackageType::Application, format!("/pkgs/{i}/autoforge.toml"))
                .with_requires(requires)
        })
        .collect();
    PackageIndex::new(packages).unwrap()
}

fn name(i: usize) -> String {
    format!("p{i}")
}

/// `reach[a][b]`: `a` requires `b`, directly or transitively, or `a == b`
fn reachability(n: usize, edges: &[bool]) -> Vec<Vec<bool>> {
    let mut reach = vec![vec![false; n]; n];
    for i in 0..n {
        reach[i][i] = true;
        for j in 0..i {
            if edges[i * n + j] {
                reach[i][j] = true;
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if reach[i][k] && reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }
    reach
}

fn positions(index: &PackageIndex, tokens: &[String]) -> Vec<usize> {
    resolve_selection(index, tokens)
        .unwrap()
        .iter()
        .map(|p| index.position(&p.name).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn range_selects_every_path_between_endpoints(
        (n, edges) in dag(),
        from in 0usize..8,
        to in 0usize..8,
    ) {
        let (from, to) = (from % n, to % n);
        let index = build_index(n, &edges);
        let reach = reachability(n, &edges);

        let selected = positions(&index, &[format!("{}:{}", name(from), name(to))]);
        let expected: Vec<usize> = (0..n).filter(|&p| reach[p][from] && reach[to][p]).collect();
        prop_assert_eq!(selected, expected);
    }

    #[test]
    fn closures_match_reachability((n, edges) in dag(), pkg in 0usize..8) {
        let pkg = pkg % n;
        let index = build_index(n, &edges);
        let reach = reachability(n, &edges);

        let dependents = positions(&index, &[format!("{}:", name(pkg))]);
        prop_assert_eq!(dependents, (0..n).filter(|&p| reach[p][pkg]).collect::<Vec<_>>());

        let required = positions(&index, &[format!(":{}", name(pkg))]);
        prop_assert_eq!(required, (0..n).filter(|&p| reach[pkg][p]).collect::<Vec<_>>());
    }

    #[test]
    fn selection_follows_definition_order_and_is_idempotent(
        (n, edges) in dag(),
        picks in proptest::collection::vec((0usize..8, 0usize..4, any::<bool>()), 0..6),
    ) {
        let index = build_index(n, &edges);
        let tokens: Vec<String> = picks
            .iter()
            .flat_map(|&(pkg, form, include)| {
                let pkg = name(pkg % n);
                let range = match form {
                    0 => pkg,
                    1 => format!("{pkg}:"),
                    2 => format!(":{pkg}"),
                    _ => format!("{pkg}:{pkg}"),
                };
                [if include { "+" } else { "-" }.to_string(), range]
            })
            .collect();

        let once = positions(&index, &tokens);
        prop_assert!(once.windows(2).all(|w| w[0] < w[1]));

        let twice: Vec<String> = tokens.iter().chain(tokens.iter()).cloned().collect();
        prop_assert_eq!(positions(&index, &twice), once);
    }
}
