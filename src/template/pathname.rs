// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Pathname template expansion
//!
//! Every `{name}` in a pathname whose name is bound in the parameters is
//! replaced. Scalars are substituted in place. The first occurrence of a
//! list-valued name multiplies the output: one pathname per element, each
//! carrying its own copy of the parameters with that name rebound to the
//! element. Later occurrences of the same name reuse the element already
//! chosen for that output. Several list-valued names compound, with the
//! placeholder that appears later in the pathname varying fastest.

use crate::types::{ParamValue, TemplateParams};
use std::collections::HashSet;

/// One concrete pathname together with the parameters it was produced with
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Expanded pathname
    pub pathname: String,
    /// Parameters with list-valued names rebound to single elements
    pub params: TemplateParams,
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn segments<'a>(template: &'a str, params: &TemplateParams) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(open) = template[cursor..].find('{').map(|i| cursor + i) {
        let Some(close) = template[open + 1..].find('}').map(|i| open + 1 + i) else {
            break;
        };
        let name = &template[open + 1..close];
        if params.contains_key(name) {
            if literal_start < open {
                segments.push(Segment::Literal(&template[literal_start..open]));
            }
            segments.push(Segment::Placeholder(name));
            literal_start = close + 1;
            cursor = close + 1;
        } else {
            cursor = open + 1;
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }

    segments
}

/// Expand a pathname template into the ordered cartesian product of its
/// list-valued placeholders. An empty list yields no expansions.
#[must_use]
pub fn expand(template: &str, params: &TemplateParams) -> Vec<Expansion> {
    let mut expansions = vec![Expansion {
        pathname: String::new(),
        params: params.clone(),
    }];
    let mut multiplied: HashSet<&str> = HashSet::new();

    for segment in segments(template, params) {
        let name = match segment {
            Segment::Literal(text) => {
                for expansion in &mut expansions {
                    expansion.pathname.push_str(text);
                }
                continue;
            }
            Segment::Placeholder(name) => name,
        };

        match &params[name] {
            ParamValue::List(_) if multiplied.contains(name) => {
                for expansion in &mut expansions {
                    let bound = expansion.params[name].to_string();
                    expansion.pathname.push_str(&bound);
                }
            }
            ParamValue::List(values) => {
                multiplied.insert(name);
                expansions = expansions
                    .into_iter()
                    .flat_map(|expansion| {
                        values.iter().map(move |value| {
                            let mut forked = expansion.clone();
                            forked.pathname.push_str(value);
                            forked
                                .params
                                .insert(name.to_string(), ParamValue::Text(value.clone()));
                            forked
                        })
                    })
                    .collect();
            }
            scalar => {
                let text = scalar.to_string();
                for expansion in &mut expansions {
                    expansion.pathname.push_str(&text);
                }
            }
        }
    }

    expansions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, ParamValue)]) -> TemplateParams {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    fn pathnames(expansions: &[Expansion]) -> Vec<&str> {
        expansions.iter().map(|e| e.pathname.as_str()).collect()
    }

    #[test]
    fn test_list_and_scalar() {
        let params = params(&[("a", vec!["x", "y"].into()), ("b", "m".into())]);
        let expansions = expand("{a}/{b}.c", &params);

        assert_eq!(pathnames(&expansions), vec!["x/m.c", "y/m.c"]);
        assert_eq!(expansions[0].params["a"], ParamValue::from("x"));
        assert_eq!(expansions[1].params["a"], ParamValue::from("y"));
        assert_eq!(expansions[0].params["b"], ParamValue::from("m"));
        assert_eq!(expansions[1].params["b"], ParamValue::from("m"));
    }

    #[test]
    fn test_two_lists_later_varies_fastest() {
        let params = params(&[
            ("dir", vec!["src", "test"].into()),
            ("file", vec!["a", "b", "c"].into()),
        ]);
        let expansions = expand("{dir}/{file}.c", &params);

        assert_eq!(
            pathnames(&expansions),
            vec!["src/a.c", "src/b.c", "src/c.c", "test/a.c", "test/b.c", "test/c.c"]
        );
        assert_eq!(expansions[4].params["dir"], ParamValue::from("test"));
        assert_eq!(expansions[4].params["file"], ParamValue::from("b"));
    }

    #[test]
    fn test_empty_list_yields_nothing() {
        let params = params(&[("a", ParamValue::List(vec![])), ("b", "m".into())]);
        assert!(expand("{b}/{a}.c", &params).is_empty());
    }

    #[test]
    fn test_unreferenced_list_does_not_multiply() {
        let params = params(&[("sources", vec!["a.c", "b.c"].into())]);
        let expansions = expand("Makefile.am", &params);

        assert_eq!(pathnames(&expansions), vec!["Makefile.am"]);
        assert_eq!(expansions[0].params["sources"], ParamValue::from(vec!["a.c", "b.c"]));
    }

    #[test]
    fn test_scalar_replaced_everywhere() {
        let params = params(&[("name", "zlib".into())]);
        assert_eq!(pathnames(&expand("{name}/{name}.pc.in", &params)), vec!["zlib/zlib.pc.in"]);
    }

    #[test]
    fn test_repeated_list_name_reuses_element() {
        let params = params(&[("m", vec!["x", "y"].into())]);
        assert_eq!(pathnames(&expand("{m}/{m}.h", &params)), vec!["x/x.h", "y/y.h"]);
    }

    #[test]
    fn test_unknown_and_unbalanced_braces_kept() {
        let params = params(&[("name", "foo".into())]);
        assert_eq!(
            pathnames(&expand("{other}/{{name}}/{name", &params)),
            vec!["{other}/{foo}/{name"]
        );
    }

    #[test]
    fn test_other_values_use_display() {
        let params = params(&[("major", ParamValue::Other(serde_json::json!(3)))]);
        assert_eq!(pathnames(&expand("lib-{major}.so", &params)), vec!["lib-3.so"]);
    }
}
