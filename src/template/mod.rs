// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Template rendering
//!
//! File contents are Jinja templates rendered with minijinja. Every engine
//! registers the helpers below; engines created for a package also get
//! `FileList`, which lists that package's own source files.
//!
//! | Helper                  | Result                                          |
//! |-------------------------|-------------------------------------------------|
//! | `VarName(s)`            | `s` usable in a make variable name              |
//! | `VarNameUC(s)`          | same, uppercased                                |
//! | `LibName(s)`            | `s` usable as a library file name               |
//! | `StringList(a, b, ...)` | list of the arguments                           |
//! | `Error(msg)`            | aborts rendering with `msg`                     |
//! | `FileList(dir, glob)`   | source files under `dir` matching `glob`        |

pub mod embedded;
pub mod pathname;

pub use pathname::{expand, Expansion};

use crate::error::{Error, Result};
use globset::Glob;
use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Relative pathnames (with `/` separators) of a package's own source files
pub type SourceFiles = BTreeSet<String>;

/// Make-variable-safe form of `arg`: `+` becomes `x`, anything that is
/// not an ASCII letter or digit becomes `_`.
#[must_use]
pub fn var_name(arg: &str) -> String {
    arg.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '+' => 'x',
            _ => '_',
        })
        .collect()
}

/// Uppercase variant of [`var_name`]; `+` becomes `X`.
#[must_use]
pub fn var_name_uc(arg: &str) -> String {
    arg.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_uppercase(),
            '+' => 'X',
            _ => '_',
        })
        .collect()
}

/// Library-name-safe form of `arg`: keeps letters, digits, `+`, `-` and
/// `.`; anything else becomes `_`.
#[must_use]
pub fn lib_name(arg: &str) -> String {
    arg.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') => c,
            _ => '_',
        })
        .collect()
}

/// Source files under `root` whose base name matches `pattern`, relative
/// to `root` and sorted. An empty root or `.` means the whole tree.
pub fn filter_file_list(
    files: &SourceFiles,
    root: &str,
    pattern: &str,
) -> std::result::Result<Vec<String>, globset::Error> {
    let matcher = Glob::new(pattern)?.compile_matcher();
    let prefix = match root.trim_end_matches('/') {
        "" | "." => String::new(),
        root => format!("{root}/"),
    };

    let mut filtered: Vec<String> = files
        .iter()
        .filter_map(|file| file.strip_prefix(prefix.as_str()))
        .filter(|relative| {
            let filename = relative.rsplit('/').next().unwrap_or(relative);
            matcher.is_match(filename)
        })
        .map(String::from)
        .collect();

    filtered.sort();
    Ok(filtered)
}

fn string_list(elements: Rest<String>) -> Vec<String> {
    elements.0
}

fn raise_error(message: String) -> std::result::Result<String, minijinja::Error> {
    Err(minijinja::Error::new(ErrorKind::InvalidOperation, message))
}

/// A set of parsed templates sharing one helper environment
pub struct TemplateEngine<'s> {
    env: Environment<'s>,
}

impl Default for TemplateEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> TemplateEngine<'s> {
    /// Create an engine with the standard helpers
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        env.add_function("VarName", |arg: String| var_name(&arg));
        env.add_function("VarNameUC", |arg: String| var_name_uc(&arg));
        env.add_function("LibName", |arg: String| lib_name(&arg));
        env.add_function("StringList", string_list);
        env.add_function("Error", raise_error);

        Self { env }
    }

    /// Create an engine whose `FileList` helper lists `files`
    #[must_use]
    pub fn for_sources(files: Arc<SourceFiles>) -> Self {
        let mut engine = Self::new();
        engine.env.add_function(
            "FileList",
            move |root: String, pattern: String| -> std::result::Result<Vec<String>, minijinja::Error> {
                filter_file_list(&files, &root, &pattern).map_err(|err| {
                    minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("FileList: invalid pattern {pattern:?}"),
                    )
                    .with_source(err)
                })
            },
        );
        engine
    }

    /// Parse a template and register it under `name`
    pub fn add(&mut self, name: &'s str, source: &'s str) -> Result<()> {
        self.env
            .add_template(name, source)
            .map_err(|source| Error::TemplateSyntax {
                template: name.to_string(),
                source,
            })
    }

    /// Render a previously added template
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String> {
        let execution_error = |source| Error::TemplateExecution {
            template: name.to_string(),
            source,
        };
        self.env
            .get_template(name)
            .map_err(execution_error)?
            .render(context)
            .map_err(execution_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamValue, TemplateParams};

    fn render(source: &str, params: &TemplateParams) -> Result<String> {
        let mut engine = TemplateEngine::new();
        engine.add("test.in", source)?;
        engine.render("test.in", params)
    }

    #[test]
    fn test_name_sanitizers() {
        assert_eq!(var_name("libc++-dev"), "libcxx_dev");
        assert_eq!(var_name_uc("libc++"), "LIBCXX");
        assert_eq!(var_name_uc("my-lib.2"), "MY_LIB_2");
        assert_eq!(lib_name("my lib+"), "my_lib+");
        assert_eq!(lib_name("z-1.2"), "z-1.2");
    }

    #[test]
    fn test_render_with_helpers() {
        let mut params = TemplateParams::new();
        params.insert("name".into(), ParamValue::from("foo-bar"));

        let text = render("{{ VarNameUC(name) }}_CFLAGS\n", &params).unwrap();
        assert_eq!(text, "FOO_BAR_CFLAGS\n");

        let text = render("{{ StringList('a', 'b') | join(',') }}", &params).unwrap();
        assert_eq!(text, "a,b");
    }

    #[test]
    fn test_list_params_iterate() {
        let mut params = TemplateParams::new();
        params.insert("sources".into(), ParamValue::from(vec!["a.c", "b.c"]));

        let text = render("{% for s in sources %}[{{ s }}]{% endfor %}", &params).unwrap();
        assert_eq!(text, "[a.c][b.c]");
    }

    #[test]
    fn test_error_helper_fails_render() {
        let err = render("{{ Error('version is required') }}", &TemplateParams::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateExecution { ref template, .. } if template == "test.in"));
        assert!(err.to_string().contains("version is required"));
    }

    #[test]
    fn test_syntax_error() {
        let err = render("{% for %}", &TemplateParams::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateSyntax { .. }));
    }

    #[test]
    fn test_file_list() {
        let files: SourceFiles = ["src/a.c", "src/b.h", "src/sub/c.c", "main.c", "srcx/d.c"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(filter_file_list(&files, "src", "*.c").unwrap(), vec!["a.c", "sub/c.c"]);
        assert_eq!(
            filter_file_list(&files, ".", "*.c").unwrap(),
            vec!["main.c", "src/a.c", "src/sub/c.c", "srcx/d.c"]
        );
        assert!(filter_file_list(&files, "src", "[").is_err());
    }

    #[test]
    fn test_file_list_helper() {
        let files: SourceFiles = ["lib/x.c", "lib/y.c"].into_iter().map(String::from).collect();
        let mut engine = TemplateEngine::for_sources(Arc::new(files));
        engine
            .add("Makefile.am", "{{ FileList('lib', '*.c') | join(' ') }}")
            .unwrap();

        assert_eq!(engine.render("Makefile.am", TemplateParams::new()).unwrap(), "x.c y.c");
    }
}
