// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Autoforge library - meta-build orchestration for autotools packages
//!
//! This crate resolves package selections against a dependency graph,
//! materializes per-package build trees from project templates, and emits
//! the workspace Makefile that drives bootstrap and configure across the
//! selection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod conftab;
pub mod error;
pub mod graph;
pub mod materialize;
pub mod scanner;
pub mod selection;
pub mod targets;
pub mod template;
pub mod workspace;

/// Core data types shared by the engine
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::fmt;
    use std::path::{Path, PathBuf};

    /// Name of the file that defines a package inside its source directory
    pub const DEFINITION_FILENAME: &str = "autoforge.toml";

    // =========================================================================
    // Package Types
    // =========================================================================

    /// Kind of package; selects the built-in template set
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PackageType {
        /// Executable program
        #[default]
        Application,
        /// Installable library with a pkg-config file
        Library,
    }

    impl PackageType {
        /// Get the short code for this package type
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Application => "application",
                Self::Library => "library",
            }
        }
    }

    impl fmt::Display for PackageType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.code())
        }
    }

    // =========================================================================
    // Template Parameters
    // =========================================================================

    /// Value bound to a template variable
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum ParamValue {
        /// Single string; substituted in place
        Text(String),
        /// Ordered list; multiplies pathname expansions
        List(Vec<String>),
        /// Anything else (numbers, booleans, nested data)
        Other(serde_json::Value),
    }

    impl fmt::Display for ParamValue {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Text(text) => f.write_str(text),
                Self::List(items) => write!(f, "[{}]", items.join(" ")),
                Self::Other(serde_json::Value::String(text)) => f.write_str(text),
                Self::Other(value) => write!(f, "{value}"),
            }
        }
    }

    impl From<&str> for ParamValue {
        fn from(value: &str) -> Self {
            Self::Text(value.to_string())
        }
    }

    impl From<String> for ParamValue {
        fn from(value: String) -> Self {
            Self::Text(value)
        }
    }

    impl From<Vec<String>> for ParamValue {
        fn from(value: Vec<String>) -> Self {
            Self::List(value)
        }
    }

    impl From<Vec<&str>> for ParamValue {
        fn from(value: Vec<&str>) -> Self {
            Self::List(value.into_iter().map(String::from).collect())
        }
    }

    /// Substitution environment for pathnames and file contents
    pub type TemplateParams = BTreeMap<String, ParamValue>;

    // =========================================================================
    // Package Definition
    // =========================================================================

    /// One managed package
    #[derive(Debug, Clone, PartialEq)]
    pub struct PackageDefinition {
        /// Unique package name
        pub name: String,
        /// Package kind
        pub package_type: PackageType,
        /// Location of the package definition file
        pub pathname: PathBuf,
        /// Names of the packages this package depends on
        pub required: Vec<String>,
        /// Names of the packages that depend on this package.
        /// Maintained by [`crate::graph::PackageIndex`].
        pub dependent: Vec<String>,
        /// Project-local template directory, if any
        pub template_dir: Option<PathBuf>,
        /// Parameters for rendering this package's build files
        pub params: TemplateParams,
    }

    impl PackageDefinition {
        /// Create a package definition with no dependencies or parameters
        pub fn new(
            name: impl Into<String>,
            package_type: PackageType,
            pathname: impl Into<PathBuf>,
        ) -> Self {
            Self {
                name: name.into(),
                package_type,
                pathname: pathname.into(),
                required: Vec::new(),
                dependent: Vec::new(),
                template_dir: None,
                params: TemplateParams::new(),
            }
        }

        /// Set the required packages
        #[must_use]
        pub fn with_requires<S: Into<String>>(mut self, required: impl IntoIterator<Item = S>) -> Self {
            self.required = required.into_iter().map(Into::into).collect();
            self
        }

        /// Bind a template parameter
        #[must_use]
        pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
            self.params.insert(name.into(), value.into());
            self
        }

        /// Root of the package's own source tree
        #[must_use]
        pub fn source_dir(&self) -> &Path {
            self.pathname.parent().unwrap_or_else(|| Path::new("."))
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::*;
}
