// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Engine error types

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, materializing or generating
#[derive(Debug, Error)]
pub enum Error {
    /// A selection or lookup named a package that is not defined
    #[error("no such package: {0}")]
    UnknownPackage(String),

    /// A package requires a package that is not defined
    #[error("{package}: requires unknown package {required}")]
    MissingDependency {
        /// Package declaring the requirement
        package: String,
        /// Missing package name
        required: String,
    },

    /// Two definition files declare the same package name
    #[error("duplicate package {name} in {} and {}", first.display(), second.display())]
    DuplicatePackage {
        /// Package name
        name: String,
        /// First definition file
        first: PathBuf,
        /// Second definition file
        second: PathBuf,
    },

    /// The package graph contains a cycle
    #[error("circular dependency involving package {0}")]
    CircularDependency(String),

    /// A package definition file could not be understood
    #[error("{}: {message}", path.display())]
    InvalidDefinition {
        /// Definition file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Template text failed to parse
    #[error("{template}: {source}")]
    TemplateSyntax {
        /// Template pathname
        template: String,
        /// Parser error
        #[source]
        source: minijinja::Error,
    },

    /// Template failed while rendering
    #[error("{template}: {source}")]
    TemplateExecution {
        /// Template pathname
        template: String,
        /// Render error
        #[source]
        source: minijinja::Error,
    },

    /// Creating, removing, linking, reading or writing a file failed
    #[error("{}: {source}", path.display())]
    Filesystem {
        /// Offending pathname
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An external build script failed
    #[error("{program}: {message}")]
    Process {
        /// Script that was run
        program: String,
        /// Exit status or launch failure
        message: String,
    },
}

impl Error {
    /// Create a filesystem error with path context
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid definition error
    pub fn definition(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::InvalidDefinition {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_package_message() {
        let err = Error::UnknownPackage("zlib".into());
        assert_eq!(err.to_string(), "no such package: zlib");
    }

    #[test]
    fn test_filesystem_error_names_path() {
        let err = Error::fs(
            "/tmp/ws/Makefile",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("/tmp/ws/Makefile: "));
    }
}
