// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Project templates compiled into the binary

use crate::types::PackageType;

/// One file of a built-in project template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedFile {
    /// Pathname template of the generated file
    pub pathname: &'static str,
    /// Permission bits of the generated file
    pub mode: u32,
    /// Template text
    pub contents: &'static str,
}

/// Files generated for an application package
pub static APPLICATION: &[EmbeddedFile] = &[
    EmbeddedFile {
        pathname: "autogen.sh",
        mode: 0o755,
        contents: include_str!("../../templates/application/autogen.sh"),
    },
    EmbeddedFile {
        pathname: "configure.ac",
        mode: 0o644,
        contents: include_str!("../../templates/application/configure.ac"),
    },
    EmbeddedFile {
        pathname: "Makefile.am",
        mode: 0o644,
        contents: include_str!("../../templates/application/Makefile.am"),
    },
];

/// Files generated for a library package
pub static LIBRARY: &[EmbeddedFile] = &[
    EmbeddedFile {
        pathname: "autogen.sh",
        mode: 0o755,
        contents: include_str!("../../templates/library/autogen.sh"),
    },
    EmbeddedFile {
        pathname: "configure.ac",
        mode: 0o644,
        contents: include_str!("../../templates/library/configure.ac"),
    },
    EmbeddedFile {
        pathname: "Makefile.am",
        mode: 0o644,
        contents: include_str!("../../templates/library/Makefile.am"),
    },
    EmbeddedFile {
        pathname: "{name}.pc.in",
        mode: 0o644,
        contents: include_str!("../../templates/library/{name}.pc.in"),
    },
];

/// Built-in template set for a package type
#[must_use]
pub fn for_type(package_type: PackageType) -> &'static [EmbeddedFile] {
    match package_type {
        PackageType::Application => APPLICATION,
        PackageType::Library => LIBRARY,
    }
}
