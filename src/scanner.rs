// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Package discovery
//!
//! Every directory on the package path that holds an `autoforge.toml` is a
//! package. Hidden directories are skipped, and the walk does not descend
//! into a package once it is found.
//!
//! ```toml
//! name = "curl"
//! type = "application"
//! requires = ["zlib", "openssl"]
//! template = "build-template"     # optional, relative to this file
//!
//! [params]
//! version = "8.5.0"
//! ```

use crate::error::{Error, Result};
use crate::graph::PackageIndex;
use crate::types::{PackageDefinition, PackageType, ParamValue, TemplateParams, DEFINITION_FILENAME};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// On-disk form of a package definition
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    name: String,
    #[serde(rename = "type", default)]
    package_type: PackageType,
    #[serde(default)]
    requires: Vec<String>,
    template: Option<PathBuf>,
    #[serde(default)]
    params: TemplateParams,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
}

/// Find the definition files under one package path entry, in walk order
pub fn find_definition_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            Error::fs(path, err.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let definition = entry.path().join(DEFINITION_FILENAME);
        if definition.is_file() {
            found.push(definition);
            walker.skip_current_dir();
        }
    }

    Ok(found)
}

/// Parse one definition file
pub fn load_definition(path: &Path) -> Result<PackageDefinition> {
    let text = fs::read_to_string(path).map_err(|err| Error::fs(path, err))?;
    let file: DefinitionFile = toml::from_str(&text).map_err(|err| Error::definition(path, err))?;

    if !valid_name(&file.name) {
        return Err(Error::definition(
            path,
            format!("invalid package name {:?}", file.name),
        ));
    }

    let mut package = PackageDefinition::new(file.name, file.package_type, path);
    package.required = file.requires;
    package.template_dir = file.template.map(|dir| package.source_dir().join(dir));
    package.params = file.params;

    package
        .params
        .entry("name".into())
        .or_insert_with(|| ParamValue::from(package.name.clone()));
    package
        .params
        .entry("type".into())
        .or_insert_with(|| ParamValue::from(package.package_type.code()));
    package
        .params
        .entry("requires".into())
        .or_insert_with(|| ParamValue::List(package.required.clone()));

    Ok(package)
}

/// Discover every package on the package path and index them in
/// dependency order
pub fn load_package_index(pkgpath: &[PathBuf]) -> Result<PackageIndex> {
    let mut packages = Vec::new();

    for root in pkgpath {
        debug!("Searching {} for packages", root.display());
        for definition in find_definition_files(root)? {
            packages.push(load_definition(&definition)?);
        }
    }

    info!("Found {} packages", packages.len());
    PackageIndex::sorted(packages)
}
