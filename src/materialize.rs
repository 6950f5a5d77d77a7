// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Per-package build tree materialization
//!
//! A package's build tree mirrors its source tree through symbolic links
//! and is completed with files rendered from the project template. A
//! template file never overwrites a real source file at the same path.
//! Writes are idempotent: unchanged files are left alone, so re-running
//! after a failure resumes where the previous run stopped.

use crate::error::{Error, Result};
use crate::template::embedded::{self, EmbeddedFile};
use crate::template::{expand, SourceFiles, TemplateEngine};
use crate::types::{PackageDefinition, TemplateParams, DEFINITION_FILENAME};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// What happened to a file in the build tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Symbolic link to a source file created
    Linked,
    /// Generated file created
    Added,
    /// Generated file rewritten with new contents
    Updated,
    /// Something else was removed to make room for a generated file
    Replaced,
}

impl ChangeKind {
    /// Single-letter code used in change reports
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Linked => 'L',
            Self::Added => 'A',
            Self::Updated => 'U',
            Self::Replaced => 'R',
        }
    }
}

/// A change made to the file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Kind of change
    pub kind: ChangeKind,
    /// Affected pathname
    pub path: PathBuf,
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.code(), self.path.display())
    }
}

/// Where a package's template files come from
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectTemplate {
    /// A template directory on disk
    Directory(PathBuf),
    /// A template set compiled into the binary
    Embedded(&'static [EmbeddedFile]),
}

impl ProjectTemplate {
    /// The package's own template directory, or the built-in set for its type
    #[must_use]
    pub fn for_package(package: &PackageDefinition) -> Self {
        match &package.template_dir {
            Some(dir) => Self::Directory(dir.clone()),
            None => Self::Embedded(embedded::for_type(package.package_type)),
        }
    }
}

/// Changes made so far, each passed to the reporter as soon as it happens
struct ChangeLog<'r> {
    changes: Vec<FileChange>,
    report: &'r mut dyn FnMut(&FileChange),
}

impl ChangeLog<'_> {
    fn record(&mut self, change: FileChange) {
        (self.report)(&change);
        self.changes.push(change);
    }
}

/// Materialize a package's build tree in `build_dir`
pub fn materialize(package: &PackageDefinition, build_dir: &Path) -> Result<Vec<FileChange>> {
    materialize_reporting(package, build_dir, |_| {})
}

/// Materialize a package's build tree, calling `report` for every change
/// as it is made. Changes made before a failure have been reported.
pub fn materialize_reporting(
    package: &PackageDefinition,
    build_dir: &Path,
    report: impl FnMut(&FileChange),
) -> Result<Vec<FileChange>> {
    materialize_with(package, build_dir, &ProjectTemplate::for_package(package), report)
}

/// Materialize a package's build tree from an explicit project template
pub fn materialize_with(
    package: &PackageDefinition,
    build_dir: &Path,
    template: &ProjectTemplate,
    mut report: impl FnMut(&FileChange),
) -> Result<Vec<FileChange>> {
    debug!("Materializing {} in {}", package.name, build_dir.display());

    let mut log = ChangeLog {
        changes: Vec::new(),
        report: &mut report,
    };
    let sources = Arc::new(link_source_files(package, build_dir, &mut log)?);

    match template {
        ProjectTemplate::Embedded(files) => {
            for file in *files {
                if sources.contains(file.pathname) {
                    trace!("{} is provided by the package", file.pathname);
                    continue;
                }
                generate_files(
                    build_dir,
                    file.pathname,
                    file.contents,
                    file.mode,
                    &package.params,
                    &sources,
                    &mut log,
                )?;
            }
        }
        ProjectTemplate::Directory(dir) => {
            for (relative, path) in walk_files(dir)? {
                if sources.contains(&relative) {
                    trace!("{} is provided by the package", relative);
                    continue;
                }
                let bytes = fs::read(&path).map_err(|err| Error::fs(&path, err))?;
                let mode = file_mode(&path)?;
                match String::from_utf8(bytes) {
                    Ok(contents) => generate_files(
                        build_dir,
                        &relative,
                        &contents,
                        mode,
                        &package.params,
                        &sources,
                        &mut log,
                    )?,
                    Err(binary) => copy_files(
                        build_dir,
                        &relative,
                        binary.as_bytes(),
                        mode,
                        &package.params,
                        &sources,
                        &mut log,
                    )?,
                }
            }
        }
    }

    Ok(log.changes)
}

/// Regular files under `root` as (relative pathname, full path) pairs,
/// sorted, without the package definition file.
fn walk_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = relative_name(root, entry.path());
        if relative == DEFINITION_FILENAME {
            continue;
        }
        files.push((relative, entry.into_path()));
    }

    Ok(files)
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    Error::fs(path, err.into())
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path).map_err(|err| Error::fs(path, err))?;
    Ok(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Result<u32> {
    Ok(0o644)
}

/// Link every source file of the package into `build_dir` and return the
/// set of relative pathnames the package provides itself.
fn link_source_files(
    package: &PackageDefinition,
    build_dir: &Path,
    log: &mut ChangeLog<'_>,
) -> Result<SourceFiles> {
    let source_dir = package.source_dir();
    let source_dir = fs::canonicalize(source_dir).map_err(|err| Error::fs(source_dir, err))?;

    let mut sources = SourceFiles::new();

    for (relative, source) in walk_files(&source_dir)? {
        let target = build_dir.join(&relative);
        sources.insert(relative);

        if link_file(&source, &target)? {
            log.record(FileChange {
                kind: ChangeKind::Linked,
                path: target,
            });
        }
    }

    debug!("{} provides {} source files", package.name, sources.len());

    Ok(sources)
}

/// Make `target` a symbolic link to `source`. Returns false when the
/// correct link was already in place.
fn link_file(source: &Path, target: &Path) -> Result<bool> {
    match fs::symlink_metadata(target) {
        Ok(metadata) => {
            if metadata.file_type().is_symlink() {
                let existing = fs::read_link(target).map_err(|err| Error::fs(target, err))?;
                if existing == source {
                    return Ok(false);
                }
            }
            remove_path(target, &metadata)?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(Error::fs(target, err)),
    }

    create_parent_dir(target)?;
    symlink(source, target).map_err(|err| Error::fs(target, err))?;

    Ok(true)
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

fn remove_path(path: &Path, metadata: &fs::Metadata) -> Result<()> {
    let removed = if metadata.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|err| Error::fs(path, err))
}

fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|err| Error::fs(parent, err)),
        None => Ok(()),
    }
}

/// Render one template file once per pathname expansion and write the
/// results under `root`. Expansions that name a source file are skipped.
fn generate_files(
    root: &Path,
    pathname: &str,
    contents: &str,
    mode: u32,
    params: &TemplateParams,
    sources: &Arc<SourceFiles>,
    log: &mut ChangeLog<'_>,
) -> Result<()> {
    let mut engine = TemplateEngine::for_sources(Arc::clone(sources));
    engine.add(pathname, contents)?;

    for expansion in expand(pathname, params) {
        if sources.contains(&expansion.pathname) {
            trace!("{} is provided by the package", expansion.pathname);
            continue;
        }
        let text = engine.render(pathname, &expansion.params)?;
        if let Some(change) = write_generated_file(root, &expansion.pathname, text.as_bytes(), mode)? {
            log.record(change);
        }
    }

    Ok(())
}

/// Copy a template file that is not text to every pathname expansion
fn copy_files(
    root: &Path,
    pathname: &str,
    contents: &[u8],
    mode: u32,
    params: &TemplateParams,
    sources: &SourceFiles,
    log: &mut ChangeLog<'_>,
) -> Result<()> {
    debug!("{} is not UTF-8, copying it unrendered", pathname);

    for expansion in expand(pathname, params) {
        if sources.contains(&expansion.pathname) {
            trace!("{} is provided by the package", expansion.pathname);
            continue;
        }
        if let Some(change) = write_generated_file(root, &expansion.pathname, contents, mode)? {
            log.record(change);
        }
    }

    Ok(())
}

/// Write `contents` to `root/relative` unless it already holds exactly
/// that. Returns the change made, if any.
pub fn write_generated_file(
    root: &Path,
    relative: &str,
    contents: &[u8],
    mode: u32,
) -> Result<Option<FileChange>> {
    let path = root.join(relative);
    if Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(Error::fs(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "pathname escapes the output directory"),
        ));
    }

    let kind = match fs::symlink_metadata(&path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            create_parent_dir(&path)?;
            ChangeKind::Added
        }
        Err(err) => return Err(Error::fs(&path, err)),
        Ok(metadata) if metadata.is_file() => match fs::read(&path) {
            Ok(existing) if existing == contents => {
                trace!("{} is up to date", path.display());
                return Ok(None);
            }
            Ok(_) => ChangeKind::Updated,
            Err(_) => {
                remove_path(&path, &metadata)?;
                ChangeKind::Replaced
            }
        },
        Ok(metadata) => {
            remove_path(&path, &metadata)?;
            ChangeKind::Replaced
        }
    };

    fs::write(&path, contents).map_err(|err| Error::fs(&path, err))?;
    if kind != ChangeKind::Updated {
        set_mode(&path, mode)?;
    }

    Ok(Some(FileChange { kind, path }))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|err| Error::fs(path, err))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_generated_file_lifecycle() {
        let dir = TempDir::new().unwrap();

        let added = write_generated_file(dir.path(), "sub/file.txt", b"one", 0o644).unwrap();
        assert_eq!(added.unwrap().kind, ChangeKind::Added);

        let unchanged = write_generated_file(dir.path(), "sub/file.txt", b"one", 0o644).unwrap();
        assert!(unchanged.is_none());

        let updated = write_generated_file(dir.path(), "sub/file.txt", b"two", 0o644).unwrap();
        assert_eq!(updated.unwrap().kind, ChangeKind::Updated);
        assert_eq!(fs::read(dir.path().join("sub/file.txt")).unwrap(), b"two");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_generated_file_replaces_symlink() {
        let dir = TempDir::new().unwrap();
        let elsewhere = dir.path().join("elsewhere");
        fs::write(&elsewhere, b"same").unwrap();
        std::os::unix::fs::symlink(&elsewhere, dir.path().join("link")).unwrap();

        let replaced = write_generated_file(dir.path(), "link", b"same", 0o644).unwrap();
        assert_eq!(replaced.unwrap().kind, ChangeKind::Replaced);
        assert!(!fs::symlink_metadata(dir.path().join("link")).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&elsewhere).unwrap(), b"same");
    }

    #[test]
    fn test_write_generated_file_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let err = write_generated_file(dir.path(), "../outside", b"x", 0o644).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
        let err = write_generated_file(dir.path(), "/etc/passwd", b"x", 0o644).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[test]
    fn test_change_display() {
        let change = FileChange {
            kind: ChangeKind::Updated,
            path: PathBuf::from("ws/Makefile"),
        };
        assert_eq!(change.to_string(), "U ws/Makefile");
    }
}
