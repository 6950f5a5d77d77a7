// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod configure;
pub mod query;
pub mod select;

use crate::config::{self, WorkspaceSettings};
use crate::graph::PackageIndex;
use crate::materialize::{ChangeKind, FileChange};
use crate::scanner;
use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global options shared by every command
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Workspace root
    pub workspace_dir: PathBuf,
    /// Package search path; replaces the configured one when non-empty
    pub pkgpath: Vec<PathBuf>,
    /// Makefile name override
    pub makefile: Option<String>,
    /// Default target override
    pub default_target: Option<String>,
    /// Disable colored output
    pub no_color: bool,
}

/// Settings and layout of the workspace a command operates on
#[derive(Debug, Clone)]
pub struct Session {
    /// Effective settings
    pub settings: WorkspaceSettings,
    /// Workspace layout
    pub workspace: Workspace,
    no_color: bool,
}

impl Session {
    /// Resolve the workspace, load its settings and apply overrides
    pub fn open(options: &Options) -> Result<Self> {
        let root = fs::canonicalize(&options.workspace_dir).with_context(|| {
            format!("Workspace directory {} not found", options.workspace_dir.display())
        })?;

        let mut settings = config::load(&root)?;
        if !options.pkgpath.is_empty() {
            let cwd = env::current_dir().context("Cannot determine current directory")?;
            settings.pkgpath = options.pkgpath.iter().map(|p| cwd.join(p)).collect();
        }
        if let Some(makefile) = &options.makefile {
            settings.makefile.clone_from(makefile);
        }
        if let Some(target) = &options.default_target {
            settings.default_target.clone_from(target);
        }

        let executable = env::current_exe()
            .and_then(fs::canonicalize)
            .context("Cannot locate the autoforge executable")?;
        debug!("Workspace {} with settings {:?}", root.display(), settings);

        let workspace = Workspace::new(&root, &settings.build_dir, executable);
        Ok(Self {
            settings,
            workspace,
            no_color: options.no_color,
        })
    }

    /// Discover and index the packages on the package path
    pub fn load_index(&self) -> Result<PackageIndex> {
        if self.settings.pkgpath.is_empty() {
            bail!("No package path configured (use --pkgpath or AUTOFORGE_PKGPATH)");
        }
        scanner::load_package_index(&self.settings.pkgpath).context("Failed to load package definitions")
    }

    /// Report one file change
    pub fn print_change(&self, change: &FileChange) {
        println!("{}", self.format_change(change));
    }

    /// Report file changes, one per line
    pub fn print_changes(&self, changes: &[FileChange]) {
        for change in changes {
            self.print_change(change);
        }
    }

    fn format_change(&self, change: &FileChange) -> String {
        let path = display_path(self.workspace.root(), &change.path);
        let code = change.kind.code();
        if self.no_color {
            return format!("{code} {path}");
        }
        match change.kind {
            ChangeKind::Linked => format!("{} {path}", code.cyan()),
            ChangeKind::Added => format!("{} {path}", code.green()),
            ChangeKind::Updated => format!("{} {path}", code.yellow()),
            ChangeKind::Replaced => format!("{} {path}", code.magenta()),
        }
    }
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(Path::new("/ws"), Path::new("/ws/.autoforge/selected")),
            ".autoforge/selected"
        );
        assert_eq!(display_path(Path::new("/ws"), Path::new("/elsewhere/x")), "/elsewhere/x");
    }

    #[test]
    fn test_format_change_without_color() {
        let session = Session {
            settings: WorkspaceSettings::default(),
            workspace: Workspace::new("/ws", "build", "/ws/autoforge"),
            no_color: true,
        };
        let change = FileChange {
            kind: ChangeKind::Linked,
            path: PathBuf::from("/ws/.autoforge/packages/zlib/zlib.c"),
        };
        assert_eq!(session.format_change(&change), "L .autoforge/packages/zlib/zlib.c");
    }
}
