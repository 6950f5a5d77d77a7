// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered, later sources winning:
//! built-in defaults, the user config file, `.autoforge/settings.toml` in
//! the workspace, then `AUTOFORGE_*` environment variables. Command-line
//! flags are applied on top by the caller.

use crate::workspace::PRIVATE_DIR;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Workspace settings file, under the private directory
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Settings for one workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Directories searched for package definitions
    #[serde(default)]
    pub pkgpath: Vec<PathBuf>,
    /// Name of the generated Makefile
    pub makefile: String,
    /// Target run by a bare `make`
    pub default_target: String,
    /// Parent of the package build directories
    pub build_dir: PathBuf,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            pkgpath: Vec::new(),
            makefile: "Makefile".to_string(),
            default_target: "help".to_string(),
            build_dir: PathBuf::from(PRIVATE_DIR).join("build"),
        }
    }
}

/// User-level config file, if the platform has a config directory
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "autoforge")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load settings for the workspace at `root`
pub fn load(root: &Path) -> Result<WorkspaceSettings> {
    load_from(root, user_config_file().as_deref())
}

/// Load settings with an explicit user config file
pub fn load_from(root: &Path, user_config: Option<&Path>) -> Result<WorkspaceSettings> {
    let defaults = WorkspaceSettings::default();
    let mut builder = Config::builder()
        .set_default("pkgpath", Vec::<String>::new())?
        .set_default("makefile", defaults.makefile)?
        .set_default("default_target", defaults.default_target)?
        .set_default("build_dir", defaults.build_dir.to_string_lossy().into_owned())?;

    if let Some(path) = user_config {
        builder = builder.add_source(File::from(path).required(false));
    }

    let workspace_file = root.join(PRIVATE_DIR).join(SETTINGS_FILENAME);
    let settings = builder
        .add_source(File::from(workspace_file.as_path()).required(false))
        .add_source(
            Environment::with_prefix("AUTOFORGE")
                .try_parsing(true)
                .list_separator(":")
                .with_list_parse_key("pkgpath"),
        )
        .build()
        .with_context(|| format!("Failed to read settings for {}", root.display()))?;

    let settings: WorkspaceSettings = settings
        .try_deserialize()
        .context("Invalid workspace settings")?;

    Ok(settings.resolved(root))
}

impl WorkspaceSettings {
    /// Resolve relative paths against the workspace root
    #[must_use]
    pub fn resolved(mut self, root: &Path) -> Self {
        self.pkgpath = self.pkgpath.iter().map(|p| root.join(p)).collect();
        self.build_dir = root.join(&self.build_dir);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_from(dir.path(), None).unwrap();

        assert_eq!(settings.makefile, "Makefile");
        assert_eq!(settings.default_target, "help");
        assert_eq!(settings.build_dir, dir.path().join(".autoforge/build"));
    }

    #[test]
    fn test_workspace_file_overrides_user_file() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.toml");
        fs::write(&user, "makefile = \"GNUmakefile\"\ndefault_target = \"build\"\n").unwrap();
        fs::create_dir_all(dir.path().join(".autoforge")).unwrap();
        fs::write(
            dir.path().join(".autoforge/settings.toml"),
            "default_target = \"configure\"\npkgpath = [\"pkgs\", \"/opt/pkgs\"]\nbuild_dir = \"out\"\n",
        )
        .unwrap();

        let settings = load_from(dir.path(), Some(&user)).unwrap();
        assert_eq!(settings.makefile, "GNUmakefile");
        assert_eq!(settings.default_target, "configure");
        assert_eq!(settings.pkgpath, vec![dir.path().join("pkgs"), PathBuf::from("/opt/pkgs")]);
        assert_eq!(settings.build_dir, dir.path().join("out"));
    }

    #[test]
    fn test_invalid_settings_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".autoforge")).unwrap();
        fs::write(dir.path().join(".autoforge/settings.toml"), "makefile = [").unwrap();

        assert!(load_from(dir.path(), None).is_err());
    }
}
