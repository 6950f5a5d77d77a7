// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configure command - runs a package's configure script in its build
//! directory with the options from the conftab

use super::Session;
use crate::conftab::Conftab;
use crate::error::{Error, Result as EngineResult};
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Names listed in the workspace's selected-packages file
fn selected_packages(path: &Path) -> EngineResult<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(Error::fs(path, err)),
    }
}

/// Run an external script, failing on a non-zero exit status
pub fn run_script(command: &mut Command) -> EngineResult<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    info!("Running {}", program);

    let status = command.status().map_err(|err| Error::Process {
        program: program.clone(),
        message: err.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Process {
            program,
            message: format!("exited with {status}"),
        })
    }
}

/// Run the configure command
pub fn run(session: &Session, package: &str) -> Result<()> {
    let workspace = &session.workspace;

    let selected = selected_packages(&workspace.selected_path())?;
    if !selected.iter().any(|name| name == package) {
        return Err(Error::UnknownPackage(package.to_string()))
            .context("Package is not part of the current selection");
    }

    let source_dir = workspace.package_dir(package);
    let configure = source_dir.join("configure");
    if !configure.is_file() {
        run_script(Command::new("./autogen.sh").current_dir(&source_dir))
            .with_context(|| format!("Failed to bootstrap {package}"))?;
    }

    let build_dir = workspace.package_build_dir(package);
    fs::create_dir_all(&build_dir).map_err(|err| Error::fs(&build_dir, err))?;

    let args = Conftab::load(&workspace.conftab_path())?.configure_args(package);
    println!("[configure] {package}");
    run_script(Command::new(&configure).args(&args).current_dir(&build_dir))
        .with_context(|| format!("Failed to configure {package}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_selected_packages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selected");
        assert!(selected_packages(&path).unwrap().is_empty());

        fs::write(&path, "zlib\ncurl\n").unwrap();
        assert_eq!(selected_packages(&path).unwrap(), vec!["zlib", "curl"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_script_reports_failure() {
        assert!(run_script(&mut Command::new("true")).is_ok());

        let err = run_script(&mut Command::new("false")).unwrap_err();
        assert!(matches!(err, Error::Process { ref program, .. } if program == "false"));

        let err = run_script(&mut Command::new("/nonexistent/script")).unwrap_err();
        assert!(matches!(err, Error::Process { .. }));
    }
}
