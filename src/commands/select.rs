// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Select command - materializes the selected packages and writes the
//! workspace Makefile

use super::Session;
use crate::conftab::Conftab;
use crate::materialize::materialize_reporting;
use crate::selection::resolve_selection;
use crate::workspace::generate_workspace_files;
use anyhow::{Context, Result};
use tracing::info;

/// Run the select command
pub fn run(session: &Session, ranges: &[String]) -> Result<()> {
    let index = session.load_index()?;
    let selection = resolve_selection(&index, ranges).context("Invalid package selection")?;
    let workspace = &session.workspace;

    info!("Selected {} packages", selection.len());

    // Stop at the first failure; files already written stay in place and
    // have been reported.
    for package in selection.iter() {
        materialize_reporting(package, &workspace.package_dir(&package.name), |change| {
            session.print_change(change);
        })
        .with_context(|| format!("Failed to generate files for {}", package.name))?;
    }

    let conftab_path = workspace.conftab_path();
    let conftab = Conftab::load(&conftab_path)
        .with_context(|| format!("Failed to read {}", conftab_path.display()))?
        .retain_selection(&selection.names());

    let changes = generate_workspace_files(
        workspace,
        &selection,
        &conftab,
        &session.settings.makefile,
        &session.settings.default_target,
    )
    .context("Failed to generate workspace files")?;
    session.print_changes(&changes);

    Ok(())
}
