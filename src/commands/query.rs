// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Query command - prints a selection without touching the workspace

use super::Session;
use crate::selection::resolve_selection;
use anyhow::{Context, Result};

/// Run the query command
pub fn run(session: &Session, ranges: &[String]) -> Result<()> {
    let index = session.load_index()?;
    let selection = resolve_selection(&index, ranges).context("Invalid package selection")?;

    for package in selection.iter() {
        println!("{}", package.name);
    }

    Ok(())
}
