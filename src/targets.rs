// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Makefile target assembly
//!
//! The workspace Makefile is built from a fixed, ordered set of target
//! types. Each type contributes a global target plus per-package targets
//! in selection order; `help` describes all of them.

use crate::error::Result;
use crate::selection::Selection;
use crate::workspace::{Workspace, PACKAGES_DIR, PRIVATE_DIR};
use serde::Serialize;

/// Width of the wrapped help text
const HELP_WIDTH: usize = 52;

/// One Makefile rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Target name or file
    pub target: String,
    /// Whether the target is declared `.PHONY`
    pub phony: bool,
    /// Prerequisites, in order
    pub dependencies: Vec<String>,
    /// Recipe lines, each tab-indented and newline-terminated
    pub make_script: String,
}

/// Kinds of global targets in the workspace Makefile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Self-documenting target listing
    Help,
    /// Regenerate `configure` scripts
    Bootstrap,
    /// Configure packages in the build directory
    Configure,
    /// Compile and link
    Build,
    /// Run unit tests
    Check,
}

impl TargetType {
    /// Every target type, in Makefile order
    pub const ALL: [Self; 5] = [
        Self::Help,
        Self::Bootstrap,
        Self::Configure,
        Self::Build,
        Self::Check,
    ];

    /// Name of the global target
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Bootstrap => "bootstrap",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Check => "check",
        }
    }

    /// Description shown by `make help`
    #[must_use]
    pub fn help(&self) -> &'static str {
        match self {
            Self::Help => {
                "Display this help message. Unless overridden by the \
                 '--default-target' option, this is the default target."
            }
            Self::Bootstrap => {
                "Unconditionally regenerate the 'configure' scripts \
                 for the selected packages."
            }
            Self::Configure => {
                "Configure the selected packages using the current \
                 options specified in the 'conftab' file."
            }
            Self::Build => {
                "Build (compile and link) the selected packages. For the \
                 packages that have not been configured, the configuration \
                 step will be performed automatically."
            }
            Self::Check => "Build and run unit tests for the selected packages.",
        }
    }
}

/// Greedy word wrap
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

/// Target assembly for one selection in one workspace
#[derive(Debug, Clone)]
pub struct TargetGraph<'a> {
    kinds: Vec<TargetType>,
    packages: Vec<&'a str>,
    workspace: &'a Workspace,
}

impl<'a> TargetGraph<'a> {
    /// Assemble targets of every type for the selection
    #[must_use]
    pub fn new(selection: &Selection<'a>, workspace: &'a Workspace) -> Self {
        Self {
            kinds: TargetType::ALL.to_vec(),
            packages: selection.names(),
            workspace,
        }
    }

    /// Target types in Makefile order
    #[must_use]
    pub fn kinds(&self) -> &[TargetType] {
        &self.kinds
    }

    /// All targets, type by type
    pub fn assemble(&self) -> Result<Vec<Target>> {
        let mut targets = Vec::new();
        for &kind in &self.kinds {
            targets.extend(self.targets(kind)?);
        }
        Ok(targets)
    }

    /// Targets contributed by one type
    pub fn targets(&self, kind: TargetType) -> Result<Vec<Target>> {
        Ok(match kind {
            TargetType::Help => vec![self.help_target()],
            TargetType::Bootstrap => self.bootstrap_targets(),
            TargetType::Configure => self.configure_targets(),
            TargetType::Build | TargetType::Check => Vec::new(),
        })
    }

    fn help_target(&self) -> Target {
        let mut script = String::from(
            "\t@echo \"Usage:\"\n\
             \t@echo \"    make [target...]\"\n\
             \t@echo\n\
             \t@echo \"Global targets:\"\n",
        );

        for kind in &self.kinds {
            script.push_str(&format!("\t@echo \"    {}\"\n", kind.name()));
            for line in wrap(kind.help(), HELP_WIDTH) {
                script.push_str(&format!("\t@echo \"        {line}\"\n"));
            }
            script.push_str("\t@echo\n");
        }

        Target {
            target: TargetType::Help.name().to_string(),
            phony: true,
            dependencies: Vec::new(),
            make_script: script,
        }
    }

    fn global_target(&self, kind: TargetType) -> Target {
        Target {
            target: kind.name().to_string(),
            phony: true,
            dependencies: self
                .packages
                .iter()
                .map(|name| format!("{}_{name}", kind.name()))
                .collect(),
            make_script: String::new(),
        }
    }

    fn bootstrap_targets(&self) -> Vec<Target> {
        let global = self.global_target(TargetType::Bootstrap);
        let mut targets = Vec::with_capacity(1 + 2 * self.packages.len());

        for (name, phony) in self.packages.iter().zip(&global.dependencies) {
            let package_dir = format!("{PRIVATE_DIR}/{PACKAGES_DIR}/{name}");
            targets.push(Target {
                target: phony.clone(),
                phony: true,
                dependencies: Vec::new(),
                make_script: format!(
                    "\t@echo \"[bootstrap] {name}\"\n\t@cd {package_dir} && \\\n\t./autogen.sh\n"
                ),
            });
            targets.push(Target {
                target: format!("{package_dir}/configure"),
                phony: false,
                dependencies: Vec::new(),
                make_script: format!("\t@$(MAKE) -s {phony}\n"),
            });
        }

        targets.insert(0, global);
        targets
    }

    fn configure_targets(&self) -> Vec<Target> {
        let global = self.global_target(TargetType::Configure);
        let build_dir = self.workspace.relative_build_dir();
        let command = self.workspace.command();
        let mut targets = Vec::with_capacity(1 + 2 * self.packages.len());

        for (name, phony) in self.packages.iter().zip(&global.dependencies) {
            let script = format!("\t@{command} configure {name}\n");
            targets.push(Target {
                target: phony.clone(),
                phony: true,
                dependencies: Vec::new(),
                make_script: script.clone(),
            });
            targets.push(Target {
                target: build_dir.join(name).join("Makefile").to_string_lossy().into_owned(),
                phony: false,
                dependencies: Vec::new(),
                make_script: script,
            });
        }

        targets.insert(0, global);
        targets
    }
}
