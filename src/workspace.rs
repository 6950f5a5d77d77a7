// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Workspace layout and the files generated at the workspace root
//!
//! ```text
//! <root>/
//!   Makefile                       <- generated, name configurable
//!   .autoforge/
//!     selected                     <- selected package names
//!     conftab                      <- configure options
//!     packages/<name>/             <- materialized package trees
//!     build/<name>/                <- out-of-tree build directories
//! ```

use crate::conftab::Conftab;
use crate::error::Result;
use crate::materialize::{write_generated_file, FileChange};
use crate::selection::Selection;
use crate::targets::{Target, TargetGraph};
use crate::template::embedded::EmbeddedFile;
use crate::template::{expand, TemplateEngine};
use crate::types::{ParamValue, TemplateParams};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Private directory under the workspace root
pub const PRIVATE_DIR: &str = ".autoforge";
/// Directory of materialized packages, under [`PRIVATE_DIR`]
pub const PACKAGES_DIR: &str = "packages";
/// File listing the selected packages, under [`PRIVATE_DIR`]
pub const SELECTED_FILENAME: &str = "selected";
/// Conftab file, under [`PRIVATE_DIR`]
pub const CONFTAB_FILENAME: &str = "conftab";

const SELECTED_TEMPLATE: &str = "{% for name in selection %}{{ name }}\n{% endfor %}";

const CONFTAB_TEMPLATE: &str = concat!(
    "{{ conftab.global_section.definition }}",
    "{% for section in conftab.package_sections %}",
    "[{{ section.pkg_name }}]\n{{ section.definition }}",
    "{% endfor %}",
);

const MAKEFILE_TEMPLATE: &str = concat!(
    ".PHONY: default all\n\n",
    "default: {{ default_target }}\n\n",
    "all: build\n\n",
    "{% for t in targets %}",
    "{% if t.phony %}.PHONY: {{ t.target }}\n\n{% endif %}",
    "{{ t.target }}:{% for dep in t.dependencies %} \\\n\t{{ dep }}{% endfor %}\n",
    "{{ t.make_script }}\n",
    "{% endfor %}",
);

static WORKSPACE_TEMPLATE: &[EmbeddedFile] = &[
    EmbeddedFile {
        pathname: ".autoforge/selected",
        mode: 0o644,
        contents: SELECTED_TEMPLATE,
    },
    EmbeddedFile {
        pathname: ".autoforge/conftab",
        mode: 0o644,
        contents: CONFTAB_TEMPLATE,
    },
    EmbeddedFile {
        pathname: "{makefile}",
        mode: 0o644,
        contents: MAKEFILE_TEMPLATE,
    },
];

/// `path` relative to `base` when that is the shorter spelling.
/// A relative result with a single component gets a `./` prefix so that
/// it is never looked up in `PATH`.
#[must_use]
pub fn relative_if_shorter(base: &Path, path: &Path) -> PathBuf {
    let Some(relative) = pathdiff::diff_paths(path, base) else {
        return path.to_path_buf();
    };
    let relative = if relative.components().count() == 1 {
        Path::new(".").join(relative)
    } else {
        relative
    };

    if relative.as_os_str().len() < path.as_os_str().len() {
        relative
    } else {
        path.to_path_buf()
    }
}

/// Locations inside one workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    build_dir: PathBuf,
    executable: PathBuf,
}

impl Workspace {
    /// Create a workspace. A relative `build_dir` is taken relative to
    /// `root`; `executable` is the program the Makefile calls back into.
    pub fn new(
        root: impl Into<PathBuf>,
        build_dir: impl AsRef<Path>,
        executable: impl Into<PathBuf>,
    ) -> Self {
        let root = root.into();
        let build_dir = root.join(build_dir);
        Self {
            root,
            build_dir,
            executable: executable.into(),
        }
    }

    /// Workspace root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of every package build directory
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Build directory as seen from the root, for Makefile targets
    #[must_use]
    pub fn relative_build_dir(&self) -> PathBuf {
        pathdiff::diff_paths(&self.build_dir, &self.root).unwrap_or_else(|| self.build_dir.clone())
    }

    /// `.autoforge` under the root
    #[must_use]
    pub fn private_dir(&self) -> PathBuf {
        self.root.join(PRIVATE_DIR)
    }

    /// Where a package's tree is materialized
    #[must_use]
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.private_dir().join(PACKAGES_DIR).join(name)
    }

    /// Where a package is configured and built
    #[must_use]
    pub fn package_build_dir(&self, name: &str) -> PathBuf {
        self.build_dir.join(name)
    }

    /// Conftab file of the workspace
    #[must_use]
    pub fn conftab_path(&self) -> PathBuf {
        self.private_dir().join(CONFTAB_FILENAME)
    }

    /// File listing the selected packages
    #[must_use]
    pub fn selected_path(&self) -> PathBuf {
        self.private_dir().join(SELECTED_FILENAME)
    }

    /// Command line prefix the Makefile uses to call back into this program
    #[must_use]
    pub fn command(&self) -> String {
        relative_if_shorter(&self.root, &self.executable)
            .to_string_lossy()
            .into_owned()
    }
}

#[derive(Serialize)]
struct WorkspaceContext<'a> {
    selection: Vec<&'a str>,
    conftab: &'a Conftab,
    targets: &'a [Target],
    makefile: &'a str,
    default_target: &'a str,
}

/// Render the selected-package list, the conftab and the Makefile into
/// the workspace root. Unchanged files are not rewritten.
pub fn generate_workspace_files(
    workspace: &Workspace,
    selection: &Selection<'_>,
    conftab: &Conftab,
    makefile: &str,
    default_target: &str,
) -> Result<Vec<FileChange>> {
    let targets = TargetGraph::new(selection, workspace).assemble()?;
    debug!("Assembled {} Makefile targets", targets.len());

    let context = WorkspaceContext {
        selection: selection.names(),
        conftab,
        targets: &targets,
        makefile,
        default_target,
    };

    let mut params = TemplateParams::new();
    params.insert("makefile".into(), ParamValue::from(makefile));
    params.insert("default_target".into(), ParamValue::from(default_target));

    let mut engine = TemplateEngine::new();
    for file in WORKSPACE_TEMPLATE {
        engine.add(file.pathname, file.contents)?;
    }

    let mut changes = Vec::new();
    for file in WORKSPACE_TEMPLATE {
        let text = engine.render(file.pathname, &context)?;
        for expansion in expand(file.pathname, &params) {
            if let Some(change) =
                write_generated_file(&workspace.root, &expansion.pathname, text.as_bytes(), file.mode)?
            {
                changes.push(change);
            }
        }
    }

    Ok(changes)
}
