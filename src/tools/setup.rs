use crate::schema::{FieldKind, FieldSpec};
use serde::Deserialize;

pub const NAME: &str = "karasu_setup";
pub const DESCRIPTION: &str = "Set up Ruff/Black formatting for a Python repository with karasu: \
    pyproject.toml config, pre-commit hooks, .editorconfig, CI workflow and requirements-dev.txt.";

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "projectRoot",
        FieldKind::String,
        "Project root directory. Defaults to the git top-level directory or the nearest directory with a project marker.",
    ),
    FieldSpec::optional(
        "python",
        FieldKind::String,
        "Python version for CI and tool configuration, e.g. 3.11.",
    ),
    FieldSpec::optional(
        "ruffOnly",
        FieldKind::Boolean,
        "Skip Black; use the Ruff formatter only.",
    ),
    FieldSpec::optional(
        "dryRun",
        FieldKind::Boolean,
        "Report what would change without writing files.",
    ),
    FieldSpec::optional(
        "noFormat",
        FieldKind::Boolean,
        "Skip formatting existing Python files.",
    ),
    FieldSpec::optional(
        "noInstallHooks",
        FieldKind::Boolean,
        "Skip installing pre-commit hooks.",
    ),
    FieldSpec::optional(
        "noVenv",
        FieldKind::Boolean,
        "Skip creating .venv; use system tools instead.",
    ),
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupRequest {
    pub project_root: Option<String>,
    pub python: Option<String>,
    pub ruff_only: bool,
    pub dry_run: bool,
    pub no_format: bool,
    pub no_install_hooks: bool,
    pub no_venv: bool,
}

impl SetupRequest {
    /// Appends the flags shared by every karasu invocation. The order is
    /// fixed; karasu sees them exactly as listed here.
    pub fn push_args(&self, args: &mut Vec<String>) {
        if let Some(root) = &self.project_root {
            args.push("--project-root".to_owned());
            args.push(root.clone());
        }
        if let Some(python) = &self.python {
            args.push("--python".to_owned());
            args.push(python.clone());
        }
        let switches = [
            (self.ruff_only, "--ruff-only"),
            (self.dry_run, "--dry-run"),
            (self.no_format, "--no-format"),
            (self.no_install_hooks, "--no-install-hooks"),
            (self.no_venv, "--no-venv"),
        ];
        for (enabled, flag) in switches {
            if enabled {
                args.push(flag.to_owned());
            }
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        self.push_args(&mut args);
        args
    }
}
