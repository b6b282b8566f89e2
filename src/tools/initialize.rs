use crate::schema::{FieldKind, FieldSpec};
use crate::tools::setup::SetupRequest;
use serde::Deserialize;

pub const NAME: &str = "karasu_initialize";
pub const DESCRIPTION: &str = "Initialize a new Python project with karasu (main.py template and a \
    [project] section in pyproject.toml), then apply the same formatting setup as karasu_setup.";

/// Fields on top of the setup fields.
pub const EXTRA_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("name", FieldKind::String, "Project name."),
    FieldSpec::optional("description", FieldKind::String, "Project description."),
    FieldSpec::optional(
        "version",
        FieldKind::String,
        "Initial project version, e.g. 0.1.0.",
    ),
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InitializeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    #[serde(flatten)]
    pub setup: SetupRequest,
}

impl InitializeRequest {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--initialize".to_owned()];
        let values = [
            ("--name", &self.name),
            ("--description", &self.description),
            ("--version", &self.version),
        ];
        for (flag, value) in values {
            if let Some(value) = value {
                args.push(flag.to_owned());
                args.push(value.clone());
            }
        }
        self.setup.push_args(&mut args);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> InitializeRequest {
        serde_json::from_value(value).expect("parse initialize request")
    }

    #[test]
    fn empty_request_only_initializes() {
        assert_eq!(request(json!({})).to_args(), vec!["--initialize"]);
    }

    #[test]
    fn name_and_version() {
        let args = request(json!({"name": "mytool", "version": "0.2.0"})).to_args();
        assert_eq!(
            args,
            vec!["--initialize", "--name", "mytool", "--version", "0.2.0"]
        );
    }

    #[test]
    fn project_flags_come_before_shared_flags() {
        let args = request(json!({
            "dryRun": true,
            "description": "A tool",
            "projectRoot": "/work/new",
            "name": "mytool"
        }))
        .to_args();
        assert_eq!(
            args,
            vec![
                "--initialize",
                "--name",
                "mytool",
                "--description",
                "A tool",
                "--project-root",
                "/work/new",
                "--dry-run",
            ]
        );
    }

    #[test]
    fn setup_fields_are_flattened() {
        let req = request(json!({"python": "3.10", "noFormat": true}));
        assert_eq!(req.setup.python.as_deref(), Some("3.10"));
        assert!(req.setup.no_format);
    }
}
