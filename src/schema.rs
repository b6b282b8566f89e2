use serde_json::{Map, Value, json};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
}

impl FieldKind {
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One entry of a tool's input contract. Validation and the advertised
/// `inputSchema` are both derived from these.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn wrong_type(field: &str, expected: FieldKind) -> Self {
        Self {
            field: field.to_owned(),
            reason: format!("must be a {}", expected.json_type()),
        }
    }

    fn missing(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            reason: "is required".to_owned(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "field": self.field,
            "reason": self.reason
        })
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.field, self.reason)
    }
}

pub fn as_object(arguments: Option<&Value>) -> Result<Map<String, Value>, FieldViolation> {
    match arguments {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(FieldViolation {
            field: "arguments".to_owned(),
            reason: "must be a JSON object".to_owned(),
        }),
    }
}

/// Checks `arguments` against `fields`, collecting every violation rather
/// than stopping at the first. Keys not named in `fields` are ignored.
pub fn validate(fields: &[FieldSpec], arguments: &Map<String, Value>) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    for field in fields {
        match arguments.get(field.name) {
            None if field.required => violations.push(FieldViolation::missing(field.name)),
            None => {}
            Some(value) if field.kind.matches(value) => {}
            Some(_) => violations.push(FieldViolation::wrong_type(field.name, field.kind)),
        }
    }
    violations
}

pub fn input_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(
            field.name.to_owned(),
            json!({
                "type": field.kind.json_type(),
                "description": field.description
            }),
        );
    }
    let required = fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name)
        .collect::<Vec<_>>();

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
