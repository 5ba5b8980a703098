use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Renderer-agnostic control type for a form field.
///
/// Inbound strings outside the closed set parse to [`FieldKind::Unknown`]
/// rather than failing; renderers treat those as plain inputs via
/// [`FieldKind::rendered`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Input,
    Textarea,
    Select,
    Checkbox,
    /// Any control string this library does not know.
    Unknown(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Input => "input",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Unknown(other) => other.as_str(),
        }
    }

    /// The kind a renderer should actually use; unknown values degrade to a
    /// plain input.
    pub fn rendered(&self) -> FieldKind {
        match self {
            FieldKind::Unknown(_) => FieldKind::Input,
            other => other.clone(),
        }
    }
}

impl From<String> for FieldKind {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "input" => FieldKind::Input,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "checkbox" => FieldKind::Checkbox,
            _ => FieldKind::Unknown(raw),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Input
    }
}

/// Auxiliary attributes of a field. `name` is the submission payload key and
/// is always non-empty after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    /// Ordered choices for selects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Visible rows for textareas.
    #[serde(default = "default_rows")]
    pub rows: u32,
    /// Anything else a caller attached; passed through untouched.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

fn default_rows() -> u32 {
    4
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            placeholder: String::new(),
            required: false,
            options: Vec::new(),
            rows: default_rows(),
            extra: Map::new(),
        }
    }
}

/// Canonical description of one form field, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub config: FieldConfig,
}
