//! JSON wire shapes of the rendering API.
//!
//! These are the raw, unvalidated request bodies and the success body shared
//! by the server and [`crate::client::DeckClient`]. Validation lives in
//! [`super::normalize`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValidationError;

/// Bullet text: one multi-line string, or lines already split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Text(String),
    Lines(Vec<String>),
}

impl Default for TextContent {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

/// One captioned image of a slide request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub gcs_url: String,
    /// Caption shown above the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body of `POST /generate`, and one element of `projects` for
/// `POST /generate_multi`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_gcs_url: Option<String>,
    /// Local logo file, used verbatim without a fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<ImageData>>,
    /// Defaults to `true` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_eqi: Option<bool>,
    /// Artifact file name to publish under instead of a timestamped one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl SlideRequest {
    /// Decode an already parsed JSON body.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::new("Request body must be a JSON object"));
        }
        serde_json::from_value(value)
            .map_err(|e| ValidationError::new(format!("Invalid request body: {e}")))
    }
}

/// Body of `POST /generate_multi`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSlideRequest {
    pub projects: Vec<SlideRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MultiSlideRequest {
    /// Decode an already parsed JSON body.
    ///
    /// A missing, `null` or empty `projects` member and a non-array one are
    /// told apart so the client gets a precise message. Errors inside one
    /// project carry its 1-based position.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut body) = value else {
            return Err(ValidationError::new("Request body must be a JSON object"));
        };

        let projects = match body.remove("projects") {
            None | Some(Value::Null) => {
                return Err(ValidationError::new("Projects array is required"));
            },
            Some(Value::Array(projects)) if projects.is_empty() => {
                return Err(ValidationError::new("Projects array is required"));
            },
            Some(Value::Array(projects)) => projects,
            Some(_) => return Err(ValidationError::new("Projects must be an array")),
        };

        let projects = projects
            .into_iter()
            .enumerate()
            .map(|(index, project)| {
                SlideRequest::from_value(project).map_err(|e| project_error(index, &e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let filename = match body.remove("filename") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(ValidationError::new("Filename must be a string")),
        };

        Ok(Self { projects, filename })
    }
}

/// Qualify a per-project error with its 1-based position.
pub(crate) fn project_error(index: usize, error: &ValidationError) -> ValidationError {
    ValidationError::new(format!(
        "Error processing project {}: {}",
        index + 1,
        error.message()
    ))
}

/// Success body of both rendering routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub status: String,
    pub message: String,
    pub presentation_url: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_count: Option<usize>,
}
