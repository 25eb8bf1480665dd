//! Schema for portfolio case study records
//!
//! Records are uploaded as opaque JSON, but they can be checked against this
//! schema first. Field aliases accept both the plain layout (`name`, `summary`)
//! and the CMS export layout (`Title`, `Summary`, `Foto`, `Tools`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record does not match the case study shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("record failed validation: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("tool entries must not be empty")]
    EmptyTool,
}

/// One portfolio case study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CaseStudy {
    #[serde(alias = "Title", alias = "title")]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,

    #[serde(alias = "Summary", alias = "description")]
    #[validate(length(min = 1, message = "summary must not be empty"))]
    pub summary: String,

    #[serde(default, alias = "Role")]
    #[validate(length(min = 1, message = "role must not be empty"))]
    pub role: Option<String>,

    #[serde(default, alias = "Foto", alias = "image")]
    pub media: Option<MediaRef>,

    #[serde(default, alias = "Tools", alias = "tooling")]
    pub tools: Vec<ToolEntry>,

    #[serde(default)]
    #[validate(length(min = 1, message = "slug must not be empty"))]
    pub slug: Option<String>,
}

impl CaseStudy {
    /// Parse and validate a raw record
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let study = CaseStudy::deserialize(value)?;
        study.validate()?;
        if let Some(media) = &study.media {
            media.validate()?;
        }
        if study.tools.iter().any(|tool| tool.label().trim().is_empty()) {
            return Err(SchemaError::EmptyTool);
        }
        Ok(study)
    }

    pub fn tool_labels(&self) -> Vec<&str> {
        self.tools.iter().map(ToolEntry::label).collect()
    }
}

/// Image reference attached to a case study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "MediaRepr")]
pub struct MediaRef {
    #[validate(length(min = 1, message = "media url must not be empty"))]
    pub url: String,
    pub alt: Option<String>,
}

// Flat `{url, alt}` or the CMS `{data: {attributes: {url, alternativeText}}}` nesting
#[derive(Deserialize)]
#[serde(untagged)]
enum MediaRepr {
    Flat {
        url: String,
        #[serde(default, alias = "alternativeText")]
        alt: Option<String>,
    },
    Nested {
        data: NestedMedia,
    },
}

#[derive(Deserialize)]
struct NestedMedia {
    attributes: NestedMediaAttributes,
}

#[derive(Deserialize)]
struct NestedMediaAttributes {
    url: String,
    #[serde(default, rename = "alternativeText")]
    alternative_text: Option<String>,
}

impl From<MediaRepr> for MediaRef {
    fn from(repr: MediaRepr) -> Self {
        match repr {
            MediaRepr::Flat { url, alt } => MediaRef { url, alt },
            MediaRepr::Nested { data } => MediaRef {
                url: data.attributes.url,
                alt: data.attributes.alternative_text,
            },
        }
    }
}

/// A tool used on the project, either `"Figma"` or `{"Text": "Figma"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolEntry {
    Name(String),
    Labeled {
        #[serde(alias = "Text")]
        text: String,
    },
}

impl ToolEntry {
    pub fn label(&self) -> &str {
        match self {
            ToolEntry::Name(name) => name,
            ToolEntry::Labeled { text } => text,
        }
    }
}
