//! Typed block content.
//!
//! Each block kind has its own payload struct. [`BlockContent`] is the single
//! dispatch point: callers validate or inspect content through it instead of
//! switching on the kind themselves.

use serde::{Deserialize, Serialize};
use validator::ValidateUrl;

use crate::error::CoreError;
use crate::form::FormDefinition;
use crate::status::BlockKind;

/// Content that can check its own invariants before it is stored.
pub trait ValidateContent {
    fn validate(&self) -> Result<(), CoreError>;
}

/// Markdown text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub body: String,
}

/// A link to an external resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalContent {
    pub url: String,
    pub label: Option<String>,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: Option<String>,
    pub body: String,
}

/// An ordered slide deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationContent {
    pub slides: Vec<Slide>,
}

/// A reference into the blob store. The bytes themselves live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    pub blob_key: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
}

/// Content of a block, tagged by kind in JSON (`{"type": "text", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockContent {
    Text(TextContent),
    External(ExternalContent),
    Presentation(PresentationContent),
    Form(FormDefinition),
    File(FileContent),
}

impl BlockContent {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Text(_) => BlockKind::Text,
            BlockContent::External(_) => BlockKind::External,
            BlockContent::Presentation(_) => BlockKind::Presentation,
            BlockContent::Form(_) => BlockKind::Form,
            BlockContent::File(_) => BlockKind::File,
        }
    }

    fn inner(&self) -> &dyn ValidateContent {
        match self {
            BlockContent::Text(c) => c,
            BlockContent::External(c) => c,
            BlockContent::Presentation(c) => c,
            BlockContent::Form(c) => c,
            BlockContent::File(c) => c,
        }
    }

    /// Form definition, if this is a form block.
    pub fn as_form(&self) -> Option<&FormDefinition> {
        match self {
            BlockContent::Form(form) => Some(form),
            _ => None,
        }
    }

    /// Decode stored JSON content.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("Invalid block content: {e}")))
    }
}

impl ValidateContent for BlockContent {
    fn validate(&self) -> Result<(), CoreError> {
        self.inner().validate()
    }
}

impl ValidateContent for TextContent {
    fn validate(&self) -> Result<(), CoreError> {
        if self.body.trim().is_empty() {
            return Err(CoreError::Validation("Text body must not be empty".into()));
        }
        Ok(())
    }
}

impl ValidateContent for ExternalContent {
    fn validate(&self) -> Result<(), CoreError> {
        if !self.url.validate_url() {
            return Err(CoreError::Validation(format!(
                "'{}' is not a valid URL",
                self.url
            )));
        }
        Ok(())
    }
}

impl ValidateContent for PresentationContent {
    fn validate(&self) -> Result<(), CoreError> {
        if self.slides.is_empty() {
            return Err(CoreError::Validation(
                "A presentation needs at least one slide".into(),
            ));
        }
        Ok(())
    }
}

impl ValidateContent for FileContent {
    fn validate(&self) -> Result<(), CoreError> {
        if self.blob_key.trim().is_empty() || self.file_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "File blocks need a blob_key and a file_name".into(),
            ));
        }
        if self.size_bytes.is_some_and(|s| s < 0) {
            return Err(CoreError::Validation("size_bytes must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_tagged_content() {
        let content = BlockContent::from_json(json!({
            "type": "external",
            "url": "https://example.org/survey",
            "label": "Survey"
        }))
        .unwrap();
        assert_eq!(content.kind(), BlockKind::External);
        assert!(content.validate().is_ok());
    }

    #[test]
    fn unknown_tag_is_a_validation_error() {
        assert_matches!(
            BlockContent::from_json(json!({ "type": "video", "src": "x" })),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn each_kind_validates_its_own_fields() {
        let empty_text = BlockContent::Text(TextContent { body: " ".into() });
        assert!(empty_text.validate().is_err());

        let bad_link = BlockContent::External(ExternalContent {
            url: "not a url".into(),
            label: None,
            open_in_new_tab: false,
        });
        assert!(bad_link.validate().is_err());

        let no_slides = BlockContent::Presentation(PresentationContent { slides: vec![] });
        assert!(no_slides.validate().is_err());

        let no_blob = BlockContent::File(FileContent {
            blob_key: String::new(),
            file_name: "consent.pdf".into(),
            mime_type: None,
            size_bytes: None,
        });
        assert!(no_blob.validate().is_err());
    }

    #[test]
    fn only_form_blocks_expose_a_form() {
        let form = BlockContent::from_json(json!({
            "type": "form",
            "questions": [{ "id": "q1", "label": "Age group", "kind": "text" }]
        }))
        .unwrap();
        assert!(form.as_form().is_some());

        let text = BlockContent::Text(TextContent { body: "Hello".into() });
        assert!(text.as_form().is_none());
    }
}
