//! Content blocks carried by tool results, prompt messages and sampling.

use serde::{Deserialize, Serialize};

use super::core::Annotations;
use super::resources::{Resource, ResourceContents};

/// A piece of content, discriminated by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain text
    #[serde(rename = "text")]
    Text(TextContent),
    /// Base64-encoded image
    #[serde(rename = "image")]
    Image(ImageContent),
    /// Base64-encoded audio
    #[serde(rename = "audio")]
    Audio(AudioContent),
    /// Link to a resource the client may read
    #[serde(rename = "resource_link")]
    ResourceLink(Resource),
    /// Resource embedded inline
    #[serde(rename = "resource")]
    Resource(EmbeddedResource),
}

impl ContentBlock {
    /// Shorthand for a text block without annotations
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent {
            text: text.into(),
            annotations: None,
        })
    }

    /// The text of a text block
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

/// Text content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text
    pub text: String,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

/// Image content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64-encoded image data
    pub data: String,
    /// Image MIME type
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

/// Audio content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioContent {
    /// Base64-encoded audio data
    pub data: String,
    /// Audio MIME type
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

/// Resource contents embedded in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedResource {
    /// The embedded contents
    pub resource: ResourceContents,
    /// Optional annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_block_wire_shape() {
        assert_eq!(
            serde_json::to_value(ContentBlock::text("hi")).unwrap(),
            json!({"type": "text", "text": "hi"})
        );
    }

    #[test]
    fn test_parse_mixed_blocks() {
        let blocks: Vec<ContentBlock> = serde_json::from_value(json!([
            {"type": "image", "data": "AAAA", "mimeType": "image/png"},
            {"type": "resource", "resource": {"uri": "file:///a.txt", "text": "body"}},
            {"type": "resource_link", "uri": "file:///b", "name": "b"}
        ]))
        .unwrap();
        assert!(matches!(blocks[0], ContentBlock::Image(_)));
        match &blocks[1] {
            ContentBlock::Resource(embedded) => {
                assert_eq!(embedded.resource.uri(), "file:///a.txt");
            }
            other => panic!("unexpected block {other:?}"),
        }
        assert!(matches!(blocks[2], ContentBlock::ResourceLink(_)));
        assert_eq!(blocks[0].as_text(), None);
    }
}
