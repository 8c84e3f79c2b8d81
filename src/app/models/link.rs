//! Typed references from collections and items to other resources

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A STAC link
///
/// Links are owned by exactly one collection or item and have no lifecycle
/// of their own. Within a parent a link is identified by `(rel, href)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Media type of the target
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// Create a validated link
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Result<Self> {
        let link = Self {
            rel: rel.into(),
            href: href.into(),
            title: None,
            media_type: None,
        };
        link.validate()?;
        Ok(link)
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the media type
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Both `rel` and `href` must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.rel.trim().is_empty() {
            return Err(Error::validation(format!(
                "Link to '{}' has an empty rel",
                self.href
            )));
        }

        if self.href.trim().is_empty() {
            return Err(Error::validation(format!(
                "Link with rel '{}' has an empty href",
                self.rel
            )));
        }

        Ok(())
    }

    /// True if this link has the given identity
    pub fn is(&self, rel: &str, href: &str) -> bool {
        self.rel == rel && self.href == href
    }
}
