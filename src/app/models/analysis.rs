//! Analysis result records produced by the AI workflow subsystem
//!
//! The catalog does not run workflows. It stores the result records it is
//! handed, tracks their status and lets completed results be referenced
//! from collections and items through `derived_from` links.

use super::{Geometry, Link, TemporalExtent, validate_catalog_id};
use crate::constants::rel;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow run status
///
/// `Pending -> Processing -> {Completed, Failed, Cancelled}`, with
/// `Pending -> Cancelled` allowed for runs that never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Completed | AnalysisStatus::Failed | AnalysisStatus::Cancelled
        )
    }

    /// True if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        use AnalysisStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
        )
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Processing => "PROCESSING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
            AnalysisStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", name)
    }
}

/// Result of an AI workflow run over an area and time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub workflow_id: String,

    /// Location of the produced asset
    pub asset_href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    pub status: AnalysisStatus,
    pub area_of_interest: Geometry,
    pub time_range: TemporalExtent,

    /// Model confidence in `[0, 1]`
    pub confidence: f64,

    pub updated: DateTime<Utc>,
}

impl AnalysisResult {
    /// Create a pending result record
    pub fn new(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        asset_href: impl Into<String>,
        area_of_interest: Geometry,
        time_range: TemporalExtent,
        confidence: f64,
    ) -> Result<Self> {
        let result = Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            asset_href: asset_href.into(),
            media_type: None,
            status: AnalysisStatus::Pending,
            area_of_interest,
            time_range,
            confidence,
            updated: Utc::now(),
        };
        result.validate()?;
        Ok(result)
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_catalog_id("Analysis result", &self.id)?;

        if self.workflow_id.trim().is_empty() {
            return Err(Error::validation(format!(
                "Analysis result '{}' has an empty workflow id",
                self.id
            )));
        }

        if self.asset_href.trim().is_empty() {
            return Err(Error::validation(format!(
                "Analysis result '{}' has an empty asset href",
                self.id
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::validation(format!(
                "Invalid confidence {}: must be between 0 and 1",
                self.confidence
            )));
        }

        self.area_of_interest.validate()?;
        TemporalExtent::new(self.time_range.start, self.time_range.end)?;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, failing for illegal transitions or terminal records
    pub fn transition(&mut self, next: AnalysisStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::validation(format!(
                "Analysis result '{}' is {} and can no longer change",
                self.id, self.status
            )));
        }

        if !self.status.can_transition_to(next) {
            return Err(Error::validation(format!(
                "Analysis result '{}' cannot move from {} to {}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        self.updated = Utc::now();
        Ok(())
    }

    /// `derived_from` link to the produced asset; only for completed results
    pub fn derived_link(&self) -> Result<Link> {
        if self.status != AnalysisStatus::Completed {
            return Err(Error::validation(format!(
                "Analysis result '{}' is {}; only COMPLETED results can be linked",
                self.id, self.status
            )));
        }

        let mut link = Link::new(rel::DERIVED_FROM, self.asset_href.clone())?
            .with_title(format!("{} ({})", self.workflow_id, self.id));
        if let Some(media_type) = &self.media_type {
            link = link.with_media_type(media_type.clone());
        }
        Ok(link)
    }
}
