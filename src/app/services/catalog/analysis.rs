//! Analysis result records and `derived_from` linking
//!
//! Records are handed to the catalog by the workflow subsystem and kept for
//! the lifetime of the catalog handle. Only completed results may be linked
//! from collections or items.

use super::Catalog;
use crate::app::models::{AnalysisResult, AnalysisStatus, Link};
use crate::app::services::link_graph::LinkParent;
use crate::{Error, Result};
use tracing::info;

impl Catalog {
    /// Register a new analysis result record
    pub fn record_analysis_result(&self, result: AnalysisResult) -> Result<()> {
        result.validate()?;

        let mut results = self.analysis_results.write();
        if results.contains_key(&result.id) {
            return Err(Error::conflict("Analysis result", result.id));
        }

        info!(
            "Recorded analysis result '{}' for workflow '{}' ({})",
            result.id, result.workflow_id, result.status
        );
        results.insert(result.id.clone(), result);
        Ok(())
    }

    pub fn get_analysis_result(&self, result_id: &str) -> Result<AnalysisResult> {
        self.analysis_results
            .read()
            .get(result_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Analysis result", result_id))
    }

    /// Results ordered by id
    pub fn list_analysis_results(&self) -> Vec<AnalysisResult> {
        self.analysis_results.read().values().cloned().collect()
    }

    /// Move a result to a new status; terminal results never change
    pub fn transition_analysis_result(
        &self,
        result_id: &str,
        status: AnalysisStatus,
    ) -> Result<AnalysisResult> {
        let mut results = self.analysis_results.write();
        let result = results
            .get_mut(result_id)
            .ok_or_else(|| Error::not_found("Analysis result", result_id))?;

        let previous = result.status;
        result.transition(status)?;

        info!(
            "Analysis result '{}' moved from {} to {}",
            result_id, previous, status
        );
        Ok(result.clone())
    }

    /// Link a completed result from a collection, or from one of its items
    ///
    /// Linking the same result twice is a no-op that returns the existing link.
    pub fn link_derived_result(
        &self,
        collection_id: &str,
        item_id: Option<&str>,
        result_id: &str,
    ) -> Result<Link> {
        let link = self.get_analysis_result(result_id)?.derived_link()?;

        self.modify_collection(collection_id, |collection| {
            let parent: &mut dyn LinkParent = match item_id {
                Some(item_id) => collection.item_metadata_mut(item_id).ok_or_else(|| {
                    Error::not_found("Item", format!("{}/{}", collection_id, item_id))
                })?,
                None => collection,
            };

            if !parent.links().iter().any(|l| l.is(&link.rel, &link.href)) {
                parent.add_link(link.clone())?;
                info!(
                    "Linked analysis result '{}' from {}",
                    result_id,
                    parent.describe()
                );
            }
            Ok(link)
        })
    }
}
