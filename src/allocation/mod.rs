// Vehicle allocation - capacity-fit matching, the tier ladder, and the
// store-backed service front.

pub mod matcher;
pub mod search;

pub use matcher::{AllocationMatcher, Band, Suggestion, WastageSuggestion};
pub use search::{staged_search, TierKind, TieredOutcome};

use std::sync::Arc;

use serde::Serialize;

use crate::config::AllocationConfig;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::store::Repository;

/// Allocation request category. Wastage loads skip the utilization bands and
/// match on closest capacity instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    General,
    Wastage,
}

impl Category {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("wastage") {
            Category::Wastage
        } else {
            Category::General
        }
    }
}

/// What a suggestion request returns; the wastage path ranks differently
/// enough to carry its own shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SuggestionSet {
    Ranked(Vec<Suggestion>),
    Wastage(Vec<WastageSuggestion>),
}

/// Store-backed allocation front: reads the fleet, delegates to the matcher.
pub struct AllocationService {
    repo: Arc<Repository>,
    matcher: AllocationMatcher,
}

impl AllocationService {
    pub fn new(repo: Arc<Repository>, config: AllocationConfig) -> Self {
        Self {
            repo,
            matcher: AllocationMatcher::new(config),
        }
    }

    pub async fn suggest_vehicles(
        &self,
        weight: f64,
        category: Category,
        min_util: f64,
        max_util: f64,
    ) -> WorkflowResult<SuggestionSet> {
        validate_weight(weight)?;
        let vehicles = self.repo.vehicles().await?;
        Ok(match category {
            Category::Wastage => {
                SuggestionSet::Wastage(self.matcher.suggest_wastage(&vehicles, weight))
            }
            Category::General => SuggestionSet::Ranked(self.matcher.suggest(
                &vehicles,
                weight,
                Band::new(min_util, max_util),
            )),
        })
    }

    pub async fn staged_search(&self, weight: f64) -> WorkflowResult<TieredOutcome> {
        validate_weight(weight)?;
        let vehicles = self.repo.vehicles().await?;
        Ok(staged_search(&self.matcher, &vehicles, weight))
    }

    pub async fn suggest_combination(
        &self,
        weight: f64,
        min_util: f64,
        max_util: f64,
    ) -> WorkflowResult<Vec<Suggestion>> {
        validate_weight(weight)?;
        let vehicles = self.repo.vehicles().await?;
        Ok(self
            .matcher
            .suggest_pairs(&vehicles, weight, Band::new(min_util, max_util)))
    }
}

fn validate_weight(weight: f64) -> WorkflowResult<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(WorkflowError::Validation(
            "a positive weight is required".to_string(),
        ))
    }
}
