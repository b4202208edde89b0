//! Staged allocation search.
//!
//! The caller-facing policy walks a fixed ladder of utilization tiers, best
//! fit first: exact 100% single vehicles down through 70%, then 2-3-vehicle
//! combinations over [70, 100], then the widest single-vehicle net [0, 100]
//! with a flag that an extra manually entered vehicle will be needed. One
//! loop over the ladder; the tier boundaries and their order are behavior,
//! not tuning, and must not change.

use serde::Serialize;
use tracing::debug;

use crate::allocation::matcher::{AllocationMatcher, Band, Suggestion};
use crate::records::Vehicle;

/// The single-vehicle tiers, tried strictly in this order.
const SINGLE_TIERS: [Band; 7] = [
    Band::new(100.0, 100.0),
    Band::new(95.0, 99.0),
    Band::new(90.0, 94.0),
    Band::new(85.0, 89.0),
    Band::new(80.0, 84.0),
    Band::new(75.0, 79.0),
    Band::new(70.0, 74.0),
];

const COMBINATION_TIER: Band = Band::new(70.0, 100.0);
const WIDEST_TIER: Band = Band::new(0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Single,
    Combination,
    WidestSingle,
}

/// Result of the staged search: which tier produced the suggestions, plus
/// the manual-entry escape hatches the order form needs.
#[derive(Debug, Clone, Serialize)]
pub struct TieredOutcome {
    pub suggestions: Vec<Suggestion>,
    pub tier: Option<TierKind>,
    pub band: Option<(f64, f64)>,
    /// Set when even the widest single-vehicle tier cannot cover the weight
    /// alone and the caller must add another vehicle by hand.
    pub requires_additional_vehicle: bool,
    /// Payload left uncovered by the top suggestion, when flagged above.
    pub capacity_deficit: Option<f64>,
    pub allow_manual_entry: bool,
}

impl TieredOutcome {
    fn empty() -> Self {
        Self {
            suggestions: Vec::new(),
            tier: None,
            band: None,
            requires_additional_vehicle: false,
            capacity_deficit: None,
            allow_manual_entry: true,
        }
    }
}

struct TierSpec {
    band: Band,
    kind: TierKind,
    min_size: usize,
    max_size: usize,
}

fn ladder(max_combination_size: usize) -> Vec<TierSpec> {
    let mut tiers: Vec<TierSpec> = SINGLE_TIERS
        .iter()
        .map(|band| TierSpec {
            band: *band,
            kind: TierKind::Single,
            min_size: 1,
            max_size: 1,
        })
        .collect();
    tiers.push(TierSpec {
        band: COMBINATION_TIER,
        kind: TierKind::Combination,
        min_size: 2,
        max_size: max_combination_size,
    });
    tiers.push(TierSpec {
        band: WIDEST_TIER,
        kind: TierKind::WidestSingle,
        min_size: 1,
        max_size: 1,
    });
    tiers
}

/// Walk the ladder and return the first tier with any suggestion.
pub fn staged_search(
    matcher: &AllocationMatcher,
    vehicles: &[Vehicle],
    weight: f64,
) -> TieredOutcome {
    for tier in ladder(matcher.config().max_combination_size) {
        let suggestions =
            matcher.suggest_sized(vehicles, weight, tier.band, tier.min_size, tier.max_size);
        if suggestions.is_empty() {
            continue;
        }

        debug!(
            tier = ?tier.kind,
            band_min = tier.band.min,
            band_max = tier.band.max,
            hits = suggestions.len(),
            "Allocation tier matched"
        );

        let requires_additional = tier.kind == TierKind::WidestSingle;
        let deficit = if requires_additional {
            Some((weight - suggestions[0].total_capacity).max(0.0))
        } else {
            None
        };
        return TieredOutcome {
            tier: Some(tier.kind),
            band: Some((tier.band.min, tier.band.max)),
            requires_additional_vehicle: requires_additional,
            capacity_deficit: deficit,
            allow_manual_entry: false,
            suggestions,
        };
    }

    TieredOutcome::empty()
}
