//! Vehicle allocation matcher.
//!
//! Finds single vehicles or small combinations whose combined capacity best
//! fits a requested payload. Enumeration is exhaustive over 1..=k-vehicle
//! combinations, O(n^k); fine for fleets of tens of vehicles, which is what
//! the vehicle table holds in practice. `max_combination_size` bounds k.

use serde::Serialize;

use crate::config::AllocationConfig;
use crate::records::Vehicle;

/// Inclusive utilization band in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn contains(&self, utilization: f64) -> bool {
        utilization >= self.min && utilization <= self.max
    }
}

/// One ranked allocation candidate.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub vehicles: Vec<Vehicle>,
    /// Percent of combined capacity the payload would occupy.
    pub utilization: f64,
    pub total_capacity: f64,
    /// Capacity left over; negative means the payload does not fit.
    pub remaining_capacity: f64,
    pub is_optimal: bool,
}

/// Wastage-path candidate: ranked by closeness of capacity, not utilization.
#[derive(Debug, Clone, Serialize)]
pub struct WastageSuggestion {
    pub vehicles: Vec<Vehicle>,
    pub utilization: f64,
    pub capacity_diff: f64,
    pub vehicle_type: String,
}

pub struct AllocationMatcher {
    config: AllocationConfig,
}

impl AllocationMatcher {
    pub fn new(config: AllocationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Combinations of 1 up to `max_combination_size` free vehicles inside
    /// the band, optimal-first then by descending utilization, capped at
    /// `max_suggestions`.
    pub fn suggest(&self, vehicles: &[Vehicle], weight: f64, band: Band) -> Vec<Suggestion> {
        self.suggest_sized(vehicles, weight, band, 1, self.config.max_combination_size)
    }

    /// Same search restricted to combination sizes in [min_size, max_size].
    pub fn suggest_sized(
        &self,
        vehicles: &[Vehicle],
        weight: f64,
        band: Band,
        min_size: usize,
        max_size: usize,
    ) -> Vec<Suggestion> {
        let free = free_vehicles(vehicles);
        let mut suggestions = Vec::new();

        for size in min_size..=max_size {
            for combo in combinations(&free, size) {
                if let Some(suggestion) = self.evaluate(&combo, weight, band) {
                    suggestions.push(suggestion);
                }
            }
        }

        suggestions.sort_by(|a, b| {
            b.is_optimal
                .cmp(&a.is_optimal)
                .then(b.utilization.total_cmp(&a.utilization))
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    /// Exhaustive pairwise search (exactly two vehicles), sorted by
    /// descending utilization, capped at `pair_suggestions`.
    pub fn suggest_pairs(&self, vehicles: &[Vehicle], weight: f64, band: Band) -> Vec<Suggestion> {
        let free = free_vehicles(vehicles);
        let mut pairs: Vec<Suggestion> = combinations(&free, 2)
            .into_iter()
            .filter_map(|combo| self.evaluate(&combo, weight, band))
            .collect();

        pairs.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
        pairs.truncate(self.config.pair_suggestions);
        pairs
    }

    /// Wastage path: no utilization bands. Every free vehicle (and same-type
    /// pair) that can carry the weight at all, ranked by absolute capacity
    /// difference ascending and grouped by vehicle type.
    pub fn suggest_wastage(&self, vehicles: &[Vehicle], weight: f64) -> Vec<WastageSuggestion> {
        let free = free_vehicles(vehicles);

        let suitable: Vec<&Vehicle> = free
            .iter()
            .copied()
            .filter(|v| v.capacity_kg > 0.0 && utilization_pct(weight, v.capacity_kg) <= 100.0)
            .collect();

        let mut types: Vec<&str> = suitable.iter().map(|v| v.vehicle_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();

        let mut suggestions = Vec::new();
        for vehicle_type in types {
            let of_type: Vec<&Vehicle> = suitable
                .iter()
                .copied()
                .filter(|v| v.vehicle_type == vehicle_type)
                .collect();

            // Closest single of this type.
            if let Some(best) = of_type
                .iter()
                .min_by(|a, b| diff(weight, a.capacity_kg).total_cmp(&diff(weight, b.capacity_kg)))
            {
                suggestions.push(WastageSuggestion {
                    vehicles: vec![(*best).clone()],
                    utilization: utilization_pct(weight, best.capacity_kg),
                    capacity_diff: diff(weight, best.capacity_kg),
                    vehicle_type: vehicle_type.to_string(),
                });
            }

            // Same-type pairs that still carry the weight.
            for pair in combinations(&of_type, 2) {
                let total: f64 = pair.iter().map(|v| v.capacity_kg).sum();
                let utilization = utilization_pct(weight, total);
                if utilization <= 100.0 {
                    suggestions.push(WastageSuggestion {
                        vehicles: pair.iter().map(|v| (*v).clone()).collect(),
                        utilization,
                        capacity_diff: diff(weight, total),
                        vehicle_type: vehicle_type.to_string(),
                    });
                }
            }
        }

        suggestions.sort_by(|a, b| a.capacity_diff.total_cmp(&b.capacity_diff));
        suggestions.truncate(self.config.wastage_suggestions);
        suggestions
    }

    fn evaluate(&self, combo: &[&Vehicle], weight: f64, band: Band) -> Option<Suggestion> {
        let total: f64 = combo.iter().map(|v| v.capacity_kg).sum();
        if total <= 0.0 {
            return None;
        }
        let utilization = utilization_pct(weight, total);
        if !band.contains(utilization) {
            return None;
        }
        Some(Suggestion {
            vehicles: combo.iter().map(|v| (*v).clone()).collect(),
            utilization,
            total_capacity: total,
            remaining_capacity: total - weight,
            is_optimal: utilization >= self.config.optimal_min
                && utilization <= self.config.optimal_max,
        })
    }
}

fn free_vehicles(vehicles: &[Vehicle]) -> Vec<&Vehicle> {
    vehicles.iter().filter(|v| !v.is_busy).collect()
}

fn utilization_pct(weight: f64, capacity: f64) -> f64 {
    weight / capacity * 100.0
}

fn diff(weight: f64, capacity: f64) -> f64 {
    (capacity - weight).abs()
}

/// All index-ordered combinations of `size` vehicles.
fn combinations<'a>(pool: &[&'a Vehicle], size: usize) -> Vec<Vec<&'a Vehicle>> {
    if size == 0 || size > pool.len() {
        return Vec::new();
    }
    if size == 1 {
        return pool.iter().map(|v| vec![*v]).collect();
    }
    let mut result = Vec::new();
    for (i, head) in pool.iter().enumerate() {
        for mut tail in combinations(&pool[i + 1..], size - 1) {
            let mut combo = Vec::with_capacity(size);
            combo.push(*head);
            combo.append(&mut tail);
            result.push(combo);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: u64, registration: &str, capacity: f64, busy: bool) -> Vehicle {
        Vehicle {
            id,
            registration: registration.to_string(),
            vehicle_type: "Open".to_string(),
            capacity_kg: capacity,
            is_busy: busy,
            current_order: None,
        }
    }

    fn matcher() -> AllocationMatcher {
        AllocationMatcher::new(AllocationConfig::default())
    }

    #[test]
    fn busy_vehicles_are_never_candidates() {
        let fleet = vec![
            vehicle(1, "A", 5000.0, true),
            vehicle(2, "B", 5000.0, false),
        ];
        let found = matcher().suggest(&fleet, 4000.0, Band::new(0.0, 100.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vehicles[0].registration, "B");
    }

    #[test]
    fn overloaded_solo_vehicle_is_excluded_not_clipped() {
        let fleet = vec![vehicle(1, "A", 3000.0, false)];
        let found = matcher().suggest(&fleet, 4500.0, Band::new(0.0, 100.0));
        assert!(found.is_empty());
    }

    #[test]
    fn optimal_band_outranks_higher_utilization_outside_it() {
        // 90% (optimal) must beat 70% (not optimal) and both beat nothing.
        let fleet = vec![
            vehicle(1, "A", 10000.0, false), // 45%
            vehicle(2, "B", 5000.0, false),  // 90%
        ];
        let found = matcher().suggest(&fleet, 4500.0, Band::new(40.0, 100.0));
        assert_eq!(found[0].vehicles[0].registration, "B");
        assert!(found[0].is_optimal);
    }

    #[test]
    fn pair_search_returns_pairs_by_descending_utilization() {
        let fleet = vec![
            vehicle(1, "A", 3000.0, false),
            vehicle(2, "B", 2000.0, false),
            vehicle(3, "C", 4000.0, false),
        ];
        let pairs = matcher().suggest_pairs(&fleet, 5000.0, Band::new(0.0, 100.0));
        assert!(pairs.len() >= 2);
        // A+B = 5000 → 100%, best possible.
        assert_eq!(pairs[0].total_capacity, 5000.0);
        assert_eq!(pairs[0].utilization, 100.0);
        assert!(pairs.iter().all(|p| p.vehicles.len() == 2));
        assert!(pairs.windows(2).all(|w| w[0].utilization >= w[1].utilization));
    }

    #[test]
    fn wastage_ranks_by_capacity_difference_and_drops_overloads() {
        let fleet = vec![
            vehicle(1, "BIG", 5000.0, false),
            vehicle(2, "SMALL", 3000.0, false),
        ];
        let found = matcher().suggest_wastage(&fleet, 4500.0);
        // SMALL cannot carry 4500 solo and is excluded entirely; BIG wins at
        // a 500 kg difference.
        assert_eq!(found[0].vehicles[0].registration, "BIG");
        assert!(found
            .iter()
            .all(|s| s.vehicles.iter().all(|v| v.registration != "SMALL") || s.vehicles.len() > 1));
        assert_eq!(found[0].capacity_diff, 500.0);
    }

    #[test]
    fn empty_fleet_yields_empty_results() {
        let found = matcher().suggest(&[], 4000.0, Band::new(0.0, 100.0));
        assert!(found.is_empty());
        assert!(matcher().suggest_wastage(&[], 4000.0).is_empty());
    }
}
