//! Stage templates and generation.
//!
//! Every vehicle on an order owns an independent checkpoint sequence. A
//! single-trip order yields the fixed 7-stage template per vehicle; a
//! multi-leg order yields one order-approval stage plus the entry/verify/exit
//! triad at both ends of every leg, legs in ascending sequence. The list is
//! generated exactly once at order creation and never regenerated.

use std::sync::LazyLock;

use regex::Regex;

use crate::records::{Leg, LegRef, Site, Stage, StageKind, StageStatus, TransportType};
use crate::workflow::roles::Role;

/// The checkpoint role table: who signs off on which kind of stage.
pub fn required_role(kind: StageKind) -> Role {
    match kind {
        StageKind::OrderApproval => Role::Admin,
        StageKind::VehicleEntry | StageKind::VehicleExit => Role::Security,
        StageKind::ConsignmentCheck => Role::Stores,
    }
}

fn pending(
    kind: StageKind,
    site: Option<Site>,
    location: Option<&str>,
    vehicle: &str,
    leg: Option<LegRef>,
) -> Stage {
    Stage {
        kind,
        site,
        location: location.map(str::to_string),
        vehicle: vehicle.to_string(),
        leg,
        status: StageStatus::Pending,
        approver: None,
        department: None,
        timestamp: None,
        action: None,
        comments: None,
    }
}

/// The entry/verify/exit triad at one end of a trip.
fn triad(site: Site, location: &str, vehicle: &str, leg: Option<LegRef>) -> [Stage; 3] {
    [
        pending(StageKind::VehicleEntry, Some(site), Some(location), vehicle, leg),
        pending(StageKind::ConsignmentCheck, Some(site), Some(location), vehicle, leg),
        pending(StageKind::VehicleExit, Some(site), Some(location), vehicle, leg),
    ]
}

/// Generate the full stage list for an order. Pure: no side effects, no
/// store access. For `Single`, `source`/`destination` parameterize the
/// 7-stage template; for `Multiple`, `legs` drive the per-leg triads and
/// `source`/`destination` are ignored.
pub fn generate_stages(
    transport_type: TransportType,
    source: &str,
    destination: &str,
    legs: &[Leg],
    vehicles: &[String],
) -> Vec<Stage> {
    let mut stages = Vec::new();

    match transport_type {
        TransportType::Single => {
            for vehicle in vehicles {
                stages.push(pending(StageKind::OrderApproval, None, None, vehicle, None));
                stages.extend(triad(Site::Source, source, vehicle, None));
                stages.extend(triad(Site::Destination, destination, vehicle, None));
            }
        }
        TransportType::Multiple => {
            let mut ordered: Vec<&Leg> = legs.iter().collect();
            ordered.sort_by_key(|leg| leg.sequence);

            for vehicle in vehicles {
                stages.push(pending(StageKind::OrderApproval, None, None, vehicle, None));
                for leg in &ordered {
                    let leg_ref = Some(LegRef {
                        id: leg.id,
                        sequence: leg.sequence,
                    });
                    stages.extend(triad(Site::Source, &leg.source, vehicle, leg_ref));
                    stages.extend(triad(Site::Destination, &leg.destination, vehicle, leg_ref));
                }
            }
        }
    }

    stages
}

/// A stage name parsed back into its structured identity. The location in
/// parentheses is label text, not identity, so only the kind (and the site,
/// where the bare label pins it down) comes back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLabel {
    pub kind: StageKind,
    pub site: Option<Site>,
}

static LOCATION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("location suffix pattern"));

/// Recover the stage kind from a display name by stripping the parenthetical
/// location suffix, the same normalization the approval endpoints apply.
pub fn parse_label(name: &str) -> Option<ParsedLabel> {
    let bare = LOCATION_SUFFIX.replace(name, "");
    match bare.trim() {
        "Order Approved" => Some(ParsedLabel {
            kind: StageKind::OrderApproval,
            site: None,
        }),
        "Vehicle Entry Approved" => Some(ParsedLabel {
            kind: StageKind::VehicleEntry,
            site: Some(Site::Source),
        }),
        "Vehicle Entry" => Some(ParsedLabel {
            kind: StageKind::VehicleEntry,
            site: Some(Site::Destination),
        }),
        "Consignment Verification" => Some(ParsedLabel {
            kind: StageKind::ConsignmentCheck,
            site: None,
        }),
        "Vehicle Exit" => Some(ParsedLabel {
            kind: StageKind::VehicleExit,
            site: None,
        }),
        _ => None,
    }
}
