//! Deterministic cultural (Vastu) validator.
//!
//! Declares a closed rule table and runs every rule against every applicable
//! room rather than as bespoke per-rule `if` chains: each `VastuRule` is
//! data (id, applicable classifications, severity, weight, allowed sectors)
//! and `validate` simply folds over the table in a fixed evaluation order.

use crate::models::plan::{ComplianceItem, ComplianceStatus, Severity, ValidatorResult, Violation};
use crate::models::room::{Classification, EnrichedRoom, Sector};

struct VastuRule {
    id: &'static str,
    applies_to: &'static [Classification],
    severity: Severity,
    weight: f64,
    allowed_sectors: &'static [Sector],
    message: &'static str,
    recommendation: &'static str,
}

/// Closed rule table; order is the normative evaluation order (also the
/// byte-identical-output order required by determinism tests).
const RULES: &[VastuRule] = &[
    VastuRule {
        id: "brahmasthan",
        applies_to: &[
            Classification::Kitchen,
            Classification::Bathroom,
            Classification::Toilet,
            Classification::Staircase,
            Classification::Storage,
        ],
        severity: Severity::Critical,
        weight: 0.30,
        allowed_sectors: &[
            Sector::Nw, Sector::N, Sector::Ne, Sector::W, Sector::E, Sector::Sw, Sector::S, Sector::Se,
        ],
        message: "should not occupy the central Brahmasthan sector",
        recommendation: "Relocate away from the CENTER sector",
    },
    VastuRule {
        id: "master-sw",
        applies_to: &[Classification::MasterBedroom],
        severity: Severity::Major,
        weight: 0.15,
        allowed_sectors: &[Sector::Sw],
        message: "should be in the South-West sector",
        recommendation: "Relocate the master bedroom to the SW sector",
    },
    VastuRule {
        id: "kitchen-se-nw",
        applies_to: &[Classification::Kitchen],
        severity: Severity::Major,
        weight: 0.15,
        allowed_sectors: &[Sector::Se, Sector::Nw],
        message: "should be in the South-East or North-West sector",
        recommendation: "Relocate the kitchen to SE or NW",
    },
    VastuRule {
        id: "living-ne-n-e",
        applies_to: &[Classification::LivingRoom],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::Ne, Sector::N, Sector::E],
        message: "is best placed in North, East, or North-East",
        recommendation: "Consider relocating the living room toward N/E/NE",
    },
    VastuRule {
        id: "pooja-ne",
        applies_to: &[Classification::PoojaRoom],
        severity: Severity::Major,
        weight: 0.15,
        allowed_sectors: &[Sector::Ne, Sector::E, Sector::N],
        message: "should be in the North-East sector",
        recommendation: "Relocate the pooja room to NE",
    },
    VastuRule {
        id: "toilet-not-ne-center",
        applies_to: &[Classification::Bathroom, Classification::Toilet],
        severity: Severity::Critical,
        weight: 0.20,
        allowed_sectors: &[Sector::Nw, Sector::N, Sector::W, Sector::E, Sector::Sw, Sector::S, Sector::Se],
        message: "must not occupy the North-East or central sector",
        recommendation: "Relocate away from NE and CENTER",
    },
    VastuRule {
        id: "entrance-n-e-ne",
        applies_to: &[Classification::Entrance, Classification::Foyer],
        severity: Severity::Major,
        weight: 0.12,
        allowed_sectors: &[Sector::N, Sector::E, Sector::Ne],
        message: "should face North, East, or North-East",
        recommendation: "Relocate the entrance toward N/E/NE",
    },
    VastuRule {
        id: "staircase-not-ne-center",
        applies_to: &[Classification::Staircase],
        severity: Severity::Major,
        weight: 0.12,
        allowed_sectors: &[Sector::Nw, Sector::N, Sector::W, Sector::E, Sector::Sw, Sector::S, Sector::Se],
        message: "must avoid the North-East and central sector",
        recommendation: "Relocate the staircase away from NE and CENTER",
    },
    VastuRule {
        id: "study-w-nw",
        applies_to: &[Classification::Study],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::W, Sector::Nw],
        message: "is best placed West or North-West",
        recommendation: "Consider relocating the study to W/NW",
    },
    VastuRule {
        id: "dining-w",
        applies_to: &[Classification::DiningRoom],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::W],
        message: "is best placed West of the kitchen",
        recommendation: "Consider relocating the dining room West",
    },
    VastuRule {
        id: "bedroom-not-ne",
        applies_to: &[Classification::Bedroom],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::Nw, Sector::N, Sector::W, Sector::Center, Sector::E, Sector::Sw, Sector::S, Sector::Se],
        message: "should avoid the North-East sector",
        recommendation: "Relocate the bedroom away from NE",
    },
    VastuRule {
        id: "garage-nw",
        applies_to: &[Classification::Garage, Classification::Parking],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::Nw],
        message: "is best placed North-West",
        recommendation: "Consider relocating parking to NW",
    },
    VastuRule {
        id: "storage-nw-sw",
        applies_to: &[Classification::Storage],
        severity: Severity::Minor,
        weight: 0.05,
        allowed_sectors: &[Sector::Nw, Sector::Sw],
        message: "is best placed North-West or South-West",
        recommendation: "Consider relocating storage to NW/SW",
    },
    VastuRule {
        id: "balcony-n-e",
        applies_to: &[Classification::Balcony],
        severity: Severity::Minor,
        weight: 0.04,
        allowed_sectors: &[Sector::N, Sector::E],
        message: "is best placed North or East",
        recommendation: "Consider relocating the balcony to N/E",
    },
];

/// Validate cultural placement against the closed Vastu rule table. If
/// `strictness` is 0, short-circuits to a score of 1 and a single PASS item
/// (P9): no cultural violations are ever raised at zero strictness.
pub fn validate(rooms: &[EnrichedRoom], strictness: f64) -> ValidatorResult {
    if strictness <= 0.0 {
        return ValidatorResult {
            violations: Vec::new(),
            items: vec![ComplianceItem {
                rule: "Vastu compliance".to_string(),
                status: ComplianceStatus::Pass,
                message: "Vastu checking is disabled (strictness = None)".to_string(),
                recommendation: None,
            }],
            score: 1.0,
        };
    }

    let mut violations = Vec::new();
    let mut items = Vec::new();
    let mut penalty = 0.0;

    for rule in RULES {
        for room in rooms {
            if !rule.applies_to.contains(&room.classification) {
                continue;
            }
            let pass = rule.allowed_sectors.contains(&room.sector);
            if pass {
                items.push(ComplianceItem {
                    rule: rule.id.to_string(),
                    status: ComplianceStatus::Pass,
                    message: format!("'{}' satisfies rule '{}'", room.room.name, rule.id),
                    recommendation: None,
                });
                continue;
            }

            penalty += rule.weight * strictness;
            let status =
                if matches!(rule.severity, Severity::Minor) { ComplianceStatus::Warn } else { ComplianceStatus::Fail };
            let message = format!("'{}' {}", room.room.name, rule.message);
            violations.push(Violation {
                rule_id: rule.id.to_string(),
                severity: rule.severity,
                room_id: Some(room.room.id.clone()),
                message: message.clone(),
                recommendation: rule.recommendation.to_string(),
            });
            items.push(ComplianceItem {
                rule: rule.id.to_string(),
                status,
                message,
                recommendation: Some(rule.recommendation.to_string()),
            });
        }
    }

    ValidatorResult { violations, items, score: (1.0 - penalty).max(0.0) }
}
