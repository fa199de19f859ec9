//! Deterministic regulatory validator (component B). No LLM calls; must not
//! panic on well-formed input (`ValidatorInternal` in the error design).

use crate::models::config::MunicipalProfile;
use crate::models::plan::{ComplianceItem, ComplianceStatus, Severity, ValidatorResult, Violation};
use crate::models::room::{Classification, EnrichedRoom, RoomType};

const SETBACK_TOLERANCE_M: f64 = 0.1;
const ROOM_SIZE_TOLERANCE_M2: f64 = 0.1;
const CORRIDOR_TOLERANCE_M: f64 = 0.05;
const ASSUMED_WINDOW_HEIGHT_M: f64 = 1.2;

/// Habitable classifications subject to the ventilation check.
const HABITABLE: &[Classification] = &[
    Classification::MasterBedroom,
    Classification::Bedroom,
    Classification::LivingRoom,
    Classification::DiningRoom,
    Classification::Kitchen,
    Classification::Study,
];

/// Run every regulatory check, in the normative order, against one
/// candidate plan. Same inputs always produce a byte-identical result
/// (P8): no iteration over non-deterministic containers, no randomness.
pub fn validate(
    rooms: &[EnrichedRoom],
    plot_w: f64,
    plot_d: f64,
    profile: &MunicipalProfile,
    floors: u32,
) -> ValidatorResult {
    let mut violations = Vec::new();
    let mut items = Vec::new();

    check_setbacks(rooms, plot_w, plot_d, profile, &mut violations, &mut items);
    check_far(rooms, plot_w, plot_d, profile, floors, &mut violations, &mut items);
    check_ground_coverage(rooms, plot_w, plot_d, profile, &mut violations, &mut items);
    check_min_room_sizes(rooms, profile, &mut violations, &mut items);
    check_corridor_width(rooms, profile, &mut violations, &mut items);
    check_ventilation(rooms, profile, &mut items);

    let penalty: f64 = violations.iter().map(|v| v.severity.regulatory_penalty()).sum();
    let score = (1.0 - penalty).max(0.0);

    ValidatorResult { violations, items, score }
}

fn built_up_area(rooms: &[EnrichedRoom]) -> f64 {
    rooms
        .iter()
        .filter(|r| matches!(r.room.room_type, RoomType::Room | RoomType::Service))
        .map(|r| r.area)
        .sum()
}

fn check_setbacks(
    rooms: &[EnrichedRoom],
    plot_w: f64,
    plot_d: f64,
    profile: &MunicipalProfile,
    violations: &mut Vec<Violation>,
    items: &mut Vec<ComplianceItem>,
) {
    let sb = &profile.default_setbacks;
    let (min_x, max_x) = (sb.left, plot_w - sb.right);
    let (min_y, max_y) = (sb.front, plot_d - sb.rear);
    let mut all_pass = true;

    for room in rooms {
        if !matches!(room.room.room_type, RoomType::Room | RoomType::Circulation | RoomType::Service) {
            continue;
        }
        let rect = &room.room.rect;
        let within = rect.x >= min_x - SETBACK_TOLERANCE_M
            && rect.y >= min_y - SETBACK_TOLERANCE_M
            && (rect.x + rect.width) <= max_x + SETBACK_TOLERANCE_M
            && (rect.y + rect.height) <= max_y + SETBACK_TOLERANCE_M;
        if !within {
            all_pass = false;
            violations.push(Violation {
                rule_id: "setback-compliance".to_string(),
                severity: Severity::Critical,
                room_id: Some(room.room.id.clone()),
                message: format!("Room '{}' intrudes into the required setback envelope", room.room.name),
                recommendation: "Move or resize the room to stay within the setback-adjusted envelope"
                    .to_string(),
            });
        }
    }

    items.push(ComplianceItem {
        rule: "Setback compliance".to_string(),
        status: if all_pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
        message: if all_pass {
            "All rooms lie within the setback-adjusted envelope".to_string()
        } else {
            "One or more rooms intrude into the setback envelope".to_string()
        },
        recommendation: None,
    });
}

fn check_far(
    rooms: &[EnrichedRoom],
    plot_w: f64,
    plot_d: f64,
    profile: &MunicipalProfile,
    floors: u32,
    violations: &mut Vec<Violation>,
    items: &mut Vec<ComplianceItem>,
) {
    let plot_area = plot_w * plot_d;
    let far = if plot_area > 0.0 {
        (built_up_area(rooms) * floors as f64) / plot_area
    } else {
        0.0
    };
    let pass = far <= profile.max_far;
    if !pass {
        violations.push(Violation {
            rule_id: "floor-area-ratio".to_string(),
            severity: Severity::Critical,
            room_id: None,
            message: format!("Floor Area Ratio {:.2} exceeds the maximum of {:.2}", far, profile.max_far),
            recommendation: "Reduce built-up area or floor count".to_string(),
        });
    }
    items.push(ComplianceItem {
        rule: format!("Floor Area Ratio ({:.2} / {:.2} max)", far, profile.max_far),
        status: if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
        message: format!("Computed FAR is {:.2}", far),
        recommendation: None,
    });
}

fn check_ground_coverage(
    rooms: &[EnrichedRoom],
    plot_w: f64,
    plot_d: f64,
    profile: &MunicipalProfile,
    violations: &mut Vec<Violation>,
    items: &mut Vec<ComplianceItem>,
) {
    let plot_area = plot_w * plot_d;
    let coverage = if plot_area > 0.0 { built_up_area(rooms) / plot_area } else { 0.0 };
    let pass = coverage <= profile.max_ground_coverage;
    if !pass {
        violations.push(Violation {
            rule_id: "ground-coverage".to_string(),
            severity: Severity::Major,
            room_id: None,
            message: format!(
                "Ground coverage {:.2} exceeds the maximum of {:.2}",
                coverage, profile.max_ground_coverage
            ),
            recommendation: "Reduce the footprint of ground-floor rooms".to_string(),
        });
    }
    items.push(ComplianceItem {
        rule: "Ground coverage".to_string(),
        status: if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
        message: format!("Computed ground coverage is {:.2}", coverage),
        recommendation: None,
    });
}

fn check_min_room_sizes(
    rooms: &[EnrichedRoom],
    profile: &MunicipalProfile,
    violations: &mut Vec<Violation>,
    items: &mut Vec<ComplianceItem>,
) {
    for room in rooms {
        if !matches!(room.room.room_type, RoomType::Room) {
            continue;
        }
        let Some(&minimum) = profile.min_room_sizes.get(&room.classification) else {
            continue;
        };
        let pass = room.area >= minimum - ROOM_SIZE_TOLERANCE_M2;
        if !pass {
            violations.push(Violation {
                rule_id: "minimum-room-size".to_string(),
                severity: Severity::Major,
                room_id: Some(room.room.id.clone()),
                message: format!(
                    "Room '{}' is {:.2} m² below the minimum of {:.2} m² for its classification",
                    room.room.name, room.area, minimum
                ),
                recommendation: "Enlarge the room to meet the minimum classification area".to_string(),
            });
        }
        items.push(ComplianceItem {
            rule: format!("Minimum room size: {}", room.room.name),
            status: if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
            message: format!("{:.2} m² against minimum {:.2} m²", room.area, minimum),
            recommendation: None,
        });
    }
}

fn check_corridor_width(
    rooms: &[EnrichedRoom],
    profile: &MunicipalProfile,
    violations: &mut Vec<Violation>,
    items: &mut Vec<ComplianceItem>,
) {
    for room in rooms {
        if !matches!(room.room.room_type, RoomType::Circulation) {
            continue;
        }
        let narrow_side = room.room.rect.width.min(room.room.rect.height);
        let pass = narrow_side >= profile.min_corridor_width - CORRIDOR_TOLERANCE_M;
        if !pass {
            violations.push(Violation {
                rule_id: "corridor-width".to_string(),
                severity: Severity::Major,
                room_id: Some(room.room.id.clone()),
                message: format!(
                    "Corridor '{}' is {:.2} m wide, below the minimum of {:.2} m",
                    room.room.name, narrow_side, profile.min_corridor_width
                ),
                recommendation: "Widen the corridor".to_string(),
            });
        }
        items.push(ComplianceItem {
            rule: format!("Corridor width: {}", room.room.name),
            status: if pass { ComplianceStatus::Pass } else { ComplianceStatus::Fail },
            message: format!("{:.2} m against minimum {:.2} m", narrow_side, profile.min_corridor_width),
            recommendation: None,
        });
    }
}

fn check_ventilation(rooms: &[EnrichedRoom], profile: &MunicipalProfile, items: &mut Vec<ComplianceItem>) {
    for room in rooms {
        if !HABITABLE.contains(&room.classification) {
            continue;
        }
        let window_width: f64 = room
            .room
            .features
            .iter()
            .filter(|f| matches!(f.kind, crate::models::room::FeatureKind::Window))
            .map(|f| f.width)
            .sum();
        let ratio = if room.area > 0.0 {
            (window_width * ASSUMED_WINDOW_HEIGHT_M) / room.area
        } else {
            0.0
        };
        let pass = ratio >= profile.min_ventilation_ratio;
        // Ventilation shortfall is a soft WARN, not a hard violation: it is
        // recorded as a ComplianceItem only and never penalizes the score.
        items.push(ComplianceItem {
            rule: format!("Ventilation: {}", room.room.name),
            status: if pass { ComplianceStatus::Pass } else { ComplianceStatus::Warn },
            message: format!("Ventilation ratio {:.2} against minimum {:.2}", ratio, profile.min_ventilation_ratio),
            recommendation: None,
        });
    }
}
