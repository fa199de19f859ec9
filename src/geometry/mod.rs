//! Pure geometry and classification helpers (component A).
//!
//! Everything here is deterministic and side-effect free: no LLM calls, no
//! IO. `direction` and `classify` are exercised directly by property tests
//! (sector determinism, classification order) elsewhere in the crate.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::room::{Classification, EnrichedRoom, Room, Sector};

/// Locate a centroid in the 3x3 grid over the plot. Boundaries between
/// thirds are half-open (`<`): a centroid exactly on a gridline falls into
/// the lower-index cell.
pub fn direction(center_x: f64, center_y: f64, plot_w: f64, plot_d: f64) -> Sector {
    let col = grid_index(center_x, plot_w);
    let row = grid_index(center_y, plot_d);

    const GRID: [[Sector; 3]; 3] = [
        [Sector::Nw, Sector::N, Sector::Ne],
        [Sector::W, Sector::Center, Sector::E],
        [Sector::Sw, Sector::S, Sector::Se],
    ];
    GRID[row][col]
}

fn grid_index(coord: f64, extent: f64) -> usize {
    if extent <= 0.0 {
        return 1;
    }
    let third = extent / 3.0;
    if coord < third {
        0
    } else if coord < third * 2.0 {
        1
    } else {
        2
    }
}

/// Ordered (name, tag) rules; first match wins. Order is normative: more
/// specific patterns (e.g. "master bed...") must precede the generic
/// fallback pattern they would otherwise also match (e.g. "bed...").
static CLASSIFICATION_RULES: Lazy<Vec<(Regex, Classification)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?i)master\s*bed").unwrap(),
            Classification::MasterBedroom,
        ),
        (
            Regex::new(r"(?i)pooja|puja|prayer|mandir").unwrap(),
            Classification::PoojaRoom,
        ),
        (
            Regex::new(r"(?i)toilet|wc|lavatory").unwrap(),
            Classification::Toilet,
        ),
        (
            Regex::new(r"(?i)bath").unwrap(),
            Classification::Bathroom,
        ),
        (
            Regex::new(r"(?i)kitchen").unwrap(),
            Classification::Kitchen,
        ),
        (
            Regex::new(r"(?i)din(ing|er)").unwrap(),
            Classification::DiningRoom,
        ),
        (
            Regex::new(r"(?i)living|lounge|family").unwrap(),
            Classification::LivingRoom,
        ),
        (
            Regex::new(r"(?i)stud(y|io)|office").unwrap(),
            Classification::Study,
        ),
        (
            Regex::new(r"(?i)balcon").unwrap(),
            Classification::Balcony,
        ),
        (
            Regex::new(r"(?i)store|storage|pantry").unwrap(),
            Classification::Storage,
        ),
        (
            Regex::new(r"(?i)stair").unwrap(),
            Classification::Staircase,
        ),
        (
            Regex::new(r"(?i)foyer").unwrap(),
            Classification::Foyer,
        ),
        (
            Regex::new(r"(?i)entrance|entry").unwrap(),
            Classification::Entrance,
        ),
        (
            Regex::new(r"(?i)park(ing)?").unwrap(),
            Classification::Parking,
        ),
        (
            Regex::new(r"(?i)garage").unwrap(),
            Classification::Garage,
        ),
        (
            Regex::new(r"(?i)corridor|hallway|passage").unwrap(),
            Classification::Corridor,
        ),
        (
            Regex::new(r"(?i)garden|yard|lawn").unwrap(),
            Classification::Garden,
        ),
        (
            Regex::new(r"(?i)utility|laundry|wash").unwrap(),
            Classification::UtilityRoom,
        ),
        (
            Regex::new(r"(?i)bed(room)?").unwrap(),
            Classification::Bedroom,
        ),
    ]
});

/// Classify a room by its display name. Unmatched names default to
/// `Bedroom`, matching the source table's fallback. The table is closed and
/// matching order is normative.
pub fn classify(name: &str) -> Classification {
    for (pattern, tag) in CLASSIFICATION_RULES.iter() {
        if pattern.is_match(name) {
            return *tag;
        }
    }
    Classification::Bedroom
}

/// Enrich a batch of rooms against a plot with derived centroid, area,
/// sector, and classification. Pure; safe to call repeatedly (idempotent on
/// already-enriched input when re-derived from the underlying `Room`).
pub fn enrich(rooms: &[Room], plot_w: f64, plot_d: f64) -> Vec<EnrichedRoom> {
    rooms
        .iter()
        .map(|room| {
            let centroid = room.rect.centroid();
            let area = room.rect.area();
            let sector = direction(centroid.0, centroid.1, plot_w, plot_d);
            let classification = classify(&room.name);
            EnrichedRoom {
                room: room.clone(),
                centroid,
                area,
                sector,
                classification,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_center_of_plot_is_center() {
        assert_eq!(direction(5.0, 5.0, 10.0, 10.0), Sector::Center);
    }

    #[test]
    fn direction_corners() {
        assert_eq!(direction(0.1, 0.1, 12.0, 18.0), Sector::Nw);
        assert_eq!(direction(11.9, 17.9, 12.0, 18.0), Sector::Se);
        assert_eq!(direction(11.9, 0.1, 12.0, 18.0), Sector::Ne);
        assert_eq!(direction(0.1, 17.9, 12.0, 18.0), Sector::Sw);
    }

    #[test]
    fn direction_boundary_is_half_open_lower_cell() {
        // Exactly on a third boundary falls into the lower-index (left/top) cell.
        let third = 12.0 / 3.0;
        assert_eq!(direction(third, 9.0, 12.0, 18.0), Sector::W);
    }

    #[test]
    fn direction_never_outside_nine_cells() {
        for x in 0..120 {
            for y in 0..180 {
                let sector = direction(x as f64 / 10.0, y as f64 / 10.0, 12.0, 18.0);
                let all = [
                    Sector::Nw,
                    Sector::N,
                    Sector::Ne,
                    Sector::W,
                    Sector::Center,
                    Sector::E,
                    Sector::Sw,
                    Sector::S,
                    Sector::Se,
                ];
                assert!(all.contains(&sector));
            }
        }
    }

    #[test]
    fn classify_master_bedroom_precedes_bedroom() {
        assert_eq!(classify("Master Bedroom"), Classification::MasterBedroom);
        assert_eq!(classify("Bedroom 2"), Classification::Bedroom);
    }

    #[test]
    fn classify_pooja_variants() {
        assert_eq!(classify("Puja Room"), Classification::PoojaRoom);
        assert_eq!(classify("Mandir"), Classification::PoojaRoom);
    }

    #[test]
    fn classify_toilet_distinct_from_bathroom() {
        assert_eq!(classify("Toilet"), Classification::Toilet);
        assert_eq!(classify("Attached Bathroom"), Classification::Bathroom);
    }

    #[test]
    fn classify_unmatched_defaults_to_bedroom() {
        assert_eq!(classify("Zzyxx Room"), Classification::Bedroom);
    }

    #[test]
    fn enrich_is_idempotent_on_rederivation() {
        use crate::models::room::{Rect, RoomType};
        let rooms = vec![Room {
            id: "r1".into(),
            name: "Kitchen".into(),
            room_type: RoomType::Room,
            rect: Rect { x: 1.0, y: 1.0, width: 3.0, height: 3.0 },
            features: vec![],
            guidance: String::new(),
            floor: None,
        }];
        let once = enrich(&rooms, 12.0, 18.0);
        let twice = enrich(&rooms, 12.0, 18.0);
        assert_eq!(once[0].centroid, twice[0].centroid);
        assert_eq!(once[0].area, twice[0].area);
        assert_eq!(once[0].sector, twice[0].sector);
        assert_eq!(once[0].classification, twice[0].classification);
    }
}
