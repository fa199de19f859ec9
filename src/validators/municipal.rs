//! Static municipal profile table (read-only data, no IO).

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::config::{MunicipalProfile, Setbacks};
use crate::models::room::Classification;

const NATIONAL: &str = "national";

fn min_room_sizes(pairs: &[(Classification, f64)]) -> HashMap<Classification, f64> {
    pairs.iter().cloned().collect()
}

static PROFILES: Lazy<HashMap<&'static str, MunicipalProfile>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(
        NATIONAL,
        MunicipalProfile {
            authority: NATIONAL.to_string(),
            max_far: 1.5,
            max_ground_coverage: 0.65,
            min_room_sizes: min_room_sizes(&[
                (Classification::MasterBedroom, 11.0),
                (Classification::Bedroom, 9.0),
                (Classification::Kitchen, 6.0),
                (Classification::LivingRoom, 12.0),
                (Classification::DiningRoom, 8.0),
                (Classification::Bathroom, 3.0),
                (Classification::Toilet, 1.5),
                (Classification::Study, 6.0),
            ]),
            min_corridor_width: 0.9,
            min_ventilation_ratio: 0.1,
            default_setbacks: Setbacks { front: 3.0, left: 1.5, right: 1.5, rear: 2.0 },
        },
    );
    m.insert(
        "metro",
        MunicipalProfile {
            authority: "metro".to_string(),
            max_far: 2.0,
            max_ground_coverage: 0.7,
            min_room_sizes: min_room_sizes(&[
                (Classification::MasterBedroom, 10.0),
                (Classification::Bedroom, 8.0),
                (Classification::Kitchen, 5.0),
                (Classification::LivingRoom, 10.0),
                (Classification::DiningRoom, 7.0),
                (Classification::Bathroom, 2.5),
                (Classification::Toilet, 1.2),
                (Classification::Study, 5.0),
            ]),
            min_corridor_width: 0.9,
            min_ventilation_ratio: 0.1,
            default_setbacks: Setbacks { front: 1.5, left: 1.0, right: 1.0, rear: 1.5 },
        },
    );
    m.insert(
        "rural",
        MunicipalProfile {
            authority: "rural".to_string(),
            max_far: 1.2,
            max_ground_coverage: 0.5,
            min_room_sizes: min_room_sizes(&[
                (Classification::MasterBedroom, 12.0),
                (Classification::Bedroom, 10.0),
                (Classification::Kitchen, 7.0),
                (Classification::LivingRoom, 14.0),
                (Classification::DiningRoom, 9.0),
                (Classification::Bathroom, 3.5),
                (Classification::Toilet, 1.8),
                (Classification::Study, 7.0),
            ]),
            min_corridor_width: 1.0,
            min_ventilation_ratio: 0.12,
            default_setbacks: Setbacks { front: 4.5, left: 2.0, right: 2.0, rear: 3.0 },
        },
    );
    m
});

/// Look up a municipal profile by its authority tag. Unknown tags fall back
/// to the national default rather than erroring — matching the normative
/// `ConfigInvalid` policy that an unrecognized authority is a warning, not a
/// hard failure.
pub fn lookup(authority: &str) -> MunicipalProfile {
    let key = authority.trim().to_lowercase();
    PROFILES
        .get(key.as_str())
        .cloned()
        .unwrap_or_else(|| PROFILES.get(NATIONAL).expect("national profile always present").clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_authority_falls_back_to_national() {
        let fallback = lookup("some-unheard-of-authority");
        let national = lookup(NATIONAL);
        assert_eq!(fallback.authority, national.authority);
        assert_eq!(fallback.default_setbacks.front, 3.0);
    }

    #[test]
    fn known_authority_is_case_insensitive() {
        let a = lookup("Metro");
        let b = lookup("metro");
        assert_eq!(a.authority, b.authority);
    }
}
