//! Room geometry and the enrichment layer built on top of it.

use serde::{Deserialize, Serialize};

/// Coarse usage category for a room rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Room,
    Circulation,
    Outdoor,
    Setback,
    Service,
}

/// A door, window, or plain opening carried on one wall of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Door,
    Window,
    Opening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallFeature {
    pub kind: FeatureKind,
    pub wall: Wall,
    /// Distance along the wall to the start of this feature, in metres.
    pub position: f64,
    /// Width of the feature along the wall, in metres.
    pub width: f64,
}

/// Axis-aligned rectangle in plot-local metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn centroid(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Wall length along the given side, for wall-feature bound checks.
    pub fn wall_length(&self, wall: Wall) -> f64 {
        match wall {
            Wall::Top | Wall::Bottom => self.width,
            Wall::Left | Wall::Right => self.height,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub rect: Rect,
    #[serde(default)]
    pub features: Vec<WallFeature>,
    #[serde(default)]
    pub guidance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<u32>,
}

/// One of the nine cells of a 3x3 partition of the plot, in row-major order
/// `[[NW,N,NE],[W,CENTER,E],[SW,S,SE]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sector {
    Nw,
    N,
    Ne,
    W,
    Center,
    E,
    Sw,
    S,
    Se,
}

/// Closed set of room classification tags driven by name matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    MasterBedroom,
    Bedroom,
    Kitchen,
    LivingRoom,
    DiningRoom,
    Bathroom,
    Toilet,
    PoojaRoom,
    Study,
    Balcony,
    Storage,
    Staircase,
    Entrance,
    Foyer,
    Parking,
    Corridor,
    Garden,
    UtilityRoom,
    Garage,
    Other,
}

/// A `Room` augmented with the derived fields the rest of the system needs:
/// centroid, area, cardinal sector, and classification tag. Produced only by
/// [`crate::geometry::enrich`]; never constructed by hand outside tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRoom {
    #[serde(flatten)]
    pub room: Room,
    pub centroid: (f64, f64),
    pub area: f64,
    pub sector: Sector,
    pub classification: Classification,
}

impl std::ops::Deref for EnrichedRoom {
    type Target = Room;
    fn deref(&self) -> &Room {
        &self.room
    }
}
