use serde::Deserialize;

/// Identifier prefix of control points held fixed in the adjustment.
pub const DEFAULT_FIXED_PREFIX: &str = "G.";

/// One height difference measured between two points.
///
/// Numeric fields are parsed when the line is read, so consumers never
/// deal with raw tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub from_id: String,
    pub to_id: String,
    /// Levelled distance as written in the field file (metres).
    pub distance: f64,
    /// Height difference in metres, after suffix repair.
    pub delta_height: f64,
    pub journal_id: String,
    pub setup_count: u32,
}

/// Role of a point in the adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    /// Control point, height held fixed.
    Fixed,
    /// New point, height solved for.
    Adjusted,
}

impl PointClass {
    pub fn of(ident: &str, fixed_prefix: &str) -> Self {
        if ident.starts_with(fixed_prefix) {
            PointClass::Fixed
        } else {
            PointClass::Adjusted
        }
    }
}

/// A point with position and current elevation attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPoint {
    pub ident: String,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    pub elevation_sigma: f64,
}

/// Point-information record matched for an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInfoRecord {
    /// Internal point id in the registry.
    pub point_id: String,
    pub infotype: String,
    pub text: String,
}

/// One entry of a point's coordinate history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoordinateRecord {
    pub sridid: i64,
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub sz: Option<f64>,
    /// Set once the record has been superseded.
    #[serde(default)]
    pub valid_to: Option<String>,
}

impl CoordinateRecord {
    pub fn is_current(&self) -> bool {
        self.valid_to.is_none()
    }
}
