mod snapshot;

pub use snapshot::{
    InfoTypeEntry, ObservationEntry, PointEntry, PointInfoEntry, ReferenceStore, SridEntry,
};

use crate::error::Result;
use crate::model::{CoordinateRecord, PointInfoRecord};

/// Info type names starting with this prefix carry point identifiers.
pub const IDENT_PREFIX: &str = "IDENT:";

/// Read access to the fixed point registry.
///
/// `Ok(None)` means the record does not exist; `Err` is reserved for
/// failures of the backend itself.
pub trait ReferenceDatabase {
    /// Find the identifier record whose text equals `ident`.
    fn lookup_point_info(&self, ident: &str) -> Result<Option<PointInfoRecord>>;

    /// Current location of a point as WKT, e.g. `POINT (10.2 56.1)`.
    fn lookup_geometry(&self, point_id: &str) -> Result<Option<String>>;

    /// Full coordinate history of a point, superseded records included.
    fn coordinates(&self, point_id: &str) -> Result<Vec<CoordinateRecord>>;

    /// Numeric id of a reference system, 0 when the code is unknown.
    fn lookup_reference_system_id(&self, code: &str) -> Result<i64>;
}
