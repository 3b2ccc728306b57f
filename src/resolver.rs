use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{CoordinateRecord, ResolvedPoint};
use crate::refdb::ReferenceDatabase;

/// Look up the numeric id of a reference system, failing when unknown.
pub fn resolve_reference_system<D: ReferenceDatabase + ?Sized>(db: &D, code: &str) -> Result<i64> {
    match db.lookup_reference_system_id(code)? {
        0 => Err(Error::ReferenceSystemNotFound {
            code: code.to_string(),
        }),
        id => Ok(id),
    }
}

/// Attaches positions and elevations to point identifiers.
pub struct PointResolver<'a, D: ReferenceDatabase + ?Sized> {
    db: &'a D,
    elevation_srid: i64,
}

impl<'a, D: ReferenceDatabase + ?Sized> PointResolver<'a, D> {
    pub fn new(db: &'a D, elevation_srid: i64) -> Self {
        Self { db, elevation_srid }
    }

    /// Resolve every identifier; the first unknown point or geometry aborts.
    pub fn resolve_all(&self, idents: &BTreeSet<String>) -> Result<BTreeMap<String, ResolvedPoint>> {
        let mut resolved = BTreeMap::new();
        for ident in idents {
            let point = self.resolve(ident)?;
            resolved.insert(ident.clone(), point);
        }
        info!("Resolved {} points", resolved.len());
        Ok(resolved)
    }

    pub fn resolve(&self, ident: &str) -> Result<ResolvedPoint> {
        let pinfo = self
            .db
            .lookup_point_info(ident)?
            .ok_or_else(|| Error::PointNotFound {
                ident: ident.to_string(),
            })?;

        let wkt = self
            .db
            .lookup_geometry(&pinfo.point_id)?
            .ok_or_else(|| Error::GeometryNotFound {
                ident: ident.to_string(),
            })?;
        let (longitude, latitude) = parse_wkt_point(&wkt)?;

        let history = self.db.coordinates(&pinfo.point_id)?;
        let (elevation, elevation_sigma) = match current_elevation(&history, self.elevation_srid) {
            Some(record) => (record.z.unwrap_or(0.0), record.sz.unwrap_or(0.0)),
            None => {
                warn!("No current elevation for {}, using 0", ident);
                (0.0, 0.0)
            }
        };

        debug!(
            "{}: ({}, {}) H={} sH={}",
            ident, longitude, latitude, elevation, elevation_sigma
        );
        Ok(ResolvedPoint {
            ident: ident.to_string(),
            longitude,
            latitude,
            elevation,
            elevation_sigma,
        })
    }
}

/// First unsuperseded record of the elevation reference system.
pub fn current_elevation(history: &[CoordinateRecord], elevation_srid: i64) -> Option<&CoordinateRecord> {
    history
        .iter()
        .find(|record| record.sridid == elevation_srid && record.is_current())
}

/// Parse `POINT (lon lat)` into `(lon, lat)`.
pub fn parse_wkt_point(text: &str) -> Result<(f64, f64)> {
    let bad = || Error::BadGeometryFormat {
        text: text.to_string(),
    };

    let trimmed = text.trim();
    let keyword = trimmed.get(..5).ok_or_else(bad)?;
    if !keyword.eq_ignore_ascii_case("POINT") {
        return Err(bad());
    }
    let body = trimmed[5..]
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(bad)?;

    let values = body
        .split_whitespace()
        .map(|v| v.parse::<f64>().map_err(|_| bad()))
        .collect::<Result<Vec<f64>>>()?;
    match values.as_slice() {
        [lon, lat] => Ok((*lon, *lat)),
        _ => Err(bad()),
    }
}
