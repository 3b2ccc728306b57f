use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::{ReferenceDatabase, IDENT_PREFIX};
use crate::error::{Error, Result};
use crate::model::{CoordinateRecord, PointInfoRecord};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SridEntry {
    pub sridid: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InfoTypeEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointInfoEntry {
    pub infotype: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub valid_to: Option<String>,
}

/// An observation touching a point, reduced to its registration time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObservationEntry {
    pub registered: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointEntry {
    pub id: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub info: Vec<PointInfoEntry>,
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<CoordinateRecord>,
    #[serde(default)]
    pub observations_to: Vec<ObservationEntry>,
    #[serde(default)]
    pub observations_from: Vec<ObservationEntry>,
}

impl PointEntry {
    /// First identifier record of this point whose text is `ident`.
    fn ident_record(&self, ident: &str) -> Option<&PointInfoEntry> {
        self.info.iter().find(|entry| {
            entry.infotype.starts_with(IDENT_PREFIX) && entry.text.as_deref() == Some(ident)
        })
    }
}

/// The registry as a JSON snapshot held in memory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReferenceStore {
    #[serde(default)]
    pub srids: Vec<SridEntry>,
    #[serde(default)]
    pub infotypes: Vec<InfoTypeEntry>,
    #[serde(default)]
    pub points: Vec<PointEntry>,
}

impl ReferenceStore {
    pub fn open(path: &Path) -> Result<Self> {
        let snapshot_error = |reason: String| Error::Snapshot {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| snapshot_error(e.to_string()))?;
        let store = Self::from_reader(BufReader::new(file))
            .map_err(|e| snapshot_error(e.to_string()))?;
        info!(
            "Loaded reference snapshot {:?}: {} points, {} srids",
            path,
            store.points.len(),
            store.srids.len()
        );
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn point(&self, point_id: &str) -> Option<&PointEntry> {
        self.points.iter().find(|p| p.id == point_id)
    }

    /// All points carrying an identifier record equal to `ident`.
    pub fn points_by_ident(&self, ident: &str) -> Vec<&PointEntry> {
        self.points
            .iter()
            .filter(|p| p.ident_record(ident).is_some())
            .collect()
    }

    pub fn srid(&self, code: &str) -> Option<&SridEntry> {
        self.srids.iter().find(|s| s.name == code)
    }

    pub fn srid_by_id(&self, sridid: i64) -> Option<&SridEntry> {
        self.srids.iter().find(|s| s.sridid == sridid)
    }

    pub fn infotype(&self, name: &str) -> Option<&InfoTypeEntry> {
        self.infotypes.iter().find(|t| t.name == name)
    }
}

impl ReferenceDatabase for ReferenceStore {
    fn lookup_point_info(&self, ident: &str) -> Result<Option<PointInfoRecord>> {
        let found = self.points.iter().find_map(|point| {
            point.ident_record(ident).map(|entry| PointInfoRecord {
                point_id: point.id.clone(),
                infotype: entry.infotype.clone(),
                text: ident.to_string(),
            })
        });
        Ok(found)
    }

    fn lookup_geometry(&self, point_id: &str) -> Result<Option<String>> {
        Ok(self.point(point_id).and_then(|p| p.geometry.clone()))
    }

    fn coordinates(&self, point_id: &str) -> Result<Vec<CoordinateRecord>> {
        Ok(self
            .point(point_id)
            .map(|p| p.coordinates.clone())
            .unwrap_or_default())
    }

    fn lookup_reference_system_id(&self, code: &str) -> Result<i64> {
        Ok(self.srid(code).map(|s| s.sridid).unwrap_or(0))
    }
}
