//! GeoJSON features built from resolved points and observations.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::model::{ObservationRecord, ResolvedPoint};

/// Placeholder position for endpoints that were never resolved.
///
/// Puts the line out in the Kattegat where it is easy to spot on a map.
pub const SENTINEL_POSITION: [f64; 2] = [11.0, 56.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: [[f64; 2]; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: P,
    pub geometry: Geometry,
}

impl<P> Feature<P> {
    pub fn new(properties: P, geometry: Geometry) -> Self {
        Self {
            kind: "Feature",
            properties,
            geometry,
        }
    }
}

/// Note the capitalised `Features` key, which downstream tools expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection<'a, P> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "Features")]
    pub features: &'a [Feature<P>],
}

impl<'a, P> FeatureCollection<'a, P> {
    pub fn new(features: &'a [Feature<P>]) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointProperties {
    pub id: String,
    #[serde(rename = "H")]
    pub elevation: f64,
    #[serde(rename = "sH")]
    pub elevation_sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationProperties {
    pub fra: String,
    pub til: String,
    pub dist: f64,
    #[serde(rename = "dH")]
    pub dh: f64,
    pub setups: u32,
    pub journal: String,
}

pub type PointFeature = Feature<PointProperties>;
pub type ObservationFeature = Feature<ObservationProperties>;

pub fn point_feature(point: &ResolvedPoint) -> PointFeature {
    Feature::new(
        PointProperties {
            id: point.ident.clone(),
            elevation: point.elevation,
            elevation_sigma: point.elevation_sigma,
        },
        Geometry::Point {
            coordinates: [point.longitude, point.latitude],
        },
    )
}

/// Points in identifier order.
pub fn point_features(points: &BTreeMap<String, ResolvedPoint>) -> Vec<PointFeature> {
    points.values().map(point_feature).collect()
}

/// Builds observation lines, remembering how many endpoints were unknown.
pub struct ObservationFeatureBuilder<'a> {
    points: &'a BTreeMap<String, ResolvedPoint>,
    sentinel_count: usize,
}

impl<'a> ObservationFeatureBuilder<'a> {
    pub fn new(points: &'a BTreeMap<String, ResolvedPoint>) -> Self {
        Self {
            points,
            sentinel_count: 0,
        }
    }

    pub fn sentinel_count(&self) -> usize {
        self.sentinel_count
    }

    pub fn build(&mut self, observation: &ObservationRecord) -> ObservationFeature {
        let from = self.position(&observation.from_id);
        let to = self.position(&observation.to_id);
        Feature::new(
            ObservationProperties {
                fra: observation.from_id.clone(),
                til: observation.to_id.clone(),
                dist: observation.distance,
                dh: observation.delta_height,
                setups: observation.setup_count,
                journal: observation.journal_id.clone(),
            },
            Geometry::LineString {
                coordinates: [from, to],
            },
        )
    }

    pub fn build_all(&mut self, observations: &[ObservationRecord]) -> Vec<ObservationFeature> {
        observations.iter().map(|obs| self.build(obs)).collect()
    }

    fn position(&mut self, ident: &str) -> [f64; 2] {
        match self.points.get(ident) {
            Some(point) => [point.longitude, point.latitude],
            None => {
                warn!("{} is not a registered point, placing it at {:?}", ident, SENTINEL_POSITION);
                self.sentinel_count += 1;
                SENTINEL_POSITION
            }
        }
    }
}
