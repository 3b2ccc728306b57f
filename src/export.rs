use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::feature::{point_features, ObservationFeatureBuilder};
use crate::model::{PointClass, DEFAULT_FIXED_PREFIX};
use crate::parser::RecordParser;
use crate::refdb::ReferenceDatabase;
use crate::resolver::{resolve_reference_system, PointResolver};
use crate::writer::{GamaWriter, GeoJsonWriter};

/// DVR90 height datum.
pub const DEFAULT_ELEVATION_SRID: &str = "EPSG:5799";

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Reference system whose current record supplies the elevation.
    pub elevation_srid_code: String,
    pub fixed_prefix: String,
    pub description: String,
    pub points_path: PathBuf,
    pub observations_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            elevation_srid_code: DEFAULT_ELEVATION_SRID.to_string(),
            fixed_prefix: DEFAULT_FIXED_PREFIX.to_string(),
            description: "bla bla bla".to_string(),
            points_path: PathBuf::from("punkter.geojson"),
            observations_path: PathBuf::from("observationer.geojson"),
        }
    }
}

/// Where the adjustment input goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub const STDIO_SENTINEL: &'static str = "-";

    pub fn from_arg(arg: &str) -> Self {
        if arg == Self::STDIO_SENTINEL {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }

    /// Default target: the first input with extension `.xml`, or stdout
    /// when reading from stdin.
    pub fn default_for(first_input: &str) -> Self {
        if first_input == Self::STDIO_SENTINEL {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(Path::new(first_input).with_extension("xml"))
        }
    }
}

/// A named input stream.
pub struct InputSource {
    pub name: String,
    pub reader: Box<dyn BufRead>,
}

impl InputSource {
    pub fn new(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub points: usize,
    pub fixed_points: usize,
    pub observations: usize,
    pub sentinel_endpoints: usize,
    pub points_path: PathBuf,
    pub observations_path: PathBuf,
    pub output: OutputTarget,
}

/// Runs one conversion from field files to GeoJSON overviews and Gama input.
pub struct Exporter<'a, D: ReferenceDatabase + ?Sized> {
    db: &'a D,
    config: ExportConfig,
}

impl<'a, D: ReferenceDatabase + ?Sized> Exporter<'a, D> {
    pub fn new(db: &'a D, config: ExportConfig) -> Self {
        Self { db, config }
    }

    /// Nothing is written until every input is parsed and every point
    /// resolved. Files already written are left in place if a later one
    /// fails.
    pub fn run(&self, inputs: Vec<InputSource>, output: &OutputTarget) -> Result<ExportSummary> {
        // Read all input files
        let mut parser = RecordParser::new();
        for input in inputs {
            parser.read(&input.name, input.reader)?;
        }
        let parsed = parser.finish();
        info!(
            "Parsed {} observations between {} points ({} lines skipped)",
            parsed.observations.len(),
            parsed.points.len(),
            parsed.skipped_lines
        );

        // Resolve every point before writing anything
        let elevation_srid = resolve_reference_system(self.db, &self.config.elevation_srid_code)?;
        let points = PointResolver::new(self.db, elevation_srid).resolve_all(&parsed.points)?;

        // Build features once, shared by GeoJSON and Gama output
        let point_features = point_features(&points);
        let mut builder = ObservationFeatureBuilder::new(&points);
        let observation_features = builder.build_all(&parsed.observations);

        // GeoJSON output
        let geojson = GeoJsonWriter::new();
        geojson.write(&point_features, &self.config.points_path)?;
        geojson.write(&observation_features, &self.config.observations_path)?;

        // Gama XML output
        let gama = |out: Box<dyn Write>| -> Result<()> {
            let mut out = GamaWriter::new(out).write(
                &self.config.description,
                &self.config.fixed_prefix,
                &points,
                &observation_features,
            )?;
            out.flush()?;
            Ok(())
        };
        match output {
            OutputTarget::Stdout => gama(Box::new(io::stdout().lock()))?,
            OutputTarget::File(path) => {
                gama(Box::new(BufWriter::new(File::create(path)?)))?;
                info!("Written Gama input: {:?}", path);
            }
        }

        let fixed_points = points
            .keys()
            .filter(|ident| PointClass::of(ident, &self.config.fixed_prefix) == PointClass::Fixed)
            .count();
        Ok(ExportSummary {
            points: points.len(),
            fixed_points,
            observations: observation_features.len(),
            sentinel_endpoints: builder.sentinel_count(),
            points_path: self.config.points_path.clone(),
            observations_path: self.config.observations_path.clone(),
            output: output.clone(),
        })
    }
}
