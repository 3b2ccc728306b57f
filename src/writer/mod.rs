pub mod gama;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::feature::{Feature, FeatureCollection};

pub use gama::{observation_stdev, GamaWriter};

const INDENT: &[u8] = b"    ";

#[derive(Default)]
pub struct GeoJsonWriter {}

impl GeoJsonWriter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn write<P: Serialize>(&self, features: &[Feature<P>], output_path: &Path) -> Result<()> {
        let file = File::create(output_path)?;
        let mut out = BufWriter::new(file);
        self.write_to(features, &mut out)?;
        out.flush()?;

        tracing::info!(
            "Written {} features: {:?}",
            features.len(),
            output_path
        );
        Ok(())
    }

    pub fn write_to<P: Serialize, W: Write>(&self, features: &[Feature<P>], out: W) -> Result<()> {
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(out, formatter);
        FeatureCollection::new(features).serialize(&mut serializer)?;
        Ok(())
    }
}
