pub mod error;
pub mod export;
pub mod feature;
pub mod info;
pub mod model;
pub mod parser;
pub mod refdb;
pub mod resolver;
pub mod writer;

pub use error::{Error, Result};
pub use export::{ExportConfig, ExportSummary, Exporter, InputSource, OutputTarget};
pub use model::{ObservationRecord, PointClass, ResolvedPoint};
pub use refdb::{ReferenceDatabase, ReferenceStore};
pub use writer::{GamaWriter, GeoJsonWriter};
