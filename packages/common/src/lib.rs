pub mod category;
pub mod config;
pub mod filename;
pub mod ingest;
pub mod layout;
pub mod location;
pub mod storage;

pub use category::{Cardinality, UploadCategory};
pub use ingest::{IncomingFile, IngestError, IngestReport, Ingestor};
pub use location::{Location, LocationError};
