pub mod error;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod testutil;
pub mod traits;

pub use error::PipelineError;
pub use models::ExtractionResult;
pub use pipeline::Pipeline;
pub use schema::{FieldSchema, FieldType};
pub use traits::{Extractor, Fetcher, Normalizer};
