pub mod etl;
pub mod normalizer;
pub mod pipeline;
pub mod recovery;
pub mod requester;

pub use crate::domain::model::{
    DocumentListing, OutputRow, Record, RunSummary, SourceDocument, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, DocumentSource, GenerativeModel, Pipeline, RowSink};
pub use crate::utils::error::Result;
