use crate::domain::model::{
    DocumentListing, GenerationParams, GenerationRequest, MultiIncidentPolicy, OutputRow,
    SourceDocument, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the reports come from.
pub trait DocumentSource: Send + Sync {
    fn list_documents(&self) -> impl std::future::Future<Output = Result<DocumentListing>> + Send;
    fn read_document(
        &self,
        document: &SourceDocument,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// The hosted model. Returns the raw reply text, which may or may not hold JSON.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// Output opened once per run; rows arrive in document order.
pub trait RowSink {
    fn destination(&self) -> &str;
    fn write_header(&mut self, columns: &[String]) -> Result<()>;
    fn write_row(&mut self, row: &OutputRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_folder(&self) -> &str;
    fn output_path(&self) -> &str;
    fn max_retries(&self) -> u32;
    fn backoff_seconds(&self) -> f64;
    fn generation_params(&self) -> GenerationParams;
    fn multi_incident(&self) -> MultiIncidentPolicy;
    fn merge_separator(&self) -> &str;
    fn error_marker(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn discover(&self) -> Result<DocumentListing>;
    async fn extract(&self, document: &SourceDocument) -> Result<String>;
    async fn transform(&self, document: &SourceDocument, raw: String) -> Result<TransformResult>;
    fn columns(&self) -> Vec<String>;
    fn error_row(&self, document: &SourceDocument) -> OutputRow;
}
