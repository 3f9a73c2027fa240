use crate::core::normalizer::RowNormalizer;
use crate::core::recovery::JsonRecovery;
use crate::core::requester::{ExtractionRequester, RetryPolicy};
use crate::core::{
    ConfigProvider, DocumentListing, DocumentSource, GenerativeModel, OutputRow, Pipeline,
    SourceDocument, TransformResult,
};
use crate::domain::schema;
use crate::utils::error::Result;

/// Claim-report pipeline: PDF in, model reply out, rows back.
pub struct ClaimPipeline<S: DocumentSource, M: GenerativeModel> {
    source: S,
    requester: ExtractionRequester<M>,
    recovery: JsonRecovery,
    normalizer: RowNormalizer,
}

impl<S: DocumentSource, M: GenerativeModel> ClaimPipeline<S, M> {
    pub fn new<C: ConfigProvider>(
        source: S,
        model: M,
        config: &C,
        instruction: impl Into<String>,
    ) -> Result<Self> {
        let retry = RetryPolicy::new(config.max_retries(), config.backoff_seconds());
        Ok(Self {
            source,
            requester: ExtractionRequester::new(
                model,
                instruction,
                config.generation_params(),
                retry,
            ),
            recovery: JsonRecovery::new()?,
            normalizer: RowNormalizer::new(
                config.multi_incident(),
                config.merge_separator(),
                config.error_marker(),
            )?,
        })
    }
}

#[async_trait::async_trait]
impl<S: DocumentSource, M: GenerativeModel> Pipeline for ClaimPipeline<S, M> {
    async fn discover(&self) -> Result<DocumentListing> {
        self.source.list_documents().await
    }

    async fn extract(&self, document: &SourceDocument) -> Result<String> {
        let payload = self.source.read_document(document).await?;
        tracing::debug!("Read {} ({} bytes)", document.name, payload.len());
        self.requester.request(&document.name, &payload).await
    }

    async fn transform(&self, document: &SourceDocument, raw: String) -> Result<TransformResult> {
        let records = self.recovery.recover(&raw, &document.name)?;
        if records.is_empty() {
            tracing::warn!("Model returned an empty list for {}", document.name);
        }
        let rows = self.normalizer.rows_for(&records, &document.name);
        Ok(TransformResult {
            incidents: records.len(),
            rows,
        })
    }

    fn columns(&self) -> Vec<String> {
        schema::header()
    }

    fn error_row(&self, document: &SourceDocument) -> OutputRow {
        self.normalizer.error_row(&document.name)
    }
}
