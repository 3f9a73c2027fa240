use crate::core::{DocumentListing, Pipeline, RowSink, RunSummary, SourceDocument, TransformResult};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Drives a pipeline over every document, one at a time.
///
/// A failing document never stops the run: it gets one error row and the
/// next document starts. Only failures of the output itself are fatal.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run<W: RowSink>(&self, sink: &mut W) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let listing = self.discover().await?;
        self.process_all(listing, sink, started_at, start).await
    }

    /// Like [`run`](Self::run), but opens the sink only after discovery succeeded,
    /// so an unreadable input folder leaves an existing output file untouched.
    pub async fn run_into<W, F>(&self, open_sink: F) -> Result<RunSummary>
    where
        W: RowSink,
        F: FnOnce() -> Result<W>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let listing = self.discover().await?;
        let mut sink = open_sink()?;
        self.process_all(listing, &mut sink, started_at, start).await
    }

    async fn discover(&self) -> Result<DocumentListing> {
        let listing = self.pipeline.discover().await?;
        tracing::info!(
            "Found {} PDF(s) to process ({} other entries skipped)",
            listing.documents.len(),
            listing.skipped.len()
        );
        Ok(listing)
    }

    async fn process_all<W: RowSink>(
        &self,
        listing: DocumentListing,
        sink: &mut W,
        started_at: DateTime<Utc>,
        start: Instant,
    ) -> Result<RunSummary> {
        sink.write_header(&self.pipeline.columns())?;

        let mut succeeded = 0;
        let mut failed = 0;
        let mut rows_extracted = 0;

        for document in &listing.documents {
            tracing::info!("Processing: {}", document.name);
            let doc_start = Instant::now();

            match self.process(document).await {
                Ok(result) => {
                    for row in &result.rows {
                        sink.write_row(row)?;
                    }
                    rows_extracted += result.rows.len();
                    succeeded += 1;
                    tracing::info!(
                        "Done: {} ({} incident(s) extracted) ({:.2}s)",
                        document.name,
                        result.incidents,
                        doc_start.elapsed().as_secs_f64()
                    );
                }
                Err(e) => {
                    tracing::error!("Error on {}: {}", document.name, e);
                    sink.write_row(&self.pipeline.error_row(document))?;
                    failed += 1;
                }
            }

            if self.monitor.is_enabled() {
                self.monitor.log_stats(&document.name);
            }
        }

        sink.finish()?;
        self.monitor.log_final_stats();

        let summary = RunSummary {
            started_at,
            output_path: sink.destination().to_string(),
            succeeded,
            failed,
            skipped: listing.skipped.len(),
            rows_extracted,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Run finished: {} attempted, {} succeeded, {} failed, {} row(s) extracted",
            summary.attempted(),
            summary.succeeded,
            summary.failed,
            summary.rows_extracted
        );
        Ok(summary)
    }

    async fn process(&self, document: &SourceDocument) -> Result<TransformResult> {
        let raw = self.pipeline.extract(document).await?;
        self.pipeline.transform(document, raw).await
    }
}
