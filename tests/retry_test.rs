use assessor_etl::core::{ConfigProvider, GenerativeModel, Pipeline};
use assessor_etl::domain::model::{GenerationRequest, SourceDocument};
use assessor_etl::{ClaimPipeline, CsvSink, EtlEngine, EtlError, LocalStorage, TomlConfig, VertexClient};
use httpmock::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const MODEL_PATH: &str =
    "/v1/projects/claims-dev/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent";

fn config(endpoint: &str, input: &TempDir, max_retries: u32) -> TomlConfig {
    let output = input.path().join("claims.csv");
    TomlConfig::from_toml_str(&format!(
        r#"
[model]
project = "claims-dev"
endpoint = "{endpoint}"

[source]
input_folder = '{}'

[retry]
max_retries = {max_retries}
backoff_seconds = 0.0

[load]
output_path = '{}'
"#,
        input.path().display(),
        output.display()
    ))
    .unwrap()
}

/// Fails every call and counts how often it was asked.
struct AlwaysFailing {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl GenerativeModel for AlwaysFailing {
    async fn generate(&self, _request: &GenerationRequest<'_>) -> assessor_etl::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EtlError::ModelError {
            status: 429,
            message: "quota exceeded".to_string(),
        })
    }
}

#[tokio::test]
async fn test_always_failing_model_gets_three_attempts() {
    let input = TempDir::new().unwrap();
    std::fs::write(input.path().join("a.pdf"), b"%PDF-1.7").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let config = config("http://127.0.0.1:9", &input, 2);
    let pipeline = ClaimPipeline::new(
        LocalStorage::new(config.input_folder()),
        AlwaysFailing {
            calls: calls.clone(),
        },
        &config,
        "extract",
    )
    .unwrap();

    let document = SourceDocument {
        name: "a.pdf".to_string(),
        path: input.path().join("a.pdf"),
    };
    let err = pipeline.extract(&document).await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(
        err,
        EtlError::RetriesExhausted { ref document, attempts: 3 } if document == "a.pdf"
    ));
}

#[tokio::test]
async fn test_server_errors_are_retried_then_reported_as_error_row() {
    let input = TempDir::new().unwrap();
    std::fs::write(input.path().join("a.pdf"), b"%PDF-1.7").unwrap();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(MODEL_PATH);
            then.status(503).body("backend unavailable");
        })
        .await;

    let config = config(&server.base_url(), &input, 2);
    let pipeline = ClaimPipeline::new(
        LocalStorage::new(config.input_folder()),
        VertexClient::new(&config.model).unwrap(),
        &config,
        "extract",
    )
    .unwrap();
    let mut sink = CsvSink::from_writer(Vec::new(), "memory");

    let summary = EtlEngine::new(pipeline).run(&mut sink).await.unwrap();

    mock.assert_hits_async(3).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.rows_written(), 1);

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("null,null,"));
    assert!(lines[1].ends_with(",a.pdf"));
}

#[tokio::test]
async fn test_reply_without_candidates_counts_as_empty() {
    let input = TempDir::new().unwrap();
    std::fs::write(input.path().join("a.pdf"), b"%PDF-1.7").unwrap();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(MODEL_PATH);
            then.status(200)
                .json_body(serde_json::json!({"promptFeedback": {"blockReason": "OTHER"}}));
        })
        .await;

    let config = config(&server.base_url(), &input, 1);
    let pipeline = ClaimPipeline::new(
        LocalStorage::new(config.input_folder()),
        VertexClient::new(&config.model).unwrap(),
        &config,
        "extract",
    )
    .unwrap();

    let document = SourceDocument {
        name: "a.pdf".to_string(),
        path: input.path().join("a.pdf"),
    };
    let err = pipeline.extract(&document).await.unwrap_err();

    mock.assert_hits_async(2).await;
    assert!(matches!(err, EtlError::RetriesExhausted { attempts: 2, .. }));
}
