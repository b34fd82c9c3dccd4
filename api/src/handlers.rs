use crate::payload::{ErrorReply, HealthReply, QueryPayload, QueryReply, UploadReply};
use crate::state::AppState;
use admission_rag::text::MAX_UPLOAD_BYTES;
use admission_rag::RagError;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

type ApiError = (StatusCode, Json<ErrorReply>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorReply::new(message)))
}

fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorReply::new(message)),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(handle_query))
        .route("/api/upload", post(handle_upload))
        .route("/api/health", get(handle_health))
        // Leave headroom above the document ceiling for multipart framing.
        .layer(DefaultBodyLimit::max((MAX_UPLOAD_BYTES as usize) + 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_query(
    State(state): State<AppState>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<QueryReply>, ApiError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(bad_request("Query cannot be empty"));
    }

    match state.engine.process_query(query).await {
        Ok(outcome) => Ok(Json(QueryReply {
            response: outcome.answer,
            sources: outcome.sources,
            confidence: outcome.confidence,
        })),
        Err(e) => {
            log::error!("Error processing query: {}", e);
            Err(internal_error("Internal server error"))
        }
    }
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReply>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|_| bad_request("Failed to read uploaded file"))?;
        file = Some((filename, data.to_vec()));
    }

    let Some((filename, data)) = file else {
        return Err(bad_request("No file provided"));
    };
    if filename.is_empty() {
        return Err(bad_request("No file selected"));
    }

    match state.engine.ingest(&filename, &data).await {
        Ok(receipt) => Ok(Json(UploadReply {
            message: "Document uploaded successfully".to_string(),
            document_id: receipt.document_id,
            chunks_created: receipt.chunks_created,
        })),
        Err(
            e @ (RagError::UnsupportedFormat(_)
            | RagError::FileTooLarge { .. }
            | RagError::EmptyDocument(_)),
        ) => Err(bad_request(e.to_string())),
        Err(e) => {
            log::error!("Error uploading document: {}", e);
            Err(internal_error("Failed to upload document"))
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy".to_string(),
        watsonx_connected: state.engine.is_connected().await,
        documents_loaded: state.engine.document_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_rag::{DocumentManager, RagEngine, WatsonxClient, NO_CONTEXT_ANSWER};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_state() -> (TempDir, AppState) {
        std::env::set_var("IBM_CLOUD_API_KEY", "test-key");
        std::env::set_var("WATSONX_PROJECT_ID", "test-project");

        let dir = TempDir::new().unwrap();
        let watsonx = WatsonxClient::from_env().unwrap();
        let store = DocumentManager::new(dir.path()).unwrap();
        let engine = RagEngine::new(watsonx, store).await.unwrap();
        (dir, AppState::new(engine))
    }

    fn query_request(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"query":{}}}"#, serde_json::to_string(query).unwrap())))
            .unwrap()
    }

    fn upload_request(filename: &str, content: &str) -> Request<Body> {
        let boundary = "admission-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n--{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let (_dir, state) = test_state().await;
        let response = router(state).oneshot(query_request("   ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Query cannot be empty");
    }

    #[tokio::test]
    async fn query_without_context_returns_fallback() {
        let (_dir, state) = test_state().await;
        let response = router(state)
            .oneshot(query_request("When is the application deadline?"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], NO_CONTEXT_ANSWER);
        assert_eq!(body["confidence"], 0.0);
        assert_eq!(body["sources"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn upload_reports_chunk_count() {
        let (_dir, state) = test_state().await;
        let content = "Admission requirements include a completed application form, official transcripts, and two recommendation letters. ".repeat(5);
        let response = router(state)
            .oneshot(upload_request("requirements.txt", &content))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Document uploaded successfully");
        assert_eq!(body["chunks_created"], 1);
        assert!(!body["document_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_type() {
        let (_dir, state) = test_state().await;
        let response = router(state)
            .oneshot(upload_request("setup.exe", "binary payload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Unsupported file format"));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let (_dir, state) = test_state().await;
        let boundary = "admission-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "No file provided");
    }
}
