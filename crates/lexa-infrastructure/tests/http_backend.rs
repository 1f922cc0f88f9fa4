//! HTTP adapters against an in-process fake of the drafting backend.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use lexa_core::{
    ArtifactSink, AuthService, ClientConfig, ContractBackend, Credential, DraftPhase,
    DraftingService, ExchangeOutcome, LexaError, Template, VariableState,
};
use lexa_infrastructure::{FsArtifactStore, HttpAuthClient, HttpContractBackend};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

const TOKEN: &str = "tok-123";
const DOCX_BYTES: &[u8] = b"PK\x03\x04fake-docx";

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    async fn push(&self, path: &str, body: Value) {
        self.requests.lock().await.push((path.to_string(), body));
    }

    async fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn list_contracts(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"_id": "665f1c", "name": "Hợp đồng lao động", "filename": "hd_lao_dong.docx"},
        {"_id": "665f1d", "name": "Hợp đồng thuê nhà", "filename": "hd_thue_nha.docx"},
        {"_id": "665f1e", "name": "Bản nháp chưa tải lên", "filename": null}
    ]))
    .into_response()
}

async fn download_template(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    recorded.push("/download-template", body.clone()).await;

    match body["filename"].as_str() {
        Some("hd_lao_dong.docx") => Json(json!({
            "variables": {"ben_a": "", "ben_b": "", "luong": ""},
            "content": "Bên A: {{ben_a}}, Bên B: {{ben_b}}, lương {{luong}}"
        }))
        .into_response(),
        // Older templates come back without a body.
        Some("hd_thue_nha.docx") => Json(json!({
            "variables": "{\"ben_thue\": \"\"}"
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Template not found"})),
        )
            .into_response(),
    }
}

async fn chat_contract(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    recorded.push("/chat-contract", body.clone()).await;

    match body["message"].as_str() {
        Some("no key") => (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Vui lòng cập nhật Gemini API key"})),
        )
            .into_response(),
        // A reverse proxy answering for a dead upstream.
        Some("gateway") => (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body><h1>502 Bad Gateway</h1></body></html>",
        )
            .into_response(),
        Some("xong") => Json(json!({
            "response": "Hợp đồng đã được tạo.",
            "variables": "```json\n{\"ben_a\": \"Công ty A\", \"ben_b\": \"Nguyễn Văn B\", \"luong\": \"20 triệu\"}\n```",
            "link": "contract_42.docx"
        }))
        .into_response(),
        _ => Json(json!({
            "response": "Bên B là ai?",
            "variables": {"ben_a": "Công ty A", "ben_b": "", "luong": ""},
            "link": ""
        }))
        .into_response(),
    }
}

async fn download_file(headers: HeaderMap, Path(filename): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if filename != "contract_42.docx" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "File not found"}))).into_response();
    }
    (
        [(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )],
        DOCX_BYTES,
    )
        .into_response()
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("username").map(String::as_str) == Some("lan")
        && form.get("password").map(String::as_str) == Some("secret");
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response();
    }
    Json(json!({"access_token": TOKEN, "token_type": "bearer"})).into_response()
}

async fn users_me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "username": "lan",
        "email": "lan@example.vn",
        "full_name": "Trần Thị Lan",
        "role": "user",
        "gemini_api_key": null,
        "disabled": false
    }))
    .into_response()
}

async fn update_gemini(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    recorded.push("/users/me/gemini", body).await;
    Json(json!({"message": "Gemini API key updated"})).into_response()
}

/// Starts the fake backend on an ephemeral port and returns its base URL.
async fn spawn_backend() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/contract", get(list_contracts))
        .route("/download-template", post(download_template))
        .route("/chat-contract", post(chat_contract))
        .route("/download/:filename", get(download_file))
        .route("/token", post(token))
        .route("/users/me", get(users_me))
        .route("/users/me/gemini", put(update_gemini))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), recorded)
}

fn backend(base_url: &str) -> HttpContractBackend {
    HttpContractBackend::new(ClientConfig::with_base_url(base_url)).unwrap()
}

#[tokio::test]
async fn test_list_templates_accepts_document_ids() {
    let (base_url, _) = spawn_backend().await;

    let templates = backend(&base_url)
        .list_templates(&Credential::bearer(TOKEN))
        .await
        .unwrap();

    assert_eq!(templates.len(), 3);
    assert_eq!(
        templates[0],
        Template::new("665f1c", "Hợp đồng lao động", "hd_lao_dong.docx")
    );
    assert!(!templates[2].is_resolvable());
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let (base_url, _) = spawn_backend().await;

    let err = backend(&base_url)
        .list_templates(&Credential::bearer("expired"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.detail(), Some("Could not validate credentials"));
}

#[tokio::test]
async fn test_resolve_template_without_content() {
    let (base_url, recorded) = spawn_backend().await;

    let resolution = backend(&base_url)
        .resolve_template(&Credential::bearer(TOKEN), "hd_thue_nha.docx")
        .await
        .unwrap();

    assert_eq!(resolution.content, "");
    let state = VariableState::decode(resolution.variables);
    assert_eq!(state.as_set().unwrap().get("ben_thue"), Some(""));
    assert_eq!(
        recorded.bodies("/download-template").await,
        vec![json!({"filename": "hd_thue_nha.docx"})]
    );
}

#[tokio::test]
async fn test_backend_detail_is_surfaced() {
    let (base_url, _) = spawn_backend().await;

    let err = backend(&base_url)
        .resolve_template(&Credential::bearer(TOKEN), "missing.docx")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LexaError::backend(404, Some("Template not found".to_string()))
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{}", addr))
        .list_templates(&Credential::bearer(TOKEN))
        .await
        .unwrap_err();

    assert!(matches!(err, LexaError::Transport(_)));
}

#[tokio::test]
async fn test_download_artifact_returns_bytes() {
    let (base_url, _) = spawn_backend().await;

    let artifact = backend(&base_url)
        .download_artifact(&Credential::bearer(TOKEN), "contract_42.docx")
        .await
        .unwrap();

    assert_eq!(artifact.filename, "contract_42.docx");
    assert_eq!(&artifact.bytes[..], DOCX_BYTES);
    assert!(artifact
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("wordprocessingml")));
}

#[tokio::test]
async fn test_login_profile_and_gemini_key() {
    let (base_url, recorded) = spawn_backend().await;
    let auth = HttpAuthClient::new(ClientConfig::with_base_url(&base_url)).unwrap();

    let err = auth.login("lan", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());

    let credential = auth.login("lan", "secret").await.unwrap();
    assert_eq!(credential.access_token(), TOKEN);

    let profile = auth.current_user(&credential).await.unwrap();
    assert_eq!(profile.display_name(), "Trần Thị Lan (lan)");
    assert!(!profile.has_gemini_key());

    auth.update_gemini_key(&credential, "AIza-test").await.unwrap();
    assert_eq!(
        recorded.bodies("/users/me/gemini").await,
        vec![json!({"key": "AIza-test"})]
    );
}

#[tokio::test]
async fn test_full_drafting_session_over_http() {
    let (base_url, recorded) = spawn_backend().await;
    let temp_dir = TempDir::new().unwrap();
    let sink: Arc<dyn ArtifactSink> = Arc::new(FsArtifactStore::new(temp_dir.path()));
    let service = DraftingService::new(
        Arc::new(backend(&base_url)),
        sink,
        Credential::bearer(TOKEN),
    );

    let templates = service.list_templates().await;
    let announcement = service.select_template(templates[0].clone()).await.unwrap();
    assert!(announcement.content.contains("Hợp đồng lao động"));
    assert_eq!(service.phase().await, DraftPhase::Filling { degraded: false });

    let outcome = service.send_message("Bên A là Công ty A").await.unwrap();
    assert!(!outcome.is_failed());
    assert_eq!(outcome.turn().content, "Bên B là ai?");

    // First exchange: prior transcript is the announcement only.
    let first = &recorded.bodies("/chat-contract").await[0];
    assert_eq!(first["message"], "Bên A là Công ty A");
    assert_eq!(first["variables"], json!({"ben_a": "", "ben_b": "", "luong": ""}));
    assert_eq!(
        first["contentTemplate"],
        "Bên A: {{ben_a}}, Bên B: {{ben_b}}, lương {{luong}}"
    );
    assert_eq!(first["messages"].as_array().unwrap().len(), 1);
    assert_eq!(first["messages"][0]["role"], "assistant");

    let failed = service.send_message("no key").await.unwrap();
    assert!(failed.is_failed());
    assert_eq!(failed.turn().content, "Lỗi: Vui lòng cập nhật Gemini API key");
    assert_eq!(
        service.variables().await.as_set().unwrap().get("ben_a"),
        Some("Công ty A")
    );

    let gateway = service.send_message("gateway").await.unwrap();
    assert_eq!(gateway.turn().content, "Lỗi: Xin lỗi, đã có lỗi xảy ra.");
    assert!(matches!(
        gateway,
        ExchangeOutcome::Failed { error: LexaError::Backend { status: 502, detail: None }, .. }
    ));

    let done = service.send_message("xong").await.unwrap();
    assert_eq!(done.turn().artifact_link(), Some("contract_42.docx"));
    assert_eq!(
        service.variables().await.as_set().unwrap().get("luong"),
        Some("20 triệu")
    );

    let path = service.download_latest().await.unwrap();
    assert_eq!(path, temp_dir.path().join("contract_42.docx"));
    assert_eq!(std::fs::read(path).unwrap(), DOCX_BYTES);
}
