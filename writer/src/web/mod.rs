//! Browser form, status pages and JSON API.

mod pages;

use crate::article::{Topic, WordCount};
use crate::error::GenerationError;
use crate::status::GenerationSlot;
use crate::workflow::Workflow;
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub slot: Arc<GenerationSlot>,
    pub topics: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(workflow: Workflow, topics: Vec<String>) -> Self {
        Self {
            workflow: Arc::new(workflow),
            slot: GenerationSlot::new(),
            topics: Arc::new(topics),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .route("/status", get(status_handler))
        .route("/api/status", get(api_status_handler))
        .route("/view/:filename", get(view_handler))
        .route("/api/generated", get(generated_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(bind: &str, port: u16, state: AppState) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(
        profile = ?state.workflow.profile(),
        output_dir = %state.workflow.store().dir().display(),
        "listening on http://{}",
        addr
    );

    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("Server error: {}", e))
}

fn json_error(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(pages::index(&state.topics))
}

#[derive(Debug, Default, Deserialize)]
struct GenerateForm {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    custom_topic: String,
    word_count: Option<String>,
}

impl GenerateForm {
    fn topic(&self) -> Result<Topic, GenerationError> {
        if self.custom_topic.trim().is_empty() {
            Topic::parse(&self.topic)
        } else {
            Topic::parse(&self.custom_topic)
        }
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Response {
    let topic = match form.topic() {
        Ok(topic) => topic,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e),
    };
    let word_count = WordCount::parse(form.word_count.as_deref());

    let ticket = match state.slot.try_begin(topic.as_str()) {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::warn!(topic = %topic, "rejected, generation already running");
            return json_error(StatusCode::BAD_REQUEST, e);
        }
    };

    tracing::info!(topic = %topic, word_count = word_count.get(), "generation accepted");
    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        let outcome = workflow.run(&topic, word_count).await;
        if let Err(e) = &outcome {
            tracing::error!(topic = %topic, error = %e, "generation failed");
        }
        ticket.finish(outcome);
    });

    Redirect::to("/status").into_response()
}

async fn status_handler(State(state): State<AppState>) -> Html<String> {
    Html(pages::status(&state.slot.snapshot()))
}

async fn api_status_handler(State(state): State<AppState>) -> Response {
    Json(state.slot.snapshot()).into_response()
}

async fn view_handler(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    match state.workflow.store().read(&filename).await {
        Ok(markdown) => Html(pages::article(&filename, &markdown)).into_response(),
        Err(GenerationError::NotFound(_) | GenerationError::InvalidFilename(_)) => {
            (StatusCode::NOT_FOUND, "Content not found").into_response()
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "failed to read article");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn generated_handler(State(state): State<AppState>) -> Response {
    match state.workflow.store().list().await {
        Ok(files) => Json(files).into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactStore;
    use crate::crew::CrewProfile;
    use crate::workflow::tests::{ScriptedLLM, answer, factory, models, toolbox};
    use crate::workflow::RetryPolicy;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state(dir: &std::path::Path, llm: Arc<ScriptedLLM>) -> AppState {
        let workflow = Workflow::new(
            CrewProfile::Single,
            models(),
            factory(llm, Arc::new(Mutex::new(Vec::new()))),
            toolbox(),
            RetryPolicy::default(),
            ArtifactStore::new(dir),
        );
        AppState::new(workflow, vec!["OWASP LLM Top 10".to_string()])
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(state(tmp.path(), ScriptedLLM::new(|_, _| answer("x"))));

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("OWASP LLM Top 10"));
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedLLM::new(|_, _| answer("x"));
        let app = router(state(tmp.path(), llm.clone()));

        let response = app
            .oneshot(post_form("topic=&custom_topic=++&word_count=500"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], "Please select or enter a topic");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_busy_slot_rejects_second_request() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedLLM::new(|_, _| answer("x"));
        let state = state(tmp.path(), llm.clone());
        let _running = state.slot.try_begin("AI Bias Detection").unwrap();

        let response = router(state.clone())
            .oneshot(post_form("topic=OWASP+LLM+Top+10"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], "Generation already in progress");
        assert_eq!(
            state.slot.snapshot().current_topic.as_deref(),
            Some("AI Bias Detection")
        );
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_runs_in_background() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedLLM::new(|_, _| answer("# Custom\n\nbody"));
        let state = state(tmp.path(), llm.clone());
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(post_form(
                "topic=OWASP+LLM+Top+10&custom_topic=Red+Teaming+LLMs&word_count=abc",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/status");

        for _ in 0..200 {
            if !state.slot.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = app.clone().oneshot(get("/api/status")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["in_progress"], false);
        assert_eq!(json["current_topic"], "Red Teaming LLMs");
        assert_eq!(json["result"]["filename"], "red_teaming_llms.md");
        assert_eq!(json["result"]["status"], "completed");
        assert!(llm.prompts.lock().unwrap()[0].contains("1000-word article"));

        let response = app.clone().oneshot(get("/view/red_teaming_llms.md")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("<h1>Custom</h1>"));

        let response = app.oneshot(get("/api/generated")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json[0]["filename"], "red_teaming_llms.md");
    }

    #[tokio::test]
    async fn test_view_missing_article() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(state(tmp.path(), ScriptedLLM::new(|_, _| answer("x"))));

        let response = app.clone().oneshot(get("/view/nothing_here.md")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(get("/view/..%2Fsecret.md")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_view_percent_encoded_name() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path(), ScriptedLLM::new(|_, _| answer("x")));
        let topic = Topic::parse("C# for LLM apps").unwrap();
        state
            .workflow
            .store()
            .save(&topic.slug(), "# C#\n\n<script>alert(1)</script>")
            .await
            .unwrap();

        let response = router(state)
            .oneshot(get("/view/c%23_for_llm_apps.md"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("<h1>C#</h1>"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn test_failed_run_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedLLM::new(|_, _| Err(agent::Error::provider("Invalid API Key")));
        let state = state(tmp.path(), llm);
        let app = router(state.clone());

        app.clone()
            .oneshot(post_form("topic=OWASP+LLM+Top+10"))
            .await
            .unwrap();
        for _ in 0..200 {
            if !state.slot.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let snapshot = state.slot.snapshot();
        assert!(!snapshot.in_progress);
        assert!(snapshot.error.unwrap().contains("Invalid API Key"));

        let response = app.oneshot(get("/status")).await.unwrap();
        assert!(body_string(response).await.contains("Generation failed"));
    }
}
