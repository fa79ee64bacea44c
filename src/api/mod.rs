//! HTTP front for [`ScriptLibrary`].
//!
//! ## Endpoints
//! - `GET /api/scripts` - list scripts
//! - `POST /api/scripts/create` - create a script
//! - `GET /api/scripts/:script_id` - script config
//! - `GET /api/scripts/:script_id/chapters` - chapter paths
//! - `GET|POST|DELETE /api/scripts/:script_id/chapters/*chapter_path` - one chapter
//! - `GET /api/scripts/:script_id/characters` - character roles
//! - `GET /api/scripts/:script_id/assets` - assets by category

use crate::core::config::Config;
use crate::core::error::{LibraryError, LibraryResult};
use crate::core::model::{AssetIndex, Chapter, Character, CreateScriptRequest, ScriptConfig};
use crate::services::ScriptLibrary;
use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

type SharedLibrary = Arc<ScriptLibrary>;

/// A [`LibraryError`] rendered as `{"detail": ...}` with the matching status code.
#[derive(Debug)]
pub struct ApiError(pub LibraryError);

impl From<LibraryError> for ApiError {
    fn from(e: LibraryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::Conflict(_) | LibraryError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            LibraryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match &self.0 {
            LibraryError::Internal(e) => {
                log::error!("{:#}", e);
                format!("{:#}", e)
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Runs a filesystem operation on the blocking pool.
async fn run<T, F>(library: SharedLibrary, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ScriptLibrary) -> LibraryResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(library.as_ref()))
        .await
        .map_err(|e| ApiError(LibraryError::Internal(anyhow!("Worker task failed: {}", e))))?
        .map_err(ApiError)
}

pub fn router(library: ScriptLibrary) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/scripts", get(list_scripts))
        .route("/api/scripts/", get(list_scripts))
        .route("/api/scripts/create", post(create_script))
        .route("/api/scripts/:script_id", get(get_script))
        .route("/api/scripts/:script_id/chapters", get(list_chapters))
        .route(
            "/api/scripts/:script_id/chapters/*chapter_path",
            get(get_chapter).post(save_chapter).delete(delete_chapter),
        )
        .route("/api/scripts/:script_id/characters", get(list_characters))
        .route("/api/scripts/:script_id/characters/", get(list_characters))
        .route("/api/scripts/:script_id/assets", get(list_assets))
        .route("/api/scripts/:script_id/assets/", get(list_assets))
        .with_state(Arc::new(library))
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let mut app = router(ScriptLibrary::new(&config.scripts_folder));
    if config.cors_allow_any {
        app = app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!(
        "Serving scripts from {} on http://{}",
        config.scripts_folder.display(),
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await
        .context("Server error")?;
    Ok(())
}

// --- Handlers ---

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Script Editor API is running" }))
}

async fn list_scripts(State(library): State<SharedLibrary>) -> Result<Json<Vec<ScriptConfig>>, ApiError> {
    let listing = run(library, |l| l.list_scripts()).await?;
    Ok(Json(listing.items))
}

async fn create_script(
    State(library): State<SharedLibrary>,
    Json(request): Json<CreateScriptRequest>,
) -> Result<Json<Value>, ApiError> {
    let script_id = run(library, move |l| l.create_script(&request)).await?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Script '{}' created successfully", script_id),
        "script_id": script_id,
    })))
}

async fn get_script(
    State(library): State<SharedLibrary>,
    Path(script_id): Path<String>,
) -> Result<Json<ScriptConfig>, ApiError> {
    Ok(Json(run(library, move |l| l.get_script(&script_id)).await?))
}

async fn list_chapters(
    State(library): State<SharedLibrary>,
    Path(script_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(run(library, move |l| l.list_chapters(&script_id)).await?))
}

async fn get_chapter(
    State(library): State<SharedLibrary>,
    Path((script_id, chapter_path)): Path<(String, String)>,
) -> Result<Json<serde_yaml_ng::Value>, ApiError> {
    Ok(Json(
        run(library, move |l| l.get_chapter(&script_id, &chapter_path)).await?,
    ))
}

async fn save_chapter(
    State(library): State<SharedLibrary>,
    Path((script_id, chapter_path)): Path<(String, String)>,
    Json(chapter): Json<Chapter>,
) -> Result<Json<Value>, ApiError> {
    run(library, move |l| l.save_chapter(&script_id, &chapter_path, &chapter)).await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn delete_chapter(
    State(library): State<SharedLibrary>,
    Path((script_id, chapter_path)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let message = format!("Chapter {} deleted successfully", chapter_path);
    run(library, move |l| l.delete_chapter(&script_id, &chapter_path)).await?;
    Ok(Json(json!({ "status": "success", "message": message })))
}

async fn list_characters(
    State(library): State<SharedLibrary>,
    Path(script_id): Path<String>,
) -> Result<Json<Vec<Character>>, ApiError> {
    let listing = run(library, move |l| l.list_characters(&script_id)).await?;
    Ok(Json(listing.items))
}

async fn list_assets(
    State(library): State<SharedLibrary>,
    Path(script_id): Path<String>,
) -> Result<Json<AssetIndex>, ApiError> {
    Ok(Json(run(library, move |l| l.list_assets(&script_id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use std::fs;
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    fn app() -> Result<(tempfile::TempDir, Router)> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path().join("scripts");
        fs::create_dir_all(&root)?;
        Ok((temp_dir, router(ScriptLibrary::new(root))))
    }

    fn create_body(name: &str) -> Value {
        json!({
            "name": name,
            "description": "雨の夜",
            "user_name": "Player",
            "user_subtitle": "Detective",
            "intro_chapter": "prologue/start",
        })
    }

    #[tokio::test]
    async fn test_script_lifecycle() -> Result<()> {
        let (_temp_dir, app) = app()?;

        let (status, body) = call(&app, Method::GET, "/", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Script Editor API is running");

        let (status, body) = call(&app, Method::POST, "/api/scripts/create", Some(create_body("rain"))).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["script_id"], "rain");

        let (status, body) = call(&app, Method::POST, "/api/scripts/create", Some(create_body("rain"))).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Script with this name already exists");

        let (status, body) = call(&app, Method::GET, "/api/scripts", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "rain");
        assert_eq!(body[0]["intro_charpter"], "prologue/start");
        assert_eq!(body[0]["script_settings"]["user_subtitle"], "Detective");

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "雨の夜");

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain/chapters", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["prologue/start.yaml"]));

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain/assets", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Backgrounds"], json!([]));

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain/characters", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_chapter_endpoints() -> Result<()> {
        let (_temp_dir, app) = app()?;
        call(&app, Method::POST, "/api/scripts/create", Some(create_body("rain"))).await?;

        let chapter = json!({
            "events": [
                { "type": "dialogue", "text": "誰だ？", "speaker": "detective", "duration": 1.5 },
                { "type": "end", "isFinal": true }
            ]
        });
        let (status, body) = call(&app, Method::POST, "/api/scripts/rain/chapters/act1/alley", Some(chapter.clone())).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain/chapters/act1/alley", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, chapter);

        let (status, _) = call(&app, Method::DELETE, "/api/scripts/rain/chapters/act1/alley", None).await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::DELETE, "/api/scripts/rain/chapters/act1/alley", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Chapter file not found: act1/alley");

        let (status, _) = call(&app, Method::GET, "/api/scripts/ghost/chapters/act1/alley", None).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/api/scripts/rain/chapters/x/%2E%2E/%2E%2E/story_config", None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_internal_errors_map_to_500() -> Result<()> {
        let (temp_dir, app) = app()?;
        let chapters = temp_dir.path().join("scripts/rain/Charpters");
        fs::create_dir_all(&chapters)?;
        fs::write(chapters.join("broken.yaml"), "events: [\n")?;

        let (status, body) = call(&app, Method::GET, "/api/scripts/rain/chapters/broken", None).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap_or_default().contains("broken.yaml"));
        Ok(())
    }
}
