use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::MenuError;
use crate::handlers::MenuAnalysisService;
use crate::models::{AnalysisCreated, AnalysisDetails, RandomDrink};

pub struct AppState {
    pub menu_service: Arc<MenuAnalysisService>,
}

pub fn create_router(menu_service: Arc<MenuAnalysisService>, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState { menu_service });

    Router::new()
        .route("/", get(root_handler))
        .route("/api", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/analyze-menu", post(analyze_menu))
        .route("/api/random-drink", post(random_drink))
        .route("/api/analysis/:analysis_id", get(get_analysis))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/analyze-menu, form field `image_data` (base64, optional data-URL header)
async fn analyze_menu(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<AnalysisCreated>, MenuError> {
    let image_data = form_field(request, "image_data").await?;
    let analysis = state.menu_service.analyze(&image_data).await?;
    Ok(Json(analysis.into()))
}

/// POST /api/random-drink, form field `analysis_id`
async fn random_drink(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<RandomDrink>, MenuError> {
    let analysis_id = form_field(request, "analysis_id").await?;
    let picked = state.menu_service.select_random(analysis_id.trim()).await?;
    Ok(Json(picked))
}

async fn get_analysis(
    Path(analysis_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisDetails>, MenuError> {
    let analysis = state.menu_service.get_analysis(&analysis_id).await?;
    Ok(Json(analysis.into()))
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Menu Drink Selector API" }))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Read one text field from a multipart or urlencoded form body.
async fn form_field(request: Request, field: &'static str) -> Result<String, MenuError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
            log::warn!("⚠️ Unreadable multipart body: {}", e);
            MenuError::MissingField(field)
        })?;

        while let Some(part) = multipart.next_field().await.map_err(|e| {
            log::warn!("⚠️ Unreadable multipart field: {}", e);
            MenuError::MissingField(field)
        })? {
            if part.name() == Some(field) {
                return part.text().await.map_err(|_| MenuError::MissingField(field));
            }
        }
        return Err(MenuError::MissingField(field));
    }

    let Form(mut values) = Form::<HashMap<String, String>>::from_request(request, &())
        .await
        .map_err(|e| {
            log::warn!("⚠️ Unreadable form body: {}", e);
            MenuError::MissingField(field)
        })?;

    values.remove(field).ok_or(MenuError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_service::stub::StubVisionClient;
    use crate::services::InMemoryStore;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use axum::response::Response;
    use std::time::Duration;
    use tower::ServiceExt;

    const MENU_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    const TWO_DRINKS: &str =
        r#"Here you go: {"drinks":[{"name":"Cola","price":"$2"},{"name":"Iced Tea","description":"peach"}]}"#;

    fn app_with(vision: StubVisionClient) -> Router {
        let service = MenuAnalysisService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(vision),
            Duration::from_secs(5),
        );
        create_router(Arc::new(service), 1024 * 1024)
    }

    fn form_encode(value: &str) -> String {
        value
            .chars()
            .map(|c| match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' => c.to_string(),
                other => format!("%{:02X}", other as u32),
            })
            .collect()
    }

    fn form_post(uri: &str, field: &str, value: &str) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("{}={}", field, form_encode(value))))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn analyze(app: &Router) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(form_post("/api/analyze-menu", "image_data", MENU_IMAGE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_root_message() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));
        for uri in ["/", "/api"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["message"], "Menu Drink Selector API");
        }
    }

    #[tokio::test]
    async fn test_analyze_then_lookup_and_pick() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));

        let created = analyze(&app).await;
        assert_eq!(created["total_drinks"], 2);
        assert_eq!(created["drinks"][0]["name"], "Cola");
        assert_eq!(created["drinks"][0]["price"], "$2");
        assert!(created["drinks"][0].get("description").is_none());
        let id = created["analysis_id"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get_request(&format!("/api/analysis/{}", id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let details = body_json(response).await;
        assert_eq!(details["analysis_id"], id.as_str());
        assert_eq!(details["total_drinks"], 2);
        assert_eq!(details["drinks"], created["drinks"]);
        assert!(details["timestamp"].is_string());

        let response = app
            .clone()
            .oneshot(form_post("/api/random-drink", "analysis_id", &id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let picked = body_json(response).await;
        let name = picked["selected_drink"]["name"].as_str().unwrap();
        assert!(name == "Cola" || name == "Iced Tea");
        assert_eq!(
            picked["message"],
            format!("🍹 Your random drink choice: {}!", name).as_str()
        );
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));
        let boundary = "menuboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image_data\"\r\n\r\n{v}\r\n--{b}--\r\n",
            b = boundary,
            v = MENU_IMAGE
        );
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/analyze-menu")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["total_drinks"], 2);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_rejected() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));
        let response = app
            .oneshot(form_post("/api/analyze-menu", "image_data", "invalid_base64_data"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_IMAGE_ENCODING");
    }

    #[tokio::test]
    async fn test_missing_field() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));
        let response = app
            .oneshot(form_post("/api/analyze-menu", "image", MENU_IMAGE))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["code"], "MISSING_FIELD");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let app = app_with(StubVisionClient::failing(|| {
            MenuError::UpstreamUnavailable("connection refused".to_string())
        }));
        let response = app
            .oneshot(form_post("/api/analyze-menu", "image_data", MENU_IMAGE))
            .await
            .unwrap();

        assert!(response.status().is_server_error());
        let body = body_json(response).await;
        assert_eq!(body["code"], "UPSTREAM_UNAVAILABLE");
        assert!(body["detail"].as_str().unwrap().starts_with("Error analyzing menu:"));
    }

    #[tokio::test]
    async fn test_unknown_analysis() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));

        let response = app.clone().oneshot(get_request("/api/analysis/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "ANALYSIS_NOT_FOUND");
        assert_eq!(body["detail"], "Analysis not found");

        let response = app
            .oneshot(form_post("/api/random-drink", "analysis_id", "nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "ANALYSIS_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_random_drink_on_empty_menu() {
        let app = app_with(StubVisionClient::replying(r#"{"drinks": []}"#));
        let created = analyze(&app).await;
        assert_eq!(created["total_drinks"], 0);

        let response = app
            .oneshot(form_post(
                "/api/random-drink",
                "analysis_id",
                created["analysis_id"].as_str().unwrap(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "NO_DRINKS_AVAILABLE");
        assert_eq!(body["detail"], "No drinks found in this menu");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = app_with(StubVisionClient::replying(TWO_DRINKS));
        let request = axum::http::Request::builder()
            .uri("/api")
            .header("Origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
