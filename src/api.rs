//! REST API Server for the Budget Optimizer Agent
//!
//! Exposes the document-level analysis and the standalone tools over HTTP.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::BudgetOptimizer;
use crate::error::BudgetError;
use crate::models::ToolInput;
use crate::state::FinancialStateDocument;
use crate::tools::{create_default_registry, ToolRegistry};

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body returned when a document could not be analysed.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub success: bool,
    pub request_id: Uuid,
    pub kind: String,
    pub error: String,
    /// The input document, unchanged
    pub document: Value,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<BudgetOptimizer>,
    pub tools: Arc<ToolRegistry>,
}

impl Default for ApiState {
    fn default() -> Self {
        Self {
            agent: Arc::new(BudgetOptimizer::default()),
            tools: Arc::new(create_default_registry()),
        }
    }
}

fn status_for(error: &BudgetError) -> StatusCode {
    match error {
        BudgetError::InvalidInput(_)
        | BudgetError::InvalidToolInput(_)
        | BudgetError::UnknownStatus(_)
        | BudgetError::InvalidCorpus(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BudgetError::ToolNotFound(_) => StatusCode::NOT_FOUND,
        BudgetError::ConfigError(_)
        | BudgetError::SerializationError(_)
        | BudgetError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Budget Analysis Endpoint
/// =============================

async fn analyze_document(
    State(state): State<ApiState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let request_id = Uuid::new_v4();
    info!(%request_id, "Received budget analysis request");

    let outcome = FinancialStateDocument::from_value(body.clone())
        .and_then(|doc| state.agent.run(&doc));

    match outcome {
        Ok(updated) => (StatusCode::OK, Json(updated.into_value())),
        Err(e) => {
            warn!(%request_id, kind = e.kind(), error = %e, "Budget analysis rejected");
            let failure = AnalysisFailure {
                success: false,
                request_id,
                kind: e.kind().to_string(),
                error: e.to_string(),
                document: body,
            };
            let payload = serde_json::to_value(&failure)
                .unwrap_or_else(|_| serde_json::json!({"success": false, "error": e.to_string()}));
            (status_for(&e), Json(payload))
        }
    }
}

/// =============================
/// Tool Endpoint
/// =============================

async fn run_tool(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(parameters): Json<Value>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(tool_name = %name, "Received tool request");

    let input = ToolInput {
        tool_name: name,
        parameters,
    };

    match state.tools.execute(&input).await {
        Ok(output) => (StatusCode::OK, Json(ApiResponse::success(output.data))),
        Err(e) => {
            warn!(tool_name = %input.tool_name, error = %e, "Tool execution failed");
            (status_for(&e), Json(ApiResponse::error(e.to_string())))
        }
    }
}

async fn list_tools(State(state): State<ApiState>) -> Json<ApiResponse> {
    let tools: Vec<Value> = state
        .tools
        .list()
        .into_iter()
        .filter_map(|name| state.tools.get(name))
        .map(|tool| {
            serde_json::json!({
                "name": tool.name(),
                "description": tool.description(),
            })
        })
        .collect();
    Json(ApiResponse::success(tools))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/budget/analyze", post(analyze_document))
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/tools/:name", post(run_tool))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let router = create_router(ApiState::default());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(ApiState::default());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_returns_updated_document() {
        let (status, body) = post_json(
            "/api/v1/budget/analyze",
            json!({
                "user_status": "Retired",
                "household": {"members": 2},
                "retirement": {"annual_withdrawal_inr": 62000, "corpus_inr": 1000000}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["household"], json!({"members": 2}));
        assert_eq!(body["debt_flag"], json!(true));
        assert_eq!(
            body["budget_analysis_summary"]["risk_flag"],
            json!("High withdrawal rate")
        );
    }

    #[tokio::test]
    async fn test_analyze_unknown_status_echoes_document() {
        let input = json!({"user_status": "Unknown", "client_id": "c-9"});
        let (status, body) = post_json("/api/v1/budget/analyze", input.clone()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("unknown_status"));
        assert_eq!(body["document"], input);
    }

    #[tokio::test]
    async fn test_tool_endpoint() {
        let (status, body) = post_json(
            "/api/v1/tools/spending_categorizer_and_analyser",
            json!({
                "monthly_net_income_inr": 100000,
                "fixed_expenses_inr": 40000,
                "variable_expenses_inr": 35000,
                "discretionary_spending_inr": 20000
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["net_cash_flow_inr"], json!(5000.0));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let (status, body) = post_json("/api/v1/tools/backtester", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }
}
