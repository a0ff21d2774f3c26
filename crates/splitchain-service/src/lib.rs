#![deny(unsafe_code)]

pub mod config;

use crate::config::{NamingConfig, OracleConfig, ServiceConfig};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use splitchain_adapters::{
    demo_history, demo_names, DenylistRiskOracle, HttpNameService, LlmRiskOracle,
    SimulatedExecutor, StaticNameService,
};
use splitchain_core::{
    BatchResult, CancelToken, DisperseRequest, Disperser, NameService, RiskOracle,
    SplitchainError, TransactionHistory, TransactionRecord,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_PAGE_LIMIT: usize = 50;
const MAX_PAGE_LIMIT: usize = 500;

#[derive(Clone)]
pub struct ServiceState {
    pub disperser: Arc<Disperser>,
    pub history: Arc<RwLock<TransactionHistory>>,
    shutdown: watch::Receiver<bool>,
}

impl ServiceState {
    pub fn new(
        disperser: Disperser,
        history: TransactionHistory,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            disperser: Arc::new(disperser),
            history: Arc::new(RwLock::new(history)),
            shutdown,
        }
    }

    /// Wire the collaborators named by `config` into a ready service state.
    pub fn bootstrap(
        config: &ServiceConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let names: Arc<dyn NameService> = match &config.naming {
            NamingConfig::Static {
                aliases,
                include_demo_aliases,
            } => {
                let mut names = if *include_demo_aliases {
                    demo_names()
                } else {
                    StaticNameService::new()
                };
                for (alias, address) in aliases {
                    names.insert(alias, address.clone());
                }
                Arc::new(names)
            }
            NamingConfig::Http {
                endpoint,
                request_timeout_secs,
            } => Arc::new(HttpNameService::new(
                endpoint.clone(),
                Duration::from_secs(*request_timeout_secs),
            )?),
        };

        let oracle: Arc<dyn RiskOracle> = match &config.oracle {
            OracleConfig::Denylist(denylist) => Arc::new(DenylistRiskOracle::from_config(denylist)),
            OracleConfig::Llm(llm) => Arc::new(LlmRiskOracle::new(llm)?),
        };

        let executor = Arc::new(SimulatedExecutor::new(Duration::from_millis(
            config.executor.delay_ms,
        )));

        let disperser = Disperser::new(names, oracle, executor, config.disperse.clone());
        let history = if config.server.seed_demo_history {
            demo_history()
        } else {
            TransactionHistory::new()
        };

        info!(
            naming = disperser.name_service_id(),
            oracle = disperser.oracle_id(),
            executor = disperser.executor_id(),
            history = history.len(),
            "service state ready"
        );
        Ok(Self::new(disperser, history, shutdown))
    }

    fn cancel_token(&self) -> CancelToken {
        CancelToken::from_watch(self.shutdown.clone())
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/disperse", post(disperse))
        .route("/v1/transactions", get(list_transactions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run one batch and record it when it succeeds.
pub async fn disperse_and_record(state: &ServiceState, request: DisperseRequest) -> BatchResult {
    let result = state
        .disperser
        .disperse_with_cancel(request, &state.cancel_token())
        .await;

    if result.is_success() {
        state.history.write().await.record_batch(result.transactions());
    }
    result
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] SplitchainError),
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    naming: &'static str,
    oracle: &'static str,
    executor: &'static str,
    recorded_transactions: usize,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "splitchaind",
        naming: state.disperser.name_service_id(),
        oracle: state.disperser.oracle_id(),
        executor: state.disperser.executor_id(),
        recorded_transactions: state.history.read().await.len(),
    })
}

async fn disperse(
    State(state): State<ServiceState>,
    Json(request): Json<DisperseRequest>,
) -> Json<BatchResult> {
    Json(disperse_and_record(&state, request).await)
}

#[derive(Debug, Clone, Deserialize)]
struct TransactionsQuery {
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionsResponse {
    total: usize,
    offset: usize,
    returned: usize,
    items: Vec<TransactionRecord>,
}

async fn list_transactions(
    State(state): State<ServiceState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than zero"));
    }

    let history = state.history.read().await;
    let items = history.page(offset, limit.min(MAX_PAGE_LIMIT)).to_vec();
    Ok(Json(TransactionsResponse {
        total: history.len(),
        offset,
        returned: items.len(),
        items,
    }))
}
