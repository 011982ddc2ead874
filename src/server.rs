use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::molecule::{Molecule, MoleculeError};
use crate::optimize::{run_optimization, Calculator};
use crate::store::{Store, StoreError, STORE_KIND};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub calculator: Arc<dyn Calculator + Send + Sync>,
}

/// Everything that can turn a request into a failure envelope. Calculator
/// errors are absent: the strategy absorbs those into the fallback.
#[derive(Debug, Error)]
enum RequestError {
    #[error("invalid request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Molecule(#[from] MoleculeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store lock poisoned")]
    Lock,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(root))
        .route("/optimize", post(optimize))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RootResponse {
    status: &'static str,
    store: &'static str,
}

/// GET /, liveness probe with no side effects
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "online",
        store: STORE_KIND,
    })
}

#[derive(Debug, Deserialize)]
struct OptimizeRequest {
    #[serde(default = "default_symbol")]
    symbol: String,
    #[serde(rename = "initialGeometry")]
    initial_geometry: Vec<[f64; 3]>,
}

fn default_symbol() -> String {
    "H2O".to_string()
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OptimizeResponse {
    Success {
        success: bool,
        #[serde(rename = "recordId")]
        record_id: i64,
        #[serde(rename = "finalEnergyEV")]
        final_energy_ev: f64,
        #[serde(rename = "newCoordinates")]
        new_coordinates: Vec<[f64; 3]>,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl OptimizeResponse {
    fn failure(e: impl std::fmt::Display) -> Self {
        Self::Failure {
            success: false,
            error: e.to_string(),
        }
    }
}

/// POST /optimize. Domain failures come back as `success: false` envelopes
/// with a normal status code, never as transport-level errors, so the body
/// is decoded by hand from a JSON value rather than rejected by the
/// extractor. The blocking MOPAC run has no timeout; the request waits for
/// it.
async fn optimize(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Json<OptimizeResponse> {
    let resp = tokio::task::spawn_blocking(move || {
        try_optimize(&state, body).unwrap_or_else(|e| OptimizeResponse::failure(e))
    })
    .await;
    match resp {
        Ok(resp) => Json(resp),
        Err(e) => Json(OptimizeResponse::failure(e)),
    }
}

fn try_optimize(
    state: &AppState,
    body: Value,
) -> Result<OptimizeResponse, RequestError> {
    let req: OptimizeRequest = serde_json::from_value(body)?;
    let molecule = Molecule::new(&req.symbol, &req.initial_geometry)?;
    let opt = run_optimization(state.calculator.as_ref(), &molecule);
    info!("optimized {} with {}", molecule.symbol, opt.method.tag());
    let store = state.store.lock().map_err(|_| RequestError::Lock)?;
    let record = store.insert(&req.symbol, opt.energy, &opt.geometry)?;
    Ok(OptimizeResponse::Success {
        success: true,
        record_id: record.id,
        final_energy_ev: opt.energy,
        new_coordinates: opt.geometry,
    })
}
