//! Axum router exposing the gateway operations as JSON endpoints

use crate::error::GatewayError;
use crate::filter::FilterCriteria;
use crate::service::Gateway;
use crate::update::UpdateRequest;
use crate::workflow::PrepareRequest;

use axum::extract::{Extension, Path};
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{error, info, warn};

type ApiResult = Result<Response, ApiError>;

#[derive(Debug)]
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::MalformedRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::InvalidAssetPayload(_)
            | GatewayError::FulfillmentError(_)
            | GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::LedgerUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            warn!("request rejected: {}", self.0);
        }
        let body_json = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body_json)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FilterBody {
    #[serde(default)]
    filter: FilterCriteria,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureBody {
    #[serde(default)]
    filter: FilterCriteria,
    #[serde(alias = "required_keys")]
    required_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElectionBody {
    #[serde(default)]
    filter: FilterCriteria,
    #[serde(alias = "election_id")]
    election_id: String,
}

///////////////////////////////////////////////////////////////////////////
// queries
///////////////////////////////////////////////////////////////////////////
async fn get_transaction(
    Path(id): Path<String>,
    Extension(gateway): Extension<Gateway>,
) -> ApiResult {
    let record = gateway.get_transaction(&id).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

async fn fetch_election(
    Path(id): Path<String>,
    Extension(gateway): Extension<Gateway>,
) -> ApiResult {
    let record = gateway.fetch_election_by_id(&id).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

async fn filtered_transactions(
    Extension(gateway): Extension<Gateway>,
    body: Option<Json<FilterBody>>,
) -> ApiResult {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let records = gateway.get_filtered_transactions(&body.filter).await?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

async fn specific_data_structure(
    Extension(gateway): Extension<Gateway>,
    Json(body): Json<StructureBody>,
) -> ApiResult {
    let records = gateway
        .get_specific_data_structure(&body.filter, &body.required_keys)
        .await?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

async fn transactions_by_election(
    Extension(gateway): Extension<Gateway>,
    Json(body): Json<ElectionBody>,
) -> ApiResult {
    let records = gateway
        .get_transactions_by_election_id(&body.filter, &body.election_id)
        .await?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

///////////////////////////////////////////////////////////////////////////
// mutations
///////////////////////////////////////////////////////////////////////////
async fn post_transaction(
    Extension(gateway): Extension<Gateway>,
    Json(request): Json<PrepareRequest>,
) -> ApiResult {
    let receipt = gateway.post_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

async fn update_transaction(
    Extension(gateway): Extension<Gateway>,
    Json(changes): Json<UpdateRequest>,
) -> ApiResult {
    let record = gateway.update_transaction(changes).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

async fn update_multiple(
    Extension(gateway): Extension<Gateway>,
    Json(batch): Json<Vec<UpdateRequest>>,
) -> ApiResult {
    let records = gateway.update_multiple_transactions(batch).await?;
    Ok((StatusCode::OK, Json(records)).into_response())
}

async fn generate_keys(Extension(gateway): Extension<Gateway>) -> ApiResult {
    Ok((StatusCode::OK, Json(gateway.generate_keys())).into_response())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Request logging middleware.
///
/// Logs all HTTP requests with method, path, status, and latency.
async fn logging_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, StatusCode> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    info!("{} {} {} - {:.3}s", method, path, status, latency);

    Ok(response)
}

/// Build the router (call from main)
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transactions", post(post_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/filter", post(filtered_transactions))
        .route("/transactions/structure", post(specific_data_structure))
        .route("/transactions/election", post(transactions_by_election))
        .route("/transactions/update", post(update_transaction))
        .route("/transactions/update/batch", post(update_multiple))
        .route("/elections/:id", get(fetch_election))
        .route("/keys", post(generate_keys))
        .layer(middleware::from_fn(logging_middleware))
        .layer(Extension(gateway))
}
