//! HTTP transport for the engine.
//!
//! Routes map one-to-one to the lifecycle and allocation operations:
//!
//! - `GET    /api/subnets` — list subnets
//! - `POST   /api/subnets` — create a subnet with its inventory
//! - `GET    /api/subnets/{id}` — fetch one subnet
//! - `DELETE /api/subnets/{id}?force=` — delete, guarded unless forced
//! - `GET    /api/subnets/{id}/ipaddresses?reserved=` — list inventory
//! - `POST   /api/subnets/{id}/ipaddresses` — reserve the next free address
//! - `GET    /api/ipaddresses?reserved=` — list addresses across subnets
//! - `DELETE /api/ipaddresses/{id}` — release a reservation
//!
//! Each failure kind maps to a distinct status: malformed input and
//! validation failures are 400, missing records are 404, exhaustion and
//! the reserved-delete guard are 409.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::alloc::AllocationManager;
use crate::error::Error;
use crate::model::{Address, Subnet, SubnetRequest};
use crate::store::Store;
use crate::subnet::SubnetManager;

/// Shared handler state: the two engine managers over one store.
#[derive(Clone)]
pub struct AppState {
    pub subnets: SubnetManager,
    pub allocations: AllocationManager,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            subnets: SubnetManager::new(store.clone()),
            allocations: AllocationManager::new(store),
        }
    }
}

/// Error body returned to clients.
#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

/// Engine error with its HTTP mapping.
struct AppError(Error);

impl From<Error> for AppError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidNetwork(_) | Error::InvalidAddress(_) | Error::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::SubnetNotFound(_) | Error::AddressNotFound(_) => StatusCode::NOT_FOUND,
            Error::NoAvailableAddress(_) | Error::HasReservedAddresses(_) => StatusCode::CONFLICT,
            Error::Store(_) | Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ApiError {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Deserialize)]
struct ReservedQuery {
    reserved: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    force: bool,
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/subnets", get(list_subnets).post(create_subnet))
        .route("/api/subnets/{id}", get(get_subnet).delete(delete_subnet))
        .route(
            "/api/subnets/{id}/ipaddresses",
            get(list_subnet_addresses).post(reserve_address),
        )
        .route("/api/ipaddresses", get(list_addresses))
        .route("/api/ipaddresses/{id}", delete(release_address))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the API until the task is cancelled.
pub async fn run(addr: SocketAddr, state: AppState) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn list_subnets(State(state): State<AppState>) -> ApiResult<Json<Vec<Subnet>>> {
    Ok(Json(state.subnets.list().await?))
}

async fn create_subnet(
    State(state): State<AppState>,
    Json(request): Json<SubnetRequest>,
) -> ApiResult<(StatusCode, Json<Subnet>)> {
    let subnet = state.subnets.create(request).await?;
    Ok((StatusCode::CREATED, Json(subnet)))
}

async fn get_subnet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Subnet>> {
    Ok(Json(state.subnets.get(id).await?))
}

async fn delete_subnet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    state.subnets.delete(id, query.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_subnet_addresses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReservedQuery>,
) -> ApiResult<Json<Vec<Address>>> {
    Ok(Json(
        state.allocations.list_by_subnet(id, query.reserved).await?,
    ))
}

async fn reserve_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Address>)> {
    let address = state.allocations.reserve(id).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

async fn list_addresses(
    State(state): State<AppState>,
    Query(query): Query<ReservedQuery>,
) -> ApiResult<Json<Vec<Address>>> {
    Ok(Json(state.allocations.list_all(query.reserved).await?))
}

async fn release_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.allocations.release(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
