//! Axum glue (out of scope per spec.md §1, kept so the bridge is a runnable
//! binary): HTTP routing only. Every handler parses the request, hands the
//! work to [`crate::operations::TelescopeResource`] and [`crate::envelope`]
//! on a blocking thread, and serializes the result.

use crate::envelope::{self, Rendered};
use crate::json::Json;
use crate::operations::{Method, TelescopeResource};
use crate::params::{ArgumentMap, Case};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, on, MethodFilter};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct ServerInfo {
    pub server_name: &'static str,
    pub manufacturer: &'static str,
    pub manufacturer_version: &'static str,
    pub location: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        ServerInfo {
            server_name: "Alpaca Telescope Server",
            manufacturer: "Marrony Neris",
            manufacturer_version: "0.0.1",
            location: "US",
        }
    }
}

struct AppState {
    resource: TelescopeResource,
    info: ServerInfo,
}

pub fn build_router(resource: TelescopeResource) -> Router {
    let state = Arc::new(AppState {
        resource,
        info: ServerInfo::default(),
    });

    Router::new()
        .route("/management/apiversions", get(apiversions))
        .route("/management/v1/description", get(description))
        .route("/management/v1/configureddevices", get(configureddevices))
        .route(
            "/api/v1/:device_type/:device_id/:operation",
            on(MethodFilter::GET | MethodFilter::PUT, telescope_operation),
        )
        .route(
            "/setup/v1/:device_type/:device_id/:operation",
            on(MethodFilter::GET | MethodFilter::PUT, setup_echo),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn rendered_to_response(rendered: Rendered) -> Response {
    let status = StatusCode::from_u16(rendered.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match rendered.body {
        Json::String(text) if status != StatusCode::OK => (status, text).into_response(),
        body => (status, axum::Json(body)).into_response(),
    }
}

fn query_args(query: &HashMap<String, String>) -> ArgumentMap {
    let mut args = ArgumentMap::new(Case::Insensitive);
    for (k, v) in query {
        args.insert(k.clone(), v.clone());
    }
    args
}

async fn apiversions(Query(query): Query<HashMap<String, String>>) -> Response {
    let args = query_args(&query);
    let result = Ok(Json::array([Json::from(1)]));
    rendered_to_response(envelope::render(result, &args))
}

async fn description(State(state): State<Arc<AppState>>, Query(query): Query<HashMap<String, String>>) -> Response {
    let args = query_args(&query);
    let info = &state.info;
    let result = Ok(Json::object([
        ("ServerName", Json::from(info.server_name)),
        ("Manufacturer", Json::from(info.manufacturer)),
        ("ManufacturerVersion", Json::from(info.manufacturer_version)),
        ("Location", Json::from(info.location)),
    ]));
    rendered_to_response(envelope::render(result, &args))
}

async fn configureddevices(State(state): State<Arc<AppState>>, Query(query): Query<HashMap<String, String>>) -> Response {
    let args = query_args(&query);
    let devices = (0..state.resource.device_count())
        .map(|id| {
            Json::object([
                ("DeviceName", Json::from(state.resource.device(id).map(|t| t.metadata.name.clone()).unwrap_or_default())),
                ("DeviceType", Json::from("Telescope")),
                ("DeviceNumber", Json::from(id as i32)),
                ("UniqueID", Json::from(device_unique_id(id))),
            ])
        })
        .collect::<Vec<_>>();
    rendered_to_response(envelope::render(Ok(Json::array(devices)), &args))
}

/// Deterministic per-device UUID (spec.md §3 "UniqueID"): derived from the
/// device's position in the configured list, so it is stable across
/// restarts without persisting anything.
fn device_unique_id(device_id: usize) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, format!("nexstar-alpaca/telescope/{device_id}").as_bytes()).to_string()
}

async fn telescope_operation(
    State(state): State<Arc<AppState>>,
    Path((device_type, device_id, operation)): Path<(String, String, String)>,
    method: axum::http::Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let (alpaca_method, args) = if method == axum::http::Method::GET {
        (Method::Get, query_args(&query))
    } else {
        (Method::Put, ArgumentMap::parse(Case::Sensitive, &String::from_utf8_lossy(&body)))
    };

    let envelope_args = args.clone();
    let result = tokio::task::spawn_blocking(move || state.resource.dispatch(&device_type, &device_id, &operation, alpaca_method, &args))
        .await
        .unwrap_or_else(|_| Err(crate::error::Error::http(500, "worker thread panicked")));

    rendered_to_response(envelope::render(result, &envelope_args))
}

async fn setup_echo(Path((device_type, device_id, operation)): Path<(String, String, String)>) -> Response {
    (
        StatusCode::OK,
        format!("Setup page for {device_type}/{device_id}/{operation} (setup UI is out of scope)."),
    )
        .into_response()
}
