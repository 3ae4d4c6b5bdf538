//! Serve command - HTTP endpoints for an e-ink display to poll.
//!
//! - `/`            service info
//! - `/status`      cached vessel data, tile cache counters, last map outcome
//! - `/display.bmp` full 1-bit frame
//! - `/map.png`     map only; `?lat=..&lon=..` overrides the vessel position
//! - `/webhook`     TRMNL polling payload with the formatted vessel fields

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use shiptracker::coord::GeoPosition;
use shiptracker::display::{format_course, format_speed, format_timestamp, DisplayAssembler};
use shiptracker::map::{MapRenderer, RenderedMap, TargetSize};
use shiptracker::provider::ReqwestClient;
use shiptracker::vessel::{VesselClient, VesselData};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::common::display_frame;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
}

struct AppState {
    renderer: MapRenderer<ReqwestClient>,
    vessel: VesselClient<ReqwestClient>,
    assembler: DisplayAssembler,
    map_target: TargetSize,
    refresh_interval: u64,
    last_map: RwLock<Option<MapSummary>>,
    shutdown: CancellationToken,
}

/// What the last render produced, for `/status`.
struct MapSummary {
    at: DateTime<Utc>,
    source: String,
    fallback: bool,
    attempts: Vec<Value>,
}

impl MapSummary {
    fn of(map: &RenderedMap) -> Self {
        let attempts = map
            .attempts
            .iter()
            .map(|a| {
                json!({
                    "provider": a.provider,
                    "elapsed_ms": a.elapsed.as_millis() as u64,
                    "error": a.error.as_ref().map(ToString::to_string),
                })
            })
            .collect();
        Self {
            at: Utc::now(),
            source: map.source.to_string(),
            fallback: map.is_fallback(),
            attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MapQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Run the serve command.
pub fn run(runner: &CliRunner, args: ServeArgs) -> Result<(), CliError> {
    runner.log_startup("serve");
    let config = runner.config();

    // CLI takes precedence, then config
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address {host}:{port}: {e}")))?;

    let map_config = runner.map_config()?;
    let state = Arc::new(AppState {
        renderer: runner.map_renderer(&map_config)?,
        vessel: runner.vessel_client()?,
        assembler: DisplayAssembler::new(config.display.width, config.display.height)?,
        map_target: map_config.target,
        refresh_interval: config.vessel.refresh_interval.as_secs(),
        last_map: RwLock::new(None),
        shutdown: CancellationToken::new(),
    });

    let runtime = runner.runtime()?;
    runtime.block_on(serve(addr, state))
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/status", get(status))
        .route("/display.bmp", get(display_bmp))
        .route("/map.png", get(map_png))
        .route("/webhook", get(webhook))
        .fallback(not_found)
        .with_state(state)
}

async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), CliError> {
    let shutdown = state.shutdown.clone();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(CliError::Server)?;

    println!("Shiptracker v{} serving on http://{}", shiptracker::VERSION, addr);
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            info!("Shutdown requested, cancelling in-flight renders");
            shutdown.cancel();
        })
        .await
        .map_err(CliError::Server)?;

    info!("HTTP server stopped");
    Ok(())
}

async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl+C; stopping");
    }
}

fn iso(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

async fn home(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": "Shiptracker",
        "description": "Vessel position on a 1-bit map for e-ink displays",
        "version": shiptracker::VERSION,
        "status": "running",
        "last_update": iso(state.vessel.last_update()),
        "mmsi": state.vessel.mmsi(),
        "refresh_interval": state.refresh_interval,
    }))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cache = state.renderer.chain().fetcher().cache().stats();
    let last_map = state.last_map.read().await.as_ref().map(|m| {
        json!({
            "at": iso(Some(m.at)),
            "source": m.source,
            "fallback": m.fallback,
            "attempts": m.attempts,
        })
    });

    Json(json!({
        "timestamp": iso(Some(Utc::now())),
        "service_status": "operational",
        "last_update": iso(state.vessel.last_update()),
        "vessel_data": state.vessel.cached(),
        "tile_cache": {
            "hits": cache.hits,
            "misses": cache.misses,
            "expired": cache.expired,
            "fetches": cache.fetches,
        },
        "last_map": last_map,
        "config": {
            "mmsi": state.vessel.mmsi(),
            "refresh_interval": state.refresh_interval,
            "display_dimensions": format!("{}x{}", state.assembler.width(), state.assembler.height()),
        },
    }))
}

async fn display_bmp(State(state): State<Arc<AppState>>) -> Response {
    let vessel = state.vessel.current().await;
    let (frame, map) = display_frame(
        &state.assembler,
        &state.renderer,
        vessel,
        state.vessel.last_update(),
        &state.shutdown,
    )
    .await;
    if let Some(map) = &map {
        *state.last_map.write().await = Some(MapSummary::of(map));
    }
    ([(header::CONTENT_TYPE, "image/bmp")], frame.to_bmp()).into_response()
}

async fn map_png(State(state): State<Arc<AppState>>, Query(query): Query<MapQuery>) -> Response {
    let position = match (query.lat, query.lon) {
        (Some(lat), Some(lon)) => GeoPosition::new(lat, lon).map_err(|e| e.to_string()),
        (None, None) => match state.vessel.current().await {
            Ok(vessel) => vessel.position().map_err(|e| e.to_string()),
            Err(e) => {
                warn!(error = %e, "No vessel position for map");
                return json_error(StatusCode::SERVICE_UNAVAILABLE, &e.to_string());
            }
        },
        _ => Err("lat and lon must be given together".to_string()),
    };
    let position = match position {
        Ok(position) => position,
        Err(message) => return json_error(StatusCode::BAD_REQUEST, &message),
    };

    let map = state
        .renderer
        .render_with_cancel(position, state.map_target, &state.shutdown)
        .await;
    *state.last_map.write().await = Some(MapSummary::of(&map));

    match map.bitmap.to_png() {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            error!(error = %e, "PNG encoding failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn webhook(State(state): State<Arc<AppState>>) -> Response {
    match state.vessel.current().await {
        Ok(vessel) => Json(webhook_payload(&vessel, state.refresh_interval)).into_response(),
        Err(e) => {
            warn!(error = %e, "Webhook has no vessel data");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "Unable to fetch vessel data")
        }
    }
}

/// Merge variables for a TRMNL polling plugin.
fn webhook_payload(vessel: &VesselData, refresh_interval: u64) -> Value {
    json!({
        "merge_variables": {
            "ship_name": vessel.name,
            "mmsi": vessel.mmsi,
            "position": format!("{}°, {}°", vessel.latitude, vessel.longitude),
            "speed": format_speed(vessel.speed),
            "course": format_course(vessel.course),
            "last_update": vessel.timestamp.as_deref().map(format_timestamp),
        },
        "refresh_interval": refresh_interval,
    })
}

async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Resource not found")
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiptracker::map::render_fallback;

    #[test]
    fn test_summary_of_fallback_map() {
        let position = GeoPosition::new(62.8568, 58.7332).unwrap();
        let map = render_fallback(&position, TargetSize::new(40, 30), "offline");

        let summary = MapSummary::of(&map);

        assert!(summary.fallback);
        assert!(summary.attempts.is_empty());
        assert!(summary.source.contains("offline"));
    }

    #[test]
    fn test_webhook_payload_fields() {
        let position = GeoPosition::new(62.8568, 58.7332).unwrap();
        let mut vessel = VesselData::at_position(position, "235103357");
        vessel.timestamp = Some("2024-03-01 12:34:56 UTC".to_string());

        let payload = webhook_payload(&vessel, 900);

        let vars = &payload["merge_variables"];
        assert_eq!(vars["mmsi"], "235103357");
        assert_eq!(vars["position"], "62.8568°, 58.7332°");
        assert_eq!(vars["last_update"], "2024-03-01 12:34 UTC");
        assert_eq!(payload["refresh_interval"], 900);
    }

    #[test]
    fn test_json_error_status() {
        let response = json_error(StatusCode::NOT_FOUND, "Resource not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_iso_uses_utc_suffix() {
        let time = DateTime::parse_from_rfc3339("2024-03-01T12:34:56+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(iso(Some(time)).unwrap(), "2024-03-01T10:34:56Z");
        assert!(iso(None).is_none());
    }
}
