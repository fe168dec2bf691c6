use std::sync::Arc;
use warp::Filter;

use crate::registry::RoomRegistry;
use crate::websocket::ConnectionManager;
use crate::websocket::rate_limiter::RateLimitSettings;

pub mod broadcast;
pub mod config;
pub mod registry;
pub mod round_timer;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
    rate_limit: RateLimitSettings,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(registry_filter.clone())
        .map(move |ws: warp::ws::Ws, conn_mgr, registry| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, conn_mgr, registry, rate_limit)
            })
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Read-only room state, same shape as GAME_STATE_UPDATE
    let room_state = warp::path!("rooms" / String)
        .and(warp::get())
        .and(registry_filter)
        .and_then(handle_room_state_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(room_state)
        .with(cors)
        .with(warp::log("chroma_party"))
}

async fn handle_room_state_request(
    room_id: String,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry.room_snapshot(&room_id).await {
        Some(snapshot) => Ok(warp::reply::with_status(
            warp::reply::json(&snapshot),
            warp::http::StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}
