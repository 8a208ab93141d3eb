use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
};

use super::socket::handle_socket;
use crate::state::AppState;

async fn socket_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.rooms))
}

pub fn init_messaging_router() -> Router<AppState> {
    Router::new().route("/socket", get(socket_upgrade))
}
