use axum::{Router, response::Html, routing::get};
use camsight_shared::AppError;
use tokio::net::TcpListener;

use crate::{
  api,
  utils::{AppState, shutdown_signal},
};

#[axum::debug_handler]
async fn handler() -> Html<&'static str> {
  Html("<h1>camsight</h1><p>Try <code>/api/search?q=snow on the bridge</code> or <a href=\"/openapi/\">the API docs</a>.</p>")
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(handler))
    .merge(api::app())
    .with_state(state)
}

pub async fn server(state: AppState, bind_addr: &str) -> Result<(), AppError> {
  let app = router(state);

  let listener = TcpListener::bind(bind_addr).await?;

  tracing::info!("server started at http://{bind_addr}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  Ok(())
}
