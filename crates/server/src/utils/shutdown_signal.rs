use tokio::signal;

/// Resolves on Ctrl+C or, on unix, SIGTERM. In-flight searches finish
/// before the listener closes.
///
/// # Panics
///
/// Panics if a signal handler fails to install.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    signal::ctrl_c()
      .await
      .expect("failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .expect("failed to install SIGTERM handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  let signal = tokio::select! {
    () = ctrl_c => "ctrl-c",
    () = terminate => "sigterm",
  };
  tracing::info!(signal, "shutting down");
}
