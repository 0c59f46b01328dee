use std::sync::Arc;

use chatpad::engine::{self, ControllerPort, ControllerTickState, Scheduler, VirtualController};
use chatpad::{config, gateway, routes, state};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let layout = config.load_layout().expect("console layout load failed");
    let directory = Arc::new(config.load_directory().expect("user directory load failed"));
    tracing::info!(console = layout.name(), users = directory.user_count(), "input layout loaded");

    let scheduler = Scheduler::new(Arc::new(layout), config.scheduler_config());
    let controller: Arc<dyn ControllerPort> = Arc::new(VirtualController::new());

    // Spawn the tick loop; it is the only writer to the controller.
    let ticker = engine::spawn_tick_loop(scheduler.clone(), controller.clone());

    let gateway =
        gateway::ExecutionGateway::new(scheduler.clone(), directory.clone(), directory, config.input_limits());
    let app = routes::app(state::AppState::new(gateway));

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chatpad listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    // Leave the device released on the way out.
    let stopped = scheduler.stop_all();
    ticker.abort();
    if let Err(e) = controller.apply(&ControllerTickState::released()).await {
        tracing::warn!(error = %e, "controller release on shutdown failed");
    }
    if !stopped.is_empty() {
        tracing::info!(stopped = stopped.len(), "running inputs stopped for shutdown");
    }
    tracing::info!("chatpad stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
