use clap::Parser;
use echo_server::server::{self, shutdown_signal};
use echo_server::utils::error::ErrorSeverity;
use echo_server::utils::monitor::SystemMonitor;
use echo_server::utils::{logger, validation::Validate};
use echo_server::{build_classifier, CliConfig, EchoError};

fn exit_code(e: &EchoError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(context: &str, e: &EchoError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_from_env(cli.verbose);
    tracing::info!("Starting echo-server");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => fail("Failed to load configuration", &e),
    };
    tracing::debug!("Server config: {:?}", config);

    if let Err(e) = config.validate() {
        fail("Configuration validation failed", &e);
    }

    if let Some((bound, exposed)) = config.port_mismatch() {
        tracing::warn!(
            "⚠️ Listening on port {} but the container exposes port {}; clients using the exposed port will not reach the server",
            bound,
            exposed
        );
    }

    let monitor = SystemMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let classifier = build_classifier(&config);
    tracing::info!(
        "🧠 Classifier '{}' (ready: {})",
        classifier.name(),
        classifier.is_ready()
    );
    monitor.log_stats("Startup");

    let app = server::router(classifier, config.max_body_bytes);
    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => fail(
            &format!("Failed to bind {}", config.bind_address()),
            &EchoError::IoError(e),
        ),
    };

    if let Err(e) = server::serve(listener, app, shutdown_signal()).await {
        fail("Server stopped unexpectedly", &e);
    }

    monitor.log_final_stats();
    tracing::info!("✅ echo-server shut down cleanly");
    Ok(())
}
