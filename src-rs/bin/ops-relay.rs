use std::process::ExitCode;
use std::sync::Arc;

use ops_relay_rs::api::server::RelayServer;
use ops_relay_rs::dispatch::Dispatcher;
use ops_relay_rs::helpers::build_chat_client;
use ops_relay_rs::RelayConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// The chat client uses a blocking HTTP client, so everything is built before
// the async runtime starts and dropped after it shuts down.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ops_relay_rs=info,tower_http=info")),
        )
        .init();

    let cfg = match RelayConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let chat = match build_chat_client(&cfg) {
        Ok(chat) => chat,
        Err(err) => {
            error!(error = %err, "failed to build chat client");
            return ExitCode::FAILURE;
        }
    };
    if chat.is_none() {
        warn!("GLM_API_KEY not set; chat replies are disabled");
    }

    let dispatcher = match Dispatcher::new(&cfg, chat) {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(err) => {
            error!(error = %err, dir = %cfg.tasks_dir.display(), "cannot open task directory");
            return ExitCode::FAILURE;
        }
    };
    info!(
        port = cfg.port,
        tasks_dir = %cfg.tasks_dir.display(),
        heuristics = cfg.heuristics,
        llm_intent = cfg.llm_intent,
        "starting ops relay"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };
    let server = RelayServer::new(cfg.port, dispatcher.clone());
    let outcome = runtime.block_on(server.start());
    drop(server);
    drop(runtime);
    drop(dispatcher);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}
