//! The `dev` command: bootstrap the emulator, synthesize routes, serve.
//!
//! Bootstrap order matters. The emulator starts first so its address is
//! known before any route is installed; discovery parses handler files on
//! blocking threads in parallel; the dev server binds last, once the whole
//! route table is in place.

use std::sync::Arc;

use pagebridge_core::{collect_exports, handler_files, synthesize};
use tokio::task::JoinSet;

use crate::cli::DevArgs;
use crate::config::DevConfig;
use crate::error::{CliError, Result};
use crate::proxy::{ProxyClient, RouteTable};
use crate::server::{AppState, DevServer};
use crate::supervisor::{Supervisor, SupervisorConfig, DEFAULT_STARTUP_TIMEOUT};
use crate::ui;

/// Run the dev server until interrupted.
pub async fn execute(args: &DevArgs) -> Result<()> {
    let config = DevConfig::from_args(args)?;

    ui::info(&format!("Starting functions emulator ({})", config.emulator));
    let supervisor = Supervisor::new(SupervisorConfig {
        emulator: config.emulator.clone(),
        static_dir: config.static_dir.to_string_lossy().into_owned(),
        startup_timeout: DEFAULT_STARTUP_TIMEOUT,
    });
    let mut emulator = supervisor.start(&config.options).await?;
    ui::success(&format!("Emulator ready at {}", emulator.address()));

    let routes = build_route_table(&config).await;
    let routes = match routes {
        Ok(routes) => routes,
        Err(err) => {
            // A broken handler file is fatal; don't leave the child behind.
            emulator.shutdown().await;
            return Err(err);
        }
    };
    if routes.is_empty() {
        ui::warning("No function routes discovered; serving static files only");
    }

    let state = Arc::new(AppState {
        routes,
        proxy: ProxyClient::new(emulator.address()),
        static_dir: config.static_dir.clone(),
    });

    let server = DevServer::new(config, state);
    let mut server_task = tokio::spawn(server.start());

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            ui::info("Shutting down");
            server_task.abort();
            Ok(())
        }
        joined = &mut server_task => match joined {
            Ok(result) => result,
            Err(e) => Err(CliError::Server(e.to_string())),
        },
    };

    emulator.shutdown().await;
    result
}

/// Parse every handler file and install the synthesized routes.
///
/// Files are parsed concurrently on blocking threads, then installed in
/// the discovery enumeration order so installation order stays
/// deterministic across runs.
async fn build_route_table(config: &DevConfig) -> Result<RouteTable> {
    let files = handler_files(&config.functions_dir);

    let mut set = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        set.spawn_blocking(move || {
            let exports = collect_exports(&path)?;
            Ok::<_, pagebridge_core::CoreError>((index, path, exports))
        });
    }

    let mut parsed = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (index, path, exports) = joined
            .map_err(|e| CliError::Custom(format!("discovery task failed: {e}")))??;
        parsed.push((index, path, exports));
    }
    parsed.sort_by_key(|(index, _, _)| *index);

    let mut table = RouteTable::new();
    for (_, path, exports) in parsed {
        let relative = path.strip_prefix(&config.functions_dir).unwrap_or(&path);
        if let Some(descriptor) = synthesize(relative, &exports) {
            if config.options.log_level.is_log() {
                ui::info(&format!("Proxying function at {}", descriptor.route_path));
            }
            table.install(descriptor);
        }
    }
    Ok(table)
}
