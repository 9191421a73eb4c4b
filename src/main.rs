// Auction console entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Load players/teams (cancellable with Ctrl+C)
// 5. Build the auction session, check for crash recovery
// 6. Create mpsc channels
// 7. Spawn the orchestrator task
// 8. Run the TUI event loop (blocking until the operator quits)
// 9. Cleanup on exit

use auction_console::auction::session::AuctionSession;
use auction_console::{app, config, data, db, sheet, tui};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Auction console starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} categories, default budget cap {}",
        config.auction.categories.order.len(),
        config.budget.default_cap
    );

    // 3. Open database
    let database = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Load players/teams. The load is raced against Ctrl+C so tearing
    //    the session down mid-flight drops the in-flight fetch instead of
    //    letting late results start a session.
    info!("Loading auction data...");
    let auction_data = tokio::select! {
        result = data::load_auction_data(&config) => {
            result.context("failed to load auction data")?
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Startup cancelled during data load");
            return Ok(());
        }
    };
    info!(
        "Loaded {} players, {} teams",
        auction_data.players.len(),
        auction_data.teams.len()
    );

    // 5. Build the session and check for crash recovery
    let settings = config.session_settings(&auction_data.teams);
    let session = AuctionSession::new(auction_data.players, auction_data.teams, settings);

    let sheet_client = sheet::SheetClient::from_config(&config);
    match &sheet_client {
        sheet::SheetClient::Active(_) => info!("Sale webhook configured"),
        sheet::SheetClient::Disabled => info!("Sale webhook disabled (no URL configured)"),
    }

    let mut app_state = app::AppState::new(config, session, database, sheet_client);
    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Auction state restored from previous session"),
        Ok(false) => info!("Starting fresh auction session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 6. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 7. Spawn the orchestrator task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Orchestrator loop error: {}", e);
        }
    });

    // 8. Run the TUI event loop (blocking until the operator quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 9. Cleanup: wait for the orchestrator to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Auction console shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by
/// the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("auction-console.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_console=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
