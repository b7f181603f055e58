pub mod clipboard;
pub mod commands;
pub mod config;
pub mod excel;
pub mod reconcile;
pub mod session;

pub use config::ReconcileConfig;
pub use reconcile::{Field, ReconciliationState, ReconciliationView, ToggleOutcome};
pub use session::ReconcileSession;

/// Config file read from the working directory at startup
pub const CONFIG_FILE: &str = "reconcile.json";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::AppState;
    use std::sync::Arc;

    init_logging();

    let config = match ReconcileConfig::load(CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to default config");
            ReconcileConfig::default()
        }
    };

    let app_state = Arc::new(AppState {
        session: ReconcileSession::new(config),
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            // Upload commands
            commands::load_baseline_file,
            commands::load_baseline_data,
            commands::load_update_file,
            commands::load_update_data,
            // Resolution commands
            commands::toggle_resolution,
            commands::get_reconciliation,
            // Side-channel commands
            commands::copy_record_id,
            commands::export_report,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
