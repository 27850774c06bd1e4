// System status display: database size, incident counts, model presence.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::models::TimeWindow;
use crate::db::IncidentStore;
use crate::embedding::download;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn IncidentStore>, config: &Config) -> Result<()> {
    if !Path::new(&config.db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `wastewatch init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path, file_size);

    let total = store.count_incidents(TimeWindow::all()).await?;
    let recent = store
        .count_incidents(TimeWindow::last_days(Utc::now(), 7))
        .await?;
    let processed = store.fetch_candidates(None).await?.len();
    println!(
        "Incidents: {} total, {} in the last 7 days, {} processed",
        total, recent, processed
    );
    if (processed as i64) < total {
        println!("  Run `wastewatch reprocess` to process the rest");
    }

    if download::model_files_present(&config.model_dir, &config.model_name) {
        println!(
            "Embedding model: {} ({})",
            config.model_name,
            download::encoder_dir(&config.model_dir, &config.model_name).display()
        );
    } else {
        println!("Embedding model: not downloaded");
        println!("  Run `wastewatch download-model` to fetch it");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
