mod availability;
mod boundary;
mod cache;
mod catalog;
mod commands;
mod error;
mod export;
mod series;
mod storage;
mod types;

use commands::StorageState;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            commands::get_countries,
            commands::get_country_code,
            commands::get_variables,
            commands::get_codebook,
            commands::get_availability,
            commands::get_trend_series,
            commands::get_rank_series,
            commands::get_missing_series,
            commands::get_subnational_means,
            commands::get_boundary,
            commands::get_regions,
            commands::export_trend_csv,
        ])
        .setup(|app| {
            let config = storage::StorageConfig::from_env();
            match storage::BucketReader::new(config) {
                Ok(reader) => {
                    app.manage(StorageState(reader));
                    app.manage(cache::DataCache::new());
                    println!("Storage client initialized");
                }
                Err(e) => {
                    eprintln!("Storage client initialization failed: {e}");
                }
            }
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
