use anyhow::Result;
use script_editor_api::core::config::DEFAULT_CONFIG_FILE;
use script_editor_api::{api, Config};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = match Config::load_or_create(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Err(e);
        }
    };

    config.ensure_directories()?;
    api::serve(&config).await
}
