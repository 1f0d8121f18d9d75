use tracing::{error, info};

use filedrive::{Config, Database, DriveService, WebServer};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = filedrive::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filedrive::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("filedrive stopped: {e}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    info!("filedrive starting");
    info!(
        "Storage backend: {} ({}), quota {} bytes{}",
        config.storage.backend,
        config.storage.path,
        config.quota.limit_bytes,
        if config.quota.enforce { ", enforced" } else { "" }
    );

    let db = Database::open(&config.database.path).await?;
    let blobs = filedrive::open_store(&config.storage)?;
    info!("Blob store ready: {}", blobs.backend_name());
    let drive = DriveService::new(db, blobs, config.quota.clone());

    let server = WebServer::new(&config.server, &config.web, drive)?;
    server.run().await?;

    Ok(())
}
