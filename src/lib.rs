pub mod config;
pub mod downloader;
pub mod health;
pub mod relay;
pub mod telegram;

use std::sync::Arc;

use clap::Parser;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use downloader::backends::YtDlpBackend;
use downloader::extractors::{CliInfoExtractor, HttpPageFetcher, VariantExtractor};
use downloader::tools::{ToolManager, ToolType};
use downloader::Downloader;
use relay::{Relay, SessionStore};
use telegram::UploadBot;

const DEFAULT_LOG_FILTER: &str = "media_relay_lib=info,warn";

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::parse();

    let (tools, discovered_ytdlp) = tokio::task::spawn_blocking(|| {
        let manager = ToolManager::new();
        (manager.get_all_tools(), manager.find_ytdlp())
    })
    .await?;

    for tool in &tools {
        if tool.is_available {
            info!(
                tool = %tool.name,
                version = tool.version.as_deref().unwrap_or("unknown"),
                path = tool.path.as_deref().unwrap_or(""),
                "Tool found"
            );
        } else if tool.tool_type == ToolType::Ffmpeg && config.ffmpeg_location.is_some() {
            info!("ffmpeg not on PATH, using configured location");
        } else {
            warn!(tool = %tool.name, "Tool not found; downloads will fail until it is installed");
        }
    }

    let ytdlp_path = config.ytdlp_path.clone().unwrap_or(discovered_ytdlp);
    let extractor_config = config.extractor_config();

    let metadata = Arc::new(CliInfoExtractor::new(ytdlp_path.clone(), extractor_config.clone()));
    let pages = Arc::new(HttpPageFetcher::new(config.proxy.as_deref())?);
    let backend = Arc::new(YtDlpBackend::new(ytdlp_path, extractor_config));

    let relay = Arc::new(Relay::new(
        VariantExtractor::new(metadata, pages),
        Downloader::new(backend, config.download_dir.clone()),
        SessionStore::new(config.session_ttl(), config.session_capacity),
    ));

    health::spawn(config.port);

    let bot = Bot::new(&config.token);
    let upload_bot = UploadBot::new(&config.token, config.upload_timeout())?;

    info!(staging = %config.download_dir.display(), "Bot started");

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![relay, upload_bot])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
