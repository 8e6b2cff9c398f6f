// Runtime configuration: command-line flags with environment fallbacks

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::downloader::extractors::ExtractorConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "media-relay", version, about = "Relay YouTube and Pinterest media into Telegram chats")]
pub struct Config {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Port for the liveness endpoint
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Staging directory for downloaded files
    #[arg(long, env = "DOWNLOAD_DIR", default_value = "downloads")]
    pub download_dir: PathBuf,

    /// yt-dlp binary; discovered on the system when omitted
    #[arg(long, env = "YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// ffmpeg binary or directory handed to yt-dlp
    #[arg(long, env = "FFMPEG_LOCATION")]
    pub ffmpeg_location: Option<String>,

    /// Proxy for yt-dlp and page requests (http://, socks5://)
    #[arg(long, env = "YTDLP_PROXY")]
    pub proxy: Option<String>,

    /// Netscape cookies file for yt-dlp
    #[arg(long = "cookies", env = "YTDLP_COOKIES")]
    pub cookies_path: Option<String>,

    /// yt-dlp socket timeout in seconds
    #[arg(long, env = "YTDLP_SOCKET_TIMEOUT")]
    pub socket_timeout: Option<u32>,

    /// How long a quality menu stays answerable
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = 3600)]
    pub session_ttl_secs: u64,

    /// Maximum number of pending quality menus kept in memory
    #[arg(long, env = "SESSION_CAPACITY", default_value_t = 10_000)]
    pub session_capacity: usize,

    /// Connect timeout and TCP keepalive for file uploads; the whole upload
    /// may additionally take as long as a full-size file needs on a slow link
    #[arg(long, env = "UPLOAD_TIMEOUT_SECS", default_value_t = 60)]
    pub upload_timeout_secs: u64,
}

impl Config {
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies_path.clone())
            .with_socket_timeout(self.socket_timeout)
            .with_ffmpeg_location(self.ffmpeg_location.clone())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}
