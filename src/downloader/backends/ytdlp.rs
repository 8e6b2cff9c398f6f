use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::downloader::errors::AcquisitionError;
use crate::downloader::extractors::ExtractorConfig;
use crate::downloader::models::FetchParams;
use crate::downloader::traits::{FetchJob, MediaFetcher};
use crate::downloader::utils::{network_args, run_output, stderr_excerpt, RunError};

/// Audio transcode target
const AUDIO_CODEC: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";
/// Container for merged video + audio
const MERGE_CONTAINER: &str = "mp4";

/// yt-dlp download backend; ffmpeg does the merge and audio transcode
pub struct YtDlpBackend {
    ytdlp_path: String,
    config: ExtractorConfig,
}

impl YtDlpBackend {
    pub fn new(ytdlp_path: impl Into<String>, config: ExtractorConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            config,
        }
    }

    /// yt-dlp `-f` selector and post-processing arguments
    fn format_args(params: &FetchParams) -> Vec<String> {
        match params {
            FetchParams::Audio => vec![
                "-f".to_string(),
                "bestaudio/best".to_string(),
                "-x".to_string(),
                "--audio-format".to_string(),
                AUDIO_CODEC.to_string(),
                "--audio-quality".to_string(),
                AUDIO_QUALITY.to_string(),
            ],
            FetchParams::Video { max_height } => vec![
                "-f".to_string(),
                format!(
                    "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                    h = max_height
                ),
                "--merge-output-format".to_string(),
                MERGE_CONTAINER.to_string(),
            ],
        }
    }

    fn build_args(&self, job: &FetchJob) -> Vec<String> {
        let mut args = Self::format_args(&job.params);
        args.extend([
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            // Write straight to the final name; no `.part` files left behind on abort
            "--no-part".to_string(),
            "-o".to_string(),
            job.output_template.clone(),
            // Final path after merge/transcode, printed once the file is in place
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ]);

        if let Some(location) = &self.config.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.clone());
        }

        args.extend(network_args(&self.config));
        args.push(job.url.clone());
        args
    }

    /// Last non-empty stdout line is the printed file path
    fn parse_output_path(stdout: &[u8]) -> Option<PathBuf> {
        String::from_utf8_lossy(stdout)
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .map(PathBuf::from)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, job: &FetchJob) -> Result<PathBuf, AcquisitionError> {
        let args = self.build_args(job);
        info!(url = %job.url, params = ?job.params, "Starting yt-dlp download");
        debug!(args = %args.join(" "), "yt-dlp arguments");

        let output = run_output(&self.ytdlp_path, &args)
            .await
            .map_err(|e| match e {
                RunError::Spawn(err) => {
                    AcquisitionError::ToolNotFound(format!("{}: {}", self.ytdlp_path, err))
                }
                other => AcquisitionError::Failed(other.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url = %job.url, status = ?output.status.code(), "yt-dlp download failed");
            return Err(AcquisitionError::Failed(stderr_excerpt(&stderr)));
        }

        let path = Self::parse_output_path(&output.stdout).ok_or(AcquisitionError::OutputMissing)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(path = %path.display(), "yt-dlp reported a file that does not exist");
            return Err(AcquisitionError::OutputMissing);
        }

        info!(path = %path.display(), "Download complete");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(params: FetchParams) -> FetchJob {
        FetchJob {
            url: "https://youtu.be/abc".to_string(),
            params,
            output_template: "downloads/7_%(title)s.%(ext)s".to_string(),
        }
    }

    #[test]
    fn test_audio_args() {
        let backend = YtDlpBackend::new("yt-dlp", ExtractorConfig::default());
        let args = backend.build_args(&job(FetchParams::Audio));
        let joined = args.join(" ");
        assert!(joined.starts_with("-f bestaudio/best -x --audio-format mp3 --audio-quality 192K"));
        assert!(joined.contains("-o downloads/7_%(title)s.%(ext)s"));
        assert!(joined.contains("--print after_move:filepath"));
        assert!(joined.contains("--no-part"));
        assert!(!joined.contains("--merge-output-format"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_video_args() {
        let config = ExtractorConfig::default()
            .with_ffmpeg_location(Some("/opt/ffmpeg/bin".to_string()))
            .with_proxy(Some("http://proxy:8080".to_string()));
        let backend = YtDlpBackend::new("yt-dlp", config);
        let args = backend.build_args(&job(FetchParams::Video { max_height: 720 }));
        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "bestvideo[height<=720]+bestaudio/best[height<=720]");
        assert!(args.windows(2).any(|w| w[0] == "--merge-output-format" && w[1] == "mp4"));
        assert!(args.windows(2).any(|w| w[0] == "--ffmpeg-location" && w[1] == "/opt/ffmpeg/bin"));
        assert!(args.windows(2).any(|w| w[0] == "--proxy" && w[1] == "http://proxy:8080"));
    }

    #[test]
    fn test_parse_output_path() {
        assert_eq!(
            YtDlpBackend::parse_output_path(b"downloads/7_Clip.mp4\n\n"),
            Some(PathBuf::from("downloads/7_Clip.mp4"))
        );
        assert_eq!(YtDlpBackend::parse_output_path(b"\n  \n"), None);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let backend = YtDlpBackend::new("no-such-yt-dlp-binary", ExtractorConfig::default());
        let err = backend.fetch(&job(FetchParams::Audio)).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::ToolNotFound(_)));
    }
}
