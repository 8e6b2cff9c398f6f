// CLI metadata source - queries the native `yt-dlp` binary
//
// Runs `yt-dlp --dump-json` and turns the `formats` array into
// stream descriptors. Nothing is downloaded here.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::traits::{ExtractorConfig, MetadataSource};
use crate::downloader::errors::ResolutionError;
use crate::downloader::models::{ProbeResult, StreamDescriptor};
use crate::downloader::utils::{network_args, run_output, RunError};

/// The parts of `--dump-json` output the relay reads
#[derive(Debug, Deserialize)]
struct DumpJson {
    title: Option<String>,
    formats: Option<Vec<StreamDescriptor>>,
}

/// yt-dlp binary backed metadata source
pub struct CliInfoExtractor {
    ytdlp_path: String,
    config: ExtractorConfig,
}

impl CliInfoExtractor {
    pub fn new(ytdlp_path: impl Into<String>, config: ExtractorConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            config,
        }
    }

    /// Build command arguments
    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(network_args(&self.config));
        args.push(url.to_string());
        args
    }

    /// Parse `--dump-json` output
    pub(crate) fn parse_json(stdout: &[u8]) -> Result<ProbeResult, ResolutionError> {
        let dump: DumpJson = serde_json::from_slice(stdout)
            .map_err(|e| ResolutionError::Parse(format!("Invalid JSON: {}", e)))?;

        let descriptors = dump.formats.unwrap_or_default();
        if descriptors.is_empty() {
            return Err(ResolutionError::NoDescriptors);
        }

        Ok(ProbeResult {
            title: dump.title.unwrap_or_else(|| "Untitled".to_string()),
            descriptors,
        })
    }
}

#[async_trait]
impl MetadataSource for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<ProbeResult, ResolutionError> {
        let args = self.build_args(url);
        debug!(program = %self.ytdlp_path, args = %args.join(" "), "Querying metadata");

        let output = run_output(&self.ytdlp_path, &args)
            .await
            .map_err(|e| match e {
                RunError::Spawn(err) => {
                    ResolutionError::ToolNotFound(format!("{}: {}", self.ytdlp_path, err))
                }
                other => ResolutionError::Probe(other.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url, status = ?output.status.code(), "yt-dlp metadata query failed");
            return Err(ResolutionError::from_stderr(&stderr));
        }

        let probe = Self::parse_json(&output.stdout)?;
        debug!(
            title = %probe.title,
            formats = probe.descriptors.len(),
            "Metadata parsed"
        );
        Ok(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc",
        "title": "Sample clip",
        "formats": [
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3000000},
            {"format_id": "134", "ext": "mp4", "height": 360, "vcodec": "avc1.4d401e", "acodec": "none", "filesize_approx": 10485760.0},
            {"format_id": "136", "ext": "mp4", "height": 720, "vcodec": "avc1.4d401f", "acodec": "none", "filesize": null}
        ]
    }"#;

    #[test]
    fn test_parse_json() {
        let probe = CliInfoExtractor::parse_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(probe.title, "Sample clip");
        assert_eq!(probe.descriptors.len(), 3);

        let audio = &probe.descriptors[0];
        assert_eq!(audio.height, None);
        assert!(!audio.has_video());
        assert_eq!(audio.filesize, Some(3_000_000));

        let low = &probe.descriptors[1];
        assert_eq!(low.height, Some(360));
        assert_eq!(low.effective_size(), Some(10_485_760));

        let high = &probe.descriptors[2];
        assert_eq!(high.filesize, None);
        assert_eq!(high.effective_size(), None);
    }

    #[test]
    fn test_parse_json_tolerates_sparse_formats() {
        let json = br#"{
            "formats": [
                {"vcodec": "avc1", "height": 480, "filesize": "unknown", "filesize_approx": 2048.7},
                {"format_id": "sb0", "ext": "mhtml", "vcodec": null, "height": null}
            ]
        }"#;
        let probe = CliInfoExtractor::parse_json(json).unwrap();
        assert_eq!(probe.title, "Untitled");

        let first = &probe.descriptors[0];
        assert_eq!(first.format_id, "");
        assert_eq!(first.filesize, None);
        assert_eq!(first.effective_size(), Some(2048));
        assert!(first.has_video());

        let storyboard = &probe.descriptors[1];
        assert_eq!(storyboard.height, None);
        assert!(!storyboard.has_video());
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        let err = CliInfoExtractor::parse_json(b"not json").unwrap_err();
        assert!(matches!(err, ResolutionError::Parse(_)));
    }

    #[test]
    fn test_parse_json_without_formats() {
        let err = CliInfoExtractor::parse_json(br#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::NoDescriptors));

        let err = CliInfoExtractor::parse_json(br#"{"title": "x", "formats": []}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::NoDescriptors));
    }

    #[test]
    fn test_build_args() {
        let config = ExtractorConfig::default().with_cookies_path(Some("/tmp/c.txt".to_string()));
        let extractor = CliInfoExtractor::new("yt-dlp", config);
        let args = extractor.build_args("https://youtu.be/abc");
        assert_eq!(args.first().map(String::as_str), Some("--dump-json"));
        assert!(args.windows(2).any(|w| w[0] == "--cookies" && w[1] == "/tmp/c.txt"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[tokio::test]
    async fn test_probe_missing_binary() {
        let extractor = CliInfoExtractor::new("no-such-yt-dlp-binary", ExtractorConfig::default());
        let err = extractor.probe("https://youtu.be/abc").await.unwrap_err();
        assert!(matches!(err, ResolutionError::ToolNotFound(_)));
    }
}
