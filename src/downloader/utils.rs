// Helper functions shared by extractors and backends

use std::process::Stdio;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;

use super::extractors::ExtractorConfig;

/// Browser-like identification for page requests
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

const BYTES_PER_MB: f64 = 1_048_576.0;

lazy_static! {
    static ref LINK_RE: Regex = Regex::new(r"https?://[^\s<>]+").unwrap();
}

/// Why a child process produced no output
#[derive(Debug, Error)]
pub enum RunError {
    /// Program could not be started (missing binary, permissions)
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    /// Waiting on the child or reading its pipes failed
    #[error("{0}")]
    Io(String),
}

/// Run a command to completion, collecting stdout and stderr.
///
/// There is no deadline: metadata queries and downloads run until the tool
/// exits, bounded only by yt-dlp's own socket timeout.
pub async fn run_output(program: &str, args: &[String]) -> Result<std::process::Output, RunError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(RunError::Spawn)?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| RunError::Io(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| RunError::Io(format!("Failed to capture stderr from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let status = child
        .wait()
        .await
        .map_err(|e| RunError::Io(format!("Failed to wait for {}: {}", program, e)))?;

    let collect = |joined: Result<std::io::Result<Vec<u8>>, tokio::task::JoinError>, name: &str| {
        joined
            .map_err(|e| RunError::Io(format!("{} task failed: {}", name, e)))?
            .map_err(|e| RunError::Io(format!("Failed to read {}: {}", name, e)))
    };
    let stdout = collect(stdout_task.await, "stdout")?;
    let stderr = collect(stderr_task.await, "stderr")?;

    Ok(std::process::Output { status, stdout, stderr })
}

/// yt-dlp arguments for proxy, cookies and socket timeout
pub fn network_args(config: &ExtractorConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(path) = &config.cookies_path {
        args.push("--cookies".to_string());
        args.push(path.clone());
    }

    if let Some(seconds) = config.socket_timeout {
        args.push("--socket-timeout".to_string());
        args.push(seconds.to_string());
    }

    args
}

/// Short, log-friendly view of tool stderr: `ERROR:` lines first, else the last line
pub fn stderr_excerpt(stderr: &str) -> String {
    let important: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:"))
        .take(2)
        .collect();

    if !important.is_empty() {
        return important.join(" | ");
    }

    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .chars()
        .take(200)
        .collect()
}

/// Bytes to whole megabytes, rounded to nearest
pub fn size_in_mb(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_MB).round() as u64
}

/// First http(s) link in a chat message
pub fn find_link(text: &str) -> Option<&str> {
    LINK_RE.find(text).map(|m| m.as_str())
}
