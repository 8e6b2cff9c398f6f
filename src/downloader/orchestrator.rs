// Acquisition engine - turns a chosen variant into a local artifact
//
// Single attempt, no retry: a failed fetch is reported to the user, who can
// resend the link.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::errors::AcquisitionError;
use super::models::{Artifact, FetchParams, RequesterId};
use super::traits::{FetchJob, MediaFetcher};

pub struct Downloader {
    backend: Arc<dyn MediaFetcher>,
    staging_dir: PathBuf,
}

impl Downloader {
    pub fn new(backend: Arc<dyn MediaFetcher>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &std::path::Path {
        &self.staging_dir
    }

    /// Output template namespaced by requester so concurrent users never collide
    pub fn output_template(&self, requester: RequesterId) -> String {
        self.staging_dir
            .join(format!("{}_%(title)s.%(ext)s", requester))
            .to_string_lossy()
            .into_owned()
    }

    /// Fetch `url` with `params` into the staging directory
    pub async fn acquire(
        &self,
        url: &str,
        params: FetchParams,
        requester: RequesterId,
    ) -> Result<Artifact, AcquisitionError> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(AcquisitionError::Staging)?;

        let job = FetchJob {
            url: url.to_string(),
            params,
            output_template: self.output_template(requester),
        };

        info!(%requester, backend = self.backend.name(), ?params, "Acquiring media");
        match self.backend.fetch(&job).await {
            Ok(path) => Ok(Artifact::new(path, params.kind())),
            Err(e) => {
                self.remove_leftovers(requester).await;
                Err(e)
            }
        }
    }

    /// Delete intermediate streams a failed fetch left under the requester's prefix.
    ///
    /// A second download running for the same requester shares the prefix and
    /// loses its files too; it then fails and reports to that user.
    async fn remove_leftovers(&self, requester: RequesterId) {
        let prefix = format!("{}_", requester);
        let mut entries = match tokio::fs::read_dir(&self.staging_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Could not list staging dir for cleanup");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            if !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => debug!(path = %entry.path().display(), "Removed leftover file"),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove leftover file"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::MediaKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Writes a file where yt-dlp would, recording the job it got
    struct FakeFetcher {
        jobs: Mutex<Vec<FetchJob>>,
    }

    #[async_trait]
    impl MediaFetcher for FakeFetcher {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch(&self, job: &FetchJob) -> Result<PathBuf, AcquisitionError> {
            self.jobs.lock().push(job.clone());
            let ext = match job.params {
                FetchParams::Audio => "mp3",
                FetchParams::Video { .. } => "mp4",
            };
            let path = PathBuf::from(
                job.output_template
                    .replace("%(title)s", "Clip")
                    .replace("%(ext)s", ext),
            );
            tokio::fs::write(&path, b"data").await.unwrap();
            Ok(path)
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl MediaFetcher for FailingFetcher {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _job: &FetchJob) -> Result<PathBuf, AcquisitionError> {
            Err(AcquisitionError::Failed("ERROR: merge failed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_acquire_creates_staging_dir() {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("downloads");
        let fetcher = Arc::new(FakeFetcher { jobs: Mutex::new(Vec::new()) });
        let downloader = Downloader::new(fetcher.clone(), &staging);

        let artifact = downloader
            .acquire("https://youtu.be/a", FetchParams::Video { max_height: 480 }, RequesterId(42))
            .await
            .unwrap();

        assert!(staging.is_dir());
        assert_eq!(artifact.kind(), MediaKind::Video);
        assert_eq!(artifact.path(), staging.join("42_Clip.mp4"));

        let jobs = fetcher.jobs.lock();
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].output_template.ends_with("42_%(title)s.%(ext)s"));
    }

    #[tokio::test]
    async fn test_audio_artifact_kind() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher { jobs: Mutex::new(Vec::new()) });
        let downloader = Downloader::new(fetcher, root.path());

        let artifact = downloader
            .acquire("https://youtu.be/a", FetchParams::Audio, RequesterId(1))
            .await
            .unwrap();
        assert_eq!(artifact.kind(), MediaKind::Audio);
        assert_eq!(artifact.path().extension().unwrap(), "mp3");
    }

    #[test]
    fn test_templates_differ_per_requester() {
        let downloader = Downloader::new(Arc::new(FailingFetcher), "downloads");
        assert_ne!(
            downloader.output_template(RequesterId(1)),
            downloader.output_template(RequesterId(2))
        );
    }

    /// Leaves per-format streams behind and then fails, like an aborted merge
    struct AbandoningFetcher;

    #[async_trait]
    impl MediaFetcher for AbandoningFetcher {
        fn name(&self) -> &'static str {
            "abandoning"
        }

        async fn fetch(&self, job: &FetchJob) -> Result<PathBuf, AcquisitionError> {
            for ext in ["f137.mp4", "f140.m4a"] {
                let path = job
                    .output_template
                    .replace("%(title)s", "Clip")
                    .replace("%(ext)s", ext);
                tokio::fs::write(&path, b"partial").await.unwrap();
            }
            Err(AcquisitionError::Failed("ERROR: Postprocessing: merge failed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_removes_requester_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let other_user = root.path().join("2_Other.mp4");
        tokio::fs::write(&other_user, b"keep").await.unwrap();

        let downloader = Downloader::new(Arc::new(AbandoningFetcher), root.path());
        let err = downloader
            .acquire("https://youtu.be/a", FetchParams::Video { max_height: 1080 }, RequesterId(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Failed(_)));

        assert!(!root.path().join("7_Clip.f137.mp4").exists());
        assert!(!root.path().join("7_Clip.f140.m4a").exists());
        assert!(other_user.exists());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let root = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(Arc::new(FailingFetcher), root.path());
        let err = downloader
            .acquire("https://youtu.be/a", FetchParams::Audio, RequesterId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Failed(_)));
    }
}
