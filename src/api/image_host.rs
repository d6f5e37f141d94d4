//! Re-hosting of images on ImgBB.

use crate::retry::RetryPolicy;
use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const IMGBB_UPLOAD: &str = "https://api.imgbb.com/1/upload";

/// Applied to each upload attempt separately.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// A service that takes the URL of an image, stores a copy and returns the copy's URL.
#[async_trait::async_trait]
pub trait ImageHost: Send + Sync {
    /// Makes a single attempt. Retrying is up to the caller.
    async fn upload(&self, image_url: &str) -> Result<String>;
}

/// The ImgBB upload API.
pub struct ImgBb {
    api_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for ImgBb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImgBb").finish_non_exhaustive()
    }
}

impl ImgBb {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .build()
            .context("Unable to create the HTTP client for ImgBB")?;
        Ok(Self {
            api_key: api_key.into(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[async_trait::async_trait]
impl ImageHost for ImgBb {
    async fn upload(&self, image_url: &str) -> Result<String> {
        debug!("Uploading {image_url} to ImgBB");
        let response = self
            .http
            .post(IMGBB_UPLOAD)
            .form(&[("key", self.api_key.as_str()), ("image", image_url)])
            .send()
            .await
            .context("Failed to send the upload request to ImgBB")?
            .error_for_status()
            .context("ImgBB rejected the upload")?;
        let parsed: UploadResponse = response
            .json()
            .await
            .context("Failed to parse the ImgBB upload response")?;
        Ok(parsed.data.url)
    }
}

/// Stands in when no image host is configured. Every upload fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImageHost;

#[async_trait::async_trait]
impl ImageHost for NoImageHost {
    async fn upload(&self, _image_url: &str) -> Result<String> {
        anyhow::bail!("Image uploads are not configured, set IMGBB_API_KEY")
    }
}

/// An `ImageHost` that never leaves the process. It fails the first `failures` attempts, then
/// returns `https://i.ibb.co/test/<file name>` for each upload.
#[derive(Debug, Default)]
pub struct TestImageHost {
    failures: usize,
    attempts: AtomicUsize,
}

impl TestImageHost {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageHost for TestImageHost {
    async fn upload(&self, image_url: &str) -> Result<String> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            anyhow::bail!("Test upload failure {}", attempt + 1);
        }
        let name = image_url.rsplit('/').next().unwrap_or_default();
        let name = name.split('?').next().unwrap_or_default();
        Ok(format!("https://i.ibb.co/test/{name}"))
    }
}

/// Uploads `image_url` under `policy`. `None` means every attempt failed.
pub async fn upload_image(
    host: &dyn ImageHost,
    policy: &RetryPolicy,
    image_url: &str,
) -> Option<String> {
    let link = policy
        .run("uploading image", || host.upload(image_url))
        .await
        .ok()?;
    info!("Uploaded image to ImgBB: {link}");
    Some(link)
}
