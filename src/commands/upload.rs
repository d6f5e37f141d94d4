use crate::api::upload_image;
use crate::commands::{App, Out};
use crate::Result;
use anyhow::bail;

/// Re-hosts the image at `url` on ImgBB, retrying under the app's retry policy.
pub async fn upload(app: &App, url: &str) -> Result<Out<String>> {
    match upload_image(app.images(), app.retry(), url).await {
        Some(link) => Ok(Out::new(format!("ImgBB Link: {link}"), link)),
        None => bail!("Failed to upload to ImgBB. Please try again."),
    }
}
