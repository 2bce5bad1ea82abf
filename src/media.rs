use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::MediaConfig;

/// Client for the external image host. Posts reference hosted images by URL
/// only; upload takes the raw client-provided image value (a data URI or a
/// URL) and returns the hosted URL.
#[async_trait]
pub trait MediaClient: Send + Sync {
    async fn upload(&self, image: &str) -> anyhow::Result<String>;
    async fn delete(&self, url: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpMedia {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpMedia {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

/// The hosted URL's last path segment, minus the file extension, identifies
/// the asset on the media host.
pub fn public_id(url: &str) -> Option<&str> {
    let last = url.rsplit('/').next()?;
    let id = last.split('.').next().unwrap_or(last);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[async_trait]
impl MediaClient for HttpMedia {
    async fn upload(&self, image: &str) -> anyhow::Result<String> {
        let resp = self
            .http
            .post(format!("{}/upload", self.base_url))
            .json(&serde_json::json!({ "file": image, "api_key": self.api_key }))
            .send()
            .await
            .context("media upload request")?
            .error_for_status()
            .context("media upload rejected")?
            .json::<UploadResponse>()
            .await
            .context("media upload response")?;
        debug!(url = %resp.url, "image uploaded");
        Ok(resp.url)
    }

    async fn delete(&self, url: &str) -> anyhow::Result<()> {
        let id = public_id(url).context("media url has no asset id")?;
        self.http
            .post(format!("{}/destroy", self.base_url))
            .json(&serde_json::json!({ "public_id": id, "api_key": self.api_key }))
            .send()
            .await
            .context("media destroy request")?
            .error_for_status()
            .context("media destroy rejected")?;
        debug!(public_id = %id, "image deleted");
        Ok(())
    }
}

/// Delete a previously hosted image, ignoring empty/absent references.
/// Issues exactly one delete call when a URL is present.
pub async fn delete_hosted_image(
    media: &dyn MediaClient,
    url: Option<&str>,
) -> anyhow::Result<()> {
    match url {
        Some(u) if !u.is_empty() => media.delete(u).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every call instead of talking to a host.
    #[derive(Default)]
    pub struct RecordingMedia {
        pub uploads: Mutex<Vec<String>>,
        pub deletes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaClient for RecordingMedia {
        async fn upload(&self, image: &str) -> anyhow::Result<String> {
            self.uploads.lock().unwrap().push(image.to_string());
            Ok(format!("https://media.test/{}.jpg", uuid::Uuid::new_v4()))
        }

        async fn delete(&self, url: &str) -> anyhow::Result<()> {
            self.deletes.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMedia;
    use super::*;

    #[test]
    fn public_id_strips_path_and_extension() {
        assert_eq!(
            public_id("https://media.test/abc/def/xyz123.jpg"),
            Some("xyz123")
        );
        assert_eq!(public_id("https://media.test/plain"), Some("plain"));
        assert_eq!(public_id("https://media.test/"), None);
    }

    #[tokio::test]
    async fn delete_hosted_image_calls_once_for_present_url() {
        let media = RecordingMedia::default();
        delete_hosted_image(&media, Some("https://media.test/a.jpg"))
            .await
            .unwrap();
        assert_eq!(media.deletes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_hosted_image_skips_empty_and_absent() {
        let media = RecordingMedia::default();
        delete_hosted_image(&media, None).await.unwrap();
        delete_hosted_image(&media, Some("")).await.unwrap();
        assert!(media.deletes.lock().unwrap().is_empty());
    }
}
