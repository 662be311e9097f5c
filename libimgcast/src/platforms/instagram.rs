//! Instagram platform implementation
//!
//! Content Publishing API: create a media container carrying the image and
//! caption, then publish the container.
//!
//! Direct file upload to the container endpoint may need extra app
//! permissions; when it is refused the Graph API answers with a 4xx and the
//! body is surfaced in the error.

use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::InstagramConfig;
use crate::credentials::InstagramCredentials;
use crate::error::{PlatformError, Result};
use crate::packer::PackedImage;
use crate::platforms::{http_client, map_transport_error, read_json, validate_caption};

const PLATFORM: &str = "Instagram";

#[derive(Deserialize)]
struct IdResponse {
    id: Option<String>,
}

#[derive(Debug)]
pub struct InstagramClient {
    http: reqwest::Client,
    graph_url: String,
    max_chars: usize,
    credentials: InstagramCredentials,
}

impl InstagramClient {
    pub fn new(config: &InstagramConfig, credentials: InstagramCredentials) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            graph_url: config.graph_url.trim_end_matches('/').to_string(),
            max_chars: config.max_chars,
            credentials,
        })
    }

    fn endpoint(&self, edge: &str) -> String {
        format!("{}/{}/{}", self.graph_url, self.credentials.user_id, edge)
    }

    pub fn validate_caption(&self, caption: &str) -> Result<()> {
        validate_caption(PLATFORM, caption, self.max_chars)
    }

    /// Create a media container and return its creation id
    pub async fn create_container(
        &self,
        caption: &str,
        image: &PackedImage,
        file_name: &str,
    ) -> Result<String> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str(image.mime_type())
            .map_err(|e| PlatformError::Posting(format!("Invalid media type: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("caption", caption.to_string())
            .text(
                "access_token",
                self.credentials.access_token.expose_secret().to_string(),
            );

        let response = self
            .http
            .post(self.endpoint("media"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_transport_error(PLATFORM, "container", e))?;

        let container: IdResponse = read_json(PLATFORM, "container", response).await?;
        container.id.ok_or_else(|| {
            PlatformError::Posting(
                "Could not retrieve creation_id from container response.".to_string(),
            )
            .into()
        })
    }

    /// Publish a container, returning the media id of the new post
    pub async fn publish(&self, creation_id: &str) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint("media_publish"))
            .form(&[
                ("creation_id", creation_id),
                ("access_token", self.credentials.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(PLATFORM, "publish", e))?;

        let published: IdResponse = read_json(PLATFORM, "publish", response).await?;
        published.id.ok_or_else(|| {
            PlatformError::Posting("Could not retrieve media id from publish response.".to_string())
                .into()
        })
    }

    /// Create and publish in one go
    pub async fn post_image(
        &self,
        caption: &str,
        image: &PackedImage,
        file_name: &str,
    ) -> Result<String> {
        self.validate_caption(caption)?;

        let creation_id = self.create_container(caption, image, file_name).await?;
        tracing::debug!("Created Instagram container {}", creation_id);

        let media_id = self.publish(&creation_id).await?;
        tracing::info!("Successfully posted to Instagram: {}", media_id);

        Ok(media_id)
    }
}
