//! X (Twitter) platform implementation
//!
//! Uses the v1.1 media upload and status endpoints with OAuth 1.0a user
//! context: upload the image, then tweet referencing its media id.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::XConfig;
use crate::credentials::XCredentials;
use crate::error::{PlatformError, Result};
use crate::packer::PackedImage;
use crate::platforms::oauth::OAuthSigner;
use crate::platforms::{http_client, map_transport_error, read_json, validate_caption};

const PLATFORM: &str = "X";

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    id_str: Option<String>,
}

#[derive(Debug)]
pub struct XClient {
    http: reqwest::Client,
    upload_url: String,
    api_url: String,
    max_chars: usize,
    signer: OAuthSigner,
}

impl XClient {
    pub fn new(config: &XConfig, credentials: XCredentials) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            max_chars: config.max_chars,
            signer: OAuthSigner::new(credentials),
        })
    }

    pub fn validate_caption(&self, caption: &str) -> Result<()> {
        validate_caption(PLATFORM, caption, self.max_chars)
    }

    /// Upload an image and return its `media_id_string`
    pub async fn upload_media(&self, image: &PackedImage) -> Result<String> {
        let url = format!("{}/media/upload.json", self.upload_url);
        let authorization = self.signer.authorization_header("POST", &url, &[])?;

        let part = Part::bytes(image.bytes().to_vec())
            .file_name("media.jpg")
            .mime_str(image.mime_type())
            .map_err(|e| PlatformError::Posting(format!("Invalid media type: {}", e)))?;

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .multipart(Form::new().part("media", part))
            .send()
            .await
            .map_err(|e| map_transport_error(PLATFORM, "media upload", e))?;

        let uploaded: MediaUploadResponse = read_json(PLATFORM, "media upload", response).await?;
        uploaded.media_id_string.ok_or_else(|| {
            PlatformError::Posting(
                "Could not retrieve media_id_string from upload response.".to_string(),
            )
            .into()
        })
    }

    /// Post a status with an already uploaded media id, returning the tweet id
    pub async fn tweet(&self, caption: &str, media_id: &str) -> Result<String> {
        let url = format!("{}/statuses/update.json", self.api_url);
        let params = [("status", caption), ("media_ids", media_id)];
        let authorization = self.signer.authorization_header("POST", &url, &params)?;

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .form(&params)
            .send()
            .await
            .map_err(|e| map_transport_error(PLATFORM, "tweet", e))?;

        let status: StatusResponse = read_json(PLATFORM, "tweet", response).await?;
        status.id_str.ok_or_else(|| {
            PlatformError::Posting("Could not retrieve id_str from status response.".to_string())
                .into()
        })
    }

    /// Upload then tweet
    pub async fn post_image(&self, caption: &str, image: &PackedImage) -> Result<String> {
        self.validate_caption(caption)?;

        let media_id = self.upload_media(image).await?;
        tracing::debug!("Uploaded media {} to X", media_id);

        let tweet_id = self.tweet(caption, &media_id).await?;
        tracing::info!("Successfully posted to X: {}", tweet_id);

        Ok(tweet_id)
    }
}
