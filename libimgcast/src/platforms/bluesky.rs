//! Bluesky platform implementation
//!
//! Drives a `bsky_sdk` agent pointed at the account's PDS: log in with an
//! app password, upload each packed image as a blob, then create an
//! `app.bsky.feed.post` record that embeds the blobs.

use std::fmt;
use std::num::NonZeroU64;

use bsky_sdk::agent::config::Config as AgentConfig;
use bsky_sdk::api::app::bsky::embed::defs::{AspectRatio, AspectRatioData};
use bsky_sdk::api::app::bsky::embed::images as embed_images;
use bsky_sdk::api::app::bsky::feed::post::{RecordData, RecordEmbedRefs};
use bsky_sdk::api::types::string::Datetime;
use bsky_sdk::api::types::{BlobRef, Union};
use bsky_sdk::BskyAgent;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::BlueskyConfig;
use crate::credentials::BlueskyCredentials;
use crate::error::{ImgcastError, PlatformError, Result};
use crate::packer::PackedImage;
use crate::platforms::{map_http_error, validate_caption};

const PLATFORM: &str = "Bluesky";

/// Status code of an XRPC response error, read from its debug output.
///
/// The agent's error types differ per endpoint and may be boxed, but all of
/// them carry the response as `XrpcError { status: NNN, .. }`.
fn response_status(debug_msg: &str) -> Option<StatusCode> {
    let (_, rest) = debug_msg.split_once("status: ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    StatusCode::from_u16(digits.parse().ok()?).ok()
}

/// Map Bluesky/AT Protocol errors to PlatformError
///
/// Response errors are classified by status like the other platforms;
/// anything without a response (agent setup, transport) falls back to the
/// error text.
fn map_bluesky_error<E: fmt::Display + fmt::Debug>(error: E, context: &str) -> PlatformError {
    let error_msg = error.to_string();
    let debug_msg = format!("{:?}", error);

    if let Some(status) = response_status(&debug_msg) {
        return map_http_error(PLATFORM, context, status, &debug_msg);
    }

    if error_msg.contains("AuthenticationRequired")
        || error_msg.contains("InvalidToken")
        || error_msg.contains("ExpiredToken")
        || error_msg.contains("no session")
    {
        return PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {}",
            context, error_msg
        ));
    }

    if error_msg.contains("connection")
        || error_msg.contains("timeout")
        || error_msg.contains("dns")
        || debug_msg.contains("Connect")
        || debug_msg.contains("Timeout")
    {
        return PlatformError::Network(format!(
            "Could not reach {} during {}: {}",
            PLATFORM, context, error_msg
        ));
    }

    PlatformError::Posting(format!(
        "Bluesky operation failed during {}: {}",
        context, error_msg
    ))
}

/// Reference to a created post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

pub struct BlueskyClient {
    agent: BskyAgent,
    pds_url: String,
    max_images: usize,
    max_chars: usize,
    authenticated: bool,
}

impl fmt::Debug for BlueskyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueskyClient")
            .field("pds_url", &self.pds_url)
            .field("max_images", &self.max_images)
            .field("max_chars", &self.max_chars)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

impl BlueskyClient {
    /// Create a client for the configured PDS. No request is made until login.
    pub async fn new(config: &BlueskyConfig) -> Result<Self> {
        let pds_url = config.pds_url.trim_end_matches('/').to_string();

        let agent = BskyAgent::builder()
            .config(AgentConfig {
                endpoint: pds_url.clone(),
                ..Default::default()
            })
            .build()
            .await
            .map_err(|e| PlatformError::Network(format!("Failed to create Bluesky agent: {}", e)))?;

        Ok(Self {
            agent,
            pds_url,
            max_images: config.max_images,
            max_chars: config.max_chars,
            authenticated: false,
        })
    }

    pub fn pds_url(&self) -> &str {
        &self.pds_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }
        Ok(())
    }

    /// Create a session with the PDS using a handle and app password
    pub async fn login(&mut self, credentials: &BlueskyCredentials) -> Result<()> {
        tracing::debug!("Creating Bluesky session for {}", credentials.identifier);

        let session = self
            .agent
            .login(&credentials.identifier, credentials.password.expose_secret())
            .await
            .map_err(|e| map_bluesky_error(e, "login"))?;

        self.authenticated = true;
        tracing::debug!("Bluesky session created for {}", session.did.as_str());

        Ok(())
    }

    /// Check the caption and image count before any upload happens
    pub fn validate(&self, caption: &str, image_count: usize) -> Result<()> {
        validate_caption(PLATFORM, caption, self.max_chars)?;

        if image_count > self.max_images {
            return Err(ImgcastError::InvalidInput(format!(
                "Bluesky allows at most {} images per post (got {})",
                self.max_images, image_count
            )));
        }

        Ok(())
    }

    /// Upload one image and return the blob reference for embedding
    pub async fn upload_blob(&self, image: &PackedImage) -> Result<BlobRef> {
        self.ensure_authenticated()?;

        let output = self
            .agent
            .api
            .com
            .atproto
            .repo
            .upload_blob(image.bytes().to_vec())
            .await
            .map_err(|e| map_bluesky_error(e, "blob upload"))?;

        Ok(output.data.blob)
    }

    /// Upload the images and publish a post embedding them.
    ///
    /// Images are uploaded one at a time; the first failure aborts the post.
    pub async fn send_images(&self, caption: &str, images: &[&PackedImage]) -> Result<PostRef> {
        self.validate(caption, images.len())?;
        self.ensure_authenticated()?;

        let mut embedded: Vec<embed_images::Image> = Vec::with_capacity(images.len());
        for image in images {
            let blob = self.upload_blob(image).await?;
            tracing::debug!("Uploaded blob of {} bytes", image.len());
            embedded.push(
                embed_images::ImageData {
                    alt: String::new(),
                    aspect_ratio: aspect_ratio(image),
                    image: blob,
                }
                .into(),
            );
        }

        let embed = (!embedded.is_empty()).then(|| {
            Union::Refs(RecordEmbedRefs::AppBskyEmbedImagesMain(Box::new(
                embed_images::MainData { images: embedded }.into(),
            )))
        });

        let record = RecordData {
            created_at: Datetime::now(),
            embed,
            entities: None,
            facets: None,
            labels: None,
            langs: None,
            reply: None,
            tags: None,
            text: caption.to_string(),
        };

        let output = self
            .agent
            .create_record(record)
            .await
            .map_err(|e| map_bluesky_error(e, "post"))?
            .data;

        let post = PostRef {
            uri: output.uri,
            cid: output.cid.as_ref().to_string(),
        };
        tracing::info!("Posted to Bluesky: {}", post.uri);

        Ok(post)
    }
}

fn aspect_ratio(image: &PackedImage) -> Option<AspectRatio> {
    let width = NonZeroU64::new(u64::from(image.width()))?;
    let height = NonZeroU64::new(u64::from(image.height()))?;
    Some(AspectRatioData { width, height }.into())
}
