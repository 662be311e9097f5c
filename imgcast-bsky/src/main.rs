//! imgcast-bsky - Post every image in a directory to Bluesky

use std::path::PathBuf;

use clap::Parser;
use libimgcast::credentials::BlueskyCredentials;
use libimgcast::logging::LoggingConfig;
use libimgcast::media::{list_media_files, MediaFilter};
use libimgcast::packer::{BatchEntry, PackedBatch};
use libimgcast::platforms::bluesky::BlueskyClient;
use libimgcast::prompt::{caption_from, write_json};
use libimgcast::{pack_batch, Config, CredentialStore, ImgcastError, Result};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "imgcast-bsky")]
#[command(version)]
#[command(about = "Post the images in a directory to Bluesky")]
#[command(long_about = "\
imgcast-bsky - Post the images in a directory to Bluesky

DESCRIPTION:
    Collects the JPEG, PNG and GIF files in the media directory, shrinks each
    one until it fits Bluesky's 1 MB blob limit and posts up to four of
    them with a caption.

    Images that cannot be read are skipped with a message.

USAGE:
    # Caption as an argument
    imgcast-bsky \"Weekend at the coast\"

    # Caption from stdin
    echo \"Weekend at the coast\" | imgcast-bsky

    # See what would be uploaded without posting
    imgcast-bsky --dry-run \"Weekend at the coast\"

CREDENTIALS:
    BLUESKY_USERNAME and BLUESKY_PASSWORD (an app password), read from
    the .env file or the environment.

EXIT CODES:
    0 - Posted, or nothing to post
    1 - Posting or processing error
    2 - Authentication error
    3 - Invalid input (caption too long, no usable images)
")]
struct Cli {
    /// Caption for the post (reads from stdin if not provided)
    caption: Option<String>,

    /// Directory to read images from
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Credentials file
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pack and report the images without posting
    #[arg(long)]
    dry_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ImageReport {
    path: PathBuf,
    stage: String,
    bytes: usize,
    width: u32,
    height: u32,
    quality: u8,
}

#[derive(Debug, Serialize)]
struct SkippedReport {
    path: PathBuf,
    error: String,
}

#[derive(Debug, Serialize)]
struct PostReport {
    platform: &'static str,
    dry_run: bool,
    images: Vec<ImageReport>,
    skipped: Vec<SkippedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<String>,
}

impl PostReport {
    fn new(batch: &PackedBatch, dry_run: bool) -> Self {
        Self {
            platform: "bluesky",
            dry_run,
            images: batch
                .packed()
                .map(|file| ImageReport {
                    path: file.path.clone(),
                    stage: file.image.stage().to_string(),
                    bytes: file.image.len(),
                    width: file.image.width(),
                    height: file.image.height(),
                    quality: file.image.quality(),
                })
                .collect(),
            skipped: batch
                .skipped()
                .map(|file| SkippedReport {
                    path: file.path.clone(),
                    error: file.error.to_string(),
                })
                .collect(),
            uri: None,
            cid: None,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default_location(cli.config.as_deref())?;
    let media_dir = cli.dir.clone().unwrap_or_else(|| config.media_dir());
    let text = cli.format == "text";

    let files = list_media_files(&media_dir, &MediaFilter::bluesky())?;
    if files.is_empty() {
        println!(
            "No images found in directory '{}'. Exiting.",
            media_dir.display()
        );
        return Ok(());
    }

    let caption = caption_from(
        "Bluesky",
        cli.caption,
        atty::is(atty::Stream::Stdin),
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?;
    let Some(caption) = caption else {
        println!("No caption entered. Exiting.");
        return Ok(());
    };

    let mut client = BlueskyClient::new(&config.bluesky).await?;
    client.validate(&caption, 0)?;

    let batch = pack_batch(&files, &config.bluesky.packing, config.bluesky.max_images);
    if text {
        for entry in batch.entries() {
            match entry {
                BatchEntry::Packed(file) => println!(
                    "Loaded {} image: {}, size: {} bytes",
                    file.image.stage(),
                    file.path.display(),
                    file.image.len()
                ),
                BatchEntry::Skipped(file) => println!(
                    "Error processing image {}: {}",
                    file.path.display(),
                    file.error
                ),
            }
        }
        println!("Loaded {} images.", batch.packed_count());
    }

    if batch.is_empty() {
        return Err(ImgcastError::InvalidInput(format!(
            "None of the {} images in '{}' could be processed",
            files.len(),
            media_dir.display()
        )));
    }

    let mut report = PostReport::new(&batch, cli.dry_run);

    if !cli.dry_run {
        let env_file = cli.env_file.unwrap_or_else(|| config.env_file());
        let store = CredentialStore::load(&env_file)?;
        let credentials = BlueskyCredentials::from_store(&store)?;

        client.login(&credentials).await?;
        let images: Vec<_> = batch.images().collect();
        let post = client.send_images(&caption, &images).await?;

        report.uri = Some(post.uri);
        report.cid = Some(post.cid);
    }

    if text {
        match &report.uri {
            Some(uri) => println!("Posted to Bluesky: {}", uri),
            None => println!("Dry run: nothing was posted."),
        }
    } else {
        write_json(&mut std::io::stdout(), &report)?;
    }

    Ok(())
}
