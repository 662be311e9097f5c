//! imgcast-ig - Post one image from a directory to Instagram

use std::path::{Path, PathBuf};

use clap::Parser;
use libimgcast::credentials::InstagramCredentials;
use libimgcast::logging::LoggingConfig;
use libimgcast::media::{list_media_files, MediaFilter};
use libimgcast::platforms::instagram::InstagramClient;
use libimgcast::platforms::validate_caption;
use libimgcast::prompt::{caption_from, select_image, write_json};
use libimgcast::{pack_file, Config, CredentialStore, PackedImage, Result};
use serde::Serialize;

const PLATFORM: &str = "Instagram";

#[derive(Parser, Debug)]
#[command(name = "imgcast-ig")]
#[command(version)]
#[command(about = "Post an image from a directory to Instagram")]
#[command(long_about = "\
imgcast-ig - Post an image from a directory to Instagram

DESCRIPTION:
    Lists the images in the media directory, lets you pick one and asks
    for a caption, then posts it through the Instagram Content Publishing
    API (create a media container, then publish it).

    Without a terminal on stdin the first image is used and the caption is
    read from stdin, unless --image and --caption are given.

USAGE:
    # Interactive
    imgcast-ig

    # Scripted
    imgcast-ig --image 2 --caption \"Golden hour\"

CREDENTIALS:
    INSTAGRAM_ACCESS_TOKEN and INSTAGRAM_USER_ID, read from the .env file
    or the environment.

EXIT CODES:
    0 - Posted, or nothing to post
    1 - Posting or processing error
    2 - Authentication error
    3 - Invalid input (bad image number, caption too long)
")]
struct Cli {
    /// Number of the image to post (1-based, as listed)
    #[arg(short, long, value_name = "N")]
    image: Option<usize>,

    /// Caption for the post
    #[arg(short, long, value_name = "TEXT")]
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

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct PostReport {
    platform: &'static str,
    path: PathBuf,
    stage: String,
    bytes: usize,
    width: u32,
    height: u32,
    media_id: String,
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
    let interactive = atty::is(atty::Stream::Stdin);

    let files = list_media_files(&media_dir, &MediaFilter::all_images())?;
    if files.is_empty() {
        println!(
            "No images found in directory '{}'. Exiting.",
            media_dir.display()
        );
        return Ok(());
    }

    let (chosen, caption) = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        let chosen = select_image(&files, cli.image, interactive, &mut input, &mut output)?;
        let caption = caption_from(PLATFORM, cli.caption, interactive, &mut input, &mut output)?;
        (chosen, caption)
    };

    let Some(caption) = caption else {
        println!("No caption entered. Exiting.");
        return Ok(());
    };
    validate_caption(PLATFORM, &caption, config.instagram.max_chars)?;

    let image = pack_file(&chosen, &config.instagram.packing)?;
    tracing::info!(
        "Packed {} ({}, {} bytes)",
        chosen.display(),
        image.stage(),
        image.len()
    );

    let env_file = cli.env_file.unwrap_or_else(|| config.env_file());
    let store = CredentialStore::load(&env_file)?;
    let credentials = InstagramCredentials::from_store(&store)?;
    let client = InstagramClient::new(&config.instagram, credentials)?;

    if cli.format == "text" {
        println!("\n--- Posting to Instagram ---");
    }
    let media_id = client
        .post_image(&caption, &image, &upload_name(&chosen))
        .await?;

    if cli.format == "text" {
        println!("Successfully posted to Instagram: {}", media_id);
    } else {
        write_json(&mut std::io::stdout(), &report(chosen, &image, media_id))?;
    }

    Ok(())
}

/// The packer always produces JPEG, so the upload name says so
fn upload_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{}.jpg", stem)
}

fn report(path: PathBuf, image: &PackedImage, media_id: String) -> PostReport {
    PostReport {
        platform: "instagram",
        path,
        stage: image.stage().to_string(),
        bytes: image.len(),
        width: image.width(),
        height: image.height(),
        media_id,
    }
}
