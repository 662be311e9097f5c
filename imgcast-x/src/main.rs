//! imgcast-x - Post one image from a directory to X

use std::path::PathBuf;

use clap::Parser;
use libimgcast::credentials::XCredentials;
use libimgcast::logging::LoggingConfig;
use libimgcast::media::{list_media_files, MediaFilter};
use libimgcast::platforms::x::XClient;
use libimgcast::platforms::validate_caption;
use libimgcast::prompt::{caption_from, select_image, write_json};
use libimgcast::{pack_file, Config, CredentialStore, PackedImage, Result};
use serde::Serialize;

const PLATFORM: &str = "X";

#[derive(Parser, Debug)]
#[command(name = "imgcast-x")]
#[command(version)]
#[command(about = "Post an image from a directory to X")]
#[command(long_about = "\
imgcast-x - Post an image from a directory to X

DESCRIPTION:
    Lists the images in the media directory, lets you pick one and asks
    for a caption, then uploads the image and tweets it. Requests are
    signed with OAuth 1.0a user credentials.

    Without a terminal on stdin the first image is used and the caption is
    read from stdin, unless --image and --caption are given.

USAGE:
    # Interactive
    imgcast-x

    # Scripted
    imgcast-x --image 2 --caption \"Golden hour\"

CREDENTIALS:
    X_CONSUMER_KEY, X_CONSUMER_SECRET, X_ACCESS_TOKEN and X_ACCESS_SECRET,
    read from the .env file or the environment.

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
    tweet_id: String,
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
    validate_caption(PLATFORM, &caption, config.x.max_chars)?;

    let image = pack_file(&chosen, &config.x.packing)?;
    tracing::info!(
        "Packed {} ({}, {} bytes)",
        chosen.display(),
        image.stage(),
        image.len()
    );

    let env_file = cli.env_file.unwrap_or_else(|| config.env_file());
    let store = CredentialStore::load(&env_file)?;
    let credentials = XCredentials::from_store(&store)?;
    let client = XClient::new(&config.x, credentials)?;

    if cli.format == "text" {
        println!("\n--- Posting to X ---");
    }
    let tweet_id = client.post_image(&caption, &image).await?;

    if cli.format == "text" {
        println!("Successfully posted to X: {}", tweet_id);
    } else {
        write_json(&mut std::io::stdout(), &report(chosen, &image, tweet_id))?;
    }

    Ok(())
}

fn report(path: PathBuf, image: &PackedImage, tweet_id: String) -> PostReport {
    PostReport {
        platform: "x",
        path,
        stage: image.stage().to_string(),
        bytes: image.len(),
        width: image.width(),
        height: image.height(),
        tweet_id,
    }
}
