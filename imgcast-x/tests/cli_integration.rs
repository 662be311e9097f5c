//! CLI integration tests for imgcast-x

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const X_KEYS: [&str; 4] = [
    "X_CONSUMER_KEY",
    "X_CONSUMER_SECRET",
    "X_ACCESS_TOKEN",
    "X_ACCESS_SECRET",
];

/// Command isolated from the user's config and environment credentials
fn imgcast_x(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("imgcast-x").unwrap();
    cmd.env("IMGCAST_CONFIG", temp.path().join("config.toml"))
        .env_remove("RUST_LOG");
    for key in X_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn media_with(temp: &TempDir, count: usize) -> PathBuf {
    let dir = temp.path().join("media");
    fs::create_dir_all(&dir).unwrap();
    for i in 1..=count {
        RgbImage::from_pixel(10, 10, Rgb([30, 60, 90]))
            .save(dir.join(format!("{}.png", i)))
            .unwrap();
    }
    dir
}

fn write_env(temp: &TempDir, content: &str) -> PathBuf {
    let path = temp.path().join(".env");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_flag_output() {
    Command::cargo_bin("imgcast-x")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Post an image from a directory to X"))
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("--caption"));
}

#[test]
fn test_empty_directory_exits_cleanly() {
    let temp = TempDir::new().unwrap();
    let dir = media_with(&temp, 0);

    imgcast_x(&temp)
        .arg("--dir")
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No images found in directory"));
}

#[test]
fn test_caption_over_280_characters() {
    let temp = TempDir::new().unwrap();
    let dir = media_with(&temp, 1);

    imgcast_x(&temp)
        .arg("--dir")
        .arg(&dir)
        .arg("--caption")
        .arg("é".repeat(281))
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("280 character limit"));
}

#[test]
fn test_incomplete_credentials_file() {
    let temp = TempDir::new().unwrap();
    let dir = media_with(&temp, 2);
    let env = write_env(&temp, "X_CONSUMER_KEY=ck\nX_CONSUMER_SECRET=\n");

    imgcast_x(&temp)
        .arg("--dir")
        .arg(&dir)
        .arg("--env-file")
        .arg(&env)
        .args(["--image", "2", "--caption", "Hello"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("X_CONSUMER_SECRET"));
}

#[test]
fn test_unreachable_api_is_a_posting_failure() {
    let temp = TempDir::new().unwrap();
    let dir = media_with(&temp, 1);
    let env = write_env(
        &temp,
        "X_CONSUMER_KEY=ck\nX_CONSUMER_SECRET=cs\nX_ACCESS_TOKEN=at\nX_ACCESS_SECRET=as\n",
    );
    fs::write(
        temp.path().join("config.toml"),
        "[x]\nupload_url = \"http://127.0.0.1:9/1.1\"\napi_url = \"http://127.0.0.1:9/1.1\"\n",
    )
    .unwrap();

    imgcast_x(&temp)
        .arg("--dir")
        .arg(&dir)
        .arg("--env-file")
        .arg(&env)
        .write_stdin("Hello from stdin\n")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("--- Posting to X ---"))
        .stderr(predicate::str::contains("Network error"));
}
