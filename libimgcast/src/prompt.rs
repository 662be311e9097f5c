//! Interactive image selection and caption entry
//!
//! Generic over the reader and writer so the binaries can pass stdin/stdout
//! and tests can pass in-memory buffers.

use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ImgcastError, Result};

/// Resolve the image to post: `--image N`, a prompt when interactive, or
/// the first file after listing them.
pub fn select_image<R: BufRead, W: Write>(
    files: &[PathBuf],
    number: Option<usize>,
    interactive: bool,
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf> {
    if let Some(number) = number {
        return image_by_number(files, number).cloned().ok_or_else(|| {
            ImgcastError::InvalidInput(format!(
                "Image number {} is out of range (found {} images)",
                number,
                files.len()
            ))
        });
    }

    let chosen = if interactive {
        choose_image(files, input, output)?
    } else {
        list_images(files, output)?;
        files.first().cloned()
    };

    chosen.ok_or_else(|| ImgcastError::InvalidInput("No image selected".to_string()))
}

/// Resolve the caption: the argument, a prompt when interactive, or all of
/// `input`. Trimmed; `None` when nothing is left.
pub fn caption_from<R: BufRead, W: Write>(
    platform: &str,
    arg: Option<String>,
    interactive: bool,
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    let caption = match arg {
        Some(caption) => caption,
        None if interactive => return Ok(read_caption(platform, input, output)?),
        None => {
            let mut buffer = String::new();
            input.read_to_string(&mut buffer)?;
            buffer
        }
    };

    let caption = caption.trim();
    Ok((!caption.is_empty()).then(|| caption.to_string()))
}

/// Write `value` as pretty JSON followed by a newline
pub fn write_json<W: Write, T: Serialize>(output: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *output, value)?;
    writeln!(output)?;
    Ok(())
}

/// Let the user pick one of `files` by number.
///
/// One file is chosen without asking. A blank answer picks the first file,
/// as does anything that is not a valid 1-based index (with a notice).
/// Returns `None` only when `files` is empty.
pub fn choose_image<R: BufRead, W: Write>(
    files: &[PathBuf],
    input: &mut R,
    output: &mut W,
) -> std::io::Result<Option<PathBuf>> {
    let Some(first) = files.first() else {
        return Ok(None);
    };

    list_images(files, output)?;

    if files.len() == 1 {
        writeln!(output, "\nOnly one image found. Using: {}", first.display())?;
        return Ok(Some(first.clone()));
    }

    write!(
        output,
        "\nEnter the number of the image you want to post (default=1): "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(Some(select(files, answer.trim(), output)?.to_path_buf()))
}

fn select<'a, W: Write>(files: &'a [PathBuf], answer: &str, output: &mut W) -> std::io::Result<&'a Path> {
    if answer.is_empty() {
        return Ok(files[0].as_path());
    }

    match answer.parse::<usize>() {
        Ok(n) if (1..=files.len()).contains(&n) => Ok(files[n - 1].as_path()),
        _ => {
            writeln!(output, "Invalid choice. Defaulting to the first image.")?;
            Ok(files[0].as_path())
        }
    }
}

/// Print a numbered list of images
pub fn list_images<W: Write>(files: &[PathBuf], output: &mut W) -> std::io::Result<()> {
    writeln!(output, "Images available:")?;
    for (idx, path) in files.iter().enumerate() {
        writeln!(output, "{}. {}", idx + 1, path.display())?;
    }
    Ok(())
}

/// Pick an image by 1-based number without prompting
pub fn image_by_number(files: &[PathBuf], number: usize) -> Option<&PathBuf> {
    number.checked_sub(1).and_then(|idx| files.get(idx))
}

/// Ask for a caption; `None` when the user enters nothing
pub fn read_caption<R: BufRead, W: Write>(
    platform: &str,
    input: &mut R,
    output: &mut W,
) -> std::io::Result<Option<String>> {
    write!(output, "\nEnter a caption for your {} post: ", platform)?;
    output.flush()?;

    let mut caption = String::new();
    input.read_line(&mut caption)?;

    let caption = caption.trim();
    if caption.is_empty() {
        Ok(None)
    } else {
        Ok(Some(caption.to_string()))
    }
}
