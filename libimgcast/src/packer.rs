//! Adaptive image packing
//!
//! Turns a decoded image into a JPEG buffer that fits a platform's upload
//! size limit, applying the least aggressive transformation that works:
//!
//! 1. encode as-is at the baseline quality,
//! 2. downscale so the longer side fits the dimension cap,
//! 3. step the JPEG quality down until the buffer fits or the floor is hit.
//!
//! # Examples
//!
//! ```no_run
//! use libimgcast::packer::{pack_file, PackOptions};
//!
//! # fn example() -> Result<(), libimgcast::error::PackError> {
//! let packed = pack_file("media/sunset.png".as_ref(), &PackOptions::default())?;
//! println!("{} bytes at quality {}", packed.len(), packed.quality());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::PackError;

/// Bluesky's per-image upload limit
pub const DEFAULT_SIZE_BUDGET: usize = 1_000_000;

/// Longest side allowed before a mandatory downscale
pub const DEFAULT_DIMENSION_CAP: u32 = 2000;

pub const BASELINE_QUALITY: u8 = 85;
pub const QUALITY_STEP: u8 = 5;
pub const MIN_QUALITY: u8 = 10;

/// Limits and quality ladder used by [`pack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Maximum encoded size in bytes
    pub size_budget: usize,
    /// Maximum length of the longer side, applied only when over budget
    pub dimension_cap: u32,
    /// JPEG quality for the first encode and after downscaling
    pub baseline_quality: u8,
    /// Quality decrement per compression attempt
    pub quality_step: u8,
    /// Lowest quality the compression loop will try
    pub min_quality: u8,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            size_budget: DEFAULT_SIZE_BUDGET,
            dimension_cap: DEFAULT_DIMENSION_CAP,
            baseline_quality: BASELINE_QUALITY,
            quality_step: QUALITY_STEP,
            min_quality: MIN_QUALITY,
        }
    }
}

impl PackOptions {
    pub fn new(size_budget: usize, dimension_cap: u32) -> Self {
        Self {
            size_budget,
            dimension_cap,
            ..Default::default()
        }
    }

    /// Qualities tried by the compression loop, highest first.
    ///
    /// Starts one step below the baseline and always ends exactly on the
    /// floor, even when the floor is not a multiple of the step.
    pub fn quality_ladder(&self) -> Vec<u8> {
        let step = self.quality_step.max(1);
        let floor = self.floor();

        let mut ladder = Vec::new();
        let mut quality = self.baseline_quality;
        while quality > floor {
            quality = quality.saturating_sub(step).max(floor);
            ladder.push(quality);
        }
        ladder
    }

    fn floor(&self) -> u8 {
        self.min_quality.clamp(1, self.baseline_quality.max(1))
    }
}

/// How far the packer had to go to meet the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackStage {
    /// Baseline encode already fit
    Original,
    /// Downscaled to the dimension cap, baseline quality
    Downscaled,
    /// Quality reduced (possibly after downscaling)
    Compressed,
}

impl fmt::Display for PackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStage::Original => write!(f, "original"),
            PackStage::Downscaled => write!(f, "downscaled"),
            PackStage::Compressed => write!(f, "compressed"),
        }
    }
}

/// An encoded JPEG ready for upload
#[derive(Clone, PartialEq, Eq)]
pub struct PackedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    quality: u8,
    stage: PackStage,
}

impl PackedImage {
    fn new(bytes: Vec<u8>, image: &RgbImage, quality: u8, stage: PackStage) -> Self {
        Self {
            bytes,
            width: image.width(),
            height: image.height(),
            quality,
            stage,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn stage(&self) -> PackStage {
        self.stage
    }

    /// Packed images are always JPEG
    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

impl fmt::Debug for PackedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedImage")
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("quality", &self.quality)
            .field("stage", &self.stage)
            .finish()
    }
}

/// Dimensions after scaling the longer side down to `cap`.
///
/// Returns `None` when no downscale is needed. The shorter side is
/// truncated, so 3000×2000 with a cap of 2000 becomes 2000×1333.
pub fn fit_within_cap(width: u32, height: u32, cap: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if cap == 0 || longer <= cap {
        return None;
    }

    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(cap) / u64::from(longer);
        scaled.max(1) as u32
    };

    Some((scale(width), scale(height)))
}

pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PackError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(image)?;
    Ok(buffer)
}

fn into_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

/// Pack a decoded image into a JPEG that fits `options.size_budget`.
///
/// # Errors
///
/// Returns [`PackError::BudgetUnreachable`] when even the quality floor
/// produces a buffer over budget, and [`PackError::Encode`] if the JPEG
/// encoder fails.
pub fn pack(image: DynamicImage, options: &PackOptions) -> Result<PackedImage, PackError> {
    let mut rgb = into_rgb(image);
    let budget = options.size_budget;

    let baseline = encode_jpeg(&rgb, options.baseline_quality)?;
    if baseline.len() <= budget {
        debug!(
            "Baseline encode fits: {} bytes ({}x{})",
            baseline.len(),
            rgb.width(),
            rgb.height()
        );
        return Ok(PackedImage::new(
            baseline,
            &rgb,
            options.baseline_quality,
            PackStage::Original,
        ));
    }

    let mut current = baseline;
    if let Some((width, height)) = fit_within_cap(rgb.width(), rgb.height(), options.dimension_cap)
    {
        debug!(
            "Downscaling {}x{} to {}x{}",
            rgb.width(),
            rgb.height(),
            width,
            height
        );
        rgb = imageops::resize(&rgb, width, height, FilterType::Lanczos3);
        current = encode_jpeg(&rgb, options.baseline_quality)?;

        if current.len() <= budget {
            return Ok(PackedImage::new(
                current,
                &rgb,
                options.baseline_quality,
                PackStage::Downscaled,
            ));
        }
    }

    compress(&rgb, current, options)
}

/// Step quality down until the buffer fits, keeping the smallest result so
/// the size never grows between attempts.
fn compress(
    rgb: &RgbImage,
    start: Vec<u8>,
    options: &PackOptions,
) -> Result<PackedImage, PackError> {
    let budget = options.size_budget;
    let mut best = start;
    let mut best_quality = options.baseline_quality;

    for quality in options.quality_ladder() {
        let candidate = encode_jpeg(rgb, quality)?;
        trace!("Quality {}: {} bytes", quality, candidate.len());

        if candidate.len() <= best.len() {
            best = candidate;
            best_quality = quality;
        }

        if best.len() <= budget {
            return Ok(PackedImage::new(
                best,
                rgb,
                best_quality,
                PackStage::Compressed,
            ));
        }
    }

    Err(PackError::BudgetUnreachable {
        size: best.len(),
        budget,
        quality: options.floor(),
    })
}

/// Decode an image file and pack it.
///
/// The format is sniffed from the file content, so a mislabeled extension
/// still decodes.
pub fn pack_file(path: &Path, options: &PackOptions) -> Result<PackedImage, PackError> {
    if !path.is_file() {
        return Err(PackError::NotFound(path.to_path_buf()));
    }

    let io_error = |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    };

    let image = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?
        .decode()
        .map_err(|source| PackError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    pack(image, options)
}

/// A successfully packed file
#[derive(Debug)]
pub struct PackedFile {
    pub path: PathBuf,
    pub image: PackedImage,
}

/// A file that was left out of a batch
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: PackError,
}

/// One file's outcome in a batch
#[derive(Debug)]
pub enum BatchEntry {
    Packed(PackedFile),
    Skipped(SkippedFile),
}

/// Result of [`pack_batch`], in the order the files were processed
#[derive(Debug, Default)]
pub struct PackedBatch {
    entries: Vec<BatchEntry>,
}

impl PackedBatch {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn packed(&self) -> impl Iterator<Item = &PackedFile> {
        self.entries.iter().filter_map(|entry| match entry {
            BatchEntry::Packed(file) => Some(file),
            BatchEntry::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedFile> {
        self.entries.iter().filter_map(|entry| match entry {
            BatchEntry::Skipped(file) => Some(file),
            BatchEntry::Packed(_) => None,
        })
    }

    pub fn packed_count(&self) -> usize {
        self.packed().count()
    }

    pub fn images(&self) -> impl Iterator<Item = &PackedImage> {
        self.packed().map(|file| &file.image)
    }

    pub fn is_empty(&self) -> bool {
        self.packed_count() == 0
    }
}

/// Pack files in order until `limit` images are packed.
///
/// Missing or undecodable files are logged and recorded as
/// [`BatchEntry::Skipped`]; they never abort the batch and do not count
/// toward the limit.
pub fn pack_batch<P: AsRef<Path>>(paths: &[P], options: &PackOptions, limit: usize) -> PackedBatch {
    let mut entries = Vec::new();
    let mut packed = 0;

    for path in paths {
        if packed >= limit {
            break;
        }

        let path = path.as_ref();
        match pack_file(path, options) {
            Ok(image) => {
                info!(
                    "Loaded {} image: {}, size: {} bytes",
                    image.stage(),
                    path.display(),
                    image.len()
                );
                packed += 1;
                entries.push(BatchEntry::Packed(PackedFile {
                    path: path.to_path_buf(),
                    image,
                }));
            }
            Err(error) => {
                warn!("Error processing image {}: {}", path.display(), error);
                entries.push(BatchEntry::Skipped(SkippedFile {
                    path: path.to_path_buf(),
                    error,
                }));
            }
        }
    }

    PackedBatch { entries }
}
