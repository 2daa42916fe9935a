use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{GrayImage, ImageFormat, Luma};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::info;
use vista_core::frame::FrameStack;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["tif", "tiff", "png"];

/// Output encoding for [`save_stack`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameFormat {
    /// 16-bit grayscale TIFF, clamped to [0.0, 1.0].
    #[default]
    Tiff,
    /// 8-bit grayscale PNG, clamped to [0.0, 1.0].
    Png,
    /// 32-bit float grayscale TIFF. Values are written unchanged.
    FloatTiff,
}

impl FrameFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tiff | Self::FloatTiff => "tiff",
            Self::Png => "png",
        }
    }

    /// Whether values outside [0.0, 1.0] survive a save.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::FloatTiff)
    }
}

/// Load a grayscale image file.
///
/// Float TIFFs are read as-is; integer images are scaled to [0.0, 1.0].
pub fn load_image(path: &Path) -> Result<Array2<f32>> {
    if is_tiff(path) {
        if let Some(data) = load_float_tiff(path)? {
            return Ok(data);
        }
    }

    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let mut data = Array2::<f32>::zeros((h as usize, w as usize));

    for row in 0..h as usize {
        for col in 0..w as usize {
            let pixel = gray.get_pixel(col as u32, row as u32);
            data[[row, col]] = pixel.0[0] as f32 / 65535.0;
        }
    }

    Ok(data)
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
}

/// Single-channel 32-bit float TIFF, or `None` for any other sample layout.
fn load_float_tiff(path: &Path) -> Result<Option<Array2<f32>>> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))
        .with_context(|| format!("Failed to read TIFF header of {}", path.display()))?;
    if decoder.colortype()? != tiff::ColorType::Gray(32) {
        return Ok(None);
    }
    let (w, h) = decoder.dimensions()?;
    match decoder.read_image()? {
        DecodingResult::F32(buf) if buf.len() == (w as usize) * (h as usize) => Ok(Some(
            Array2::from_shape_vec((h as usize, w as usize), buf)?,
        )),
        _ => Ok(None),
    }
}

/// Image files in `dir` with a supported extension, sorted by file name.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load `paths` in order as one frame stack. Frame numbers are the file
/// positions; no timestamps are attached.
pub fn load_stack(name: impl Into<String>, paths: &[PathBuf]) -> Result<FrameStack<f32>> {
    let Some(first_path) = paths.first() else {
        bail!("Empty frame sequence");
    };
    let first = load_image(first_path)?;
    let (h, w) = first.dim();

    let mut images = Array3::<f32>::zeros((paths.len(), h, w));
    images.index_axis_mut(Axis(0), 0).assign(&first);

    for (i, path) in paths.iter().enumerate().skip(1) {
        let frame = load_image(path)?;
        if frame.dim() != (h, w) {
            bail!(
                "{} is {:?}, expected {:?} like the first frame",
                path.display(),
                frame.dim(),
                (h, w)
            );
        }
        images.index_axis_mut(Axis(0), i).assign(&frame);
    }

    let frame_numbers = (0..paths.len() as i64).collect();
    let stack = FrameStack::new(name, images, frame_numbers)?;
    info!(stack = %stack, "Frame stack loaded");
    Ok(stack)
}

/// Save a frame as 16-bit grayscale TIFF. Values are clamped to [0.0, 1.0].
pub fn save_tiff(frame: ArrayView2<'_, f32>, path: &Path) -> Result<()> {
    let (h, w) = frame.dim();

    let pixels: Vec<u16> = frame
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .context("frame buffer size mismatch")?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 32-bit float grayscale TIFF without clamping.
pub fn save_float_tiff(frame: ArrayView2<'_, f32>, path: &Path) -> Result<()> {
    let (h, w) = frame.dim();
    let pixels: Vec<f32> = frame.iter().copied().collect();

    let mut file = BufWriter::new(File::create(path)?);
    let mut tiff = TiffEncoder::new(&mut file)?;
    tiff.write_image::<colortype::Gray32Float>(w as u32, h as u32, &pixels)?;
    Ok(())
}

/// Save a frame as 8-bit grayscale PNG. Values are clamped to [0.0, 1.0].
pub fn save_png(frame: ArrayView2<'_, f32>, path: &Path) -> Result<()> {
    let (h, w) = frame.dim();

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), v) in frame.indexed_iter() {
        let val = (v.clamp(0.0, 1.0) * 255.0) as u8;
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Write every frame of `stack` into `dir`, one file per frame named after
/// its position and frame number. Returns the written paths in frame order.
pub fn save_stack(stack: &FrameStack<f32>, dir: &Path, format: FrameFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(stack.len());
    for (i, frame_number) in stack.frame_numbers().iter().enumerate() {
        let path = dir.join(format!(
            "frame_{i:06}_{frame_number}.{}",
            format.extension()
        ));
        let frame = stack.frame(i)?;
        match format {
            FrameFormat::Tiff => save_tiff(frame, &path)?,
            FrameFormat::Png => save_png(frame, &path)?,
            FrameFormat::FloatTiff => save_float_tiff(frame, &path)?,
        }
        written.push(path);
    }

    info!(stack = %stack, dir = %dir.display(), "Frame stack saved");
    Ok(written)
}
