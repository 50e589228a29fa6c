use image::{DynamicImage, GrayImage, ImageBuffer, ImageError, Luma};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] ImageError),
    #[error("No decoder for this image format: {0}")]
    Unsupported(String),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Load a photo, rectify it and return PNG bytes ready for OCR.
pub fn prepare_for_ocr(path: &Path) -> Result<Vec<u8>, PreprocessError> {
    let img = image::open(path).map_err(classify)?;
    encode_as_png(rectify(img))
}

pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data).map_err(classify)?;
    encode_as_png(rectify(img))
}

fn classify(err: ImageError) -> PreprocessError {
    match err {
        ImageError::Unsupported(e) => PreprocessError::Unsupported(e.to_string()),
        other => PreprocessError::Load(other),
    }
}

/// Grayscale, then contrast stretch, then a 3×3 median filter.
pub fn rectify(img: DynamicImage) -> DynamicImage {
    let gray = autocontrast(img.to_luma8());
    DynamicImage::ImageLuma8(median3x3(&gray))
}

/// Stretch pixel values so the darkest becomes 0 and the brightest 255.
pub fn autocontrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px <= min_px {
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

/// Median of each pixel's 3×3 neighbourhood, clamping at the borders.
pub fn median3x3(gray: &GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    ImageBuffer::from_fn(w, h, |x, y| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                window[i] = gray.get_pixel(nx, ny)[0];
                i += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
