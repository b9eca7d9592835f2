//! Photo loading and preprocessing for the scalp-condition classifier.
//!
//! Uploaded photos live in an external upload store with a fixed naming
//! convention: the file is named after the survey id. Preprocessing
//! normalizes any input to the tensor shape the frozen CNN expects.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use mane_core::{Error, Result};
use ndarray::Array4;

/// Input edge length the frozen CNN was trained on.
pub const IMAGE_SIZE: u32 = 224;

/// Deterministic upload path for a survey's photo.
pub fn survey_image_path(uploads_dir: &Path, survey_id: i64) -> PathBuf {
    uploads_dir.join(format!("{}.jpg", survey_id))
}

/// Load and preprocess the photo for a survey, or `None` when no photo
/// was uploaded.
pub fn load_survey_image(uploads_dir: &Path, survey_id: i64) -> Result<Option<Array4<f32>>> {
    let path = survey_image_path(uploads_dir, survey_id);
    if !path.exists() {
        return Ok(None);
    }
    let img = image::open(&path).map_err(|e| Error::Image(e.to_string()))?;
    Ok(Some(preprocess_image(&img)))
}

/// Normalize to a 224x224 RGB float tensor scaled to `[0, 1]`, NCHW
/// layout `[1, 3, 224, 224]`.
pub fn preprocess_image(img: &DynamicImage) -> Array4<f32> {
    let resized = img.resize_exact(IMAGE_SIZE, IMAGE_SIZE, image::imageops::FilterType::Lanczos3);
    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for y in 0..height {
        for x in 0..width {
            let pixel = rgb.get_pixel(x, y);
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
    }
    tensor
}
