//! Deterministic preprocessing of a scanned document into a form the
//! recognition engine copes with: grayscale, contrast equalization,
//! deskew, adaptive binarization, ruling-line suppression, despeckle.
//! Every step is a pure transformation of the image buffer.

use image::{GrayImage, Luma};
use imageproc::contrast::{adaptive_threshold, equalize_histogram};
use imageproc::distance_transform::Norm;
use imageproc::filter::median_filter;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::geometry::min_area_rect;
use imageproc::morphology::open;
use imageproc::point::Point;

/// Pixels at or below this intensity count as foreground (ink) when
/// estimating page skew on the equalized grayscale image.
const DESKEW_FOREGROUND_MAX: u8 = 64;

/// Local window radius for adaptive thresholding; large enough to ride
/// out lighting gradients across a photographed page.
const THRESHOLD_BLOCK_RADIUS: u32 = 25;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Run the full normalization chain over raw image bytes.
///
/// Fails fast if the bytes cannot be decoded as an image; a decodable
/// but blank page is not an error and passes through unrotated.
pub fn normalize(blob: &[u8]) -> Result<GrayImage, NormalizeError> {
    let decoded = image::load_from_memory(blob)?;
    let gray = decoded.to_luma8();
    let equalized = equalize_histogram(&gray);
    let deskewed = deskew(&equalized);
    let binary = adaptive_threshold(&deskewed, THRESHOLD_BLOCK_RADIUS);
    Ok(despeckle(&binary))
}

/// Estimate the page rotation from the minimum-area rectangle around
/// foreground pixels and rotate the image to cancel it. Returns the
/// input untouched when there is no foreground or no measurable skew.
pub fn deskew(image: &GrayImage) -> GrayImage {
    let angle = match deskew_angle(image) {
        Some(angle) if angle.abs() > f64::EPSILON => angle,
        _ => return image.clone(),
    };

    tracing::debug!(angle_degrees = angle, "correcting page skew");
    rotate_about_center(
        image,
        (-angle).to_radians() as f32,
        Interpolation::Bilinear,
        Luma([255u8]),
    )
}

/// Angle, in degrees, of the minimum-area bounding rectangle of the
/// foreground. `None` when the page has no foreground pixels at all.
pub fn deskew_angle(image: &GrayImage) -> Option<f64> {
    let points: Vec<Point<i32>> = image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel.0[0] <= DESKEW_FOREGROUND_MAX)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();

    if points.is_empty() {
        return None;
    }

    let corners = min_area_rect(&points);
    Some(normalize_angle(longest_edge_angle(&corners)))
}

/// Angle of the longer rectangle edge, in degrees.
fn longest_edge_angle(corners: &[Point<i32>; 4]) -> f64 {
    let edge_a = (corners[1].x - corners[0].x, corners[1].y - corners[0].y);
    let edge_b = (corners[2].x - corners[1].x, corners[2].y - corners[1].y);

    let len_a = (edge_a.0 as f64).hypot(edge_a.1 as f64);
    let len_b = (edge_b.0 as f64).hypot(edge_b.1 as f64);

    let (dx, dy) = if len_a >= len_b { edge_a } else { edge_b };
    (dy as f64).atan2(dx as f64).to_degrees()
}

/// Fold an arbitrary rectangle angle into (-45, 45]: rotations beyond
/// 45 degrees are expressed as the complementary rotation instead.
fn normalize_angle(mut degrees: f64) -> f64 {
    while degrees > 45.0 {
        degrees -= 90.0;
    }
    while degrees <= -45.0 {
        degrees += 90.0;
    }
    degrees
}

/// Suppress thin ruling lines with a morphological opening, then remove
/// the speckle noise binarization leaves behind with a median filter.
/// Operates with ink as the bright phase, then restores dark-on-light
/// polarity for the recognizer.
fn despeckle(binary: &GrayImage) -> GrayImage {
    let mut inverted = binary.clone();
    image::imageops::invert(&mut inverted);

    let opened = open(&inverted, Norm::LInf, 1);
    let mut filtered = median_filter(&opened, 1, 1);

    image::imageops::invert(&mut filtered);
    filtered
}
