//! Frame enhancement for the second-chance recognition attempt.
//!
//! The unenhanced frame is always tried first; over-processing text that the
//! engine would already read correctly tends to degrade it. When the plain
//! attempt yields nothing useful, `enhance` produces a normalized binary
//! image for the multi-config retry.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::bilateral_filter;

/// Clip limit for local contrast equalization. Kept mild: an aggressive
/// limit amplifies sensor noise and hurts recognition on this workload.
const CLAHE_CLIP_LIMIT: f32 = 1.5;

/// Tile grid used for local contrast equalization (8x8 tiles).
const CLAHE_GRID: u32 = 8;

/// Bilateral filter window and sigmas. A small window smooths sensor noise
/// while keeping glyph edges intact.
const BILATERAL_WINDOW: u32 = 5;
const BILATERAL_SIGMA: f32 = 50.0;

/// Radius of the local window used for adaptive thresholding (11x11 block).
/// Uneven lighting across a hand-held capture defeats a single global
/// threshold.
const THRESHOLD_BLOCK_RADIUS: u32 = 5;

/// Moderate upscale factor for the retry attempt. Larger factors introduce
/// interpolation blur that reads as noise to the engine.
const UPSCALE_FACTOR: f32 = 1.5;

/// Normalizes a raw frame into a binary image more legible to the
/// recognition engine.
///
/// Pipeline: grayscale reduction, clip-limited local contrast equalization,
/// edge-preserving smoothing, adaptive threshold. Deterministic and total:
/// inputs too small for the local windows fall back to plain grayscale.
pub fn enhance(frame: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(frame);

    // The tile grid and filter windows need a minimum of real image behind
    // them; degrade to plain grayscale rather than abort.
    if gray.width() < 2 * CLAHE_GRID || gray.height() < 2 * CLAHE_GRID {
        return gray;
    }

    let equalized = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_GRID);
    let smoothed = bilateral_filter(&equalized, BILATERAL_WINDOW, BILATERAL_SIGMA, BILATERAL_SIGMA);
    adaptive_threshold(&smoothed, THRESHOLD_BLOCK_RADIUS)
}

/// Upscales a grayscale image by the fixed retry factor using Catmull-Rom
/// interpolation.
pub fn upscale(img: &GrayImage) -> GrayImage {
    let width = (img.width() as f32 * UPSCALE_FACTOR) as u32;
    let height = (img.height() as f32 * UPSCALE_FACTOR) as u32;
    imageops::resize(img, width.max(1), height.max(1), FilterType::CatmullRom)
}

/// Contrast-limited adaptive histogram equalization over a `grid` x `grid`
/// tile layout.
///
/// Each tile gets its own clipped-histogram equalization mapping; output
/// pixels interpolate bilinearly between the mappings of the four nearest
/// tile centers, which avoids visible tile seams.
fn clahe(img: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let tile_w = width.div_ceil(grid).max(1);
    let tile_h = height.div_ceil(grid).max(1);

    // Rounding the tile size up can leave the last grid row/column empty;
    // only tiles with pixels behind them get a mapping.
    let tiles_x = width.div_ceil(tile_w).min(grid);
    let tiles_y = height.div_ceil(tile_h).min(grid);

    // Per-tile lookup tables.
    let mut luts = vec![[0u8; 256]; (grid * grid) as usize];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            let pixels = ((x1 - x0) * (y1 - y0)) as u32;
            let clip = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);

            // Clip the histogram and redistribute the excess uniformly.
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }

            let mut cdf = 0u32;
            let lut = &mut luts[(ty * grid + tx) as usize];
            for (value, &count) in hist.iter().enumerate() {
                cdf += count;
                lut[value] = ((cdf as u64 * 255) / pixels.max(1) as u64) as u8;
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    let last_x = (tiles_x - 1) as f32;
    let last_y = (tiles_y - 1) as f32;

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = pixel[0] as usize;

        // Position in tile-center coordinates.
        let fx = (x as f32 / tile_w as f32 - 0.5).clamp(0.0, last_x);
        let fy = (y as f32 / tile_h as f32 - 0.5).clamp(0.0, last_y);
        let tx0 = fx.floor() as u32;
        let ty0 = fy.floor() as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wx = fx - tx0 as f32;
        let wy = fy - ty0 as f32;

        let sample = |tx: u32, ty: u32| luts[(ty * grid + tx) as usize][value] as f32;
        let top = sample(tx0, ty0) * (1.0 - wx) + sample(tx1, ty0) * wx;
        let bottom = sample(tx0, ty1) * (1.0 - wx) + sample(tx1, ty1) * wx;
        let mapped = top * (1.0 - wy) + bottom * wy;

        out.put_pixel(x, y, image::Luma([mapped.round().clamp(0.0, 255.0) as u8]));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x + y) % 256) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_enhance_preserves_dimensions() {
        let frame = gradient_frame(64, 48);
        let out = enhance(&frame);
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn test_enhance_output_is_binary() {
        let frame = gradient_frame(64, 64);
        let out = enhance(&frame);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_enhance_is_deterministic() {
        let frame = gradient_frame(48, 48);
        assert_eq!(enhance(&frame).as_raw(), enhance(&frame).as_raw());
    }

    #[test]
    fn test_enhance_degrades_on_tiny_input() {
        // Too small for the tile grid: falls back to plain grayscale
        // instead of failing.
        let frame = gradient_frame(4, 4);
        let out = enhance(&frame);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.as_raw(), imageops::grayscale(&frame).as_raw());
    }

    #[test]
    fn test_upscale_factor() {
        let img = GrayImage::new(100, 80);
        let out = upscale(&img);
        assert_eq!(out.dimensions(), (150, 120));
    }

    #[test]
    fn test_clahe_flat_image_stays_flat() {
        let img = GrayImage::from_pixel(64, 64, image::Luma([128]));
        let out = clahe(&img, CLAHE_CLIP_LIMIT, CLAHE_GRID);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }
}
