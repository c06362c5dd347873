//! Separator-Line Detector: find thick, dark horizontal rules in a bitmap.
//!
//! Row-wise mean brightness over the grayscale image; rows below the
//! darkness cutoff are grouped into maximal runs (tolerating small gaps from
//! anti-aliasing), and each run at least `min_thickness` rows tall emits its
//! midpoint y. The strict variant additionally requires the run's darkest
//! row below a second threshold, rejecting rows that are merely dense with
//! text. Deterministic and purely functional; an empty result means "no
//! constraint" and callers fall back to fixed-distance heuristics.
//!
//! Scope is deliberately narrow: near-black rules on a near-white page.

use crate::config::SeparatorConfig;
use image::DynamicImage;

/// Maximum number of consecutive bright rows bridged inside one dark run.
const MAX_ROW_GAP: u32 = 3;

/// Detect horizontal separator rules; returns ascending midpoint y values.
pub fn detect_separator_lines(img: &DynamicImage, cfg: &SeparatorConfig) -> Vec<u32> {
    let means = row_means(img);
    runs_from_means(&means, cfg)
}

/// Mean brightness (0–255) per pixel row.
fn row_means(img: &DynamicImage) -> Vec<f32> {
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    (0..h)
        .map(|y| {
            let sum: u64 = (0..w).map(|x| gray.get_pixel(x, y).0[0] as u64).sum();
            sum as f32 / w as f32
        })
        .collect()
}

fn runs_from_means(means: &[f32], cfg: &SeparatorConfig) -> Vec<u32> {
    let mut lines = Vec::new();
    let mut run_start: Option<u32> = None;
    let mut run_end = 0u32;
    let mut gap = 0u32;

    let mut flush = |start: Option<u32>, end: u32, lines: &mut Vec<u32>| {
        let Some(start) = start else { return };
        let height = end - start + 1;
        if height < cfg.min_thickness {
            return;
        }
        if let Some(strict) = cfg.strict_min_brightness {
            let darkest = means[start as usize..=end as usize]
                .iter()
                .fold(f32::MAX, |a, &b| a.min(b));
            if darkest >= strict {
                return;
            }
        }
        lines.push(start + height / 2);
    };

    for (y, &mean) in means.iter().enumerate() {
        let y = y as u32;
        if mean < cfg.darkness_cutoff {
            if run_start.is_none() {
                run_start = Some(y);
            }
            run_end = y;
            gap = 0;
        } else if run_start.is_some() {
            gap += 1;
            if gap > MAX_ROW_GAP {
                flush(run_start.take(), run_end, &mut lines);
                gap = 0;
            }
        }
    }
    flush(run_start, run_end, &mut lines);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// White image with solid black horizontal bands at the given (y, height).
    fn banded(width: u32, height: u32, bands: &[(u32, u32)]) -> DynamicImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
        for &(y0, h) in bands {
            for y in y0..y0 + h {
                for x in 0..width {
                    img.put_pixel(x, y, Luma([0u8]));
                }
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    fn cfg(min_thickness: u32) -> SeparatorConfig {
        SeparatorConfig {
            min_thickness,
            darkness_cutoff: 96.0,
            strict_min_brightness: None,
        }
    }

    #[test]
    fn single_band_yields_midpoint() {
        let img = banded(50, 100, &[(40, 6)]);
        assert_eq!(detect_separator_lines(&img, &cfg(3)), vec![43]);
    }

    #[test]
    fn band_below_min_thickness_yields_nothing() {
        let img = banded(50, 100, &[(40, 2)]);
        assert!(detect_separator_lines(&img, &cfg(3)).is_empty());
    }

    #[test]
    fn multiple_bands_ascend() {
        let img = banded(50, 200, &[(20, 4), (90, 4), (150, 4)]);
        assert_eq!(detect_separator_lines(&img, &cfg(3)), vec![22, 92, 152]);
    }

    #[test]
    fn small_gap_bridged_into_one_run() {
        // 3 dark rows, 2 bright rows, 3 dark rows: one run of height 8.
        let img = banded(50, 100, &[(40, 3), (45, 3)]);
        let lines = detect_separator_lines(&img, &cfg(6));
        assert_eq!(lines, vec![44]);
    }

    #[test]
    fn large_gap_splits_runs() {
        let img = banded(50, 100, &[(40, 3), (50, 3)]);
        let lines = detect_separator_lines(&img, &cfg(3));
        assert_eq!(lines, vec![41, 51]);
    }

    #[test]
    fn strict_variant_rejects_grayish_rows() {
        // A band of mid-gray rows: passes the 96 cutoff? No — mean 80 < 96
        // counts as dark, but the strict minimum of 48 rejects it.
        let mut img = GrayImage::from_pixel(50, 100, Luma([255u8]));
        for y in 40..46 {
            for x in 0..50 {
                img.put_pixel(x, y, Luma([80u8]));
            }
        }
        let img = DynamicImage::ImageLuma8(img);
        let strict = SeparatorConfig {
            min_thickness: 3,
            darkness_cutoff: 96.0,
            strict_min_brightness: Some(48.0),
        };
        assert!(detect_separator_lines(&img, &strict).is_empty());
        assert_eq!(detect_separator_lines(&img, &cfg(3)), vec![43]);
    }

    #[test]
    fn blank_page_yields_no_constraint() {
        let img = banded(50, 100, &[]);
        assert!(detect_separator_lines(&img, &cfg(3)).is_empty());
    }
}
