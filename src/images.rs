//! Per-duty cropped PNG generation for strike-list documents.
//!
//! For every duty number found on strike-list pages, crop that duty's row
//! out of the rendered page and write it as `<duty>.png` with a 0–23 hour
//! ruler composited above the crop. Row bounds come from the strict
//! separator detector; when no separator lines exist the crop falls back to
//! a fixed half-height around the duty number.
//!
//! Per-duty failures never abort the batch: they are collected into the
//! [`ImageBatchReport`] and the run continues with the remaining duties.

use crate::config::TemplateConfig;
use crate::error::{DutyImageError, TurnusError};
use crate::pipeline::extract::DocumentSource;
use crate::pipeline::markers::is_duty_number;
use crate::pipeline::separators::detect_separator_lines;
use image::{imageops, Rgba, RgbaImage};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Height of the hour-ruler strip composited above each crop, in pixels.
const RULER_HEIGHT: u32 = 18;
/// Minimum usable crop height; anything thinner is a degenerate region.
const MIN_CROP_HEIGHT: u32 = 6;

/// Outcome of one image batch: counts plus every per-duty failure.
#[derive(Debug, Default)]
pub struct ImageBatchReport {
    /// Files written this run.
    pub generated: usize,
    /// Files already present and left untouched (no `force`).
    pub skipped: usize,
    /// Per-duty failures; the batch continued past each of them.
    pub errors: Vec<DutyImageError>,
}

/// Generate one cropped PNG per duty number found in a strike-list document.
///
/// Existing files are skipped unless `force` is set. Fatal conditions
/// (unreadable document, output directory not creatable) return `Err`;
/// everything per-duty lands in the report instead.
pub fn generate_duty_images(
    source: &dyn DocumentSource,
    config: &TemplateConfig,
    out_dir: &Path,
    force: bool,
) -> Result<ImageBatchReport, TurnusError> {
    std::fs::create_dir_all(out_dir).map_err(|e| TurnusError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let mut report = ImageBatchReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for page in 0..source.page_count() {
        let tokens = source.page_tokens(page)?;
        let duties: Vec<_> = tokens
            .iter()
            .filter(|t| is_duty_number(t, config))
            .collect();
        if duties.is_empty() {
            continue;
        }

        let img = source.render_page(page)?;
        let (_, page_h) = source.page_size(page)?;
        let px_per_point = img.height() as f32 / page_h;
        let separators = detect_separator_lines(&img, &config.crop_separators);
        debug!(
            page,
            duties = duties.len(),
            separators = separators.len(),
            "cropping duty rows"
        );

        let rgba = img.to_rgba8();
        for duty in duties {
            if !seen.insert(duty.text.clone()) {
                continue;
            }

            let path = out_dir.join(format!("{}.png", sanitize_filename(&duty.text)));
            if path.exists() && !force {
                report.skipped += 1;
                continue;
            }

            let duty_px = duty.cy() * px_per_point;
            let fallback = config.row_fallback_px * px_per_point;
            let (top, bottom) = row_crop_bounds(duty_px, &separators, fallback, img.height());
            if bottom.saturating_sub(top) < MIN_CROP_HEIGHT {
                report.errors.push(DutyImageError::BadCropRegion {
                    duty: duty.text.clone(),
                    detail: format!("rows {top}..{bottom} on page {page}"),
                });
                continue;
            }

            let crop = imageops::crop_imm(&rgba, 0, top, rgba.width(), bottom - top).to_image();
            let framed = compose_with_ruler(&crop);
            if let Err(e) = framed.save(&path) {
                warn!(duty = %duty.text, error = %e, "duty image write failed");
                report.errors.push(DutyImageError::WriteFailed {
                    duty: duty.text.clone(),
                    path: path.clone(),
                    detail: e.to_string(),
                });
                continue;
            }
            report.generated += 1;
        }
    }

    info!(
        generated = report.generated,
        skipped = report.skipped,
        errored = report.errors.len(),
        "duty image batch done"
    );
    Ok(report)
}

/// Vertical crop bounds for the row containing `duty_px`: the enclosing
/// pair of separator lines, falling back to a fixed half-height on any side
/// without a line.
fn row_crop_bounds(duty_px: f32, separators: &[u32], fallback: f32, img_h: u32) -> (u32, u32) {
    let above = separators
        .iter()
        .map(|&y| y as f32)
        .filter(|&y| y <= duty_px)
        .fold(f32::NEG_INFINITY, f32::max);
    let below = separators
        .iter()
        .map(|&y| y as f32)
        .filter(|&y| y > duty_px)
        .fold(f32::INFINITY, f32::min);

    let top = if above.is_finite() { above } else { duty_px - fallback };
    let bottom = if below.is_finite() { below } else { duty_px + fallback };

    (
        top.max(0.0) as u32,
        (bottom.min(img_h as f32) as u32).min(img_h),
    )
}

/// Replace every non-alphanumeric character so the duty text is safe as a
/// filename on all platforms.
fn sanitize_filename(duty: &str) -> String {
    duty.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ── Hour ruler ───────────────────────────────────────────────────────────

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// 3×5 digit glyphs, one row byte per scanline, low 3 bits used.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

fn draw_digit(img: &mut RgbaImage, digit: usize, x0: u32, y0: u32) {
    for (row, bits) in DIGITS[digit].iter().enumerate() {
        for col in 0..3u32 {
            if bits & (0b100 >> col) != 0 {
                let (x, y) = (x0 + col, y0 + row as u32);
                if x < img.width() && y < img.height() {
                    img.put_pixel(x, y, BLACK);
                }
            }
        }
    }
}

/// Build the 0–23 hour ruler strip: tick marks at each hour across the full
/// width, with the hour number beside each tick.
fn build_ruler(width: u32) -> RgbaImage {
    let mut ruler = RgbaImage::from_pixel(width, RULER_HEIGHT, WHITE);
    let step = width as f32 / 24.0;
    for hour in 0..24u32 {
        let x = (hour as f32 * step) as u32;
        for y in RULER_HEIGHT.saturating_sub(6)..RULER_HEIGHT {
            if x < width {
                ruler.put_pixel(x, y, BLACK);
            }
        }
        let tens = hour / 10;
        let ones = hour % 10;
        let mut dx = x + 2;
        if tens > 0 {
            draw_digit(&mut ruler, tens as usize, dx, 2);
            dx += 4;
        }
        draw_digit(&mut ruler, ones as usize, dx, 2);
    }
    ruler
}

/// Stack the hour ruler above the row crop.
fn compose_with_ruler(crop: &RgbaImage) -> RgbaImage {
    let ruler = build_ruler(crop.width());
    let mut out = RgbaImage::from_pixel(crop.width(), RULER_HEIGHT + crop.height(), WHITE);
    imageops::replace(&mut out, &ruler, 0, 0);
    imageops::replace(&mut out, crop, 0, RULER_HEIGHT as i64);
    out
}
