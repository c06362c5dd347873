//! Row Marker Scanner: continuation and split-day markers on strike lists.
//!
//! A strike list ("strekliste") prints one duty number per row in a narrow
//! left column. Two marker kinds annotate the rows:
//!
//! * a continuation glyph on its own row between two duty rows — the upper
//!   duty feeds into the lower one;
//! * a split-day glyph, printed fused or as two adjacent single glyphs on
//!   the same row as a duty number.
//!
//! Continuation markers pair with the nearest duty number strictly above
//! and strictly below; a marker missing either neighbour yields no pair
//! (not an error). Split-day markers resolve their duty via separator-line
//! row bounds when available, else nearest-by-y within a fixed tolerance.
//! Results are deduplicated across all pages of the document.

use crate::config::TemplateConfig;
use crate::error::TurnusError;
use crate::pipeline::extract::{DocumentSource, PositionedToken};
use crate::pipeline::separators::detect_separator_lines;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Deduplicated scan result for one strike-list document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerScan {
    /// (first, second) duty numbers where the first continues into the second.
    pub pairs: Vec<(String, String)>,
    /// Duty numbers flagged as split days.
    pub split_day: BTreeSet<String>,
}

/// Scan every page of a strike-list document.
pub fn scan_document(
    source: &dyn DocumentSource,
    config: &TemplateConfig,
) -> Result<MarkerScan, TurnusError> {
    let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
    let mut split_day: BTreeSet<String> = BTreeSet::new();

    for page in 0..source.page_count() {
        let tokens = source.page_tokens(page)?;
        let (_, page_h) = source.page_size(page)?;

        // Row bounds only matter when the page carries split-day markers;
        // a failed render degrades to the fixed-tolerance fallback.
        let needs_rows = tokens.iter().any(|t| is_split_glyph(&t.text, config));
        let (row_bounds, px_per_point) = if needs_rows {
            match source.render_page(page) {
                Ok(img) => {
                    let scale = img.height() as f32 / page_h;
                    (
                        detect_separator_lines(&img, &config.row_separators),
                        scale,
                    )
                }
                Err(e) => {
                    warn!(page, error = %e, "render failed, falling back to y-distance pairing");
                    (Vec::new(), 1.0)
                }
            }
        } else {
            (Vec::new(), 1.0)
        };

        let scan = scan_page(&tokens, &row_bounds, px_per_point, config);
        debug!(
            page,
            pairs = scan.pairs.len(),
            split = scan.split_day.len(),
            "page markers scanned"
        );
        pairs.extend(scan.pairs);
        split_day.extend(scan.split_day);
    }

    Ok(MarkerScan {
        pairs: pairs.into_iter().collect(),
        split_day,
    })
}

pub(crate) struct PageScan {
    pub pairs: Vec<(String, String)>,
    pub split_day: Vec<String>,
}

/// One page's marker pass: pure function over tokens + optional row bounds
/// (separator midpoints, rendered-pixel space).
pub(crate) fn scan_page(
    tokens: &[PositionedToken],
    row_bounds: &[u32],
    px_per_point: f32,
    config: &TemplateConfig,
) -> PageScan {
    let duties: Vec<&PositionedToken> = tokens
        .iter()
        .filter(|t| is_duty_number(t, config))
        .collect();

    let mut pairs = Vec::new();
    let mut split_day = Vec::new();

    // Continuation markers: nearest duty strictly above + strictly below.
    for marker in tokens.iter().filter(|t| is_continuation_marker(&t.text, config)) {
        let above = duties
            .iter()
            .filter(|d| d.cy() < marker.cy())
            .min_by(|a, b| (marker.cy() - a.cy()).total_cmp(&(marker.cy() - b.cy())));
        let below = duties
            .iter()
            .filter(|d| d.cy() > marker.cy())
            .min_by(|a, b| (a.cy() - marker.cy()).total_cmp(&(b.cy() - marker.cy())));
        match (above, below) {
            (Some(a), Some(b)) => pairs.push((a.text.clone(), b.text.clone())),
            _ => debug!("continuation marker with no duty numbers in range, skipped"),
        }
    }

    // Split-day markers: fused glyph, or two adjacent singles on one row.
    for marker_cy in split_marker_positions(tokens, config) {
        if let Some(duty) = resolve_row_duty(&duties, marker_cy, row_bounds, px_per_point, config)
        {
            split_day.push(duty);
        }
    }

    PageScan { pairs, split_day }
}

pub(crate) fn is_duty_number(t: &PositionedToken, config: &TemplateConfig) -> bool {
    t.cx() < config.duty_column_max_x
        && t.text.len() >= 2
        && t.text.chars().all(|c| c.is_ascii_digit())
}

fn is_continuation_marker(text: &str, config: &TemplateConfig) -> bool {
    let glyph = config.continuation_glyph.as_str();
    text == glyph || (text.len() <= glyph.len() + 2 && text.contains(glyph))
}

fn is_split_glyph(text: &str, config: &TemplateConfig) -> bool {
    let g = config.split_day_glyph.as_str();
    text == g || text == format!("{g}{g}").as_str()
}

/// y centers of all split-day markers on a page: each fused glyph, plus
/// each pair of single glyphs within the adjacency distance.
fn split_marker_positions(tokens: &[PositionedToken], config: &TemplateConfig) -> Vec<f32> {
    let g = config.split_day_glyph.as_str();
    let fused = format!("{g}{g}");

    let mut positions: Vec<f32> = tokens
        .iter()
        .filter(|t| t.text == fused)
        .map(|t| t.cy())
        .collect();

    let singles: Vec<&PositionedToken> = tokens.iter().filter(|t| t.text == g).collect();
    for (i, a) in singles.iter().enumerate() {
        for b in &singles[i + 1..] {
            if (a.cx() - b.cx()).abs() <= config.split_adjacency_px
                && (a.cy() - b.cy()).abs() <= config.split_adjacency_px
            {
                positions.push((a.cy() + b.cy()) / 2.0);
            }
        }
    }
    positions
}

/// Find the duty number sharing the marker's row. With separator bounds:
/// closest-by-y among duties inside the same row interval. Without: nearest
/// duty within the fixed tolerance.
fn resolve_row_duty(
    duties: &[&PositionedToken],
    marker_cy: f32,
    row_bounds: &[u32],
    px_per_point: f32,
    config: &TemplateConfig,
) -> Option<String> {
    // The distance heuristic applies only when no row bounds exist; with
    // bounds, a marker in a duty-less row resolves to nothing.
    if !row_bounds.is_empty() {
        let marker_px = marker_cy * px_per_point;
        let top = row_bounds
            .iter()
            .map(|&y| y as f32)
            .filter(|&y| y <= marker_px)
            .fold(f32::NEG_INFINITY, f32::max);
        let bottom = row_bounds
            .iter()
            .map(|&y| y as f32)
            .filter(|&y| y > marker_px)
            .fold(f32::INFINITY, f32::min);

        let in_row = duties.iter().filter(|d| {
            let y = d.cy() * px_per_point;
            y >= top && y < bottom
        });
        return in_row
            .min_by(|a, b| {
                (a.cy() - marker_cy)
                    .abs()
                    .total_cmp(&(b.cy() - marker_cy).abs())
            })
            .map(|d| d.text.clone());
    }

    duties
        .iter()
        .filter(|d| (d.cy() - marker_cy).abs() <= config.marker_pair_tolerance)
        .min_by(|a, b| {
            (a.cy() - marker_cy)
                .abs()
                .total_cmp(&(b.cy() - marker_cy).abs())
        })
        .map(|d| d.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;

    fn token(text: &str, cx: f32, cy: f32) -> PositionedToken {
        PositionedToken {
            text: text.into(),
            page: 0,
            left: cx - 6.0,
            right: cx + 6.0,
            top: cy - 4.0,
            bottom: cy + 4.0,
        }
    }

    fn cfg() -> TemplateConfig {
        TemplateConfig::default()
    }

    #[test]
    fn continuation_marker_pairs_neighbours() {
        let cfg = cfg();
        let tokens = vec![
            token("3006", 40.0, 100.0),
            token("}", 40.0, 120.0),
            token("3007", 40.0, 140.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert_eq!(scan.pairs, vec![("3006".into(), "3007".into())]);
    }

    #[test]
    fn marker_without_neighbours_yields_no_pair() {
        let cfg = cfg();
        let tokens = vec![token("}", 40.0, 120.0), token("3006", 40.0, 100.0)];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert!(scan.pairs.is_empty());
    }

    #[test]
    fn nearest_duties_win_over_farther_ones() {
        let cfg = cfg();
        let tokens = vec![
            token("3001", 40.0, 40.0),
            token("3006", 40.0, 100.0),
            token("}", 40.0, 120.0),
            token("3007", 40.0, 140.0),
            token("3020", 40.0, 300.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert_eq!(scan.pairs, vec![("3006".into(), "3007".into())]);
    }

    #[test]
    fn tokens_outside_duty_column_are_not_duties() {
        let cfg = cfg();
        // Same digits, but far right of the duty column.
        let tokens = vec![
            token("3006", 400.0, 100.0),
            token("}", 40.0, 120.0),
            token("3007", 400.0, 140.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert!(scan.pairs.is_empty());
    }

    #[test]
    fn fused_split_glyph_resolves_same_row_duty() {
        let cfg = cfg();
        let tokens = vec![
            token("3006", 40.0, 100.0),
            token("//", 70.0, 101.0),
            token("3007", 40.0, 140.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert_eq!(scan.split_day, vec!["3006".to_string()]);
    }

    #[test]
    fn adjacent_single_glyphs_form_one_marker() {
        let cfg = cfg();
        let tokens = vec![
            token("3006", 40.0, 100.0),
            token("/", 68.0, 100.0),
            token("/", 73.0, 100.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert_eq!(scan.split_day, vec!["3006".to_string()]);
    }

    #[test]
    fn distant_single_glyphs_do_not_pair() {
        let cfg = cfg();
        let tokens = vec![
            token("3006", 40.0, 100.0),
            token("/", 68.0, 100.0),
            token("/", 120.0, 100.0),
        ];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert!(scan.split_day.is_empty());
    }

    #[test]
    fn row_bounds_pick_duty_inside_the_row() {
        let cfg = cfg();
        // Rows at pixel y: [0,90), [90,130), [130,..). The marker at point
        // y=101 (scale 1.0) shares the middle row with 3006 only, even
        // though 3007 is nearer in raw distance.
        let tokens = vec![
            token("3006", 40.0, 95.0),
            token("//", 70.0, 101.0),
            token("3007", 40.0, 104.5),
        ];
        // Place 3007 outside the middle row.
        let mut tokens = tokens;
        tokens[2] = token("3007", 40.0, 135.0);
        let scan = scan_page(&tokens, &[90, 130], 1.0, &cfg);
        assert_eq!(scan.split_day, vec!["3006".to_string()]);
    }

    #[test]
    fn duty_less_row_resolves_to_nothing_despite_nearby_duty() {
        let cfg = cfg();
        // Rows at pixel y: [0,90), [90,130), [130,..). The marker's middle
        // row is empty; 3006 sits just across the upper bound, well inside
        // the distance tolerance, and must still not match.
        let tokens = vec![token("3006", 40.0, 89.0), token("//", 70.0, 101.0)];
        let scan = scan_page(&tokens, &[90, 130], 1.0, &cfg);
        assert!(scan.split_day.is_empty());
    }

    #[test]
    fn fallback_tolerance_bounds_the_match() {
        let cfg = cfg();
        // No row bounds; nearest duty is 40pt away, past the tolerance.
        let tokens = vec![token("3006", 40.0, 60.0), token("//", 70.0, 100.0)];
        let scan = scan_page(&tokens, &[], 1.0, &cfg);
        assert!(scan.split_day.is_empty());
    }

    #[test]
    fn marker_scan_serializes_pairs_and_set() {
        let scan = MarkerScan {
            pairs: vec![("3006".into(), "3007".into())],
            split_day: ["3010".to_string()].into_iter().collect(),
        };
        let v = serde_json::to_value(&scan).unwrap();
        assert_eq!(v["pairs"][0][0], "3006");
        assert_eq!(v["pairs"][0][1], "3007");
        assert_eq!(v["split_day"][0], "3010");
    }
}
