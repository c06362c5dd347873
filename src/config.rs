//! Per-template configuration: geometry constants, marker glyphs, thresholds.
//!
//! Every knob that varies between roster template versions lives in one
//! [`TemplateConfig`]. Keeping them together makes it trivial to add a new
//! template year, to serialise the geometry for inspection, and to diff two
//! versions to understand why their outputs differ. Nothing in here is
//! auto-detected from the document — the parser is calibrated, not adaptive.

use crate::error::TurnusError;
use crate::geometry::{Band, GeometryCatalog, SlotGeometry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Thresholds for one Separator-Line Detector call site.
///
/// The two call sites (strike-list row location vs duty-image cropping) were
/// tuned independently and their values diverge, so each carries its own
/// config rather than sharing one "canonical" set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparatorConfig {
    /// Minimum run height in pixels for a dark band to count as a rule.
    pub min_thickness: u32,
    /// Row-mean brightness (0–255) below which a row is considered dark.
    pub darkness_cutoff: f32,
    /// Strict variant: the run's darkest row must also fall below this
    /// value, rejecting rows that are merely dense with text. None disables
    /// the check.
    pub strict_min_brightness: Option<f32>,
}

/// Tolerances for merging pdfium characters into word tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeTolerances {
    /// Maximum horizontal gap (page points) between characters of one token.
    pub x_tol: f32,
    /// Maximum vertical center offset (page points) within one token.
    pub y_tol: f32,
}

/// Decides whether a duty code can receive a cross-boundary numeric
/// continuation token (spec'd as a pluggable predicate: the suffix families
/// are a per-operator naming convention, not a universal rule).
pub trait CodeContinuation: Send + Sync {
    /// True when `prior_code` ends in a family suffix that admits an
    /// appended numeric fragment from the following cell.
    fn continues(&self, prior_code: &str) -> bool;
}

/// Default [`CodeContinuation`]: the code's last whitespace-separated word
/// must equal one of the configured suffixes.
#[derive(Debug, Clone)]
pub struct SuffixFamily {
    pub suffixes: Vec<String>,
}

impl CodeContinuation for SuffixFamily {
    fn continues(&self, prior_code: &str) -> bool {
        prior_code
            .split_whitespace()
            .next_back()
            .map(|last| self.suffixes.iter().any(|s| s == last))
            .unwrap_or(false)
    }
}

/// All constants for one roster template version.
#[derive(Clone)]
pub struct TemplateConfig {
    /// Template version id, e.g. "2024".
    pub version: String,

    /// Cell rectangles for the schedule pages.
    pub geometry: GeometryCatalog,

    /// Page-chrome tokens discarded before classification (column headers,
    /// week labels).
    pub chrome: Vec<String>,

    /// Tokens marking a free day in a time cell.
    pub free_day_markers: Vec<String>,

    /// Character-to-token merge tolerances for text extraction.
    pub merge: MergeTolerances,

    /// Zoom factor for page rasterisation (pixels per page point).
    pub render_zoom: f32,

    // ── Strike-list constants ────────────────────────────────────────────
    /// Right edge of the duty-number column on strike-list pages.
    pub duty_column_max_x: f32,

    /// Glyph marking a continuation between two duty rows.
    pub continuation_glyph: String,

    /// Single split-day glyph; the fused form is the glyph doubled.
    pub split_day_glyph: String,

    /// Maximum horizontal gap between two single split-day glyphs that
    /// together form one marker.
    pub split_adjacency_px: f32,

    /// Fallback tolerance when pairing a split-day marker with a duty
    /// number by y distance (no separator rows available).
    pub marker_pair_tolerance: f32,

    /// Separator thresholds for locating strike-list rows.
    pub row_separators: SeparatorConfig,

    /// Separator thresholds for duty-image cropping (stricter: must reject
    /// text-only rows so crops don't bleed into neighbours).
    pub crop_separators: SeparatorConfig,

    /// Half-height of the fixed-distance row fallback when no separator
    /// lines are found (rendered pixels).
    pub row_fallback_px: f32,

    /// Cross-boundary code-continuation predicate.
    pub continuation: Arc<dyn CodeContinuation>,
}

impl fmt::Debug for TemplateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateConfig")
            .field("version", &self.version)
            .field("chrome", &self.chrome)
            .field("free_day_markers", &self.free_day_markers)
            .field("merge", &self.merge)
            .field("render_zoom", &self.render_zoom)
            .field("duty_column_max_x", &self.duty_column_max_x)
            .field("continuation_glyph", &self.continuation_glyph)
            .field("split_day_glyph", &self.split_day_glyph)
            .field("row_separators", &self.row_separators)
            .field("crop_separators", &self.crop_separators)
            .field("continuation", &"<dyn CodeContinuation>")
            .finish()
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        template_2024()
    }
}

impl TemplateConfig {
    /// Look up the built-in constants for a template version id.
    pub fn for_version(version: &str) -> Result<Self, TurnusError> {
        let cfg = match version {
            "2023" => template_2023(),
            "2024" => template_2024(),
            _ => {
                return Err(TurnusError::UnknownTemplate {
                    version: version.to_string(),
                    known: "2023, 2024".to_string(),
                })
            }
        };
        cfg.validated()
    }

    /// Validate geometry invariants, consuming and returning self.
    pub fn validated(self) -> Result<Self, TurnusError> {
        self.geometry
            .validate()
            .map_err(TurnusError::InvalidConfig)?;
        if self.render_zoom <= 0.0 {
            return Err(TurnusError::InvalidConfig(format!(
                "render_zoom must be positive, got {}",
                self.render_zoom
            )));
        }
        Ok(self)
    }
}

// ── Built-in template versions ───────────────────────────────────────────
//
// Landscape A4 pages (842 × 595 pt). Two schedule slots stacked vertically,
// each a name row plus six 38 pt week rows; seven 108 pt day columns start
// 60 pt from the left edge. The 2023 layout sits 6 pt higher on the page.

fn week_bands(top: f32) -> [Band; 6] {
    let h = 38.0;
    std::array::from_fn(|i| Band::new(top + i as f32 * h, top + (i + 1) as f32 * h))
}

fn day_columns() -> [Band; 7] {
    let left = 60.0;
    let w = 108.0;
    std::array::from_fn(|i| Band::new(left + i as f32 * w, left + (i + 1) as f32 * w))
}

fn chrome_tokens() -> Vec<String> {
    [
        "Mandag", "Tirsdag", "Onsdag", "Torsdag", "Fredag", "Lørdag", "Søndag", "Uke", "Turnus",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn base_template(version: &str, slot0_top: f32, slot1_top: f32) -> TemplateConfig {
    TemplateConfig {
        version: version.to_string(),
        geometry: GeometryCatalog {
            slots: [
                SlotGeometry {
                    name_band: Band::new(slot0_top - 22.0, slot0_top - 4.0),
                    week_bands: week_bands(slot0_top),
                },
                SlotGeometry {
                    name_band: Band::new(slot1_top - 22.0, slot1_top - 4.0),
                    week_bands: week_bands(slot1_top),
                },
            ],
            day_columns: day_columns(),
        },
        chrome: chrome_tokens(),
        free_day_markers: vec!["Fri".to_string(), "X".to_string()],
        merge: MergeTolerances {
            x_tol: 1.5,
            y_tol: 2.0,
        },
        render_zoom: 2.0,
        duty_column_max_x: 90.0,
        continuation_glyph: "}".to_string(),
        split_day_glyph: "/".to_string(),
        split_adjacency_px: 8.0,
        marker_pair_tolerance: 14.0,
        row_separators: SeparatorConfig {
            min_thickness: 2,
            darkness_cutoff: 96.0,
            strict_min_brightness: None,
        },
        crop_separators: SeparatorConfig {
            min_thickness: 3,
            darkness_cutoff: 110.0,
            strict_min_brightness: Some(48.0),
        },
        row_fallback_px: 22.0,
        continuation: Arc::new(SuffixFamily {
            suffixes: ["D", "N", "K", "T"].iter().map(|s| s.to_string()).collect(),
        }),
    }
}

fn template_2024() -> TemplateConfig {
    base_template("2024", 50.0, 340.0)
}

fn template_2023() -> TemplateConfig {
    base_template("2023", 44.0, 334.0)
}
