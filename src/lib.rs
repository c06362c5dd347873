//! # pdf2turnus
//!
//! Parse Norwegian "turnus" roster PDFs into structured schedules.
//!
//! ## Why this crate?
//!
//! Roster PDFs carry no table structure — only positioned glyphs laid out on
//! a fixed template: six weekly rows × seven daily columns per schedule, two
//! schedules per page. Generic PDF-table extractors mangle them (tokens
//! straddle cell boundaries, time pairs fuse into one token, duty codes wrap
//! across weeks). This crate instead classifies every positioned token
//! against a calibrated geometry catalog and reassembles the grid with
//! explicit boundary rules, producing per-day start/end times, duty codes
//! and continuation flags.
//!
//! ## Pipeline overview
//!
//! ```text
//! roster PDF
//!  │
//!  ├─ 1. Input     validate path + %PDF magic
//!  ├─ 2. Extract   positioned word tokens via pdfium (char merge)
//!  ├─ 3. Classify  bucket tokens into (slot, week, day, kind)
//!  ├─ 4. Assemble  boundary spillover, fused-time splits, code merging
//!  ├─ 5. Flag      numerically consecutive duties
//!  └─ 6. Output    ScheduleStore JSON + per-schedule statistics
//!
//! strike-list PDF
//!  │
//!  ├─ Render       page bitmaps (cached per page)
//!  ├─ Separators   dark horizontal rules → row bounds
//!  ├─ Markers      continuation pairs + split-day duties
//!  └─ Images       per-duty row crops with an hour ruler
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pdf2turnus::{parse_schedule_file, stats, TemplateConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TemplateConfig::for_version("2024")?;
//!     let store = parse_schedule_file("turnus.pdf", &config)?;
//!     for row in stats::aggregate_store(&store) {
//!         println!("{}: {} shifts, {} weekend hours", row.name, row.shift_count, row.weekend_hours);
//!     }
//!     println!("{}", serde_json::to_string_pretty(&store)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2turnus` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2turnus = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod geometry;
pub mod images;
pub mod parse;
pub mod pipeline;
pub mod schedule;
pub mod stats;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CodeContinuation, SeparatorConfig, SuffixFamily, TemplateConfig};
pub use error::{DutyImageError, TurnusError};
pub use images::{generate_duty_images, ImageBatchReport};
pub use parse::{parse_schedule, parse_schedule_file, scan_markers, scan_markers_file};
pub use pipeline::extract::{DocumentSource, PdfiumSource, PositionedToken};
pub use pipeline::markers::MarkerScan;
pub use schedule::{DayRecord, ScheduleRecord, ScheduleStore, WeekRecord, Weekday};
pub use stats::{aggregate, aggregate_store, ScheduleStats};
