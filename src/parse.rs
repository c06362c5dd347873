//! Top-level entry points: document in, schedule store or marker scan out.
//!
//! The `*_file` variants own the pdfium boundary (binding, open, magic-byte
//! validation); the trait-based variants take any [`DocumentSource`] so the
//! full pipeline runs against synthetic pages in tests.

use crate::config::TemplateConfig;
use crate::error::TurnusError;
use crate::pipeline::assemble::assemble_slot;
use crate::pipeline::classify::classify_page;
use crate::pipeline::extract::{DocumentSource, PdfiumSource};
use crate::pipeline::input::resolve_local;
use crate::pipeline::markers::{scan_document, MarkerScan};
use crate::schedule::ScheduleStore;
use pdfium_render::prelude::Pdfium;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Parse every schedule in a roster document.
///
/// Each page carries up to two schedule slots; empty slots are skipped, and
/// a later page reusing an already-stored schedule name is dropped (first
/// occurrence wins). Returns `Ok` even when the store ends up empty — an
/// empty store is a template mismatch, not an I/O failure, and shows up
/// downstream as zero-shift statistics.
pub fn parse_schedule(
    source: &dyn DocumentSource,
    config: &TemplateConfig,
) -> Result<ScheduleStore, TurnusError> {
    let start = Instant::now();
    let mut store = ScheduleStore::default();

    for page in 0..source.page_count() {
        // ── Step 1: Extract and classify ─────────────────────────────────
        let tokens = source.page_tokens(page)?;
        let classified = classify_page(&tokens, config);

        // ── Step 2: Assemble one schedule per non-empty slot ─────────────
        for (slot_idx, slot) in classified.slots.iter().enumerate() {
            if slot.is_empty() {
                debug!(page, slot = slot_idx, "empty slot skipped");
                continue;
            }
            let schedule = assemble_slot(slot, page, slot_idx, config);
            store.push(schedule);
        }
    }

    info!(
        schedules = store.schedules.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "roster parsed"
    );
    Ok(store)
}

/// Parse a roster PDF from disk.
pub fn parse_schedule_file(
    path: impl AsRef<Path>,
    config: &TemplateConfig,
) -> Result<ScheduleStore, TurnusError> {
    let path = resolve_local(path)?;
    let pdfium = bind_pdfium()?;
    let source = PdfiumSource::open(&pdfium, &path, config)?;
    parse_schedule(&source, config)
}

/// Scan a strike-list document for continuation and split-day markers.
pub fn scan_markers(
    source: &dyn DocumentSource,
    config: &TemplateConfig,
) -> Result<MarkerScan, TurnusError> {
    scan_document(source, config)
}

/// Scan a strike-list PDF from disk.
pub fn scan_markers_file(
    path: impl AsRef<Path>,
    config: &TemplateConfig,
) -> Result<MarkerScan, TurnusError> {
    let path = resolve_local(path)?;
    let pdfium = bind_pdfium()?;
    let source = PdfiumSource::open(&pdfium, &path, config)?;
    scan_markers(&source, config)
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH` if set, else the current
/// directory, else the system library.
pub fn bind_pdfium() -> Result<Pdfium, TurnusError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| TurnusError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}
