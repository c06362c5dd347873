//! Word Classifier: bucket positioned tokens into (slot, week, day, kind).
//!
//! Chrome tokens (column headers, week labels) are discarded first. Every
//! remaining token is tested for containment of its center point against
//! the geometry catalog. Two independent passes classify time tokens (text
//! containing ':' or matching a free-day marker) and code tokens (anything
//! else within the day columns' extent). A token landing outside every
//! rectangle is skipped silently — a stray token never aborts a page.

use crate::config::TemplateConfig;
use crate::geometry::Cell;
use crate::pipeline::extract::PositionedToken;
use tracing::trace;

/// One schedule slot's classified tokens, in reading order.
#[derive(Debug, Clone, Default)]
pub struct SlotTokens {
    /// Joined name-band token run, x-ordered. None when the band is empty.
    pub name: Option<String>,
    pub times: Vec<(Cell, PositionedToken)>,
    pub codes: Vec<(Cell, PositionedToken)>,
}

impl SlotTokens {
    /// Nothing classified into this slot at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.times.is_empty() && self.codes.is_empty()
    }
}

/// Both slots of one page.
#[derive(Debug, Clone, Default)]
pub struct PageClassification {
    pub slots: [SlotTokens; 2],
}

/// Whether a token is a time token: clock text or a free-day marker.
pub fn is_time_token(text: &str, config: &TemplateConfig) -> bool {
    text.contains(':') || config.free_day_markers.iter().any(|m| m == text)
}

/// Classify one page's tokens against the geometry catalog.
pub fn classify_page(tokens: &[PositionedToken], config: &TemplateConfig) -> PageClassification {
    let geom = &config.geometry;

    // Reading order: top-to-bottom, then left-to-right.
    let mut ordered: Vec<&PositionedToken> = tokens
        .iter()
        .filter(|t| !config.chrome.iter().any(|c| c == t.text.trim()))
        .collect();
    ordered.sort_by(|a, b| {
        a.top
            .total_cmp(&b.top)
            .then_with(|| a.left.total_cmp(&b.left))
    });

    let mut page = PageClassification::default();

    // Name runs: tokens in each slot's name band, already x-sorted within a
    // row by the ordering above.
    for (slot_idx, slot_tokens) in name_runs(&ordered, config).into_iter().enumerate() {
        if !slot_tokens.is_empty() {
            page.slots[slot_idx].name = Some(slot_tokens.join(" "));
        }
    }

    // Pass 1: time tokens.
    for t in &ordered {
        if !is_time_token(&t.text, config) {
            continue;
        }
        match geom.locate(t.cx(), t.cy()) {
            Some((slot, cell)) => page.slots[slot].times.push((cell, (*t).clone())),
            None => trace!(text = %t.text, "time token outside any cell, skipped"),
        }
    }

    // Pass 2: code tokens — everything else within the day columns' extent.
    let extent = geom.day_extent();
    for t in &ordered {
        if is_time_token(&t.text, config) || !extent.contains(t.cx()) {
            continue;
        }
        match geom.locate(t.cx(), t.cy()) {
            Some((slot, cell)) => page.slots[slot].codes.push((cell, (*t).clone())),
            None => trace!(text = %t.text, "code token outside any cell, skipped"),
        }
    }

    page
}

fn name_runs(ordered: &[&PositionedToken], config: &TemplateConfig) -> [Vec<String>; 2] {
    let mut runs: [Vec<(f32, String)>; 2] = [Vec::new(), Vec::new()];
    for t in ordered {
        if let Some(slot) = config.geometry.name_slot_for_y(t.cy()) {
            runs[slot].push((t.left, t.text.clone()));
        }
    }
    runs.map(|mut run| {
        run.sort_by(|a, b| a.0.total_cmp(&b.0));
        run.into_iter().map(|(_, s)| s).collect()
    })
}
