//! Pipeline stages for roster parsing.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable: everything downstream of
//! [`extract`] is a pure function over token lists and bitmaps, so the full
//! pipeline runs in tests without a PDF.
//!
//! ## Data flow
//!
//! ```text
//! input ──▶ extract ──▶ classify ──▶ assemble ──▶ ScheduleStore
//! (path)    (pdfium)    (geometry)   (cell rules)
//!
//! strike list: extract ──▶ separators + markers ──▶ MarkerScan
//! ```
//!
//! 1. [`input`]      — validate the user-supplied path (magic bytes)
//! 2. [`extract`]    — positioned word tokens and rendered bitmaps behind the
//!    [`extract::DocumentSource`] trait
//! 3. [`classify`]   — bucket tokens into (slot, week, day, kind) against the
//!    geometry catalog
//! 4. [`assemble`]   — boundary spillover, fused-token splitting, start/end
//!    derivation, code merging, consecutive-duty flags
//! 5. [`separators`] — dark horizontal rules in a rendered bitmap
//! 6. [`markers`]    — continuation/split-day markers on strike-list pages

pub mod assemble;
pub mod classify;
pub mod extract;
pub mod input;
pub mod markers;
pub mod separators;
