// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The caret/selection model
//!
//! A selection is purely a rendering overlay: it never mutates the document,
//! only the colors seen by the [vertex builder](crate::vertex) via an
//! [`OverriddenRunIterator`](crate::runlist::OverriddenRunIterator) stacked
//! on top of the document's `color`/`background_color` run-lists.

/// RGBA color, 8 bits per channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

/// Current selection state of a layout
///
/// `[start, end)` clamp to `[0, document length]`; `start > end` is
/// normalized by the mutator, never by this type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Selection {
    start: usize,
    end: usize,
    pub foreground: Color,
    pub background: Color,
}

impl Selection {
    pub fn new(foreground: Color, background: Color) -> Self {
        Selection {
            start: 0,
            end: 0,
            foreground,
            background,
        }
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Set the selection, clamped to `[0, len]`, and return the symmetric
    /// difference of the old and new ranges (what must be re-styled)
    pub fn set(&mut self, mut start: usize, mut end: usize, len: usize) -> Vec<(usize, usize)> {
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        start = start.min(len);
        end = end.min(len);

        let (old_s, old_e) = (self.start, self.end);
        self.start = start;
        self.end = end;

        symmetric_difference(old_s, old_e, start, end)
    }
}

/// The symmetric difference of two half-open ranges, as the (0, 1, or 2)
/// sub-intervals present in exactly one of them
fn symmetric_difference(a_s: usize, a_e: usize, b_s: usize, b_e: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let lo_s = a_s.min(b_s);
    let lo_e = a_s.max(b_s);
    if lo_e > lo_s {
        out.push((lo_s, lo_e));
    }
    let hi_s = a_e.min(b_e);
    let hi_e = a_e.max(b_e);
    if hi_e > hi_s {
        out.push((hi_s, hi_e));
    }
    out
}
