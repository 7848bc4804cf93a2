// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The flow unit: a run of glyphs sharing a texture, or one inline element
//!
//! The source represents these via duck typing; per §9 we model them as a
//! tagged variant with a common interface.

use crate::font::{FontHandle, Glyph, TextureId};

/// Opaque handle to an inline (non-text) element hosted by the
/// [`Document`](crate::document::Document)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// A non-text item embedded in the flow at one character position
///
/// §9 simplifies the source's `place(layout, x, y)`/`remove(layout)` hooks
/// (which let an element register itself with the hosting GUI's scene
/// graph) to plain geometric callbacks: the element receives the pixel
/// position it was placed at and is told when that placement is retracted.
/// A caller needing scene-graph registration can close over it in its
/// `InlineElement` implementation.
pub trait InlineElement: std::fmt::Debug {
    /// Height above the line's baseline
    fn ascent(&self) -> i32;
    /// Depth below the line's baseline, as a non-positive number
    fn descent(&self) -> i32;
    /// Horizontal space the element consumes
    fn advance(&self) -> i32;
    /// Called once when the element's box is first positioned on a line
    fn place(&mut self, x: i32, y: i32);
    /// Called when the line hosting this element is deleted
    fn remove(&mut self);
}

/// A run of glyphs sharing one texture owner
#[derive(Clone, Debug, Default)]
pub struct GlyphBox {
    pub owner: TextureId,
    pub font: FontHandle,
    /// `(kern, glyph)` pairs; `kern` is the extra advance applied before the
    /// glyph (already includes any tab-stop snap)
    pub glyphs: Vec<(i32, Glyph)>,
}

impl GlyphBox {
    pub fn advance(&self) -> i32 {
        self.glyphs.iter().map(|(k, g)| k + g.advance).sum()
    }

    pub fn ascent(&self) -> i32 {
        self.glyphs.iter().map(|(_, g)| g.ascent).max().unwrap_or(0)
    }

    pub fn descent(&self) -> i32 {
        self.glyphs.iter().map(|(_, g)| g.descent).min().unwrap_or(0)
    }

    pub fn length(&self) -> usize {
        self.glyphs.len()
    }

    /// Pixel advance of the first `n` glyphs (for `point_at_position`)
    pub fn point_in_box(&self, n: usize) -> i32 {
        self.glyphs[..n.min(self.glyphs.len())]
            .iter()
            .map(|(k, g)| k + g.advance)
            .sum()
    }

    /// Character offset owning pixel-x `local_x` (left-half rule, §4.9): a
    /// glyph owns `x` while `x < last_x + glyph.advance/2`
    pub fn position_in_box(&self, local_x: i32) -> usize {
        let mut x = 0;
        for (i, (k, g)) in self.glyphs.iter().enumerate() {
            let start = x + k;
            if local_x < start + g.advance / 2 {
                return i;
            }
            x = start + g.advance;
        }
        self.glyphs.len()
    }
}

/// One inline element positioned at a single character index
#[derive(Clone, Debug)]
pub struct ElementBox {
    pub element: ElementId,
    pub ascent: i32,
    pub descent: i32,
    pub advance: i32,
}

impl ElementBox {
    pub fn point_in_box(&self, n: usize) -> i32 {
        if n == 0 {
            0
        } else {
            self.advance
        }
    }

    pub fn position_in_box(&self, local_x: i32) -> usize {
        if local_x < self.advance / 2 {
            0
        } else {
            1
        }
    }
}

/// The atomic unit placed on a [`Line`](crate::line::Line)
#[derive(Clone, Debug)]
pub enum LayoutBox {
    Glyphs(GlyphBox),
    Element(ElementBox),
}

impl LayoutBox {
    pub fn ascent(&self) -> i32 {
        match self {
            LayoutBox::Glyphs(b) => b.ascent(),
            LayoutBox::Element(b) => b.ascent,
        }
    }

    pub fn descent(&self) -> i32 {
        match self {
            LayoutBox::Glyphs(b) => b.descent(),
            LayoutBox::Element(b) => b.descent,
        }
    }

    pub fn advance(&self) -> i32 {
        match self {
            LayoutBox::Glyphs(b) => b.advance(),
            LayoutBox::Element(b) => b.advance,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            LayoutBox::Glyphs(b) => b.length(),
            LayoutBox::Element(_) => 1,
        }
    }

    pub fn point_in_box(&self, n: usize) -> i32 {
        match self {
            LayoutBox::Glyphs(b) => b.point_in_box(n),
            LayoutBox::Element(b) => b.point_in_box(n),
        }
    }

    pub fn position_in_box(&self, local_x: i32) -> usize {
        match self {
            LayoutBox::Glyphs(b) => b.position_in_box(local_x),
            LayoutBox::Element(b) => b.position_in_box(local_x),
        }
    }

    pub fn owner(&self) -> Option<TextureId> {
        match self {
            LayoutBox::Glyphs(b) => Some(b.owner),
            LayoutBox::Element(_) => None,
        }
    }
}
