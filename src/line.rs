// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! A horizontal row of boxes sharing one baseline (§3)

use crate::batch::{Batch, VertexListId};
use crate::boxes::LayoutBox;
use crate::document::{Document, HAlign};

/// One laid-out line
///
/// `x`/`y` give the pixel origin of the line's left edge at its baseline.
/// `y` grows *down* the page even though the underlying convention (per
/// spec §4.4) is "subtracting from y moves down" — we store `y` as a plain
/// pixel offset increasing downward, which is the natural mapping for most
/// 2D canvas/backend coordinate systems and is what
/// [`vertical::place`](crate::vertical::place) produces.
#[derive(Clone, Debug, Default)]
pub struct Line {
    pub start: usize,
    pub length: usize,
    pub boxes: Vec<LayoutBox>,
    pub ascent: i32,
    pub descent: i32,
    pub width: i32,
    pub x: i32,
    pub y: i32,
    pub margin_left: i32,
    pub margin_right: i32,
    pub align: HAlign,
    pub paragraph_begin: bool,
    pub paragraph_end: bool,
    pub vertex_lists: Vec<VertexListId>,
}

impl Line {
    /// Release this line's vertex lists back to the batch and notify any
    /// inline elements that they have been removed
    pub fn delete(&mut self, batch: &mut Batch, doc: &mut dyn Document) {
        for id in self.vertex_lists.drain(..) {
            batch.delete(id);
        }
        for b in &self.boxes {
            if let LayoutBox::Element(eb) = b {
                doc.element_mut(eb.element).remove();
            }
        }
    }

    /// Total vertical extent: `ascent + |descent|`
    pub fn height(&self) -> i32 {
        self.ascent - self.descent
    }
}
