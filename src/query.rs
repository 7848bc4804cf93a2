// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Mapping between document positions, line indices and pixel points (§4.9)
//!
//! Every function here takes coordinates already translated into the
//! layout's local space (scroll/anchor offsets removed); [`crate::layout`]
//! owns that translation. As elsewhere, the vertical comparisons are the
//! sign-flipped counterpart of the pyglet original (this crate's `y`
//! increases downward).

use crate::document::Document;
use crate::line::Line;

/// The line index whose vertical extent contains `y`, clamping to the last
/// line if `y` is past the bottom of the content
pub fn line_from_point(lines: &[Line], y: i32) -> usize {
    let mut index = 0;
    for line in lines {
        if y < line.y - line.descent {
            break;
        }
        index += 1;
    }
    index.min(lines.len().saturating_sub(1))
}

/// The document position on `lines[line_index]` closest to local x-offset `x`
pub fn position_on_line(lines: &[Line], line_index: usize, x: i32) -> usize {
    let line = &lines[line_index];
    let mut position = line.start;
    let mut last_x = line.x;
    for b in &line.boxes {
        let advance = b.advance();
        if (0..advance).contains(&(x - last_x)) {
            position += b.position_in_box(x - last_x);
            return position;
        }
        last_x += advance;
        position += b.length();
    }
    position
}

/// `position_on_line(line_from_point(lines, y), x)` (§4.9's
/// `position_at_point`)
pub fn position_at_point(lines: &[Line], x: i32, y: i32) -> usize {
    if lines.is_empty() {
        return 0;
    }
    position_on_line(lines, line_from_point(lines, y), x)
}

/// Pixel `(x, y)` of `position`, disambiguating an end-of-line position via
/// `line_index` when given (baseline offset from `doc.baseline()` added to
/// `y`, matching [`vertex::build_line`](crate::vertex::build_line))
pub fn point_from_position(
    lines: &[Line],
    doc: &dyn Document,
    position: usize,
    line_index: Option<usize>,
) -> (i32, i32) {
    let idx = line_index.unwrap_or_else(|| {
        lines
            .iter()
            .rposition(|l| l.start <= position)
            .unwrap_or(0)
    });
    let line = &lines[idx];

    let baseline = if position == 0 {
        0
    } else {
        doc.baseline().value_at(position - 1)
    };

    let mut x = line.x;
    let mut rel = position - line.start;
    for b in &line.boxes {
        let len = b.length();
        if rel <= len {
            x += b.point_in_box(rel);
            break;
        }
        rel -= len;
        x += b.advance();
    }

    (x, line.y + baseline)
}

/// Pixel `(x, y)` of the start of `lines[line_index]`
pub fn point_from_line(lines: &[Line], line_index: usize) -> (i32, i32) {
    let line = &lines[line_index];
    (line.x, line.y)
}

/// Index of the line containing character `position`
pub fn line_from_position(lines: &[Line], position: usize) -> usize {
    let mut index = 0usize;
    let mut found = 0usize;
    for line in lines {
        if line.start > position {
            break;
        }
        found = index;
        index += 1;
    }
    found
}

/// First character position of `lines[line_index]`
pub fn position_from_line(lines: &[Line], line_index: usize) -> usize {
    lines[line_index].start
}

pub fn line_count(lines: &[Line]) -> usize {
    lines.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{ElementBox, GlyphBox, LayoutBox};
    use crate::document::{HAlign, PlainDocument};
    use crate::font::{FontHandle, Glyph, TexCoords, TextureId};

    fn glyph(advance: i32) -> Glyph {
        Glyph {
            ascent: 10,
            descent: -2,
            advance,
            vertices: (0, 0, advance, 10),
            tex_coords: TexCoords::default(),
            owner: TextureId(0),
        }
    }

    fn text_line(start: usize, y: i32, n: usize) -> Line {
        Line {
            start,
            length: n,
            boxes: vec![LayoutBox::Glyphs(GlyphBox {
                owner: TextureId(0),
                font: FontHandle(0),
                glyphs: (0..n).map(|_| (0, glyph(10))).collect(),
            })],
            ascent: 10,
            descent: -2,
            width: (n as i32) * 10,
            x: 0,
            y,
            margin_left: 0,
            margin_right: 0,
            align: HAlign::Left,
            paragraph_begin: true,
            paragraph_end: true,
            vertex_lists: Vec::new(),
        }
    }

    #[test]
    fn line_from_point_selects_overlapping_line() {
        let lines = vec![text_line(0, 10, 3), text_line(3, 30, 3)];
        assert_eq!(line_from_point(&lines, 5), 0);
        assert_eq!(line_from_point(&lines, 15), 1); // between the two lines, falls to the next
        assert_eq!(line_from_point(&lines, 25), 1);
        assert_eq!(line_from_point(&lines, 1000), 1); // clamps
    }

    #[test]
    fn position_on_line_uses_left_half_rule() {
        let lines = vec![text_line(0, 10, 3)];
        assert_eq!(position_on_line(&lines, 0, 0), 0);
        assert_eq!(position_on_line(&lines, 0, 14), 1);
        assert_eq!(position_on_line(&lines, 0, 24), 2);
    }

    #[test]
    fn round_trip_position_and_point() {
        let lines = vec![text_line(0, 10, 3)];
        let doc = PlainDocument::new("abc", FontHandle(0));
        let (x, y) = point_from_position(&lines, &doc, 2, None);
        assert_eq!(x, 20);
        assert_eq!(y, 10);
        assert_eq!(position_at_point(&lines, x, y), 2);
    }

    #[test]
    fn line_from_position_and_position_from_line_round_trip() {
        let lines = vec![text_line(0, 10, 3), text_line(3, 30, 3)];
        assert_eq!(line_from_position(&lines, 0), 0);
        assert_eq!(line_from_position(&lines, 4), 1);
        assert_eq!(position_from_line(&lines, 1), 3);
        assert_eq!(line_count(&lines), 2);
    }

    #[test]
    fn element_box_counts_as_one_position() {
        let mut line = text_line(0, 10, 0);
        line.boxes = vec![LayoutBox::Element(ElementBox {
            element: crate::boxes::ElementId(0),
            ascent: 5,
            descent: -1,
            advance: 20,
        })];
        line.length = 1;
        assert_eq!(position_on_line(&[line.clone()], 0, 5), 0);
        assert_eq!(position_on_line(&[line], 0, 15), 1);
    }
}
