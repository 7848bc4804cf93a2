// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Turning a laid-out [`Line`] into vertex data deposited in a [`Batch`] (§4.6)
//!
//! Three kinds of vertex lists are emitted per line: foreground glyph quads
//! (one per [`GlyphBox`](crate::boxes::GlyphBox), grouped by texture owner),
//! background fill quads, and underline segments. The grouping follows §9's
//! "small DAG shared across layouts": background and underline each use one
//! shared child of the line's root group, glyphs get one child per texture
//! owner, so two layouts filling the same atlas coalesce into one draw call
//! (see [`Group`]'s value-equality).
//!
//! A glyph's `vertices` rectangle is in the coordinate convention the
//! [`FontProvider`](crate::font::FontProvider) chose to emit (out of scope,
//! §1) and is added to the pen position without reinterpretation. Paragraph
//! geometry (`line.y`, ascent/descent used for background fill and
//! underline) follows this crate's "y increases downward" convention (see
//! [`Line`]), which is why those offsets below are the sign-flipped
//! counterparts of spec.md §4.6's formulas (written for the source's
//! y-increases-upward axis).

use crate::batch::{Batch, Group, GroupKind, Vertex, VertexListId};
use crate::boxes::LayoutBox;
use crate::document::Document;
use crate::line::Line;
use crate::runlist::RunSource;
use crate::selection::Color;
use std::rc::Rc;

fn color_f32(c: Color) -> [f32; 4] {
    [
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
        c.a as f32 / 255.0,
    ]
}

/// Build every vertex list for `line`
///
/// Returns the new vertex list handles (to be stored on
/// [`Line::vertex_lists`]) plus the `(element, x, y)` placements the caller
/// must apply via `doc.element_mut(id).place(x, y)` — placement is handed
/// back rather than performed here so callers can hold `doc` immutably for
/// the whole pass (a `&mut dyn Document` parameter here would alias the
/// `colors`/`backgrounds`/`doc` style lookups below).
///
/// `origin` is the layout's own translation (scroll position plus any
/// top-level anchor offset); `line.x`/`line.y` are added to it.
pub fn build_line(
    line: &Line,
    origin_x: i32,
    origin_y: i32,
    doc: &dyn Document,
    colors: &dyn RunSource<Color>,
    backgrounds: &dyn RunSource<Option<Color>>,
    root: &Rc<Group>,
    batch: &mut Batch,
) -> (Vec<VertexListId>, Vec<(crate::boxes::ElementId, i32, i32)>) {
    let mut lists = Vec::new();
    let mut placements = Vec::new();
    let mut pen_x = origin_x + line.x;
    let base_y = origin_y + line.y;
    let mut char_index = line.start;

    for b in &line.boxes {
        match b {
            LayoutBox::Glyphs(gb) => {
                let n = gb.glyphs.len();
                if n == 0 {
                    continue;
                }

                // `boundary[k]` is the pen x just before the k-th glyph;
                // `boundary[n]` is the pen x after the last one.
                let mut boundary = Vec::with_capacity(n + 1);
                boundary.push(pen_x);
                let mut x = pen_x;
                for (kern, g) in &gb.glyphs {
                    x += kern + g.advance;
                    boundary.push(x);
                }

                let mut vertices = Vec::with_capacity(n * 4);
                for (s, e, baseline) in doc.baseline().ranges(char_index, char_index + n) {
                    let (ls, le) = (s - char_index, e - char_index);
                    for (li, (kern, g)) in gb.glyphs[ls..le].iter().enumerate() {
                        let idx = ls + li;
                        let gx = boundary[idx] + kern;
                        let gy = base_y + baseline;
                        let (x0, y0, x1, y1) = g.vertices;
                        let color = color_f32(colors.value_at(char_index + idx));
                        for (ci, (dx, dy)) in
                            [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].into_iter().enumerate()
                        {
                            vertices.push(Vertex {
                                position: ((gx + dx) as f32, (gy + dy) as f32),
                                tex_coord: g.tex_coords.0[ci],
                                color,
                            });
                        }
                    }
                }
                lists.push(batch.insert(root.child(GroupKind::Glyphs(gb.owner)), vertices));

                // Decoration: iterate background/underline separately (each
                // its own maximal sub-ranges), using the last seen baseline
                // for underline placement (spec.md §4.6's "cheat", inherited
                // from the pyglet original).
                let baseline_last = doc.baseline().value_at(char_index + n - 1);

                let mut bg_vertices = Vec::new();
                for (s, e, color) in backgrounds.ranges(char_index, char_index + n) {
                    let Some(color) = color else { continue };
                    let x1 = boundary[s - char_index];
                    let x2 = boundary[e - char_index];
                    let top = base_y - gb.ascent();
                    let bottom = base_y - gb.descent();
                    let c = color_f32(color);
                    for (px, py) in [(x1, top), (x2, top), (x2, bottom), (x1, bottom)] {
                        bg_vertices.push(Vertex {
                            position: (px as f32, py as f32),
                            tex_coord: [0.0; 3],
                            color: c,
                        });
                    }
                }
                if !bg_vertices.is_empty() {
                    lists.push(batch.insert(root.child(GroupKind::Background), bg_vertices));
                }

                let mut ul_vertices = Vec::new();
                for (s, e, color) in doc.underline().ranges(char_index, char_index + n) {
                    let Some(color) = color else { continue };
                    let x1 = boundary[s - char_index];
                    let x2 = boundary[e - char_index];
                    let y_u = base_y + baseline_last + 2;
                    let c = color_f32(color);
                    ul_vertices.push(Vertex {
                        position: (x1 as f32, y_u as f32),
                        tex_coord: [0.0; 3],
                        color: c,
                    });
                    ul_vertices.push(Vertex {
                        position: (x2 as f32, y_u as f32),
                        tex_coord: [0.0; 3],
                        color: c,
                    });
                }
                if !ul_vertices.is_empty() {
                    lists.push(batch.insert(root.child(GroupKind::Underline), ul_vertices));
                }

                pen_x = boundary[n];
                char_index += n;
            }
            LayoutBox::Element(eb) => {
                placements.push((eb.element, pen_x, base_y));
                pen_x += eb.advance;
                char_index += 1;
            }
        }
    }

    (lists, placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use crate::document::{HAlign, PlainDocument};
    use crate::font::{FontHandle, Glyph, TexCoords, TextureId};
    use crate::runlist::RunSource;

    fn glyph(advance: i32) -> Glyph {
        Glyph {
            ascent: 10,
            descent: -2,
            advance,
            vertices: (0, -10, advance, 2),
            tex_coords: TexCoords::default(),
            owner: TextureId(0),
        }
    }

    fn two_glyph_line() -> Line {
        use crate::boxes::GlyphBox;
        Line {
            start: 0,
            length: 2,
            boxes: vec![LayoutBox::Glyphs(GlyphBox {
                owner: TextureId(0),
                font: FontHandle(0),
                glyphs: vec![(0, glyph(8)), (0, glyph(8))],
            })],
            ascent: 10,
            descent: -2,
            width: 16,
            x: 0,
            y: 10,
            margin_left: 0,
            margin_right: 0,
            align: HAlign::Left,
            paragraph_begin: true,
            paragraph_end: true,
            vertex_lists: Vec::new(),
        }
    }

    #[test]
    fn emits_one_vertex_list_of_eight_vertices_for_two_glyphs() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let line = two_glyph_line();
        let mut batch = Batch::new();
        let root = Group::root();
        let (lists, placements) =
            build_line(&line, 0, 0, &doc, doc.color(), doc.background_color(), &root, &mut batch);
        assert_eq!(lists.len(), 1);
        assert!(placements.is_empty());
        let (_, verts) = batch.get(lists[0]).unwrap();
        assert_eq!(verts.len(), 8);
    }

    #[test]
    fn background_and_underline_emit_extra_lists() {
        let mut doc = PlainDocument::new("hi", FontHandle(0));
        doc.set_background(0, 2, Some(Color::rgba(255, 0, 0, 255)));
        let line = two_glyph_line();
        let mut batch = Batch::new();
        let root = Group::root();
        let (lists, _) =
            build_line(&line, 0, 0, &doc, doc.color(), doc.background_color(), &root, &mut batch);
        // glyphs + background (no underline set)
        assert_eq!(lists.len(), 2);
    }

    #[test]
    fn no_background_quad_when_color_is_none() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let line = two_glyph_line();
        let mut batch = Batch::new();
        let root = Group::root();
        let (lists, _) =
            build_line(&line, 0, 0, &doc, doc.color(), doc.background_color(), &root, &mut batch);
        assert_eq!(lists.len(), 1);
    }
}
