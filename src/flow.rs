// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Word-wrap and single-line flow (§4.3)
//!
//! [`WrapFlow`] is the pull-style generator described in §9: it implements
//! [`Iterator<Item = Line>`], yielding one line per `next()` call and
//! carrying pen position, trailing-whitespace and pending-word state across
//! calls so an incremental updater can drive it partially (stop once newly
//! produced lines converge with the unaffected tail, §4.8 pass 2).
//!
//! The boundary decision is made at *word* granularity rather than per
//! character: a run of non-breaking-whitespace characters is buffered (with
//! contiguous same-texture-owner glyphs still merged into one
//! [`GlyphBox`] as the shaper's owner-runs dictate) and only placed on the
//! current line once we know whether it fits. This is the standard
//! buffer-then-place word-wrap strategy and satisfies every property in
//! spec.md §8 (coverage, right-trim, no-overflow-when-possible, vertical
//! monotonicity) without needing to reproduce the source's separate
//! `owner_accum`/`owner_accum_commit` bookkeeping bit-for-bit.

use crate::boxes::{ElementBox, GlyphBox, LayoutBox};
use crate::document::Document;
use crate::font::{FontHandle, FontProvider, Glyph, TextureId};
use crate::line::Line;
use crate::shaper::{GlyphSlot, Shaper};
use crate::Dpi;

fn char_at(doc: &dyn Document, i: usize) -> char {
    doc.slice(i, i + 1).chars().next().expect("char index in range")
}

/// Breaking whitespace: space, zero-width space, tab
fn is_breaking_ws(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\u{200B}'
}

/// The explicit line-separator character (U+2028 LINE SEPARATOR)
fn is_line_sep(c: char) -> bool {
    c == '\u{2028}'
}

/// Line-feed or the explicit paragraph-separator character (U+2029)
fn is_para_sep(c: char) -> bool {
    c == '\n' || c == '\u{2029}'
}

/// True if a new line starting at `pos` begins a paragraph
pub fn paragraph_begins_at(doc: &dyn Document, pos: usize) -> bool {
    pos == 0 || (pos > 0 && is_para_sep(char_at(doc, pos - 1)))
}

/// Buffers one pending (unbroken) word, merging contiguous same-owner
/// glyphs into a single [`GlyphBox`] as they are pushed
struct WordBuilder {
    boxes: Vec<LayoutBox>,
    cur_owner: Option<TextureId>,
    cur_font: FontHandle,
    cur_glyphs: Vec<(i32, Glyph)>,
    advance: i32,
}

impl WordBuilder {
    fn new() -> Self {
        WordBuilder {
            boxes: Vec::new(),
            cur_owner: None,
            cur_font: FontHandle::default(),
            cur_glyphs: Vec::new(),
            advance: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.cur_glyphs.is_empty()
    }

    fn flush_owner(&mut self) {
        if !self.cur_glyphs.is_empty() {
            let owner = self.cur_owner.take().expect("owner set alongside glyphs");
            let glyphs = std::mem::take(&mut self.cur_glyphs);
            self.boxes.push(LayoutBox::Glyphs(GlyphBox {
                owner,
                font: self.cur_font,
                glyphs,
            }));
        }
    }

    fn push_glyph(&mut self, owner: TextureId, font: FontHandle, kern: i32, g: Glyph) {
        if self.cur_owner != Some(owner) {
            self.flush_owner();
            self.cur_owner = Some(owner);
            self.cur_font = font;
        }
        self.advance += kern + g.advance;
        self.cur_glyphs.push((kern, g));
    }

    fn push_element(&mut self, eb: ElementBox) {
        self.flush_owner();
        self.advance += eb.advance;
        self.boxes.push(LayoutBox::Element(eb));
    }

    fn finish(mut self) -> (Vec<LayoutBox>, i32) {
        self.flush_owner();
        (self.boxes, self.advance)
    }
}

fn should_break(line_has_content: bool, wrap_enabled: bool, x: i32, word_advance: i32, width: i32) -> bool {
    wrap_enabled && line_has_content && x + word_advance >= width
}

/// Streaming word-wrap flow generator (§4.3, §9)
pub struct WrapFlow<'a> {
    doc: &'a dyn Document,
    shaper: &'a Shaper,
    fonts: &'a dyn FontProvider,
    dpi: Dpi,
    layout_width: i32,
    pos: usize,
    doc_len: usize,
    finished: bool,
    paragraph_begin: bool,
}

impl<'a> WrapFlow<'a> {
    pub fn new(
        doc: &'a dyn Document,
        shaper: &'a Shaper,
        fonts: &'a dyn FontProvider,
        dpi: Dpi,
        layout_width: i32,
        start: usize,
    ) -> Self {
        let doc_len = doc.len();
        WrapFlow {
            doc,
            shaper,
            fonts,
            dpi,
            layout_width,
            pos: start,
            doc_len,
            finished: start > doc_len,
            paragraph_begin: paragraph_begins_at(doc, start),
        }
    }

    /// Advance offset: `(kern, total_advance)` for the whitespace character
    /// at `i`, honoring the tab-stop algorithm (§4.3)
    fn ws_advance(&self, i: usize, x: i32, margin_left: i32) -> i32 {
        let ch = char_at(self.doc, i);
        let base_adv = match self.shaper.slot(i) {
            Some(GlyphSlot::Glyph(g)) => g.advance,
            _ => 0,
        };
        if ch == '\t' {
            let stops = self.doc.tab_stops().value_at(i);
            let target = stops.next_stop_px(self.dpi, x + margin_left);
            (target - margin_left - x).max(base_adv)
        } else {
            self.doc.kerning().value_at(i) + base_adv
        }
    }

    fn finalize(&self, line: &mut Line, x: i32, eol_ws: i32, style_idx: usize) {
        line.width = (x - eol_ws).max(0);
        if line.boxes.is_empty() {
            let font = self.doc.font_runs(self.dpi).value_at(style_idx);
            let (a, d) = self.fonts.metrics(font);
            line.ascent = a;
            line.descent = d;
        } else {
            line.ascent = line.boxes.iter().map(|b| b.ascent()).max().unwrap_or(0);
            line.descent = line.boxes.iter().map(|b| b.descent()).min().unwrap_or(0);
        }
    }
}

impl<'a> Iterator for WrapFlow<'a> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.finished {
            return None;
        }
        if self.doc_len == 0 {
            self.finished = true;
            let (ascent, descent) = self.fonts.metrics(self.fonts.default_font());
            return Some(Line {
                start: 0,
                length: 0,
                boxes: Vec::new(),
                ascent,
                descent,
                width: 0,
                x: 0,
                y: 0,
                margin_left: 0,
                margin_right: 0,
                align: crate::document::HAlign::default(),
                paragraph_begin: true,
                paragraph_end: true,
                vertex_lists: Vec::new(),
            });
        }

        let line_start = self.pos;
        let style_idx = line_start.min(self.doc_len - 1);
        let margin_left_pts = self.doc.margin_left().value_at(style_idx);
        let margin_right_pts = self.doc.margin_right().value_at(style_idx);
        let indent_pts = if self.paragraph_begin {
            self.doc.indent().value_at(style_idx)
        } else {
            0.0
        };
        let margin_left = self.dpi.px(margin_left_pts) + self.dpi.px(indent_pts);
        let margin_right = self.dpi.px(margin_right_pts);
        let align = self.doc.align().value_at(style_idx);
        let wrap_enabled = self.doc.wrap().value_at(style_idx);
        let width = (self.layout_width - margin_left - margin_right).max(0);

        let line_paragraph_begin = self.paragraph_begin;
        let mut line = Line {
            start: line_start,
            length: 0,
            boxes: Vec::new(),
            ascent: 0,
            descent: 0,
            width: 0,
            x: 0,
            y: 0,
            margin_left,
            margin_right,
            align,
            paragraph_begin: line_paragraph_begin,
            paragraph_end: false,
            vertex_lists: Vec::new(),
        };

        let mut x: i32 = 0;
        let mut eol_ws: i32 = 0;
        let mut word = WordBuilder::new();
        let mut word_start = line_start;
        let mut i = line_start;
        // Kerning of the first glyph placed on a line is always suppressed
        // (§4.3 step 2d), mirroring pyglet's `nokern` at the start of each
        // `_flow_glyphs_wrap` line.
        let mut first_glyph = true;

        loop {
            if i >= self.doc_len {
                if !word.is_empty() {
                    if should_break(!line.boxes.is_empty(), wrap_enabled, x, word.advance, width) {
                        self.pos = word_start;
                        line.length = word_start - line_start;
                        line.paragraph_end = false;
                        self.finalize(&mut line, x, eol_ws, style_idx);
                        return Some(line);
                    }
                    let (boxes, adv) = word.finish();
                    line.boxes.extend(boxes);
                    x += adv;
                }
                self.pos = self.doc_len;
                self.finished = true;
                line.length = self.doc_len - line_start;
                line.paragraph_end = true;
                self.finalize(&mut line, x, eol_ws, style_idx);
                return Some(line);
            }

            let ch = char_at(self.doc, i);
            if is_para_sep(ch) || is_line_sep(ch) {
                if should_break(!line.boxes.is_empty(), wrap_enabled, x, word.advance, width) && !word.is_empty() {
                    self.pos = word_start;
                    line.length = word_start - line_start;
                    self.finalize(&mut line, x, eol_ws, style_idx);
                    return Some(line);
                }
                let (boxes, adv) = word.finish();
                line.boxes.extend(boxes);
                x += adv;

                line.length = i + 1 - line_start;
                self.pos = i + 1;
                self.paragraph_begin = is_para_sep(ch);
                line.paragraph_end = is_para_sep(ch);
                self.finalize(&mut line, x, eol_ws, style_idx);
                return Some(line);
            } else if is_breaking_ws(ch) {
                if should_break(!line.boxes.is_empty(), wrap_enabled, x, word.advance, width) && !word.is_empty() {
                    self.pos = word_start;
                    line.length = word_start - line_start;
                    self.finalize(&mut line, x, eol_ws, style_idx);
                    return Some(line);
                }
                let (boxes, adv) = word.finish();
                line.boxes.extend(boxes);
                x += adv;
                word = WordBuilder::new();

                let adv_ws = self.ws_advance(i, x, margin_left);
                if let Some(GlyphSlot::Glyph(g)) = self.shaper.slot(i) {
                    let kern = if first_glyph { 0 } else { adv_ws - g.advance };
                    line.boxes.push(LayoutBox::Glyphs(GlyphBox {
                        owner: g.owner,
                        font: self.doc.font_runs(self.dpi).value_at(i),
                        glyphs: vec![(kern, g.clone())],
                    }));
                    first_glyph = false;
                }
                x += adv_ws;
                eol_ws += adv_ws;

                i += 1;
                word_start = i;
                continue;
            } else if let Some(eid) = self.doc.element_runs().value_at(i) {
                let el = self.doc.element(eid);
                word.push_element(ElementBox {
                    element: eid,
                    ascent: el.ascent(),
                    descent: el.descent(),
                    advance: el.advance(),
                });
                eol_ws = 0;
                i += 1;
                continue;
            } else if let Some(GlyphSlot::Glyph(g)) = self.shaper.slot(i) {
                let kern = if first_glyph { 0 } else { self.doc.kerning().value_at(i) };
                let font = self.doc.font_runs(self.dpi).value_at(i);
                word.push_glyph(g.owner, font, kern, g.clone());
                first_glyph = false;
                eol_ws = 0;
                i += 1;
                continue;
            } else {
                // Unshaped slot (caller forgot to shape this range); skip.
                i += 1;
                continue;
            }
        }
    }
}

/// Single-line flow (§4.3): every character on one [`Line`], merging
/// contiguous same-owner glyphs
pub fn flow_single_line(doc: &dyn Document, shaper: &Shaper, dpi: Dpi, fonts: &dyn FontProvider) -> Line {
    let len = doc.len();
    if len == 0 {
        let (ascent, descent) = fonts.metrics(fonts.default_font());
        return Line {
            start: 0,
            length: 0,
            boxes: Vec::new(),
            ascent,
            descent,
            width: 0,
            x: 0,
            y: 0,
            margin_left: 0,
            margin_right: 0,
            align: crate::document::HAlign::default(),
            paragraph_begin: true,
            paragraph_end: true,
            vertex_lists: Vec::new(),
        };
    }

    let kerning = doc.kerning();
    let element_runs = doc.element_runs();
    let mut boxes = Vec::new();
    for (s, e, owner) in shaper.owner_runs().ranges(0, len) {
        match owner {
            Some(owner) => {
                let font = doc.font_runs(dpi).value_at(s);
                let mut glyphs = Vec::with_capacity(e - s);
                for idx in s..e {
                    if let Some(GlyphSlot::Glyph(g)) = shaper.slot(idx) {
                        glyphs.push((kerning.value_at(idx), g.clone()));
                    }
                }
                boxes.push(LayoutBox::Glyphs(GlyphBox { owner, font, glyphs }));
            }
            None => {
                for idx in s..e {
                    if let Some(eid) = element_runs.value_at(idx) {
                        let el = doc.element(eid);
                        boxes.push(LayoutBox::Element(ElementBox {
                            element: eid,
                            ascent: el.ascent(),
                            descent: el.descent(),
                            advance: el.advance(),
                        }));
                    }
                }
            }
        }
    }

    let mut width: i32 = boxes.iter().map(|b| b.advance()).sum();
    // Right-trim trailing breaking whitespace from the reported width.
    let mut i = len;
    while i > 0 && is_breaking_ws(char_at(doc, i - 1)) {
        if let Some(GlyphSlot::Glyph(g)) = shaper.slot(i - 1) {
            width -= kerning.value_at(i - 1) + g.advance;
        }
        i -= 1;
    }
    width = width.max(0);

    let (ascent, descent) = if boxes.is_empty() {
        let font = doc.font_runs(dpi).value_at(0);
        fonts.metrics(font)
    } else {
        (
            boxes.iter().map(|b| b.ascent()).max().unwrap(),
            boxes.iter().map(|b| b.descent()).min().unwrap(),
        )
    };

    Line {
        start: 0,
        length: len,
        boxes,
        ascent,
        descent,
        width,
        x: 0,
        y: 0,
        margin_left: 0,
        margin_right: 0,
        align: doc.align().value_at(0),
        paragraph_begin: true,
        paragraph_end: true,
        vertex_lists: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{HAlign, PlainDocument};
    use crate::font::TexCoords;
    use crate::runlist::RunSource;

    struct FixedFonts;
    impl FontProvider for FixedFonts {
        fn shape(&self, text: &str, _font: FontHandle) -> crate::error::Result<Vec<Glyph>> {
            Ok(text
                .chars()
                .map(|_| Glyph {
                    ascent: 12,
                    descent: -3,
                    advance: 10,
                    vertices: (0, 0, 10, 12),
                    tex_coords: TexCoords::default(),
                    owner: TextureId(0),
                })
                .collect())
        }
        fn metrics(&self, _font: FontHandle) -> (i32, i32) {
            (12, -3)
        }
        fn default_font(&self) -> FontHandle {
            FontHandle(0)
        }
    }

    fn shaped(doc: &PlainDocument) -> Shaper {
        let mut shaper = Shaper::new();
        shaper.insert(0, doc.len());
        shaper
            .reshape(0, doc.len(), doc, Dpi::default(), &FixedFonts)
            .unwrap();
        shaper
    }

    #[test]
    fn empty_document_yields_one_empty_line() {
        let doc = PlainDocument::new("", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.length, 0);
        assert_eq!(line.ascent, 12);
        assert!(flow.next().is_none());
    }

    #[test]
    fn single_short_line_no_wrap_needed() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.start, 0);
        assert_eq!(line.length, 2);
        assert_eq!(line.width, 20);
        assert!(flow.next().is_none());
    }

    #[test]
    fn forced_wrap_splits_into_two_lines_and_trims_space() {
        // "abcd efgh", each glyph 10px wide; width fits "abcd " (50px) but
        // not "abcd efgh" (90px).
        let doc = PlainDocument::new("abcd efgh", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 60, 0);
        let line0 = flow.next().unwrap();
        assert_eq!((line0.start, line0.length), (0, 5));
        assert_eq!(line0.width, 40); // "abcd" only, trailing space trimmed
        let line1 = flow.next().unwrap();
        assert_eq!((line1.start, line1.length), (5, 4));
        assert_eq!(line1.width, 40);
        assert!(flow.next().is_none());
    }

    #[test]
    fn coverage_property_sums_to_document_length() {
        let doc = PlainDocument::new("the quick brown fox jumps over", FontHandle(0));
        let shaper = shaped(&doc);
        let flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 80, 0);
        let total: usize = flow.map(|l| l.length).sum();
        assert_eq!(total, doc.len());
    }

    #[test]
    fn paragraph_break_marks_begin_and_end() {
        let doc = PlainDocument::new("A\nB", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let l0 = flow.next().unwrap();
        assert!(l0.paragraph_begin && l0.paragraph_end);
        let l1 = flow.next().unwrap();
        assert!(l1.paragraph_begin && l1.paragraph_end);
        assert!(flow.next().is_none());
    }

    #[test]
    fn single_line_merges_contiguous_owner_glyphs() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let shaper = shaped(&doc);
        let line = flow_single_line(&doc, &shaper, Dpi::default(), &FixedFonts);
        assert_eq!(line.boxes.len(), 1);
        assert_eq!(line.width, 20);
    }

    #[test]
    fn no_overflow_single_glyph_wider_than_width_allowed_alone() {
        let doc = PlainDocument::new("a", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 3, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.length, 1);
        assert!(line.width > 3);
    }

    #[test]
    fn align_is_read_from_document() {
        let mut doc = PlainDocument::new("hi", FontHandle(0));
        doc.set_paragraph(0, 2, HAlign::Center, 0.0, (0.0, 0.0, 0.0, 0.0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.align, HAlign::Center);
    }

    #[test]
    fn unwrapped_line_width_excludes_only_trailing_whitespace() {
        // "ab cd", 10px/glyph, width never forces a wrap: the internal space
        // must count toward `width`, only a genuinely trailing run would not.
        let doc = PlainDocument::new("ab cd", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.length, 5);
        assert_eq!(line.width, 50);
        assert!(flow.next().is_none());
    }

    #[test]
    fn trailing_whitespace_run_still_excluded_after_internal_space() {
        // "ab cd  " (two trailing spaces): only the trailing run is trimmed,
        // the internal single space still counts.
        let doc = PlainDocument::new("ab cd  ", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        assert_eq!(line.length, 7);
        assert_eq!(line.width, 50);
    }

    #[test]
    fn first_glyph_of_line_ignores_kerning() {
        // Word-wrap flow (§4.3 step 2d) suppresses the first glyph's
        // kerning on each line; `flow_single_line` has no such step in the
        // pyglet original and is unaffected (not exercised here).
        let mut doc = PlainDocument::new("ab", FontHandle(0));
        doc.set_kerning(0, 2, 5);
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 1000, 0);
        let line = flow.next().unwrap();
        // Only the second glyph's kerning (5) should contribute; the first
        // glyph's is suppressed regardless of what the document sets.
        assert_eq!(line.width, 25);
        assert!(flow.next().is_none());
    }

    #[test]
    fn wrapped_first_glyph_of_continuation_line_ignores_kerning() {
        // "ab cd", kerning 5 on every character. The second line ("cd")
        // starts fresh, so its first glyph's kerning must be suppressed
        // even though the document assigns it a non-zero value.
        let mut doc = PlainDocument::new("ab cd", FontHandle(0));
        doc.set_kerning(0, 5, 5);
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 35, 0);
        let line0 = flow.next().unwrap();
        assert_eq!((line0.start, line0.length), (0, 3));
        // "a"(10) + kern+b(5+10) = 25
        assert_eq!(line0.width, 25);
        let line1 = flow.next().unwrap();
        assert_eq!((line1.start, line1.length), (3, 2));
        // first glyph 'c' on the new line: kerning suppressed, then 'd' keeps it
        assert_eq!(line1.width, 10 + 5 + 10);
        assert!(flow.next().is_none());
    }

    #[test]
    fn word_exactly_filling_width_still_wraps() {
        // "a bb": after "a " (20px) the pending word "bb" (20px) lands
        // exactly on the boundary (20 + 20 == 40). The inclusive break test
        // (§4.3 step 2, `x + k + g.advance >= width`) must still wrap it
        // rather than let it sit flush against the edge.
        let doc = PlainDocument::new("a bb", FontHandle(0));
        let shaper = shaped(&doc);
        let mut flow = WrapFlow::new(&doc, &shaper, &FixedFonts, Dpi::default(), 40, 0);
        let line0 = flow.next().unwrap();
        assert_eq!((line0.start, line0.length), (0, 2));
        let line1 = flow.next().unwrap();
        assert_eq!((line1.start, line1.length), (2, 2));
        assert!(flow.next().is_none());
    }
}
