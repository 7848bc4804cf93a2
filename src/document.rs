// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The styled-document external contract (§1, §3, §6)
//!
//! Document parsing and the public rich-text document API are out of scope
//! for this crate; what follows is the minimal surface the layout engine
//! needs to drive shaping, flow and rendering, plus [`PlainDocument`], a
//! reference implementation used by this crate's own tests (the same role
//! `format::plain` plays for the teacher crate).

use crate::boxes::{ElementId, InlineElement};
use crate::font::FontHandle;
use crate::runlist::{RunList, RunSource};
use crate::selection::Color;
use crate::Dpi;

bitflags::bitflags! {
    /// Which named style attributes (§6) a `StyledText` event touched
    ///
    /// `FONT` covers `font_name`/`font_size`/`bold`/`italic`: any of these
    /// invalidate shaping, unlike the others which only affect rendering or
    /// flow geometry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StyleAttrs: u32 {
        const FONT = 1 << 0;
        const UNDERLINE = 1 << 1;
        const KERNING = 1 << 2;
        const BASELINE = 1 << 3;
        const COLOR = 1 << 4;
        const BACKGROUND = 1 << 5;
        const ALIGN = 1 << 6;
        const INDENT = 1 << 7;
        const LEADING = 1 << 8;
        const LINE_SPACING = 1 << 9;
        const MARGINS = 1 << 10;
        const TAB_STOPS = 1 << 11;
        const WRAP = 1 << 12;
        const ELEMENTS = 1 << 13;
    }
}

impl StyleAttrs {
    /// True if re-shaping is required (as opposed to just reflow/restyle)
    pub fn affects_shaping(self) -> bool {
        self.intersects(StyleAttrs::FONT | StyleAttrs::ELEMENTS)
    }

    /// True if only colors/decoration are affected (no flow change)
    pub fn style_only(self) -> bool {
        self.intersects(StyleAttrs::UNDERLINE | StyleAttrs::COLOR | StyleAttrs::BACKGROUND)
            && !self.intersects(
                StyleAttrs::FONT
                    | StyleAttrs::KERNING
                    | StyleAttrs::BASELINE
                    | StyleAttrs::ALIGN
                    | StyleAttrs::INDENT
                    | StyleAttrs::LEADING
                    | StyleAttrs::LINE_SPACING
                    | StyleAttrs::MARGINS
                    | StyleAttrs::TAB_STOPS
                    | StyleAttrs::WRAP
                    | StyleAttrs::ELEMENTS,
            )
    }
}

/// A single notification emitted by a [`Document`]
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentEvent {
    InsertedText { start: usize, len: usize },
    DeletedText { start: usize, end: usize },
    StyledText { start: usize, end: usize, attrs: StyleAttrs },
}

/// Paragraph alignment (§6 `align`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Sorted list of tab stops, in points from the line's left margin
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabStops(pub Vec<f32>);

impl TabStops {
    /// The next stop (in pixels, already converted) strictly greater than
    /// `from_px`; falls back to the next 50px multiple (§4.3, confirmed
    /// against the pyglet original, SPEC_FULL.md §D.1)
    pub fn next_stop_px(&self, dpi: Dpi, from_px: i32) -> i32 {
        for &pt in &self.0 {
            let px = dpi.px(pt);
            if px > from_px {
                return px;
            }
        }
        ((from_px / 50) + 1) * 50
    }
}

/// The styled-document contract consumed by the layout engine
///
/// Each per-character attribute is exposed as a [`RunSource`] so the flow,
/// shaper and vertex-build code can all share the same composable iterator
/// machinery ([`crate::runlist`]) regardless of which concrete document
/// implementation backs it.
pub trait Document {
    /// Number of characters
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A contiguous slice of the document's text, by character index
    fn slice(&self, start: usize, end: usize) -> &str;

    /// Resolved font at each character, for the given screen resolution
    fn font_runs(&self, dpi: Dpi) -> &dyn RunSource<FontHandle>;

    /// Inline-element handle at each character (`None` for ordinary text)
    fn element_runs(&self) -> &dyn RunSource<Option<ElementId>>;

    fn element(&self, id: ElementId) -> &dyn InlineElement;
    fn element_mut(&mut self, id: ElementId) -> &mut dyn InlineElement;

    fn underline(&self) -> &dyn RunSource<Option<Color>>;
    fn kerning(&self) -> &dyn RunSource<i32>;
    fn baseline(&self) -> &dyn RunSource<i32>;
    fn color(&self) -> &dyn RunSource<Color>;
    fn background_color(&self) -> &dyn RunSource<Option<Color>>;

    fn align(&self) -> &dyn RunSource<HAlign>;
    fn indent(&self) -> &dyn RunSource<f32>;
    fn leading(&self) -> &dyn RunSource<f32>;
    fn line_spacing(&self) -> &dyn RunSource<Option<f32>>;
    fn margin_left(&self) -> &dyn RunSource<f32>;
    fn margin_right(&self) -> &dyn RunSource<f32>;
    fn margin_top(&self) -> &dyn RunSource<f32>;
    fn margin_bottom(&self) -> &dyn RunSource<f32>;
    fn tab_stops(&self) -> &dyn RunSource<TabStops>;
    fn wrap(&self) -> &dyn RunSource<bool>;
}

/// A minimal, entirely in-memory [`Document`] used by this crate's own
/// tests, analogous to the teacher's `format::plain`
///
/// Paragraph attributes (align/indent/margins/...) are still stored
/// per-character (as the trait requires) since a single document has no
/// separate paragraph table; all per-character values within one paragraph
/// are expected to be equal, which `set_paragraph` enforces.
pub struct PlainDocument {
    text: String,
    len: usize,
    font: RunList<FontHandle>,
    elements: RunList<Option<ElementId>>,
    element_store: std::collections::HashMap<ElementId, Box<dyn InlineElement>>,
    underline: RunList<Option<Color>>,
    kerning: RunList<i32>,
    baseline: RunList<i32>,
    color: RunList<Color>,
    background_color: RunList<Option<Color>>,
    align: RunList<HAlign>,
    indent: RunList<f32>,
    leading: RunList<f32>,
    line_spacing: RunList<Option<f32>>,
    margin_left: RunList<f32>,
    margin_right: RunList<f32>,
    margin_top: RunList<f32>,
    margin_bottom: RunList<f32>,
    tab_stops: RunList<TabStops>,
    wrap: RunList<bool>,
}

impl PlainDocument {
    pub fn new(text: impl Into<String>, font: FontHandle) -> Self {
        let text = text.into();
        let len = text.chars().count();
        PlainDocument {
            text,
            len,
            font: RunList::new(len, font),
            elements: RunList::new(len, None),
            element_store: std::collections::HashMap::new(),
            underline: RunList::new(len, None),
            kerning: RunList::new(len, 0),
            baseline: RunList::new(len, 0),
            color: RunList::new(len, Color::BLACK),
            background_color: RunList::new(len, None),
            align: RunList::new(len, HAlign::Left),
            indent: RunList::new(len, 0.0),
            leading: RunList::new(len, 0.0),
            line_spacing: RunList::new(len, None),
            margin_left: RunList::new(len, 0.0),
            margin_right: RunList::new(len, 0.0),
            margin_top: RunList::new(len, 0.0),
            margin_bottom: RunList::new(len, 0.0),
            tab_stops: RunList::new(len, TabStops::default()),
            wrap: RunList::new(len, true),
        }
    }

    /// Insert `text` at character index `pos`, shifting later runs
    pub fn insert(&mut self, pos: usize, text: &str) -> DocumentEvent {
        let count = text.chars().count();
        self.text.insert_str(char_byte_offset(&self.text, pos), text);
        self.len += count;
        self.font.insert(pos, count);
        self.elements.insert(pos, count);
        self.underline.insert(pos, count);
        self.kerning.insert(pos, count);
        self.baseline.insert(pos, count);
        self.color.insert(pos, count);
        self.background_color.insert(pos, count);
        self.align.insert(pos, count);
        self.indent.insert(pos, count);
        self.leading.insert(pos, count);
        self.line_spacing.insert(pos, count);
        self.margin_left.insert(pos, count);
        self.margin_right.insert(pos, count);
        self.margin_top.insert(pos, count);
        self.margin_bottom.insert(pos, count);
        self.tab_stops.insert(pos, count);
        self.wrap.insert(pos, count);
        DocumentEvent::InsertedText { start: pos, len: count }
    }

    /// Delete characters `[start, end)`
    pub fn delete(&mut self, start: usize, end: usize) -> DocumentEvent {
        let bs = char_byte_offset(&self.text, start);
        let be = char_byte_offset(&self.text, end);
        self.text.replace_range(bs..be, "");
        self.len -= end - start;
        self.font.delete(start, end);
        self.elements.delete(start, end);
        self.underline.delete(start, end);
        self.kerning.delete(start, end);
        self.baseline.delete(start, end);
        self.color.delete(start, end);
        self.background_color.delete(start, end);
        self.align.delete(start, end);
        self.indent.delete(start, end);
        self.leading.delete(start, end);
        self.line_spacing.delete(start, end);
        self.margin_left.delete(start, end);
        self.margin_right.delete(start, end);
        self.margin_top.delete(start, end);
        self.margin_bottom.delete(start, end);
        self.tab_stops.delete(start, end);
        self.wrap.delete(start, end);
        DocumentEvent::DeletedText { start, end }
    }

    pub fn set_color(&mut self, start: usize, end: usize, color: Color) -> DocumentEvent {
        self.color.set_run(start, end, color);
        DocumentEvent::StyledText { start, end, attrs: StyleAttrs::COLOR }
    }

    pub fn set_background(&mut self, start: usize, end: usize, color: Option<Color>) -> DocumentEvent {
        self.background_color.set_run(start, end, color);
        DocumentEvent::StyledText { start, end, attrs: StyleAttrs::BACKGROUND }
    }

    pub fn set_font(&mut self, start: usize, end: usize, font: FontHandle) -> DocumentEvent {
        self.font.set_run(start, end, font);
        DocumentEvent::StyledText { start, end, attrs: StyleAttrs::FONT }
    }

    pub fn set_kerning(&mut self, start: usize, end: usize, kerning: i32) -> DocumentEvent {
        self.kerning.set_run(start, end, kerning);
        DocumentEvent::StyledText { start, end, attrs: StyleAttrs::KERNING }
    }

    pub fn set_paragraph(
        &mut self,
        start: usize,
        end: usize,
        align: HAlign,
        indent: f32,
        margins: (f32, f32, f32, f32),
    ) -> DocumentEvent {
        self.align.set_run(start, end, align);
        self.indent.set_run(start, end, indent);
        self.margin_left.set_run(start, end, margins.0);
        self.margin_right.set_run(start, end, margins.1);
        self.margin_top.set_run(start, end, margins.2);
        self.margin_bottom.set_run(start, end, margins.3);
        DocumentEvent::StyledText {
            start,
            end,
            attrs: StyleAttrs::ALIGN | StyleAttrs::INDENT | StyleAttrs::MARGINS,
        }
    }

    pub fn set_element(&mut self, pos: usize, element: Box<dyn InlineElement>) -> DocumentEvent {
        let id = ElementId(pos as u32);
        self.element_store.insert(id, element);
        self.elements.set_run(pos, pos + 1, Some(id));
        DocumentEvent::StyledText { start: pos, end: pos + 1, attrs: StyleAttrs::ELEMENTS }
    }
}

fn char_byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

impl Document for PlainDocument {
    fn len(&self) -> usize {
        self.len
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        let bs = char_byte_offset(&self.text, start);
        let be = char_byte_offset(&self.text, end);
        &self.text[bs..be]
    }

    fn font_runs(&self, _dpi: Dpi) -> &dyn RunSource<FontHandle> {
        &self.font
    }

    fn element_runs(&self) -> &dyn RunSource<Option<ElementId>> {
        &self.elements
    }

    fn element(&self, id: ElementId) -> &dyn InlineElement {
        self.element_store.get(&id).expect("unknown ElementId").as_ref()
    }

    fn element_mut(&mut self, id: ElementId) -> &mut dyn InlineElement {
        self.element_store.get_mut(&id).expect("unknown ElementId").as_mut()
    }

    fn underline(&self) -> &dyn RunSource<Option<Color>> {
        &self.underline
    }
    fn kerning(&self) -> &dyn RunSource<i32> {
        &self.kerning
    }
    fn baseline(&self) -> &dyn RunSource<i32> {
        &self.baseline
    }
    fn color(&self) -> &dyn RunSource<Color> {
        &self.color
    }
    fn background_color(&self) -> &dyn RunSource<Option<Color>> {
        &self.background_color
    }
    fn align(&self) -> &dyn RunSource<HAlign> {
        &self.align
    }
    fn indent(&self) -> &dyn RunSource<f32> {
        &self.indent
    }
    fn leading(&self) -> &dyn RunSource<f32> {
        &self.leading
    }
    fn line_spacing(&self) -> &dyn RunSource<Option<f32>> {
        &self.line_spacing
    }
    fn margin_left(&self) -> &dyn RunSource<f32> {
        &self.margin_left
    }
    fn margin_right(&self) -> &dyn RunSource<f32> {
        &self.margin_right
    }
    fn margin_top(&self) -> &dyn RunSource<f32> {
        &self.margin_top
    }
    fn margin_bottom(&self) -> &dyn RunSource<f32> {
        &self.margin_bottom
    }
    fn tab_stops(&self) -> &dyn RunSource<TabStops> {
        &self.tab_stops
    }
    fn wrap(&self) -> &dyn RunSource<bool> {
        &self.wrap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_delete_round_trip_text() {
        let mut doc = PlainDocument::new("hello", FontHandle(0));
        doc.insert(5, " world");
        assert_eq!(doc.slice(0, doc.len()), "hello world");
        doc.delete(5, 11);
        assert_eq!(doc.slice(0, doc.len()), "hello");
    }

    #[test]
    fn tab_stops_fallback_to_50px() {
        let stops = TabStops(vec![10.0]);
        let dpi = Dpi(72.0); // 1px per point
        assert_eq!(stops.next_stop_px(dpi, 0), 10);
        assert_eq!(stops.next_stop_px(dpi, 10), 50);
        assert_eq!(stops.next_stop_px(dpi, 49), 50);
        assert_eq!(stops.next_stop_px(dpi, 50), 100);
    }
}
