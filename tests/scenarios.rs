// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The six concrete scenarios (§8)

mod support;

use std::cell::RefCell;
use std::rc::Rc;

use rich_text_layout::document::{HAlign, PlainDocument};
use rich_text_layout::font::FontHandle;
use rich_text_layout::layout::{IncrementalLayout, StaticLayout};
use rich_text_layout::Dpi;

use support::{batch_and_group, FixedFonts};

/// A: empty document lays out as one empty line, ready to query immediately.
#[test]
fn scenario_a_empty_document() {
    let doc = PlainDocument::new("", FontHandle(0));
    let (batch, group) = batch_and_group();
    let layout =
        StaticLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();

    assert_eq!(layout.get_line_count(), 1);
    assert_eq!(layout.content_width(), 0);
    assert_eq!(layout.content_height(), 15); // ascent 12 + |descent| 3
    assert_eq!(layout.position_at_point(0, 0), 0);
}

/// B: a short single line never wraps; `content_width` sums glyph advances
/// and `point_at_position` lands exactly on the first glyph's advance.
#[test]
fn scenario_b_single_unwrapped_line() {
    let doc = PlainDocument::new("hi", FontHandle(0));
    let (batch, group) = batch_and_group();
    let layout =
        StaticLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();

    assert_eq!(layout.get_line_count(), 1);
    assert_eq!(layout.content_width(), 20); // advance(h) + advance(i)
    let (x, _y) = layout.point_at_position(1, Some(0));
    assert_eq!(x, 10); // advance(h)
}

/// C: a width that fits "abcd " but not "abcd efgh" forces a break after the
/// word, trimming the trailing space from the first line (§4.3's right-trim
/// property, grounded in flow.rs's own forced-wrap test).
#[test]
fn scenario_c_forced_wrap_trims_trailing_space() {
    let doc = PlainDocument::new("abcd efgh", FontHandle(0));
    let (batch, group) = batch_and_group();
    let layout =
        StaticLayout::new(doc, 60, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();

    assert_eq!(layout.get_line_count(), 2);
    assert_eq!(layout.position_from_line(0), 0);
    assert_eq!(layout.position_from_line(1), 5);
    assert_eq!(layout.content_width(), 40); // both lines are 40px wide
}

/// D: per-paragraph indent and margin-top shift both lines' left edge and
/// open a vertical gap between paragraphs (values hand-traced through
/// vertical::place at 72dpi, i.e. 1px per point, for exact arithmetic).
#[test]
fn scenario_d_paragraph_indent_and_margins() {
    let mut doc = PlainDocument::new("A\nB", FontHandle(0));
    doc.set_paragraph(0, 3, HAlign::Left, 20.0, (0.0, 0.0, 10.0, 0.0));
    let (batch, group) = batch_and_group();
    let layout =
        StaticLayout::new(doc, 1000, 200, true, Dpi(72.0), batch, group, &FixedFonts).unwrap();

    assert_eq!(layout.get_line_count(), 2);
    let (x0, y0) = layout.point_at_position(0, Some(0));
    let (x1, y1) = layout.point_at_position(2, Some(1));
    assert_eq!(x0, 20);
    assert_eq!(x1, 20);
    // gap = margin_bottom(para0, 0) + margin_top(para1, 10) + descent/ascent
    // straddling the baseline, i.e. the two paragraphs never overlap.
    assert!(y1 > y0);
    assert_eq!(y1 - y0, 25);
}

/// E: an incremental insert invalidates only the touched glyphs; a later
/// `update()` reflows and fires the callback exactly once.
#[test]
fn scenario_e_incremental_insert_reflows_once() {
    let doc = PlainDocument::new("abcd efgh", FontHandle(0));
    let (batch, group) = batch_and_group();
    let mut layout =
        IncrementalLayout::new(doc, 60, 200, true, Dpi::default(), batch, group, &FixedFonts)
            .unwrap();
    assert_eq!(layout.get_line_count(), 2);

    let fire_count = Rc::new(RefCell::new(0u32));
    let counter = fire_count.clone();
    layout.on_layout_update(move || *counter.borrow_mut() += 1);

    layout.document_mut().insert(0, "X");
    layout.insert_text(0, 1);
    let fired = layout.update(&FixedFonts).unwrap();

    assert!(fired);
    assert_eq!(*fire_count.borrow(), 1);
    assert_eq!(layout.get_line_count(), 2);
    assert_eq!(layout.content_width(), 50); // "Xabcd " (trimmed) is now widest
}

/// F: a selection-only change never touches shape/flow/lines and never fires
/// `on_layout_update`, matching §4.5's style-only classification.
#[test]
fn scenario_f_selection_only_change_is_silent() {
    let doc = PlainDocument::new("hi", FontHandle(0));
    let (batch, group) = batch_and_group();
    let mut layout =
        IncrementalLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts)
            .unwrap();

    let fire_count = Rc::new(RefCell::new(0u32));
    let counter = fire_count.clone();
    layout.on_layout_update(move || *counter.borrow_mut() += 1);

    layout.set_selection(0, 1);
    let fired = layout.update(&FixedFonts).unwrap();

    assert!(!fired);
    assert_eq!(*fire_count.borrow(), 0);
    assert_eq!(layout.selection_range(), (0, 1));
}
