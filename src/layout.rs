// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! The three layout classes and the update cycle that drives them (§6, §4.8)
//!
//! [`StaticLayout`], [`ScrollableLayout`] and [`IncrementalLayout`] all wrap
//! the same [`Core`]: a document, a [`Shaper`] cache, a flowed [`Line`] list,
//! the six [`InvalidRange`]s of §4.5, a [`Selection`] and the shared
//! [`Batch`]/[`Group`] the vertex builder deposits into. They differ only in
//! *when* `Core`'s five-pass pipeline runs:
//!
//! - [`StaticLayout`] forces a full re-layout on every mutation (no viewport).
//! - [`ScrollableLayout`] does the same, plus exposes a scroll translation
//!   and scissor rectangle for the caller's renderer to clip against (§9's
//!   `ScrollableTextLayoutGroup`); it does not cull offscreen lines.
//! - [`IncrementalLayout`] instead leaves mutations as O(1) `InvalidRange`
//!   updates and only runs the pipeline when [`IncrementalLayout::update`]
//!   is called (or a `begin_update`/`end_update` bracket closes), additionally
//!   culling vertex data for lines that have scrolled out of view (§4.7).
//!
//! Construction additionally takes a [`FontProvider`] (unlike the bare `(document,
//! width, height, multiline, dpi, batch, group)` list in spec.md §6): the
//! spec never explains how a `FontProvider` reaches the engine, and an initial
//! layout must exist as soon as a layout is constructed (scenario A's empty
//! document already has one line), so we thread it through every call that
//! can trigger shaping, construction included — see DESIGN.md.

use std::cell::RefCell;
use std::rc::Rc;

use crate::batch::{Batch, Group, VertexListId};
use crate::document::{Document, StyleAttrs};
use crate::error::Result;
use crate::flow::{flow_single_line, WrapFlow};
use crate::font::FontProvider;
use crate::invalid::InvalidRange;
use crate::line::Line;
use crate::query;
use crate::runlist::OverriddenRunIterator;
use crate::selection::Selection;
use crate::shaper::Shaper;
use crate::vertical;
use crate::vertex;
use crate::viewport::{self, VisibleRange};
use crate::Dpi;

/// Horizontal anchor of the layout's `(x, y)` point within its own content
/// box (§9/D.5; distinct from the per-paragraph [`HAlign`] style attribute)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Halign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of the layout's `(x, y)` point (§9/D.5)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Valign {
    #[default]
    Top,
    Baseline,
    Center,
    Bottom,
}

/// Best-effort shift of already-flowed line boundaries for a document
/// insertion, so the subsequent reflow pass compares against correctly
/// positioned (if possibly stale-content) lines when checking convergence
///
/// Lines entirely before or after the edit point are shifted exactly; a line
/// straddling the edit just grows, since reflow always regenerates at least
/// that line.
fn shift_lines_insert(lines: &mut [Line], pos: usize, len: usize) {
    if len == 0 {
        return;
    }
    for line in lines.iter_mut() {
        if line.start >= pos {
            line.start += len;
        } else if line.start + line.length > pos {
            line.length += len;
        }
    }
}

/// The deletion counterpart of [`shift_lines_insert`]
fn shift_lines_delete(lines: &mut [Line], start: usize, end: usize) {
    if end <= start {
        return;
    }
    let count = end - start;
    for line in lines.iter_mut() {
        if line.start >= end {
            line.start -= count;
        } else if line.start >= start {
            let eaten = (line.start + line.length).saturating_sub(end).min(line.length);
            line.start = start;
            line.length = line.length.saturating_sub(count).max(eaten);
        } else if line.start + line.length > start {
            let overlap = (line.start + line.length - start).min(count);
            line.length -= overlap;
        }
    }
}

/// Convert a `[start, end)` range of character positions into the `[lo, hi)`
/// range of line indices it overlaps
fn line_index_range(lines: &[Line], start: usize, end: usize) -> (usize, usize) {
    let lo = lines.partition_point(|l| l.start + l.length <= start);
    let hi = lines.partition_point(|l| l.start < end).max(lo);
    (lo.min(lines.len()), hi.min(lines.len()))
}

/// Shared state and update pipeline for all three layout classes (§4.8)
struct Core<D: Document> {
    document: D,
    batch: Rc<RefCell<Batch>>,
    group: Rc<Group>,
    shaper: Shaper,
    lines: Vec<Line>,
    dpi: Dpi,
    width: i32,
    height: i32,
    multiline: bool,
    x: i32,
    y: i32,
    halign: Halign,
    valign: Valign,
    view_x: i32,
    view_y: i32,
    selection: Selection,
    content_width: i32,
    content_height: i32,
    visible: VisibleRange,
    track_visibility: bool,
    invalid_glyphs: InvalidRange,
    invalid_flow: InvalidRange,
    invalid_lines: InvalidRange,
    invalid_style: InvalidRange,
    invalid_vertex_lines: InvalidRange,
    /// Set by [`StaticLayout`]/[`ScrollableLayout`] mutators to force a full
    /// re-layout next `run_update`, bypassing the `InvalidRange`s entirely
    force: bool,
    update_depth: u32,
    on_layout_update: Option<Box<dyn FnMut()>>,
}

impl<D: Document> Core<D> {
    fn new(
        document: D,
        width: i32,
        height: i32,
        multiline: bool,
        dpi: Dpi,
        batch: Rc<RefCell<Batch>>,
        group: Rc<Group>,
        track_visibility: bool,
        fonts: &dyn FontProvider,
    ) -> Result<Self> {
        let len = document.len();
        let mut core = Core {
            document,
            batch,
            group,
            shaper: Shaper::new(),
            lines: Vec::new(),
            dpi,
            width,
            height,
            multiline,
            x: 0,
            y: 0,
            halign: Halign::default(),
            valign: Valign::default(),
            view_x: 0,
            view_y: 0,
            selection: Selection::default(),
            content_width: 0,
            content_height: 0,
            visible: VisibleRange::default(),
            track_visibility,
            invalid_glyphs: InvalidRange::default(),
            invalid_flow: InvalidRange::default(),
            invalid_lines: InvalidRange::default(),
            invalid_style: InvalidRange::default(),
            invalid_vertex_lines: InvalidRange::default(),
            force: true,
            update_depth: 0,
            on_layout_update: None,
        };
        core.shaper.insert(0, len);
        core.run_update(fonts)?;
        Ok(core)
    }

    fn set_on_layout_update(&mut self, cb: Box<dyn FnMut()>) {
        self.on_layout_update = Some(cb);
    }

    // --- document edit notifications (§4.5) -----------------------------

    fn on_insert(&mut self, pos: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.shaper.insert(pos, len);
        shift_lines_insert(&mut self.lines, pos, len);
        self.invalid_glyphs.insert(pos, len);
        self.invalid_flow.insert(pos, len);
        self.invalid_lines.insert(pos, len);
        self.invalid_style.insert(pos, len);
    }

    fn on_delete(&mut self, start: usize, end: usize) {
        if end <= start {
            return;
        }
        self.shaper.delete(start, end);
        shift_lines_delete(&mut self.lines, start, end);
        self.invalid_glyphs.delete(start, end);
        self.invalid_flow.delete(start, end);
        self.invalid_lines.delete(start, end);
        self.invalid_style.delete(start, end);
    }

    fn on_styled(&mut self, start: usize, end: usize, attrs: StyleAttrs) {
        if end <= start {
            return;
        }
        if attrs.affects_shaping() {
            self.invalid_glyphs.invalidate(start, end);
        } else if attrs.intersects(
            StyleAttrs::ALIGN
                | StyleAttrs::INDENT
                | StyleAttrs::MARGINS
                | StyleAttrs::WRAP
                | StyleAttrs::TAB_STOPS
                | StyleAttrs::KERNING,
        ) {
            self.invalid_flow.invalidate(start, end);
        } else if attrs.intersects(StyleAttrs::LEADING | StyleAttrs::LINE_SPACING) {
            self.invalid_lines.invalidate(start, end);
        } else {
            // UNDERLINE, COLOR, BACKGROUND, BASELINE: vertex-only, no flow or
            // vertical-placement work, so no pass will derive the affected
            // *line* range for us — compute it here.
            self.invalid_style.invalidate(start, end);
            let (lo, hi) = line_index_range(&self.lines, start, end);
            self.invalid_vertex_lines.invalidate(lo, hi);
        }
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.document.len();
        for (s, e) in self.selection.set(start, end, len) {
            self.invalid_style.invalidate(s, e);
            let (lo, hi) = line_index_range(&self.lines, s, e);
            self.invalid_vertex_lines.invalidate(lo, hi);
        }
    }

    // --- the five-pass update cycle (§4.8) -------------------------------

    fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    fn end_update(&mut self, fonts: &dyn FontProvider) -> Result<bool> {
        if self.update_depth > 0 {
            self.update_depth -= 1;
        }
        if self.update_depth == 0 {
            self.run_update(fonts)
        } else {
            Ok(false)
        }
    }

    fn update(&mut self, fonts: &dyn FontProvider) -> Result<bool> {
        if self.update_depth > 0 {
            return Ok(false);
        }
        self.run_update(fonts)
    }

    /// Re-shape `[s, e)`, rewriting the owning `owner_runs` segment, and
    /// cascade the same span onto `invalid_flow` (§4.8 pass 1)
    fn run_update(&mut self, fonts: &dyn FontProvider) -> Result<bool> {
        let force = std::mem::take(&mut self.force);
        let doc_len = self.document.len();
        let mut work_done = false;

        let glyph_span = if force {
            Some((0, doc_len))
        } else {
            self.invalid_glyphs.range()
        };
        if let Some((s, e)) = glyph_span {
            self.shaper.reshape(s, e, &self.document, self.dpi, fonts)?;
            if !force {
                self.invalid_glyphs.validate();
            }
            self.invalid_flow.invalidate(s, e);
            work_done = true;
        }

        let flow_span = if force {
            Some((0, doc_len))
        } else {
            self.invalid_flow.range()
        };
        if let Some((s, e)) = flow_span {
            let (lo, hi) = self.reflow(fonts, s, e);
            if !force {
                self.invalid_flow.validate();
            }
            self.invalid_lines.invalidate(
                self.lines.get(lo).map_or(doc_len, |l| l.start),
                self.lines.get(hi.saturating_sub(1)).map_or(doc_len, |l| l.start + l.length),
            );
            self.invalid_vertex_lines.invalidate(lo, self.lines.len());
            work_done = true;
        }

        let lines_span = if force {
            Some((0usize, self.lines.len()))
        } else {
            self.invalid_lines.range().map(|(s, e)| line_index_range(&self.lines, s, e))
        };
        if let Some((lo, hi)) = lines_span {
            let res = vertical::place(&mut self.lines, &self.document, self.dpi, self.width.max(0), lo, hi);
            if !force {
                self.invalid_lines.validate();
            }
            if let Some(h) = res.content_height {
                self.content_height = h;
            }
            self.content_width = vertical::content_width(&self.lines);
            work_done = true;
        }

        if self.track_visibility {
            self.view_y = viewport::clamp_view_y(self.view_y, self.content_height, self.height);
            self.view_x = viewport::clamp_view_x(self.view_x, self.content_width, self.width);
            let mut batch = self.batch.borrow_mut();
            self.visible = viewport::update_visible_lines(
                &mut self.lines,
                self.view_y,
                self.height,
                self.visible,
                &mut batch,
                &mut self.document,
                &mut self.invalid_vertex_lines,
            );
        }

        self.rebuild_vertex_lines();

        if work_done {
            if let Some(cb) = self.on_layout_update.as_mut() {
                cb();
            }
        }
        Ok(work_done)
    }

    /// §4.8 pass 2: regenerate lines from the start of the line covering
    /// `inv_start` until newly produced lines converge with the untouched
    /// tail (same start, past `inv_end`), or the document ends
    ///
    /// Returns the `[lo, hi)` index range of lines that were replaced.
    fn reflow(&mut self, fonts: &dyn FontProvider, inv_start: usize, inv_end: usize) -> (usize, usize) {
        let doc_len = self.document.len();
        let idx = self.lines.partition_point(|l| l.start < inv_start);
        let gen_from = self
            .lines
            .get(idx)
            .map(|l| l.start.min(inv_start))
            .unwrap_or(inv_start)
            .min(doc_len);

        let mut tail: Vec<Line> = self.lines.split_off(idx.min(self.lines.len()));
        let mut new_lines: Vec<Line> = Vec::new();

        if !self.multiline {
            new_lines.push(flow_single_line(&self.document, &self.shaper, self.dpi, fonts));
            let mut batch = self.batch.borrow_mut();
            for mut t in tail.drain(..) {
                t.delete(&mut batch, &mut self.document);
            }
        } else {
            let mut gen = WrapFlow::new(&self.document, &self.shaper, fonts, self.dpi, self.width.max(0), gen_from);
            loop {
                let Some(line) = gen.next() else { break };
                let next_start = line.start + line.length;
                let converges = tail.first().is_some_and(|t| t.start == next_start) && next_start > inv_end;
                new_lines.push(line);
                if converges || next_start >= doc_len {
                    break;
                }
            }

            let reuse_from = new_lines
                .last()
                .and_then(|last| tail.iter().position(|t| t.start == last.start + last.length));
            let mut batch = self.batch.borrow_mut();
            match reuse_from {
                Some(pos) => {
                    for mut t in tail.drain(..pos) {
                        t.delete(&mut batch, &mut self.document);
                    }
                    new_lines.extend(tail);
                }
                None => {
                    for mut t in tail.drain(..) {
                        t.delete(&mut batch, &mut self.document);
                    }
                }
            }
        }

        let lo = idx;
        let hi = idx + new_lines.len();
        self.lines.extend(new_lines);
        (lo, hi)
    }

    /// §4.8 pass 5: rebuild vertex lists for `invalid_vertex_lines ∩`
    /// (the visible window, for layouts that track one; otherwise all lines)
    ///
    /// Vertex positions are baked in anchor-local space, never including the
    /// current scroll offset: a pure scroll is just a `view_x`/`view_y`
    /// change plus the `translate()` accessor the caller applies at draw
    /// time (SPEC_FULL §D.4), and must never force a rebuild here.
    fn rebuild_vertex_lines(&mut self) {
        let Some((vs, ve)) = self.invalid_vertex_lines.validate() else {
            return;
        };
        let (lo, hi) = if self.track_visibility {
            (vs.max(self.visible.start), ve.min(self.visible.end))
        } else {
            (vs, ve)
        };
        let hi = hi.min(self.lines.len());
        if lo >= hi {
            return;
        }

        let (ox, oy) = self.anchor_origin();
        let (sel_s, sel_e) = self.selection.range();
        let mut placements = Vec::new();
        {
            let color_src = OverriddenRunIterator::new(self.document.color(), sel_s, sel_e, self.selection.foreground);
            let bg_src = OverriddenRunIterator::new(
                self.document.background_color(),
                sel_s,
                sel_e,
                Some(self.selection.background),
            );
            let mut batch = self.batch.borrow_mut();
            for i in lo..hi {
                let old_ids: Vec<VertexListId> = std::mem::take(&mut self.lines[i].vertex_lists);
                for id in old_ids {
                    batch.delete(id);
                }
                let (ids, places) = vertex::build_line(
                    &self.lines[i],
                    ox,
                    oy,
                    &self.document,
                    &color_src,
                    &bg_src,
                    &self.group,
                    &mut batch,
                );
                self.lines[i].vertex_lists = ids;
                placements.extend(places);
            }
        }
        for (eid, x, y) in placements {
            self.document.element_mut(eid).place(x, y);
        }
    }

    // --- anchor / scroll geometry (SPEC_FULL §D.5) -----------------------

    fn anchor_origin(&self) -> (i32, i32) {
        let width = if self.multiline { self.width } else { self.content_width };
        let ox = match self.halign {
            Halign::Left => self.x,
            Halign::Center => self.x - width / 2,
            Halign::Right => self.x - width,
        };
        let height = self.content_height.min(self.height.max(0));
        let oy = match self.valign {
            Valign::Top => self.y,
            Valign::Baseline => self.y + self.lines.first().map_or(0, |l| l.ascent),
            Valign::Bottom => self.y + self.height,
            Valign::Center => {
                if self.lines.len() <= 1 {
                    let (a, d) = self.lines.first().map_or((0, 0), |l| (l.ascent, l.descent));
                    self.y + a / 2 - d / 4
                } else {
                    self.y + height / 2
                }
            }
        };
        (ox, oy)
    }

    /// Content-space origin in the caller's coordinate system: the anchor
    /// point, less the current scroll offset
    fn origin(&self) -> (i32, i32) {
        let (ax, ay) = self.anchor_origin();
        (ax - self.view_x, ay - self.view_y)
    }

    // --- queries (§4.9) ---------------------------------------------------

    fn position_at_point(&self, x: i32, y: i32) -> usize {
        let (ox, oy) = self.origin();
        query::position_at_point(&self.lines, x - ox, y - oy)
    }

    fn point_at_position(&self, position: usize, line: Option<usize>) -> (i32, i32) {
        let (ox, oy) = self.origin();
        let pos = position.min(self.document.len());
        let (lx, ly) = query::point_from_position(&self.lines, &self.document, pos, line);
        (lx + ox, ly + oy)
    }

    fn line_from_position(&self, position: usize) -> usize {
        query::line_from_position(&self.lines, position)
    }

    fn position_from_line(&self, line: usize) -> usize {
        query::position_from_line(&self.lines, line)
    }

    fn position_on_line(&self, line: usize, x: i32) -> usize {
        let (ox, _) = self.origin();
        query::position_on_line(&self.lines, line, x - ox)
    }

    fn line_count(&self) -> usize {
        query::line_count(&self.lines)
    }
}

macro_rules! common_api {
    ($ty:ident) => {
        impl<D: Document> $ty<D> {
            /// Set the callback fired once per `update()` cycle that did any
            /// shape/flow/vertical-placement work (§4.8)
            pub fn on_layout_update(&mut self, cb: impl FnMut() + 'static) {
                self.0.set_on_layout_update(Box::new(cb));
            }

            /// Anchor horizontal alignment (D.5); does not trigger reflow
            pub fn set_halign(&mut self, halign: Halign) {
                self.0.halign = halign;
            }

            /// Anchor vertical alignment (D.5); does not trigger reflow
            pub fn set_valign(&mut self, valign: Valign) {
                self.0.valign = valign;
            }

            /// Move the layout's anchor point; pure translation, no reflow
            /// (§9's "in-place mutation... for pure translation" note)
            pub fn set_position(&mut self, x: i32, y: i32) {
                self.0.x = x;
                self.0.y = y;
            }

            pub fn selection_range(&self) -> (usize, usize) {
                self.0.selection.range()
            }

            pub fn set_selection_colors(&mut self, foreground: crate::selection::Color, background: crate::selection::Color) {
                self.0.selection.foreground = foreground;
                self.0.selection.background = background;
            }

            pub fn content_width(&self) -> i32 {
                self.0.content_width
            }

            pub fn content_height(&self) -> i32 {
                self.0.content_height
            }

            pub fn get_line_count(&self) -> usize {
                self.0.line_count()
            }

            pub fn position_at_point(&self, x: i32, y: i32) -> usize {
                self.0.position_at_point(x, y)
            }

            pub fn point_at_position(&self, position: usize, line: Option<usize>) -> (i32, i32) {
                self.0.point_at_position(position, line)
            }

            pub fn line_from_position(&self, position: usize) -> usize {
                self.0.line_from_position(position)
            }

            pub fn position_from_line(&self, line: usize) -> usize {
                self.0.position_from_line(line)
            }

            pub fn position_on_line(&self, line: usize, x: i32) -> usize {
                self.0.position_on_line(line, x)
            }

            pub fn document(&self) -> &D {
                &self.0.document
            }

            /// Mutable access to the wrapped document, for a caller that
            /// edits it directly and then reports the edit via
            /// `insert_text`/`delete_text`/`style_text` (§4.5's document
            /// event contract; mirrored by [`PlainDocument`](crate::document::PlainDocument)'s
            /// own mutators, which return the matching `DocumentEvent`)
            pub fn document_mut(&mut self) -> &mut D {
                &mut self.0.document
            }
        }
    };
}

/// Re-lays out the whole document on every mutation; no viewport (§6)
pub struct StaticLayout<D: Document>(Core<D>);

impl<D: Document> StaticLayout<D> {
    pub fn new(
        document: D,
        width: i32,
        height: i32,
        multiline: bool,
        dpi: Dpi,
        batch: Rc<RefCell<Batch>>,
        group: Rc<Group>,
        fonts: &dyn FontProvider,
    ) -> Result<Self> {
        Ok(StaticLayout(Core::new(
            document, width, height, multiline, dpi, batch, group, false, fonts,
        )?))
    }

    pub fn insert_text(&mut self, pos: usize, len: usize, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.on_insert(pos, len);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn delete_text(&mut self, start: usize, end: usize, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.on_delete(start, end);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn style_text(
        &mut self,
        start: usize,
        end: usize,
        attrs: StyleAttrs,
        fonts: &dyn FontProvider,
    ) -> Result<bool> {
        self.0.on_styled(start, end, attrs);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn set_width(&mut self, width: i32, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.width = width;
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn set_height(&mut self, height: i32) {
        self.0.height = height;
    }

    /// Selection is a vertex-only change: rebuilds just the affected lines,
    /// without a full force-reflow.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.0.set_selection(start, end);
        self.0.rebuild_vertex_lines();
    }
}
common_api!(StaticLayout);

/// [`StaticLayout`] plus a scroll translation and scissor rectangle for the
/// caller's renderer to clip against; still re-lays out fully on mutation (§6)
pub struct ScrollableLayout<D: Document>(Core<D>);

impl<D: Document> ScrollableLayout<D> {
    pub fn new(
        document: D,
        width: i32,
        height: i32,
        multiline: bool,
        dpi: Dpi,
        batch: Rc<RefCell<Batch>>,
        group: Rc<Group>,
        fonts: &dyn FontProvider,
    ) -> Result<Self> {
        Ok(ScrollableLayout(Core::new(
            document, width, height, multiline, dpi, batch, group, false, fonts,
        )?))
    }

    pub fn insert_text(&mut self, pos: usize, len: usize, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.on_insert(pos, len);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn delete_text(&mut self, start: usize, end: usize, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.on_delete(start, end);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn style_text(
        &mut self,
        start: usize,
        end: usize,
        attrs: StyleAttrs,
        fonts: &dyn FontProvider,
    ) -> Result<bool> {
        self.0.on_styled(start, end, attrs);
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn set_width(&mut self, width: i32, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.width = width;
        self.0.force = true;
        self.0.run_update(fonts)
    }

    pub fn set_height(&mut self, height: i32) {
        self.0.height = height;
        self.0.view_y = viewport::clamp_view_y(self.0.view_y, self.0.content_height, self.0.height);
    }

    /// Pure translation: vertex data is anchor-local (§D.4), so scrolling
    /// never touches it — only `translate()`/`scissor_rect()` change.
    pub fn set_view_x(&mut self, view_x: i32) {
        self.0.view_x = viewport::clamp_view_x(view_x, self.0.content_width, self.0.width);
    }

    pub fn set_view_y(&mut self, view_y: i32) {
        self.0.view_y = viewport::clamp_view_y(view_y, self.0.content_height, self.0.height);
    }

    pub fn view(&self) -> (i32, i32) {
        (self.0.view_x, self.0.view_y)
    }

    /// The pixel translation a renderer should apply to the whole group tree
    /// before drawing, in place of rewriting vertex buffers (§9, D.4)
    pub fn translate(&self) -> crate::Vec2 {
        crate::Vec2(-self.0.view_x, -self.0.view_y)
    }

    /// The clip rectangle `(x, y, width, height)` the caller's renderer
    /// should scissor against (§9's "scissor/translation group")
    pub fn scissor_rect(&self) -> (i32, i32, i32, i32) {
        let (ox, oy) = self.0.anchor_origin();
        (ox, oy, self.0.width, self.0.height)
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.0.set_selection(start, end);
        self.0.rebuild_vertex_lines();
    }
}
common_api!(ScrollableLayout);

/// The full incremental pipeline: O(1) edit bookkeeping, deferred
/// `update()`, and visible-line culling (§4.7, §4.8)
pub struct IncrementalLayout<D: Document>(Core<D>);

impl<D: Document> IncrementalLayout<D> {
    pub fn new(
        document: D,
        width: i32,
        height: i32,
        multiline: bool,
        dpi: Dpi,
        batch: Rc<RefCell<Batch>>,
        group: Rc<Group>,
        fonts: &dyn FontProvider,
    ) -> Result<Self> {
        Ok(IncrementalLayout(Core::new(
            document, width, height, multiline, dpi, batch, group, true, fonts,
        )?))
    }

    /// Mark `[pos, pos+len)` invalid after the caller has already inserted
    /// that text into the document (mirrors [`crate::document::DocumentEvent::InsertedText`])
    pub fn insert_text(&mut self, pos: usize, len: usize) {
        self.0.on_insert(pos, len);
    }

    /// Mark `[start, end)` invalid after the caller has already deleted that
    /// range from the document
    pub fn delete_text(&mut self, start: usize, end: usize) {
        self.0.on_delete(start, end);
    }

    pub fn style_text(&mut self, start: usize, end: usize, attrs: StyleAttrs) {
        self.0.on_styled(start, end, attrs);
    }

    pub fn set_width(&mut self, width: i32) {
        if width != self.0.width {
            self.0.width = width;
            self.0.invalid_flow.invalidate(0, self.0.document.len());
        }
    }

    pub fn set_height(&mut self, height: i32) {
        self.0.height = height;
    }

    pub fn set_view_x(&mut self, view_x: i32) {
        self.0.view_x = viewport::clamp_view_x(view_x, self.0.content_width, self.0.width);
    }

    pub fn set_view_y(&mut self, view_y: i32) {
        self.0.view_y = viewport::clamp_view_y(view_y, self.0.content_height, self.0.height);
    }

    pub fn view(&self) -> (i32, i32) {
        (self.0.view_x, self.0.view_y)
    }

    pub fn visible_lines(&self) -> (usize, usize) {
        (self.0.visible.start, self.0.visible.end)
    }

    /// Adjust `view_y` so line `index` is fully visible (§4.7)
    pub fn ensure_line_visible(&mut self, index: usize) {
        self.0.view_y = viewport::ensure_line_visible(&self.0.lines, index, self.0.view_y, self.0.height);
        self.0.view_y = viewport::clamp_view_y(self.0.view_y, self.0.content_height, self.0.height);
    }

    /// Adjust `view_x` so local x-coordinate `x` is visible, with a 10px
    /// bias inside either edge (§4.7)
    pub fn ensure_x_visible(&mut self, x: i32) {
        self.0.view_x = viewport::ensure_x_visible(x, self.0.view_x, self.0.width, self.0.content_width);
        self.0.view_x = viewport::clamp_view_x(self.0.view_x, self.0.content_width, self.0.width);
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.0.set_selection(start, end);
    }

    pub fn begin_update(&mut self) {
        self.0.begin_update();
    }

    pub fn end_update(&mut self, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.end_update(fonts)
    }

    /// Run the five-pass pipeline over whatever is currently invalid (§4.8);
    /// a no-op inside a `begin_update`/`end_update` bracket
    pub fn update(&mut self, fonts: &dyn FontProvider) -> Result<bool> {
        self.0.update(fonts)
    }
}
common_api!(IncrementalLayout);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainDocument;
    use crate::font::{FontHandle, Glyph, TexCoords, TextureId};

    struct FixedFonts;
    impl FontProvider for FixedFonts {
        fn shape(&self, text: &str, _font: FontHandle) -> Result<Vec<Glyph>> {
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

    fn batch_and_group() -> (Rc<RefCell<Batch>>, Rc<Group>) {
        (Rc::new(RefCell::new(Batch::new())), Group::root())
    }

    #[test]
    fn empty_document_yields_one_line_on_construction() {
        let doc = PlainDocument::new("", FontHandle(0));
        let (batch, group) = batch_and_group();
        let layout =
            StaticLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        assert_eq!(layout.get_line_count(), 1);
        assert_eq!(layout.content_width(), 0);
        assert_eq!(layout.position_at_point(0, 0), 0);
    }

    #[test]
    fn static_layout_reflows_on_insert() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let (batch, group) = batch_and_group();
        let mut layout =
            StaticLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        assert_eq!(layout.content_width(), 20);
        layout
            .0
            .document
            .insert(0, "ab");
        layout.insert_text(0, 2, &FixedFonts).unwrap();
        assert_eq!(layout.content_width(), 40);
    }

    #[test]
    fn incremental_layout_defers_until_update() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let (batch, group) = batch_and_group();
        let mut layout =
            IncrementalLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        layout.0.document.insert(0, "ab");
        layout.insert_text(0, 2);
        // Not yet reflowed: width still reflects the original two glyphs.
        assert_eq!(layout.content_width(), 20);
        let fired = layout.update(&FixedFonts).unwrap();
        assert!(fired);
        assert_eq!(layout.content_width(), 40);
    }

    #[test]
    fn begin_end_update_brackets_suppress_intermediate_updates() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let (batch, group) = batch_and_group();
        let mut layout =
            IncrementalLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        layout.begin_update();
        layout.0.document.insert(0, "a");
        layout.insert_text(0, 1);
        assert!(!layout.update(&FixedFonts).unwrap()); // suppressed
        let fired = layout.end_update(&FixedFonts).unwrap();
        assert!(fired);
        assert_eq!(layout.content_width(), 30);
    }

    #[test]
    fn selection_only_change_fires_no_layout_update() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let (batch, group) = batch_and_group();
        let mut layout =
            IncrementalLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        layout.set_selection(0, 1);
        let fired = layout.update(&FixedFonts).unwrap();
        assert!(!fired); // scenario F: style-only, no shape/flow/lines work
    }

    #[test]
    fn round_trip_query_on_single_line() {
        let doc = PlainDocument::new("hi", FontHandle(0));
        let (batch, group) = batch_and_group();
        let layout =
            StaticLayout::new(doc, 1000, 200, true, Dpi::default(), batch, group, &FixedFonts).unwrap();
        let (x, y) = layout.point_at_position(1, Some(0));
        assert_eq!(layout.position_at_point(x, y), 1);
    }
}
