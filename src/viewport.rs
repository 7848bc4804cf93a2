// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Scroll state and visible-line tracking for an incremental layout (§4.7)
//!
//! `view_x`/`view_y` name the pixel offset of the viewport's top-left corner
//! in content coordinates, clamped so the viewport never scrolls past the
//! content's edges. As with [`vertical`](crate::vertical) and
//! [`vertex`](crate::vertex), the clamp and visibility formulas below are the
//! sign-flipped counterparts of the pyglet original's (there `view_y <= 0`
//! and growing *more* negative scrolls down; here `view_y >= 0` and growing
//! scrolls down, matching this crate's "y increases downward" convention).

use crate::batch::Batch;
use crate::document::Document;
use crate::invalid::InvalidRange;
use crate::line::Line;

/// The half-open range of line indices currently materialized as vertices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

/// Clamp a horizontal scroll offset to `[0, max(0, content_width - width)]`
pub fn clamp_view_x(view_x: i32, content_width: i32, width: i32) -> i32 {
    view_x.clamp(0, (content_width - width).max(0))
}

/// Clamp a vertical scroll offset to `[0, max(0, content_height - height)]`
pub fn clamp_view_y(view_y: i32, content_height: i32, height: i32) -> i32 {
    view_y.clamp(0, (content_height - height).max(0))
}

/// Recompute which lines overlap `[view_y, view_y + height)`, deleting the
/// vertex lists of lines that just scrolled out and invalidating
/// `invalid_vertex_lines` for lines that just scrolled in
pub fn update_visible_lines(
    lines: &mut [Line],
    view_y: i32,
    height: i32,
    visible: VisibleRange,
    batch: &mut Batch,
    doc: &mut dyn Document,
    invalid_vertex_lines: &mut InvalidRange,
) -> VisibleRange {
    if lines.is_empty() {
        for i in visible.start..visible.end {
            if let Some(line) = lines.get_mut(i) {
                line.delete(batch, doc);
            }
        }
        if visible != VisibleRange::default() {
            log::trace!("visible lines changed: {:?}..{:?} -> 0..0", visible.start, visible.end);
        }
        return VisibleRange::default();
    }

    let mut start = lines.len();
    let mut end = 0usize;
    for (i, line) in lines.iter().enumerate() {
        if line.y - line.descent > view_y {
            start = start.min(i);
        }
        if line.y - line.ascent < view_y + height {
            end = end.max(i + 1);
        }
    }

    for line in &mut lines[visible.start..start.min(lines.len())] {
        line.delete(batch, doc);
    }
    for line in &mut lines[end.min(lines.len())..visible.end.min(lines.len())] {
        line.delete(batch, doc);
    }

    invalid_vertex_lines.invalidate(start, visible.start);
    invalid_vertex_lines.invalidate(visible.end, end);

    let new_visible = VisibleRange { start, end };
    if new_visible != visible {
        log::trace!(
            "visible lines changed: {:?}..{:?} -> {:?}..{:?}",
            visible.start,
            visible.end,
            new_visible.start,
            new_visible.end
        );
    }
    new_visible
}

/// Adjust `view_y` so that `lines[index]` is fully visible within `height`
pub fn ensure_line_visible(lines: &[Line], index: usize, view_y: i32, height: i32) -> i32 {
    let line = &lines[index];
    let top = line.y - line.ascent;
    let bottom = line.y - line.descent;
    if top < view_y {
        top
    } else if bottom > view_y + height {
        bottom - height
    } else {
        view_y
    }
}

/// Adjust `view_x` so that content x-coordinate `x` (already relative to the
/// current `view_x`) is visible, with a 10px bias inside either edge (§4.7)
pub fn ensure_x_visible(x: i32, view_x: i32, width: i32, content_width: i32) -> i32 {
    if x <= view_x + 10 {
        x - 10
    } else if x >= view_x + width {
        x - width + 10
    } else if x >= view_x + width - 10 && content_width > width {
        x - width + 10
    } else {
        view_x
    }
}
