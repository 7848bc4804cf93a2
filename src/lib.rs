// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Incremental text layout engine for a 2D graphics toolkit's rich-text
//! subsystem
//!
//! Given a styled character document (a [`document::Document`] implementation)
//! and a rectangular viewport, this crate produces a set of drawable glyph
//! quads deposited into a [`batch::Batch`], keeps that output up to date with
//! minimal recomputation as the document or viewport changes, and answers
//! the document-position ↔ pixel-coordinate queries an interactive caret
//! needs. Font rasterization ([`font::FontProvider`]) and the drawing
//! backend ([`batch::Batch`]) are external collaborators; this crate only
//! defines the data flow between them.
//!
//! Three layout classes share one update pipeline and differ only in how
//! eagerly they re-run it: [`layout::StaticLayout`] always relays out the
//! whole document, [`layout::ScrollableLayout`] adds viewport clipping, and
//! [`layout::IncrementalLayout`] tracks invalid ranges so an edit touches
//! only what changed.

pub mod batch;
pub mod boxes;
pub mod conv;
pub mod document;
pub mod error;
pub mod flow;
pub mod font;
pub mod invalid;
pub mod layout;
pub mod line;
pub mod query;
pub mod runlist;
pub(crate) mod shaper;
pub mod selection;
pub mod vertical;
pub mod vertex;
pub mod viewport;

pub use conv::Dpi;
pub use data::{Range, Vec2};
pub use error::{Error, Result};

mod data;
