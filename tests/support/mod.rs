// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shared fixtures for the integration test suite
//!
//! A fixed-width font stand-in (10px advance per glyph, matching no real
//! rasterizer but making every scenario's expected pixel numbers exact) plus
//! a fresh [`Batch`]/[`Group`] pair, so `scenarios.rs` and `properties.rs`
//! don't each reinvent them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rich_text_layout::batch::{Batch, Group};
use rich_text_layout::error::Result;
use rich_text_layout::font::{FontHandle, FontProvider, Glyph, TexCoords, TextureId};

pub struct FixedFonts;

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

pub fn batch_and_group() -> (Rc<RefCell<Batch>>, Rc<Group>) {
    (Rc::new(RefCell::new(Batch::new())), Group::root())
}
