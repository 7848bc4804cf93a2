// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Turning a character range into a dense array of shaped glyph slots (§4.2)

use crate::boxes::ElementId;
use crate::document::Document;
use crate::error::Result;
use crate::font::{FontProvider, Glyph, TextureId};
use crate::runlist::{RunList, RunSource};
use crate::Dpi;

/// What occupies one character position after shaping
#[derive(Clone, Debug)]
pub enum GlyphSlot {
    Glyph(Glyph),
    Element(ElementId),
}

/// A dense, per-character shaping cache
///
/// `slots[i]` and `owner_runs` always have the same length as the document.
/// Re-shaping a sub-range overwrites exactly that sub-range of `slots` and
/// the covering segment of `owner_runs`; it never touches adjacent slots
/// (§4.2 contract).
#[derive(Clone, Debug, Default)]
pub struct Shaper {
    slots: Vec<Option<GlyphSlot>>,
    owner_runs: RunList<Option<TextureId>>,
}

impl Shaper {
    pub fn new() -> Self {
        Shaper {
            slots: Vec::new(),
            owner_runs: RunList::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mirror a document insertion: new slots start empty (callers must
    /// mark `[pos, pos+len)` invalid so a shaping pass fills them in)
    pub fn insert(&mut self, pos: usize, len: usize) {
        self.slots.splice(pos..pos, std::iter::repeat(None).take(len));
        self.owner_runs.insert(pos, len);
    }

    pub fn delete(&mut self, start: usize, end: usize) {
        self.slots.drain(start..end);
        self.owner_runs.delete(start, end);
    }

    pub fn slot(&self, i: usize) -> Option<&GlyphSlot> {
        self.slots[i].as_ref()
    }

    pub fn owner_runs(&self) -> &dyn RunSource<Option<TextureId>> {
        &self.owner_runs
    }

    /// Re-shape `[start, end)`
    ///
    /// Splits the range into maximal sub-spans of (a) a single inline
    /// element, or (b) contiguous non-element characters sharing one font,
    /// then shapes each text sub-span with one [`FontProvider::shape`] call.
    pub fn reshape(
        &mut self,
        start: usize,
        end: usize,
        doc: &dyn Document,
        dpi: Dpi,
        fonts: &dyn FontProvider,
    ) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        if self.slots.len() != doc.len() {
            // Keep the cache in sync if a caller forgot to mirror an edit;
            // this only ever grows/shrinks, never corrupts existing data.
            self.slots.resize(doc.len(), None);
        }

        let font_runs = doc.font_runs(dpi);
        let element_runs = doc.element_runs();

        let mut i = start;
        while i < end {
            if let Some(elem) = element_runs.value_at(i) {
                self.slots[i] = Some(GlyphSlot::Element(elem));
                self.owner_runs.set_run(i, i + 1, None);
                i += 1;
                continue;
            }

            let font = font_runs.value_at(i);
            let mut j = i + 1;
            while j < end && element_runs.value_at(j).is_none() && {
                // Compare by the font's underlying equality; FontHandle is
                // Copy + PartialEq.
                font_runs.value_at(j) == font
            } {
                j += 1;
            }

            let text = doc.slice(i, j);
            let glyphs = match fonts.shape(text, font) {
                Ok(g) => g,
                Err(e) => {
                    log::warn!("shaping [{i}, {j}) failed: {e}");
                    return Err(e);
                }
            };
            debug_assert_eq!(glyphs.len(), j - i, "FontProvider::shape returned wrong glyph count");

            let mut k = i;
            let mut run_start = i;
            let mut run_owner = glyphs.first().map(|g| g.owner);
            for glyph in glyphs {
                let owner = glyph.owner;
                if Some(owner) != run_owner {
                    self.owner_runs.set_run(run_start, k, run_owner);
                    run_start = k;
                    run_owner = Some(owner);
                }
                self.slots[k] = Some(GlyphSlot::Glyph(glyph));
                k += 1;
            }
            if run_start < k {
                self.owner_runs.set_run(run_start, k, run_owner);
            }

            i = j;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainDocument;
    use crate::font::{FontHandle, TexCoords};

    struct FakeFonts;
    impl FontProvider for FakeFonts {
        fn shape(&self, text: &str, _font: FontHandle) -> Result<Vec<Glyph>> {
            Ok(text
                .chars()
                .map(|_| Glyph {
                    ascent: 10,
                    descent: -2,
                    advance: 8,
                    vertices: (0, 0, 8, 10),
                    tex_coords: TexCoords::default(),
                    owner: TextureId(0),
                })
                .collect())
        }
        fn metrics(&self, _font: FontHandle) -> (i32, i32) {
            (10, -2)
        }
        fn default_font(&self) -> FontHandle {
            FontHandle(0)
        }
    }

    #[test]
    fn reshape_fills_every_slot() {
        let doc = PlainDocument::new("hello", FontHandle(0));
        let mut shaper = Shaper::new();
        shaper.insert(0, doc.len());
        shaper.reshape(0, doc.len(), &doc, Dpi::default(), &FakeFonts).unwrap();
        for i in 0..doc.len() {
            assert!(matches!(shaper.slot(i), Some(GlyphSlot::Glyph(_))));
        }
    }

    #[test]
    fn reshape_does_not_touch_adjacent_slots() {
        let doc = PlainDocument::new("hello", FontHandle(0));
        let mut shaper = Shaper::new();
        shaper.insert(0, doc.len());
        shaper.reshape(0, doc.len(), &doc, Dpi::default(), &FakeFonts).unwrap();
        let before = format!("{:?}", shaper.slot(0));
        shaper.reshape(2, 4, &doc, Dpi::default(), &FakeFonts).unwrap();
        assert_eq!(format!("{:?}", shaper.slot(0)), before);
    }
}
