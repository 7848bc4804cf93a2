// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! External font-shaping contract
//!
//! Font rasterization and glyph-atlas allocation are out of scope for this
//! crate (see spec §1): we consume a [`FontProvider`] supplied by the caller
//! and only ever handle opaque [`FontHandle`]s and the geometric metadata in
//! [`Glyph`].

use crate::error::Result;

/// Opaque handle to a resolved font (family + size + weight + style)
///
/// Resolution of `font_name`/`font_size`/`bold`/`italic` style attributes
/// into a concrete `FontHandle` is the [`Document`](crate::document::Document)'s
/// job, not this crate's (§6).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontHandle(pub u32);

/// Opaque identity of a texture atlas a glyph's vertex data is drawn from
///
/// Two glyphs with equal `TextureId` can be drawn in one batched quad list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Texture coordinates for the four corners of a glyph quad
///
/// Stored as 4 vertices × 3 components (u, v, layer) to allow texture arrays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexCoords(pub [[f32; 3]; 4]);

impl Default for TexCoords {
    fn default() -> Self {
        TexCoords([[0.0; 3]; 4])
    }
}

/// A single shaped glyph, in font-local pixel coordinates
///
/// `descent` is stored as a non-positive number throughout this crate (the
/// GLOSSARY's convention), so that `ascent + (-descent)` is always the
/// glyph's total vertical extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    pub ascent: i32,
    pub descent: i32,
    pub advance: i32,
    /// Vertex rectangle `(x0, y0, x1, y1)` relative to the glyph's origin
    pub vertices: (i32, i32, i32, i32),
    pub tex_coords: TexCoords,
    pub owner: TextureId,
}

/// Shapes text slices into glyphs
///
/// Implemented by the caller (it owns the font library / glyph atlas); the
/// engine only ever calls through this trait.
pub trait FontProvider {
    /// Shape `text` (a contiguous slice of the document, already known to
    /// share `font` for its whole length) into one glyph per character
    ///
    /// Must return exactly `text.chars().count()` glyphs, in order. A
    /// provider that cannot shape some character returns
    /// [`Error::ShapingFailed`](crate::error::Error::ShapingFailed).
    fn shape(&self, text: &str, font: FontHandle) -> Result<Vec<Glyph>>;

    /// Font-wide `(ascent, descent)` metrics, used for the height of an
    /// empty line and as the fallback glyph when shaping a tab stop
    fn metrics(&self, font: FontHandle) -> (i32, i32);

    /// The font used when the document supplies no font run at all
    fn default_font(&self) -> FontHandle;
}
