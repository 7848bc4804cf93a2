// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Many indices are represented as `u32` instead of `usize` by this library in
//! order to save space (note that we do not expect `usize` smaller than `u32`
//! and our text representations are not intended to scale anywhere close to
//! `u32::MAX` bytes of text, so `u32` is always an appropriate index type).

use easy_cast::Cast;

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Screen resolution, used to convert between points and pixels
///
/// `pixels = round(dpi * points / 72)`. Default is 96 dpi (the common value
/// used by desktop toolkits for a 1x scale factor).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dpi(pub f32);

impl Default for Dpi {
    fn default() -> Self {
        Dpi(96.0)
    }
}

impl Dpi {
    /// Convert a measurement in points to whole pixels
    #[inline]
    pub fn px(self, points: f32) -> i32 {
        (self.0 * points / 72.0).round() as i32
    }

    /// Convert an optional measurement in points to whole pixels
    #[inline]
    pub fn px_opt(self, points: Option<f32>) -> Option<i32> {
        points.map(|p| self.px(p))
    }
}
