// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Crate-wide error type

use thiserror::Error;

/// Errors produced by the layout engine
///
/// Most conditions encountered by this crate are recoverable (unrecognised
/// style values are ignored, out-of-range scroll positions are clamped,
/// selection bounds are clamped to the document length). Only the conditions
/// below are reported to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The [`crate::font::FontProvider`] failed to shape a character range
    ///
    /// The invalid range that triggered shaping is left untouched, so
    /// a retry (e.g. after the caller installs a fallback font) is cheap.
    #[error("font provider failed to shape text: {0}")]
    ShapingFailed(String),

    /// A caller supplied an invalid argument
    ///
    /// For example: line-wrap was requested without a width, a negative
    /// width or height, or reversed selection indices.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The [`crate::batch::Batch`] backing a layout was mutated by another
    /// layout while an update was in progress
    #[error("batch was modified by another layout during update")]
    BatchStateConflict,
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
