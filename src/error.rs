//! Error types returned by the encoder and the rendering helpers.

use thiserror::Error;

use crate::sequence::{Mode, Token};

/// Error type for a failed Aztec Code encode.
///
/// Every variant is terminal for the call that produced it: no partially drawn
/// symbol is ever returned. Ways to handle a capacity failure include:
///
/// - Lower the error correction percentage.
/// - Drop the explicit symbol size and let the encoder pick one.
/// - Shorten the payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The requested (size, compact) pair is not an Aztec symbol.
    #[error("no {size}x{size} {} symbol exists in the sizes table", symbol_kind(.compact))]
    UnsupportedConfiguration { size: usize, compact: bool },

    /// The payload plus error correction does not fit.
    #[error("data needs {required} bits, max capacity = {capacity} bits")]
    CapacityExceeded { required: usize, capacity: usize },

    /// An `FLG(n)` escape that cannot be written.
    #[error("malformed FLG({count}) control token: {reason}")]
    MalformedControlToken { count: u8, reason: String },

    /// Data placement ran past the outermost layer of the symbol.
    #[error("maximum layer count {layers} for the current size is exceeded")]
    LayerOverflow { layers: usize },

    /// The error correction share must leave room for data.
    #[error("error correction percentage must be below 100, got {0}")]
    InvalidEcPercent(u32),

    /// A token that has no code in the mode active when it is written.
    #[error("token {token:?} cannot be written in {mode:?} mode")]
    InvalidToken { mode: Mode, token: Token },

    /// Text that the selected character set cannot represent.
    #[error("character {ch:?} cannot be encoded as {charset}")]
    UnencodableCharacter { ch: char, charset: &'static str },
}

fn symbol_kind(compact: &bool) -> &'static str {
    if *compact {
        "compact"
    } else {
        "full-range"
    }
}

/// Error type for the helpers that encode and then save or render a symbol.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
}
