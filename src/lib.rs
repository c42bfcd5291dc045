//! # azrust
//!
//! A Rust library for generating Aztec Code 2D barcodes with several rendering options.
//!
//! `azrust` encodes text or binary data into Aztec Code symbols, from the 15x15 compact
//! symbol up to the 151x151 full-range symbol with 32 data layers. Text is split into the
//! cheapest run of Aztec encoding modes, packed into codewords, protected with Reed–Solomon
//! error correction and laid out on the symbol's spiral. Output can go to the console, PNG
//! files, SVG strings or in-memory image buffers.
//!
//! ## Features
//!
//! - Optimal mode selection across the Upper, Lower, Mixed, Punct, Digit and Binary modes.
//! - Automatic or explicit symbol size, with a configurable error correction percentage.
//! - ECI escapes for non-default character sets.
//! - Render symbols as ASCII art, Unicode block art, PNG images, SVGs or image buffers.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! azrust = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Encode text and render it as an SVG:
//!
//! ```rust
//! use azrust::{helper::to_svg_string, AztecCode};
//!
//! let code = AztecCode::encode_text("Hello, World!", None, None, None).unwrap();
//! println!("{}x{} compact={}", code.size(), code.size(), code.is_compact());
//! let svg = to_svg_string(&code, 2);
//! assert!(svg.starts_with("<?xml"));
//! ```
//!
//! Encode UTF-8 text with an ECI escape into a fixed size symbol:
//!
//! ```rust
//! use azrust::{AztecCode, Charset};
//!
//! let code = AztecCode::encode_text("Grüße", Some((19, true)), Some(33), Some(Charset::Utf8)).unwrap();
//! assert_eq!(code.size(), 19);
//! ```
//!
//! ## Modules
//!
//! - [`aztec`]: Symbol construction and module placement.
//! - [`sequence`]: Encoding modes and the optimal mode sequence search.
//! - [`bitstream`]: Bitstream writing and codeword packing.
//! - [`galois`]: Galois field arithmetic and Reed–Solomon parity.
//! - [`config`]: The table of symbol sizes.
//! - [`charset`]: Text transcoding and ECI designators.
//! - [`helper`]: Utilities for rendering Aztec Codes in various formats.

#![forbid(unsafe_code)]

pub mod aztec;
pub mod bitstream;
pub mod charset;
pub mod config;
pub mod error;
pub mod galois;
pub mod helper;
pub mod sequence;

pub use aztec::AztecCode;
pub use charset::{eci_designator, Charset};
pub use config::DEFAULT_EC_PERCENT;
pub use error::{EncodeError, RenderError};
