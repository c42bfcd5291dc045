//! Aztec Code symbols: size selection, error correction and module placement.

use tracing::debug;

use crate::bitstream::{pack_codewords, sequence_to_bits, BitBuffer};
use crate::charset::Charset;
use crate::config::{self, SymbolConfig, DEFAULT_EC_PERCENT};
use crate::error::EncodeError;
use crate::galois::{append_parity, GaloisField};
use crate::sequence::find_optimal_sequence;

/// An Aztec Code symbol, representing a square grid of dark and light modules.
///
/// Instances are immutable after creation. Build one with [`AztecCode::encode`] for raw
/// bytes or [`AztecCode::encode_text`] for text.
///
/// # Example
///
/// ```rust
/// use azrust::aztec::AztecCode;
///
/// let code = AztecCode::encode(b"Aztec Code 2D!", None, None, None).unwrap();
/// assert!(code.is_compact());
/// assert!(code.get_module(code.size() / 2, code.size() / 2));
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AztecCode {
    /// Width and height in modules, between 15 and 151 (inclusive).
    size: usize,
    compact: bool,
    layers: usize,
    data_codewords: usize,
    /// The modules (0 = light, 1 = dark), packed bitwise into bytes in row-major order.
    modules: Vec<u8>,
}

impl AztecCode {
    /// Encodes raw bytes into an Aztec Code symbol.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes to encode.
    /// * `size` - Optional `(size, compact)` pair naming the exact symbol to use. If `None`,
    ///   the smallest symbol that fits is selected.
    /// * `ec_percent` - Optional share of the symbol spent on error correction, in percent.
    ///   Defaults to [`DEFAULT_EC_PERCENT`].
    /// * `eci` - Optional ECI designator written ahead of the data.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the requested symbol does not exist, if the data does
    /// not fit, or if `ec_percent` is 100 or more.
    pub fn encode(
        data: &[u8],
        size: Option<(usize, bool)>,
        ec_percent: Option<u32>,
        eci: Option<u32>,
    ) -> Result<Self, EncodeError> {
        let ec_percent = ec_percent.unwrap_or(DEFAULT_EC_PERCENT);
        let sequence = find_optimal_sequence(data, eci);
        let bits = sequence_to_bits(sequence.tokens())?;
        debug_assert_eq!(bits.len(), sequence.bit_cost());

        let (config, codewords) = match size {
            Some((size, compact)) => {
                let config = config::lookup(size, compact)?;
                let required = config::required_bits(bits.len(), ec_percent)?;
                if required > config.total_bits {
                    return Err(EncodeError::CapacityExceeded {
                        required,
                        capacity: config.total_bits,
                    });
                }
                let codewords = data_codewords(&bits, config)?;
                (config, codewords)
            }
            None => config::select_symbol(bits.len(), ec_percent, |c| data_codewords(&bits, c).ok())?,
        };
        Self::from_codewords(config, codewords)
    }

    /// Encodes text into an Aztec Code symbol.
    ///
    /// Without a `charset` the text must be representable in ISO 8859-1, which readers
    /// assume by default, and no ECI escape is written. With a `charset` the text is
    /// transcoded and the symbol announces the character set with an ECI escape.
    pub fn encode_text(
        text: &str,
        size: Option<(usize, bool)>,
        ec_percent: Option<u32>,
        charset: Option<Charset>,
    ) -> Result<Self, EncodeError> {
        let (data, eci) = match charset {
            Some(charset) => (charset.encode(text)?, Some(charset.eci())),
            None => (Charset::Latin1.encode(text)?, None),
        };
        Self::encode(&data, size, ec_percent, eci)
    }

    /// Draws a symbol of the given configuration around the given data codewords.
    fn from_codewords(config: &SymbolConfig, mut codewords: Vec<u16>) -> Result<Self, EncodeError> {
        let data_codewords = codewords.len();
        let parity = config.codewords - data_codewords;
        append_parity(
            &mut codewords,
            parity,
            GaloisField::for_codeword_bits(config.codeword_bits),
        );
        debug!(
            size = config.size,
            compact = config.compact,
            data_codewords,
            parity,
            "encoded codewords"
        );

        let mut result = Self {
            size: config.size,
            compact: config.compact,
            layers: config.layers,
            data_codewords,
            modules: vec![0; (config.size * config.size).div_ceil(8)],
        };
        result.draw_finder_pattern();
        result.draw_orientation_marks();
        result.draw_reference_grid();
        result.draw_data(&codewords, config.codeword_bits)?;
        result.draw_mode_message();
        Ok(result)
    }

    /*---- Public instance methods ----*/

    /// Returns this symbol's size, in modules.
    pub fn size(&self) -> i32 {
        self.size as i32
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Number of data layers around the finder pattern.
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Number of codewords carrying data; the rest of the symbol holds parity.
    pub fn data_codewords(&self) -> usize {
        self.data_codewords
    }

    /// Returns the color of the module at the given coordinates, which is `false` for light
    /// or `true` for dark.
    ///
    /// The top left corner has the coordinates (x=0, y=0). If the given coordinates are out
    /// of bounds, then `false` (light) is returned.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size();
        range.contains(&x) && range.contains(&y) && self.get_module_bounded(x as usize, y as usize)
    }

    fn get_module_bounded(&self, x: usize, y: usize) -> bool {
        assert!(x < self.size && y < self.size);
        let index = y * self.size + x;
        (self.modules[index >> 3] >> (index & 7)) & 1 != 0
    }

    fn set_module_bounded(&mut self, x: usize, y: usize, isdark: bool) {
        assert!(x < self.size && y < self.size);
        let index = y * self.size + x;
        if isdark {
            self.modules[index >> 3] |= 1u8 << (index & 7);
        } else {
            self.modules[index >> 3] &= !(1u8 << (index & 7));
        }
    }

    // Sets a module if it lies inside the symbol; returns false otherwise.
    fn set_module_checked(&mut self, x: i64, y: i64, isdark: bool) -> bool {
        let range = 0..self.size as i64;
        if range.contains(&x) && range.contains(&y) {
            self.set_module_bounded(x as usize, y as usize, isdark);
            true
        } else {
            false
        }
    }

    // Sets the module at an offset from the center.
    fn set_relative(&mut self, dx: i64, dy: i64, isdark: bool) {
        let center = self.center();
        self.set_module_bounded((center + dx) as usize, (center + dy) as usize, isdark);
    }

    /*---- Private helper methods for drawing ----*/

    fn center(&self) -> i64 {
        (self.size / 2) as i64
    }

    fn ring_radius(&self) -> i64 {
        if self.compact {
            5
        } else {
            7
        }
    }

    fn draw_finder_pattern(&mut self) {
        let r = self.ring_radius();
        for dy in -r..r {
            for dx in -r..r {
                let dist = dx.abs().max(dy.abs());
                self.set_relative(dx, dy, dist % 2 == 0);
            }
        }
    }

    fn draw_orientation_marks(&mut self) {
        let r = self.ring_radius();
        let marks = [
            (-r, -r),
            (-r + 1, -r),
            (-r, -r + 1),
            (r, -r),
            (r, -r + 1),
            (r, r - 1),
        ];
        for (dx, dy) in marks {
            self.set_relative(dx, dy, true);
        }
    }

    // Full symbols carry alternating lines every 16 modules from the center.
    fn draw_reference_grid(&mut self) {
        if self.compact {
            return;
        }
        let center = self.center();
        let r = self.ring_radius();
        for dy in -center..=center {
            for dx in -center..=center {
                if dx.abs() <= r && dy.abs() <= r {
                    continue;
                }
                if dx % 16 == 0 || dy % 16 == 0 {
                    self.set_relative(dx, dy, (dx + dy + 1).rem_euclid(2) == 1);
                }
            }
        }
    }

    fn draw_mode_message(&mut self) {
        let codewords = mode_message(self.compact, self.layers, self.data_codewords);
        let r = self.ring_radius();
        let side = if self.compact { 7 } else { 11 };
        let mut index: i64 = 0;
        for &cw in &codewords {
            for i in (0..4).rev() {
                // Full symbols leave the reference grid line through each side free.
                if !self.compact && index % side == 5 {
                    index += 1;
                }
                let offset = index % side;
                let (dx, dy) = match index / side {
                    0 => (offset + 2 - r, -r),
                    1 => (r, offset + 2 - r),
                    2 => (r - offset - 2, r),
                    _ => (-r, r - offset - 2),
                };
                self.set_relative(dx, dy, (cw >> i) & 1 != 0);
                index += 1;
            }
        }
    }

    // Lays the codeword bits, last bit first, two at a time along a clockwise spiral
    // starting just outside the mode message ring.
    fn draw_data(&mut self, codewords: &[u16], width: u8) -> Result<(), EncodeError> {
        let mut bits = BitBuffer::new();
        for &cw in codewords {
            bits.append_bits(u32::from(cw), width);
        }
        let bits: Vec<bool> = bits.iter().rev().collect();

        let center = self.center();
        let r = self.ring_radius();
        let full = !self.compact;
        let on_grid = |v: i64| full && (center - v).rem_euclid(16) == 0;
        let layers = self.layers;
        let overflow = || EncodeError::LayerOverflow { layers };

        let mut side = Side::Top;
        let mut num = 2;
        let mut layer = 0;
        let mut x = center - r;
        let mut y = center - r - 1;
        for pair in bits.chunks_exact(2) {
            num += 1;
            let max_num = 2 * r + 4 * layer as i64 + if self.compact { 4 } else { 3 };
            if layer >= layers {
                return Err(overflow());
            }
            let (first, second) = (pair[0], pair[1]);
            let placed = match side {
                Side::Top => {
                    let dy0 = if on_grid(y) { 1 } else { 0 };
                    let dy1 = if on_grid(y - 1) { 2 } else { 1 };
                    let placed = self.set_module_checked(x, y - dy0, first)
                        && self.set_module_checked(x, y - dy1, second);
                    x += 1;
                    if num > max_num {
                        num = 2;
                        side = Side::Right;
                        x -= 1;
                        y += 1;
                    }
                    if on_grid(x) {
                        x += 1;
                    }
                    if on_grid(y) {
                        y += 1;
                    }
                    placed
                }
                Side::Right => {
                    let dx0 = if on_grid(x) { 1 } else { 0 };
                    let dx1 = if on_grid(x - 1) { 2 } else { 1 };
                    let placed = self.set_module_checked(x - dx0, y, second)
                        && self.set_module_checked(x - dx1, y, first);
                    y += 1;
                    if num > max_num {
                        num = 2;
                        side = Side::Bottom;
                        x -= 2;
                        if on_grid(x + 1) {
                            x -= 1;
                        }
                        y -= 1;
                    }
                    if on_grid(y) {
                        y += 1;
                    }
                    if on_grid(x) {
                        x -= 1;
                    }
                    placed
                }
                Side::Bottom => {
                    let dy0 = if on_grid(y) { 1 } else { 0 };
                    let dy1 = if on_grid(y - 1) { 2 } else { 1 };
                    let placed = self.set_module_checked(x, y - dy0, second)
                        && self.set_module_checked(x, y - dy1, first);
                    x -= 1;
                    if num > max_num {
                        num = 2;
                        side = Side::Left;
                        x += 1;
                        y -= 2;
                        if on_grid(y + 1) {
                            y -= 1;
                        }
                    }
                    if on_grid(x) {
                        x -= 1;
                    }
                    if on_grid(y) {
                        y -= 1;
                    }
                    placed
                }
                Side::Left => {
                    let dx0 = if on_grid(x) { 1 } else { 0 };
                    let dx1 = if on_grid(x + 1) { 2 } else { 1 };
                    let placed = self.set_module_checked(x + dx1, y, first)
                        && self.set_module_checked(x + dx0, y, second);
                    y -= 1;
                    if num > max_num {
                        num = 2;
                        side = Side::Top;
                        layer += 1;
                    }
                    if on_grid(y) {
                        y -= 1;
                    }
                    placed
                }
            };
            if !placed {
                return Err(overflow());
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

// Packs the bitstream for `config`, or fails if the codewords cannot be announced.
fn data_codewords(bits: &BitBuffer, config: &SymbolConfig) -> Result<Vec<u16>, EncodeError> {
    let width = config.codeword_bits;
    let mut codewords = pack_codewords(bits, width);
    if codewords.is_empty() {
        // An empty payload still needs one codeword: all-ones padding with the last bit cleared.
        codewords.push((1 << width) - 2);
    }
    let max = config.max_data_codewords();
    if codewords.len() > max {
        return Err(EncodeError::CapacityExceeded {
            required: codewords.len() * usize::from(width),
            capacity: max * usize::from(width),
        });
    }
    Ok(codewords)
}

/// Returns the mode message codewords: the layer and data codeword counts as 4-bit words,
/// followed by their Reed–Solomon parity over GF(16).
pub fn mode_message(compact: bool, layers: usize, data_codewords: usize) -> Vec<u16> {
    let layers = (layers - 1) as u32;
    let words = (data_codewords - 1) as u32;
    let (message, nibbles, parity) = if compact {
        ((layers << 6) | words, 2, 5)
    } else {
        ((layers << 11) | words, 4, 6)
    };
    let mut codewords: Vec<u16> = (0..nibbles)
        .rev()
        .map(|i| ((message >> (4 * i)) & 0xf) as u16)
        .collect();
    append_parity(&mut codewords, parity, GaloisField::for_codeword_bits(4));
    codewords
}
