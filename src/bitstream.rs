//! Rendering a token sequence to bits and slicing the bits into codewords.

use crate::error::EncodeError;
use crate::sequence::{pair_code, Mode, Token, FLG_CODE, MAX_BINARY_RUN};

/// An appendable sequence of bits, stored most significant bit first.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends the low `len` bits of `val`, most significant first.
    ///
    /// # Panics
    ///
    /// Panics if `len > 31` or if `val` has bits set above `len`.
    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            let shift = 7 - (self.length & 7);
            if shift == 7 {
                self.data.push(0);
            }
            let bit = ((val >> i) & 1) as u8;
            if let Some(last) = self.data.last_mut() {
                *last |= bit << shift;
            }
            self.length += 1;
        }
    }

    /// Returns the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.length, "Bit index out of bounds");
        get_bit(self.data[index >> 3], 7 - (index & 7) as u8)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = bool> + '_ {
        (0..self.length).map(move |i| self.get(i))
    }
}

fn get_bit(x: u8, i: u8) -> bool {
    ((x >> i) & 1) != 0
}

/// Writes `tokens` as the raw Aztec bitstream.
///
/// Writing starts in Upper mode. Every token is written with the table of the active
/// mode; a [`Token::Shift`] makes the target mode active for exactly one token.
pub fn sequence_to_bits(tokens: &[Token]) -> Result<BitBuffer, EncodeError> {
    let mut bits = BitBuffer::new();
    let mut mode = Mode::Upper;
    let mut shifted_from: Option<Mode> = None;

    for token in tokens {
        let invalid = || EncodeError::InvalidToken {
            mode,
            token: token.clone(),
        };
        match token {
            Token::Latch(target) => {
                let code = mode.latch_code(*target).ok_or_else(invalid)?;
                bits.append_bits(code, mode.code_bits());
            }
            Token::Shift(target) => {
                let code = mode.shift_code(*target).ok_or_else(invalid)?;
                bits.append_bits(code, mode.code_bits());
            }
            Token::Literal(c) => {
                let code = mode.char_code(*c).ok_or_else(invalid)?;
                bits.append_bits(code, mode.code_bits());
            }
            Token::PunctPair(first, second) => {
                let code = pair_code(*first, *second)
                    .filter(|_| mode == Mode::Punct)
                    .ok_or_else(invalid)?;
                bits.append_bits(code, mode.code_bits());
            }
            Token::FlgEci(count, value) => {
                if mode != Mode::Punct {
                    return Err(invalid());
                }
                write_flg(&mut bits, *count, *value)?;
            }
            Token::BinaryRun(run) => {
                if mode != Mode::Binary || run.is_empty() || run.len() > MAX_BINARY_RUN {
                    return Err(invalid());
                }
                write_binary_run(&mut bits, run);
            }
        }

        if let Some(previous) = shifted_from.take() {
            mode = previous;
        }
        match token {
            Token::Latch(target) => mode = *target,
            Token::Shift(target) => {
                shifted_from = Some(mode);
                mode = *target;
            }
            _ => {}
        }
    }
    Ok(bits)
}

fn write_flg(bits: &mut BitBuffer, count: u8, value: u32) -> Result<(), EncodeError> {
    let malformed = |reason: String| EncodeError::MalformedControlToken { count, reason };
    if count >= 7 {
        return Err(malformed("FLG(7) is reserved".to_string()));
    }
    let limit = 10u64.pow(u32::from(count));
    if u64::from(value) >= limit {
        return Err(malformed(format!("ECI value {} needs more than {} digits", value, count)));
    }
    bits.append_bits(FLG_CODE, Mode::Punct.code_bits());
    bits.append_bits(u32::from(count), 3);
    if count == 0 {
        return Ok(());
    }
    let digits = format!("{:0width$}", value, width = usize::from(count));
    for d in digits.bytes() {
        let code = Mode::Digit
            .char_code(d)
            .ok_or_else(|| malformed(format!("{:?} is not a digit", d as char)))?;
        bits.append_bits(code, Mode::Digit.code_bits());
    }
    Ok(())
}

fn write_binary_run(bits: &mut BitBuffer, run: &[u8]) {
    if run.len() <= 31 {
        bits.append_bits(run.len() as u32, 5);
    } else {
        bits.append_bits(0, 5);
        bits.append_bits((run.len() - 31) as u32, 11);
    }
    for &b in run {
        bits.append_bits(u32::from(b), 8);
    }
}

/// Slices `bits` into codewords of `width` bits.
///
/// A codeword whose first `width - 1` bits are all equal gets the opposite bit stuffed in
/// as its last bit, so no codeword is all zeros or all ones. The last codeword is padded
/// with ones.
///
/// # Panics
///
/// Panics if `width` is not between 2 and 16.
pub fn pack_codewords(bits: &BitBuffer, width: u8) -> Vec<u16> {
    assert!((2..=16).contains(&width), "Codeword width out of range");
    let ones: u32 = (1 << (width - 1)) - 1;
    let mut codewords = Vec::with_capacity(bits.len() / usize::from(width - 1) + 1);
    let mut buffer: u32 = 0;
    let mut count: u8 = 0;

    for bit in bits.iter() {
        buffer = (buffer << 1) | u32::from(bit);
        count += 1;
        if count == width - 1 {
            if buffer == 0 {
                buffer = 1;
                count += 1;
            } else if buffer == ones {
                buffer <<= 1;
                count += 1;
            }
        }
        if count == width {
            codewords.push(buffer as u16);
            buffer = 0;
            count = 0;
        }
    }

    if count > 0 {
        let pad = width - count;
        buffer = (buffer << pad) | ((1 << pad) - 1);
        if buffer == (1 << width) - 1 {
            buffer ^= 1;
        }
        codewords.push(buffer as u16);
    }
    codewords
}
