//! Text encoding modes and the search for the cheapest mode sequence.
//!
//! Aztec Code writes text through six modes, each with its own character table. Switching
//! between them costs bits, either persistently (latch) or for a single character (shift).
//! [`find_optimal_sequence`] runs a forward dynamic program over the input bytes that keeps,
//! for every mode, the cheapest token sequence ending in that mode.

use tracing::debug;

/// An Aztec Code encoding mode.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Mode {
    Upper,
    Lower,
    Mixed,
    Punct,
    Digit,
    Binary,
}

impl Mode {
    /// All modes in table order.
    pub const ALL: [Mode; 6] = [
        Mode::Upper,
        Mode::Lower,
        Mode::Mixed,
        Mode::Punct,
        Mode::Digit,
        Mode::Binary,
    ];

    fn ordinal(self) -> usize {
        use Mode::*;
        match self {
            Upper => 0,
            Lower => 1,
            Mixed => 2,
            Punct => 3,
            Digit => 4,
            Binary => 5,
        }
    }

    /// Width in bits of one code in this mode.
    pub fn code_bits(self) -> u8 {
        match self {
            Mode::Digit => 4,
            Mode::Binary => 8,
            _ => 5,
        }
    }

    /// Returns the code of the byte `b` in this mode's character table.
    ///
    /// Binary mode has no character table; raw bytes are carried by [`Token::BinaryRun`].
    pub fn char_code(self, b: u8) -> Option<u32> {
        let position = |table: &[u8]| table.iter().position(|&c| c == b);
        let code = match self {
            Mode::Upper => position(UPPER_CHARS).map(|i| i + 1),
            Mode::Lower => position(LOWER_CHARS).map(|i| i + 1),
            Mode::Mixed => position(MIXED_CHARS).map(|i| i + 1),
            Mode::Digit => position(DIGIT_CHARS).map(|i| i + 1),
            Mode::Punct if b == b'\r' => Some(1),
            Mode::Punct => position(PUNCT_CHARS).map(|i| i + 6),
            Mode::Binary => None,
        };
        code.map(|c| c as u32)
    }

    /// Returns the code that latches from this mode to `target`.
    pub fn latch_code(self, target: Mode) -> Option<u32> {
        use Mode::*;
        match (self, target) {
            (Upper, Lower) | (Mixed, Lower) => Some(28),
            (Upper, Mixed) | (Lower, Mixed) | (Mixed, Upper) => Some(29),
            (Upper, Digit) | (Lower, Digit) | (Mixed, Punct) => Some(30),
            (Punct, Upper) => Some(31),
            (Digit, Upper) => Some(14),
            _ => None,
        }
    }

    /// Returns the code that shifts from this mode to `target` for one character.
    pub fn shift_code(self, target: Mode) -> Option<u32> {
        use Mode::*;
        match (self, target) {
            (Upper, Punct) | (Lower, Punct) | (Mixed, Punct) | (Digit, Punct) => Some(0),
            (Lower, Upper) => Some(28),
            (Upper, Binary) | (Lower, Binary) | (Mixed, Binary) => Some(31),
            (Digit, Upper) => Some(15),
            _ => None,
        }
    }

    fn contains(self, b: u8) -> bool {
        self == Mode::Binary || self.char_code(b).is_some()
    }
}

static UPPER_CHARS: &[u8] = b" ABCDEFGHIJKLMNOPQRSTUVWXYZ";
static LOWER_CHARS: &[u8] = b" abcdefghijklmnopqrstuvwxyz";
static MIXED_CHARS: &[u8] =
    b" \x01\x02\x03\x04\x05\x06\x07\x08\t\n\x0b\x0c\r\x1b\x1c\x1d\x1e\x1f@\\^_`|~\x7f";
static PUNCT_CHARS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?[]{}";
static DIGIT_CHARS: &[u8] = b" 0123456789,.";

/// Two-character sequences that Punct mode writes as a single code, starting at code 2.
static PUNCT_PAIRS: [[u8; 2]; 4] = [*b"\r\n", *b". ", *b", ", *b": "];

/// Punct mode code of `FLG(n)`.
pub const FLG_CODE: u32 = 0;

/// Returns the Punct mode code of a two-character pair.
pub fn pair_code(first: u8, second: u8) -> Option<u32> {
    PUNCT_PAIRS
        .iter()
        .position(|&p| p == [first, second])
        .map(|i| i as u32 + 2)
}

/// Bits needed to latch from the row mode to the column mode, in [`Mode::ALL`] order.
static LATCH_LEN: [[usize; 6]; 6] = [
    [0, 5, 5, 10, 5, 10],   // Upper
    [10, 0, 5, 10, 5, 10],  // Lower
    [5, 5, 0, 5, 10, 10],   // Mixed
    [5, 10, 10, 0, 10, 15], // Punct
    [4, 9, 9, 14, 0, 14],   // Digit
    [0, 0, 0, 0, 0, 0],     // Binary
];

/// Bits needed to shift from the row mode to the column mode, where a shift exists.
static SHIFT_LEN: [[Option<usize>; 6]; 6] = {
    const N: Option<usize> = None;
    [
        [N, N, N, Some(5), N, N],       // Upper
        [Some(5), N, N, Some(5), N, N], // Lower
        [N, N, N, Some(5), N, N],       // Mixed
        [N, N, N, N, N, N],             // Punct
        [Some(4), N, N, Some(4), N, N], // Digit
        [N, N, N, N, N, N],             // Binary
    ]
};

/// Latch targets, in order, that take one text mode to another.
fn latch_path(from: Mode, to: Mode) -> &'static [Mode] {
    use Mode::*;
    match (from, to) {
        (Upper, Lower) | (Mixed, Lower) => &[Lower],
        (Upper, Mixed) | (Lower, Mixed) => &[Mixed],
        (Upper, Digit) | (Lower, Digit) => &[Digit],
        (Upper, Punct) | (Lower, Punct) => &[Mixed, Punct],
        (Lower, Upper) => &[Mixed, Upper],
        (Mixed, Upper) | (Punct, Upper) | (Digit, Upper) => &[Upper],
        (Mixed, Punct) => &[Punct],
        (Mixed, Digit) | (Punct, Digit) => &[Upper, Digit],
        (Punct, Lower) | (Digit, Lower) => &[Upper, Lower],
        (Punct, Mixed) | (Digit, Mixed) => &[Upper, Mixed],
        (Digit, Punct) => &[Upper, Mixed, Punct],
        _ => &[],
    }
}

/// Longest binary run one length prefix can describe: 31 plus an 11-bit extension.
pub const MAX_BINARY_RUN: usize = 31 + 2047;

/// One element of an encoded sequence.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// Persistent switch to another mode.
    Latch(Mode),
    /// Switch to another mode for the next token only.
    Shift(Mode),
    /// A character written with the active mode's table.
    Literal(u8),
    /// A two-character Punct mode shortcut such as CR LF.
    PunctPair(u8, u8),
    /// Raw bytes following a `Shift(Binary)`; the length prefix is derived from the run.
    BinaryRun(Vec<u8>),
    /// `FLG(n)` escape carrying an ECI designator of `n` decimal digits.
    FlgEci(u8, u32),
}

/// A token sequence together with its encoded length in bits.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Sequence {
    tokens: Vec<Token>,
    bit_cost: usize,
}

impl Sequence {
    /// The tokens, in encode order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of bits the tokens occupy once written.
    pub fn bit_cost(&self) -> usize {
        self.bit_cost
    }
}

/// The cheapest known way to reach a mode after some prefix of the input.
#[derive(Clone, Debug)]
struct Candidate {
    cost: usize,
    tokens: Vec<Token>,
    // Mode that writing resumes in once the open binary run ends.
    resume: Mode,
}

impl Candidate {
    fn extended(&self, extra: usize, tokens: &[Token]) -> Self {
        let mut result = self.clone();
        result.cost += extra;
        result.tokens.extend_from_slice(tokens);
        result
    }

    // True if the last token is `b` written with the Punct table.
    fn ends_with_punct_literal(&self, mode: Mode, b: u8) -> bool {
        match self.tokens.as_slice() {
            [.., Token::Shift(Mode::Punct), Token::Literal(last)] => *last == b,
            [.., Token::Literal(last)] => mode == Mode::Punct && *last == b,
            _ => false,
        }
    }
}

// Binary runs of 32 bytes or more have paid for the 11-bit extended length and are kept in
// a slot of their own after the six modes.
const EXTENDED_BINARY: usize = 6;

type States = [Option<Candidate>; 7];

fn slot_mode(slot: usize) -> Mode {
    Mode::ALL.get(slot).copied().unwrap_or(Mode::Binary)
}

fn relax(slot: &mut Option<Candidate>, candidate: Candidate) {
    if slot.as_ref().is_none_or(|current| candidate.cost < current.cost) {
        *slot = Some(candidate);
    }
}

/// Finds the token sequence with the fewest bits that reproduces `data`.
///
/// If `eci` is given, the sequence starts with an `FLG(n)` escape announcing that ECI
/// designator. This never fails: every byte can at least be written in Binary mode.
#[tracing::instrument(level = "trace", skip_all, fields(len = data.len()))]
pub fn find_optimal_sequence(data: &[u8], eci: Option<u32>) -> Sequence {
    let mut states: States = Default::default();
    states[Mode::Upper.ordinal()] = Some(Candidate {
        cost: 0,
        tokens: Vec::new(),
        resume: Mode::Upper,
    });

    let mut prev: Option<u8> = None;
    for &c in data {
        let migrated = migrate(&states);
        let mut next = append_char(&migrated, c);
        if let Some(p) = prev {
            fuse_punct_pair(&migrated, &mut next, p, c);
        }
        states = next;
        prev = Some(c);
    }

    let best = states
        .into_iter()
        .flatten()
        .min_by_key(|candidate| candidate.cost);
    let (mut tokens, mut bit_cost) = match best {
        Some(candidate) => (candidate.tokens, candidate.cost),
        None => (Vec::new(), 0),
    };

    if let Some(value) = eci {
        let digits = value.to_string().len() as u8;
        tokens.splice(0..0, [Token::Shift(Mode::Punct), Token::FlgEci(digits, value)]);
        bit_cost += 5 + 5 + 3 + 4 * usize::from(digits);
    }
    debug!(bit_cost, tokens = tokens.len(), "found optimal sequence");
    Sequence { tokens, bit_cost }
}

// Relaxes every mode through one latch from the frozen states of the previous byte.
fn migrate(states: &States) -> States {
    let mut result = states.clone();
    for (slot, source) in states.iter().enumerate() {
        let Some(source) = source else {
            continue;
        };
        let from = slot_mode(slot);
        for to in Mode::ALL {
            if to == from {
                continue;
            }
            let candidate = if to == Mode::Binary {
                enter_binary(source, from)
            } else if from == Mode::Binary {
                leave_binary(source, to)
            } else {
                let tokens: Vec<Token> = latch_path(from, to).iter().map(|&m| Token::Latch(m)).collect();
                let mut next = source.extended(LATCH_LEN[from.ordinal()][to.ordinal()], &tokens);
                next.resume = to;
                next
            };
            relax(&mut result[to.ordinal()], candidate);
        }
    }
    result
}

// Binary mode is entered with B/S, which only Upper, Lower and Mixed offer;
// Punct and Digit go through Upper first.
fn enter_binary(source: &Candidate, from: Mode) -> Candidate {
    let mut tokens = Vec::with_capacity(3);
    let resume = match from {
        Mode::Punct | Mode::Digit => {
            tokens.push(Token::Latch(Mode::Upper));
            Mode::Upper
        }
        _ => from,
    };
    tokens.push(Token::Shift(Mode::Binary));
    tokens.push(Token::BinaryRun(Vec::new()));
    let mut next = source.extended(LATCH_LEN[from.ordinal()][Mode::Binary.ordinal()], &tokens);
    next.resume = resume;
    next
}

// A binary run ends back in the mode it was entered from; reaching any other mode
// latches onward from there.
fn leave_binary(source: &Candidate, to: Mode) -> Candidate {
    let tokens: Vec<Token> = latch_path(source.resume, to)
        .iter()
        .map(|&m| Token::Latch(m))
        .collect();
    let mut next = source.extended(LATCH_LEN[source.resume.ordinal()][to.ordinal()], &tokens);
    next.resume = to;
    next
}

fn append_char(states: &States, c: u8) -> States {
    let mut next: States = Default::default();
    for x in Mode::ALL.into_iter().filter(|m| m.contains(c)) {
        if x == Mode::Binary {
            for slot in [Mode::Binary.ordinal(), EXTENDED_BINARY] {
                if let Some(source) = &states[slot] {
                    let (target, candidate) = append_binary(source, c);
                    relax(&mut next[target], candidate);
                }
            }
        } else if let Some(source) = &states[x.ordinal()] {
            let candidate = source.extended(usize::from(x.code_bits()), &[Token::Literal(c)]);
            relax(&mut next[x.ordinal()], candidate);
        }
        for y in Mode::ALL {
            if y == x || y == Mode::Binary {
                continue;
            }
            let (Some(source), Some(shift)) = (&states[y.ordinal()], SHIFT_LEN[y.ordinal()][x.ordinal()])
            else {
                continue;
            };
            let candidate = source.extended(
                shift + usize::from(x.code_bits()),
                &[Token::Shift(x), Token::Literal(c)],
            );
            relax(&mut next[y.ordinal()], candidate);
        }
    }
    next
}

// Returns the slot the extended run belongs in along with the run.
fn append_binary(source: &Candidate, c: u8) -> (usize, Candidate) {
    let mut next = source.clone();
    let len = match next.tokens.last_mut() {
        Some(Token::BinaryRun(run)) if run.len() < MAX_BINARY_RUN => {
            run.push(c);
            run.len()
        }
        _ => {
            next.tokens.push(Token::Shift(Mode::Binary));
            next.tokens.push(Token::BinaryRun(Vec::new()));
            next.cost += 5 + 5;
            return append_binary(&next, c);
        }
    };
    next.cost += 8;
    if len < 32 {
        return (Mode::Binary.ordinal(), next);
    }
    if len == 32 {
        next.cost += 11;
    }
    (EXTENDED_BINARY, next)
}

// Rewrites a trailing Punct literal and the current byte as one two-character code.
fn fuse_punct_pair(states: &States, next: &mut States, prev: u8, c: u8) {
    if pair_code(prev, c).is_none() {
        return;
    }
    for mode in Mode::ALL {
        let Some(source) = &states[mode.ordinal()] else {
            continue;
        };
        if !source.ends_with_punct_literal(mode, prev) {
            continue;
        }
        let mut candidate = source.clone();
        candidate.tokens.pop();
        candidate.tokens.push(Token::PunctPair(prev, c));
        relax(&mut next[mode.ordinal()], candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_latch_paths_match_latch_costs() {
        let text = [Mode::Upper, Mode::Lower, Mode::Mixed, Mode::Punct, Mode::Digit];
        for from in text {
            for to in text {
                let mut mode = from;
                let mut bits = 0;
                for &target in latch_path(from, to) {
                    assert!(mode.latch_code(target).is_some(), "{:?} cannot latch to {:?}", mode, target);
                    bits += usize::from(mode.code_bits());
                    mode = target;
                }
                assert_eq!(mode, to);
                assert_eq!(bits, LATCH_LEN[from.ordinal()][to.ordinal()], "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_shift_costs_match_shift_codes() {
        for from in Mode::ALL {
            for to in Mode::ALL {
                if let Some(bits) = SHIFT_LEN[from.ordinal()][to.ordinal()] {
                    assert!(from.shift_code(to).is_some());
                    assert_eq!(bits, usize::from(from.code_bits()));
                }
            }
        }
    }

    #[test]
    fn test_char_codes() {
        assert_eq!(Mode::Upper.char_code(b' '), Some(1));
        assert_eq!(Mode::Upper.char_code(b'A'), Some(2));
        assert_eq!(Mode::Upper.char_code(b'Z'), Some(27));
        assert_eq!(Mode::Lower.char_code(b'z'), Some(27));
        assert_eq!(Mode::Mixed.char_code(b'\r'), Some(14));
        assert_eq!(Mode::Mixed.char_code(0x7f), Some(27));
        assert_eq!(Mode::Punct.char_code(b'\r'), Some(1));
        assert_eq!(Mode::Punct.char_code(b'!'), Some(6));
        assert_eq!(Mode::Punct.char_code(b'}'), Some(30));
        assert_eq!(Mode::Digit.char_code(b'0'), Some(2));
        assert_eq!(Mode::Digit.char_code(b'.'), Some(13));
        assert_eq!(Mode::Upper.char_code(b'a'), None);
        assert_eq!(pair_code(b'\r', b'\n'), Some(2));
        assert_eq!(pair_code(b':', b' '), Some(5));
        assert_eq!(pair_code(b' ', b':'), None);
    }

    #[test]
    fn test_empty_input() {
        let seq = find_optimal_sequence(b"", None);
        assert!(seq.tokens().is_empty());
        assert_eq!(seq.bit_cost(), 0);
    }

    #[test]
    fn test_upper_text_needs_no_mode_change() {
        let seq = find_optimal_sequence(b"AB C", None);
        assert_eq!(
            seq.tokens(),
            &[
                Token::Literal(b'A'),
                Token::Literal(b'B'),
                Token::Literal(b' '),
                Token::Literal(b'C')
            ]
        );
        assert_eq!(seq.bit_cost(), 20);
    }

    #[test]
    fn test_lowercase_latches_once() {
        let seq = find_optimal_sequence(b"hello", None);
        assert_eq!(seq.tokens()[0], Token::Latch(Mode::Lower));
        assert_eq!(seq.bit_cost(), 5 + 5 * 5);
    }

    #[test]
    fn test_single_upper_in_lowercase_is_shifted() {
        let seq = find_optimal_sequence(b"abCd", None);
        assert_eq!(
            seq.tokens(),
            &[
                Token::Latch(Mode::Lower),
                Token::Literal(b'a'),
                Token::Literal(b'b'),
                Token::Shift(Mode::Upper),
                Token::Literal(b'C'),
                Token::Literal(b'd')
            ]
        );
    }

    #[test]
    fn test_digits_use_digit_mode() {
        let seq = find_optimal_sequence(b"12345678", None);
        assert_eq!(seq.tokens()[0], Token::Latch(Mode::Digit));
        assert_eq!(seq.bit_cost(), 5 + 8 * 4);
    }

    #[test]
    fn test_punct_pair_is_fused() {
        let seq = find_optimal_sequence(b"A. B", None);
        assert_eq!(
            seq.tokens(),
            &[
                Token::Literal(b'A'),
                Token::Shift(Mode::Punct),
                Token::PunctPair(b'.', b' '),
                Token::Literal(b'B')
            ]
        );
        assert_eq!(seq.bit_cost(), 20);
    }

    #[test]
    fn test_crlf_is_fused() {
        let seq = find_optimal_sequence(b"\r\n", None);
        assert_eq!(seq.tokens(), &[Token::Shift(Mode::Punct), Token::PunctPair(b'\r', b'\n')]);
        assert_eq!(seq.bit_cost(), 10);
    }

    #[test]
    fn test_high_bytes_use_binary() {
        let seq = find_optimal_sequence(&[0xff, 0xfe], None);
        assert_eq!(
            seq.tokens(),
            &[Token::Shift(Mode::Binary), Token::BinaryRun(vec![0xff, 0xfe])]
        );
        assert_eq!(seq.bit_cost(), 10 + 16);
    }

    #[test]
    fn test_binary_run_resumes_previous_mode() {
        let seq = find_optimal_sequence(b"ab\xe9cd", None);
        assert_eq!(
            seq.tokens(),
            &[
                Token::Latch(Mode::Lower),
                Token::Literal(b'a'),
                Token::Literal(b'b'),
                Token::Shift(Mode::Binary),
                Token::BinaryRun(vec![0xe9]),
                Token::Literal(b'c'),
                Token::Literal(b'd')
            ]
        );
        assert_eq!(seq.bit_cost(), 5 + 10 + 10 + 8 + 10);
    }

    #[test]
    fn test_long_binary_run_adds_extended_length() {
        let data = vec![0u8; 200];
        let seq = find_optimal_sequence(&data, None);
        assert_eq!(seq.tokens(), &[Token::Shift(Mode::Binary), Token::BinaryRun(data)]);
        assert_eq!(seq.bit_cost(), 10 + 11 + 200 * 8);
    }

    #[test]
    fn test_oversized_binary_run_is_split() {
        let data = vec![0x80u8; MAX_BINARY_RUN + 1];
        let seq = find_optimal_sequence(&data, None);
        let runs: Vec<usize> = seq
            .tokens()
            .iter()
            .filter_map(|t| match t {
                Token::BinaryRun(run) => Some(run.len()),
                _ => None,
            })
            .collect();
        assert_eq!(runs, vec![MAX_BINARY_RUN, 1]);
    }

    #[test]
    fn test_short_text_inside_long_run_stays_binary() {
        let mut data = vec![0x80u8; 40];
        data.extend_from_slice(b"AAAA");
        data.extend(vec![0x80u8; 40]);
        let seq = find_optimal_sequence(&data, None);
        assert_eq!(seq.tokens(), &[Token::Shift(Mode::Binary), Token::BinaryRun(data.clone())]);
        assert_eq!(seq.bit_cost(), 10 + 11 + 8 * data.len());
    }

    #[test]
    fn test_eci_prefix() {
        let seq = find_optimal_sequence(b"A", Some(26));
        assert_eq!(
            seq.tokens(),
            &[Token::Shift(Mode::Punct), Token::FlgEci(2, 26), Token::Literal(b'A')]
        );
        assert_eq!(seq.bit_cost(), 5 + 5 + 3 + 8 + 5);
    }
}
