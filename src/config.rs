//! Aztec symbol sizes and their capacities.

use tracing::debug;

use crate::error::EncodeError;

/// Share of the symbol, in percent, spent on error correction when none is given.
pub const DEFAULT_EC_PERCENT: u32 = 23;

/// One Aztec symbol variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SymbolConfig {
    /// Width and height in modules.
    pub size: usize,
    pub compact: bool,
    /// Number of data layers around the finder pattern.
    pub layers: usize,
    /// Data plus parity codewords the layers hold.
    pub codewords: usize,
    pub codeword_bits: u8,
    pub total_bits: usize,
}

impl SymbolConfig {
    const fn new(
        size: usize,
        compact: bool,
        layers: usize,
        codewords: usize,
        codeword_bits: u8,
        total_bits: usize,
    ) -> Self {
        Self {
            size,
            compact,
            layers,
            codewords,
            codeword_bits,
            total_bits,
        }
    }

    /// Most data codewords the symbol can announce in its mode message.
    pub fn max_data_codewords(&self) -> usize {
        let announceable = if self.compact { 1 << 6 } else { 1 << 11 };
        self.codewords.min(announceable)
    }
}

/// Every Aztec symbol, smallest first. At equal size the compact symbol, which holds more,
/// comes first.
pub static SYMBOLS: [SymbolConfig; 36] = [
    SymbolConfig::new(15, true, 1, 17, 6, 102),
    SymbolConfig::new(19, true, 2, 40, 6, 240),
    SymbolConfig::new(19, false, 1, 21, 6, 126),
    SymbolConfig::new(23, true, 3, 51, 8, 408),
    SymbolConfig::new(23, false, 2, 48, 6, 288),
    SymbolConfig::new(27, true, 4, 76, 8, 608),
    SymbolConfig::new(27, false, 3, 60, 8, 480),
    SymbolConfig::new(31, false, 4, 88, 8, 704),
    SymbolConfig::new(37, false, 5, 120, 8, 960),
    SymbolConfig::new(41, false, 6, 156, 8, 1248),
    SymbolConfig::new(45, false, 7, 196, 8, 1568),
    SymbolConfig::new(49, false, 8, 240, 8, 1920),
    SymbolConfig::new(53, false, 9, 230, 10, 2300),
    SymbolConfig::new(57, false, 10, 272, 10, 2720),
    SymbolConfig::new(61, false, 11, 316, 10, 3160),
    SymbolConfig::new(67, false, 12, 364, 10, 3640),
    SymbolConfig::new(71, false, 13, 416, 10, 4160),
    SymbolConfig::new(75, false, 14, 470, 10, 4700),
    SymbolConfig::new(79, false, 15, 528, 10, 5280),
    SymbolConfig::new(83, false, 16, 588, 10, 5880),
    SymbolConfig::new(87, false, 17, 652, 10, 6520),
    SymbolConfig::new(91, false, 18, 720, 10, 7200),
    SymbolConfig::new(95, false, 19, 790, 10, 7900),
    SymbolConfig::new(101, false, 20, 864, 10, 8640),
    SymbolConfig::new(105, false, 21, 940, 10, 9400),
    SymbolConfig::new(109, false, 22, 1020, 10, 10200),
    SymbolConfig::new(113, false, 23, 920, 12, 11040),
    SymbolConfig::new(117, false, 24, 992, 12, 11904),
    SymbolConfig::new(121, false, 25, 1066, 12, 12792),
    SymbolConfig::new(125, false, 26, 1144, 12, 13728),
    SymbolConfig::new(131, false, 27, 1224, 12, 14688),
    SymbolConfig::new(135, false, 28, 1306, 12, 15672),
    SymbolConfig::new(139, false, 29, 1392, 12, 16704),
    SymbolConfig::new(143, false, 30, 1480, 12, 17760),
    SymbolConfig::new(147, false, 31, 1570, 12, 18840),
    SymbolConfig::new(151, false, 32, 1664, 12, 19968),
];

/// Finds the symbol with the given size and compactness.
pub fn lookup(size: usize, compact: bool) -> Result<&'static SymbolConfig, EncodeError> {
    SYMBOLS
        .iter()
        .find(|c| c.size == size && c.compact == compact)
        .ok_or(EncodeError::UnsupportedConfiguration { size, compact })
}

/// Bits a symbol must hold for a payload of `bit_len` bits at `ec_percent` error correction.
pub fn required_bits(bit_len: usize, ec_percent: u32) -> Result<usize, EncodeError> {
    if ec_percent >= 100 {
        return Err(EncodeError::InvalidEcPercent(ec_percent));
    }
    let data_share = 100 - ec_percent as usize;
    Ok(((bit_len + 3) * 100).div_ceil(data_share))
}

/// Symbols large enough for `required` bits, smallest first.
pub fn candidates(required: usize) -> impl Iterator<Item = &'static SymbolConfig> {
    SYMBOLS.iter().filter(move |c| c.total_bits >= required)
}

/// Picks the smallest symbol for a payload of `bit_len` bits.
///
/// Each symbol large enough for the payload is offered to `fit`, smallest first; the first
/// one it accepts is returned along with what `fit` produced for it.
pub fn select_symbol<T>(
    bit_len: usize,
    ec_percent: u32,
    mut fit: impl FnMut(&'static SymbolConfig) -> Option<T>,
) -> Result<(&'static SymbolConfig, T), EncodeError> {
    let required = required_bits(bit_len, ec_percent)?;
    let (config, fitted) = candidates(required)
        .find_map(|c| fit(c).map(|fitted| (c, fitted)))
        .ok_or(EncodeError::CapacityExceeded {
            required,
            capacity: max_capacity(),
        })?;
    debug!(size = config.size, compact = config.compact, required, "selected symbol");
    Ok((config, fitted))
}

/// Bits held by the largest symbol.
pub fn max_capacity() -> usize {
    SYMBOLS.iter().map(|c| c.total_bits).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_consistent() {
        for config in SYMBOLS.iter() {
            assert_eq!(config.size % 2, 1, "{:?}", config);
            assert_eq!(
                config.codewords * usize::from(config.codeword_bits),
                config.total_bits,
                "{:?}",
                config
            );
        }
        assert_eq!(SYMBOLS.iter().filter(|c| c.compact).count(), 4);
    }

    #[test]
    fn test_table_is_sorted() {
        for pair in SYMBOLS.windows(2) {
            assert!((pair[0].size, !pair[0].compact) < (pair[1].size, !pair[1].compact));
        }
    }

    #[test]
    fn test_lookup() {
        let config = lookup(23, true).unwrap();
        assert_eq!(config.layers, 3);
        assert_eq!(config.codeword_bits, 8);
        assert_eq!(
            lookup(14, true),
            Err(EncodeError::UnsupportedConfiguration {
                size: 14,
                compact: true
            })
        );
        assert!(lookup(15, false).is_err());
    }

    #[test]
    fn test_required_bits() {
        assert_eq!(required_bits(0, 23).unwrap(), 4);
        assert_eq!(required_bits(74, 23).unwrap(), 100);
        assert_eq!(required_bits(97, 0).unwrap(), 100);
        assert_eq!(required_bits(10, 100), Err(EncodeError::InvalidEcPercent(100)));
    }

    fn smallest(bit_len: usize) -> Result<&'static SymbolConfig, EncodeError> {
        select_symbol(bit_len, 23, |_| Some(())).map(|(config, ())| config)
    }

    #[test]
    fn test_select_smallest() {
        assert_eq!(smallest(0).unwrap().size, 15);
        // 300 bits need ceil(303 * 100 / 77) = 394 bits.
        let config = smallest(300).unwrap();
        assert_eq!((config.size, config.compact), (23, true));
        // 500 bits overflow every compact symbol.
        let config = smallest(500).unwrap();
        assert_eq!((config.size, config.compact), (31, false));
    }

    #[test]
    fn test_select_boundary_is_inclusive() {
        // ceil((75 + 3) * 100 / 77) = 102 exactly fills the 15x15 symbol.
        assert_eq!(required_bits(75, 23).unwrap(), 102);
        assert_eq!(smallest(75).unwrap().size, 15);
        let config = smallest(76).unwrap();
        assert_eq!((config.size, config.compact), (19, true));
    }

    #[test]
    fn test_select_skips_rejected_symbols() {
        let (config, layers) = select_symbol(0, 23, |c| (!c.compact).then_some(c.layers)).unwrap();
        assert_eq!((config.size, config.compact, layers), (19, false, 1));
    }

    #[test]
    fn test_select_too_large() {
        let err = smallest(20_000).unwrap_err();
        assert!(matches!(err, EncodeError::CapacityExceeded { capacity: 19968, .. }));
        let err = select_symbol(0, 23, |_| None::<()>).unwrap_err();
        assert!(matches!(err, EncodeError::CapacityExceeded { required: 4, .. }));
    }

    #[test]
    fn test_max_data_codewords() {
        assert_eq!(lookup(27, true).unwrap().max_data_codewords(), 64);
        assert_eq!(lookup(15, true).unwrap().max_data_codewords(), 17);
        assert_eq!(lookup(151, false).unwrap().max_data_codewords(), 1664);
    }
}
