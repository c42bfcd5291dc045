//! Galois field arithmetic and Reed–Solomon parity generation.
//!
//! Aztec Code protects its data codewords with a Reed–Solomon code over GF(2^m), where m
//! is the codeword width of the symbol (6, 8, 10 or 12 bits). The mode message uses
//! GF(16) regardless of the symbol size.

/// Prime modulus polynomials indexed by codeword width in bits.
static POLYNOMIALS: [(u8, u32); 5] = [(4, 19), (6, 67), (8, 301), (10, 1033), (12, 4201)];

/// Returns the modulus polynomial for GF(2^`bits`), if Aztec defines one.
pub fn polynomial_for(bits: u8) -> Option<u32> {
    POLYNOMIALS.iter().find(|&&(b, _)| b == bits).map(|&(_, pp)| pp)
}

/// A finite field GF(2^m) with precomputed log and antilog tables.
#[derive(Clone, Debug)]
pub struct GaloisField {
    order: usize,
    log: Vec<u16>,
    alog: Vec<u16>,
}

impl GaloisField {
    /// Builds the field of the given order with the given modulus polynomial.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a power of two between 4 and 4096.
    pub fn new(order: usize, polynomial: u32) -> Self {
        assert!(
            order.is_power_of_two() && (4..=4096).contains(&order),
            "Field order out of range"
        );
        let mut log = vec![0u16; order];
        let mut alog = vec![0u16; order];
        let mut value: u32 = 1;
        for (i, entry) in alog.iter_mut().enumerate() {
            *entry = value as u16;
            // The antilog sequence wraps to 1 at i = order - 1; keep log(1) = 0.
            if i < order - 1 {
                log[value as usize] = i as u16;
            }
            value <<= 1;
            if value >= order as u32 {
                value ^= polynomial;
            }
        }
        Self { order, log, alog }
    }

    /// The field used for codewords of the given width.
    ///
    /// # Panics
    ///
    /// Panics if no Aztec polynomial exists for `bits`.
    pub fn for_codeword_bits(bits: u8) -> Self {
        let Some(polynomial) = polynomial_for(bits) else {
            panic!("No modulus polynomial for codeword width {}", bits);
        };
        Self::new(1 << bits, polynomial)
    }

    /// Number of elements in the field.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns alpha raised to `power`.
    pub fn exp(&self, power: usize) -> u16 {
        self.alog[power % (self.order - 1)]
    }

    /// Returns the product of the two field elements.
    pub fn multiply(&self, x: u16, y: u16) -> u16 {
        if x == 0 || y == 0 {
            return 0;
        }
        let sum = usize::from(self.log[usize::from(x)]) + usize::from(self.log[usize::from(y)]);
        self.alog[sum % (self.order - 1)]
    }
}

/// Computes Reed–Solomon check codewords for a fixed number of parity symbols.
pub struct ReedSolomonGenerator {
    field: GaloisField,
    // Generator coefficients from x^(degree-1) down to x^0; the leading 1 is implied.
    divisor: Vec<u16>,
}

impl ReedSolomonGenerator {
    /// Builds the generator polynomial (x - a^1)(x - a^2)...(x - a^degree).
    pub fn new(field: GaloisField, degree: usize) -> Self {
        let mut coefficients = vec![0u16; degree + 1];
        coefficients[0] = 1;
        for i in 1..=degree {
            let root = field.exp(i);
            coefficients[i] = coefficients[i - 1];
            for j in (1..i).rev() {
                coefficients[j] = coefficients[j - 1] ^ field.multiply(coefficients[j], root);
            }
            coefficients[0] = field.multiply(coefficients[0], root);
        }
        let divisor = coefficients[..degree].iter().rev().copied().collect();
        Self { field, divisor }
    }

    /// Number of check codewords this generator produces.
    pub fn degree(&self) -> usize {
        self.divisor.len()
    }

    /// Writes the check codewords for `data` into `result`.
    ///
    /// # Panics
    ///
    /// Panics if `result` does not have exactly [`degree`](Self::degree) entries or if a
    /// data codeword lies outside the field.
    pub fn compute_remainder(&self, data: &[u16], result: &mut [u16]) {
        assert_eq!(result.len(), self.degree());
        result.fill(0);
        if result.is_empty() {
            return;
        }
        for &word in data {
            assert!(usize::from(word) < self.field.order(), "Codeword outside the field");
            let factor = word ^ result[0];
            result.copy_within(1.., 0);
            let last = result.len() - 1;
            result[last] = 0;
            for (x, &y) in result.iter_mut().zip(self.divisor.iter()) {
                *x ^= self.field.multiply(y, factor);
            }
        }
    }
}

/// Appends `parity_count` Reed–Solomon check codewords to `codewords` in place.
pub fn append_parity(codewords: &mut Vec<u16>, parity_count: usize, field: GaloisField) {
    let generator = ReedSolomonGenerator::new(field, parity_count);
    let mut parity = vec![0u16; parity_count];
    generator.compute_remainder(codewords, &mut parity);
    codewords.extend_from_slice(&parity);
}
