//! Text transcoding and ECI designators.
//!
//! Readers assume ISO 8859-1 unless the symbol starts with an ECI escape naming another
//! character set.

use crate::error::EncodeError;

static ECI_DESIGNATORS: [(&str, u32); 26] = [
    ("cp437", 0),
    ("iso88591", 1),
    ("iso88592", 4),
    ("iso88593", 5),
    ("iso88594", 6),
    ("iso88595", 7),
    ("iso88596", 8),
    ("iso88597", 9),
    ("iso88598", 10),
    ("iso88599", 11),
    ("iso885913", 15),
    ("iso885914", 16),
    ("iso885915", 17),
    ("iso885916", 18),
    ("shiftjis", 20),
    ("cp1250", 21),
    ("cp1251", 22),
    ("cp1252", 23),
    ("cp1256", 24),
    ("utf16be", 25),
    ("utf8", 26),
    ("ascii", 27),
    ("big5", 28),
    ("gb18030", 29),
    ("euckr", 30),
    ("latin1", 1),
];

/// Returns the ECI designator for a character set name.
///
/// Names match case-insensitively and ignore `-` and `_`, so `"UTF-8"`, `"utf_8"` and
/// `"utf8"` are the same set.
pub fn eci_designator(name: &str) -> Option<u32> {
    let key: String = name
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    ECI_DESIGNATORS
        .iter()
        .find(|(n, _)| *n == key)
        .map(|&(_, eci)| eci)
}

/// A character set that text can be transcoded to before encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Charset {
    Latin1,
    Ascii,
    Utf8,
    Utf16Be,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Latin1 => "iso8859-1",
            Charset::Ascii => "ascii",
            Charset::Utf8 => "utf-8",
            Charset::Utf16Be => "utf-16-be",
        }
    }

    /// The ECI designator announcing this character set.
    pub fn eci(self) -> u32 {
        match self {
            Charset::Latin1 => 1,
            Charset::Ascii => 27,
            Charset::Utf8 => 26,
            Charset::Utf16Be => 25,
        }
    }

    /// Transcodes `text` to bytes in this character set.
    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodeError> {
        match self {
            Charset::Latin1 => self.encode_single_byte(text, 0xff),
            Charset::Ascii => self.encode_single_byte(text, 0x7f),
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        }
    }

    fn encode_single_byte(self, text: &str, max: u32) -> Result<Vec<u8>, EncodeError> {
        text.chars()
            .map(|ch| {
                if u32::from(ch) <= max {
                    Ok(u32::from(ch) as u8)
                } else {
                    Err(EncodeError::UnencodableCharacter {
                        ch,
                        charset: self.name(),
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eci_designator_names() {
        assert_eq!(eci_designator("utf-8"), Some(26));
        assert_eq!(eci_designator("UTF_8"), Some(26));
        assert_eq!(eci_designator("ISO-8859-15"), Some(17));
        assert_eq!(eci_designator("Shift_JIS"), Some(20));
        assert_eq!(eci_designator("cp437"), Some(0));
        assert_eq!(eci_designator("koi8-r"), None);
    }

    #[test]
    fn test_charset_eci_matches_table() {
        for charset in [Charset::Latin1, Charset::Ascii, Charset::Utf8, Charset::Utf16Be] {
            assert_eq!(eci_designator(charset.name()), Some(charset.eci()));
        }
    }

    #[test]
    fn test_latin1() {
        assert_eq!(Charset::Latin1.encode("caf\u{e9}").unwrap(), b"caf\xe9".to_vec());
        let err = Charset::Latin1.encode("\u{20ac}").unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnencodableCharacter {
                ch: '\u{20ac}',
                charset: "iso8859-1"
            }
        );
    }

    #[test]
    fn test_ascii_rejects_high_characters() {
        assert_eq!(Charset::Ascii.encode("abc").unwrap(), b"abc".to_vec());
        assert!(Charset::Ascii.encode("\u{e9}").is_err());
    }

    #[test]
    fn test_utf16_be() {
        assert_eq!(Charset::Utf16Be.encode("A\u{20ac}").unwrap(), vec![0x00, 0x41, 0x20, 0xac]);
    }
}
