//! ASCII ↔ EBCDIC (code page 037).

/// EBCDIC code for each 7-bit ASCII code.
const ASCII_TO_EBCDIC: [u8; 128] = [
    0x00, 0x01, 0x02, 0x03, 0x37, 0x2D, 0x2E, 0x2F, 0x16, 0x05, 0x25, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    0x10, 0x11, 0x12, 0x13, 0x3C, 0x3D, 0x32, 0x26, 0x18, 0x19, 0x3F, 0x27, 0x1C, 0x1D, 0x1E, 0x1F,
    0x40, 0x5A, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D, 0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F,
    0x7C, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6,
    0xD7, 0xD8, 0xD9, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xBA, 0xE0, 0xBB, 0xB0, 0x6D,
    0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96,
    0x97, 0x98, 0x99, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xC0, 0x4F, 0xD0, 0xA1, 0x07,
];

/// Inverse of [`ASCII_TO_EBCDIC`]; `0xFF` marks a code with no ASCII form.
const EBCDIC_TO_ASCII: [u8; 256] = {
    let mut table = [0xFF; 256];
    let mut i = 0;
    while i < 128 {
        table[ASCII_TO_EBCDIC[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// EBCDIC question mark, used for characters with no EBCDIC form.
const EBCDIC_UNKNOWN: u8 = 0x6F;

pub fn ascii_to_ebcdic(b: u8) -> u8 {
    ASCII_TO_EBCDIC
        .get(b as usize)
        .copied()
        .unwrap_or(EBCDIC_UNKNOWN)
}

pub fn ebcdic_to_ascii(b: u8) -> Option<u8> {
    match EBCDIC_TO_ASCII[b as usize] {
        0xFF => None,
        a => Some(a),
    }
}

/// Convert a string whose characters are ASCII codes.  Each result
/// character carries one EBCDIC byte.
pub fn str_to_ebcdic(s: &str) -> String {
    s.chars()
        .map(|c| {
            let b = u8::try_from(u32::from(c)).map_or(EBCDIC_UNKNOWN, ascii_to_ebcdic);
            char::from(b)
        })
        .collect()
}

/// Convert a string whose characters are EBCDIC bytes back to ASCII.
pub fn str_from_ebcdic(s: &str) -> String {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c))
                .ok()
                .and_then(ebcdic_to_ascii)
                .map_or('?', char::from)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(str_to_ebcdic("TEST"), "\u{e3}\u{c5}\u{e2}\u{e3}");
        assert_eq!(str_from_ebcdic("\u{e3}\u{c5}\u{e2}\u{e3}"), "TEST");
        assert_eq!(str_to_ebcdic("a1 "), "\u{81}\u{f1}\u{40}");
    }

    #[test]
    fn unmappable() {
        assert_eq!(str_to_ebcdic("\u{e9}"), "\u{6f}");
        assert_eq!(str_from_ebcdic("\u{30}"), "?");
        assert_eq!(str_from_ebcdic("\u{263a}"), "?");
    }

    #[test]
    fn tables_are_inverse() {
        for a in 0u8..128 {
            assert_eq!(ebcdic_to_ascii(ascii_to_ebcdic(a)), Some(a));
        }
    }
}
