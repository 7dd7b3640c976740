//! Program images stored as hexadecimal text.
//!
//! An image is a sequence of whitespace separated words. Each word is
//! exactly four hexadecimal digits and decodes to two bytes, so a word
//! usually holds one instruction:
//!
//! ```text
//! 600A 6105
//! 8014
//! ```
use std::{fs, path::Path};

use crate::error::{Chip8Error, Chip8Result, HexTokenKind};

/// Number of characters in a word.
const WORD_LENGTH: usize = 4;

/// Parse a hexadecimal program image into bytecode.
///
/// Any malformed word fails the whole image.
pub fn parse_hex_image(source: &str) -> Chip8Result<Vec<u8>> {
    let mut bytecode = Vec::with_capacity(source.len() / 2);

    for (index, token) in source.split_whitespace().enumerate() {
        let [a, b] = parse_word(token).map_err(|kind| Chip8Error::HexToken {
            position: index + 1,
            token: token.to_string(),
            kind,
        })?;
        bytecode.push(a);
        bytecode.push(b);
    }

    Ok(bytecode)
}

/// Read and parse a hexadecimal program image file.
pub fn load_hex_file(filepath: impl AsRef<Path>) -> Chip8Result<Vec<u8>> {
    let source = fs::read_to_string(filepath.as_ref())?;
    parse_hex_image(&source)
}

fn parse_word(token: &str) -> Result<[u8; 2], HexTokenKind> {
    if token.chars().count() != WORD_LENGTH {
        return Err(HexTokenKind::Length);
    }

    // `from_str_radix` accepts a leading sign, which is not a digit.
    if !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexTokenKind::Digit);
    }

    u16::from_str_radix(token, 16)
        .map(u16::to_be_bytes)
        .map_err(|_| HexTokenKind::Digit)
}
