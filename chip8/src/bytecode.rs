//! Helpers for extracting operand fields from instruction words.
//!
//! An instruction is two bytes, combined big-endian into a 16-bit word:
//!
//! ```text
//!  15   12 11    8 7     4 3     0
//! +-------+-------+-------+-------+
//! |  op   |   X   |   Y   |   N   |
//! +-------+-------+-------+-------+
//!                 |      NN       |
//!         |          NNN          |
//! ```

/// Combine two bytes into an instruction word.
#[inline(always)]
pub fn word(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | b as u16
}

/// Extract the opcode group from the upper nibble.
#[inline(always)]
pub fn op_code(word: u16) -> u8 {
    ((word & 0xF000) >> 12) as u8
}

/// Extract operand X, the first register selector.
#[inline(always)]
pub fn op_x(word: u16) -> u8 {
    ((word & 0x0F00) >> 8) as u8
}

/// Extract operand Y, the second register selector.
#[inline(always)]
pub fn op_y(word: u16) -> u8 {
    ((word & 0x00F0) >> 4) as u8
}

/// Extract operand N, the lowest nibble.
#[inline(always)]
pub fn op_n(word: u16) -> u8 {
    (word & 0x000F) as u8
}

/// Extract operand NN, the lower byte.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Extract operand NNN, the 12-bit address.
#[inline(always)]
pub fn op_nnn(word: u16) -> u16 {
    word & 0x0FFF
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fields() {
        let w = word(0xD1, 0x25);
        assert_eq!(w, 0xD125);
        assert_eq!(op_code(w), 0xD);
        assert_eq!(op_x(w), 0x1);
        assert_eq!(op_y(w), 0x2);
        assert_eq!(op_n(w), 0x5);
        assert_eq!(op_nn(w), 0x25);
        assert_eq!(op_nnn(w), 0x125);
    }
}
