//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{bytecode::word, constants::MEM_START, opcode::Opcode};

/// Writes a listing of a program image, one instruction per line.
///
/// Addresses are shown as they would be after loading, starting at `MEM_START`.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Write the whole listing to the given writer.
    pub fn disassemble<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble_next(w)?;
        }
        Ok(())
    }

    /// Write a single instruction to the given writer, and advance the cursor.
    ///
    /// A trailing odd byte is padded with zero.
    pub fn disassemble_next<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        let hi = self.bytecode.get(self.cursor).copied().unwrap_or_default();
        let lo = self.bytecode.get(self.cursor + 1).copied().unwrap_or_default();
        let instr = word(hi, lo);

        writeln!(
            w,
            "{:04X}: {:04X}  {}",
            MEM_START + self.cursor,
            instr,
            Opcode::decode(instr)
        )?;

        self.cursor += 2;

        Ok(())
    }

    /// Convenience for writing the listing into a new string.
    pub fn to_listing(&mut self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        self.disassemble(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_listing() {
        let bytecode = [0x60, 0x0A, 0x61, 0x05, 0x80, 0x14, 0x00, 0xE0];
        let listing = Disassembler::new(&bytecode).to_listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(
            lines,
            vec![
                "0200: 600A  LD V0, 0x0A",
                "0202: 6105  LD V1, 0x05",
                "0204: 8014  ADD V0, V1",
                "0206: 00E0  CLS",
            ]
        );
    }

    #[test]
    fn test_odd_length() {
        let listing = Disassembler::new(&[0x12]).to_listing().unwrap();
        assert_eq!(listing, "0200: 1200  JP 0x200\n");
    }

    #[test]
    fn test_unsupported_word() {
        let listing = Disassembler::new(&[0xFF, 0xFF]).to_listing().unwrap();
        assert_eq!(listing, "0200: FFFF  DW 0xFFFF\n");
    }
}
