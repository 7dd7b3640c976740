//! Instruction decoding.
//!
//! Words are decoded into an [`Opcode`] in two levels. The upper nibble
//! selects the group, and the groups `0___`, `8___`, `E___` and `F___`
//! select a sub-operation from the lower nibble or byte.
use std::fmt::{self, Display, Formatter};

use crate::{bytecode::*, constants::Address};

/// A decoded instruction with its operand fields.
///
/// Register operands `x` and `y` are indices into V0-VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// `00E0` and `00EE`
    Sys(SysOp),
    /// `1NNN` (JP addr)
    Jump { nnn: Address },
    /// `2NNN` (CALL addr)
    Call { nnn: Address },
    /// `3XNN` (SE Vx, byte)
    SkipEqImm { x: u8, nn: u8 },
    /// `4XNN` (SNE Vx, byte)
    SkipNeImm { x: u8, nn: u8 },
    /// `5XY_` (SE Vx, Vy)
    SkipEqReg { x: u8, y: u8 },
    /// `6XNN` (LD Vx, byte)
    LoadImm { x: u8, nn: u8 },
    /// `7XNN` (ADD Vx, byte)
    AddImm { x: u8, nn: u8 },
    /// `8XYN` register to register arithmetic.
    Alu { x: u8, y: u8, op: AluOp },
    /// `9XY_` (SNE Vx, Vy)
    SkipNeReg { x: u8, y: u8 },
    /// `ANNN` (LD I, addr)
    LoadIndex { nnn: Address },
    /// `BNNN` (JP V0, addr)
    JumpOffset { nnn: Address },
    /// `CXNN` (RND Vx, byte)
    Random { x: u8, nn: u8 },
    /// `DXYN` (DRW Vx, Vy, nibble)
    Draw { x: u8, y: u8, n: u8 },
    /// `EX9E` and `EXA1`
    Key { x: u8, op: KeyOp },
    /// `FX__` timers, index register and memory transfers.
    Misc { x: u8, op: MiscOp },
    /// Word that does not encode any known instruction.
    Unsupported(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysOp {
    /// `00E0` (CLS)
    ClearDisplay,
    /// `00EE` (RET)
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    /// `8XY0` (LD Vx, Vy)
    Load,
    /// `8XY1` (OR Vx, Vy)
    Or,
    /// `8XY2` (AND Vx, Vy)
    And,
    /// `8XY3` (XOR Vx, Vy)
    Xor,
    /// `8XY4` (ADD Vx, Vy)
    Add,
    /// `8XY5` (SUB Vx, Vy)
    Sub,
    /// `8XY6` (SHR Vx)
    Shr,
    /// `8XY7` (SUBN Vx, Vy)
    SubN,
    /// `8XYE` (SHL Vx)
    Shl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOp {
    /// `EX9E` (SKP Vx)
    SkipPressed,
    /// `EXA1` (SKNP Vx)
    SkipNotPressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscOp {
    /// `FX07` (LD Vx, DT)
    LoadDelay,
    /// `FX0A` (LD Vx, K)
    WaitKey,
    /// `FX15` (LD DT, Vx)
    SetDelay,
    /// `FX18` (LD ST, Vx)
    SetSound,
    /// `FX1E` (ADD I, Vx)
    AddIndex,
    /// `FX29` (LD F, Vx)
    FontGlyph,
    /// `FX33` (LD B, Vx)
    StoreBcd,
    /// `FX55` (LD [I], Vx)
    StoreRegisters,
    /// `FX65` (LD Vx, [I])
    LoadRegisters,
}

impl Opcode {
    /// Decode an instruction word.
    ///
    /// Decoding never fails. Words that don't match an instruction
    /// become [`Opcode::Unsupported`].
    pub fn decode(word: u16) -> Self {
        let x = op_x(word);
        let y = op_y(word);
        let n = op_n(word);
        let nn = op_nn(word);
        let nnn = op_nnn(word);

        match op_code(word) {
            0x0 => match word {
                0x00E0 => Self::Sys(SysOp::ClearDisplay),
                0x00EE => Self::Sys(SysOp::Return),
                _ => Self::Unsupported(word),
            },
            0x1 => Self::Jump { nnn },
            0x2 => Self::Call { nnn },
            0x3 => Self::SkipEqImm { x, nn },
            0x4 => Self::SkipNeImm { x, nn },
            // The lower nibble is not inspected.
            0x5 => Self::SkipEqReg { x, y },
            0x6 => Self::LoadImm { x, nn },
            0x7 => Self::AddImm { x, nn },
            0x8 => match AluOp::from_nibble(n) {
                Some(op) => Self::Alu { x, y, op },
                None => Self::Unsupported(word),
            },
            0x9 => Self::SkipNeReg { x, y },
            0xA => Self::LoadIndex { nnn },
            0xB => Self::JumpOffset { nnn },
            0xC => Self::Random { x, nn },
            0xD => Self::Draw { x, y, n },
            0xE => match nn {
                0x9E => Self::Key {
                    x,
                    op: KeyOp::SkipPressed,
                },
                0xA1 => Self::Key {
                    x,
                    op: KeyOp::SkipNotPressed,
                },
                _ => Self::Unsupported(word),
            },
            0xF => match MiscOp::from_byte(nn) {
                Some(op) => Self::Misc { x, op },
                None => Self::Unsupported(word),
            },
            _ => unreachable!("opcode group is a 4-bit value"),
        }
    }
}

impl AluOp {
    fn from_nibble(n: u8) -> Option<Self> {
        match n {
            0x0 => Some(Self::Load),
            0x1 => Some(Self::Or),
            0x2 => Some(Self::And),
            0x3 => Some(Self::Xor),
            0x4 => Some(Self::Add),
            0x5 => Some(Self::Sub),
            0x6 => Some(Self::Shr),
            0x7 => Some(Self::SubN),
            0xE => Some(Self::Shl),
            _ => None,
        }
    }

    fn mnemonic(self) -> &'static str {
        match self {
            Self::Load => "LD",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Shr => "SHR",
            Self::SubN => "SUBN",
            Self::Shl => "SHL",
        }
    }
}

impl MiscOp {
    fn from_byte(nn: u8) -> Option<Self> {
        match nn {
            0x07 => Some(Self::LoadDelay),
            0x0A => Some(Self::WaitKey),
            0x15 => Some(Self::SetDelay),
            0x18 => Some(Self::SetSound),
            0x1E => Some(Self::AddIndex),
            0x29 => Some(Self::FontGlyph),
            0x33 => Some(Self::StoreBcd),
            0x55 => Some(Self::StoreRegisters),
            0x65 => Some(Self::LoadRegisters),
            _ => None,
        }
    }
}

/// Formats the instruction as assembly mnemonic.
impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Sys(SysOp::ClearDisplay) => write!(f, "CLS"),
            Self::Sys(SysOp::Return) => write!(f, "RET"),
            Self::Jump { nnn } => write!(f, "JP 0x{nnn:03X}"),
            Self::Call { nnn } => write!(f, "CALL 0x{nnn:03X}"),
            Self::SkipEqImm { x, nn } => write!(f, "SE V{x:X}, 0x{nn:02X}"),
            Self::SkipNeImm { x, nn } => write!(f, "SNE V{x:X}, 0x{nn:02X}"),
            Self::SkipEqReg { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            Self::LoadImm { x, nn } => write!(f, "LD V{x:X}, 0x{nn:02X}"),
            Self::AddImm { x, nn } => write!(f, "ADD V{x:X}, 0x{nn:02X}"),
            Self::Alu {
                x,
                op: op @ (AluOp::Shr | AluOp::Shl),
                ..
            } => write!(f, "{} V{x:X}", op.mnemonic()),
            Self::Alu { x, y, op } => write!(f, "{} V{x:X}, V{y:X}", op.mnemonic()),
            Self::SkipNeReg { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::LoadIndex { nnn } => write!(f, "LD I, 0x{nnn:03X}"),
            Self::JumpOffset { nnn } => write!(f, "JP V0, 0x{nnn:03X}"),
            Self::Random { x, nn } => write!(f, "RND V{x:X}, 0x{nn:02X}"),
            Self::Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::Key {
                x,
                op: KeyOp::SkipPressed,
            } => write!(f, "SKP V{x:X}"),
            Self::Key {
                x,
                op: KeyOp::SkipNotPressed,
            } => write!(f, "SKNP V{x:X}"),
            Self::Misc { x, op } => match op {
                MiscOp::LoadDelay => write!(f, "LD V{x:X}, DT"),
                MiscOp::WaitKey => write!(f, "LD V{x:X}, K"),
                MiscOp::SetDelay => write!(f, "LD DT, V{x:X}"),
                MiscOp::SetSound => write!(f, "LD ST, V{x:X}"),
                MiscOp::AddIndex => write!(f, "ADD I, V{x:X}"),
                MiscOp::FontGlyph => write!(f, "LD F, V{x:X}"),
                MiscOp::StoreBcd => write!(f, "LD B, V{x:X}"),
                MiscOp::StoreRegisters => write!(f, "LD [I], V{x:X}"),
                MiscOp::LoadRegisters => write!(f, "LD V{x:X}, [I]"),
            },
            Self::Unsupported(word) => write!(f, "DW 0x{word:04X}"),
        }
    }
}
