mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod opcode;
pub mod rom;
mod vm;

pub use self::{devices::KeyCode, vm::Hz};

pub mod prelude {
    pub use super::{
        clock::Clock,
        devices::{InvalidKeyCode, KeyCode},
        disasm::Disassembler,
        display::{DisplaySnapshot, FrameHandoff},
        error::{Chip8Error, Chip8Result, HexTokenKind},
        opcode::{AluOp, KeyOp, MiscOp, Opcode, SysOp},
        vm::{Chip8Conf, Chip8Vm, Flow, Hz},
    };
}
