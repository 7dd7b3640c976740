//! Virtual machine.
use std::{
    fmt::{self, Write},
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    devices::KeyCode,
    display::DisplaySnapshot,
    error::{Chip8Error, Chip8Result},
    opcode::{AluOp, KeyOp, MiscOp, Opcode, SysOp},
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    rng: StdRng,
    conf: Chip8Conf,
}

impl Default for Chip8Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8Vm {
    /// Create a machine with zeroed state and the program counter at `MEM_START`.
    pub fn new() -> Self {
        Self::with_conf(Chip8Conf::default())
    }

    /// Create a machine whose random number source is seeded for repeatable runs.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_conf(Chip8Conf {
            seed: Some(seed),
            ..Chip8Conf::default()
        })
    }

    pub fn with_conf(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Chip8Vm {
            cpu: Chip8Cpu::new(),
            rng,
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Load the builtin hexadecimal glyphs into the font area.
    pub fn load_builtin_font(&mut self) -> Chip8Result<()> {
        self.load_font(&FONTSET)
    }

    /// Copy glyph data into memory at `FONTSET_START`.
    ///
    /// `Fx29` assumes glyphs are `FONTSET_HEIGHT` bytes each, packed together.
    pub fn load_font(&mut self, fontset: &[u8]) -> Chip8Result<()> {
        let start = FONTSET_START as usize;
        if start + fontset.len() > MEM_START {
            return Err(Chip8Error::Font(format!(
                "fontset data must fit in {} bytes, got {}",
                MEM_START - start,
                fontset.len()
            )));
        }

        self.cpu.ram[start..start + fontset.len()].copy_from_slice(fontset);

        Ok(())
    }

    /// Copy a program into memory, starting at `MEM_START`.
    ///
    /// Memory outside the program's range is left untouched.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if bytecode.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::LargeProgram);
        }

        // Load program into virtual RAM
        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);

        log::debug!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer was changed by `CLS` or `DRW`.
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    /// The program counter is not advanced, so the next step executes
    /// the same instruction again.
    KeyWait,
    /// The word could not be decoded and was skipped.
    Unsupported(u16),
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Instructions executed per second by the host.
    pub clock_frequency: Option<Hz>,
    /// Rate at which the host counts down the timers.
    pub timer_frequency: Option<Hz>,
    /// Seed for the `RND` instruction. Seeded from entropy when absent.
    pub seed: Option<u64>,
}

impl Chip8Conf {
    pub fn clock_interval(&self) -> Duration {
        self.clock_frequency
            .unwrap_or(Hz(DEFAULT_CLOCK_FREQUENCY))
            .into()
    }

    pub fn timer_interval(&self) -> Duration {
        self.timer_frequency.unwrap_or(Hz(DELAY_FREQUENCY)).into()
    }
}

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl Hz {
    /// Highest frequency with a non-zero interval.
    pub const MAX: Hz = Hz(NANOS_IN_SECOND);
}

/// Zero hertz converts to a zero interval. Frequencies above [`Hz::MAX`]
/// are clamped to it, so they never round down to zero.
impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0.min(Hz::MAX.0))
        }
    }
}

/// Host interface
impl Chip8Vm {
    /// Sets the keyboard key input state.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.set_key_state(key.as_u8(), pressed);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.cpu.key_state(key.as_u8())
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.clear_keys()
    }

    /// Count down the delay and sound timers by one, stopping at zero.
    ///
    /// Returns `true` when the sound timer expires on this tick, which is
    /// the signal for the host to sound the buzzer. The host decides how
    /// often to call this, conventionally 60 times a second.
    pub fn tick_timers(&mut self) -> bool {
        self.cpu.tick_timers()
    }

    /// Row-major display cells, `0` for unset and `1` for set.
    pub fn display(&self) -> &[u8; DISPLAY_BUFFER_SIZE] {
        &self.cpu.display
    }

    /// Copy of the current display buffer.
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot::new(&self.cpu.display)
    }

    /// Whether the display changed since the host last cleared the flag.
    pub fn is_dirty(&self) -> bool {
        self.cpu.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.cpu.dirty = false;
    }

    /// Snapshot the display and clear the dirty flag, if the display changed.
    pub fn take_frame(&mut self) -> Option<DisplaySnapshot> {
        if self.cpu.dirty {
            self.cpu.dirty = false;
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// Whether the last executed instruction was an unsatisfied `Fx0A`.
    pub fn is_waiting_for_key(&self) -> bool {
        self.cpu.key_wait
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc
    }

    pub fn sp(&self) -> usize {
        self.cpu.sp
    }

    /// Index register I.
    pub fn index(&self) -> Address {
        self.cpu.address
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    pub fn memory(&self) -> &[u8; MEM_SIZE] {
        &self.cpu.ram
    }
}

/// Interpreter
impl Chip8Vm {
    /// Execute up to `step_count` instructions.
    ///
    /// Returns the flow of the last executed step.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut flow = Flow::Ok;

        for _ in 0..step_count {
            flow = self.step()?;
        }

        Ok(flow)
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Stack errors are returned after the program counter was advanced
    /// past the faulting instruction. The stack itself is unchanged.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        // Each instruction is two bytes, with the opcode identity in the first 4-bit nibble.
        let op = Opcode::decode(self.cpu.instr());

        op_trace(self.cpu.pc, &op);

        self.cpu.pc = self.cpu.pc.wrapping_add(2);

        self.execute(op)
    }

    fn execute(&mut self, op: Opcode) -> Chip8Result<Flow> {
        let flow = match op {
            // Clear screen and subroutine return
            Opcode::Sys(op) => self.exec_sys(op)?,
            // 1NNN (JP addr)
            //
            // Jump to address.
            Opcode::Jump { nnn } => {
                self.cpu.pc = nnn;
                Flow::Jump
            }
            // 2NNN (CALL addr)
            //
            // Call subroutine at NNN.
            // The return address is the instruction after the call.
            Opcode::Call { nnn } => {
                self.cpu.push_stack(self.cpu.pc)?;
                self.cpu.pc = nnn;
                Flow::Jump
            }
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            Opcode::SkipEqImm { x, nn } => self.skip_if(self.vx(x) == nn),
            // 4XNN (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            Opcode::SkipNeImm { x, nn } => self.skip_if(self.vx(x) != nn),
            // 5XY0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            Opcode::SkipEqReg { x, y } => self.skip_if(self.vx(x) == self.vx(y)),
            // 6XNN (LD Vx, byte)
            //
            // Set register VX to value NN.
            Opcode::LoadImm { x, nn } => {
                self.cpu.registers[x as usize] = nn;
                Flow::Ok
            }
            // 7XNN (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            Opcode::AddImm { x, nn } => {
                self.cpu.registers[x as usize] = self.vx(x).wrapping_add(nn);
                Flow::Ok
            }
            // Arithmetic instructions indentified by n
            Opcode::Alu { x, y, op } => self.exec_math(x, y, op),
            // 9XY0 (SNE Vx, Vy)
            //
            // Skip next instruction if Vx != Vy.
            Opcode::SkipNeReg { x, y } => self.skip_if(self.vx(x) != self.vx(y)),
            // ANNN (LD I, addr)
            //
            // Set address register I to value NNN.
            Opcode::LoadIndex { nnn } => {
                self.cpu.address = nnn;
                Flow::Ok
            }
            // BNNN (JP V0, addr)
            //
            // Jump to address NNN offset by register V0.
            Opcode::JumpOffset { nnn } => {
                self.cpu.pc = nnn + self.vx(0) as Address;
                Flow::Jump
            }
            // CXNN (RND Vx, byte)
            //
            // Generate random number.
            // Set register VX to the result of bitwise AND between a random number and NN.
            Opcode::Random { x, nn } => {
                self.cpu.registers[x as usize] = self.rng.gen::<u8>() & nn;
                Flow::Ok
            }
            // DXYN (DRW Vx, Vy, nibble)
            Opcode::Draw { x, y, n } => self.exec_draw(x, y, n),
            // Keyboard skips identified by nn
            Opcode::Key { x, op } => self.exec_key(x, op),
            // Miscellaneous instructions identified by nn
            Opcode::Misc { x, op } => self.exec_misc(x, op),
            // Unsupported operation.
            //
            // Reported, then skipped like a no-op.
            Opcode::Unsupported(word) => {
                log::warn!(
                    "unsupported opcode {word:04X} at {:04X}",
                    self.cpu.pc.wrapping_sub(2)
                );
                Flow::Unsupported(word)
            }
        };

        Ok(flow)
    }

    #[inline(always)]
    fn vx(&self, x: u8) -> u8 {
        self.cpu.registers[x as usize]
    }

    #[inline]
    fn skip_if(&mut self, condition: bool) -> Flow {
        if condition {
            self.cpu.pc = self.cpu.pc.wrapping_add(2);
        }
        Flow::Ok
    }

    fn exec_sys(&mut self, op: SysOp) -> Chip8Result<Flow> {
        match op {
            // 00E0 (CLS)
            //
            // Clear display
            SysOp::ClearDisplay => {
                self.cpu.clear_display();
                Ok(Flow::Draw)
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Subtract 1 from the stack pointer.
            // Set the program counter to the value at the top of the stack.
            SysOp::Return => {
                self.cpu.pc = self.cpu.pop_stack()?;
                Ok(Flow::Jump)
            }
        }
    }

    /// Execute an arithmetic instruction
    ///
    /// Flags and results are both computed from the register values before
    /// the instruction. VF is written before VX, so when X is F the result
    /// overwrites the flag.
    #[inline]
    #[must_use]
    fn exec_math(&mut self, x: u8, y: u8, op: AluOp) -> Flow {
        let (vx, vy) = (self.vx(x), self.vx(y));

        let (result, flag) = match op {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            AluOp::Load => (vy, None),
            // 8XY1 (OR Vx, Vy)
            AluOp::Or => (vx | vy, None),
            // 8XY2 (AND Vx, Vy)
            AluOp::And => (vx & vy, None),
            // 8XY3 (XOR Vx, Vy)
            AluOp::Xor => (vx ^ vy, None),
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VX to VY, and stores the result in VX.
            // Overflow is wrapped.
            // If overflow, set VF to 1, else 0.
            AluOp::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 1 only when VX is strictly greater than VY,
            // so equal operands clear the flag.
            AluOp::Sub => (vx.wrapping_sub(vy), Some((vx > vy) as u8)),
            // 8XY6 (SHR Vx)
            //
            // VF is set to the least-significant bit of VX.
            // Shift VX right by 1.
            // VY is unused.
            AluOp::Shr => (vx >> 1, Some(vx & 1)),
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 1 only when VY is strictly greater than VX.
            AluOp::SubN => (vy.wrapping_sub(vx), Some((vy > vx) as u8)),
            // 8XYE (SHL Vx)
            //
            // VF is set to the most-significant bit of VX.
            // Shift VX left by 1.
            // VY is unused.
            AluOp::Shl => (vx << 1, Some(vx >> 7)),
        };

        if let Some(flag) = flag {
            self.cpu.registers[FLAG_REGISTER] = flag;
        }
        self.cpu.registers[x as usize] = result;

        Flow::Ok
    }

    /// DXYN (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
    /// Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
    /// memory pointed to by address register I.
    ///
    /// Each pixel wraps around to the other side of the display independently,
    /// so a sprite crossing an edge continues on the opposite edge.
    ///
    /// If the drawing operation erases existing pixels in the display buffer, register VF is set to
    /// 1, and set to 0 if no display bits are unset. This is used for collision detection.
    fn exec_draw(&mut self, x: u8, y: u8, n: u8) -> Flow {
        let (x, y) = (self.vx(x) as usize, self.vx(y) as usize);
        let address = self.cpu.address as usize;
        let mut is_erased = false;

        for r in 0..n as usize {
            // Each row is 8 bits representing the 8 pixels of the sprite.
            let row = self.cpu.mem(address + r);

            for c in 0..SPRITE_WIDTH {
                if (row >> (7 - c)) & 1 == 0 {
                    continue;
                }

                let d = (x + c) % DISPLAY_WIDTH + ((y + r) % DISPLAY_HEIGHT) * DISPLAY_WIDTH;

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= self.cpu.display[d] == 1;
                self.cpu.display[d] ^= 1;
            }
        }

        // If a pixel was erased, then a collision occurred.
        self.cpu.registers[FLAG_REGISTER] = is_erased as u8;
        self.cpu.dirty = true;

        Flow::Draw
    }

    /// Execute a keyboard skip instruction
    fn exec_key(&mut self, x: u8, op: KeyOp) -> Flow {
        // Values past the keypad read as released.
        let pressed = self.cpu.key_state(self.vx(x));

        match op {
            // EX9E (SKP Vx)
            //
            // Skip next instruction if the key with the value of Vx is pressed.
            KeyOp::SkipPressed => self.skip_if(pressed),
            // EXA1 (SKNP Vx)
            //
            // Skip next instruction if the key with the value of Vx is not pressed.
            KeyOp::SkipNotPressed => self.skip_if(!pressed),
        }
    }

    /// Execute a miscellaneous instruction
    #[must_use]
    fn exec_misc(&mut self, x: u8, op: MiscOp) -> Flow {
        let mut control_flow = Flow::Ok;

        match op {
            // Fx07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            MiscOp::LoadDelay => {
                self.cpu.registers[x as usize] = self.cpu.delay_timer;
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // Keys are scanned from 0 to F, and the lowest pressed key wins.
            MiscOp::WaitKey => {
                if let Some(k) = self.cpu.first_key() {
                    self.cpu.registers[x as usize] = k;
                    self.cpu.key_wait = false;
                } else {
                    // rewind the program counter to stall the machine
                    self.cpu.pc = self.cpu.pc.wrapping_sub(2);
                    self.cpu.key_wait = true;
                    control_flow = Flow::KeyWait;
                }
            }
            // Fx15 (LD DT, Vx)
            //
            // Set delay timer = Vx.
            MiscOp::SetDelay => {
                self.cpu.delay_timer = self.vx(x);
            }
            // Fx18 (LD ST, Vx)
            //
            // Set sound timer = Vx.
            MiscOp::SetSound => {
                self.cpu.sound_timer = self.vx(x);
            }
            // Fx1E (ADD I, Vx)
            //
            // Add Vx to I. VF is not affected, and I is not masked.
            MiscOp::AddIndex => {
                self.cpu.address = self.cpu.address.wrapping_add(self.vx(x) as Address);
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            MiscOp::FontGlyph => {
                self.cpu.address = FONTSET_START + self.vx(x) as Address * FONTSET_HEIGHT;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            MiscOp::StoreBcd => {
                let addr = self.cpu.address as usize;
                let value = self.vx(x);
                *self.cpu.mem_mut(addr) = value / 100;
                *self.cpu.mem_mut(addr + 1) = value / 10 % 10;
                *self.cpu.mem_mut(addr + 2) = value % 10;
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            MiscOp::StoreRegisters => {
                let addr = self.cpu.address as usize;
                for v in 0..=x as usize {
                    *self.cpu.mem_mut(addr + v) = self.cpu.registers[v];
                }
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            MiscOp::LoadRegisters => {
                let addr = self.cpu.address as usize;
                for v in 0..=x as usize {
                    self.cpu.registers[v] = self.cpu.mem(addr + v);
                }
            }
        }

        control_flow
    }
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns the program memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        let end = count.saturating_add(MEM_START).min(MEM_SIZE - 1);

        for i in (MEM_START..end).step_by(2) {
            writeln!(
                buf,
                "{:04X}: {:02X}{:02X}",
                i,
                self.cpu.ram[i],
                self.cpu.ram[i + 1]
            )?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> String {
        self.snapshot().to_text('#', '.')
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.any_key() {
            write!(buf, "keys: ")?;
            for i in 0..KEY_COUNT {
                if self.cpu.key_state(i) {
                    write!(buf, "k{i:x}")?;
                }
            }
        }

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: Address, op: &Opcode) {
    log::trace!("{pc:04X}: {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: &Opcode) {}
