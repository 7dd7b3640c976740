//! CPU and memory state.
use crate::{
    bytecode::word,
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: Address,
    /// Stack pointer, the number of occupied stack slots.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address.
    ///
    /// The full 16 bits are kept. Memory accesses through it are masked to 12 bits.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0.
    pub(crate) sound_timer: u8,
    /// Indicates that the machine is waiting for a keypress.
    pub(crate) key_wait: bool,
    /// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
    pub(crate) key_state: u16,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn to. Each cell is either 0 or 1.
    pub(crate) display: Box<[u8; DISPLAY_BUFFER_SIZE]>,
    /// Set when the display buffer changed and the host should redraw.
    pub(crate) dirty: bool,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            key_wait: false,
            key_state: 0,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Box::new([0; DISPLAY_BUFFER_SIZE]),
            dirty: false,
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear_display(&mut self) {
        self.display.fill(0);
        self.dirty = true;
    }

    pub fn set_key_state(&mut self, key_id: u8, state: bool) {
        if key_id < KEY_COUNT {
            if state {
                self.key_state |= 1 << key_id;
            } else {
                self.key_state &= !(1 << key_id);
            }
        }
    }

    pub fn key_state(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.key_state & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Retrieve the value of the first key that is pressed down.
    #[inline]
    pub fn first_key(&self) -> Option<u8> {
        if self.any_key() {
            (0..KEY_COUNT).find(|k| self.key_state(*k))
        } else {
            None
        }
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear_keys(&mut self) {
        self.key_state = 0;
    }

    /// Count down the delay and sound timers, stopping at zero.
    ///
    /// Returns `true` when the sound timer expires on this tick.
    #[inline]
    pub fn tick_timers(&mut self) -> bool {
        let expired = self.sound_timer == 1;
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
        expired
    }

    /// Read the byte at the given address, wrapped to the address space.
    #[inline(always)]
    pub fn mem(&self, addr: usize) -> u8 {
        self.ram[addr & ADDRESS_MASK]
    }

    /// Mutable access to the byte at the given address, wrapped to the address space.
    #[inline(always)]
    pub fn mem_mut(&mut self, addr: usize) -> &mut u8 {
        &mut self.ram[addr & ADDRESS_MASK]
    }

    /// Extract the instruction word at the current program counter.
    #[inline(always)]
    pub fn instr(&self) -> u16 {
        let pc = self.pc as usize;
        word(self.mem(pc), self.mem(pc + 1))
    }

    /// Push a return address onto the call stack.
    pub fn push_stack(&mut self, addr: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow);
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recent return address from the call stack.
    pub fn pop_stack(&mut self) -> Chip8Result<Address> {
        match self.sp.checked_sub(1) {
            Some(sp) => {
                self.sp = sp;
                Ok(self.stack[sp])
            }
            None => Err(Chip8Error::StackUnderflow),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut cpu = Chip8Cpu::default();

        cpu.set_key_state(0, true);
        assert_eq!(cpu.key_state, 0b00000000_00000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(!cpu.key_state(7));

        cpu.set_key_state(7, true);
        assert_eq!(cpu.key_state, 0b00000000_10000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(0, false);
        assert_eq!(cpu.key_state, 0b00000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(15, true);
        assert_eq!(cpu.key_state, 0b10000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));
        assert!(cpu.key_state(15));

        // Out of range keys are ignored.
        cpu.set_key_state(16, true);
        assert_eq!(cpu.key_state, 0b10000000_10000000);
        assert!(!cpu.key_state(16));
    }

    #[test]
    fn test_first_key_ascending() {
        let mut cpu = Chip8Cpu::default();
        assert_eq!(cpu.first_key(), None);

        cpu.set_key_state(0xC, true);
        cpu.set_key_state(0x3, true);
        assert_eq!(cpu.first_key(), Some(0x3));

        cpu.clear_keys();
        assert_eq!(cpu.first_key(), None);
    }

    #[test]
    fn test_stack_bounds() {
        let mut cpu = Chip8Cpu::default();
        assert!(matches!(cpu.pop_stack(), Err(Chip8Error::StackUnderflow)));

        for i in 0..STACK_SIZE {
            cpu.push_stack(i as Address).unwrap();
        }
        assert!(matches!(
            cpu.push_stack(0xFFF),
            Err(Chip8Error::StackOverflow)
        ));
        assert_eq!(cpu.sp, STACK_SIZE);
        assert_eq!(cpu.pop_stack().unwrap(), (STACK_SIZE - 1) as Address);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut cpu = Chip8Cpu::default();
        cpu.delay_timer = 1;
        cpu.sound_timer = 2;

        assert!(!cpu.tick_timers());
        assert_eq!((cpu.delay_timer, cpu.sound_timer), (0, 1));
        assert!(cpu.tick_timers());
        assert_eq!((cpu.delay_timer, cpu.sound_timer), (0, 0));
        assert!(!cpu.tick_timers());
        assert_eq!((cpu.delay_timer, cpu.sound_timer), (0, 0));
    }

    #[test]
    fn test_memory_wraps() {
        let mut cpu = Chip8Cpu::default();
        *cpu.mem_mut(MEM_SIZE + 3) = 0xAB;
        assert_eq!(cpu.mem(3), 0xAB);

        cpu.ram[MEM_SIZE - 1] = 0x12;
        cpu.ram[0] = 0x34;
        cpu.pc = (MEM_SIZE - 1) as Address;
        assert_eq!(cpu.instr(), 0x1234);
    }
}
