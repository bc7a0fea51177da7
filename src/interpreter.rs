//! # interpreter
//!
//! The CHIP-8 machine itself: memory, the sixteen V registers, I, the program
//! counter, a call stack and the two 60Hz timers, plus the fetch/decode/execute
//! cycle that drives them.
//!
//! The host owns an interpreter and calls:
//!  * `.step()` -- run one instruction, at whatever rate it likes
//!  * `.tick_timers()` -- at a steady 60Hz, independent of `.step()`
//!
//! and reads the framebuffer/sound timer back out in between. Both calls take
//! `&mut self`, so a host running them on separate threads wraps the
//! interpreter in a single `Mutex`.
//!
//! State machine:
//!
//! ```text
//!  Running --FX0A--> AwaitingKey --key down--> Running
//!     |                   |
//!     `-- halt/fault -----+---> Halted (terminal)
//! ```

use crate::display::Framebuffer;
use crate::error::{Chip8Error, Result};
use crate::input::Keypad;
use crate::instruction::Instruction;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_FONT_BYTES, CHIP8_GLYPH_BYTES};
use crate::quirks::Quirks;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const CHIP8_REGISTER_COUNT: usize = 16;
pub const CHIP8_STACK_DEPTH: usize = 16;

/// VF doubles as the carry/borrow/collision flag
const FLAG: usize = 0xf;

/// why the interpreter stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// 0000 was executed
    Program,
    /// a jump to itself; the usual way a CHIP-8 program ends
    InfiniteLoop,
    /// a fatal error was returned from `.step()`
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    /// FX0A is waiting for a key to go down, to store it in `register`
    AwaitingKey { register: usize },
    Halted(HaltReason),
}

/// what a successful `.step()` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    /// the framebuffer changed (clear or draw)
    Drew,
    /// no instruction ran; still waiting on FX0A
    AwaitingKey,
    /// the word at the program counter means nothing; it was skipped
    UnknownOpcode(u16),
    Halted(HaltReason),
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    registers: [u8; CHIP8_REGISTER_COUNT],
    index: u16,
    program_counter: u16,
    stack: Vec<u16>,
    delay_timer: u8,
    sound_timer: u8,
    display: Framebuffer,
    keypad: Keypad,
    quirks: Quirks,
    state: State,
    rng: StdRng,
}

impl Chip8Interpreter {
    /// bake in the font, load the program at 0x200 and get ready to run it
    pub fn new(
        font: &[u8; CHIP8_FONT_BYTES],
        program: &[u8],
        quirks: Quirks,
    ) -> Result<Chip8Interpreter> {
        Self::with_rng(font, program, quirks, StdRng::from_os_rng())
    }

    /// as `new`, but CXNN draws from a generator seeded with `seed`
    pub fn with_seed(
        font: &[u8; CHIP8_FONT_BYTES],
        program: &[u8],
        quirks: Quirks,
        seed: u64,
    ) -> Result<Chip8Interpreter> {
        Self::with_rng(font, program, quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        font: &[u8; CHIP8_FONT_BYTES],
        program: &[u8],
        quirks: Quirks,
        rng: StdRng,
    ) -> Result<Chip8Interpreter> {
        let mut memory = Chip8MemoryMap::new(font)?;
        memory.load_program(program)?;
        let program_counter = memory.program_addr;
        Ok(Chip8Interpreter {
            memory,
            registers: [0; CHIP8_REGISTER_COUNT],
            index: 0x0000,
            program_counter,
            stack: Vec::with_capacity(CHIP8_STACK_DEPTH),
            delay_timer: 0x00,
            sound_timer: 0x00,
            display: Framebuffer::default(),
            keypad: Keypad::new(),
            quirks,
            state: State::Running,
            rng,
        })
    }

    /// one fetch/decode/execute cycle. Fatal errors halt the interpreter and
    /// are returned exactly once; after that every call is `Err(Halted)`.
    pub fn step(&mut self) -> Result<StepOutcome> {
        match self.state {
            State::Halted(_) => return Err(Chip8Error::Halted),
            State::AwaitingKey { register } => return Ok(self.resume_on_key(register)),
            State::Running => {}
        }
        let outcome = self.cycle();
        if let Err(e) = &outcome {
            if e.is_fatal() {
                self.state = State::Halted(HaltReason::Fault);
            }
        }
        outcome
    }

    /// count both timers down by one, stopping at zero; call at 60Hz
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn resume_on_key(&mut self, register: usize) -> StepOutcome {
        match self.keypad.take_press() {
            Some(key) => {
                self.registers[register] = key;
                self.state = State::Running;
                StepOutcome::Executed
            }
            None => StepOutcome::AwaitingKey,
        }
    }

    fn cycle(&mut self) -> Result<StepOutcome> {
        let addr = self.program_counter;
        let word = self.fetch()?;
        self.execute(addr, Instruction::decode(word))
    }

    /// read the instruction at PC and move PC on to the next one
    fn fetch(&mut self) -> Result<u16> {
        let word = self
            .memory
            .get_word(self.program_counter)
            .map_err(|e| match e {
                Chip8Error::MemoryOutOfBounds { address } => {
                    Chip8Error::OutOfBoundsFetch { address }
                }
                e => e,
            })?;
        self.program_counter = self.program_counter.wrapping_add(2);
        Ok(word)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    fn halt(&mut self, reason: HaltReason) -> StepOutcome {
        self.state = State::Halted(reason);
        StepOutcome::Halted(reason)
    }

    /// `addr` is where the instruction was fetched from; PC is already past it
    fn execute(&mut self, addr: u16, instruction: Instruction) -> Result<StepOutcome> {
        use Instruction::*;
        let v = &mut self.registers;
        match instruction {
            Halt => return Ok(self.halt(HaltReason::Program)),
            ClearScreen => {
                self.display.clear();
                return Ok(StepOutcome::Drew);
            }
            Return => {
                self.program_counter = self.stack.pop().ok_or(Chip8Error::StackUnderflow)?;
            }
            Jump { nnn } => {
                if nnn == addr {
                    return Ok(self.halt(HaltReason::InfiniteLoop));
                }
                self.program_counter = nnn;
            }
            Call { nnn } => {
                if self.stack.len() >= CHIP8_STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow {
                        depth: CHIP8_STACK_DEPTH,
                    });
                }
                self.stack.push(self.program_counter);
                self.program_counter = nnn;
            }
            SkipEqImm { x, nn } => {
                let c = v[x] == nn;
                self.skip_if(c);
            }
            SkipNeImm { x, nn } => {
                let c = v[x] != nn;
                self.skip_if(c);
            }
            SkipEqReg { x, y } => {
                let c = v[x] == v[y];
                self.skip_if(c);
            }
            SkipNeReg { x, y } => {
                let c = v[x] != v[y];
                self.skip_if(c);
            }
            LoadImm { x, nn } => v[x] = nn,
            AddImm { x, nn } => v[x] = v[x].wrapping_add(nn),
            Move { x, y } => v[x] = v[y],
            Or { x, y } => v[x] |= v[y],
            And { x, y } => v[x] &= v[y],
            Xor { x, y } => v[x] ^= v[y],
            AddReg { x, y } => {
                let (sum, overflow) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                // NB. set when the add did *not* carry
                v[FLAG] = !overflow as u8;
            }
            SubReg { x, y } => {
                v[FLAG] = (v[x] >= v[y]) as u8;
                v[x] = v[x].wrapping_sub(v[y]);
            }
            SubFromReg { x, y } => {
                v[FLAG] = (v[y] >= v[x]) as u8;
                v[y] = v[y].wrapping_sub(v[x]);
            }
            ShiftRight { x, y } => {
                if self.quirks.legacy_shift {
                    v[x] = v[y];
                }
                v[FLAG] = v[x] & 0x01;
                v[x] >>= 1;
            }
            ShiftLeft { x, y } => {
                if self.quirks.legacy_shift {
                    v[x] = v[y];
                }
                v[FLAG] = v[x] >> 7;
                v[x] <<= 1;
            }
            LoadIndex { nnn } => self.index = nnn,
            JumpOffset { x, nnn } => {
                let offset = if self.quirks.legacy_jump { v[0] } else { v[x] };
                self.program_counter = nnn + offset as u16;
            }
            Random { x, nn } => v[x] = self.rng.random::<u8>() & nn,
            Draw { x, y, n } => {
                let sprite = self.memory.get_ro_slice(self.index, n as usize)?;
                let collision = self.display.draw_sprite(v[x], v[y], sprite);
                v[FLAG] = collision as u8;
                return Ok(StepOutcome::Drew);
            }
            SkipKeyPressed { x } => {
                let c = self.keypad.is_pressed(v[x]);
                self.skip_if(c);
            }
            SkipKeyNotPressed { x } => {
                let c = !self.keypad.is_pressed(v[x]);
                self.skip_if(c);
            }
            GetDelay { x } => v[x] = self.delay_timer,
            SetDelay { x } => self.delay_timer = v[x],
            SetSound { x } => self.sound_timer = v[x],
            AddIndex { x } => {
                let sum = self.index as u32 + v[x] as u32;
                if sum > 0xfff {
                    // VF is only ever set here, never cleared
                    self.index = (sum % 0x1000) as u16;
                    v[FLAG] = 1;
                } else {
                    self.index = sum as u16;
                }
            }
            WaitKey { x } => {
                // only keys that go down from here on count
                self.keypad.forget_presses();
                self.state = State::AwaitingKey { register: x };
                return Ok(StepOutcome::AwaitingKey);
            }
            FontChar { x } => {
                self.index = self.memory.font_addr + v[x] as u16 * CHIP8_GLYPH_BYTES;
            }
            Bcd { x } => {
                let value = v[x];
                self.memory
                    .write(self.index, &[value / 100, value / 10 % 10, value % 10])?;
            }
            StoreRegs { x } => {
                self.memory.write(self.index, &v[..=x])?;
                if self.quirks.increment_index {
                    self.index = self.index.wrapping_add(x as u16 + 1);
                }
            }
            LoadRegs { x } => {
                let data = self.memory.get_ro_slice(self.index, x + 1)?;
                v[..=x].copy_from_slice(data);
                if self.quirks.increment_index {
                    self.index = self.index.wrapping_add(x as u16 + 1);
                }
            }
            Unknown(word) => return Ok(StepOutcome::UnknownOpcode(word)),
        }
        Ok(StepOutcome::Executed)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, State::Halted(_))
    }

    pub fn registers(&self) -> &[u8; CHIP8_REGISTER_COUNT] {
        &self.registers
    }

    pub fn register(&self, x: usize) -> u8 {
        self.registers[x]
    }

    pub fn set_register(&mut self, x: usize, value: u8) {
        self.registers[x] = value;
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// return addresses, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    /// non-zero means the tone should be playing
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Chip8MemoryMap {
        &mut self.memory
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    /// whether the screen changed since the last time anyone asked
    pub fn take_display_dirty(&mut self) -> bool {
        self.display.take_dirty()
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }
}
