//! # environment
//!
//! Sets everything up around the interpreter and runs the main loop. The
//! interpreter knows nothing of wallclock time; the environment gives it a
//! fixed number of instructions per frame, then ticks the timers, then
//! sleeps off whatever is left of the frame:
//!
//!  main loop
//!   |-- input.poll(keypad)
//!   |-- interpreter.step() x cycles_per_frame   // stops early on FX0A
//!   |-- interpreter.tick_timers()
//!   |-- sound.update(sound_timer)
//!   |-- display.draw(framebuffer) if dirty
//!   `-- sleep until the next frame is due

use crate::display::Display;
use crate::input::Input;
use crate::interpreter::{Chip8Interpreter, HaltReason, StepOutcome};
use crate::quirks::Quirks;
use crate::sound::Sound;
use std::error::Error;
use std::time::{Duration, Instant};

/// the timers always run at 60Hz, and so does the main loop
pub const CHIP8_TIMER_HZ: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// instructions executed per 60Hz frame
    pub cycles_per_frame: usize,
}

impl Default for Config {
    /// 720 instructions a second; plenty for most programs written for the VIP
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            cycles_per_frame: 12,
        }
    }
}

/// why the main loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Halted(HaltReason),
    Quit,
}

pub struct Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
}

impl<'a> Environment<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Self {
        Environment {
            interpreter,
            display,
            input,
            sound,
            config,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    /// run frames at 60Hz until the program stops or the user quits
    pub fn main_loop(&mut self) -> Result<Exit, Box<dyn Error>> {
        let frame = Duration::from_secs(1) / CHIP8_TIMER_HZ;
        let mut deadline = Instant::now();
        loop {
            deadline += frame;
            match self.run_frame() {
                Ok(None) => {}
                Ok(Some(exit)) => {
                    self.sound.update(0)?;
                    return Ok(exit);
                }
                Err(e) => {
                    // silence first; the frame's error is the one worth reporting
                    let _ = self.sound.update(0);
                    return Err(e);
                }
            }
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running behind; don't try to catch up
                deadline = now;
            }
        }
    }

    /// one frame's worth of work, without the sleep
    pub fn run_frame(&mut self) -> Result<Option<Exit>, Box<dyn Error>> {
        if !self.input.poll(self.interpreter.keypad_mut())? {
            return Ok(Some(Exit::Quit));
        }

        let mut exit = None;
        for _ in 0..self.config.cycles_per_frame {
            match self.interpreter.step()? {
                StepOutcome::UnknownOpcode(word) => {
                    eprintln!(
                        "Warning: skipped unknown opcode {:04x} at {:03x}",
                        word,
                        self.interpreter.program_counter().wrapping_sub(2)
                    );
                }
                StepOutcome::AwaitingKey => break,
                StepOutcome::Halted(reason) => {
                    exit = Some(Exit::Halted(reason));
                    break;
                }
                StepOutcome::Executed | StepOutcome::Drew => {}
            }
        }

        self.interpreter.tick_timers();
        self.sound.update(self.interpreter.sound_timer())?;
        if self.interpreter.take_display_dirty() {
            self.display.draw(self.interpreter.display())?;
        }
        Ok(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::interpreter::State;
    use crate::memory::CHIP8_FONT;
    use crate::sound::Mute;

    fn interpreter(program: &[u8]) -> Chip8Interpreter {
        Chip8Interpreter::with_seed(&CHIP8_FONT, program, Quirks::default(), 1).unwrap()
    }

    #[test]
    fn test_frame_runs_to_halt() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let i = interpreter(&[0x00, 0xe0, 0x00, 0x00]);
            let mut env = Environment::new(
                i,
                &mut display,
                &mut input,
                &mut sound,
                Config::default(),
            );
            assert_eq!(
                env.run_frame()?,
                Some(Exit::Halted(HaltReason::Program))
            );
            assert!(env.interpreter().is_halted());
        }
        assert_eq!(display.frames_drawn, 1);
        Ok(())
    }

    #[test]
    fn test_frame_is_bounded() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        // V0 += 1 forever
        let i = interpreter(&[0x70, 0x01, 0x12, 0x00]);
        let config = Config {
            cycles_per_frame: 10,
            ..Config::default()
        };
        let mut env = Environment::new(i, &mut display, &mut input, &mut sound, config);
        assert_eq!(env.run_frame()?, None);
        assert_eq!(env.interpreter().registers()[0], 5);
        assert_eq!(env.run_frame()?, None);
        assert_eq!(env.interpreter().registers()[0], 10);
        Ok(())
    }

    #[test]
    fn test_sound_follows_timer() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            // sound = 2, then spin
            let i = interpreter(&[0x60, 0x02, 0xf0, 0x18, 0x12, 0x06, 0x12, 0x04]);
            let mut env = Environment::new(
                i,
                &mut display,
                &mut input,
                &mut sound,
                Config::default(),
            );
            env.run_frame()?;
            assert_eq!(env.interpreter().sound_timer(), 1);
            env.run_frame()?;
            assert_eq!(env.interpreter().sound_timer(), 0);
        }
        assert_eq!(sound.beeps, 1);
        assert!(!sound.is_beeping());
        Ok(())
    }

    #[test]
    fn test_wait_for_key_across_frames() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        // 5 is already down when the wait begins and stays down; 9 goes
        // down later
        let mut input = DummyInput::scripted(&[&[0x5], &[0x5], &[0x5], &[0x5, 0x9]]);
        let mut sound = Mute::new();
        let i = interpreter(&[0xf0, 0x0a, 0x00, 0x00]);
        let mut env = Environment::new(i, &mut display, &mut input, &mut sound, Config::default());
        assert_eq!(env.run_frame()?, None);
        assert_eq!(env.interpreter().state(), State::AwaitingKey { register: 0 });
        for _ in 0..2 {
            assert_eq!(env.run_frame()?, None);
            assert_eq!(env.interpreter().state(), State::AwaitingKey { register: 0 });
        }
        assert_eq!(
            env.run_frame()?,
            Some(Exit::Halted(HaltReason::Program))
        );
        assert_eq!(env.interpreter().registers()[0], 0x9);
        Ok(())
    }

    #[test]
    fn test_faults_propagate() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let i = interpreter(&[0x00, 0xee]);
        let mut env = Environment::new(i, &mut display, &mut input, &mut sound, Config::default());
        let e = env.run_frame().unwrap_err();
        assert_eq!(
            e.to_string(),
            "stack underflow: return with an empty call stack"
        );
    }

    #[test]
    fn test_main_loop_silences_on_fault() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            // sound = 2 in the first frame, then return with an empty stack
            let i = interpreter(&[0x60, 0x02, 0xf0, 0x18, 0x00, 0xee]);
            let config = Config {
                cycles_per_frame: 2,
                ..Config::default()
            };
            let mut env = Environment::new(i, &mut display, &mut input, &mut sound, config);
            let e = env.main_loop().unwrap_err();
            assert_eq!(
                e.to_string(),
                "stack underflow: return with an empty call stack"
            );
            assert_eq!(env.interpreter().sound_timer(), 1);
        }
        assert_eq!(sound.beeps, 1);
        assert!(!sound.is_beeping());
    }

    #[test]
    fn test_main_loop_quits() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]).quit_after(3);
        let mut sound = Mute::new();
        let i = interpreter(&[0x12, 0x02, 0x12, 0x00]);
        let mut env = Environment::new(i, &mut display, &mut input, &mut sound, Config::default());
        let start = Instant::now();
        assert_eq!(env.main_loop()?, Exit::Quit);
        // three full frames were slept through
        assert!(start.elapsed() >= Duration::from_millis(45));
        Ok(())
    }

    #[test]
    fn test_main_loop_stops_on_self_jump() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let i = interpreter(&[0x60, 0x01, 0x12, 0x02]);
        let mut env = Environment::new(i, &mut display, &mut input, &mut sound, Config::default());
        assert_eq!(env.main_loop()?, Exit::Halted(HaltReason::InfiniteLoop));
        Ok(())
    }
}
