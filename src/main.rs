use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use chip8::display::{MonoTermDisplay, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};
use chip8::environment::{Config, Environment, Exit};
use chip8::input::TermInput;
use chip8::interpreter::{Chip8Interpreter, HaltReason};
use chip8::memory::CHIP8_FONT;
use chip8::quirks::Quirks;
use chip8::sound::{Mute, SimpleBeep, Sound};

/// Run a CHIP-8 program in the terminal
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the program image
    rom: PathBuf,

    /// Quirk preset: cosmac, modern or default
    #[arg(short, long, default_value = "default")]
    quirks: String,

    /// Override whether 8XY6/8XYE copy VY into VX before shifting
    #[arg(long)]
    legacy_shift: Option<bool>,

    /// Override whether BNNN jumps relative to V0 rather than VX
    #[arg(long)]
    legacy_jump: Option<bool>,

    /// Override whether FX55/FX65 advance the index register
    #[arg(long)]
    increment_index: Option<bool>,

    /// Instructions executed per 60Hz frame
    #[arg(short, long, default_value_t = 12)]
    cycles_per_frame: usize,

    /// Don't beep
    #[arg(long)]
    mute: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let Some(mut quirks) = Quirks::preset(&self.quirks) else {
            bail!("unknown quirk preset {:?}", self.quirks);
        };
        if let Some(v) = self.legacy_shift {
            quirks.legacy_shift = v;
        }
        if let Some(v) = self.legacy_jump {
            quirks.legacy_jump = v;
        }
        if let Some(v) = self.increment_index {
            quirks.increment_index = v;
        }
        Ok(Config {
            quirks,
            cycles_per_frame: self.cycles_per_frame,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    // load a program
    let program = fs::read(&cli.rom)
        .with_context(|| format!("can't read program {}", cli.rom.display()))?;
    let interpreter = Chip8Interpreter::new(&CHIP8_FONT, &program, config.quirks)?;

    // initialise
    let mut display = MonoTermDisplay::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)?;
    let mut input = TermInput::new()?;
    let mut sound: Box<dyn Sound> = if cli.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let exit = Environment::new(
        interpreter,
        &mut display,
        &mut input,
        sound.as_mut(),
        config,
    )
    .main_loop();

    // hand the terminal back before saying anything
    drop(input);
    drop(display);
    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..2 {
        println!();
    }

    match exit.map_err(|e| anyhow!("{}", e))? {
        Exit::Halted(HaltReason::Program) => eprintln!("program halted"),
        Exit::Halted(HaltReason::InfiniteLoop) => eprintln!("program finished"),
        Exit::Halted(HaltReason::Fault) | Exit::Quit => {}
    }
    Ok(())
}
