use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

pub const CHIP8_KEY_COUNT: usize = 16;

/// State of the 16-key hex keypad as the interpreter sees it. Besides what is
/// held down right now, it remembers which keys went from released to pressed
/// since the interpreter last looked, which is what FX0A waits on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; CHIP8_KEY_COUNT],
    presses: u16,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// keys outside 0x0-0xf are never pressed
    pub fn is_pressed(&self, key: u8) -> bool {
        (key as usize) < CHIP8_KEY_COUNT && self.pressed[key as usize]
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        let k = key as usize;
        if k >= CHIP8_KEY_COUNT {
            return;
        }
        if pressed && !self.pressed[k] {
            self.presses |= 1 << k;
        }
        self.pressed[k] = pressed;
    }

    pub fn press(&mut self, key: u8) {
        self.set_key(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set_key(key, false);
    }

    /// the lowest key pressed since the last call, forgetting any others
    pub(crate) fn take_press(&mut self) -> Option<u8> {
        if self.presses == 0 {
            return None;
        }
        let key = self.presses.trailing_zeros() as u8;
        self.presses = 0;
        Some(key)
    }

    pub(crate) fn forget_presses(&mut self) {
        self.presses = 0;
    }
}

/// ditto using left-hand side of qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// terminals only report key-downs (and auto-repeat), so a key counts as held
/// for this many polls after its last event
const KEY_HOLD_POLLS: u8 = 6;

/// reads keypresses into the keypad
pub trait Input {
    /// bring the keypad up to date; returns false once the user has asked to quit
    fn poll(&mut self, keypad: &mut Keypad) -> Result<bool, io::Error>;
}

/// implementation of Input for a terminal in raw mode, using crossterm
pub struct TermInput {
    hold: [u8; CHIP8_KEY_COUNT],
    keymap: HashMap<char, u8>,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            hold: [0; CHIP8_KEY_COUNT],
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
        })
    }

    /// drain pending terminal events; false if escape was pressed
    fn read_events(&mut self) -> Result<bool, io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                        Some(&mapped_key) => self.hold[mapped_key as usize] = KEY_HOLD_POLLS,
                        None => {
                            eprintln!("Warning: can't map {:?} to a COSMAC key", key);
                        }
                    },
                    KeyCode::Esc => return Ok(false),
                    _ => {
                        eprintln!("Warning: unknown key event received");
                    }
                },
                Event::Resize(..) => {}
                _ => {
                    eprintln!("Warning: unknown event received");
                }
            }
        }
        Ok(true)
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self, keypad: &mut Keypad) -> Result<bool, io::Error> {
        self.hold.iter_mut().for_each(|h| *h = h.saturating_sub(1));
        let running = self.read_events()?;
        for (key, hold) in self.hold.iter().enumerate() {
            keypad.set_key(key as u8, *hold > 0);
        }
        Ok(running)
    }
}

/// dummy Input implementation for testing: holds down a set of keys,
/// optionally changing it on each poll, optionally asking to quit after a
/// number of polls
pub struct DummyInput {
    keys: Vec<u8>,
    script: VecDeque<Vec<u8>>,
    polls_left: Option<usize>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            keys: Vec::from(keys),
            script: VecDeque::new(),
            polls_left: None,
        }
    }

    /// the keys held at each poll, in turn; the last set stays held
    pub fn scripted(polls: &[&[u8]]) -> Self {
        DummyInput {
            keys: Vec::new(),
            script: polls.iter().map(|keys| Vec::from(*keys)).collect(),
            polls_left: None,
        }
    }

    pub fn quit_after(mut self, polls: usize) -> Self {
        self.polls_left = Some(polls);
        self
    }
}

impl Input for DummyInput {
    fn poll(&mut self, keypad: &mut Keypad) -> Result<bool, io::Error> {
        if let Some(left) = self.polls_left.as_mut() {
            if *left == 0 {
                return Ok(false);
            }
            *left -= 1;
        }
        if let Some(keys) = self.script.pop_front() {
            self.keys = keys;
        }
        for key in 0..CHIP8_KEY_COUNT as u8 {
            keypad.set_key(key, self.keys.contains(&key));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_press_release() {
        let mut k = Keypad::new();
        assert!(!k.is_pressed(0xa));
        k.press(0xa);
        assert!(k.is_pressed(0xa));
        k.release(0xa);
        assert!(!k.is_pressed(0xa));
    }

    #[test]
    fn test_keypad_ignores_out_of_range() {
        let mut k = Keypad::new();
        k.press(0x10);
        assert!(!k.is_pressed(0x10));
        assert_eq!(k.take_press(), None);
    }

    #[test]
    fn test_keypad_records_transitions_only() {
        let mut k = Keypad::new();
        k.press(3);
        assert_eq!(k.take_press(), Some(3));
        // still held, but no new transition
        k.press(3);
        assert_eq!(k.take_press(), None);
        k.release(3);
        k.press(3);
        assert_eq!(k.take_press(), Some(3));
    }

    #[test]
    fn test_keypad_lowest_press_wins() {
        let mut k = Keypad::new();
        k.press(9);
        k.press(2);
        assert_eq!(k.take_press(), Some(2));
        assert_eq!(k.take_press(), None);
    }

    #[test]
    fn test_keypad_forget_presses() {
        let mut k = Keypad::new();
        k.press(1);
        k.forget_presses();
        assert_eq!(k.take_press(), None);
        assert!(k.is_pressed(1));
    }

    #[test]
    fn test_dummy_input() -> Result<(), io::Error> {
        let mut k = Keypad::new();
        let mut i = DummyInput::new(&[0x1, 0xf]).quit_after(1);
        assert!(i.poll(&mut k)?);
        assert!(k.is_pressed(0x1));
        assert!(k.is_pressed(0xf));
        assert!(!k.is_pressed(0x2));
        assert!(!i.poll(&mut k)?);
        Ok(())
    }

    #[test]
    fn test_dummy_input_held_key_presses_once() -> Result<(), io::Error> {
        let mut k = Keypad::new();
        let mut i = DummyInput::scripted(&[&[5], &[5], &[5, 9], &[]]);
        i.poll(&mut k)?;
        assert_eq!(k.take_press(), Some(5));
        i.poll(&mut k)?;
        assert_eq!(k.take_press(), None);
        assert!(k.is_pressed(5));
        i.poll(&mut k)?;
        assert_eq!(k.take_press(), Some(9));
        i.poll(&mut k)?;
        assert!(!k.is_pressed(5));
        assert!(!k.is_pressed(9));
        // the last set stays held
        i.poll(&mut k)?;
        assert_eq!(k.take_press(), None);
        Ok(())
    }
}
