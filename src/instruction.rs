/// # instruction
///
/// A decoded CHIP-8 instruction word. Every 16-bit word decodes to exactly one
/// variant, so execution is a single exhaustive match; words that don't map
/// to anything land in `Unknown`.
///
/// Field naming follows the usual CHIP-8 notation:
///  * `x`, `y` -- register indices from bits 8-11 and 4-7
///  * `n`      -- low nibble
///  * `nn`     -- low byte
///  * `nnn`    -- low 12 bits, an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0000
    Halt,
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump { nnn: u16 },
    /// 2NNN
    Call { nnn: u16 },
    /// 3XNN
    SkipEqImm { x: usize, nn: u8 },
    /// 4XNN
    SkipNeImm { x: usize, nn: u8 },
    /// 5XY0
    SkipEqReg { x: usize, y: usize },
    /// 6XNN
    LoadImm { x: usize, nn: u8 },
    /// 7XNN
    AddImm { x: usize, nn: u8 },
    /// 8XY0
    Move { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4
    AddReg { x: usize, y: usize },
    /// 8XY5
    SubReg { x: usize, y: usize },
    /// 8XY6
    ShiftRight { x: usize, y: usize },
    /// 8XY7
    SubFromReg { x: usize, y: usize },
    /// 8XYE
    ShiftLeft { x: usize, y: usize },
    /// 9XY0
    SkipNeReg { x: usize, y: usize },
    /// ANNN
    LoadIndex { nnn: u16 },
    /// BNNN
    JumpOffset { x: usize, nnn: u16 },
    /// CXNN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipKeyPressed { x: usize },
    /// EXA1
    SkipKeyNotPressed { x: usize },
    /// FX07
    GetDelay { x: usize },
    /// FX0A
    WaitKey { x: usize },
    /// FX15
    SetDelay { x: usize },
    /// FX18
    SetSound { x: usize },
    /// FX1E
    AddIndex { x: usize },
    /// FX29
    FontChar { x: usize },
    /// FX33
    Bcd { x: usize },
    /// FX55
    StoreRegs { x: usize },
    /// FX65
    LoadRegs { x: usize },
    Unknown(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Instruction {
        let op = (word >> 12) & 0xf;
        let x = ((word >> 8) & 0xf) as usize;
        let y = ((word >> 4) & 0xf) as usize;
        let n = (word & 0xf) as u8;
        let nn = (word & 0xff) as u8;
        let nnn = word & 0xfff;

        use Instruction::*;
        match (op, n) {
            // only the low byte matters; 0NNN machine code routines aren't emulated
            (0x0, _) => match nn {
                0x00 => Halt,
                0xe0 => ClearScreen,
                0xee => Return,
                _ => Unknown(word),
            },
            (0x1, _) => Jump { nnn },
            (0x2, _) => Call { nnn },
            (0x3, _) => SkipEqImm { x, nn },
            (0x4, _) => SkipNeImm { x, nn },
            (0x5, _) => SkipEqReg { x, y },
            (0x6, _) => LoadImm { x, nn },
            (0x7, _) => AddImm { x, nn },
            (0x8, 0x0) => Move { x, y },
            (0x8, 0x1) => Or { x, y },
            (0x8, 0x2) => And { x, y },
            (0x8, 0x3) => Xor { x, y },
            (0x8, 0x4) => AddReg { x, y },
            (0x8, 0x5) => SubReg { x, y },
            (0x8, 0x6) => ShiftRight { x, y },
            (0x8, 0x7) => SubFromReg { x, y },
            (0x8, 0xe) => ShiftLeft { x, y },
            (0x9, _) => SkipNeReg { x, y },
            (0xa, _) => LoadIndex { nnn },
            (0xb, _) => JumpOffset { x, nnn },
            (0xc, _) => Random { x, nn },
            (0xd, _) => Draw { x, y, n },
            (0xe, _) => match nn {
                0x9e => SkipKeyPressed { x },
                0xa1 => SkipKeyNotPressed { x },
                _ => Unknown(word),
            },
            (0xf, _) => match nn {
                0x07 => GetDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => FontChar { x },
                0x33 => Bcd { x },
                0x55 => StoreRegs { x },
                0x65 => LoadRegs { x },
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}
