/// Everything that can go wrong inside the interpreter. Recoverable conditions
/// (unknown opcodes, a program halting itself) are not errors; they come back
/// as a `StepOutcome` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    Load { size: usize, max: usize },

    #[error("instruction fetch out of bounds at {address:#06x}")]
    OutOfBoundsFetch { address: u16 },

    #[error("memory access out of bounds at {address:#06x}")]
    MemoryOutOfBounds { address: u16 },

    #[error("stack overflow: more than {depth} nested calls")]
    StackOverflow { depth: usize },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("interpreter has halted; step() should no longer be called")]
    Halted,
}

pub type Result<T> = std::result::Result<T, Chip8Error>;

impl Chip8Error {
    /// whether this error stops the interpreter for good
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Chip8Error::Load { .. } | Chip8Error::Halted)
    }
}
