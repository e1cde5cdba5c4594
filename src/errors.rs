use thiserror::Error;

/// Errors that can occur during execution or assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Memory access outside the addressable range.
    #[error("address {address:#06x} outside valid range 0..={max:#06x}")]
    OutOfRange {
        /// First byte of the offending access.
        address: u32,
        /// Highest addressable byte.
        max: u32,
    },
    /// Unknown opcode or register, privileged-register write, pop/peek from
    /// an empty frame, or return with no caller.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Push or call past the end of the stack region.
    #[error("stack overflow: stack pointer at {pointer:#06x} reached end of region {end:#06x}")]
    StackOverflow {
        /// Stack pointer at the time of the failed push.
        pointer: u16,
        /// Configured lower bound of the stack region.
        end: u16,
    },
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivideByZero,
    /// Bad lexeme in assembly source.
    #[error("line {line}: {message}")]
    ScanningError { line: usize, message: String },
    /// Bad token or operand shape in assembly source.
    #[error("line {line}: {message}")]
    ParsingError { line: usize, message: String },
    /// Assembly failure: duplicate or unknown label, or a wrapped
    /// scanning/parsing error.
    #[error("assembly failed: {0}")]
    AssemblingError(String),
}
