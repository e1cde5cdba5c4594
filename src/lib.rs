//! A 16-bit software CPU with an assembler toolchain.
//!
//! The machine executes one-byte opcodes over a flat, bounds-checked, observable
//! memory, with an accumulator-style ALU, a frame-oriented call stack, and three
//! banks of general-purpose registers. The toolchain turns assembly source into
//! flat bytecode the processor runs directly.
//!
//! # Architecture
//!
//! - **Word size**: 16 bits, big-endian in memory and in instruction operands
//! - **Registers**: `PC`, `ACC`, `FLAG`, `SP`, `FP`, `ARG`, `RET`, plus banks
//!   `R0..R7`, `S0..S7`, `T0..T7`
//! - **Instruction format**: one opcode byte followed by a fixed per-opcode
//!   operand shape
//! - **Faults**: any decode or execute error fully reinitializes the processor
//!   (memory contents survive) and is then re-raised to the caller
//!
//! # Modules
//!
//! - [`memory`]: flat byte store with write notifications
//! - [`alu`]: arithmetic, logic, comparison flags, jump selection
//! - [`stack`]: downward-growing call stack with frame bookkeeping
//! - [`registers`]: register identifiers and the general-purpose register file
//! - [`isa`]: instruction set definition and opcode mappings
//! - [`processor`]: fetch/decode/execute core and lifecycle events
//! - [`scanner`], [`parser`], [`assembler`]: source text to bytecode
//! - [`errors`]: execution and assembly error types
//! - [`log`]: colored stderr logging used by the toolchain

pub mod alu;
pub mod assembler;
pub mod errors;
pub mod isa;
pub mod log;
pub mod memory;
pub mod parser;
pub mod processor;
pub mod registers;
pub mod scanner;
pub mod stack;
