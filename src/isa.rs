//! Instruction set definitions.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! instruction table and invokes a callback macro for code generation, so the
//! decoder, the parser, and the emitter all derive from a single definition
//! list.
//!
//! This module generates:
//! - The [`Opcode`] enum with opcode byte mappings
//! - `TryFrom<u8>` for decoding
//! - Mnemonic lookup in both directions
//! - The per-opcode operand shape table ([`Opcode::operands`])
//!
//! # Bytecode format
//!
//! Instructions use variable-length encoding, destination-last:
//! - Opcode: 1 byte
//! - Register operand: 1 byte (register identifier)
//! - Byte immediate: 1 byte
//! - Word immediate / address / jump target: 2 bytes (big-endian)

use crate::errors::Error;

/// Operand classes an instruction can carry after its opcode byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandKind {
    /// One-byte register identifier.
    Reg,
    /// One-byte immediate.
    Byte,
    /// Two-byte big-endian immediate or absolute address.
    Word,
    /// Two-byte big-endian jump/call target; assembles from a label too.
    Target,
}

impl OperandKind {
    /// Encoded width in bytes.
    pub const fn size(&self) -> u16 {
        match self {
            OperandKind::Reg | OperandKind::Byte => 1,
            OperandKind::Word | OperandKind::Target => 2,
        }
    }
}

/// Invokes a callback macro with the complete instruction definition list.
///
/// This macro enables code generation for instructions in multiple modules
/// without duplicating the instruction definitions.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            // =========================
            // System
            // =========================
            /// NOP ; does nothing for one cycle
            Nop = 0x00, "NOP" => [],
            /// HALT ; stops execution
            Halt = 0x01, "HALT" => [],
            /// RESET ; reinitializes the processor (memory contents survive)
            Reset = 0x02, "RESET" => [],
            // =========================
            // One register
            // =========================
            /// INC $r ; ACC = r + 1
            Inc = 0x10, "INC" => [r: Reg],
            /// DEC $r ; ACC = r - 1
            Dec = 0x11, "DEC" => [r: Reg],
            /// NOT $r ; ACC = !r
            Not = 0x12, "NOT" => [r: Reg],
            /// CMPZ $r ; sets ZERO iff r == 0
            Cmpz = 0x13, "CMPZ" => [r: Reg],
            /// PUSH $r ; pushes r onto the stack
            Push = 0x14, "PUSH" => [r: Reg],
            /// POP $r ; r = popped word
            Pop = 0x15, "POP" => [r: Reg],
            /// PEEK $r ; r = word at the top of the stack
            Peek = 0x16, "PEEK" => [r: Reg],
            // =========================
            // Two registers
            // =========================
            /// MOVE $a $b ; b = a
            Move = 0x20, "MOVE" => [a: Reg, b: Reg],
            /// ADD $a $b ; ACC = a + b
            Add = 0x21, "ADD" => [a: Reg, b: Reg],
            /// SUB $a $b ; ACC = a - b
            Sub = 0x22, "SUB" => [a: Reg, b: Reg],
            /// MUL $a $b ; ACC = a * b
            Mul = 0x23, "MUL" => [a: Reg, b: Reg],
            /// DIV $a $b ; ACC = a / b (faults on division by zero)
            Div = 0x24, "DIV" => [a: Reg, b: Reg],
            /// MOD $a $b ; ACC = a % b (faults on division by zero)
            Mod = 0x25, "MOD" => [a: Reg, b: Reg],
            /// AND $a $b ; ACC = a & b
            And = 0x26, "AND" => [a: Reg, b: Reg],
            /// OR $a $b ; ACC = a | b
            Or = 0x27, "OR" => [a: Reg, b: Reg],
            /// XOR $a $b ; ACC = a ^ b
            Xor = 0x28, "XOR" => [a: Reg, b: Reg],
            /// CMP $a $b ; sets LESSTHAN, EQUAL or GREATERTHAN
            Cmp = 0x29, "CMP" => [a: Reg, b: Reg],
            /// SRLR $a $b ; ACC = a << b
            Srlr = 0x2A, "SRLR" => [a: Reg, b: Reg],
            /// SRRR $a $b ; ACC = a >> b
            Srrr = 0x2B, "SRRR" => [a: Reg, b: Reg],
            /// LDRR $src $dst ; dst = word at mem[src]
            Ldrr = 0x2C, "LDRR" => [src: Reg, dst: Reg],
            /// LBRR $src $dst ; dst = byte at mem[src], zero-extended
            Lbrr = 0x2D, "LBRR" => [src: Reg, dst: Reg],
            /// STRR $src $dst ; word mem[dst] = src
            Strr = 0x2E, "STRR" => [src: Reg, dst: Reg],
            /// SBRR $src $dst ; byte mem[dst] = low byte of src
            Sbrr = 0x2F, "SBRR" => [src: Reg, dst: Reg],
            // =========================
            // Immediate and register
            // =========================
            /// LDVR value $dst ; dst = value
            Ldvr = 0x30, "LDVR" => [value: Word, dst: Reg],
            /// STVR value $dst ; word mem[dst] = value
            Stvr = 0x31, "STVR" => [value: Word, dst: Reg],
            /// LBVR value $dst ; dst = byte value, zero-extended
            Lbvr = 0x32, "LBVR" => [value: Byte, dst: Reg],
            /// SBVR value $dst ; byte mem[dst] = value
            Sbvr = 0x33, "SBVR" => [value: Byte, dst: Reg],
            /// LDAR address $dst ; dst = word at mem[address]
            Ldar = 0x34, "LDAR" => [address: Word, dst: Reg],
            /// LBAR address $dst ; dst = byte at mem[address], zero-extended
            Lbar = 0x35, "LBAR" => [address: Word, dst: Reg],
            /// SRL $r amount ; ACC = r << amount
            Srl = 0x36, "SRL" => [r: Reg, amount: Byte],
            /// SRR $r amount ; ACC = r >> amount
            Srr = 0x37, "SRR" => [r: Reg, amount: Byte],
            /// STRA $r address ; word mem[address] = r
            Stra = 0x38, "STRA" => [r: Reg, address: Word],
            /// SBRA $r address ; byte mem[address] = low byte of r
            Sbra = 0x39, "SBRA" => [r: Reg, address: Word],
            /// STVA value address ; word mem[address] = value
            Stva = 0x3A, "STVA" => [value: Word, address: Word],
            /// SBVA value address ; byte mem[address] = value
            Sbva = 0x3B, "SBVA" => [value: Byte, address: Word],
            // =========================
            // Jumps
            // =========================
            /// JUMP target ; PC = target
            Jump = 0x40, "JUMP" => [target: Target],
            /// JLT target ; PC = target when LESSTHAN is set
            Jlt = 0x41, "JLT" => [target: Target],
            /// JGT target ; PC = target when GREATERTHAN is set
            Jgt = 0x42, "JGT" => [target: Target],
            /// JE target ; PC = target when EQUAL is set
            Je = 0x43, "JE" => [target: Target],
            /// JNE target ; PC = target when EQUAL is clear
            Jne = 0x44, "JNE" => [target: Target],
            /// JZ target ; PC = target when ZERO is set
            Jz = 0x45, "JZ" => [target: Target],
            /// JNZ target ; PC = target when ZERO is clear
            Jnz = 0x46, "JNZ" => [target: Target],
            /// JUMPR $r ; PC = r
            Jumpr = 0x47, "JUMPR" => [r: Reg],
            /// JLTR $r ; PC = r when LESSTHAN is set
            Jltr = 0x48, "JLTR" => [r: Reg],
            /// JGTR $r ; PC = r when GREATERTHAN is set
            Jgtr = 0x49, "JGTR" => [r: Reg],
            /// JER $r ; PC = r when EQUAL is set
            Jer = 0x4A, "JER" => [r: Reg],
            /// JNER $r ; PC = r when EQUAL is clear
            Jner = 0x4B, "JNER" => [r: Reg],
            /// JZR $r ; PC = r when ZERO is set
            Jzr = 0x4C, "JZR" => [r: Reg],
            /// JNZR $r ; PC = r when ZERO is clear
            Jnzr = 0x4D, "JNZR" => [r: Reg],
            // =========================
            // Calls
            // =========================
            /// CALL argc target ; pushes a frame with argc arguments, PC = target
            Call = 0x50, "CALL" => [argc: Word, target: Target],
            /// CALLR argc $r ; pushes a frame with argc arguments, PC = r
            Callr = 0x51, "CALLR" => [argc: Word, r: Reg],
            /// RET rvc ; unwinds the current frame keeping rvc return values
            Ret = 0x52, "RET" => [rvc: Word],
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        // =========================
        // Opcode enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = Error;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(Error::InvalidOperation(format!(
                        "unknown opcode {value:#04x}"
                    ))),
                }
            }
        }

        impl Opcode {
            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Looks an opcode up by its assembly mnemonic.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Returns the operand shape that follows the opcode byte.
            pub const fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Opcode::$name => &[ $( OperandKind::$kind, )* ], )*
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);

impl Opcode {
    /// Total encoded size of the instruction in bytes, opcode included.
    pub fn size(&self) -> u16 {
        1 + self.operands().iter().map(|kind| kind.size()).sum::<u16>()
    }
}
