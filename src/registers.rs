//! Register identifiers and the general-purpose register file.
//!
//! Register ids are one byte. The high nibble selects the bank: `0x0` for the
//! named machine registers, `0x1`/`0x2`/`0x3` for the `R`, `S` and `T`
//! general-purpose banks. The general-purpose banks live in a small dedicated
//! [`Memory`] block; the named registers are fields of the processor itself.

use crate::errors::Error;
use crate::memory::Memory;

/// Backing store size for the three general-purpose banks: 24 words.
const REGISTER_FILE_SIZE: usize = 48;

macro_rules! define_registers {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $id:literal, $text:literal
        ),* $(,)?
    ) => {
        /// Every register the machine exposes, by encoded identifier.
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Register {
            $(
                $(#[$doc])*
                $name = $id,
            )*
        }

        impl TryFrom<u8> for Register {
            type Error = Error;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $id => Ok(Register::$name), )*
                    _ => Err(Error::InvalidOperation(format!(
                        "unknown register identifier {value:#04x}"
                    ))),
                }
            }
        }

        impl Register {
            /// The register's assembly name, without the `$` sigil.
            pub const fn name(&self) -> &'static str {
                match self {
                    $( Register::$name => $text, )*
                }
            }

            /// Looks a register up by its assembly name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $text => Some(Register::$name), )*
                    _ => None,
                }
            }
        }
    };
}

define_registers! {
    /// Program counter.
    Pc = 0x00, "PC",
    /// Accumulator; receives every ALU result.
    Acc = 0x01, "ACC",
    /// Comparison and arithmetic flags.
    Flag = 0x02, "FLAG",
    /// Stack pointer.
    Sp = 0x03, "SP",
    /// Frame pointer.
    Fp = 0x04, "FP",
    /// Stack pointer snapshot taken when the current frame was called.
    Arg = 0x05, "ARG",
    /// Stack pointer snapshot taken when the current frame returned.
    Ret = 0x06, "RET",
    R0 = 0x10, "R0",
    R1 = 0x11, "R1",
    R2 = 0x12, "R2",
    R3 = 0x13, "R3",
    R4 = 0x14, "R4",
    R5 = 0x15, "R5",
    R6 = 0x16, "R6",
    R7 = 0x17, "R7",
    S0 = 0x20, "S0",
    S1 = 0x21, "S1",
    S2 = 0x22, "S2",
    S3 = 0x23, "S3",
    S4 = 0x24, "S4",
    S5 = 0x25, "S5",
    S6 = 0x26, "S6",
    S7 = 0x27, "S7",
    T0 = 0x30, "T0",
    T1 = 0x31, "T1",
    T2 = 0x32, "T2",
    T3 = 0x33, "T3",
    T4 = 0x34, "T4",
    T5 = 0x35, "T5",
    T6 = 0x36, "T6",
    T7 = 0x37, "T7",
}

impl Register {
    /// Whether a decoded instruction may name this register as a write
    /// destination. The processor moves `PC`, `ARG` and `RET` itself as a
    /// side effect of jumps, calls and returns.
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Register::Pc | Register::Arg | Register::Ret)
    }

    /// Byte offset of this register inside the general-purpose file, or
    /// `None` for the named machine registers.
    pub const fn file_offset(&self) -> Option<u16> {
        let id = *self as u8;
        let bank = (id >> 4) as u16;
        let index = (id & 0x0F) as u16;
        if bank >= 1 {
            Some(((bank - 1) * 8 + index) * 2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name())
    }
}

/// The three general-purpose banks, backed by their own word-aligned memory.
#[derive(Debug)]
pub struct RegisterFile {
    memory: Memory,
}

impl RegisterFile {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            memory: Memory::new(REGISTER_FILE_SIZE)?,
        })
    }

    fn offset(register: Register) -> Result<u16, Error> {
        register.file_offset().ok_or_else(|| {
            Error::InvalidOperation(format!("{register} is not a general-purpose register"))
        })
    }

    /// Reads a general-purpose register.
    pub fn get(&self, register: Register) -> Result<u16, Error> {
        self.memory.get16(Self::offset(register)?)
    }

    /// Writes a general-purpose register.
    pub fn set(&mut self, register: Register, value: u16) -> Result<(), Error> {
        self.memory.set16(Self::offset(register)?, value)
    }

    /// Zeroes every bank.
    pub fn reset(&mut self) {
        self.memory.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips() {
        for id in 0..=0xFF_u8 {
            if let Ok(register) = Register::try_from(id) {
                assert_eq!(register as u8, id);
                assert_eq!(Register::from_name(register.name()), Some(register));
            }
        }
    }

    #[test]
    fn privileged_set() {
        assert!(Register::Pc.is_privileged());
        assert!(Register::Arg.is_privileged());
        assert!(Register::Ret.is_privileged());
        assert!(!Register::Acc.is_privileged());
        assert!(!Register::Sp.is_privileged());
        assert!(!Register::R0.is_privileged());
    }

    #[test]
    fn file_offsets_cover_the_banks() {
        assert_eq!(Register::Pc.file_offset(), None);
        assert_eq!(Register::R0.file_offset(), Some(0));
        assert_eq!(Register::R7.file_offset(), Some(14));
        assert_eq!(Register::S0.file_offset(), Some(16));
        assert_eq!(Register::T7.file_offset(), Some(46));
    }

    #[test]
    fn file_round_trips_and_rejects_named() {
        let mut file = RegisterFile::new().unwrap();
        file.set(Register::S3, 0xCAFE).unwrap();
        assert_eq!(file.get(Register::S3).unwrap(), 0xCAFE);
        assert_eq!(file.get(Register::T0).unwrap(), 0);
        assert!(matches!(
            file.set(Register::Flag, 1),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn reset_zeroes() {
        let mut file = RegisterFile::new().unwrap();
        file.set(Register::R1, 42).unwrap();
        file.reset();
        assert_eq!(file.get(Register::R1).unwrap(), 0);
    }
}
