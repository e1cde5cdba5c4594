//! Arithmetic, logic, comparison flags and jump-address selection.
//!
//! Every result lands in the accumulator; source registers are never written
//! back. Arithmetic runs on 32-bit intermediates and truncates to 16 bits, so
//! overflow is observable through the `CARRY` flag rather than lost.

use crate::errors::Error;
use crate::isa::Opcode;

/// Condition flags, one bit each.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Flags(u16);

impl Flags {
    pub const ZERO: Flags = Flags(1 << 0);
    pub const CARRY: Flags = Flags(1 << 1);
    pub const LESSTHAN: Flags = Flags(1 << 2);
    pub const EQUAL: Flags = Flags(1 << 3);
    pub const GREATERTHAN: Flags = Flags(1 << 4);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Flags(bits)
    }

    pub const fn contains(&self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    /// Inserts or removes `other` depending on `condition`.
    pub fn assign(&mut self, other: Flags, condition: bool) {
        if condition {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// The machine's arithmetic unit: an accumulator plus a flag register.
#[derive(Debug, Default)]
pub struct ArithmeticLogicUnit {
    accumulator: u16,
    flags: Flags,
}

impl ArithmeticLogicUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> u16 {
        self.accumulator
    }

    /// Direct accumulator write, used when an instruction names `ACC` as its
    /// destination. Flags are untouched.
    pub fn set_accumulator(&mut self, value: u16) {
        self.accumulator = value;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Direct flag write, used when an instruction names `FLAG` as its
    /// destination.
    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.flags = Flags::empty();
    }

    /// Executes one ALU-class or jump-class opcode over `a` and `b`.
    ///
    /// Jump opcodes select between `a` (taken) and `b` (fall-through) from
    /// the current flags and return the chosen address without touching the
    /// accumulator or the flags. All other supported opcodes update the
    /// accumulator and flags and return `None`. Opcodes outside this surface
    /// (loads, stores, stack and system operations) are rejected.
    pub fn execute(&mut self, opcode: Opcode, a: u16, b: u16) -> Result<Option<u16>, Error> {
        match opcode {
            Opcode::Add | Opcode::Inc => self.arithmetic(a as u32 + b as u32),
            Opcode::Sub | Opcode::Dec => self.arithmetic((a as u32).wrapping_sub(b as u32)),
            Opcode::Mul => self.arithmetic(a as u32 * b as u32),
            Opcode::Div => {
                if b == 0 {
                    return Err(Error::DivideByZero);
                }
                self.arithmetic((a / b) as u32);
            }
            Opcode::Mod => {
                if b == 0 {
                    return Err(Error::DivideByZero);
                }
                self.arithmetic((a % b) as u32);
            }
            Opcode::And => self.logical(a & b),
            Opcode::Or => self.logical(a | b),
            Opcode::Xor => self.logical(a ^ b),
            Opcode::Not => self.logical(!a),
            Opcode::Srl | Opcode::Srlr => self.logical(Self::shift_left(a, b)),
            Opcode::Srr | Opcode::Srrr => self.logical(Self::shift_right(a, b)),
            Opcode::Cmp => {
                self.flags
                    .remove(Flags::LESSTHAN | Flags::EQUAL | Flags::GREATERTHAN);
                self.flags.assign(Flags::LESSTHAN, a < b);
                self.flags.assign(Flags::EQUAL, a == b);
                self.flags.assign(Flags::GREATERTHAN, a > b);
            }
            Opcode::Cmpz => {
                self.flags.assign(Flags::ZERO, a == 0);
            }
            Opcode::Jump | Opcode::Jumpr => return Ok(Some(a)),
            Opcode::Jlt | Opcode::Jltr => return Ok(self.select(Flags::LESSTHAN, true, a, b)),
            Opcode::Jgt | Opcode::Jgtr => return Ok(self.select(Flags::GREATERTHAN, true, a, b)),
            Opcode::Je | Opcode::Jer => return Ok(self.select(Flags::EQUAL, true, a, b)),
            Opcode::Jne | Opcode::Jner => return Ok(self.select(Flags::EQUAL, false, a, b)),
            Opcode::Jz | Opcode::Jzr => return Ok(self.select(Flags::ZERO, true, a, b)),
            Opcode::Jnz | Opcode::Jnzr => return Ok(self.select(Flags::ZERO, false, a, b)),
            _ => {
                return Err(Error::InvalidOperation(format!(
                    "{} is not an arithmetic, comparison or jump operation",
                    opcode.mnemonic()
                )))
            }
        }
        Ok(None)
    }

    /// Truncates a 32-bit intermediate into the accumulator. `CARRY` records
    /// the truncation (for subtraction, the unsigned borrow).
    fn arithmetic(&mut self, wide: u32) {
        self.accumulator = wide as u16;
        self.flags.assign(Flags::CARRY, wide > u16::MAX as u32);
        self.flags.assign(Flags::ZERO, self.accumulator == 0);
    }

    fn logical(&mut self, result: u16) {
        self.accumulator = result;
        self.flags.remove(Flags::CARRY);
        self.flags.assign(Flags::ZERO, result == 0);
    }

    fn shift_left(value: u16, amount: u16) -> u16 {
        if amount >= 16 {
            0
        } else {
            value << amount
        }
    }

    fn shift_right(value: u16, amount: u16) -> u16 {
        if amount >= 16 {
            0
        } else {
            value >> amount
        }
    }

    fn select(&self, flag: Flags, wanted: bool, when_true: u16, when_false: u16) -> Option<u16> {
        if self.flags.contains(flag) == wanted {
            Some(when_true)
        } else {
            Some(when_false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alu() -> ArithmeticLogicUnit {
        ArithmeticLogicUnit::new()
    }

    #[test]
    fn add_wraps_and_carries() {
        let mut alu = alu();
        alu.execute(Opcode::Add, 0xFFFF, 0x0002).unwrap();
        assert_eq!(alu.accumulator(), 0x0001);
        assert!(alu.flags().contains(Flags::CARRY));
        assert!(!alu.flags().contains(Flags::ZERO));

        alu.execute(Opcode::Add, 1, 2).unwrap();
        assert_eq!(alu.accumulator(), 3);
        // carry from the previous operation is cleared
        assert!(!alu.flags().contains(Flags::CARRY));
    }

    #[test]
    fn sub_borrow_sets_carry() {
        let mut alu = alu();
        alu.execute(Opcode::Sub, 2, 3).unwrap();
        assert_eq!(alu.accumulator(), 0xFFFF);
        assert!(alu.flags().contains(Flags::CARRY));

        alu.execute(Opcode::Sub, 3, 3).unwrap();
        assert_eq!(alu.accumulator(), 0);
        assert!(!alu.flags().contains(Flags::CARRY));
        assert!(alu.flags().contains(Flags::ZERO));
    }

    #[test]
    fn mul_truncates_with_carry() {
        let mut alu = alu();
        alu.execute(Opcode::Mul, 0x1234, 0x0100).unwrap();
        assert_eq!(alu.accumulator(), 0x3400);
        assert!(alu.flags().contains(Flags::CARRY));
    }

    #[test]
    fn inc_dec_use_the_second_operand() {
        let mut alu = alu();
        alu.execute(Opcode::Inc, 41, 1).unwrap();
        assert_eq!(alu.accumulator(), 42);
        alu.execute(Opcode::Dec, 0, 1).unwrap();
        assert_eq!(alu.accumulator(), 0xFFFF);
        assert!(alu.flags().contains(Flags::CARRY));
    }

    #[test]
    fn division_by_zero_leaves_flags_untouched() {
        let mut alu = alu();
        alu.execute(Opcode::Cmp, 1, 2).unwrap();
        let before = alu.flags();
        assert_eq!(alu.execute(Opcode::Div, 5, 0), Err(Error::DivideByZero));
        assert_eq!(alu.execute(Opcode::Mod, 5, 0), Err(Error::DivideByZero));
        assert_eq!(alu.flags(), before);
    }

    #[test]
    fn division_never_carries() {
        let mut alu = alu();
        alu.execute(Opcode::Add, 0xFFFF, 0xFFFF).unwrap();
        assert!(alu.flags().contains(Flags::CARRY));
        alu.execute(Opcode::Div, 10, 3).unwrap();
        assert_eq!(alu.accumulator(), 3);
        assert!(!alu.flags().contains(Flags::CARRY));
        alu.execute(Opcode::Mod, 10, 5).unwrap();
        assert_eq!(alu.accumulator(), 0);
        assert!(alu.flags().contains(Flags::ZERO));
    }

    #[test]
    fn logic_sets_zero_only() {
        let mut alu = alu();
        alu.execute(Opcode::Xor, 0xAAAA, 0xAAAA).unwrap();
        assert_eq!(alu.accumulator(), 0);
        assert_eq!(alu.flags(), Flags::ZERO);
        alu.execute(Opcode::Not, 0xFFFF, 0).unwrap();
        assert_eq!(alu.accumulator(), 0);
        assert!(alu.flags().contains(Flags::ZERO));
        alu.execute(Opcode::And, 0xF0F0, 0x0FF0).unwrap();
        assert_eq!(alu.accumulator(), 0x00F0);
        assert!(!alu.flags().contains(Flags::ZERO));
    }

    #[test]
    fn oversized_shift_zeroes() {
        let mut alu = alu();
        alu.execute(Opcode::Srl, 0x8001, 16).unwrap();
        assert_eq!(alu.accumulator(), 0);
        assert!(alu.flags().contains(Flags::ZERO));
        alu.execute(Opcode::Srlr, 0x0001, 4).unwrap();
        assert_eq!(alu.accumulator(), 0x0010);
        alu.execute(Opcode::Srr, 0x0010, 4).unwrap();
        assert_eq!(alu.accumulator(), 0x0001);
    }

    #[test]
    fn cmp_sets_exactly_one_flag() {
        let mut alu = alu();
        for (a, b, expected) in [
            (1_u16, 2_u16, Flags::LESSTHAN),
            (2, 2, Flags::EQUAL),
            (3, 2, Flags::GREATERTHAN),
        ] {
            alu.execute(Opcode::Cmp, a, b).unwrap();
            assert_eq!(
                alu.flags().bits() & (Flags::LESSTHAN | Flags::EQUAL | Flags::GREATERTHAN).bits(),
                expected.bits()
            );
        }
        // the accumulator is never written by a compare
        assert_eq!(alu.accumulator(), 0);
    }

    #[test]
    fn cmpz_toggles_zero() {
        let mut alu = alu();
        alu.execute(Opcode::Cmpz, 0, 0).unwrap();
        assert!(alu.flags().contains(Flags::ZERO));
        alu.execute(Opcode::Cmpz, 7, 0).unwrap();
        assert!(!alu.flags().contains(Flags::ZERO));
    }

    #[test]
    fn jumps_select_from_flags() {
        let mut alu = alu();
        alu.execute(Opcode::Cmp, 1, 2).unwrap();
        assert_eq!(
            alu.execute(Opcode::Jlt, 0x100, 0x200).unwrap(),
            Some(0x100)
        );
        assert_eq!(
            alu.execute(Opcode::Jgt, 0x100, 0x200).unwrap(),
            Some(0x200)
        );
        assert_eq!(alu.execute(Opcode::Jne, 0x100, 0x200).unwrap(), Some(0x100));
        assert_eq!(alu.execute(Opcode::Jump, 0x300, 0).unwrap(), Some(0x300));
        // jump selection mutates nothing
        assert_eq!(alu.accumulator(), 0);
        assert!(alu.flags().contains(Flags::LESSTHAN));
    }

    #[test]
    fn rejects_non_alu_opcodes() {
        let mut alu = alu();
        for opcode in [Opcode::Move, Opcode::Push, Opcode::Ldvr, Opcode::Halt] {
            assert!(matches!(
                alu.execute(opcode, 0, 0),
                Err(Error::InvalidOperation(_))
            ));
        }
    }
}
