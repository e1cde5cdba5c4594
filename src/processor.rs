//! Fetch/decode/execute core, lifecycle events, and the fault policy.
//!
//! The processor owns main memory, the ALU, the call stack and the
//! general-purpose register file. `step()` fetches one opcode byte at `PC`,
//! decodes its operands from the shape table and executes it; `run()` repeats
//! until a `HALT` or a fault.
//!
//! # Fault policy
//!
//! Any decode or execute error reinitializes the whole processor: registers,
//! ALU, stack and `PC` return to their power-on state, while memory contents
//! survive. A [`Event::Reset`] carrying the offending opcode and error is
//! delivered, and the error is then re-raised to the caller. Faults are never
//! swallowed; a faulting `run()` always returns `Err`.

use crate::alu::{ArithmeticLogicUnit, Flags};
use crate::errors::Error;
use crate::isa::Opcode;
use crate::memory::Memory;
use crate::registers::{Register, RegisterFile};
use crate::stack::Stack;


/// Lifecycle notifications, delivered synchronously in program order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An instruction finished executing.
    Tick { opcode: Opcode },
    /// A `HALT` instruction stopped the machine.
    Halt,
    /// The processor reinitialized, either from a `RESET` instruction
    /// (`error` is `None`) or from a fault. `opcode` is absent when the
    /// fault happened before decoding finished.
    Reset {
        opcode: Option<Opcode>,
        error: Option<Error>,
    },
}

/// Callback invoked for every [`Event`].
pub type EventSubscriber = Box<dyn FnMut(&Event)>;

pub struct Processor {
    memory: Memory,
    registers: RegisterFile,
    alu: ArithmeticLogicUnit,
    stack: Stack,
    pc: u16,
    halted: bool,
    subscribers: Vec<EventSubscriber>,
}

impl Processor {
    /// Creates a processor over `memory`, reserving the top `stack_size`
    /// bytes of it for the call stack.
    pub fn new(memory: Memory, stack_size: u16) -> Result<Self, Error> {
        let start = u16::try_from(memory.size()).map_err(|_| {
            Error::InvalidOperation(format!(
                "memory of {} bytes leaves no 16-bit address for the stack start",
                memory.size()
            ))
        })?;
        let end = start.checked_sub(stack_size).ok_or_else(|| {
            Error::InvalidOperation(format!(
                "stack of {stack_size} bytes does not fit in {start} bytes of memory"
            ))
        })?;
        Ok(Self {
            memory,
            registers: RegisterFile::new()?,
            alu: ArithmeticLogicUnit::new(),
            stack: Stack::new(start, end)?,
            pc: 0,
            halted: false,
            subscribers: Vec::new(),
        })
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Registers a callback fired for every lifecycle event.
    pub fn subscribe(&mut self, subscriber: EventSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Copies an assembled program image to address 0.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), Error> {
        self.memory.load(0, image)
    }

    /// Reads any register by name, privileged ones included.
    pub fn register(&self, register: Register) -> Result<u16, Error> {
        match register {
            Register::Pc => Ok(self.pc),
            Register::Acc => Ok(self.alu.accumulator()),
            Register::Flag => Ok(self.alu.flags().bits()),
            Register::Sp => Ok(self.stack.sp()),
            Register::Fp => Ok(self.stack.fp()),
            Register::Arg => Ok(self.stack.arg_pointer()),
            Register::Ret => Ok(self.stack.ret_pointer()),
            _ => self.registers.get(register),
        }
    }

    /// Writes a register on behalf of a decoded instruction. `PC`, `ARG` and
    /// `RET` only move as side effects of jumps, calls and returns, so naming
    /// them here is a fault.
    fn write_register(&mut self, register: Register, value: u16) -> Result<(), Error> {
        if register.is_privileged() {
            return Err(Error::InvalidOperation(format!(
                "{register} cannot be written by an instruction"
            )));
        }
        match register {
            Register::Acc => self.alu.set_accumulator(value),
            Register::Flag => self.alu.set_flags(Flags::from_bits(value)),
            Register::Sp => self.stack.set_sp(value),
            Register::Fp => self.stack.set_fp(value),
            _ => self.registers.set(register, value)?,
        }
        Ok(())
    }

    /// Returns registers, ALU, stack and `PC` to their power-on state.
    /// Memory contents are preserved.
    fn initialize(&mut self) {
        self.pc = 0;
        self.halted = false;
        self.registers.reset();
        self.alu.reset();
        self.stack.reset();
    }

    fn notify(&mut self, event: &Event) {
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }

    // ==================== fetch ====================

    fn fetch8(&mut self) -> Result<u8, Error> {
        let value = self.memory.get8(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(value)
    }

    fn fetch16(&mut self) -> Result<u16, Error> {
        let value = self.memory.get16(self.pc)?;
        self.pc = self.pc.wrapping_add(2);
        Ok(value)
    }

    fn fetch_register(&mut self) -> Result<Register, Error> {
        Register::try_from(self.fetch8()?)
    }

    // ==================== execute ====================

    /// Executes one instruction.
    ///
    /// On success, emits `Tick`, then `Halt` or `Reset` when the instruction
    /// asks for them. On a fault, reinitializes the processor, emits `Reset`
    /// with the error, and re-raises it.
    pub fn step(&mut self) -> Result<(), Error> {
        match self.try_step() {
            Ok(opcode) => {
                self.notify(&Event::Tick { opcode });
                match opcode {
                    Opcode::Halt => {
                        self.halted = true;
                        self.notify(&Event::Halt);
                    }
                    Opcode::Reset => {
                        self.initialize();
                        self.notify(&Event::Reset {
                            opcode: Some(Opcode::Reset),
                            error: None,
                        });
                    }
                    _ => {}
                }
                Ok(())
            }
            Err((opcode, error)) => {
                self.initialize();
                self.notify(&Event::Reset {
                    opcode,
                    error: Some(error.clone()),
                });
                Err(error)
            }
        }
    }

    /// Steps until a `HALT` stops the machine or a fault aborts the run.
    pub fn run(&mut self) -> Result<(), Error> {
        self.halted = false;
        while !self.halted {
            self.step()?;
        }
        Ok(())
    }

    fn try_step(&mut self) -> Result<Opcode, (Option<Opcode>, Error)> {
        let byte = self.fetch8().map_err(|error| (None, error))?;
        let opcode = Opcode::try_from(byte).map_err(|error| (None, error))?;
        self.execute(opcode).map_err(|error| (Some(opcode), error))?;
        Ok(opcode)
    }

    fn execute(&mut self, opcode: Opcode) -> Result<(), Error> {
        match opcode {
            // step() performs the halt/reset itself
            Opcode::Nop | Opcode::Halt | Opcode::Reset => Ok(()),

            Opcode::Inc | Opcode::Dec => self.op_alu_unary(opcode, 1),
            Opcode::Not | Opcode::Cmpz => self.op_alu_unary(opcode, 0),
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Cmp
            | Opcode::Srlr
            | Opcode::Srrr => self.op_alu_binary(opcode),
            Opcode::Srl | Opcode::Srr => self.op_shift_immediate(opcode),

            Opcode::Move => self.op_move(),
            Opcode::Ldvr | Opcode::Lbvr => self.op_load_value(opcode),
            Opcode::Ldar | Opcode::Lbar => self.op_load_address(opcode),
            Opcode::Ldrr | Opcode::Lbrr => self.op_load_register(opcode),
            Opcode::Stvr | Opcode::Sbvr => self.op_store_value_register(opcode),
            Opcode::Stva | Opcode::Sbva => self.op_store_value_address(opcode),
            Opcode::Stra | Opcode::Sbra => self.op_store_register_address(opcode),
            Opcode::Strr | Opcode::Sbrr => self.op_store_register_register(opcode),

            Opcode::Push => self.op_push(),
            Opcode::Pop => self.op_pop(),
            Opcode::Peek => self.op_peek(),

            Opcode::Jump
            | Opcode::Jlt
            | Opcode::Jgt
            | Opcode::Je
            | Opcode::Jne
            | Opcode::Jz
            | Opcode::Jnz => self.op_jump(opcode),
            Opcode::Jumpr
            | Opcode::Jltr
            | Opcode::Jgtr
            | Opcode::Jer
            | Opcode::Jner
            | Opcode::Jzr
            | Opcode::Jnzr => self.op_jump_register(opcode),

            Opcode::Call => self.op_call(),
            Opcode::Callr => self.op_call_register(),
            Opcode::Ret => self.op_ret(),
        }
    }

    // ==================== handlers ====================

    fn op_alu_unary(&mut self, opcode: Opcode, b: u16) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let a = self.register(register)?;
        let _ = self.alu.execute(opcode, a, b)?;
        Ok(())
    }

    fn op_alu_binary(&mut self, opcode: Opcode) -> Result<(), Error> {
        let a = self.fetch_register()?;
        let b = self.fetch_register()?;
        let a = self.register(a)?;
        let b = self.register(b)?;
        let _ = self.alu.execute(opcode, a, b)?;
        Ok(())
    }

    fn op_shift_immediate(&mut self, opcode: Opcode) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let amount = self.fetch8()?;
        let a = self.register(register)?;
        let _ = self.alu.execute(opcode, a, amount as u16)?;
        Ok(())
    }

    fn op_move(&mut self) -> Result<(), Error> {
        let source = self.fetch_register()?;
        let destination = self.fetch_register()?;
        let value = self.register(source)?;
        self.write_register(destination, value)
    }

    fn op_load_value(&mut self, opcode: Opcode) -> Result<(), Error> {
        let value = match opcode {
            Opcode::Ldvr => self.fetch16()?,
            _ => self.fetch8()? as u16,
        };
        let destination = self.fetch_register()?;
        self.write_register(destination, value)
    }

    fn op_load_address(&mut self, opcode: Opcode) -> Result<(), Error> {
        let address = self.fetch16()?;
        let destination = self.fetch_register()?;
        let value = match opcode {
            Opcode::Ldar => self.memory.get16(address)?,
            _ => self.memory.get8(address)? as u16,
        };
        self.write_register(destination, value)
    }

    fn op_load_register(&mut self, opcode: Opcode) -> Result<(), Error> {
        let source = self.fetch_register()?;
        let destination = self.fetch_register()?;
        let address = self.register(source)?;
        let value = match opcode {
            Opcode::Ldrr => self.memory.get16(address)?,
            _ => self.memory.get8(address)? as u16,
        };
        self.write_register(destination, value)
    }

    fn op_store_value_register(&mut self, opcode: Opcode) -> Result<(), Error> {
        let value = match opcode {
            Opcode::Stvr => self.fetch16()?,
            _ => self.fetch8()? as u16,
        };
        let register = self.fetch_register()?;
        let address = self.register(register)?;
        match opcode {
            Opcode::Stvr => self.memory.set16(address, value),
            _ => self.memory.set8(address, value as u8),
        }
    }

    fn op_store_value_address(&mut self, opcode: Opcode) -> Result<(), Error> {
        let value = match opcode {
            Opcode::Stva => self.fetch16()?,
            _ => self.fetch8()? as u16,
        };
        let address = self.fetch16()?;
        match opcode {
            Opcode::Stva => self.memory.set16(address, value),
            _ => self.memory.set8(address, value as u8),
        }
    }

    fn op_store_register_address(&mut self, opcode: Opcode) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let address = self.fetch16()?;
        let value = self.register(register)?;
        match opcode {
            Opcode::Stra => self.memory.set16(address, value),
            _ => self.memory.set8(address, value as u8),
        }
    }

    fn op_store_register_register(&mut self, opcode: Opcode) -> Result<(), Error> {
        let source = self.fetch_register()?;
        let destination = self.fetch_register()?;
        let value = self.register(source)?;
        let address = self.register(destination)?;
        match opcode {
            Opcode::Strr => self.memory.set16(address, value),
            _ => self.memory.set8(address, value as u8),
        }
    }

    fn op_push(&mut self) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let value = self.register(register)?;
        self.stack.push(&mut self.memory, value)
    }

    fn op_pop(&mut self) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let value = self.stack.pop(&mut self.memory)?;
        self.write_register(register, value)
    }

    fn op_peek(&mut self) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let value = self.stack.peek(&self.memory)?;
        self.write_register(register, value)
    }

    fn op_jump(&mut self, opcode: Opcode) -> Result<(), Error> {
        let target = self.fetch16()?;
        self.jump_to(opcode, target)
    }

    fn op_jump_register(&mut self, opcode: Opcode) -> Result<(), Error> {
        let register = self.fetch_register()?;
        let target = self.register(register)?;
        self.jump_to(opcode, target)
    }

    /// The fall-through address is the PC after operand fetch, i.e. the next
    /// sequential instruction.
    fn jump_to(&mut self, opcode: Opcode, target: u16) -> Result<(), Error> {
        if let Some(address) = self.alu.execute(opcode, target, self.pc)? {
            self.pc = address;
        }
        Ok(())
    }

    fn op_call(&mut self) -> Result<(), Error> {
        let arg_count = self.fetch16()?;
        let target = self.fetch16()?;
        self.stack.call(&mut self.memory, arg_count, self.pc)?;
        self.pc = target;
        Ok(())
    }

    fn op_call_register(&mut self) -> Result<(), Error> {
        let arg_count = self.fetch16()?;
        let register = self.fetch_register()?;
        let target = self.register(register)?;
        self.stack.call(&mut self.memory, arg_count, self.pc)?;
        self.pc = target;
        Ok(())
    }

    fn op_ret(&mut self) -> Result<(), Error> {
        let return_value_count = self.fetch16()?;
        self.pc = self.stack.ret(&mut self.memory, return_value_count)?;
        Ok(())
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("pc", &self.pc)
            .field("halted", &self.halted)
            .field("alu", &self.alu)
            .field("stack", &self.stack)
            .finish()
    }
}
