//! Frame-oriented call stack over a region of main memory.
//!
//! The stack occupies `[end, start]` and grows downward: a push decrements the
//! stack pointer by one word and writes through [`Memory`], so stack traffic
//! is visible to write subscribers like any other program write.
//!
//! Frames are delimited by the frame pointer. `call` records the caller's
//! argument block and pushes the bookkeeping words (argument count, return
//! address, saved frame pointer); `ret` pushes the return-value count, then
//! unwinds all of it so the caller's stack and frame pointers come back
//! exactly. Return values stay readable below the unwound stack pointer
//! through the `RET` snapshot.

use crate::errors::Error;
use crate::memory::Memory;

#[derive(Debug)]
pub struct Stack {
    /// High end of the region; value of `SP`/`FP` when the stack is empty.
    start: u16,
    /// Low bound; a push with `SP` here overflows.
    end: u16,
    sp: u16,
    fp: u16,
    arg: u16,
    ret: u16,
}

impl Stack {
    /// Creates a stack over `[end, start]`. Both bounds must be word-aligned
    /// and `end` must not exceed `start`.
    pub fn new(start: u16, end: u16) -> Result<Self, Error> {
        if start % 2 != 0 || end % 2 != 0 {
            return Err(Error::InvalidOperation(format!(
                "stack bounds {end:#06x}..{start:#06x} must be word-aligned"
            )));
        }
        if end > start {
            return Err(Error::InvalidOperation(format!(
                "stack end {end:#06x} is above its start {start:#06x}"
            )));
        }
        Ok(Self {
            start,
            end,
            sp: start,
            fp: start,
            arg: 0,
            ret: 0,
        })
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn fp(&self) -> u16 {
        self.fp
    }

    /// Stack pointer as it was when the current frame was called; the
    /// caller's argument block starts at this address, last argument first.
    pub fn arg_pointer(&self) -> u16 {
        self.arg
    }

    /// Stack pointer as it was when the last frame returned; the callee's
    /// return-value block starts at this address, with the value count one
    /// word below it.
    pub fn ret_pointer(&self) -> u16 {
        self.ret
    }

    pub fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    pub fn set_fp(&mut self, value: u16) {
        self.fp = value;
    }

    /// Collapses to the base frame.
    pub fn reset(&mut self) {
        self.sp = self.start;
        self.fp = self.start;
        self.arg = 0;
        self.ret = 0;
    }

    /// Pushes one word.
    ///
    /// The stack pointer is writable by programs, so it is validated against
    /// the region here rather than trusted: a pointer above `start` is a
    /// corrupt pointer, one without room for a word below it is an overflow.
    pub fn push(&mut self, memory: &mut Memory, value: u16) -> Result<(), Error> {
        if self.sp > self.start {
            return Err(Error::InvalidOperation(format!(
                "stack pointer {:#06x} outside the stack region",
                self.sp
            )));
        }
        if (self.sp as u32) < self.end as u32 + 2 {
            return Err(Error::StackOverflow {
                pointer: self.sp,
                end: self.end,
            });
        }
        self.sp -= 2;
        memory.set16(self.sp, value)
    }

    /// Pops one word from the current frame.
    pub fn pop(&mut self, memory: &mut Memory) -> Result<u16, Error> {
        let value = self.peek(memory)?;
        self.sp += 2;
        Ok(value)
    }

    /// Reads the word on top of the current frame without popping it.
    pub fn peek(&self, memory: &Memory) -> Result<u16, Error> {
        if self.sp == self.fp {
            return Err(Error::InvalidOperation(
                "pop or peek on an empty stack frame".into(),
            ));
        }
        if self.sp < self.end || self.sp >= self.start {
            return Err(Error::InvalidOperation(format!(
                "stack pointer {:#06x} outside the stack region",
                self.sp
            )));
        }
        memory.get16(self.sp)
    }

    /// Opens a new frame. The caller has already pushed `arg_count` argument
    /// words; this records where they end, pushes the bookkeeping words and
    /// rebases the frame pointer.
    pub fn call(
        &mut self,
        memory: &mut Memory,
        arg_count: u16,
        return_address: u16,
    ) -> Result<(), Error> {
        self.arg = self.sp;
        self.push(memory, arg_count)?;
        self.push(memory, return_address)?;
        self.push(memory, self.fp)?;
        self.fp = self.sp;
        Ok(())
    }

    /// Closes the current frame and returns the caller's resume address.
    ///
    /// The callee has already pushed `return_value_count` result words; this
    /// records where they end, pushes the count for the caller, then unwinds
    /// the frame: restores the saved frame pointer, pops the return address,
    /// and discards the argument block so the stack pointer lands exactly
    /// where it was before the matching `call`.
    pub fn ret(&mut self, memory: &mut Memory, return_value_count: u16) -> Result<u16, Error> {
        if self.fp == self.start {
            return Err(Error::InvalidOperation(
                "return outside of any call frame".into(),
            ));
        }
        // a genuine frame leaves room for its three bookkeeping words
        if self.fp < self.end || self.fp as u32 + 6 > self.start as u32 {
            return Err(Error::InvalidOperation(format!(
                "frame pointer {:#06x} outside the stack region",
                self.fp
            )));
        }
        self.ret = self.sp;
        self.push(memory, return_value_count)?;

        self.sp = self.fp;
        let saved_fp = memory.get16(self.sp)?;
        self.sp += 2;
        let return_address = memory.get16(self.sp)?;
        self.sp += 2;
        let arg_count = memory.get16(self.sp)?;
        self.sp += 2;

        let unwound = self.sp as u32 + 2 * arg_count as u32;
        if unwound > self.start as u32 {
            return Err(Error::InvalidOperation(format!(
                "corrupt stack frame: {arg_count} arguments exceed the region"
            )));
        }
        self.sp = unwound as u16;
        self.fp = saved_fp;
        Ok(return_address)
    }
}
