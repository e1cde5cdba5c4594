//! Flat byte-addressable memory with bounds checking and write notifications.

use crate::errors::Error;

/// Largest memory size a 16-bit address bus can reach, in bytes.
pub const MAX_MEMORY_SIZE: usize = 0x10000;

/// Callback invoked after every 8-bit write with the address and new value.
pub type WriteSubscriber = Box<dyn FnMut(u16, u8)>;

/// A flat, bounds-checked byte store.
///
/// All multi-byte access is big-endian and decomposes into 8-bit accesses, so
/// a 16-bit write fires two notifications. Subscribers are called synchronously
/// inside the write path, in subscription order, which lets collaborators such
/// as a memory-mapped console react to writes as the program makes them.
pub struct Memory {
    bytes: Vec<u8>,
    subscribers: Vec<WriteSubscriber>,
}

impl Memory {
    /// Creates a zero-filled memory of `size` bytes.
    ///
    /// Fails when `size` exceeds what a 16-bit address can reach.
    pub fn new(size: usize) -> Result<Self, Error> {
        if size > MAX_MEMORY_SIZE {
            return Err(Error::InvalidOperation(format!(
                "memory size {size} exceeds the 16-bit address space of {MAX_MEMORY_SIZE} bytes"
            )));
        }
        Ok(Self {
            bytes: vec![0; size],
            subscribers: Vec::new(),
        })
    }

    /// Highest valid byte address.
    pub fn max_address(&self) -> u16 {
        (self.bytes.len().saturating_sub(1)) as u16
    }

    /// Number of addressable bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Registers a callback fired after every 8-bit write.
    pub fn subscribe(&mut self, subscriber: WriteSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Zero-fills the entire store. Subscribers are not notified: a bulk
    /// clear during reinitialization is not a program write.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }

    fn check(&self, address: u16, width: u32) -> Result<(), Error> {
        let last = address as u32 + width - 1;
        if last >= self.bytes.len() as u32 {
            return Err(Error::OutOfRange {
                address: last,
                max: self.max_address() as u32,
            });
        }
        Ok(())
    }

    /// Reads the byte at `address`.
    pub fn get8(&self, address: u16) -> Result<u8, Error> {
        self.check(address, 1)?;
        Ok(self.bytes[address as usize])
    }

    /// Writes `value` at `address` and notifies subscribers.
    pub fn set8(&mut self, address: u16, value: u8) -> Result<(), Error> {
        self.check(address, 1)?;
        self.bytes[address as usize] = value;
        for subscriber in &mut self.subscribers {
            subscriber(address, value);
        }
        Ok(())
    }

    /// Reads the big-endian word at `address`.
    pub fn get16(&self, address: u16) -> Result<u16, Error> {
        self.check(address, 2)?;
        let high = self.bytes[address as usize];
        let low = self.bytes[address as usize + 1];
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Writes `value` big-endian at `address`. Both constituent byte writes
    /// notify subscribers; the range is validated up front so a failing
    /// write never delivers a partial notification.
    pub fn set16(&mut self, address: u16, value: u16) -> Result<(), Error> {
        self.check(address, 2)?;
        let [high, low] = value.to_be_bytes();
        self.set8(address, high)?;
        self.set8(address + 1, low)
    }

    /// Copies `data` into memory starting at `address`, without notifying.
    /// Used to load an assembled program image.
    pub fn load(&mut self, address: u16, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }
        let last = address as u32 + data.len() as u32 - 1;
        if last >= self.bytes.len() as u32 {
            return Err(Error::OutOfRange {
                address: last,
                max: self.max_address() as u32,
            });
        }
        self.bytes[address as usize..address as usize + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.bytes.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
