mod arena;
mod devices;
mod flat;

use std::sync::Arc;

pub use arena::{MemoryArena, RegionId};
pub use devices::{Device, DeviceKey, DeviceRegistry};
pub use flat::FlatBus;

/// Direction of a single memory access.
///
/// Bank-switched machines commonly map reads and writes of the same address
/// to different storage (e.g. ROM on read, the RAM underneath on write).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// Result of resolving one memory access: a storage region plus an offset
/// into it.
///
/// A `Mapping` only lives for the duration of a single peek/poke; it must
/// not be cached across bank register writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mapping {
    pub region: RegionId,
    pub offset: usize,
}

impl Mapping {
    #[inline]
    pub fn new(region: RegionId, offset: usize) -> Self {
        Self { region, offset }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum BusError {
    /// No storage region applies to this address in the current bank state.
    #[error("no storage region mapped for {access:?} at 0x{addr:04X}")]
    Unmapped { addr: u16, access: Access },
    /// The resolver produced an offset outside the region it named.
    #[error("offset 0x{offset:X} is outside region `{region}`")]
    OutOfRange { region: &'static str, offset: usize },
    /// The resolver sent a write to a read-only region.
    #[error("write to read-only region `{region}` at offset 0x{offset:X}")]
    ReadOnly { region: &'static str, offset: usize },
}

/// Address/port space seen by the CPU.
///
/// A concrete machine implements `resolve` (its memory map), the port decode
/// pair and exposes its region arena and device registry. Byte and word
/// access is provided on top of `resolve` and should rarely need overriding.
///
/// Failed resolutions never panic and never silently read zero: the error is
/// latched in the arena (see [`MemoryArena::take_fault`]), reads return
/// `0xFF` and writes are dropped. The CPU run loop checks the latch at every
/// instruction boundary and stops.
pub trait Bus {
    /// Resolve `addr` for the given access direction against the current
    /// bank-selection state. Must be deterministic for a given state.
    fn resolve(&self, addr: u16, access: Access) -> Result<Mapping, BusError>;

    fn memory(&self) -> &MemoryArena;
    fn memory_mut(&mut self) -> &mut MemoryArena;

    /// Read an I/O port. Must be total over 0x00–0xFF.
    fn in_port(&mut self, port: u8) -> u8;
    /// Write an I/O port. Must be total over 0x00–0xFF.
    fn out_port(&mut self, port: u8, value: u8);

    fn devices(&self) -> &DeviceRegistry;
    fn devices_mut(&mut self) -> &mut DeviceRegistry;

    fn peek_byte(&mut self, addr: u16) -> u8 {
        let result = self
            .resolve(addr, Access::Read)
            .and_then(|mapping| self.memory().read(mapping));
        match result {
            Ok(value) => value,
            Err(err) => {
                self.memory_mut().raise_fault(err);
                0xFF
            }
        }
    }

    /// Little-endian word read. The high byte comes from `addr + 1` wrapped
    /// within the 16-bit space, so `peek_word(0xFFFF)` reads 0xFFFF and
    /// 0x0000.
    fn peek_word(&mut self, addr: u16) -> u16 {
        let lo = self.peek_byte(addr);
        let hi = self.peek_byte(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn poke_byte(&mut self, addr: u16, value: u8) {
        let result = self
            .resolve(addr, Access::Write)
            .and_then(|mapping| self.memory_mut().write(mapping, value));
        if let Err(err) = result {
            self.memory_mut().raise_fault(err);
        }
    }

    fn poke_word(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke_pair(addr, hi, lo);
    }

    /// Word write with the two halves supplied separately, for operands whose
    /// bytes come from different registers. Same wraparound as `poke_word`.
    fn poke_pair(&mut self, addr: u16, hi: u8, lo: u8) {
        self.poke_byte(addr, lo);
        self.poke_byte(addr.wrapping_add(1), hi);
    }

    /// Bulk write used for loading RAM images.
    ///
    /// The default resolves each byte for writing and stores it straight into
    /// the arena, without going through `poke_byte`. Machines that attach
    /// per-byte side effects to `poke_byte` therefore skip them here unless
    /// they override this method as well.
    fn poke_block(&mut self, addr: u16, bytes: &[u8]) {
        let mut cursor = addr;
        for &value in bytes {
            let result = self
                .resolve(cursor, Access::Write)
                .and_then(|mapping| self.memory_mut().write(mapping, value));
            if let Err(err) = result {
                self.memory_mut().raise_fault(err);
                return;
            }
            cursor = cursor.wrapping_add(1);
        }
    }

    fn register_device<T: Device>(&mut self, device: Arc<T>)
    where
        Self: Sized,
    {
        self.devices_mut().register(device);
    }

    fn lookup_device<T: Device>(&self, key: DeviceKey) -> Option<Arc<T>>
    where
        Self: Sized,
    {
        self.devices().lookup(key)
    }

    /// Invoke every registered device's attach hook (machine reset).
    fn reset_all(&mut self) {
        self.devices().attach_all();
    }

    /// Take the first bus fault raised since the last call, if any.
    fn take_fault(&mut self) -> Option<BusError> {
        self.memory_mut().take_fault()
    }
}
