use super::{Access, Bus, BusError, DeviceRegistry, Mapping, MemoryArena, RegionId};
use crate::{ADDRESS_SPACE, PORT_COUNT};

/// 64 KiB of flat RAM plus a port latch.
///
/// Every address maps to the same region, so resolution never fails. Port
/// writes are stored and read back; this is what tests and single-stepping
/// tools use when no concrete machine is needed.
pub struct FlatBus {
    memory: MemoryArena,
    devices: DeviceRegistry,
    ram: RegionId,
    ports: [u8; PORT_COUNT],
}

impl Default for FlatBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatBus {
    pub fn new() -> Self {
        let mut memory = MemoryArena::new();
        let ram = memory.add_ram("ram", ADDRESS_SPACE);
        Self {
            memory,
            devices: DeviceRegistry::new(),
            ram,
            ports: [0xFF; PORT_COUNT],
        }
    }

    /// Copy `program` to `addr` (no wraparound, truncated at 0xFFFF).
    pub fn load(&mut self, addr: u16, program: &[u8]) {
        let start = addr as usize;
        let ram = self.memory.region_mut(self.ram);
        let len = program.len().min(ram.len() - start);
        ram[start..start + len].copy_from_slice(&program[..len]);
    }

    pub fn ram(&self) -> &[u8] {
        self.memory.region(self.ram)
    }

    /// Preset the value a subsequent `in_port(port)` returns.
    pub fn set_port(&mut self, port: u8, value: u8) {
        self.ports[port as usize] = value;
    }

    pub fn port(&self, port: u8) -> u8 {
        self.ports[port as usize]
    }
}

impl Bus for FlatBus {
    fn resolve(&self, addr: u16, _access: Access) -> Result<Mapping, BusError> {
        Ok(Mapping::new(self.ram, addr as usize))
    }

    fn memory(&self) -> &MemoryArena {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut MemoryArena {
        &mut self.memory
    }

    fn in_port(&mut self, port: u8) -> u8 {
        self.ports[port as usize]
    }

    fn out_port(&mut self, port: u8, value: u8) {
        self.ports[port as usize] = value;
    }

    fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    fn devices_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.devices
    }
}
