use std::sync::Arc;

use super::{BankState, RomMode, EXT_ROM_PAGES, VRAM_LINES, VRAM_LINE_BYTES, VRAM_PLANES};
use crate::bus::{Access, Bus, BusError, DeviceRegistry, Mapping, MemoryArena, RegionId};
use crate::intc::InterruptController;
use crate::{ADDRESS_SPACE, PORT_COUNT};

const BASIC_ROM_SIZE: usize = 0x8000;
const EXT_ROM_SIZE: usize = 0x2000;
const VRAM_PLANE_SIZE: usize = 0x4000;

const EXT_ROM_BASE: u16 = 0x6000;
const TEXT_WINDOW_BASE: u16 = 0x8000;
const TEXT_WINDOW_END: u16 = 0x83FF;
const VRAM_BASE: u16 = 0xC000;

/// Bus of the bank-switched machine.
///
/// | Range     | Read                                   | Write |
/// |-----------|----------------------------------------|-------|
/// | 0000–5FFF | BASIC ROM, or RAM in all-RAM mode      | RAM   |
/// | 6000–7FFF | N ROM / extension ROM page / N88 ROM   | RAM   |
/// | 8000–83FF | RAM through the text window            | same  |
/// | 8400–BFFF | RAM                                    | RAM   |
/// | C000–FFFF | selected VRAM plane, or RAM            | same  |
///
/// `poke_byte` marks the touched VRAM line dirty. `poke_block` is left at
/// the trait default and does not, so bulk image loads never schedule
/// redraws.
pub struct MainBus {
    memory: MemoryArena,
    devices: DeviceRegistry,
    ram: RegionId,
    n88_rom: RegionId,
    n_rom: RegionId,
    ext_rom: [RegionId; EXT_ROM_PAGES],
    vram: [RegionId; VRAM_PLANES],
    has_n88_rom: bool,
    has_n_rom: bool,
    has_ext_rom: [bool; EXT_ROM_PAGES],
    pub(super) bank: BankState,
    pub(super) ports: [u8; PORT_COUNT],
    pub(super) intc: Arc<InterruptController>,
    dirty: [bool; VRAM_LINES],
}

impl MainBus {
    pub fn new(intc: Arc<InterruptController>) -> Self {
        let mut memory = MemoryArena::new();
        let ram = memory.add_ram("main-ram", ADDRESS_SPACE);
        let n88_rom = memory.add_rom("n88-rom", BASIC_ROM_SIZE);
        let n_rom = memory.add_rom("n-rom", BASIC_ROM_SIZE);
        let ext_rom = [
            memory.add_rom("ext-rom-0", EXT_ROM_SIZE),
            memory.add_rom("ext-rom-1", EXT_ROM_SIZE),
            memory.add_rom("ext-rom-2", EXT_ROM_SIZE),
            memory.add_rom("ext-rom-3", EXT_ROM_SIZE),
        ];
        let vram = [
            memory.add_ram("vram-0", VRAM_PLANE_SIZE),
            memory.add_ram("vram-1", VRAM_PLANE_SIZE),
            memory.add_ram("vram-2", VRAM_PLANE_SIZE),
        ];
        Self {
            memory,
            devices: DeviceRegistry::new(),
            ram,
            n88_rom,
            n_rom,
            ext_rom,
            vram,
            has_n88_rom: false,
            has_n_rom: false,
            has_ext_rom: [false; EXT_ROM_PAGES],
            bank: BankState::default(),
            ports: [0xFF; PORT_COUNT],
            intc,
            dirty: [false; VRAM_LINES],
        }
    }

    /// Return bank registers and port latches to power-on values. Memory
    /// contents and installed ROMs are kept.
    pub fn reset_banks(&mut self) {
        self.bank = BankState::default();
        self.ports = [0xFF; PORT_COUNT];
        self.dirty = [false; VRAM_LINES];
    }

    pub fn bank(&self) -> &BankState {
        &self.bank
    }

    pub fn intc(&self) -> &Arc<InterruptController> {
        &self.intc
    }

    pub fn install_n88_rom(&mut self, image: &[u8]) {
        self.memory.load(self.n88_rom, image);
        self.has_n88_rom = true;
    }

    pub fn install_n_rom(&mut self, image: &[u8]) {
        self.memory.load(self.n_rom, image);
        self.has_n_rom = true;
    }

    /// Install one extension ROM page. Returns `false` for a page number
    /// that does not exist.
    pub fn install_ext_rom(&mut self, page: usize, image: &[u8]) -> bool {
        if page >= EXT_ROM_PAGES {
            return false;
        }
        self.memory.load(self.ext_rom[page], image);
        self.has_ext_rom[page] = true;
        true
    }

    pub fn ram(&self) -> &[u8] {
        self.memory.region(self.ram)
    }

    pub fn vram_plane(&self, plane: usize) -> Option<&[u8]> {
        self.vram.get(plane).map(|&id| self.memory.region(id))
    }

    pub fn is_line_dirty(&self, line: usize) -> bool {
        self.dirty.get(line).copied().unwrap_or(false)
    }

    /// Indices of dirty VRAM lines; the dirty set is cleared.
    pub fn take_dirty_lines(&mut self) -> Vec<usize> {
        let lines = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(line, &dirty)| dirty.then_some(line))
            .collect();
        self.dirty = [false; VRAM_LINES];
        lines
    }

    fn resolve_low(&self, addr: u16, access: Access) -> Result<Mapping, BusError> {
        let offset = addr as usize;
        if access == Access::Write || self.bank.all_ram {
            return Ok(Mapping::new(self.ram, offset));
        }
        match self.bank.rom_mode {
            RomMode::NBasic if self.has_n_rom => Ok(Mapping::new(self.n_rom, offset)),
            RomMode::NBasic => Err(BusError::Unmapped { addr, access }),
            RomMode::N88 => {
                if addr >= EXT_ROM_BASE && self.bank.ext_enabled {
                    let page = self.bank.ext_page as usize;
                    if self.has_ext_rom[page] {
                        return Ok(Mapping::new(
                            self.ext_rom[page],
                            (addr - EXT_ROM_BASE) as usize,
                        ));
                    }
                    // Empty extension slot: the N88 ROM shows through.
                    log::trace!("ext ROM page {} empty at 0x{:04X}", page, addr);
                }
                if self.has_n88_rom {
                    Ok(Mapping::new(self.n88_rom, offset))
                } else {
                    Err(BusError::Unmapped { addr, access })
                }
            }
        }
    }

    fn mark_dirty(&mut self, addr: u16) {
        if addr < VRAM_BASE || self.bank.vram_plane.is_none() {
            return;
        }
        let line = (addr - VRAM_BASE) as usize / VRAM_LINE_BYTES;
        if let Some(dirty) = self.dirty.get_mut(line) {
            *dirty = true;
        }
    }
}

impl Bus for MainBus {
    fn resolve(&self, addr: u16, access: Access) -> Result<Mapping, BusError> {
        match addr {
            0x0000..=0x7FFF => self.resolve_low(addr, access),
            TEXT_WINDOW_BASE..=TEXT_WINDOW_END if !self.bank.all_ram => {
                let target = ((self.bank.text_window as u16) << 8).wrapping_add(addr & 0x03FF);
                Ok(Mapping::new(self.ram, target as usize))
            }
            0x8000..=0xBFFF => Ok(Mapping::new(self.ram, addr as usize)),
            VRAM_BASE..=0xFFFF => match self.bank.vram_plane {
                Some(plane) => Ok(Mapping::new(
                    self.vram[plane as usize],
                    (addr - VRAM_BASE) as usize,
                )),
                None => Ok(Mapping::new(self.ram, addr as usize)),
            },
        }
    }

    fn memory(&self) -> &MemoryArena {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut MemoryArena {
        &mut self.memory
    }

    fn in_port(&mut self, port: u8) -> u8 {
        self.read_port(port)
    }

    fn out_port(&mut self, port: u8, value: u8) {
        self.write_port(port, value);
    }

    fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    fn devices_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.devices
    }

    fn poke_byte(&mut self, addr: u16, value: u8) {
        let result = self
            .resolve(addr, Access::Write)
            .and_then(|mapping| self.memory.write(mapping, value));
        match result {
            Ok(()) => self.mark_dirty(addr),
            Err(err) => self.memory.raise_fault(err),
        }
    }
}
