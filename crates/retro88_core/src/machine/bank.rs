/// BASIC ROM selected for the low 32 KiB when not in all-RAM mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RomMode {
    #[default]
    N88,
    NBasic,
}

/// Bank-selection registers. Only port writes change these, and `resolve`
/// reads them on every access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BankState {
    /// 0x0000–0x7FFF reads come from RAM.
    pub all_ram: bool,
    pub rom_mode: RomMode,
    /// Extension ROM page shown at 0x6000–0x7FFF in N88 mode.
    pub ext_page: u8,
    pub ext_enabled: bool,
    /// VRAM plane mapped at 0xC000–0xFFFF; `None` maps main RAM.
    pub vram_plane: Option<u8>,
    /// High byte of the RAM address seen through 0x8000–0x83FF.
    pub text_window: u8,
}

impl BankState {
    /// Port 0x31: bit 1 selects all-RAM mode, bit 2 N-BASIC.
    pub fn write_memory_mode(&mut self, value: u8) {
        self.all_ram = value & 0x02 != 0;
        self.rom_mode = if value & 0x04 != 0 {
            RomMode::NBasic
        } else {
            RomMode::N88
        };
    }

    /// Port 0x32: bits 0–1 pick the extension ROM page.
    pub fn write_ext_page(&mut self, value: u8) {
        self.ext_page = value & 0x03;
    }

    /// Port 0x71: the extension ROM is enabled when bit 0 is clear.
    pub fn write_ext_enable(&mut self, value: u8) {
        self.ext_enabled = value & 0x01 == 0;
    }
}
