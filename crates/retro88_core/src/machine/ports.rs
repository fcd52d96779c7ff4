use super::MainBus;

pub const PORT_MEMORY_MODE: u8 = 0x31;
pub const PORT_EXT_PAGE: u8 = 0x32;
pub const PORT_VRAM_PLANE0: u8 = 0x5C;
pub const PORT_VRAM_PLANE2: u8 = 0x5E;
pub const PORT_MAIN_RAM: u8 = 0x5F;
pub const PORT_TEXT_WINDOW: u8 = 0x70;
pub const PORT_EXT_ENABLE: u8 = 0x71;
pub const PORT_TEXT_WINDOW_INC: u8 = 0x78;
pub const PORT_INTC_PRIORITY: u8 = 0xE4;
pub const PORT_INTC_MASK: u8 = 0xE6;

impl MainBus {
    /// Every port reads back its latch (0xFF until first written).
    pub(super) fn read_port(&mut self, port: u8) -> u8 {
        match port {
            PORT_TEXT_WINDOW => self.bank.text_window,
            _ => self.ports[port as usize],
        }
    }

    pub(super) fn write_port(&mut self, port: u8, value: u8) {
        self.ports[port as usize] = value;
        match port {
            PORT_MEMORY_MODE => {
                self.bank.write_memory_mode(value);
                log::debug!(
                    "memory mode: all_ram={} rom={:?}",
                    self.bank.all_ram,
                    self.bank.rom_mode
                );
            }
            PORT_EXT_PAGE => {
                self.bank.write_ext_page(value);
                log::debug!("ext ROM page {}", self.bank.ext_page);
            }
            PORT_VRAM_PLANE0..=PORT_VRAM_PLANE2 => {
                self.bank.vram_plane = Some(port - PORT_VRAM_PLANE0);
                log::debug!("VRAM plane {} mapped", port - PORT_VRAM_PLANE0);
            }
            PORT_MAIN_RAM => {
                self.bank.vram_plane = None;
                log::debug!("main RAM mapped at 0xC000");
            }
            PORT_TEXT_WINDOW => {
                self.bank.text_window = value;
                log::debug!("text window 0x{:02X}00", value);
            }
            PORT_EXT_ENABLE => {
                self.bank.write_ext_enable(value);
                log::debug!("ext ROM enabled={}", self.bank.ext_enabled);
            }
            PORT_TEXT_WINDOW_INC => {
                self.bank.text_window = self.bank.text_window.wrapping_add(1);
                log::debug!("text window 0x{:02X}00", self.bank.text_window);
            }
            PORT_INTC_PRIORITY => self.intc.set_priority_register(value),
            PORT_INTC_MASK => self.intc.write_mask(value),
            // Peripherals outside the core only latch.
            _ => {}
        }
    }
}
