use std::time::Duration;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(rom_path) = args.next() else {
        eprintln!("Usage: retro88 <n88.rom> [seconds] [n-basic.rom]");
        std::process::exit(1);
    };
    let duration = match args.next() {
        Some(arg) => retro88::parse_run_time(&arg)?,
        None => Duration::from_secs(1),
    };
    let n_rom_path = args.next();

    log::info!("Loading N88 ROM: '{}'", rom_path);
    let n88_rom =
        std::fs::read(&rom_path).with_context(|| format!("failed to read '{}'", rom_path))?;
    let n_rom = match n_rom_path {
        Some(path) => {
            log::info!("Loading N ROM: '{}'", path);
            let image =
                std::fs::read(&path).with_context(|| format!("failed to read '{}'", path))?;
            Some(image)
        }
        None => None,
    };

    let regs = retro88::run(
        &n88_rom,
        n_rom.as_deref(),
        duration,
        log::log_enabled!(log::Level::Trace),
    )?;
    log::info!(
        "stopped: PC={:04X} SP={:04X} AF={:04X} BC={:04X} DE={:04X} HL={:04X} IX={:04X} IY={:04X}",
        regs.pc,
        regs.sp,
        regs.af(),
        regs.bc(),
        regs.de(),
        regs.hl(),
        regs.ix,
        regs.iy
    );
    Ok(())
}
