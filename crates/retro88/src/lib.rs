use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use retro88_core::{Machine, MachineConfig, Registers};

/// Parse a run time in (possibly fractional) seconds. Negative, NaN and
/// out-of-range values are rejected.
pub fn parse_run_time(arg: &str) -> Result<Duration> {
    let seconds = arg
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid run time '{}'", arg))?;
    Duration::try_from_secs_f64(seconds).with_context(|| format!("invalid run time '{}'", arg))
}

/// Boot a machine from the given ROM images, let it run on its CPU thread
/// for `duration`, then stop it and return the final register file.
pub fn run(
    n88_rom: &[u8],
    n_rom: Option<&[u8]>,
    duration: Duration,
    trace: bool,
) -> Result<Registers> {
    let mut machine = Machine::new(MachineConfig::default());
    machine.load_n88_rom(n88_rom);
    if let Some(image) = n_rom {
        machine.load_n_rom(image);
    }
    if trace {
        machine.cpu_mut().set_trace_hook(Box::new(|regs: &Registers| {
            log::trace!(
                "PC={:04X} AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
                regs.pc,
                regs.af(),
                regs.bc(),
                regs.de(),
                regs.hl(),
                regs.sp
            );
        }));
    }

    let handle = machine.spawn().context("failed to start the CPU thread")?;
    log::info!("running for {:?}", duration);
    thread::sleep(duration);
    if handle.is_finished() {
        log::warn!("CPU thread stopped before the deadline");
    }

    let (machine, result) = handle.stop().context("failed to stop the machine")?;
    result.context("CPU stopped on a bus fault")?;
    Ok(*machine.cpu().regs())
}
