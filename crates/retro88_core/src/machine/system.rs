use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use typed_builder::TypedBuilder;

use super::{MachineError, MainBus, RTC_CHANNEL, VRTC_CHANNEL};
use crate::bus::{Bus, BusError, DeviceKey};
use crate::cpu::{Cpu, CpuSignals};
use crate::intc::InterruptController;
use crate::timer::PeriodicTimer;

#[derive(Clone, Debug, TypedBuilder)]
pub struct MachineConfig {
    /// Vertical-retrace interrupt rate (channel 1).
    #[builder(default = 60)]
    pub vrtc_hz: u32,
    /// Real-time-clock interrupt rate (channel 2).
    #[builder(default = 600)]
    pub rtc_hz: u32,
    /// Sleep between checks while the CPU is halted.
    #[builder(default = Duration::from_millis(1))]
    pub halt_poll: Duration,
    /// Start the tick sources in `run`/`spawn`.
    #[builder(default = true)]
    pub timers_enabled: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// CPU, bus and peripherals of one machine.
pub struct Machine {
    config: MachineConfig,
    cpu: Cpu,
    bus: MainBus,
    signals: Arc<CpuSignals>,
    intc: Arc<InterruptController>,
    timers: [Arc<PeriodicTimer>; 2],
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let signals = Arc::new(CpuSignals::new());
        let intc = Arc::new(InterruptController::new());
        let timers = [
            Arc::new(PeriodicTimer::new(
                DeviceKey::VrtcTimer,
                VRTC_CHANNEL,
                config.vrtc_hz,
            )),
            Arc::new(PeriodicTimer::new(
                DeviceKey::RtcTimer,
                RTC_CHANNEL,
                config.rtc_hz,
            )),
        ];

        let mut cpu = Cpu::with_signals(Arc::clone(&signals));
        cpu.set_halt_poll(config.halt_poll);

        let mut bus = MainBus::new(Arc::clone(&intc));
        bus.register_device(Arc::clone(&signals));
        bus.register_device(Arc::clone(&intc));
        for timer in &timers {
            bus.register_device(Arc::clone(timer));
        }

        let mut machine = Self {
            config,
            cpu,
            bus,
            signals,
            intc,
            timers,
        };
        machine.reset();
        machine
    }

    /// Machine reset: bank registers, device attach hooks, then the CPU.
    /// Installed ROMs and RAM contents survive.
    pub fn reset(&mut self) {
        self.bus.reset_banks();
        self.bus.reset_all();
        self.cpu.reset();
        self.cpu.attach_to(&self.bus);
        log::info!("machine reset ({} devices)", self.bus.devices().len());
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &MainBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut MainBus {
        &mut self.bus
    }

    pub fn signals(&self) -> Arc<CpuSignals> {
        Arc::clone(&self.signals)
    }

    pub fn intc(&self) -> Arc<InterruptController> {
        Arc::clone(&self.intc)
    }

    pub fn load_n88_rom(&mut self, image: &[u8]) {
        self.bus.install_n88_rom(image);
        log::info!("N88 ROM installed ({} bytes)", image.len());
    }

    pub fn load_n_rom(&mut self, image: &[u8]) {
        self.bus.install_n_rom(image);
        log::info!("N ROM installed ({} bytes)", image.len());
    }

    pub fn load_ext_rom(&mut self, page: usize, image: &[u8]) -> Result<(), MachineError> {
        if !self.bus.install_ext_rom(page, image) {
            return Err(MachineError::InvalidRomPage { page });
        }
        log::info!("extension ROM page {} installed ({} bytes)", page, image.len());
        Ok(())
    }

    /// Copy bytes into whatever the current bank state maps for writing at
    /// `addr`. Goes through `poke_block`, so no VRAM lines are marked dirty.
    pub fn load_ram(&mut self, addr: u16, bytes: &[u8]) -> Result<(), BusError> {
        self.bus.poke_block(addr, bytes);
        match self.bus.take_fault() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    pub fn step_n(&mut self, count: usize) -> Result<u64, BusError> {
        self.cpu.step_n(&mut self.bus, count)
    }

    /// Raise the non-maskable interrupt (STOP key).
    pub fn request_nmi(&self) {
        self.signals.raise_nmi();
    }

    fn start_timers(&self) {
        if !self.config.timers_enabled {
            return;
        }
        for timer in &self.timers {
            timer.start();
        }
    }

    fn stop_timers(&self) {
        for timer in &self.timers {
            timer.stop();
        }
    }

    /// Run on the calling thread until a stop is requested or the bus
    /// faults.
    pub fn run(&mut self) -> Result<(), BusError> {
        self.start_timers();
        let result = self.cpu.run(&mut self.bus);
        self.stop_timers();
        result
    }

    /// Move the machine onto a dedicated CPU thread and start the tick
    /// sources. Any earlier stop request is cleared first.
    pub fn spawn(self) -> Result<MachineHandle, MachineError> {
        self.signals.clear_stop();
        let signals = Arc::clone(&self.signals);
        let timers = self.timers.clone();
        self.start_timers();

        let spawned = thread::Builder::new()
            .name("z80".into())
            .spawn(move || {
                let mut machine = self;
                let result = machine.cpu.run(&mut machine.bus);
                (machine, result)
            });

        match spawned {
            Ok(thread) => Ok(MachineHandle {
                signals,
                timers,
                thread,
            }),
            Err(err) => {
                for timer in &timers {
                    timer.stop();
                }
                Err(MachineError::Spawn(err))
            }
        }
    }
}

/// Control handle for a machine running on its CPU thread.
pub struct MachineHandle {
    signals: Arc<CpuSignals>,
    timers: [Arc<PeriodicTimer>; 2],
    thread: JoinHandle<(Machine, Result<(), BusError>)>,
}

impl MachineHandle {
    pub fn signals(&self) -> Arc<CpuSignals> {
        Arc::clone(&self.signals)
    }

    pub fn request_nmi(&self) {
        self.signals.raise_nmi();
    }

    /// True once the CPU thread has returned on its own (bus fault).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Request a stop, join the CPU thread and stop the tick sources.
    /// Returns the machine together with the run loop's result.
    pub fn stop(self) -> Result<(Machine, Result<(), BusError>), MachineError> {
        self.signals.request_stop();
        let joined = self.thread.join();
        for timer in &self.timers {
            timer.stop();
        }
        let (machine, result) = joined.map_err(|_| MachineError::CpuThreadPanicked)?;
        machine.signals.clear_stop();
        Ok((machine, result))
    }
}
