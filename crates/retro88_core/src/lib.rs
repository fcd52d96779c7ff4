pub mod bus;
pub mod cpu;
pub mod intc;
pub mod machine;
pub mod timer;

pub use bus::{Access, Bus, BusError, Device, DeviceKey, DeviceRegistry, FlatBus, Mapping};
pub use cpu::{Cpu, CpuSignals, Flags, InterruptMode, Reg16, Reg8, Registers, TraceHook};
pub use intc::InterruptController;
pub use machine::{MainBus, Machine, MachineConfig, MachineError, MachineHandle};
pub use timer::PeriodicTimer;

/// Size of the Z80 memory address space (64 KiB).
pub const ADDRESS_SPACE: usize = 0x10000;
/// Number of addressable I/O ports.
pub const PORT_COUNT: usize = 0x100;
