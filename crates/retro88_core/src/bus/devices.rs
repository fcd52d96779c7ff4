use std::any::Any;
use std::sync::Arc;

/// Fixed tags for the devices a machine wires together.
///
/// Devices find each other through these tags when the bus attaches them at
/// reset time; registration order is irrelevant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeviceKey {
    /// Shared interrupt/stop lines of the CPU.
    CpuSignals,
    InterruptController,
    /// Vertical-retrace tick source.
    VrtcTimer,
    /// Real-time-clock tick source.
    RtcTimer,
}

/// A peripheral registered on the bus.
///
/// Devices are shared (`Arc`) between the CPU thread and whatever drives
/// them, so every mutation goes through `&self`.
pub trait Device: Any + Send + Sync {
    fn key(&self) -> DeviceKey;

    /// Bus-attach hook, called for every device at machine reset.
    ///
    /// Collaborators must be looked up here rather than at construction
    /// time. Implementations also return their registers to power-on state.
    fn attach(&self, _devices: &DeviceRegistry) {}
}

struct Entry {
    key: DeviceKey,
    device: Arc<dyn Device>,
    any: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct DeviceRegistry {
    entries: Vec<Entry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device under its own key, replacing any earlier device
    /// with the same key.
    pub fn register<T: Device>(&mut self, device: Arc<T>) {
        let key = device.key();
        let any: Arc<dyn Any + Send + Sync> = device.clone();
        let device: Arc<dyn Device> = device;
        self.entries.retain(|entry| entry.key != key);
        self.entries.push(Entry { key, device, any });
    }

    /// Look up a device by key and concrete type.
    ///
    /// Returns `None` if nothing is registered under `key` or the device
    /// there is not a `T`.
    pub fn lookup<T: Device>(&self, key: DeviceKey) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.any.clone().downcast::<T>().ok())
    }

    pub fn contains(&self, key: DeviceKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn attach_all(&self) {
        for entry in &self.entries {
            log::debug!("attaching device {:?}", entry.key);
            entry.device.attach(self);
        }
    }
}
