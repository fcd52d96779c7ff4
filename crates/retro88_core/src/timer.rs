use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bus::{Device, DeviceKey, DeviceRegistry};
use crate::intc::InterruptController;

/// Free-running periodic interrupt source.
///
/// Once started, a background thread requests `channel` on the interrupt
/// controller every `period`. The thread is not synchronised with CPU
/// instruction boundaries; the controller's atomics are the only contact.
#[derive(Debug)]
pub struct PeriodicTimer {
    key: DeviceKey,
    channel: u8,
    period: Duration,
    intc: OnceLock<Arc<InterruptController>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTimer {
    /// `hz` of zero is treated as 1 Hz.
    pub fn new(key: DeviceKey, channel: u8, hz: u32) -> Self {
        let hz = hz.max(1);
        Self {
            key,
            channel,
            period: Duration::from_secs(1) / hz,
            intc: OnceLock::new(),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the tick thread. Does nothing if it is already running or the
    /// timer has not been attached to an interrupt controller.
    pub fn start(&self) {
        let Some(intc) = self.intc.get().cloned() else {
            log::warn!("{:?} started before attach; no interrupt controller", self.key);
            return;
        };
        let Ok(mut worker) = self.worker.lock() else {
            log::error!("{:?} worker lock poisoned", self.key);
            return;
        };
        if worker.is_some() {
            return;
        }

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let channel = self.channel;
        let period = self.period;
        let spawned = thread::Builder::new()
            .name(format!("tick-ch{channel}"))
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    thread::sleep(period);
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                    intc.request_interrupt(channel);
                }
            });
        match spawned {
            Ok(handle) => {
                log::debug!(
                    "{:?} started: channel {} every {:?}",
                    self.key,
                    channel,
                    period
                );
                *worker = Some(handle);
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                log::error!("{:?} thread spawn failed: {}", self.key, err);
            }
        }
    }

    /// Stop and join the tick thread, if any.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("{:?} thread panicked", self.key);
            }
            log::debug!("{:?} stopped", self.key);
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Device for PeriodicTimer {
    fn key(&self) -> DeviceKey {
        self.key
    }

    fn attach(&self, devices: &DeviceRegistry) {
        match devices.lookup::<InterruptController>(DeviceKey::InterruptController) {
            Some(intc) => {
                if let Err(intc) = self.intc.set(intc) {
                    match self.intc.get() {
                        Some(current) if Arc::ptr_eq(current, &intc) => {
                            log::trace!("{:?} already wired to the interrupt controller", self.key)
                        }
                        _ => log::warn!(
                            "{:?} keeps its first interrupt controller; re-attach ignored",
                            self.key
                        ),
                    }
                }
            }
            None => log::warn!("{:?} attached without an interrupt controller", self.key),
        }
    }
}
