//! Test doubles for the bus seams.
//!
//! [`RecordingTransport`] captures every frame written to it and can be told
//! to fail on the N-th transaction. [`FakeHost`] stands in for a platform
//! bus driver and keeps a shared [`HostLog`] of every create/attach/detach/
//! delete call and every frame its devices transmit, so tests can inspect
//! it after the session that owned the host is gone.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::config::{BusConfig, BusPins};
use crate::transport::{BusHost, Transport};

/// Error raised by the fakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

// ── RecordingTransport ───────────────────────────────────────────────────

/// Transport that records frames in memory.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Every successfully transmitted frame, in order.
    pub frames: Vec<Vec<u8>>,
    /// Timeout passed with each transmit call.
    pub timeouts: Vec<u32>,
    /// 1-based transaction number that fails with [`BusFault`].
    pub fail_on: Option<usize>,
    attempts: usize,
}

impl RecordingTransport {
    pub fn failing_on(transaction: usize) -> Self {
        Self {
            fail_on: Some(transaction),
            ..Self::default()
        }
    }

    /// Second byte of every command frame, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.frames
            .iter()
            .filter(|f| f.len() == 2 && f[0] == 0x00)
            .map(|f| f[1])
            .collect()
    }

    /// Number of transmit calls, including the failed one.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl Transport for RecordingTransport {
    type Error = BusFault;

    fn transmit(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<(), BusFault> {
        self.attempts += 1;
        self.timeouts.push(timeout_ms);
        if self.fail_on == Some(self.attempts) {
            return Err(BusFault);
        }
        self.frames.push(bytes.to_vec());
        Ok(())
    }
}

// ── FakeHost ─────────────────────────────────────────────────────────────

/// Bus management call observed by [`FakeHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    CreateBus { scl: u8, sda: u8 },
    AddDevice { address: u8, clock_hz: u32 },
    RemoveDevice,
    DeleteBus,
}

#[derive(Debug, Default)]
struct HostState {
    events: Vec<HostEvent>,
    frames: Vec<Vec<u8>>,
    attempts: usize,
    live_buses: i32,
    live_devices: i32,
}

/// Shared view of everything a [`FakeHost`] and its devices did.
#[derive(Debug, Default, Clone)]
pub struct HostLog(Rc<RefCell<HostState>>);

impl HostLog {
    pub fn events(&self) -> Vec<HostEvent> {
        self.0.borrow().events.clone()
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().frames.clone()
    }

    pub fn live_buses(&self) -> i32 {
        self.0.borrow().live_buses
    }

    pub fn live_devices(&self) -> i32 {
        self.0.borrow().live_devices
    }

    pub fn count(&self, event: &HostEvent) -> usize {
        self.0.borrow().events.iter().filter(|e| *e == event).count()
    }
}

/// Bus created by [`FakeHost`].
#[derive(Debug)]
pub struct FakeBus;

/// Device attached by [`FakeHost`]. Frames go to the host's log.
#[derive(Debug)]
pub struct FakeDevice {
    log: HostLog,
    fail_on: Option<usize>,
}

impl Transport for FakeDevice {
    type Error = BusFault;

    fn transmit(&mut self, bytes: &[u8], _timeout_ms: u32) -> Result<(), BusFault> {
        let mut state = self.log.0.borrow_mut();
        state.attempts += 1;
        if self.fail_on == Some(state.attempts) {
            return Err(BusFault);
        }
        state.frames.push(bytes.to_vec());
        Ok(())
    }
}

/// In-memory platform bus driver.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub fail_create_bus: bool,
    pub fail_add_device: bool,
    pub fail_remove_device: bool,
    /// 1-based transaction number (across all devices) that fails.
    pub fail_on_frame: Option<usize>,
    pub log: HostLog,
}

impl FakeHost {
    pub fn failing_on_frame(frame: usize) -> Self {
        Self {
            fail_on_frame: Some(frame),
            ..Self::default()
        }
    }

    pub fn log(&self) -> HostLog {
        self.log.clone()
    }
}

impl BusHost for FakeHost {
    type Error = BusFault;
    type Bus = FakeBus;
    type Device = FakeDevice;

    fn create_bus(&mut self, pins: BusPins) -> Result<FakeBus, BusFault> {
        if self.fail_create_bus {
            return Err(BusFault);
        }
        let mut state = self.log.0.borrow_mut();
        state.events.push(HostEvent::CreateBus {
            scl: pins.scl,
            sda: pins.sda,
        });
        state.live_buses += 1;
        Ok(FakeBus)
    }

    fn add_device(
        &mut self,
        _bus: &mut FakeBus,
        config: &BusConfig,
    ) -> Result<FakeDevice, BusFault> {
        if self.fail_add_device {
            return Err(BusFault);
        }
        let mut state = self.log.0.borrow_mut();
        state.events.push(HostEvent::AddDevice {
            address: config.address,
            clock_hz: config.clock_hz,
        });
        state.live_devices += 1;
        Ok(FakeDevice {
            log: self.log.clone(),
            fail_on: self.fail_on_frame,
        })
    }

    fn remove_device(&mut self, _bus: &mut FakeBus, _device: FakeDevice) -> Result<(), BusFault> {
        let mut state = self.log.0.borrow_mut();
        state.events.push(HostEvent::RemoveDevice);
        if self.fail_remove_device {
            return Err(BusFault);
        }
        state.live_devices -= 1;
        Ok(())
    }

    fn delete_bus(&mut self, _bus: FakeBus) -> Result<(), BusFault> {
        let mut state = self.log.0.borrow_mut();
        state.events.push(HostEvent::DeleteBus);
        state.live_buses -= 1;
        Ok(())
    }
}
