//! Bus seams.
//!
//! The driver never talks to a HAL directly. It writes byte frames through a
//! [`Transport`], and when it owns the bus it creates and destroys it
//! through a [`BusHost`].
//!
//! - [`Transport`] — one attached device: "transmit these bytes, give up
//!   after the timeout". [`I2cTransport`] adapts any blocking
//!   `embedded-hal` [`I2c`] bus.
//! - [`BusHost`] — platform bus management (create a bus on two pins,
//!   attach the panel, detach, delete). Only the owning construction path
//!   needs one.
//! - [`Ownership`] — what teardown does with the device: [`Borrowed`] drops
//!   the handle and leaves the bus alone, [`OwnedBus`] detaches the device
//!   and deletes the bus.

use embedded_hal::i2c::I2c;

use crate::config::{BusConfig, BusPins};

// ── Transport ────────────────────────────────────────────────────────────

/// A device attached to the bus that accepts whole write transactions.
pub trait Transport {
    /// Error reported by the underlying bus.
    type Error;

    /// Send `bytes` as one bus transaction, blocking for at most
    /// `timeout_ms`.
    fn transmit(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn transmit(&mut self, bytes: &[u8], timeout_ms: u32) -> Result<(), Self::Error> {
        T::transmit(self, bytes, timeout_ms)
    }
}

/// [`Transport`] over a blocking `embedded-hal` I2C bus at a fixed address.
///
/// Timeouts are configured on the HAL peripheral; the per-call value is not
/// forwarded.
///
/// # Example
///
/// ```no_run
/// use visionary_oled::{Display, I2cTransport};
///
/// # fn example(i2c: impl embedded_hal::i2c::I2c) {
/// let device = I2cTransport::new(i2c, 0x3C);
/// let mut oled = Display::new_borrowing(device).unwrap();
/// oled.draw_text(0, 0, "Hello").unwrap();
/// # }
/// ```
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cTransport<I2C>
where
    I2C: I2c,
{
    /// # Arguments
    /// * `i2c` — I2C bus or shared-bus device (e.g. `&mut bus`).
    /// * `address` — 7-bit device address (typically `0x3C`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Build from the address in `config`.
    pub fn from_config(i2c: I2C, config: &BusConfig) -> Self {
        Self::new(i2c, config.address)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Transport for I2cTransport<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn transmit(&mut self, bytes: &[u8], _timeout_ms: u32) -> Result<(), Self::Error> {
        self.i2c.write(self.address, bytes)
    }
}

// ── Bus management ───────────────────────────────────────────────────────

/// Platform bus management for sessions that own their bus.
///
/// Implementations map onto the platform's master-bus API: allocate a
/// controller on two GPIOs, attach a device at an address and clock rate,
/// and tear both down again.
pub trait BusHost {
    /// Error reported by bus management and by the attached device.
    type Error;
    /// Handle to a created bus.
    type Bus;
    /// Handle to a device attached to [`Self::Bus`].
    type Device: Transport<Error = Self::Error>;

    fn create_bus(&mut self, pins: BusPins) -> Result<Self::Bus, Self::Error>;

    fn add_device(
        &mut self,
        bus: &mut Self::Bus,
        config: &BusConfig,
    ) -> Result<Self::Device, Self::Error>;

    fn remove_device(
        &mut self,
        bus: &mut Self::Bus,
        device: Self::Device,
    ) -> Result<(), Self::Error>;

    fn delete_bus(&mut self, bus: Self::Bus) -> Result<(), Self::Error>;
}

// ── Ownership ────────────────────────────────────────────────────────────

/// Release policy for the device handle held by a [`Display`](crate::Display).
pub trait Ownership<T: Transport> {
    /// `true` if the session created the bus and must delete it.
    fn owns_bus(&self) -> bool;

    /// Give up `device` at teardown.
    fn release(&mut self, device: T) -> Result<(), T::Error>;
}

/// The device belongs to someone else. Teardown only drops the handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Borrowed;

impl<T: Transport> Ownership<T> for Borrowed {
    fn owns_bus(&self) -> bool {
        false
    }

    fn release(&mut self, _device: T) -> Result<(), T::Error> {
        Ok(())
    }
}

/// The session created the bus through `H` and must tear it down.
pub struct OwnedBus<H: BusHost> {
    host: H,
    bus: Option<H::Bus>,
}

impl<H: BusHost> OwnedBus<H> {
    /// Create a bus on `pins` and attach the panel to it.
    ///
    /// If attaching fails the freshly created bus is deleted before the
    /// error is returned, so nothing is left allocated.
    pub fn attach(
        mut host: H,
        pins: BusPins,
        config: &BusConfig,
    ) -> Result<(Self, H::Device), H::Error> {
        let mut bus = host.create_bus(pins)?;

        let device = match host.add_device(&mut bus, config) {
            Ok(device) => device,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Adding panel at {=u8:#x} failed, deleting bus", config.address);
                if host.delete_bus(bus).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Bus delete failed during rollback");
                }
                return Err(e);
            }
        };

        #[cfg(feature = "defmt")]
        defmt::info!("Bus created, panel attached at {=u8:#x}", config.address);

        Ok((
            Self {
                host,
                bus: Some(bus),
            },
            device,
        ))
    }
}

impl<H: BusHost> Ownership<H::Device> for OwnedBus<H> {
    fn owns_bus(&self) -> bool {
        true
    }

    /// Detach the device, then delete the bus. The bus is deleted even if
    /// detaching fails; the first error is returned.
    fn release(&mut self, device: H::Device) -> Result<(), H::Error> {
        let Some(mut bus) = self.bus.take() else {
            return Ok(());
        };
        let removed = self.host.remove_device(&mut bus, device);
        let deleted = self.host.delete_bus(bus);
        removed.and(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{BusFault, FakeHost, HostEvent};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn i2c_transport_writes_to_address() {
        let expectations = [I2cTransaction::write(0x3C, vec![0x00, 0xAF])];
        let mut i2c = I2cMock::new(&expectations);

        let mut t = I2cTransport::new(i2c.clone(), 0x3C);
        assert!(t.transmit(&[0x00, 0xAF], 100).is_ok());

        i2c.done();
    }

    #[test]
    fn i2c_transport_surfaces_bus_error() {
        let expectations =
            [I2cTransaction::write(0x3D, vec![0x40, 0x01]).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expectations);

        let mut t = I2cTransport::from_config(
            i2c.clone(),
            &BusConfig {
                address: 0x3D,
                ..BusConfig::default()
            },
        );
        assert_eq!(t.address(), 0x3D);
        assert_eq!(t.transmit(&[0x40, 0x01], 100), Err(ErrorKind::Other));

        i2c.done();
    }

    #[test]
    fn released_bus_is_reusable() {
        let expectations = [
            I2cTransaction::write(0x3C, vec![0x00, 0xAE]),
            I2cTransaction::write(0x3D, vec![0x00, 0xAF]),
        ];
        let mut i2c = I2cMock::new(&expectations);

        let mut first = I2cTransport::new(i2c.clone(), 0x3C);
        first.transmit(&[0x00, 0xAE], 100).unwrap();

        let mut second = I2cTransport::new(first.release(), 0x3D);
        second.transmit(&[0x00, 0xAF], 100).unwrap();

        i2c.done();
    }

    #[test]
    fn attach_creates_bus_then_device() {
        let host = FakeHost::default();
        let log = host.log();
        let (owned, _device) =
            OwnedBus::attach(host, BusPins::new(22, 21), &BusConfig::default()).unwrap();

        assert!(Ownership::<_>::owns_bus(&owned));
        assert_eq!(
            log.events(),
            vec![
                HostEvent::CreateBus { scl: 22, sda: 21 },
                HostEvent::AddDevice {
                    address: 0x3C,
                    clock_hz: 400_000
                },
            ]
        );
    }

    #[test]
    fn attach_failure_deletes_created_bus() {
        let host = FakeHost {
            fail_add_device: true,
            ..FakeHost::default()
        };
        let log = host.log();

        let result = OwnedBus::attach(host, BusPins::default(), &BusConfig::default());
        assert_eq!(result.err(), Some(BusFault));
        assert_eq!(log.live_buses(), 0);
        assert_eq!(log.live_devices(), 0);
        assert_eq!(log.events().last(), Some(&HostEvent::DeleteBus));
    }

    #[test]
    fn create_failure_allocates_nothing() {
        let host = FakeHost {
            fail_create_bus: true,
            ..FakeHost::default()
        };
        let log = host.log();

        assert!(OwnedBus::attach(host, BusPins::default(), &BusConfig::default()).is_err());
        assert_eq!(log.live_buses(), 0);
        assert_eq!(log.events(), vec![]);
    }

    #[test]
    fn owned_release_detaches_and_deletes_once() {
        let host = FakeHost::default();
        let log = host.log();
        let (mut owned, device) =
            OwnedBus::attach(host, BusPins::default(), &BusConfig::default()).unwrap();

        assert!(owned.release(device).is_ok());
        assert_eq!(log.live_buses(), 0);
        assert_eq!(log.live_devices(), 0);

        let events = log.events();
        assert_eq!(&events[2..], &[HostEvent::RemoveDevice, HostEvent::DeleteBus]);
    }

    #[test]
    fn owned_release_deletes_bus_even_if_detach_fails() {
        let host = FakeHost {
            fail_remove_device: true,
            ..FakeHost::default()
        };
        let log = host.log();
        let (mut owned, device) =
            OwnedBus::attach(host, BusPins::default(), &BusConfig::default()).unwrap();

        assert_eq!(owned.release(device), Err(BusFault));
        assert_eq!(log.live_buses(), 0);
    }

    #[test]
    fn borrowed_release_touches_nothing() {
        let host = FakeHost::default();
        let log = host.log();
        let (_owned, device) =
            OwnedBus::attach(host, BusPins::default(), &BusConfig::default()).unwrap();
        let before = log.events();

        let mut borrowed = Borrowed;
        assert!(!Ownership::<crate::mocks::FakeDevice>::owns_bus(&borrowed));
        assert!(borrowed.release(device).is_ok());
        assert_eq!(log.events(), before);
    }
}
