//! Process-wide display slot.
//!
//! Firmware that drives a single panel from several call sites can park the
//! session in a `static`:
//!
//! ```no_run
//! use visionary_oled::{Borrowed, Display, I2cTransport, SharedDisplay};
//!
//! type Bus = embedded_hal_mock::eh1::i2c::Mock;
//! static OLED: SharedDisplay<I2cTransport<Bus>, Borrowed> = SharedDisplay::new();
//!
//! # fn example(i2c: Bus) {
//! OLED.init(|| Display::new_borrowing(I2cTransport::new(i2c, 0x3C))).unwrap();
//! OLED.with(|oled| oled.draw_text(0, 0, "Hello World")).unwrap();
//! OLED.deinit().unwrap();
//! # }
//! ```
//!
//! The critical section only guards moving the session in and out of the
//! slot. Bus traffic runs with interrupts enabled, and while one caller has
//! the session checked out every other call sees a busy slot.

use core::cell::RefCell;
use core::mem;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::driver::{Display, SessionState};
use crate::error::OledError;
use crate::transport::{Borrowed, Ownership, Transport};

enum Slot<T, O>
where
    T: Transport,
{
    Empty,
    /// Checked out by `init` or `with`; holds the state to report meanwhile.
    InUse(SessionState),
    Active(Display<T, O>),
}

/// At most one [`Display`] session, shareable across tasks and interrupts.
///
/// A call made while another call has the session checked out (including
/// from inside [`with`](Self::with)) fails instead of waiting:
/// [`init`](Self::init) with [`OledError::InvalidArgument`], everything else
/// with [`OledError::NotInitialized`]. If the closure passed to `with`
/// panics, the slot stays busy.
pub struct SharedDisplay<T, O = Borrowed>
where
    T: Transport,
{
    slot: Mutex<CriticalSectionRawMutex, RefCell<Slot<T, O>>>,
}

impl<T, O> SharedDisplay<T, O>
where
    T: Transport,
    O: Ownership<T>,
{
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot::Empty)),
        }
    }

    fn put(&self, next: Slot<T, O>) {
        self.slot.lock(|slot| *slot.borrow_mut() = next);
    }

    /// Move the active session out, leaving a busy marker behind.
    fn check_out(&self) -> Option<Display<T, O>> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            match mem::replace(&mut *slot, Slot::Empty) {
                Slot::Active(display) => {
                    *slot = Slot::InUse(display.state());
                    Some(display)
                }
                other => {
                    *slot = other;
                    None
                }
            }
        })
    }

    /// Start the session by calling `connect`.
    ///
    /// `connect` is only called when the slot is empty, so a duplicate call
    /// never creates a second bus.
    ///
    /// # Errors
    ///
    /// [`OledError::InvalidArgument`] if a session is already active or
    /// being set up, or whatever `connect` returns.
    pub fn init<F>(&self, connect: F) -> Result<(), OledError<T::Error>>
    where
        F: FnOnce() -> Result<Display<T, O>, OledError<T::Error>>,
    {
        let claimed = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if matches!(*slot, Slot::Empty) {
                *slot = Slot::InUse(SessionState::Configuring);
                true
            } else {
                false
            }
        });
        if !claimed {
            #[cfg(feature = "defmt")]
            defmt::warn!("Display already initialised");
            return Err(OledError::InvalidArgument);
        }

        match connect() {
            Ok(display) => {
                self.put(Slot::Active(display));
                Ok(())
            }
            Err(e) => {
                self.put(Slot::Empty);
                Err(e)
            }
        }
    }

    /// Run `f` against the active session.
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`] if there is no session or it is in use,
    /// otherwise whatever `f` returns.
    pub fn with<R, F>(&self, f: F) -> Result<R, OledError<T::Error>>
    where
        F: FnOnce(&mut Display<T, O>) -> Result<R, OledError<T::Error>>,
    {
        let mut display = self.check_out().ok_or(OledError::NotInitialized)?;
        let result = f(&mut display);
        self.put(Slot::Active(display));
        result
    }

    /// Tear the session down and empty the slot.
    ///
    /// The slot is emptied even when releasing the bus fails, so a fresh
    /// [`init`](Self::init) is always possible afterwards.
    pub fn deinit(&self) -> Result<(), OledError<T::Error>> {
        let taken = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            match mem::replace(&mut *slot, Slot::Empty) {
                Slot::Active(display) => Some(display),
                other => {
                    *slot = other;
                    None
                }
            }
        });
        match taken {
            Some(mut display) => display.deinit(),
            None => Err(OledError::NotInitialized),
        }
    }

    /// [`SessionState::Uninitialized`] when the slot is empty.
    pub fn state(&self) -> SessionState {
        self.slot.lock(|slot| match &*slot.borrow() {
            Slot::Empty => SessionState::Uninitialized,
            Slot::InUse(state) => *state,
            Slot::Active(display) => display.state(),
        })
    }
}

impl<T, O> Default for SharedDisplay<T, O>
where
    T: Transport,
    O: Ownership<T>,
{
    fn default() -> Self {
        Self::new()
    }
}
