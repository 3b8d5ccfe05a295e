// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Target-agnostic USB device controller driver (DCD).
//!
//! The types and operations defined in this crate are common to all targets.
//! They complement a per-target hardware layer which implements
//! [`hil::UsbController`], providing the shared device state machine, the
//! control endpoint 0 request dispatch, and the descriptor response engine,
//! and defining the interface with which the hardware layer must comply.
//!
//! The hardware layer owns the real interrupts. It translates them into the
//! virtual event codes of [`device::Event`] and delivers them, serially per
//! controller, to [`device::Dcd::event`]. No other entry point exists on the
//! data path.

#![no_std]

pub mod cdc;
pub mod descriptors;
pub mod device;
pub mod hid;
pub mod hil;

/// Standard errors returned to the integrator.
///
/// Only controller allocation reports errors. The event and dispatch paths
/// signal failure on the bus itself, by stalling the control endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 0,
    /// Underlying system is busy; retry
    BUSY = 1,
    /// An invalid parameter was passed
    INVAL = 5,
    /// Operation or command is unsupported
    NOSUPPORT = 9,
}

macro_rules! usb_debug {
    ($($arg:expr),* $(,)?) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg),*);
        #[cfg(not(feature = "defmt"))]
        { $(let _ = &$arg;)* }
    }};
}
pub(crate) use usb_debug;
