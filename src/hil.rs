// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interface to USB device controller hardware.
//!
//! A target implements [`UsbController`] for its USB core, performing the
//! MMIO, endpoint buffer programming, and cache maintenance this crate
//! stays away from. The driver core consumes this trait from the event
//! dispatch path only; the hardware layer in turn consumes nothing from the
//! core except [`crate::device::Dcd::event`].

use vcell::VolatileCell;

use crate::descriptors::TransferDirection;

/// Bus speed a device controller is attached at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceSpeed {
    Low,
    Full,
    High,
}

/// USB device controller hardware interface.
///
/// Buffer parameters are slices of [`VolatileCell`] so that the hardware
/// layer may hand them to DMA; a zero-length transfer is an empty slice.
/// All methods are called from the event dispatch context and must not
/// block.
pub trait UsbController {
    /// Configure and enable an endpoint. `size` of zero selects the
    /// target's default packet size for the endpoint.
    fn endpoint_enable(&self, endpoint: usize, direction: TransferDirection, size: u16);

    /// Clear a feature (halt) on an endpoint.
    fn endpoint_clear_feature(&self, endpoint: usize);

    /// Set a feature (halt) on an endpoint.
    fn endpoint_set_feature(&self, endpoint: usize);

    /// Read the current status word of an endpoint.
    fn endpoint_status(&self, endpoint: usize) -> u16;

    /// Latch the device address assigned by the host. The target decides
    /// when during enumeration the hardware register is actually written,
    /// and emits [`crate::device::Event::DeviceAddress`] once it has.
    fn set_device_address(&self, address: u16);

    /// Start an IN transfer of `len` bytes from `buf` on endpoint 0.
    fn control_transmit(&self, buf: &[VolatileCell<u8>], len: usize, zlp: bool);

    /// Arm an OUT transfer of `len` bytes into `buf` on endpoint 0. With
    /// `notify` set, the target emits
    /// [`crate::device::Event::ControlComplete`] once the data stage has
    /// finished.
    fn control_receive(&self, buf: &[VolatileCell<u8>], len: usize, notify: bool);

    /// Stall or unstall endpoint 0 in the given direction.
    fn control_stall(&self, stall: bool, direction: TransferDirection);

    /// Return a DMA-safe scratch buffer owned by the hardware layer,
    /// preloaded with `seed`. Used for short status-style responses that
    /// must not live in the descriptor scratch.
    fn control_status_buffer(&self, seed: &[u8]) -> &[VolatileCell<u8>];

    /// Make `len` bytes of `buf` visible to the bus engine before a
    /// transmit, on targets where the buffer is backed by cacheable memory.
    fn flush_cache(&self, buf: &[VolatileCell<u8>], len: usize);

    /// Enable or disable start-of-frame interrupts for `interface_count`
    /// interfaces.
    fn enable_sof(&self, enable: bool, interface_count: usize);

    // Class data plane hooks. The core routes configuration and completed
    // class control transfers here; byte streaming and report queues are
    // the target layer's business.

    /// CDC-ACM: bring up the UART data plane after SET_CONFIGURATION.
    fn uart_configure(&self);

    /// CDC-ACM: a SET_LINE_CODING data stage completed with these 7 bytes.
    fn uart_set_line_coding(&self, coding: &[u8]);

    /// CDC-ACM: a SET_CONTROL_LINE_STATE completed. DTR is bit 0, RTS is
    /// bit 1 of `state`.
    fn uart_set_line_state(&self, state: u16);

    /// HID: bring up the serial report plane after SET_CONFIGURATION.
    fn serial_configure(&self);

    /// HID: bring up the keyboard report plane after SET_CONFIGURATION.
    fn keyboard_configure(&self);

    /// HID: bring up the mouse report plane after SET_CONFIGURATION.
    fn mouse_configure(&self);

    /// HID: bring up the joystick report plane after SET_CONFIGURATION.
    fn joystick_configure(&self);
}

#[cfg(test)]
pub(crate) mod testing {
    //! A recording fake of the hardware interface for unit tests.

    use core::cell::Cell;

    use vcell::VolatileCell;

    use super::UsbController;
    use crate::descriptors::TransferDirection;

    const LOG_SIZE: usize = 256;
    const HOST_OUT_SIZE: usize = 64;

    /// Records every controller call and simulates the host side of OUT
    /// data stages: bytes preloaded into `host_out` are copied into the
    /// receive buffer at the moment it is armed, the way target DMA would
    /// fill it before completion.
    pub(crate) struct FakeController {
        status_storage: [VolatileCell<u8>; 8],

        pub(crate) transmits: Cell<usize>,
        pub(crate) last_transmit_len: Cell<usize>,
        pub(crate) last_transmit_zlp: Cell<bool>,
        pub(crate) transmit_log: [Cell<u8>; LOG_SIZE],

        pub(crate) receives: Cell<usize>,
        pub(crate) last_receive_len: Cell<usize>,
        pub(crate) last_receive_notify: Cell<bool>,
        pub(crate) last_receive_empty: Cell<bool>,
        pub(crate) host_out: [Cell<u8>; HOST_OUT_SIZE],
        pub(crate) host_out_len: Cell<usize>,

        pub(crate) stalls: Cell<usize>,
        pub(crate) last_stall: Cell<Option<(bool, TransferDirection)>>,

        pub(crate) address: Cell<Option<u16>>,
        pub(crate) endpoint_enables: Cell<usize>,
        pub(crate) last_endpoint_enable: Cell<Option<(usize, TransferDirection, u16)>>,
        pub(crate) cleared_feature: Cell<Option<usize>>,
        pub(crate) set_feature: Cell<Option<usize>>,
        pub(crate) endpoint_status_value: Cell<u16>,
        pub(crate) flushes: Cell<usize>,
        pub(crate) sof: Cell<Option<(bool, usize)>>,

        pub(crate) uart_configured: Cell<bool>,
        pub(crate) line_coding: [Cell<u8>; 7],
        pub(crate) line_coding_calls: Cell<usize>,
        pub(crate) line_state: Cell<Option<u16>>,
        pub(crate) serial_configured: Cell<bool>,
        pub(crate) keyboard_configured: Cell<bool>,
        pub(crate) mouse_configured: Cell<bool>,
        pub(crate) joystick_configured: Cell<bool>,
    }

    impl FakeController {
        pub(crate) fn new() -> Self {
            FakeController {
                status_storage: core::array::from_fn(|_| VolatileCell::new(0)),
                transmits: Cell::new(0),
                last_transmit_len: Cell::new(0),
                last_transmit_zlp: Cell::new(false),
                transmit_log: core::array::from_fn(|_| Cell::new(0)),
                receives: Cell::new(0),
                last_receive_len: Cell::new(0),
                last_receive_notify: Cell::new(false),
                last_receive_empty: Cell::new(false),
                host_out: core::array::from_fn(|_| Cell::new(0)),
                host_out_len: Cell::new(0),
                stalls: Cell::new(0),
                last_stall: Cell::new(None),
                address: Cell::new(None),
                endpoint_enables: Cell::new(0),
                last_endpoint_enable: Cell::new(None),
                cleared_feature: Cell::new(None),
                set_feature: Cell::new(None),
                endpoint_status_value: Cell::new(0),
                flushes: Cell::new(0),
                sof: Cell::new(None),
                uart_configured: Cell::new(false),
                line_coding: core::array::from_fn(|_| Cell::new(0)),
                line_coding_calls: Cell::new(0),
                line_state: Cell::new(None),
                serial_configured: Cell::new(false),
                keyboard_configured: Cell::new(false),
                mouse_configured: Cell::new(false),
                joystick_configured: Cell::new(false),
            }
        }

        /// Queue bytes the "host" will send in the next OUT data stage.
        pub(crate) fn queue_host_out(&self, data: &[u8]) {
            let n = data.len().min(self.host_out.len());
            for (cell, byte) in self.host_out.iter().zip(data.iter().take(n)) {
                cell.set(*byte);
            }
            self.host_out_len.set(n);
        }

        /// Total control plane actions armed so far.
        pub(crate) fn control_actions(&self) -> usize {
            self.transmits.get() + self.receives.get()
        }

        pub(crate) fn transmitted(&self, len: usize) -> impl Iterator<Item = u8> + '_ {
            self.transmit_log.iter().take(len).map(Cell::get)
        }
    }

    impl UsbController for FakeController {
        fn endpoint_enable(&self, endpoint: usize, direction: TransferDirection, size: u16) {
            self.endpoint_enables.set(self.endpoint_enables.get() + 1);
            self.last_endpoint_enable
                .set(Some((endpoint, direction, size)));
        }

        fn endpoint_clear_feature(&self, endpoint: usize) {
            self.cleared_feature.set(Some(endpoint));
        }

        fn endpoint_set_feature(&self, endpoint: usize) {
            self.set_feature.set(Some(endpoint));
        }

        fn endpoint_status(&self, _endpoint: usize) -> u16 {
            self.endpoint_status_value.get()
        }

        fn set_device_address(&self, address: u16) {
            self.address.set(Some(address));
        }

        fn control_transmit(&self, buf: &[VolatileCell<u8>], len: usize, zlp: bool) {
            self.transmits.set(self.transmits.get() + 1);
            self.last_transmit_len.set(len);
            self.last_transmit_zlp.set(zlp);
            let n = len.min(buf.len()).min(self.transmit_log.len());
            for i in 0..n {
                self.transmit_log[i].set(buf[i].get());
            }
        }

        fn control_receive(&self, buf: &[VolatileCell<u8>], len: usize, notify: bool) {
            self.receives.set(self.receives.get() + 1);
            self.last_receive_len.set(len);
            self.last_receive_notify.set(notify);
            self.last_receive_empty.set(buf.is_empty());
            let n = len.min(buf.len()).min(self.host_out_len.get());
            for i in 0..n {
                buf[i].set(self.host_out[i].get());
            }
        }

        fn control_stall(&self, stall: bool, direction: TransferDirection) {
            self.stalls.set(self.stalls.get() + 1);
            self.last_stall.set(Some((stall, direction)));
        }

        fn control_status_buffer(&self, seed: &[u8]) -> &[VolatileCell<u8>] {
            let n = seed.len().min(self.status_storage.len());
            for (cell, byte) in self.status_storage.iter().zip(seed.iter().take(n)) {
                cell.set(*byte);
            }
            &self.status_storage[..n]
        }

        fn flush_cache(&self, _buf: &[VolatileCell<u8>], _len: usize) {
            self.flushes.set(self.flushes.get() + 1);
        }

        fn enable_sof(&self, enable: bool, interface_count: usize) {
            self.sof.set(Some((enable, interface_count)));
        }

        fn uart_configure(&self) {
            self.uart_configured.set(true);
        }

        fn uart_set_line_coding(&self, coding: &[u8]) {
            self.line_coding_calls.set(self.line_coding_calls.get() + 1);
            for (cell, byte) in self.line_coding.iter().zip(coding.iter()) {
                cell.set(*byte);
            }
        }

        fn uart_set_line_state(&self, state: u16) {
            self.line_state.set(Some(state));
        }

        fn serial_configure(&self) {
            self.serial_configured.set(true);
        }

        fn keyboard_configure(&self) {
            self.keyboard_configured.set(true);
        }

        fn mouse_configure(&self) {
            self.mouse_configured.set(true);
        }

        fn joystick_configure(&self) {
            self.joystick_configured.set(true);
        }
    }
}
