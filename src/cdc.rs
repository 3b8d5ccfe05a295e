// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! CDC-ACM (virtual serial port) personality.
//!
//! Control plane only: class requests on endpoint 0 and the descriptor
//! tables for a two-interface ACM function. Byte streaming on the data
//! endpoints lives behind the UART hooks of
//! [`UsbController`](crate::hil::UsbController).

use vcell::VolatileCell;

use crate::descriptors::{DescriptorSet, DeviceStrings, SetupPacket, TransferDirection};
use crate::device::{transmit_response, Stage};
use crate::hil::UsbController;

/// Number of CDC-ACM class configurations on this platform.
pub const CONFIG_COUNT: usize = 1;

/// Communication (control/status) interface number.
pub const INTERFACE_CTRL: u16 = 0;

/// Bulk data interface number.
pub const INTERFACE_DATA: u16 = 1;

// Class request codes (CDC PSTN 1.2 table 13).
pub const REQUEST_SET_LINE_CODING: u8 = 0x20;
pub const REQUEST_SET_CONTROL_LINE_STATE: u8 = 0x22;
pub const REQUEST_SEND_BREAK: u8 = 0x23;

/// A line coding payload is exactly 7 bytes: dwDTERate, bCharFormat,
/// bParityType, bDataBits.
pub const LINE_CODING_SIZE: usize = 7;

const DESCRIPTOR_BUFLEN: usize = 128;

const SUFFIX: &str = " CDC-ACM";

/// Default device descriptor for the ACM function.
pub const DEVICE_DESCRIPTOR: &[u8] = &[
    0x12, // bLength
    0x01, // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.00)
    0x02, // bDeviceClass (CDC)
    0x00, // bDeviceSubClass
    0x00, // bDeviceProtocol
    0x40, // bMaxPacketSize0 (64)
    0x67, 0x66, // idVendor (0x6667)
    0xCD, 0xAB, // idProduct (0xABCD)
    0x01, 0x00, // bcdDevice (0.01)
    0x01, // iManufacturer
    0x02, // iProduct
    0x03, // iSerialNumber
    0x01, // bNumConfigurations
];

/// Default configuration descriptor blob:
///   Config(9) + Ctrl interface(9) + Header(5) + Call mgmt(5) + ACM(4) +
///   Union(5) + Notif EP(7) + Data interface(9) + OUT EP(7) + IN EP(7)
pub const CONFIGURATION_DESCRIPTOR: &[u8] = &[
    // Configuration descriptor
    0x09, // bLength
    0x02, // bDescriptorType (Configuration)
    0x43, 0x00, // wTotalLength (67)
    0x02, // bNumInterfaces
    0x01, // bConfigurationValue
    0x00, // iConfiguration
    0xC0, // bmAttributes (self powered)
    0x32, // bMaxPower (100 mA)
    // Communication interface
    0x09, // bLength
    0x04, // bDescriptorType (Interface)
    0x00, // bInterfaceNumber
    0x00, // bAlternateSetting
    0x01, // bNumEndpoints
    0x02, // bInterfaceClass (CDC)
    0x02, // bInterfaceSubClass (ACM)
    0x01, // bInterfaceProtocol (AT commands)
    0x00, // iInterface
    // Header functional descriptor
    0x05, 0x24, 0x00, 0x10, 0x01, // bcdCDC (1.10)
    // Call management functional descriptor
    0x05, 0x24, 0x01, 0x01, 0x01, // capabilities, data interface 1
    // ACM functional descriptor
    0x04, 0x24, 0x02, 0x06, // line coding + serial state
    // Union functional descriptor
    0x05, 0x24, 0x06, 0x00, 0x01, // control 0, subordinate 1
    // Notification endpoint (Interrupt IN)
    0x07, 0x05, 0x81, 0x03, 0x10, 0x00, 0x40,
    // Data interface
    0x09, // bLength
    0x04, // bDescriptorType (Interface)
    0x01, // bInterfaceNumber
    0x00, // bAlternateSetting
    0x02, // bNumEndpoints
    0x0A, // bInterfaceClass (CDC Data)
    0x00, // bInterfaceSubClass
    0x00, // bInterfaceProtocol
    0x00, // iInterface
    // Data endpoint (Bulk OUT)
    0x07, 0x05, 0x02, 0x02, 0x40, 0x00, 0x00,
    // Data endpoint (Bulk IN)
    0x07, 0x05, 0x82, 0x02, 0x40, 0x00, 0x00,
];

/// Default device qualifier descriptor.
pub const QUALIFIER_DESCRIPTOR: &[u8] = &[
    0x0A, // bLength
    0x06, // bDescriptorType (Device Qualifier)
    0x00, 0x02, // bcdUSB (2.00)
    0x02, // bDeviceClass (CDC)
    0x00, // bDeviceSubClass
    0x00, // bDeviceProtocol
    0x40, // bMaxPacketSize0
    0x01, // bNumConfigurations
    0x00, // bReserved
];

/// Descriptor tables and control scratch of one CDC-ACM configuration.
pub struct CdcAcmTables {
    pub desc: DescriptorSet,
    /// Descriptor response scratch, DMA-visible.
    dx: [VolatileCell<u8>; DESCRIPTOR_BUFLEN],
    /// SET_LINE_CODING receive scratch.
    cx: [VolatileCell<u8>; LINE_CODING_SIZE],
}

impl CdcAcmTables {
    pub fn new(strings: DeviceStrings) -> CdcAcmTables {
        CdcAcmTables {
            desc: DescriptorSet::new(
                DEVICE_DESCRIPTOR,
                CONFIGURATION_DESCRIPTOR,
                QUALIFIER_DESCRIPTOR,
                strings,
            ),
            dx: core::array::from_fn(|_| VolatileCell::new(0)),
            cx: core::array::from_fn(|_| VolatileCell::new(0)),
        }
    }

    /// The last line coding received from the host.
    pub fn line_coding(&self) -> [u8; LINE_CODING_SIZE] {
        core::array::from_fn(|i| self.cx[i].get())
    }
}

/// SET_CONFIGURATION fan-out for this personality.
pub(crate) fn configure<U: UsbController>(hw: &U) {
    hw.uart_configure();
}

/// Class requests on the communication interface. Interpretation of the
/// received payload is deferred to [`control_complete`].
pub(crate) fn class_setup<U: UsbController>(
    hw: &U,
    tables: &CdcAcmTables,
    setup: SetupPacket,
) -> Stage {
    if setup.direction() != TransferDirection::HostToDevice {
        return Stage::Stall;
    }
    match setup.b_request {
        REQUEST_SET_LINE_CODING => {
            // A line coding must contain exactly 7 bytes.
            if setup.w_length as usize == LINE_CODING_SIZE {
                hw.control_receive(&tables.cx, LINE_CODING_SIZE, true);
                Stage::DataOut
            } else {
                Stage::Stall
            }
        }
        REQUEST_SET_CONTROL_LINE_STATE => {
            if setup.w_index == INTERFACE_CTRL {
                hw.control_receive(&[], 0, false);
                Stage::StatusOut
            } else {
                Stage::Stall
            }
        }
        REQUEST_SEND_BREAK => {
            hw.control_receive(&[], 0, false);
            Stage::StatusOut
        }
        _ => Stage::Stall,
    }
}

/// Completion work once a class OUT data stage has finished.
pub(crate) fn control_complete<U: UsbController>(
    hw: &U,
    tables: &CdcAcmTables,
    setup: SetupPacket,
) {
    match setup.b_request {
        REQUEST_SET_LINE_CODING if setup.w_index == INTERFACE_CTRL => {
            // The target layer watches for triggers like magic baud rates,
            // which may reboot into the bootloader or start an OTA update.
            hw.uart_set_line_coding(&tables.line_coding());
        }
        REQUEST_SET_CONTROL_LINE_STATE if setup.w_index == INTERFACE_CTRL => {
            // DTR is bit 0, RTS is bit 1.
            hw.uart_set_line_state(setup.w_value);
        }
        _ => {}
    }
}

/// GET_DESCRIPTOR responses for the ACM function.
pub(crate) fn descriptor_setup<U: UsbController>(
    hw: &U,
    tables: &CdcAcmTables,
    setup: SetupPacket,
) {
    let dxn = tables.desc.respond(&tables.dx, SUFFIX, setup);
    transmit_response(hw, &tables.dx, dxn, setup.w_length);
}
