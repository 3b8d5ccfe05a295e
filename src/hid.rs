// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Composite HID personality: keyboard, mouse, serial, joystick, and media
//! key interfaces behind one configuration.
//!
//! Control plane only: class requests on endpoint 0, the configuration
//! blob with a HID class subheader per interface, and the report
//! descriptor tables. Report queues live behind the configure hooks of
//! [`UsbController`](crate::hil::UsbController).

use core::cell::Cell;

use vcell::VolatileCell;

use crate::descriptors::{
    copy_bytes, DescriptorSet, DescriptorType, DeviceStrings, SetupPacket, TransferDirection,
    LENGTH_INTERFACE,
};
use crate::device::{transmit_response, Stage};
use crate::hil::UsbController;

/// Number of HID class configurations on this platform.
pub const CONFIG_COUNT: usize = 1;

// Interface numbers within the configuration.
pub const INTERFACE_KEYBOARD: u16 = 0;
pub const INTERFACE_MOUSE: u16 = 1;
pub const INTERFACE_SERIAL: u16 = 2;
pub const INTERFACE_JOYSTICK: u16 = 3;
pub const INTERFACE_MEDIA_KEY: u16 = 4;

/// Number of interfaces in the configuration.
pub const INTERFACE_COUNT: usize = 5;

// Class request codes (HID 1.11 section 7.2).
pub const REQUEST_GET_REPORT: u8 = 0x01;
pub const REQUEST_SET_REPORT: u8 = 0x09;
pub const REQUEST_SET_IDLE: u8 = 0x0A;

/// Size of the SET_REPORT receive scratch; longer reports are stalled.
pub const REPORT_SCRATCH_SIZE: usize = 64;

/// First four payload bytes of a SET_REPORT on the serial interface, with
/// descriptor type String, that switch on start-of-frame notifications.
pub const SOF_ACTIVATION_KEY: u32 = 0x68C2_45A9;

const DESCRIPTOR_BUFLEN: usize = 256;

const SUFFIX: &str = " HID";

/// Boot keyboard report descriptor (HID 1.11 appendix B.1).
pub const REPORT_KEYBOARD: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x75, 0x01, // Report Size (1)
    0x95, 0x08, // Report Count (8)
    0x05, 0x07, // Usage Page (Key Codes)
    0x19, 0xE0, // Usage Minimum (224)
    0x29, 0xE7, // Usage Maximum (231)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x81, 0x02, // Input (Data, Variable, Absolute), modifier byte
    0x95, 0x01, // Report Count (1)
    0x75, 0x08, // Report Size (8)
    0x81, 0x03, // Input (Constant), reserved byte
    0x95, 0x05, // Report Count (5)
    0x75, 0x01, // Report Size (1)
    0x05, 0x08, // Usage Page (LEDs)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x05, // Usage Maximum (5)
    0x91, 0x02, // Output (Data, Variable, Absolute), LED report
    0x95, 0x01, // Report Count (1)
    0x75, 0x03, // Report Size (3)
    0x91, 0x03, // Output (Constant), LED report padding
    0x95, 0x06, // Report Count (6)
    0x75, 0x08, // Report Size (8)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x68, // Logical Maximum (104)
    0x05, 0x07, // Usage Page (Key Codes)
    0x19, 0x00, // Usage Minimum (0)
    0x29, 0x68, // Usage Maximum (104)
    0x81, 0x00, // Input (Data, Array)
    0xC0, // End Collection
];

/// Boot mouse report descriptor: three buttons plus X/Y/wheel.
pub const REPORT_MOUSE: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, // Usage (Pointer)
    0xA1, 0x00, // Collection (Physical)
    0x05, 0x09, // Usage Page (Buttons)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x03, // Usage Maximum (3)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x95, 0x03, // Report Count (3)
    0x75, 0x01, // Report Size (1)
    0x81, 0x02, // Input (Data, Variable, Absolute)
    0x95, 0x01, // Report Count (1)
    0x75, 0x05, // Report Size (5)
    0x81, 0x03, // Input (Constant), padding
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x30, // Usage (X)
    0x09, 0x31, // Usage (Y)
    0x09, 0x38, // Usage (Wheel)
    0x15, 0x81, // Logical Minimum (-127)
    0x25, 0x7F, // Logical Maximum (127)
    0x75, 0x08, // Report Size (8)
    0x95, 0x03, // Report Count (3)
    0x81, 0x06, // Input (Data, Variable, Relative)
    0xC0, // End Collection
    0xC0, // End Collection
];

/// Vendor-defined raw report descriptor for the serial interface: 64-byte
/// reports in each direction.
pub const REPORT_SERIAL: &[u8] = &[
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined)
    0x09, 0x01, // Usage (Vendor 1)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, // Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, // Report Size (8)
    0x95, 0x40, // Report Count (64)
    0x09, 0x02, // Usage (Vendor 2)
    0x81, 0x02, // Input (Data, Variable, Absolute)
    0x95, 0x40, // Report Count (64)
    0x09, 0x03, // Usage (Vendor 3)
    0x91, 0x02, // Output (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Joystick report descriptor: eight buttons plus X/Y.
pub const REPORT_JOYSTICK: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    0xA1, 0x00, // Collection (Physical)
    0x05, 0x09, // Usage Page (Buttons)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x08, // Usage Maximum (8)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x75, 0x01, // Report Size (1)
    0x95, 0x08, // Report Count (8)
    0x81, 0x02, // Input (Data, Variable, Absolute)
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x30, // Usage (X)
    0x09, 0x31, // Usage (Y)
    0x15, 0x81, // Logical Minimum (-127)
    0x25, 0x7F, // Logical Maximum (127)
    0x75, 0x08, // Report Size (8)
    0x95, 0x02, // Report Count (2)
    0x81, 0x02, // Input (Data, Variable, Absolute)
    0xC0, // End Collection
    0xC0, // End Collection
];

/// Consumer control (media key) report descriptor.
pub const REPORT_MEDIA_KEY: &[u8] = &[
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, // Logical Minimum (0)
    0x26, 0xFF, 0x03, // Logical Maximum (0x03FF)
    0x19, 0x00, // Usage Minimum (0)
    0x2A, 0xFF, 0x03, // Usage Maximum (0x03FF)
    0x75, 0x10, // Report Size (16)
    0x95, 0x01, // Report Count (1)
    0x81, 0x00, // Input (Data, Array, Absolute)
    0xC0, // End Collection
];

/// Default device descriptor for the composite HID function.
pub const DEVICE_DESCRIPTOR: &[u8] = &[
    0x12, // bLength
    0x01, // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.00)
    0x00, // bDeviceClass (per interface)
    0x00, // bDeviceSubClass
    0x00, // bDeviceProtocol
    0x40, // bMaxPacketSize0 (64)
    0x67, 0x66, // idVendor (0x6667)
    0xCE, 0xAB, // idProduct (0xABCE)
    0x01, 0x00, // bcdDevice (0.01)
    0x01, // iManufacturer
    0x02, // iProduct
    0x03, // iSerialNumber
    0x01, // bNumConfigurations
];

// Offsets of each interface's HID class subheader within the
// configuration blob. The responder serves [`LENGTH_INTERFACE`] bytes from
// these positions for GET_DESCRIPTOR(HID).
pub const CONFIG_KEYBOARD_POS: usize = 18;
pub const CONFIG_MOUSE_POS: usize = 43;
pub const CONFIG_SERIAL_POS: usize = 68;
pub const CONFIG_JOYSTICK_POS: usize = 100;
pub const CONFIG_MEDIA_KEY_POS: usize = 125;

/// Default configuration descriptor blob: five HID interfaces, each of
///   Interface(9) + HID(9) + Interrupt IN EP(7),
/// with an extra Interrupt OUT endpoint on the serial interface.
pub const CONFIGURATION_DESCRIPTOR: &[u8] = &[
    // Configuration descriptor
    0x09, // bLength
    0x02, // bDescriptorType (Configuration)
    0x8D, 0x00, // wTotalLength (141)
    0x05, // bNumInterfaces
    0x01, // bConfigurationValue
    0x00, // iConfiguration
    0xC0, // bmAttributes (self powered)
    0x32, // bMaxPower (100 mA)
    // Keyboard interface (boot protocol)
    0x09, 0x04, 0x00, 0x00, 0x01, 0x03, 0x01, 0x01, 0x00,
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, // HID 1.11, one report descriptor
    REPORT_KEYBOARD.len() as u8,
    (REPORT_KEYBOARD.len() >> 8) as u8,
    0x07, 0x05, 0x81, 0x03, 0x08, 0x00, 0x0A, // Interrupt IN, 8 bytes, 10 ms
    // Mouse interface (boot protocol)
    0x09, 0x04, 0x01, 0x00, 0x01, 0x03, 0x01, 0x02, 0x00,
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22,
    REPORT_MOUSE.len() as u8,
    (REPORT_MOUSE.len() >> 8) as u8,
    0x07, 0x05, 0x82, 0x03, 0x08, 0x00, 0x0A, // Interrupt IN, 8 bytes, 10 ms
    // Serial interface (raw reports, both directions)
    0x09, 0x04, 0x02, 0x00, 0x02, 0x03, 0x00, 0x00, 0x00,
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22,
    REPORT_SERIAL.len() as u8,
    (REPORT_SERIAL.len() >> 8) as u8,
    0x07, 0x05, 0x83, 0x03, 0x40, 0x00, 0x01, // Interrupt IN, 64 bytes, 1 ms
    0x07, 0x05, 0x03, 0x03, 0x40, 0x00, 0x01, // Interrupt OUT, 64 bytes, 1 ms
    // Joystick interface
    0x09, 0x04, 0x03, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00,
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22,
    REPORT_JOYSTICK.len() as u8,
    (REPORT_JOYSTICK.len() >> 8) as u8,
    0x07, 0x05, 0x84, 0x03, 0x10, 0x00, 0x02, // Interrupt IN, 16 bytes, 2 ms
    // Media key interface
    0x09, 0x04, 0x04, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00,
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22,
    REPORT_MEDIA_KEY.len() as u8,
    (REPORT_MEDIA_KEY.len() >> 8) as u8,
    0x07, 0x05, 0x85, 0x03, 0x08, 0x00, 0x0A, // Interrupt IN, 8 bytes, 10 ms
];

/// Default device qualifier descriptor.
pub const QUALIFIER_DESCRIPTOR: &[u8] = &[
    0x0A, // bLength
    0x06, // bDescriptorType (Device Qualifier)
    0x00, 0x02, // bcdUSB (2.00)
    0x00, // bDeviceClass
    0x00, // bDeviceSubClass
    0x00, // bDeviceProtocol
    0x40, // bMaxPacketSize0
    0x01, // bNumConfigurations
    0x00, // bReserved
];

/// Keyboard state fed by the control plane.
pub struct KeyboardState {
    led: Cell<u8>,
}

impl KeyboardState {
    /// The LED bitmap last written by the host.
    pub fn led(&self) -> u8 {
        self.led.get()
    }
}

/// Descriptor tables and control scratch of one HID configuration.
pub struct HidTables {
    pub desc: DescriptorSet,
    pub keyboard: KeyboardState,
    /// Descriptor response scratch, DMA-visible.
    dx: [VolatileCell<u8>; DESCRIPTOR_BUFLEN],
    /// SET_REPORT receive scratch.
    cx: [VolatileCell<u8>; REPORT_SCRATCH_SIZE],
}

impl HidTables {
    pub fn new(strings: DeviceStrings) -> HidTables {
        HidTables {
            desc: DescriptorSet::new(
                DEVICE_DESCRIPTOR,
                CONFIGURATION_DESCRIPTOR,
                QUALIFIER_DESCRIPTOR,
                strings,
            ),
            keyboard: KeyboardState { led: Cell::new(0) },
            dx: core::array::from_fn(|_| VolatileCell::new(0)),
            cx: core::array::from_fn(|_| VolatileCell::new(0)),
        }
    }
}

/// HID class subheader offset for an interface, if it has one.
fn config_position(interface: u16) -> Option<usize> {
    match interface {
        INTERFACE_KEYBOARD => Some(CONFIG_KEYBOARD_POS),
        INTERFACE_MOUSE => Some(CONFIG_MOUSE_POS),
        INTERFACE_SERIAL => Some(CONFIG_SERIAL_POS),
        INTERFACE_JOYSTICK => Some(CONFIG_JOYSTICK_POS),
        INTERFACE_MEDIA_KEY => Some(CONFIG_MEDIA_KEY_POS),
        _ => None,
    }
}

/// Report descriptor table for an interface, if it has one.
fn report_descriptor(interface: u16) -> Option<&'static [u8]> {
    match interface {
        INTERFACE_KEYBOARD => Some(REPORT_KEYBOARD),
        INTERFACE_MOUSE => Some(REPORT_MOUSE),
        INTERFACE_SERIAL => Some(REPORT_SERIAL),
        INTERFACE_JOYSTICK => Some(REPORT_JOYSTICK),
        INTERFACE_MEDIA_KEY => Some(REPORT_MEDIA_KEY),
        _ => None,
    }
}

/// SET_CONFIGURATION fan-out for this personality.
pub(crate) fn configure<U: UsbController>(hw: &U) {
    hw.serial_configure();
    hw.keyboard_configure();
    hw.mouse_configure();
    hw.joystick_configure();
}

/// Class requests on the HID interfaces.
pub(crate) fn class_setup<U: UsbController>(
    hw: &U,
    tables: &HidTables,
    setup: SetupPacket,
) -> Stage {
    match (setup.direction(), setup.b_request) {
        (TransferDirection::HostToDevice, REQUEST_SET_REPORT) => {
            if setup.w_length as usize <= REPORT_SCRATCH_SIZE {
                // Seed a marker byte so a zero-filled report is
                // distinguishable from a transfer that never ran.
                tables.cx[0].set(0xE9);
                hw.control_receive(&tables.cx, setup.w_length as usize, true);
                Stage::DataOut
            } else {
                Stage::Stall
            }
        }
        (TransferDirection::HostToDevice, REQUEST_SET_IDLE) => {
            // The requested idle rate (wValue >> 8) is acknowledged and
            // ignored.
            hw.control_receive(&[], 0, false);
            Stage::StatusOut
        }
        (TransferDirection::DeviceToHost, REQUEST_GET_REPORT) => {
            let status = hw.control_status_buffer(&[0, 0]);
            hw.control_transmit(status, 2, false);
            Stage::DataIn
        }
        _ => Stage::Stall,
    }
}

/// Completion work once a class OUT data stage has finished.
pub(crate) fn control_complete<U: UsbController>(hw: &U, tables: &HidTables, setup: SetupPacket) {
    if setup.b_request != REQUEST_SET_REPORT {
        return;
    }
    match setup.w_index {
        INTERFACE_KEYBOARD => {
            if setup.descriptor_type() == DescriptorType::Configuration as u8
                && setup.w_length == 1
            {
                tables.keyboard.led.set(tables.cx[0].get());
                hw.control_transmit(&[], 0, false);
            }
        }
        INTERFACE_SERIAL => {
            if setup.descriptor_type() == DescriptorType::String as u8 && setup.w_length >= 4 {
                let key = u32::from_le_bytes([
                    tables.cx[0].get(),
                    tables.cx[1].get(),
                    tables.cx[2].get(),
                    tables.cx[3].get(),
                ]);
                if key == SOF_ACTIVATION_KEY {
                    hw.enable_sof(true, INTERFACE_COUNT);
                }
            }
        }
        _ => {}
    }
}

/// GET_DESCRIPTOR responses for the HID function, including the
/// class-specific HID and report descriptor types.
pub(crate) fn descriptor_setup<U: UsbController>(hw: &U, tables: &HidTables, setup: SetupPacket) {
    let dxn = match DescriptorType::from_byte(setup.descriptor_type()) {
        Some(DescriptorType::Hid) => config_position(setup.w_index).map_or(0, |pos| {
            tables
                .desc
                .configuration
                .get(pos..pos + LENGTH_INTERFACE)
                .map_or(0, |subheader| copy_bytes(&tables.dx, subheader))
        }),
        Some(DescriptorType::HidReport) => report_descriptor(setup.w_index)
            .map_or(0, |report| copy_bytes(&tables.dx, report)),
        _ => tables.desc.respond(&tables.dx, SUFFIX, setup),
    };
    transmit_response(hw, &tables.dx, dxn, setup.w_length);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{LENGTH_DEVICE, LENGTH_QUALIFIER};
    use crate::hil::testing::FakeController;

    const STRINGS: DeviceStrings = DeviceStrings {
        manufacturer: "XYZ Corp.",
        product: "The Zorpinator",
        serial_number: "Serial No. 5",
    };

    #[test]
    fn table_lengths_are_consistent() {
        assert_eq!(DEVICE_DESCRIPTOR.len(), LENGTH_DEVICE);
        assert_eq!(QUALIFIER_DESCRIPTOR.len(), LENGTH_QUALIFIER);
        let total =
            u16::from_le_bytes([CONFIGURATION_DESCRIPTOR[2], CONFIGURATION_DESCRIPTOR[3]]);
        assert_eq!(total as usize, CONFIGURATION_DESCRIPTOR.len());
        assert!(CONFIGURATION_DESCRIPTOR.len() <= DESCRIPTOR_BUFLEN);
    }

    #[test]
    fn subheader_positions_land_on_hid_descriptors() {
        let interfaces = [
            (INTERFACE_KEYBOARD, REPORT_KEYBOARD),
            (INTERFACE_MOUSE, REPORT_MOUSE),
            (INTERFACE_SERIAL, REPORT_SERIAL),
            (INTERFACE_JOYSTICK, REPORT_JOYSTICK),
            (INTERFACE_MEDIA_KEY, REPORT_MEDIA_KEY),
        ];
        for (interface, report) in interfaces {
            let pos = config_position(interface).unwrap();
            let subheader = &CONFIGURATION_DESCRIPTOR[pos..pos + LENGTH_INTERFACE];
            assert_eq!(subheader[0] as usize, LENGTH_INTERFACE, "{}", interface);
            assert_eq!(subheader[1], DescriptorType::Hid as u8, "{}", interface);
            let report_len = u16::from_le_bytes([subheader[7], subheader[8]]);
            assert_eq!(report_len as usize, report.len(), "{}", interface);
        }
        assert_eq!(config_position(5), None);
    }

    #[test]
    fn hid_descriptor_request_serves_the_subheader() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        // GET_DESCRIPTOR(HID) on the serial interface.
        let setup = SetupPacket::parse(&[0x81, 0x06, 0x00, 0x21, 0x02, 0x00, 0xFF, 0x00]);
        descriptor_setup(&hw, &tables, setup);
        assert_eq!(hw.last_transmit_len.get(), LENGTH_INTERFACE);
        let expected = &CONFIGURATION_DESCRIPTOR[CONFIG_SERIAL_POS..CONFIG_SERIAL_POS + 9];
        assert!(hw.transmitted(9).eq(expected.iter().copied()));
    }

    #[test]
    fn report_descriptor_request_serves_the_table() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        // GET_DESCRIPTOR(Report) on the mouse interface.
        let setup = SetupPacket::parse(&[0x81, 0x06, 0x00, 0x22, 0x01, 0x00, 0xFF, 0x00]);
        descriptor_setup(&hw, &tables, setup);
        assert_eq!(hw.last_transmit_len.get(), REPORT_MOUSE.len());
        assert!(hw.transmitted(REPORT_MOUSE.len()).eq(REPORT_MOUSE.iter().copied()));
    }

    #[test]
    fn unknown_interface_produces_no_data() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        let setup = SetupPacket::parse(&[0x81, 0x06, 0x00, 0x22, 0x07, 0x00, 0xFF, 0x00]);
        descriptor_setup(&hw, &tables, setup);
        assert_eq!(hw.transmits.get(), 0);
    }

    #[test]
    fn set_report_seeds_the_scratch_marker() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        let setup = SetupPacket::parse(&[0x21, 0x09, 0x00, 0x02, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(class_setup(&hw, &tables, setup), Stage::DataOut);
        assert_eq!(tables.cx[0].get(), 0xE9);
        assert_eq!(hw.last_receive_len.get(), 1);
        assert!(hw.last_receive_notify.get());
    }

    #[test]
    fn led_persist_requires_single_byte_report() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        // Two-byte report on the keyboard interface: ignored.
        let setup = SetupPacket::parse(&[0x21, 0x09, 0x00, 0x02, 0x00, 0x00, 0x02, 0x00]);
        control_complete(&hw, &tables, setup);
        assert_eq!(tables.keyboard.led(), 0);
        assert_eq!(hw.transmits.get(), 0);
    }

    #[test]
    fn sof_activation_requires_four_bytes() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        tables.cx[0].set(0xA9);
        tables.cx[1].set(0x45);
        tables.cx[2].set(0xC2);
        tables.cx[3].set(0x68);
        // wLength below 4: the key is not even inspected.
        let setup = SetupPacket::parse(&[0x21, 0x09, 0x00, 0x03, 0x02, 0x00, 0x03, 0x00]);
        control_complete(&hw, &tables, setup);
        assert_eq!(hw.sof.get(), None);

        let setup = SetupPacket::parse(&[0x21, 0x09, 0x00, 0x03, 0x02, 0x00, 0x04, 0x00]);
        control_complete(&hw, &tables, setup);
        assert_eq!(hw.sof.get(), Some((true, INTERFACE_COUNT)));
    }

    #[test]
    fn get_report_returns_two_zero_bytes() {
        let hw = FakeController::new();
        let tables = HidTables::new(STRINGS);
        let setup = SetupPacket::parse(&[0xA1, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x00]);
        assert_eq!(class_setup(&hw, &tables, setup), Stage::DataIn);
        assert_eq!(hw.last_transmit_len.get(), 2);
        assert!(hw.transmitted(2).eq([0, 0]));
    }
}
