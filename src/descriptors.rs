// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Platform-independent USB 2.0 protocol structures.
//!
//! The SETUP packet codec here runs in interrupt context and must stay
//! branch-light and inline-friendly: a packet round-trips losslessly
//! through a single `u64` with byte 0 at the least significant position.

use core::cell::Cell;

use vcell::VolatileCell;

/// Size (bytes) of a USB standard setup packet on the wire.
pub const SETUP_PACKET_SIZE: usize = 8;

/// Length of a device descriptor.
pub const LENGTH_DEVICE: usize = 18;

/// Length of a device qualifier descriptor.
pub const LENGTH_QUALIFIER: usize = 10;

/// Length of an interface descriptor, and of the HID class subheader
/// embedded after each HID interface in a configuration.
pub const LENGTH_INTERFACE: usize = 9;

// Standard request codes (USB 2.0 table 9-4).
pub const REQUEST_GET_STATUS: u8 = 0x00;
pub const REQUEST_CLEAR_FEATURE: u8 = 0x01;
pub const REQUEST_SET_FEATURE: u8 = 0x03;
pub const REQUEST_SET_ADDRESS: u8 = 0x05;
pub const REQUEST_GET_DESCRIPTOR: u8 = 0x06;
pub const REQUEST_GET_CONFIGURATION: u8 = 0x08;
pub const REQUEST_SET_CONFIGURATION: u8 = 0x09;

/// The data structure sent in a SETUP handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    pub bm_request_type: u8,
    pub b_request: u8,
    pub w_value: u16,
    pub w_index: u16,
    pub w_length: u16,
}

impl SetupPacket {
    /// Decode a setup packet located at a raw memory address, e.g. an
    /// endpoint buffer the bus engine wrote into, using volatile byte
    /// loads.
    ///
    /// # Safety
    ///
    /// `addr` must point at [`SETUP_PACKET_SIZE`] readable bytes.
    pub unsafe fn read(addr: *const u8) -> SetupPacket {
        let mut value: u64 = 0;
        for i in 0..SETUP_PACKET_SIZE {
            value |= (core::ptr::read_volatile(addr.add(i)) as u64) << (i << 3);
        }
        SetupPacket::from_u64(value)
    }

    /// Decode a setup packet from a byte buffer as received on the wire.
    /// A short buffer yields the zero packet.
    pub fn parse(buf: &[u8]) -> SetupPacket {
        if buf.len() < SETUP_PACKET_SIZE {
            return SetupPacket::default();
        }
        SetupPacket {
            bm_request_type: buf[0],
            b_request: buf[1],
            w_value: u16::from_le_bytes([buf[2], buf[3]]),
            w_index: u16::from_le_bytes([buf[4], buf[5]]),
            w_length: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }

    /// Unpack from the wire encoding, byte 0 in bits 0..8.
    #[inline]
    pub fn from_u64(value: u64) -> SetupPacket {
        SetupPacket {
            bm_request_type: value as u8,
            b_request: (value >> 8) as u8,
            w_value: (value >> 16) as u16,
            w_index: (value >> 32) as u16,
            w_length: (value >> 48) as u16,
        }
    }

    /// Pack into the wire encoding, byte 0 in bits 0..8.
    #[inline]
    pub fn pack(&self) -> u64 {
        (self.bm_request_type as u64)
            | (self.b_request as u64) << 8
            | (self.w_value as u64) << 16
            | (self.w_index as u64) << 32
            | (self.w_length as u64) << 48
    }

    /// Transfer direction, bit 7 of `bmRequestType`.
    #[inline]
    pub fn direction(&self) -> TransferDirection {
        if self.bm_request_type & 0x80 != 0 {
            TransferDirection::DeviceToHost
        } else {
            TransferDirection::HostToDevice
        }
    }

    /// Request type, bits 5..7 of `bmRequestType`.
    #[inline]
    pub fn request_type(&self) -> RequestType {
        match (self.bm_request_type >> 5) & 0b11 {
            0 => RequestType::Standard,
            1 => RequestType::Class,
            2 => RequestType::Vendor,
            _ => RequestType::Reserved,
        }
    }

    /// Request recipient, bits 0..5 of `bmRequestType`.
    #[inline]
    pub fn recipient(&self) -> Recipient {
        match self.bm_request_type & 0b1_1111 {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        }
    }

    /// High byte of `wValue`: the descriptor (or report) type of a
    /// GET_DESCRIPTOR-shaped request.
    #[inline]
    pub fn descriptor_type(&self) -> u8 {
        (self.w_value >> 8) as u8
    }

    /// Low byte of `wValue`: the descriptor index.
    #[inline]
    pub fn descriptor_index(&self) -> u8 {
        self.w_value as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestType {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorType {
    Device = 1,
    Configuration = 2,
    String = 3,
    Interface = 4,
    Endpoint = 5,
    DeviceQualifier = 6,
    OtherSpeedConfiguration = 7,
    Hid = 0x21,
    HidReport = 0x22,
}

impl DescriptorType {
    pub fn from_byte(byte: u8) -> Option<DescriptorType> {
        match byte {
            1 => Some(DescriptorType::Device),
            2 => Some(DescriptorType::Configuration),
            3 => Some(DescriptorType::String),
            4 => Some(DescriptorType::Interface),
            5 => Some(DescriptorType::Endpoint),
            6 => Some(DescriptorType::DeviceQualifier),
            7 => Some(DescriptorType::OtherSpeedConfiguration),
            0x21 => Some(DescriptorType::Hid),
            0x22 => Some(DescriptorType::HidReport),
            _ => None,
        }
    }
}

/// Strings the integrator wants reported to the host. The product string
/// is suffixed with the personality name by the class layer.
#[derive(Clone, Copy, Debug)]
pub struct DeviceStrings {
    pub manufacturer: &'static str,
    pub product: &'static str,
    pub serial_number: &'static str,
}

/// String descriptor indices the device exposes: 0 is the language list,
/// then manufacturer, product, serial number.
pub const STRING_DESCRIPTOR_COUNT: usize = 4;

/// Storage for one rewritable string descriptor.
pub const STRING_DESCRIPTOR_BUFLEN: usize = 64;

/// Language code reported in string descriptor 0.
pub const LANGUAGE_EN_US: u16 = 0x0409;

const LOCALE_COUNT: usize = 1;

/// One language's worth of string descriptors.
///
/// Index 0 holds the language-list descriptor and is seeded at
/// construction; the remaining indices are rewritten in place per request
/// from [`DeviceStrings`], so the blobs sent on the bus always reflect the
/// host-configured strings.
pub struct Locale {
    language: u16,
    descriptors: [[Cell<u8>; STRING_DESCRIPTOR_BUFLEN]; STRING_DESCRIPTOR_COUNT],
}

impl Locale {
    pub fn new(language: u16) -> Locale {
        let locale = Locale {
            language,
            descriptors: core::array::from_fn(|_| core::array::from_fn(|_| Cell::new(0))),
        };
        let languages = &locale.descriptors[0];
        languages[0].set(4);
        languages[1].set(DescriptorType::String as u8);
        languages[2].set(language as u8);
        languages[3].set((language >> 8) as u8);
        locale
    }

    pub fn language(&self) -> u16 {
        self.language
    }

    /// Rewrite descriptor `index` as a UTF-16LE string descriptor of
    /// `s` followed by `suffix`, and return its length byte.
    ///
    /// Each code point is emitted as its low byte followed by zero; the
    /// copy stops when the storage fills.
    fn write_string(&self, index: usize, s: &str, suffix: &str) -> usize {
        let buf = &self.descriptors[index];
        let count = s.chars().count() + suffix.chars().count();
        let length = (2 + 2 * count).min(buf.len());
        buf[0].set(length as u8);
        buf[1].set(DescriptorType::String as u8);
        let mut i = 2;
        for c in s.chars().chain(suffix.chars()) {
            if i + 1 >= buf.len() {
                break;
            }
            buf[i].set(c as u8);
            buf[i + 1].set(0);
            i += 2;
        }
        length
    }
}

/// The static descriptor tables of one class configuration, together with
/// its string descriptor storage.
pub struct DescriptorSet {
    /// Device descriptor, [`LENGTH_DEVICE`] bytes.
    pub device: &'static [u8],
    /// Full configuration descriptor blob.
    pub configuration: &'static [u8],
    /// Device qualifier descriptor, [`LENGTH_QUALIFIER`] bytes.
    pub qualifier: &'static [u8],
    pub strings: DeviceStrings,
    locales: [Locale; LOCALE_COUNT],
}

impl DescriptorSet {
    pub fn new(
        device: &'static [u8],
        configuration: &'static [u8],
        qualifier: &'static [u8],
        strings: DeviceStrings,
    ) -> DescriptorSet {
        DescriptorSet {
            device,
            configuration,
            qualifier,
            strings,
            locales: [Locale::new(LANGUAGE_EN_US)],
        }
    }

    /// Fill `dx` with the response to a GET_DESCRIPTOR request for the
    /// descriptor types every class serves, returning the response length.
    /// Returns zero for class-specific and unknown types.
    pub(crate) fn respond(
        &self,
        dx: &[VolatileCell<u8>],
        product_suffix: &'static str,
        setup: SetupPacket,
    ) -> usize {
        match DescriptorType::from_byte(setup.descriptor_type()) {
            Some(DescriptorType::Device) => copy_bytes(dx, self.device),
            Some(DescriptorType::Configuration) => copy_bytes(dx, self.configuration),
            Some(DescriptorType::String) => {
                match self.string_descriptor(product_suffix, setup) {
                    Some((descriptor, length)) => copy_cells(dx, descriptor, length),
                    None => 0,
                }
            }
            Some(DescriptorType::DeviceQualifier) => copy_bytes(dx, self.qualifier),
            // Other-speed responses are not generated yet; the host sees
            // an empty data stage.
            Some(DescriptorType::OtherSpeedConfiguration) => 0,
            _ => 0,
        }
    }

    /// Locate (and for nonzero indices, rewrite) the string descriptor a
    /// request refers to.
    ///
    /// An index-0 request asks which languages the device speaks; its
    /// `wIndex` is an arbitrary locale ordinal which is clamped to the
    /// table. Subsequent requests carry the language code we answered with
    /// in `wIndex`, so every string goes out in one language.
    fn string_descriptor(
        &self,
        product_suffix: &'static str,
        setup: SetupPacket,
    ) -> Option<(&[Cell<u8>], usize)> {
        if self.locales.is_empty() {
            return None;
        }
        let index = setup.descriptor_index() as usize;
        if index == 0 {
            let code = (setup.w_index as usize).min(self.locales.len() - 1);
            let descriptor = &self.locales[code].descriptors[0];
            return Some((descriptor.as_slice(), descriptor[0].get() as usize));
        }
        let locale = self
            .locales
            .iter()
            .find(|locale| locale.language == setup.w_index)?;
        if index >= STRING_DESCRIPTOR_COUNT {
            return None;
        }
        let (s, suffix) = match index {
            1 => (self.strings.manufacturer, ""),
            2 => (self.strings.product, product_suffix),
            _ => (self.strings.serial_number, ""),
        };
        let length = locale.write_string(index, s, suffix);
        Some((locale.descriptors[index].as_slice(), length))
    }
}

/// Copy a byte table into transmit scratch, clamped to the scratch size.
pub(crate) fn copy_bytes(dst: &[VolatileCell<u8>], src: &[u8]) -> usize {
    let n = src.len().min(dst.len());
    for (cell, byte) in dst.iter().zip(src.iter().take(n)) {
        cell.set(*byte);
    }
    n
}

/// Copy `len` bytes of rewritable descriptor storage into transmit
/// scratch.
pub(crate) fn copy_cells(dst: &[VolatileCell<u8>], src: &[Cell<u8>], len: usize) -> usize {
    let n = len.min(src.len()).min(dst.len());
    for i in 0..n {
        dst[i].set(src[i].get());
    }
    n
}
