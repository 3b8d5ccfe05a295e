// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Generic USB device controller driver.
//!
//! This layer owns the device state machine and the control endpoint 0
//! request dispatch for every target. The hardware layer translates the
//! interrupts it receives into the virtual codes of [`Event`] and delivers
//! them through [`Dcd::event`]; the driver responds by arming transfers and
//! stalls on the [`UsbController`] it was bound to.
//!
//! Controller instances live in a fixed [`DcdPool`] sized by the number of
//! configured class instances. A slot is reserved with
//! [`DcdPool::init_dcd`] and stays live for the life of the system.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use vcell::VolatileCell;

use crate::descriptors::{
    Recipient, RequestType, SetupPacket, TransferDirection, REQUEST_CLEAR_FEATURE,
    REQUEST_GET_CONFIGURATION, REQUEST_GET_DESCRIPTOR, REQUEST_GET_STATUS, REQUEST_SET_ADDRESS,
    REQUEST_SET_CONFIGURATION, REQUEST_SET_FEATURE,
};
use crate::hil::{DeviceSpeed, UsbController};
use crate::usb_debug;
use crate::{cdc, hid, ErrorCode};

/// Number of controller instances in the pool: one per configured class
/// instance.
pub const DCD_COUNT: usize = cdc::CONFIG_COUNT + hid::CONFIG_COUNT;

/// Device lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceState {
    /// Initial state, before end of reset.
    NotReady = 0,
    /// After end of reset, before SET_ADDRESS.
    Default = 1,
    /// After SET_ADDRESS, before SET_CONFIGURATION.
    Addressed = 2,
    /// After SET_CONFIGURATION, operational state.
    Configured = 3,
    /// While operational, after suspend.
    Suspended = 4,
}

impl DeviceState {
    fn from_u8(value: u8) -> DeviceState {
        match value {
            1 => DeviceState::Default,
            2 => DeviceState::Addressed,
            3 => DeviceState::Configured,
            4 => DeviceState::Suspended,
            _ => DeviceState::NotReady,
        }
    }
}

/// Stages of a control transfer on endpoint 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// No stage transition required.
    Setup,
    /// IN data transfer in flight.
    DataIn,
    /// OUT data transfer in flight.
    DataOut,
    /// IN status acknowledgement armed.
    StatusIn,
    /// OUT status acknowledgement armed.
    StatusOut,
    /// Unhandled or invalid request.
    Stall,
}

/// Virtual interrupts on the USB bus.
///
/// Targets do not share one set of real USB interrupts, so the hardware
/// layer maps whatever its core raises onto these codes and feeds them to
/// [`Dcd::event`]. Only a SETUP arrival carries a payload; a transfer
/// completion carries the target's endpoint completion mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Invalid interrupt.
    Invalid,
    /// USB RESET received.
    StatusReset,
    /// USB RESUME condition.
    StatusResume,
    /// USB SUSPEND received.
    StatusSuspend,
    /// USB error condition detected on the bus.
    StatusError,
    /// USB PHY powered and ready.
    DeviceReady,
    /// Device SET_ADDRESS complete.
    DeviceAddress,
    /// Device SET_CONFIGURATION complete.
    DeviceConfiguration,
    /// SETUP packet received on endpoint 0.
    ControlSetup(SetupPacket),
    /// Control request complete.
    ControlComplete,
    /// Data transfer complete on the endpoints in the mask.
    TransferComplete(u32),
    /// System timer tick.
    Timer,
}

/// The class personality a controller is bound to, with its 1-based
/// configuration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassBinding {
    CdcAcm { config: usize },
    Hid { config: usize },
}

impl ClassBinding {
    pub fn config(&self) -> usize {
        match *self {
            ClassBinding::CdcAcm { config } | ClassBinding::Hid { config } => config,
        }
    }

    pub fn is_hid(&self) -> bool {
        matches!(self, ClassBinding::Hid { .. })
    }

    fn with_config(self, config: usize) -> ClassBinding {
        match self {
            ClassBinding::CdcAcm { .. } => ClassBinding::CdcAcm { config },
            ClassBinding::Hid { .. } => ClassBinding::Hid { config },
        }
    }
}

/// Per-class descriptor tables and scratch, supplied by the integrator.
/// Each entry is owned exclusively by the controller bound to it.
#[derive(Clone, Copy)]
pub struct ClassTables<'a> {
    pub cdc_acm: &'a [cdc::CdcAcmTables],
    pub hid: &'a [hid::HidTables],
}

/// One USB device controller.
///
/// All state is interior-mutable: events arrive through `&self` from the
/// target's interrupt or deferred-work context, which must serialise them
/// per controller. The state byte alone may be observed from elsewhere and
/// is therefore an atomic read with relaxed ordering.
pub struct Dcd<'a, U: UsbController> {
    hw: Cell<Option<&'a U>>,
    tables: &'a ClassTables<'a>,

    /// Parent core this instance is attached to; `None` marks a free pool
    /// slot.
    core: Cell<Option<usize>>,
    port: Cell<usize>,
    index: usize,
    speed: Cell<DeviceSpeed>,
    class: Cell<ClassBinding>,

    state: AtomicU8,

    /// The SETUP packet of the open control transfer. Written when the
    /// transfer opens, cleared once its completion has been processed;
    /// nonzero exactly while a transfer is active.
    setup: Cell<SetupPacket>,
    stage: Cell<Stage>,
}

impl<'a, U: UsbController> Dcd<'a, U> {
    fn new(tables: &'a ClassTables<'a>, index: usize) -> Dcd<'a, U> {
        Dcd {
            hw: Cell::new(None),
            tables,
            core: Cell::new(None),
            port: Cell::new(0),
            index,
            speed: Cell::new(DeviceSpeed::Full),
            class: Cell::new(ClassBinding::CdcAcm { config: 1 }),
            state: AtomicU8::new(DeviceState::NotReady as u8),
            setup: Cell::new(SetupPacket::default()),
            stage: Cell::new(Stage::Setup),
        }
    }

    pub fn class(&self) -> ClassBinding {
        self.class.get()
    }

    pub fn port(&self) -> usize {
        self.port.get()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn speed(&self) -> DeviceSpeed {
        self.speed.get()
    }

    /// Current device state. Single-instruction load; safe to call from a
    /// debug observer on another core.
    pub fn state(&self) -> DeviceState {
        DeviceState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Apply a state transition, returning whether the write occurred.
    /// Reset to [`DeviceState::NotReady`] is legal from every state; an
    /// illegal transition leaves the state unchanged.
    pub fn set_state(&self, next: DeviceState) -> bool {
        let current = self.state();
        let ok = match next {
            DeviceState::NotReady => true,
            DeviceState::Default => {
                matches!(current, DeviceState::NotReady | DeviceState::Default)
            }
            DeviceState::Addressed => current == DeviceState::Default,
            DeviceState::Configured | DeviceState::Suspended => matches!(
                current,
                DeviceState::Addressed | DeviceState::Configured | DeviceState::Suspended
            ),
        };
        if ok {
            self.state.store(next as u8, Ordering::Relaxed);
        }
        ok
    }

    /// Stage of the open control transfer, for targets that route data and
    /// status completions by it.
    pub fn control_stage(&self) -> Stage {
        self.stage.get()
    }

    /// The SETUP packet of the open control transfer, if one is active.
    pub fn active_setup(&self) -> Option<SetupPacket> {
        let setup = self.setup.get();
        (setup != SetupPacket::default()).then_some(setup)
    }

    /// Deliver a virtual interrupt to this controller.
    pub fn event(&self, event: Event) {
        let Some(hw) = self.hw.get() else {
            return;
        };

        match event {
            Event::StatusReset => {
                usb_debug!("usb: bus reset");
                self.set_state(DeviceState::NotReady);
            }

            // Resume always lands in Configured, even if the device
            // suspended from Addressed; the pre-suspend state is not
            // tracked.
            Event::StatusResume => {
                self.set_state(DeviceState::Configured);
            }

            Event::StatusSuspend => {
                self.set_state(DeviceState::Suspended);
            }

            Event::DeviceReady => {
                if self.set_state(DeviceState::Default) {
                    // Configure and enable control endpoint 0.
                    hw.endpoint_enable(0, TransferDirection::DeviceToHost, 0);
                }
            }

            // The target driver must raise this itself: chips differ on
            // when during enumeration the address register may actually be
            // written.
            Event::DeviceAddress => {
                self.set_state(DeviceState::Addressed);
            }

            Event::DeviceConfiguration => {
                self.set_state(DeviceState::Configured);
            }

            Event::ControlSetup(setup) => {
                // The packet stays stored, unmodified, across all
                // transactions of the transfer; it is cleared only once
                // the completion event has been processed.
                self.setup.set(setup);
                let stage = self.control_setup(hw, setup);
                self.stage.set(stage);
                match stage {
                    // Data and status transfers were armed by the handler
                    // and finish asynchronously.
                    Stage::DataIn | Stage::DataOut | Stage::StatusIn | Stage::StatusOut => {}
                    Stage::Stall => {
                        usb_debug!("usb: stalling unhandled request");
                        hw.control_stall(true, setup.direction());
                    }
                    Stage::Setup => {}
                }
            }

            Event::ControlComplete => {
                self.control_complete(hw);
                self.setup.set(SetupPacket::default());
            }

            // Reserved hooks.
            Event::TransferComplete(_) => {}
            Event::Invalid | Event::StatusError | Event::Timer => {}
        }
    }

    /// SETUP phase of the control dispatcher. Every accepted request arms
    /// exactly one transmit or receive before returning its stage; any
    /// request that matches nothing stalls.
    fn control_setup(&self, hw: &'a U, setup: SetupPacket) -> Stage {
        match setup.request_type() {
            RequestType::Standard => self.standard_setup(hw, setup),
            RequestType::Class => self.class_setup(hw, setup),
            RequestType::Vendor | RequestType::Reserved => Stage::Stall,
        }
    }

    fn standard_setup(&self, hw: &'a U, setup: SetupPacket) -> Stage {
        use TransferDirection::{DeviceToHost, HostToDevice};

        match (setup.recipient(), setup.direction(), setup.b_request) {
            (Recipient::Device, HostToDevice, REQUEST_SET_ADDRESS) => {
                hw.set_device_address(setup.w_value);
                hw.control_receive(&[], 0, false);
                Stage::StatusOut
            }

            (Recipient::Device, HostToDevice, REQUEST_SET_CONFIGURATION) => {
                let mut config = setup.w_value as usize;
                if config == 0 || config > DCD_COUNT {
                    // Use the default if an invalid index was received.
                    config = 1;
                }
                self.class.set(self.class.get().with_config(config));
                self.event(Event::DeviceConfiguration);
                match self.class.get() {
                    ClassBinding::CdcAcm { .. } => cdc::configure(hw),
                    ClassBinding::Hid { .. } => hid::configure(hw),
                }
                hw.control_receive(&[], 0, false);
                Stage::StatusOut
            }

            (Recipient::Device, DeviceToHost, REQUEST_GET_STATUS) => {
                let status = hw.control_status_buffer(&[0, 0]);
                hw.control_transmit(status, 2, false);
                Stage::DataIn
            }

            (Recipient::Device, DeviceToHost, REQUEST_GET_DESCRIPTOR)
            | (Recipient::Interface, DeviceToHost, REQUEST_GET_DESCRIPTOR) => {
                self.descriptor_setup(hw, setup)
            }

            (Recipient::Device, DeviceToHost, REQUEST_GET_CONFIGURATION) => {
                let status = hw.control_status_buffer(&[self.class.get().config() as u8]);
                hw.control_transmit(status, 1, false);
                Stage::DataIn
            }

            (Recipient::Interface, DeviceToHost, hid::REQUEST_GET_REPORT)
                if self.class.get().is_hid() =>
            {
                self.descriptor_setup(hw, setup)
            }

            (Recipient::Endpoint, HostToDevice, REQUEST_CLEAR_FEATURE) => {
                hw.endpoint_clear_feature((setup.w_index & 0xff) as usize);
                hw.control_receive(&[], 0, false);
                Stage::StatusOut
            }

            (Recipient::Endpoint, HostToDevice, REQUEST_SET_FEATURE) => {
                hw.endpoint_set_feature((setup.w_index & 0xff) as usize);
                hw.control_receive(&[], 0, false);
                Stage::StatusOut
            }

            (Recipient::Endpoint, DeviceToHost, REQUEST_GET_STATUS) => {
                let value = hw.endpoint_status((setup.w_index & 0xff) as usize);
                let status = hw.control_status_buffer(&value.to_le_bytes());
                hw.control_transmit(status, 2, false);
                Stage::DataIn
            }

            _ => Stage::Stall,
        }
    }

    fn class_setup(&self, hw: &'a U, setup: SetupPacket) -> Stage {
        if setup.recipient() != Recipient::Interface {
            return Stage::Stall;
        }
        match self.class.get() {
            ClassBinding::CdcAcm { config } => {
                match self.tables.cdc_acm.get(config.wrapping_sub(1)) {
                    Some(tables) => cdc::class_setup(hw, tables, setup),
                    None => Stage::Stall,
                }
            }
            ClassBinding::Hid { config } => match self.tables.hid.get(config.wrapping_sub(1)) {
                Some(tables) => hid::class_setup(hw, tables, setup),
                None => Stage::Stall,
            },
        }
    }

    fn descriptor_setup(&self, hw: &'a U, setup: SetupPacket) -> Stage {
        match self.class.get() {
            ClassBinding::CdcAcm { config } => {
                match self.tables.cdc_acm.get(config.wrapping_sub(1)) {
                    Some(tables) => {
                        cdc::descriptor_setup(hw, tables, setup);
                        Stage::DataIn
                    }
                    None => Stage::Stall,
                }
            }
            ClassBinding::Hid { config } => match self.tables.hid.get(config.wrapping_sub(1)) {
                Some(tables) => {
                    hid::descriptor_setup(hw, tables, setup);
                    Stage::DataIn
                }
                None => Stage::Stall,
            },
        }
    }

    /// COMPLETION phase of the control dispatcher, run once the data stage
    /// of the open transfer has finished. Only class OUT requests have
    /// completion work; everything else is ignored.
    fn control_complete(&self, hw: &'a U) {
        let setup = self.setup.get();
        if setup.request_type() != RequestType::Class
            || setup.recipient() != Recipient::Interface
            || setup.direction() != TransferDirection::HostToDevice
        {
            return;
        }
        match self.class.get() {
            ClassBinding::CdcAcm { config } => {
                if let Some(tables) = self.tables.cdc_acm.get(config.wrapping_sub(1)) {
                    cdc::control_complete(hw, tables, setup);
                }
            }
            ClassBinding::Hid { config } => {
                if let Some(tables) = self.tables.hid.get(config.wrapping_sub(1)) {
                    hid::control_complete(hw, tables, setup);
                }
            }
        }
    }
}

/// Clamp a descriptor response to the host's requested length and hand it
/// to the bus engine. A zero-length response transmits nothing.
pub(crate) fn transmit_response<U: UsbController>(
    hw: &U,
    dx: &[VolatileCell<u8>],
    dxn: usize,
    w_length: u16,
) {
    if dxn == 0 {
        return;
    }
    let dxn = dxn.min(w_length as usize);
    hw.flush_cache(dx, dxn);
    hw.control_transmit(dx, dxn, false);
}

/// Statically sized pool of device controller instances.
pub struct DcdPool<'a, U: UsbController> {
    tables: &'a ClassTables<'a>,
    dcds: [Dcd<'a, U>; DCD_COUNT],
}

impl<'a, U: UsbController> DcdPool<'a, U> {
    pub fn new(tables: &'a ClassTables<'a>) -> DcdPool<'a, U> {
        DcdPool {
            tables,
            dcds: core::array::from_fn(|i| Dcd::new(tables, i)),
        }
    }

    /// Initialise and assign a free device controller instance to the
    /// given USB port.
    ///
    /// Returns `INVAL` if the class binding violates its preconditions and
    /// `BUSY` once every slot is taken; exhaustion has no side effects.
    pub fn init_dcd(
        &'a self,
        hw: &'a U,
        port: usize,
        speed: DeviceSpeed,
        class: ClassBinding,
    ) -> Result<&'a Dcd<'a, U>, ErrorCode> {
        if DCD_COUNT == 0 {
            // Must have defined device controllers.
            return Err(ErrorCode::INVAL);
        }
        if let ClassBinding::CdcAcm { config } = class {
            // Must have defined descriptors.
            if config == 0 || config > self.tables.cdc_acm.len() {
                return Err(ErrorCode::INVAL);
            }
        }
        // Take the first instance not yet attached to a core.
        for dcd in self.dcds.iter() {
            if dcd.core.get().is_none() {
                dcd.hw.set(Some(hw));
                dcd.core.set(Some(port));
                dcd.port.set(port);
                dcd.speed.set(speed);
                dcd.class.set(class);
                dcd.set_state(DeviceState::NotReady);
                return Ok(dcd);
            }
        }
        // No free device controller instances remain.
        Err(ErrorCode::BUSY)
    }
}
