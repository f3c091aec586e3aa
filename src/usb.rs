use usb_device::class_prelude::*;
use usb_device::device::{UsbDevice, UsbDeviceState};
use usb_device::Result;
use usbd_serial::{CdcAcmClass, LineCoding};

use crate::config::PACKET_SIZE;
use crate::device::CdcDevice;

/// [`CdcDevice`] backed by a `usb-device` stack and a CDC-ACM class.
///
/// Example
/// =======
///
/// ```no_run
/// # use usb_device::class_prelude::*;
/// # fn dummy(usb_bus: &'static UsbBusAllocator<impl UsbBus + Send>) {
/// use usb_device::prelude::*;
/// use usbd_serial::USB_CLASS_CDC;
/// use usbd_serial_fifo::{Config, Port, UsbCdc};
///
/// let class = UsbCdc::class(usb_bus);
/// let device = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x16c0, 0x27dd))
///     .strings(&[StringDescriptors::new(LangID::EN).product("Serial port")])
///     .expect("Failed to set strings")
///     .device_class(USB_CLASS_CDC)
///     .build();
///
/// let port: Port<_> = Port::new(UsbCdc::new(device, class), Config::default());
/// # }
/// ```
pub struct UsbCdc<'a, B: UsbBus> {
    device: UsbDevice<'a, B>,
    class: CdcAcmClass<'a, B>,
    watch: ConfigWatch,
    changed: bool,
}

impl<'a, B: UsbBus> UsbCdc<'a, B> {
    /// `class` should be allocated with [`UsbCdc::class`] so that its packet size matches the
    /// TX queue capacity.
    pub fn new(device: UsbDevice<'a, B>, class: CdcAcmClass<'a, B>) -> Self {
        let watch = ConfigWatch::new(device.state());

        UsbCdc {
            device,
            class,
            watch,
            changed: false,
        }
    }

    /// Allocates the CDC-ACM class with the default packet size. The device itself must be built
    /// afterwards from the same allocator.
    pub fn class(alloc: &'a UsbBusAllocator<B>) -> CdcAcmClass<'a, B> {
        CdcAcmClass::new(alloc, PACKET_SIZE as u16)
    }

    /// Gets the current line coding.
    pub fn line_coding(&self) -> &LineCoding {
        self.class.line_coding()
    }

    /// Gets the DTR (data terminal ready) state
    pub fn dtr(&self) -> bool {
        self.class.dtr()
    }

    /// Gets the RTS (ready to send) state
    pub fn rts(&self) -> bool {
        self.class.rts()
    }

    pub fn state(&self) -> UsbDeviceState {
        self.device.state()
    }
}

impl<B: UsbBus> CdcDevice for UsbCdc<'_, B> {
    fn poll(&mut self) {
        self.device.poll(&mut [&mut self.class]);

        if self.watch.update(self.device.state()) {
            debug!("usb: configuration changed");
            self.changed = true;
        }
    }

    fn max_packet_size(&self) -> usize {
        self.class.max_packet_size() as usize
    }

    fn configured(&self) -> bool {
        self.device.state() == UsbDeviceState::Configured
    }

    fn configuration_changed(&mut self) -> bool {
        core::mem::replace(&mut self.changed, false)
    }

    fn tx_ready(&self) -> bool {
        self.configured()
    }

    fn tx_packet(&mut self, data: &[u8]) -> Result<()> {
        self.class.write_packet(data).map(|_| ())
    }

    fn rx_available(&self) -> bool {
        self.configured()
    }

    fn rx_burst_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.class.read_packet(buf)
    }
}

/// Edge detector for entering or leaving the configured state.
///
/// Suspend is transparent: usb-device restores the pre-suspend state on resume, so a suspend
/// round trip is not a configuration change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ConfigWatch {
    settled: UsbDeviceState,
}

impl ConfigWatch {
    fn new(state: UsbDeviceState) -> Self {
        let settled = match state {
            UsbDeviceState::Suspend => UsbDeviceState::Default,
            state => state,
        };
        ConfigWatch { settled }
    }

    // Returns true if the device went into or out of the configured state since the last update
    fn update(&mut self, state: UsbDeviceState) -> bool {
        if state == UsbDeviceState::Suspend {
            return false;
        }

        let was = self.settled == UsbDeviceState::Configured;
        self.settled = state;
        was != (state == UsbDeviceState::Configured)
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigWatch;
    use usb_device::device::UsbDeviceState::*;

    #[test]
    fn enumeration_is_a_change() {
        let mut watch = ConfigWatch::new(Default);

        assert!(!watch.update(Addressed));
        assert!(watch.update(Configured));
        assert!(!watch.update(Configured));
    }

    #[test]
    fn suspend_round_trip_is_not_a_change() {
        let mut watch = ConfigWatch::new(Configured);

        assert!(!watch.update(Suspend));
        assert!(!watch.update(Configured));
    }

    #[test]
    fn deconfigure_is_a_change() {
        let mut watch = ConfigWatch::new(Configured);

        assert!(watch.update(Addressed));
        assert!(!watch.update(Addressed));
        assert!(watch.update(Configured));
    }

    #[test]
    fn bus_reset_while_suspended_is_a_change() {
        let mut watch = ConfigWatch::new(Configured);

        assert!(!watch.update(Suspend));
        assert!(watch.update(Default));
    }

    #[test]
    fn starting_suspended_counts_as_unconfigured() {
        let mut watch = ConfigWatch::new(Suspend);

        assert!(watch.update(Configured));
    }
}
