use usb_device::Result;

use crate::config::PACKET_SIZE;

/// The primitives the FIFO engine needs from a CDC device stack.
///
/// Enumeration, packetization and control requests all stay inside the implementation; the
/// queues only ever ask whether a packet can go out, hand one over, and pull whatever inbound
/// bytes have arrived.
pub trait CdcDevice {
    /// Services the underlying USB stack. Called at the start of every periodic tick and while
    /// waiting for configuration.
    fn poll(&mut self) {}

    /// Maximum size of one bulk IN packet. A data packet of exactly this size is followed by a
    /// zero-length packet.
    fn max_packet_size(&self) -> usize {
        PACKET_SIZE
    }

    /// True once enumeration and configuration have completed.
    fn configured(&self) -> bool;

    /// True once per reconfiguration event. Reading the flag clears it.
    fn configuration_changed(&mut self) -> bool;

    /// True if a new outbound packet can be submitted now.
    fn tx_ready(&self) -> bool;

    /// Submits `data` (at most one max-size packet, possibly empty) as a single packet.
    ///
    /// `Err(UsbError::WouldBlock)` means the device was not ready after all.
    fn tx_packet(&mut self, data: &[u8]) -> Result<()>;

    /// True if inbound bytes are waiting to be burst-read.
    fn rx_available(&self) -> bool;

    /// Drains the available inbound bytes into `buf` and returns how many were read.
    ///
    /// `Err(UsbError::WouldBlock)` means no data.
    fn rx_burst_read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

#[cfg(test)]
pub(crate) mod mock {
    extern crate std;

    use super::CdcDevice;
    use std::collections::VecDeque;
    use std::vec::Vec;
    use usb_device::{Result, UsbError};

    /// Scriptable device used by the unit tests.
    #[derive(Default)]
    pub struct MockDevice {
        pub configured: bool,
        pub changed: bool,
        pub ready: bool,
        pub sent: Vec<Vec<u8>>,
        pub inbound: VecDeque<Vec<u8>>,
        pub polls: usize,
        pub packet_size: usize,
    }

    impl MockDevice {
        pub fn ready() -> Self {
            MockDevice {
                configured: true,
                ready: true,
                packet_size: 8,
                ..Default::default()
            }
        }

        pub fn receive(&mut self, data: &[u8]) {
            self.inbound.push_back(data.to_vec());
        }
    }

    impl CdcDevice for MockDevice {
        fn poll(&mut self) {
            self.polls += 1;
        }

        fn max_packet_size(&self) -> usize {
            self.packet_size
        }

        fn configured(&self) -> bool {
            self.configured
        }

        fn configuration_changed(&mut self) -> bool {
            core::mem::take(&mut self.changed)
        }

        fn tx_ready(&self) -> bool {
            self.ready
        }

        fn tx_packet(&mut self, data: &[u8]) -> Result<()> {
            if !self.ready {
                return Err(UsbError::WouldBlock);
            }
            self.sent.push(data.to_vec());
            Ok(())
        }

        fn rx_available(&self) -> bool {
            !self.inbound.is_empty()
        }

        fn rx_burst_read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let data = self.inbound.pop_front().ok_or(UsbError::WouldBlock)?;
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            Ok(n)
        }
    }
}
