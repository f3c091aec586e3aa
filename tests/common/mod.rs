use std::collections::VecDeque;

use usbd_serial_fifo::{CdcDevice, Result, UsbError};

/// Host-side stand-in for the USB CDC stack.
#[derive(Default)]
pub struct FakeCdc {
    pub configured: bool,
    pub changed: bool,
    pub host_reading: bool,
    pub packets: Vec<Vec<u8>>,
    pub inbound: VecDeque<Vec<u8>>,
}

impl FakeCdc {
    pub fn connected() -> Self {
        FakeCdc {
            configured: true,
            host_reading: true,
            ..Default::default()
        }
    }

    pub fn send_from_host(&mut self, data: &[u8]) {
        self.inbound.push_back(data.to_vec());
    }
}

impl CdcDevice for FakeCdc {
    fn configured(&self) -> bool {
        self.configured
    }

    fn configuration_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn tx_ready(&self) -> bool {
        self.host_reading
    }

    fn tx_packet(&mut self, data: &[u8]) -> Result<()> {
        if !self.host_reading {
            return Err(UsbError::WouldBlock);
        }
        self.packets.push(data.to_vec());
        Ok(())
    }

    fn rx_available(&self) -> bool {
        !self.inbound.is_empty()
    }

    fn rx_burst_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data = self.inbound.pop_front().ok_or(UsbError::WouldBlock)?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}
