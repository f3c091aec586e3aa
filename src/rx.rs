use usb_device::UsbError;

use crate::buffer::Buffer;
use crate::device::CdcDevice;

/// What a single [`RxQueue::fill`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fill {
    /// Unread bytes remain, so nothing was pulled from the device. Carries the unread count.
    Pending(usize),

    /// The queue was empty but the device had nothing to give.
    NoData,

    /// A burst of this many bytes was read into the queue.
    Filled(usize),

    /// Receive runs in passthrough mode and the periodic fill is disabled.
    Disabled,
}

/// Inbound byte queue holding one burst read.
///
/// A fill only happens once every previously read byte has been consumed, so the device is never
/// asked for more than the queue can hold.
pub struct RxQueue<const N: usize> {
    buf: Buffer<N>,
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        RxQueue { buf: Buffer::new() }
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.buf.available_read()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Burst-reads from `device` if the queue is drained. A non-empty queue is left as it is.
    pub fn fill<D: CdcDevice>(&mut self, device: &mut D) -> Fill {
        if !self.is_empty() {
            return Fill::Pending(self.len());
        }

        if !device.rx_available() {
            return Fill::NoData;
        }

        let read = self.buf.refill(|store| match device.rx_burst_read(store) {
            Ok(count) => Ok(count),
            Err(UsbError::WouldBlock) => Ok(0),
            Err(err) => Err(err),
        });

        match read {
            Ok(0) => Fill::NoData,
            Ok(count) => {
                trace!("rx: filled {} bytes", count);
                Fill::Filled(count)
            }
            Err(err) => {
                warn!("rx: burst read error {:?}", err);
                Fill::NoData
            }
        }
    }

    /// Takes the next unread byte, if any.
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop()
    }
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::device::mock::MockDevice;

    type Queue = RxQueue<8>;

    #[test]
    fn empty_device_gives_no_data() {
        let mut q = Queue::new();
        let mut dev = MockDevice::ready();

        assert_eq!(q.fill(&mut dev), Fill::NoData);
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn fill_then_pop_in_order() {
        let mut q = Queue::new();
        let mut dev = MockDevice::ready();
        dev.receive(b"abc");

        assert_eq!(q.fill(&mut dev), Fill::Filled(3));
        assert_eq!(q.pop(), Some(b'a'));
        assert_eq!(q.pop(), Some(b'b'));
        assert_eq!(q.pop(), Some(b'c'));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn fill_is_noop_while_unread_bytes_remain() {
        let mut q = Queue::new();
        let mut dev = MockDevice::ready();
        dev.receive(b"abc");
        dev.receive(b"def");

        q.fill(&mut dev);
        assert_eq!(q.pop(), Some(b'a'));

        assert_eq!(q.fill(&mut dev), Fill::Pending(2));
        assert_eq!(q.len(), 2);
        assert_eq!(dev.inbound.len(), 1);
        assert_eq!(q.pop(), Some(b'b'));
        assert_eq!(q.pop(), Some(b'c'));

        assert_eq!(q.fill(&mut dev), Fill::Filled(3));
        assert_eq!(q.pop(), Some(b'd'));
    }

    #[test]
    fn burst_is_clamped_to_capacity() {
        let mut q = Queue::new();
        let mut dev = MockDevice::ready();
        dev.receive(&[9; 12]);

        assert_eq!(q.fill(&mut dev), Fill::Filled(8));
        assert_eq!(q.len(), 8);
    }
}
