use usb_device::UsbError;

use crate::buffer::Buffer;
use crate::device::CdcDevice;

/// What a single [`TxQueue::flush`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flush {
    /// Nothing was pending.
    Idle,

    /// A data packet of this many bytes was sent.
    Sent(usize),

    /// The zero-length packet terminating a full-size transfer was sent.
    ZeroLength,

    /// The device refused the packet. Carries the current reject streak.
    Rejected(u8),

    /// The reject streak went over the threshold and this many buffered bytes were discarded.
    Dropped(usize),
}

/// Outbound byte queue holding at most one packet.
///
/// Bytes are appended by the foreground producer and sent as one packet per periodic flush. A
/// packet of exactly the device's max packet size is followed by a zero-length packet so the host
/// sees the end of the transfer. `N` must not exceed that size.
pub struct TxQueue<const N: usize> {
    buf: Buffer<N>,
    /// The last packet sent was full-size and still needs its zero-length terminator.
    zlp_pending: bool,
    reject_streak: u8,
}

impl<const N: usize> TxQueue<N> {
    pub const fn new() -> Self {
        TxQueue {
            buf: Buffer::new(),
            zlp_pending: false,
            reject_streak: 0,
        }
    }

    /// Number of bytes waiting to be sent.
    pub fn len(&self) -> usize {
        self.buf.available_read()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.buf.available_write() == 0
    }

    pub fn zlp_pending(&self) -> bool {
        self.zlp_pending
    }

    pub fn reject_streak(&self) -> u8 {
        self.reject_streak
    }

    /// True if neither data nor a zero-length packet is waiting.
    pub fn is_idle(&self) -> bool {
        self.is_empty() && !self.zlp_pending
    }

    /// The bytes that the next data packet will carry.
    pub fn pending(&self) -> &[u8] {
        self.buf.unread()
    }

    /// Appends a byte. Returns false, leaving the queue untouched, if it is full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.buf.push(byte)
    }

    /// Discards buffered data and all framing state.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.zlp_pending = false;
        self.reject_streak = 0;
    }

    /// Sends at most one packet to `device`.
    ///
    /// A pending zero-length packet always goes out before any new data. If the device refuses
    /// more than `reject_threshold` flushes in a row, everything buffered is dropped.
    pub fn flush<D: CdcDevice>(&mut self, device: &mut D, reject_threshold: u8) -> Flush {
        if self.is_idle() {
            return Flush::Idle;
        }

        let zlp = self.zlp_pending;
        let packet: &[u8] = if zlp { &[] } else { self.buf.unread() };
        let len = packet.len();

        let result = if device.tx_ready() {
            device.tx_packet(packet)
        } else {
            Err(UsbError::WouldBlock)
        };

        match result {
            Ok(()) => {
                self.reject_streak = 0;

                if zlp {
                    trace!("tx: sent zero-length packet");
                    self.zlp_pending = false;
                    Flush::ZeroLength
                } else {
                    self.zlp_pending = len == device.max_packet_size();
                    self.buf.clear();
                    Flush::Sent(len)
                }
            }
            Err(err) => {
                if err != UsbError::WouldBlock {
                    warn!("tx: packet error {:?}", err);
                }

                // The streak never exceeds the threshold, so this reject is number `threshold + 1`
                // exactly when the streak has already reached it.
                if self.reject_streak >= reject_threshold {
                    let dropped = self.len();
                    warn!("tx: host not reading, dropped {} bytes", dropped);
                    self.clear();
                    Flush::Dropped(dropped)
                } else {
                    self.reject_streak += 1;
                    Flush::Rejected(self.reject_streak)
                }
            }
        }
    }
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
