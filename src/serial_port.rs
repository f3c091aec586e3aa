use core::convert::Infallible;
use core::hint;

use crate::config::{Config, Mode, PACKET_SIZE};
use crate::device::CdcDevice;
use crate::error::Error;
use crate::line::{LineDecoder, CR, LF};
use crate::rx::{Fill, RxQueue};
use crate::shared::Shared;
use crate::tx::{Flush, TxQueue};

struct State<D, const TX: usize, const RX: usize> {
    device: D,
    tx: TxQueue<TX>,
    rx: RxQueue<RX>,
    decoder: LineDecoder,
    config: Config,
    split: bool,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> State<D, TX, RX> {
    fn reset(&mut self) {
        self.tx.clear();
        self.rx.clear();
        self.decoder.reset();
    }

    fn try_push(&mut self, byte: u8) -> bool {
        match self.config.tx {
            Mode::Buffered => self.tx.push(byte),
            Mode::Passthrough => {
                if !self.device.tx_ready() {
                    return false;
                }
                match self.device.tx_packet(&[byte]) {
                    Ok(()) => true,
                    Err(usb_device::UsbError::WouldBlock) => false,
                    Err(err) => {
                        warn!("tx: packet error {:?}", err);
                        false
                    }
                }
            }
        }
    }

    fn pop(&mut self) -> Option<u8> {
        let State {
            device, rx, config, ..
        } = self;
        pop_raw(device, rx, config.rx)
    }

    fn getch(&mut self) -> Option<u8> {
        let State {
            device,
            rx,
            decoder,
            config,
            ..
        } = self;
        decoder.decode(|| pop_raw(device, rx, config.rx))
    }
}

// In passthrough mode the device is polled right here instead of from the periodic tick.
fn pop_raw<D: CdcDevice, const RX: usize>(
    device: &mut D,
    rx: &mut RxQueue<RX>,
    mode: Mode,
) -> Option<u8> {
    if mode == Mode::Passthrough {
        rx.fill(device);
    }
    rx.pop()
}

/// USB serial port with interrupt-driven TX/RX buffering.
///
/// The port owns the device and both queues. It is meant to live for the whole program (usually
/// in a `static`) and is used through the handles returned by [`Port::split`]: the [`Foreground`]
/// half goes to the main loop and the [`Background`] half to the periodic interrupt.
pub struct Port<D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> Port<D, TX, RX> {
    const TX_FITS_PACKET: () = assert!(
        TX <= PACKET_SIZE,
        "TX capacity must not exceed the endpoint packet size"
    );

    /// Creates a port around `device`.
    ///
    /// The TX queue is flushed as a single packet, so `TX` may not exceed [`PACKET_SIZE`]:
    ///
    /// ```compile_fail
    /// # use usbd_serial_fifo::{CdcDevice, Config, Port, Result};
    /// # struct Dev;
    /// # impl CdcDevice for Dev {
    /// #     fn configured(&self) -> bool { true }
    /// #     fn configuration_changed(&mut self) -> bool { false }
    /// #     fn tx_ready(&self) -> bool { true }
    /// #     fn tx_packet(&mut self, _: &[u8]) -> Result<()> { Ok(()) }
    /// #     fn rx_available(&self) -> bool { false }
    /// #     fn rx_burst_read(&mut self, _: &mut [u8]) -> Result<usize> { Ok(0) }
    /// # }
    /// static PORT: Port<Dev, 128> = Port::new(Dev, Config::new());
    /// ```
    pub const fn new(device: D, config: Config) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::TX_FITS_PACKET;

        Port {
            state: Shared::new(State {
                device,
                tx: TxQueue::new(),
                rx: RxQueue::new(),
                decoder: LineDecoder::new(),
                config,
                split: false,
            }),
        }
    }

    pub fn config(&self) -> Config {
        self.state.lock().config
    }

    /// Hands out the role handles. Succeeds only once per port.
    pub fn split(&self) -> Result<(Foreground<'_, D, TX, RX>, Background<'_, D, TX, RX>), Error> {
        let mut state = self.state.lock();
        if state.split {
            return Err(Error::AlreadySplit);
        }
        state.split = true;
        drop(state);

        let state = &self.state;
        Ok((
            Foreground {
                tx: TxProducer { state },
                rx: RxConsumer { state },
                link: Link { state },
            },
            Background {
                tx: TxDrainer { state },
                rx: RxFiller { state },
            },
        ))
    }
}

/// Handles used by the main loop.
pub struct Foreground<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    pub tx: TxProducer<'a, D, TX, RX>,
    pub rx: RxConsumer<'a, D, TX, RX>,
    pub link: Link<'a, D, TX, RX>,
}

/// Handles used by the periodic interrupt.
pub struct Background<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    pub tx: TxDrainer<'a, D, TX, RX>,
    pub rx: RxFiller<'a, D, TX, RX>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> Background<'_, D, TX, RX> {
    /// One periodic tick: service the USB stack, send at most one packet, then pull in a burst
    /// of received bytes if the RX queue has been drained.
    pub fn tick(&mut self) -> (Flush, Fill) {
        self.tx.state.lock().device.poll();

        let flushed = self.tx.flush();
        let filled = self.rx.fill();
        (flushed, filled)
    }
}

/// Foreground writer. The only handle that adds bytes to the TX queue.
pub struct TxProducer<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: &'a Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> TxProducer<'_, D, TX, RX> {
    /// Makes one attempt to queue `byte` (or, in passthrough mode, to send it).
    pub fn try_push(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if self.state.lock().try_push(byte) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Queues `byte`, spinning until there is room.
    ///
    /// This never gives up: if the periodic flush stops running, the caller waits forever. See
    /// [`push_bounded`](Self::push_bounded) for a variant that does give up.
    pub fn push(&mut self, byte: u8) {
        while self.try_push(byte).is_err() {
            hint::spin_loop();
        }
    }

    /// Like [`push`](Self::push) but gives up after `attempts` tries.
    pub fn push_bounded(&mut self, byte: u8, attempts: u32) -> Result<(), Error> {
        for _ in 0..attempts {
            if self.try_push(byte).is_ok() {
                return Ok(());
            }
            hint::spin_loop();
        }
        Err(Error::Timeout)
    }

    /// Writes one character, sending LF as CR LF.
    pub fn putch(&mut self, byte: u8) {
        if byte == LF {
            self.push(CR);
        }
        self.push(byte);
    }

    /// Writes every character of `s` through [`putch`](Self::putch), stopping at a NUL byte.
    pub fn putstr(&mut self, s: impl AsRef<[u8]>) {
        for &byte in s.as_ref().iter().take_while(|&&byte| byte != 0) {
            self.putch(byte);
        }
    }

    /// Number of bytes queued but not yet sent.
    pub fn pending(&self) -> usize {
        self.state.lock().tx.len()
    }

    /// `Ok` once everything queued, including a trailing zero-length packet, has been sent.
    pub fn flush(&mut self) -> nb::Result<(), Infallible> {
        if self.state.lock().tx.is_idle() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

/// Periodic-context TX side. The only handle that empties the TX queue.
pub struct TxDrainer<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: &'a Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> TxDrainer<'_, D, TX, RX> {
    /// Sends at most one packet from the TX queue.
    pub fn flush(&mut self) -> Flush {
        let mut state = self.state.lock();
        let State {
            device, tx, config, ..
        } = &mut *state;

        match config.tx {
            Mode::Buffered => tx.flush(device, config.reject_threshold),
            Mode::Passthrough => Flush::Idle,
        }
    }
}

/// Periodic-context RX side. The only handle that refills the RX queue.
pub struct RxFiller<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: &'a Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> RxFiller<'_, D, TX, RX> {
    /// Pulls a burst of received bytes if the RX queue is drained.
    pub fn fill(&mut self) -> Fill {
        let mut state = self.state.lock();
        let State {
            device, rx, config, ..
        } = &mut *state;

        match config.rx {
            Mode::Buffered => rx.fill(device),
            Mode::Passthrough => Fill::Disabled,
        }
    }
}

/// Foreground reader.
pub struct RxConsumer<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: &'a Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> RxConsumer<'_, D, TX, RX> {
    /// Takes the next raw byte, without line-ending translation.
    pub fn pop(&mut self) -> Option<u8> {
        self.state.lock().pop()
    }

    /// Takes the next character with CR and CR LF turned into LF.
    pub fn getch(&mut self) -> Option<u8> {
        self.state.lock().getch()
    }

    /// Number of received bytes not yet read.
    pub fn available(&self) -> usize {
        self.state.lock().rx.len()
    }
}

/// Foreground view of the device lifecycle.
pub struct Link<'a, D, const TX: usize = PACKET_SIZE, const RX: usize = PACKET_SIZE> {
    state: &'a Shared<State<D, TX, RX>>,
}

impl<D: CdcDevice, const TX: usize, const RX: usize> Link<'_, D, TX, RX> {
    pub fn is_configured(&self) -> bool {
        self.state.lock().device.configured()
    }

    /// Spins until the host has configured the device, then starts from clean queues and line
    /// state.
    pub fn wait_configured(&mut self) {
        loop {
            let mut state = self.state.lock();
            state.device.poll();

            if state.device.configured() {
                // The change flag belongs to this configuration, not a new one.
                state.device.configuration_changed();
                state.reset();
                debug!("link: configured");
                return;
            }

            drop(state);
            hint::spin_loop();
        }
    }

    /// True if the device was reconfigured since the last check. Queues and line state are
    /// reset when that happens; the caller should go back to [`wait_configured`](Self::wait_configured).
    pub fn configuration_changed(&mut self) -> bool {
        let mut state = self.state.lock();
        if !state.device.configuration_changed() {
            return false;
        }

        debug!("link: reconfigured, resetting queues");
        state.reset();
        true
    }

    /// Runs `f` with exclusive access to the device, e.g. to read control-line state.
    ///
    /// `f` runs inside the port's critical section with the shared state locked. Interrupts stay
    /// masked for its whole duration, and calling any other handle of the same port from inside
    /// `f` panics with a re-entrant lock.
    pub fn with_device<R>(&mut self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.state.lock().device)
    }
}
