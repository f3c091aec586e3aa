use core::convert::Infallible;
use core::fmt;

use embedded_hal::blocking;
use embedded_hal::serial;

use crate::device::CdcDevice;
use crate::serial_port::{RxConsumer, TxProducer};

/// Raw byte writes. Unlike [`TxProducer::putch`] no line-ending expansion takes place.
impl<D: CdcDevice, const TX: usize, const RX: usize> serial::Write<u8> for TxProducer<'_, D, TX, RX> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.try_push(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        <TxProducer<'_, D, TX, RX>>::flush(self)
    }
}

impl<D: CdcDevice, const TX: usize, const RX: usize> blocking::serial::write::Default<u8>
    for TxProducer<'_, D, TX, RX>
{
}

/// Reads go through the line translator, so CR and CR LF arrive as a single LF.
impl<D: CdcDevice, const TX: usize, const RX: usize> serial::Read<u8> for RxConsumer<'_, D, TX, RX> {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.getch().ok_or(nb::Error::WouldBlock)
    }
}

/// Text output for `write!`. LF is sent as CR LF.
impl<D: CdcDevice, const TX: usize, const RX: usize> fmt::Write for TxProducer<'_, D, TX, RX> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.putstr(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::fmt::Write as _;
    use embedded_hal::blocking::serial::Write as _;
    use embedded_hal::serial::{Read as _, Write as _};
    use std::vec;

    use crate::device::mock::MockDevice;
    use crate::{Config, Port};

    #[test]
    fn fmt_write_expands_newlines() {
        let port: Port<_> = Port::new(MockDevice::ready(), Config::new());
        let (mut fg, mut bg) = port.split().unwrap();

        write!(fg.tx, "{:>7} - {:>7}\n", 0, 12).unwrap();
        bg.tx.flush();

        let sent = fg.link.with_device(|dev| dev.sent.clone());
        assert_eq!(sent, vec![b"      0 -      12\r\n".to_vec()]);
    }

    #[test]
    fn hal_write_is_raw() {
        let port: Port<_> = Port::new(MockDevice::ready(), Config::new());
        let (mut fg, mut bg) = port.split().unwrap();

        fg.tx.bwrite_all(b"a\n").unwrap();
        assert!(fg.tx.write(b'b').is_ok());
        assert!(embedded_hal::serial::Write::flush(&mut fg.tx).is_err());

        bg.tx.flush();

        assert!(embedded_hal::serial::Write::flush(&mut fg.tx).is_ok());
        let sent = fg.link.with_device(|dev| dev.sent.clone());
        assert_eq!(sent, vec![b"a\nb".to_vec()]);
    }

    #[test]
    fn hal_read_translates() {
        let port: Port<_> = Port::new(MockDevice::ready(), Config::new());
        let (mut fg, mut bg) = port.split().unwrap();

        assert!(matches!(fg.rx.read(), Err(nb::Error::WouldBlock)));

        fg.link.with_device(|dev| dev.receive(b"\r\nk"));
        bg.rx.fill();

        assert_eq!(fg.rx.read().ok(), Some(b'\n'));
        assert_eq!(fg.rx.read().ok(), Some(b'k'));
    }
}
