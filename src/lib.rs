//! Interrupt-driven FIFO buffering for a USB CDC-ACM serial port.
//!
//! The main loop writes and reads single characters; a periodic interrupt moves the bytes across
//! the USB bulk endpoints one packet at a time. Both sides share a [`Port`] whose state is only
//! ever touched inside a critical section.
//!
//! - Transmit: bytes are queued by [`TxProducer`] and sent by [`TxDrainer::flush`], one packet
//!   per tick. A full-size packet is always followed by a zero-length packet. If the host stops
//!   reading, the queued data is dropped after [`REJECT_THRESHOLD`] refused ticks in a row.
//! - Receive: [`RxFiller::fill`] burst-reads into the RX queue once it has been drained, and
//!   [`RxConsumer::getch`] hands out characters with CR and CR LF normalized to LF.
//!
//! Either direction can run unbuffered instead, selected through [`Config`].
//!
//! Example
//! =======
//!
//! The hardware independent part of a line-counting console looks like this; `PORT` holds a
//! [`Port`] built around a [`UsbCdc`] (or any other [`CdcDevice`]):
//!
//! ```ignore
//! use core::fmt::Write;
//!
//! let (mut fg, bg) = PORT.split().unwrap();
//! // Move `bg` to the periodic interrupt, which calls `bg.tick()`.
//!
//! loop {
//!     fg.link.wait_configured();
//!     let (mut line, mut chars) = (0u32, 0u32);
//!
//!     while !fg.link.configuration_changed() {
//!         if let Some(ch) = fg.rx.getch() {
//!             chars += 1;
//!             if ch == b'\n' {
//!                 write!(fg.tx, "{:7} - {:7}\n", line, chars).ok();
//!                 line += 1;
//!                 chars = 0;
//!             }
//!         }
//!     }
//! }
//! ```

#![no_std]

// This mod MUST go first, so that the others see its macros.
mod fmt;

mod buffer;
mod config;
mod device;
mod error;
mod io;
mod line;
mod rx;
mod serial_port;
mod shared;
mod tx;
mod usb;

pub use crate::config::*;
pub use crate::device::CdcDevice;
pub use crate::error::Error;
pub use crate::line::{LineDecoder, CR, LF};
pub use crate::rx::{Fill, RxQueue};
pub use crate::serial_port::*;
pub use crate::shared::{Guard, Shared};
pub use crate::tx::{Flush, TxQueue};
pub use crate::usb::UsbCdc;
pub use usb_device::{Result, UsbError};
