//! Constants and the per-direction buffering policy.

/// Maximum packet size of the CDC bulk endpoints. Both queues default to this capacity.
pub const PACKET_SIZE: usize = 64;

/// Number of consecutive rejected flushes tolerated before pending TX data is dropped.
pub const REJECT_THRESHOLD: u8 = 4;

/// How one direction of the port moves bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Bytes go through a queue that the periodic tick drains (TX) or fills (RX).
    Buffered,

    /// No queueing on the periodic side. TX sends every byte as its own packet and RX polls the
    /// device synchronously from the reading context.
    Passthrough,
}

/// Policy injected into a [`Port`](crate::Port) once at startup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub tx: Mode,
    pub rx: Mode,
    pub reject_threshold: u8,
}

impl Config {
    /// Buffered in both directions.
    pub const fn new() -> Self {
        Config {
            tx: Mode::Buffered,
            rx: Mode::Buffered,
            reject_threshold: REJECT_THRESHOLD,
        }
    }

    /// Passthrough in both directions.
    pub const fn passthrough() -> Self {
        Config {
            tx: Mode::Passthrough,
            rx: Mode::Passthrough,
            reject_threshold: REJECT_THRESHOLD,
        }
    }

    pub const fn with_tx(mut self, mode: Mode) -> Self {
        self.tx = mode;
        self
    }

    pub const fn with_rx(mut self, mode: Mode) -> Self {
        self.rx = mode;
        self
    }

    pub const fn with_reject_threshold(mut self, threshold: u8) -> Self {
        self.reject_threshold = threshold;
        self
    }
}

impl Default for Config {
    /// Buffered unless the crate is built with the `passthrough` feature.
    fn default() -> Self {
        if cfg!(feature = "passthrough") {
            Config::passthrough()
        } else {
            Config::new()
        }
    }
}
