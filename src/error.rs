use core::fmt;

/// Errors returned by the port's setup and bounded operations.
///
/// The queue engine itself never fails: backpressure, empty reads and reconfiguration are all
/// handled in place.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// [`Port::split`](crate::Port::split) was already called on this port.
    AlreadySplit,

    /// A bounded push gave up before space became available in the TX queue.
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadySplit => f.write_str("port already split"),
            Error::Timeout => f.write_str("timed out waiting for TX queue space"),
        }
    }
}
