//! Line-ending handling for the serial console.
//!
//! On the wire lines end in CR LF. Received input may use CR, LF or CR LF, and is normalized to a
//! single LF per line terminator.

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Receive-side line translator.
///
/// CR is turned into LF, and an LF directly following a translated CR is swallowed so that CR LF
/// yields one line terminator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LineDecoder {
    cr_pending: bool,
}

impl LineDecoder {
    pub const fn new() -> Self {
        LineDecoder { cr_pending: false }
    }

    /// Forgets any half-seen CR LF pair.
    pub fn reset(&mut self) {
        self.cr_pending = false;
    }

    /// True if the last byte produced was a translated CR.
    pub fn cr_pending(&self) -> bool {
        self.cr_pending
    }

    /// Produces the next translated byte, pulling raw bytes from `pop`.
    ///
    /// `pop` is called at most twice: a second time only to replace the LF of a CR LF pair.
    pub fn decode(&mut self, mut pop: impl FnMut() -> Option<u8>) -> Option<u8> {
        let byte = pop()?;

        if byte == LF && self.cr_pending {
            self.cr_pending = false;
            return pop().map(|next| self.translate(next));
        }

        Some(self.translate(byte))
    }

    fn translate(&mut self, byte: u8) -> u8 {
        if byte == CR {
            self.cr_pending = true;
            LF
        } else {
            self.cr_pending = false;
            byte
        }
    }
}
