use core::cmp;

/// A fixed-capacity byte buffer that is filled from the front and read in order.
///
/// wpos points to the first byte that can be written, rpos points at the next byte that can be
/// read. Space is never reclaimed while unread data remains; the buffer must be drained (or
/// cleared) before it can be written from the start again.
///
/// invariants: 0 <= rpos <= wpos <= N
pub struct Buffer<const N: usize> {
    store: [u8; N],
    rpos: usize,
    wpos: usize,
}

impl<const N: usize> Buffer<N> {
    pub const fn new() -> Self {
        Self {
            store: [0; N],
            rpos: 0,
            wpos: 0,
        }
    }

    // Clears the buffer
    pub fn clear(&mut self) {
        self.rpos = 0;
        self.wpos = 0;
    }

    // Amount of bytes available for reading
    pub fn available_read(&self) -> usize {
        self.wpos - self.rpos
    }

    // Amount of space in bytes available for writing
    pub fn available_write(&self) -> usize {
        N - self.wpos
    }

    // The bytes that have been written but not read yet
    pub fn unread(&self) -> &[u8] {
        &self.store[self.rpos..self.wpos]
    }

    // Appends one byte, returns false if the buffer is full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.wpos == N {
            return false;
        }

        self.store[self.wpos] = byte;
        self.wpos += 1;
        true
    }

    // Takes the next unread byte
    pub fn pop(&mut self) -> Option<u8> {
        if self.rpos >= self.wpos {
            return None;
        }

        let byte = self.store[self.rpos];
        self.rpos += 1;
        Some(byte)
    }

    // Overwrites the whole buffer with data produced by a closure. The closure receives the entire
    // store and returns how many bytes it wrote. If it returns an error the buffer is left empty.
    pub fn refill<E>(&mut self, f: impl FnOnce(&mut [u8]) -> Result<usize, E>) -> Result<usize, E> {
        self.clear();

        f(&mut self.store[..]).map(|count| {
            self.wpos = cmp::min(count, N);
            self.wpos
        })
    }
}
