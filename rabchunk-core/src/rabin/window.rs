use super::poly::{RabinPoly, shift_left_mod};

/// Width of the rolling fingerprint window in bytes.
pub const WINDOW_SIZE: usize = 48;

/// Rolling-window fingerprint: the Rabin hash of the last `WINDOW_SIZE`
/// bytes, advanced in O(1) per byte.
///
/// The circular buffer starts zeroed, so while the window is still filling
/// the outgoing byte is 0 and `undo[0] == 0` makes the slide a plain append.
pub struct RollingWindow {
    poly: RabinPoly,
    undo: [u64; 256],
    buf: [u8; WINDOW_SIZE],
    pos: usize,
    fingerprint: u64,
}

impl RollingWindow {
    pub fn new() -> Self {
        let mut undo = [0u64; 256];
        for (k, slot) in undo.iter_mut().enumerate() {
            // Contribution of a byte that is now WINDOW_SIZE positions old.
            *slot = shift_left_mod(k as u64, 8 * WINDOW_SIZE as u32);
        }
        RollingWindow {
            poly: RabinPoly::new(),
            undo,
            buf: [0u8; WINDOW_SIZE],
            pos: 0,
            fingerprint: 0,
        }
    }

    /// Pushes `b` into the window, retires the byte that falls out, and
    /// returns the new fingerprint.
    #[inline]
    pub fn slide8(&mut self, b: u8) -> u64 {
        let out = self.buf[self.pos];
        self.buf[self.pos] = b;
        self.pos += 1;
        if self.pos == WINDOW_SIZE {
            self.pos = 0;
        }
        self.fingerprint = self.poly.append8(self.fingerprint, b) ^ self.undo[out as usize];
        self.fingerprint
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn reset(&mut self) {
        self.buf = [0u8; WINDOW_SIZE];
        self.pos = 0;
        self.fingerprint = 0;
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new()
    }
}
