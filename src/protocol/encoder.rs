//! Livolo frame encoder.
//!
//! A frame is 16 bits of remote id followed by the low 7 bits of the key
//! code, sent most-significant first.  The transmit word stores those bits
//! reversed so the pulse engine can emit them by testing bit 0 and shifting
//! right.  Bit 23 is a terminator fixed to 1: once only the terminator is
//! left every data bit has been sent, and one more shift empties the word.
//!
//! ```text
//! byte:      0                 1                 2
//! bits:  r8 r9 .. r15     r0 r1 .. r7     k0 k1 .. k6 T   (bit 0 on the left)
//!        └ reversed ┘     └ reversed ┘     └ reversed ┘
//! ```
//! (`r15` is the first bit on air, `T` the terminator.)

use crate::error::CommandError;

/// Number of data bits in one frame.
pub const FRAME_BITS: u32 = 23;

/// Bit position of the terminator.
pub const TERMINATOR_BIT: u32 = FRAME_BITS;

/// Validated (remote id, key code) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchCode {
    remote_id: u16,
    key: u8,
}

impl SwitchCode {
    /// Both values must be non-zero.  Only the low 7 bits of the key reach the
    /// air; bit 7 is overwritten by the encoder.
    pub const fn new(remote_id: u16, key: u8) -> Result<Self, CommandError> {
        if remote_id == 0 {
            return Err(CommandError::RemoteIdOutOfRange(0));
        }
        if key == 0 {
            return Err(CommandError::KeyCodeOutOfRange(0));
        }
        Ok(Self { remote_id, key })
    }

    /// Range-checks wider integers as they arrive from a command line or
    /// config file.
    pub fn from_wide(remote_id: u32, key: u32) -> Result<Self, CommandError> {
        let remote = u16::try_from(remote_id)
            .ok()
            .filter(|r| *r != 0)
            .ok_or(CommandError::RemoteIdOutOfRange(remote_id))?;
        let key8 = u8::try_from(key)
            .ok()
            .filter(|k| *k != 0)
            .ok_or(CommandError::KeyCodeOutOfRange(key))?;
        Ok(Self { remote_id: remote, key: key8 })
    }

    pub const fn remote_id(&self) -> u16 {
        self.remote_id
    }

    pub const fn key(&self) -> u8 {
        self.key
    }
}

/// 24-bit transmit word (stored in the low three bytes of a `u32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxWord(u32);

impl TxWord {
    pub const EMPTY: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & 0x00FF_FFFF)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True once every bit, terminator included, has been shifted out.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bit the engine acts on next.
    pub const fn lsb(self) -> bool {
        self.0 & 1 != 0
    }

    pub fn shift(&mut self) {
        self.0 >>= 1;
    }

    /// Low byte first, matching the in-memory layout the engine shifts.
    pub const fn to_bytes(self) -> [u8; 3] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2]]
    }

    /// Data bits in transmission order.  Stops before the terminator.
    pub fn bits(self) -> Bits {
        Bits { word: self }
    }
}

/// Iterator returned by [`TxWord::bits`].
#[derive(Debug, Clone)]
pub struct Bits {
    word: TxWord,
}

impl Iterator for Bits {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        // A lone terminator (or nothing) means the data bits are exhausted.
        if self.word.raw() <= 1 {
            return None;
        }
        let bit = self.word.lsb();
        self.word.shift();
        Some(bit)
    }
}

/// Build the transmit word for `code`.
pub fn encode(code: SwitchCode) -> TxWord {
    let remote = code.remote_id();
    let hi = ((remote >> 8) as u8).reverse_bits();
    let lo = (remote as u8).reverse_bits();
    let key = ((code.key() & 0x7F).reverse_bits() >> 1) | 0x80;
    TxWord(u32::from_le_bytes([hi, lo, key, 0]))
}

/// Recover the frame from a word produced by [`encode`].  The terminator must
/// still be in place.
pub fn decode(word: TxWord) -> Option<(u16, u8)> {
    if word.raw() >> TERMINATOR_BIT != 1 {
        return None;
    }
    let mut value: u32 = 0;
    for bit in word.bits() {
        value = (value << 1) | u32::from(bit);
    }
    Some(((value >> 7) as u16, (value & 0x7F) as u8))
}
