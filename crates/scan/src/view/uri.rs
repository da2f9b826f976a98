//! Percent-decoding state machine used by [`ByteView::decode_uri`](super::ByteView::decode_uri).

use DecodeState::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeState {
    /// Outside of an escape
    Plain,
    /// Read `%`, waiting for the high nibble
    High,
    /// Read the high nibble, waiting for the low one
    Low(u8),
}

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// A decoded byte is ready
    Emit(u8),
    /// The byte was part of an escape in progress
    Pending,
    /// The byte is not a hex digit inside an escape
    Invalid,
}

impl DecodeState {
    pub(crate) fn step(&mut self, byte: u8) -> Step {
        match *self {
            Plain => match byte {
                b'%' => {
                    *self = High;
                    Step::Pending
                }
                b'+' => Step::Emit(b' '),
                b => Step::Emit(b),
            },
            High => match hex(byte) {
                Some(high) => {
                    *self = Low(high);
                    Step::Pending
                }
                None => Step::Invalid,
            },
            Low(high) => match hex(byte) {
                Some(low) => {
                    *self = Plain;
                    Step::Emit(high << 4 | low)
                }
                None => Step::Invalid,
            },
        }
    }

    /// True once the input ended outside of an escape.
    pub(crate) fn is_complete(&self) -> bool {
        *self == Plain
    }
}

fn hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
