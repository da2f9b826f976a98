//! Word-at-a-time delimiter search.
//!
//! The search reads eight bytes at once as a little-endian `u64`, so byte `i` of the
//! input lives in lane `i` (bits `8*i..8*i+8`). XOR with the target broadcast to all
//! lanes turns a matching byte into a zero lane. Adding `0x7f` to the low seven bits of
//! every lane sets the lane's high bit unless those seven bits were all zero, so a word
//! whose high bits are all set has no match. The add never carries across lanes.
//!
//! A lane whose seven low bits are zero is only a candidate: the byte is either the
//! target itself or the target with the high bit flipped, a non-ASCII alias. Candidates
//! are resolved in lane order and checked against the real byte, which both rejects the
//! aliases and yields the first true match when a word holds several.

const LOW_BITS: u64 = 0x7f7f_7f7f_7f7f_7f7f;
const HIGH_BITS: u64 = 0x8080_8080_8080_8080;
const WORD: usize = 8;

/// A delimiter byte together with its value broadcast to all eight lanes of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTarget {
    value: u8,
    mask: u64,
}

impl ScanTarget {
    pub const SPACE: ScanTarget = ScanTarget::new(b' ');
    pub const CR: ScanTarget = ScanTarget::new(b'\r');
    pub const LF: ScanTarget = ScanTarget::new(b'\n');
    pub const COLON: ScanTarget = ScanTarget::new(b':');
    pub const SEMICOLON: ScanTarget = ScanTarget::new(b';');
    pub const QUESTION_MARK: ScanTarget = ScanTarget::new(b'?');
    pub const AMPERSAND: ScanTarget = ScanTarget::new(b'&');
    pub const EQUALS: ScanTarget = ScanTarget::new(b'=');

    pub const fn new(value: u8) -> Self {
        Self { value, mask: u64::from_ne_bytes([value; WORD]) }
    }

    #[inline]
    pub fn value(&self) -> u8 {
        self.value
    }

    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Returns the index of the first occurrence of the target in `data`.
    pub fn find(&self, data: &[u8]) -> Option<usize> {
        let mut words = data.chunks_exact(WORD);
        for (index, chunk) in words.by_ref().enumerate() {
            let mut bytes = [0u8; WORD];
            bytes.copy_from_slice(chunk);
            if let Some(lane) = self.locate(u64::from_le_bytes(bytes)) {
                return Some(index * WORD + lane);
            }
        }

        let tail = words.remainder();
        tail.iter().position(|&b| b == self.value).map(|lane| data.len() - tail.len() + lane)
    }

    /// Returns the first lane of `word` holding the target.
    #[inline]
    pub fn locate(&self, word: u64) -> Option<usize> {
        let mut candidates = candidates(word ^ self.mask);
        while candidates != 0 {
            let lane = first_lane(candidates);
            if lane_byte(word, lane) == self.value {
                return Some(lane);
            }
            candidates &= !(0x80u64 << (lane * WORD));
        }
        None
    }
}

/// Sets the high bit of every lane whose low seven bits are zero.
#[inline]
fn candidates(diff: u64) -> u64 {
    !((diff & LOW_BITS) + LOW_BITS) & HIGH_BITS
}

/// Index of the lowest lane with a candidate bit; `candidates` must be non-zero.
#[inline]
fn first_lane(candidates: u64) -> usize {
    let mut lane = 0;
    let mut rest = candidates;
    if rest & 0xffff_ffff == 0 {
        lane += 4;
        rest >>= 32;
    }
    if rest & 0xffff == 0 {
        lane += 2;
        rest >>= 16;
    }
    if rest & 0xff == 0 {
        lane += 1;
    }
    lane
}

#[inline]
fn lane_byte(word: u64, lane: usize) -> u8 {
    word.to_le_bytes()[lane]
}
