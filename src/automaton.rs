//! Packed Aho-Corasick automaton representation
//!
//! This module defines the immutable, cache-dense form of the automaton
//! that the matchers run against. All transition data lives in a single
//! flat array of 64-bit words; per-state slices into that array are
//! addressed through an offset table.
//!
//! # Layout
//!
//! ```text
//! values[S]       payloads reported when state S is entered
//! transitions[]   every state's transitions, concatenated; each state's
//!                 slice ends with exactly one wildcard transition
//! offsets[S]      index of state S's first transition; offsets[N] is the
//!                 total transition count (sentinel)
//! root_ascii[b]   direct dispatch table for the root state, b in [0,128)
//! ```
//!
//! # Design Principles
//!
//! 1. **Density**: transitions are packed 64-bit words, not separately
//!    allocated records, so stepping stays in cache
//! 2. **Immutability**: nothing is mutated after `build`, so one
//!    automaton can serve any number of concurrent matchers
//! 3. **Portability**: the transition word layout is stable and
//!    little-endian on disk (see the `binary` module)

use serde::{Deserialize, Serialize};
use std::mem;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// The root state. State ids are dense, root first.
pub(crate) const ROOT: u32 = 0;

/// Bit 8 marks a wildcard transition.
const WILDCARD_FLAG: u64 = 1 << 8;

/// Low 8 bits hold the input byte of a labeled transition.
const BYTE_MASK: u64 = 0xff;

/// High 32 bits hold the target state.
const STATE_SHIFT: u32 = 32;

/// A single packed transition (8 bytes)
///
/// Bit layout, low to high:
///
/// ```text
/// bits 0-7    input byte (0 for wildcards)
/// bit 8       wildcard flag
/// bits 9-31   zero
/// bits 32-63  target state
/// ```
///
/// A labeled transition is followed when the input byte matches. The
/// wildcard transition terminating each state's slice means "no labeled
/// edge applies"; its target is the state's failure link (the root's
/// wildcard targets the root itself). The flag bit is the only thing
/// distinguishing a wildcard from a labeled transition on byte 0x00.
#[repr(transparent)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    FromBytes,
    IntoBytes,
    Immutable,
    KnownLayout,
)]
pub struct Transition(u64);

// The packed array only stays dense if the word stays one word.
const _: () = assert!(mem::size_of::<Transition>() == 8);

impl Transition {
    /// Create a labeled transition on `byte` to `state`.
    #[inline]
    pub fn labeled(byte: u8, state: u32) -> Self {
        Transition((u64::from(state) << STATE_SHIFT) | u64::from(byte))
    }

    /// Create the wildcard transition falling back to `state`.
    #[inline]
    pub fn wildcard(state: u32) -> Self {
        Transition((u64::from(state) << STATE_SHIFT) | WILDCARD_FLAG)
    }

    /// Is this the wildcard terminating a state's slice?
    #[inline]
    pub fn is_wildcard(self) -> bool {
        self.0 & WILDCARD_FLAG != 0
    }

    /// The input byte of a labeled transition (0 for wildcards).
    #[inline]
    pub fn byte(self) -> u8 {
        (self.0 & BYTE_MASK) as u8
    }

    /// The target state: next state if labeled, failure link if wildcard.
    #[inline]
    pub fn state(self) -> u32 {
        (self.0 >> STATE_SHIFT) as u32
    }

    /// The raw 64-bit word.
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Reconstruct a transition from a raw word.
    ///
    /// The word is taken as-is; `binary::from_bytes` validates structure
    /// before trusting untrusted words.
    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Transition(bits)
    }
}

/// Packed Aho-Corasick automaton over payloads of type `V`
///
/// Built once with [`AcAutomaton::build`], never mutated afterwards.
/// Matching is driven byte by byte through [`AcAutomaton::run`] or code
/// point by code point through [`AcAutomaton::run_lower`]. The automaton
/// owns every payload; matchers hand out references to them.
///
/// Because the automaton is immutable it can be shared freely across
/// threads; any number of matchers may run against it concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcAutomaton<V> {
    /// Payloads per state: needles terminating at the state first, then
    /// payloads inherited along the failure chain.
    pub(crate) values: Vec<Vec<V>>,
    /// All states' transition slices, concatenated.
    pub(crate) transitions: Vec<Transition>,
    /// Start of each state's slice in `transitions`, plus a sentinel.
    pub(crate) offsets: Vec<u32>,
    /// Root dispatch table for ASCII input: entry `b` is the root's
    /// labeled transition on `b`, or a wildcard back to the root. Always
    /// 128 entries.
    pub(crate) root_ascii: Box<[Transition]>,
}

impl<V> AcAutomaton<V> {
    pub(crate) fn from_parts(
        values: Vec<Vec<V>>,
        transitions: Vec<Transition>,
        offsets: Vec<u32>,
        root_ascii: Box<[Transition]>,
    ) -> Self {
        debug_assert_eq!(offsets.len(), values.len() + 1);
        debug_assert_eq!(root_ascii.len(), 128);
        AcAutomaton {
            values,
            transitions,
            offsets,
            root_ascii,
        }
    }

    /// Number of states in the automaton. At least 1 (the root).
    #[inline]
    pub fn state_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Payloads reported when `state` is entered. May be empty.
    #[inline]
    pub fn values_at(&self, state: u32) -> &[V] {
        &self.values[state as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_word_size() {
        assert_eq!(mem::size_of::<Transition>(), 8);
        assert_eq!(mem::align_of::<Transition>(), 8);
    }

    #[test]
    fn test_labeled_layout() {
        let t = Transition::labeled(0x61, 7);
        assert!(!t.is_wildcard());
        assert_eq!(t.byte(), 0x61);
        assert_eq!(t.state(), 7);
        // bits 0-7 byte, bit 8 clear, bits 9-31 zero, bits 32-63 state
        assert_eq!(t.bits(), (7u64 << 32) | 0x61);
    }

    #[test]
    fn test_wildcard_layout() {
        let t = Transition::wildcard(3);
        assert!(t.is_wildcard());
        assert_eq!(t.byte(), 0);
        assert_eq!(t.state(), 3);
        assert_eq!(t.bits(), (3u64 << 32) | 0x100);
    }

    #[test]
    fn test_nul_byte_disambiguation() {
        // A labeled transition on 0x00 and a wildcard agree in the low 8
        // bits; only the flag bit tells them apart.
        let labeled = Transition::labeled(0x00, 5);
        let wildcard = Transition::wildcard(5);
        assert_eq!(labeled.byte(), wildcard.byte());
        assert!(!labeled.is_wildcard());
        assert!(wildcard.is_wildcard());
        assert_ne!(labeled.bits(), wildcard.bits());
    }

    #[test]
    fn test_bits_round_trip() {
        for t in [
            Transition::labeled(0xff, u32::MAX),
            Transition::wildcard(0),
            Transition::labeled(0, 1),
        ] {
            assert_eq!(Transition::from_bits(t.bits()), t);
        }
    }
}
