//! Little-endian interchange format for packed automata
//!
//! A built [`AcAutomaton`] over `u32` payloads (needle ids, the
//! interchange case) can be flattened to bytes and reconstructed in
//! another process. The format is offset-free and alignment-free: a fixed
//! header followed by the automaton's arrays, every field little-endian.
//!
//! # Layout
//!
//! ```text
//! [Header: 32 bytes]
//! [offsets:        u32 x (state_count + 1)]
//! [value offsets:  u32 x (state_count + 1)]
//! [values:         u32 x value_count]
//! [transitions:    u64 x transition_count]
//! [root table:     u64 x 128]
//! ```
//!
//! Loading validates magic, version, counts, and the structural
//! invariants of the transition table before anything is trusted; a
//! buffer that passes behaves identically to the automaton it was saved
//! from. Saving is total.

use crate::automaton::{AcAutomaton, Transition};
use crate::error::{Error, Result};
use std::mem;
use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Magic bytes identifying the packed automaton format
pub const MAGIC: &[u8; 8] = b"NEEDLYAC";

/// Current format version
pub const VERSION: u32 = 1;

/// Transition word bits 9-31 must be zero.
const RESERVED_BITS: u64 = 0xffff_fe00;

/// Fixed-size header at the start of every saved automaton (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct Header {
    /// Magic bytes: "NEEDLYAC"
    magic: [u8; 8],
    /// Format version (currently 1)
    version: U32,
    /// Number of states
    state_count: U32,
    /// Total number of packed transitions
    transition_count: U32,
    /// Total number of payloads across all states
    value_count: U32,
    /// Reserved for future use (padding to 32 bytes)
    reserved: [u8; 8],
}

const _: () = assert!(mem::size_of::<Header>() == 32);
const _: () = assert!(mem::align_of::<Header>() == 1);

impl AcAutomaton<u32> {
    /// Flatten the automaton into the little-endian interchange format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let state_count = self.state_count();
        let value_count: usize = self.values.iter().map(Vec::len).sum();

        let header = Header {
            magic: *MAGIC,
            version: U32::new(VERSION),
            state_count: U32::new(state_count as u32),
            transition_count: U32::new(self.transitions.len() as u32),
            value_count: U32::new(value_count as u32),
            reserved: [0; 8],
        };

        let offsets: Vec<U32> = self.offsets.iter().map(|&o| U32::new(o)).collect();

        let mut value_offsets = Vec::with_capacity(state_count + 1);
        let mut total = 0u32;
        for per_state in &self.values {
            value_offsets.push(U32::new(total));
            total += per_state.len() as u32;
        }
        value_offsets.push(U32::new(total));

        let values: Vec<U32> = self.values.iter().flatten().map(|&v| U32::new(v)).collect();
        let transitions: Vec<U64> = self.transitions.iter().map(|t| U64::new(t.bits())).collect();
        let root_ascii: Vec<U64> = self.root_ascii.iter().map(|t| U64::new(t.bits())).collect();

        let mut out = Vec::with_capacity(
            mem::size_of::<Header>()
                + (offsets.len() + value_offsets.len() + values.len()) * 4
                + (transitions.len() + root_ascii.len()) * 8,
        );
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(offsets.as_bytes());
        out.extend_from_slice(value_offsets.as_bytes());
        out.extend_from_slice(values.as_bytes());
        out.extend_from_slice(transitions.as_bytes());
        out.extend_from_slice(root_ascii.as_bytes());
        out
    }

    /// Reconstruct an automaton saved by [`AcAutomaton::to_bytes`].
    ///
    /// The buffer is fully validated: bad magic, an unsupported version,
    /// truncation, trailing bytes, or a transition table violating the
    /// packed invariants (a slice not terminated by exactly one wildcard,
    /// a target out of range, reserved bits set, inconsistent offsets)
    /// are all rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, rest) = Header::read_from_prefix(bytes)
            .map_err(|_| Error::Format("buffer too small for header".to_string()))?;

        if &header.magic != MAGIC {
            return Err(Error::Format("invalid magic bytes".to_string()));
        }
        if header.version.get() != VERSION {
            return Err(Error::Format(format!(
                "unsupported version {} (expected {})",
                header.version.get(),
                VERSION
            )));
        }
        let state_count = header.state_count.get() as usize;
        let transition_count = header.transition_count.get() as usize;
        let value_count = header.value_count.get() as usize;
        if state_count == 0 {
            return Err(Error::Validation("automaton must have a root state".to_string()));
        }

        let (offsets, rest) = read_u32s(rest, state_count + 1, "transition offsets")?;
        let (value_offsets, rest) = read_u32s(rest, state_count + 1, "value offsets")?;
        let (flat_values, rest) = read_u32s(rest, value_count, "values")?;
        let (transition_words, rest) = read_u64s(rest, transition_count, "transitions")?;
        let (root_words, rest) = read_u64s(rest, 128, "root table")?;
        if !rest.is_empty() {
            return Err(Error::Format(format!("{} trailing bytes", rest.len())));
        }

        let offsets: Vec<u32> = offsets.iter().map(|o| o.get()).collect();
        if offsets[0] != 0 || offsets[state_count] as usize != transition_count {
            return Err(Error::Validation("transition offsets out of bounds".to_string()));
        }

        let transitions: Vec<Transition> = transition_words
            .iter()
            .map(|w| Transition::from_bits(w.get()))
            .collect();
        for transition in &transitions {
            if transition.bits() & RESERVED_BITS != 0 {
                return Err(Error::Validation("reserved transition bits set".to_string()));
            }
            if transition.state() as usize >= state_count {
                return Err(Error::Validation("transition target out of range".to_string()));
            }
        }
        for state in 0..state_count {
            let (start, end) = (offsets[state] as usize, offsets[state + 1] as usize);
            // Every state has at least its wildcard, and only as the
            // final slot of its slice
            if end <= start || end > transition_count {
                return Err(Error::Validation(format!("state {} has an empty slice", state)));
            }
            // The slice is non-empty by the check above
            let slice = &transitions[start..end];
            let wildcards = slice.iter().filter(|t| t.is_wildcard()).count();
            if wildcards != 1 || !slice[slice.len() - 1].is_wildcard() {
                return Err(Error::Validation(format!(
                    "state {} slice must end with exactly one wildcard",
                    state
                )));
            }
        }

        let root_ascii: Vec<Transition> = root_words
            .iter()
            .map(|w| Transition::from_bits(w.get()))
            .collect();
        for transition in &root_ascii {
            if transition.state() as usize >= state_count {
                return Err(Error::Validation("root table target out of range".to_string()));
            }
        }

        if value_offsets[0].get() != 0 || value_offsets[state_count].get() as usize != value_count {
            return Err(Error::Validation("value offsets out of bounds".to_string()));
        }
        let mut values = Vec::with_capacity(state_count);
        for state in 0..state_count {
            let (start, end) = (
                value_offsets[state].get() as usize,
                value_offsets[state + 1].get() as usize,
            );
            if start > end || end > value_count {
                return Err(Error::Validation("value offsets out of bounds".to_string()));
            }
            values.push(flat_values[start..end].iter().map(|v| v.get()).collect());
        }

        Ok(AcAutomaton::from_parts(
            values,
            transitions,
            offsets,
            root_ascii.into_boxed_slice(),
        ))
    }
}

fn read_u32s<'a>(bytes: &'a [u8], count: usize, section: &str) -> Result<(&'a [U32], &'a [u8])> {
    <[U32]>::ref_from_prefix_with_elems(bytes, count)
        .map_err(|_| Error::Format(format!("buffer too small for {}", section)))
}

fn read_u64s<'a>(bytes: &'a [u8], count: usize, section: &str) -> Result<(&'a [U64], &'a [u8])> {
    <[U64]>::ref_from_prefix_with_elems(bytes, count)
        .map_err(|_| Error::Format(format!("buffer too small for {}", section)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Next;

    fn sample() -> AcAutomaton<u32> {
        AcAutomaton::build(vec![
            (b"he".to_vec(), 0u32),
            (b"she".to_vec(), 1),
            (b"his".to_vec(), 2),
            (b"hers".to_vec(), 3),
            (b"\x00ab".to_vec(), 4),
        ])
    }

    fn run_pairs(ac: &AcAutomaton<u32>, haystack: &[u8]) -> Vec<(usize, u32)> {
        ac.run(haystack, Vec::new(), |mut acc, m| {
            acc.push((m.end_index, *m.value));
            Next::Step(acc)
        })
    }

    #[test]
    fn test_round_trip_is_identical() {
        let ac = sample();
        let loaded = AcAutomaton::from_bytes(&ac.to_bytes()).unwrap();
        assert_eq!(loaded, ac);
        assert_eq!(run_pairs(&loaded, b"ushers"), run_pairs(&ac, b"ushers"));
    }

    #[test]
    fn test_round_trip_empty_automaton() {
        let ac: AcAutomaton<u32> = AcAutomaton::build(Vec::<(Vec<u8>, u32)>::new());
        let loaded = AcAutomaton::from_bytes(&ac.to_bytes()).unwrap();
        assert_eq!(loaded, ac);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            AcAutomaton::<u32>::from_bytes(&bytes),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let mut bytes = sample().to_bytes();
        bytes[8] = 99;
        assert!(matches!(
            AcAutomaton::<u32>::from_bytes(&bytes),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_rejects_truncation_anywhere() {
        let bytes = sample().to_bytes();
        for len in [0, 16, bytes.len() / 2, bytes.len() - 1] {
            assert!(AcAutomaton::<u32>::from_bytes(&bytes[..len]).is_err());
        }
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = sample().to_bytes();
        bytes.push(0);
        assert!(matches!(
            AcAutomaton::<u32>::from_bytes(&bytes),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_target() {
        let ac = sample();
        let mut bytes = ac.to_bytes();
        // Point the root's first transition at a state that doesn't exist
        let transitions_at = mem::size_of::<Header>()
            + (ac.state_count() + 1) * 4 * 2
            + ac.values.iter().map(Vec::len).sum::<usize>() * 4;
        let word = u64::from(u32::MAX) << 32;
        bytes[transitions_at..transitions_at + 8].copy_from_slice(&word.to_le_bytes());
        assert!(matches!(
            AcAutomaton::<u32>::from_bytes(&bytes),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_reserved_bits() {
        let ac = sample();
        let mut bytes = ac.to_bytes();
        let transitions_at = mem::size_of::<Header>()
            + (ac.state_count() + 1) * 4 * 2
            + ac.values.iter().map(Vec::len).sum::<usize>() * 4;
        let word = ac.transitions[0].bits() | 0x200;
        bytes[transitions_at..transitions_at + 8].copy_from_slice(&word.to_le_bytes());
        assert!(matches!(
            AcAutomaton::<u32>::from_bytes(&bytes),
            Err(Error::Validation(_))
        ));
    }
}
