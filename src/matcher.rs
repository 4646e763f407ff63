//! Matching loops
//!
//! Both matchers drive the packed automaton with a single fused loop:
//! consume input, look up a transition (chasing failure links through
//! each slice's terminating wildcard), collect the entered state's
//! payloads through the caller's reducer. There is no per-step dispatch
//! beyond that loop; the conceptual states of the machine live in two
//! locals (`state`, `at`).
//!
//! The reducer is in charge of the accumulator and of termination: return
//! [`Next::Step`] to continue, [`Next::Done`] to stop the scan on the
//! spot, even partway through one state's payload list. The matchers
//! allocate nothing and hand out payloads by reference.

use crate::automaton::{AcAutomaton, ROOT};
use crate::utf8;
use serde::{Deserialize, Serialize};

/// Whether a search folds input to lowercase while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSensitivity {
    /// Match needle bytes exactly
    CaseSensitive,
    /// Fold each input code point to lowercase on the fly; needles must
    /// already be lowercased
    IgnoreCase,
}

/// One reported needle occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match<V> {
    /// Offset one past the occurrence's last byte, relative to the start
    /// of the haystack slice
    pub end_index: usize,
    /// The payload registered with the needle
    pub value: V,
}

/// Reducer verdict after each reported match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Next<A> {
    /// Keep scanning with this accumulator
    Step(A),
    /// Stop immediately and return this accumulator
    Done(A),
}

impl<V> AcAutomaton<V> {
    /// Scan `haystack` case-sensitively, folding `step` over every
    /// occurrence in end-position order.
    ///
    /// Occurrences are reported as their last byte is consumed; several
    /// needles ending at the same position are reported in the state's
    /// payload order, needles terminating at the state before needles
    /// inherited along the failure chain. The final accumulator is
    /// returned, whether the scan ran to the end of the haystack or the
    /// reducer cut it short with [`Next::Done`].
    ///
    /// # Example
    /// ```
    /// use needly::{AcAutomaton, Next};
    ///
    /// let ac = AcAutomaton::build(vec![("he", 1), ("she", 2), ("his", 3), ("hers", 4)]);
    /// let found = ac.run(b"ushers", Vec::new(), |mut acc, m| {
    ///     acc.push((m.end_index, *m.value));
    ///     Next::Step(acc)
    /// });
    /// assert_eq!(found, vec![(3, 2), (3, 1), (6, 4)]);
    /// ```
    pub fn run<'a, A, F>(&'a self, haystack: &[u8], seed: A, mut step: F) -> A
    where
        F: FnMut(A, Match<&'a V>) -> Next<A>,
    {
        let mut acc = seed;
        let mut state = ROOT;
        let mut at = 0;
        while at < haystack.len() {
            let byte = haystack[at];
            state = if state == ROOT && byte < 0x80 {
                // Wildcard entries in the root table encode state 0, so
                // the dispatch is one unconditional read.
                self.root_ascii[byte as usize].state()
            } else {
                self.next_state(state, byte)
            };
            at += 1;
            let values = self.values_at(state);
            if !values.is_empty() {
                for value in values {
                    acc = match step(acc, Match {
                        end_index: at,
                        value,
                    }) {
                        Next::Step(next) => next,
                        Next::Done(done) => return done,
                    };
                }
            }
        }
        acc
    }

    /// Scan `haystack` with on-the-fly lowercasing, folding `step` over
    /// every occurrence of the (already lowercased) needles.
    ///
    /// Each input code point is decoded, folded to lowercase, re-encoded,
    /// and fed to the automaton byte by byte; the haystack itself is
    /// never copied. `end_index` always refers to the original input:
    /// the offset just past the code point whose bytes completed the
    /// occurrence, even when folding changed the code point's encoded
    /// length. Matches are reported between code points, never inside
    /// one.
    ///
    /// Needles containing uppercase code units can never match; build
    /// from lowercased needles (or use [`crate::Searcher`], which
    /// lowercases for you). The haystack should be well-formed UTF-8;
    /// malformed bytes are classified by their lead byte and produce no
    /// meaningful matches, but the scan never reads out of bounds.
    ///
    /// # Example
    /// ```
    /// use needly::{AcAutomaton, Next};
    ///
    /// let ac = AcAutomaton::build(vec![("café", 1)]);
    /// let found = ac.run_lower("A CAFÉ".as_bytes(), Vec::new(), |mut acc, m| {
    ///     acc.push(m.end_index);
    ///     Next::Step(acc)
    /// });
    /// assert_eq!(found, vec![7]);
    /// ```
    pub fn run_lower<'a, A, F>(&'a self, haystack: &[u8], seed: A, mut step: F) -> A
    where
        F: FnMut(A, Match<&'a V>) -> Next<A>,
    {
        let mut acc = seed;
        let mut state = ROOT;
        let mut at = 0;
        while at < haystack.len() {
            let (code_point, width) = utf8::decode_code_point(haystack, at);
            at += width;
            let mut queue = utf8::encode_queue(utf8::to_lower_code_point(code_point));
            // First byte unconditionally: a folded NUL is the all-zero
            // queue word, not an empty queue.
            loop {
                let byte = (queue & 0xff) as u8;
                queue >>= 8;
                state = if state == ROOT && byte < 0x80 {
                    self.root_ascii[byte as usize].state()
                } else {
                    self.next_state(state, byte)
                };
                if queue == 0 {
                    break;
                }
            }
            let values = self.values_at(state);
            if !values.is_empty() {
                for value in values {
                    acc = match step(acc, Match {
                        end_index: at,
                        value,
                    }) {
                        Next::Step(next) => next,
                        Next::Done(done) => return done,
                    };
                }
            }
        }
        acc
    }

    /// Dispatch to [`AcAutomaton::run`] or [`AcAutomaton::run_lower`].
    pub fn run_with_case<'a, A, F>(
        &'a self,
        case: CaseSensitivity,
        haystack: &[u8],
        seed: A,
        step: F,
    ) -> A
    where
        F: FnMut(A, Match<&'a V>) -> Next<A>,
    {
        match case {
            CaseSensitivity::CaseSensitive => self.run(haystack, seed, step),
            CaseSensitivity::IgnoreCase => self.run_lower(haystack, seed, step),
        }
    }

    /// Advance from `state` on `byte`, chasing failure links until a
    /// labeled edge matches or the root gives up.
    #[inline]
    fn next_state(&self, mut state: u32, byte: u8) -> u32 {
        let mut at = self.offsets[state as usize] as usize;
        loop {
            let transition = self.transitions[at];
            if transition.is_wildcard() {
                if state == ROOT {
                    // The root swallows unmatched bytes
                    return ROOT;
                }
                // Fall back and retry the same byte from there
                state = transition.state();
                at = self.offsets[state as usize] as usize;
            } else if transition.byte() == byte {
                return transition.state();
            } else {
                at += 1;
            }
        }
    }
}
