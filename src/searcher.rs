//! Needle-set searcher
//!
//! A thin convenience layer over [`AcAutomaton`]: it remembers the
//! [`CaseSensitivity`] the needles were registered under, lowercases them
//! at build time when matching should ignore case (the automaton's
//! [`AcAutomaton::run_lower`] contract), and offers collect-style and
//! containment queries for callers that don't need a custom reducer.

use crate::automaton::AcAutomaton;
use crate::matcher::{CaseSensitivity, Match, Next};
use crate::utf8;
use serde::{Deserialize, Serialize};

/// A needle set bound to a case sensitivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Searcher<V> {
    automaton: AcAutomaton<V>,
    case: CaseSensitivity,
}

impl<V: Clone> Searcher<V> {
    /// Build a searcher from `(needle, payload)` pairs.
    ///
    /// Under [`CaseSensitivity::IgnoreCase`] every needle is lowercased
    /// before insertion, with the same per-code-point fold the matcher
    /// applies to the haystack, so needles may arrive in any case.
    ///
    /// # Example
    /// ```
    /// use needly::{CaseSensitivity, Searcher};
    ///
    /// let searcher = Searcher::build(
    ///     CaseSensitivity::IgnoreCase,
    ///     vec![("Rust", "language"), ("CAFÉ", "drink")],
    /// );
    /// let found = searcher.find_all("No café, no Rust.".as_bytes());
    /// assert_eq!(found.len(), 2);
    /// assert_eq!(*found[0].value, "drink");
    /// assert_eq!(*found[1].value, "language");
    /// ```
    pub fn build<I, B>(case: CaseSensitivity, needles: I) -> Self
    where
        I: IntoIterator<Item = (B, V)>,
        B: AsRef<[u8]>,
    {
        let automaton = match case {
            CaseSensitivity::CaseSensitive => AcAutomaton::build(needles),
            CaseSensitivity::IgnoreCase => AcAutomaton::build(
                needles
                    .into_iter()
                    .map(|(needle, value)| (lower_needle(needle.as_ref()), value)),
            ),
        };
        Searcher { automaton, case }
    }
}

impl<V> Searcher<V> {
    /// The underlying packed automaton.
    pub fn automaton(&self) -> &AcAutomaton<V> {
        &self.automaton
    }

    /// The case sensitivity the needles were registered under.
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Collect every occurrence in `haystack`, in end-position order.
    pub fn find_all(&self, haystack: &[u8]) -> Vec<Match<&V>> {
        self.automaton
            .run_with_case(self.case, haystack, Vec::new(), |mut acc, m| {
                acc.push(m);
                Next::Step(acc)
            })
    }

    /// Does any needle occur in `haystack`? Stops at the first match.
    pub fn contains_any(&self, haystack: &[u8]) -> bool {
        self.automaton
            .run_with_case(self.case, haystack, false, |_, _| Next::Done(true))
    }
}

/// Lowercase a needle code point by code point, matching the fold the
/// case-insensitive matcher applies to its input.
fn lower_needle(needle: &[u8]) -> Vec<u8> {
    let mut lowered = Vec::with_capacity(needle.len());
    let mut at = 0;
    while at < needle.len() {
        let (code_point, width) = utf8::decode_code_point(needle, at);
        at += width;
        let mut queue = utf8::encode_queue(utf8::to_lower_code_point(code_point));
        loop {
            lowered.push((queue & 0xff) as u8);
            queue >>= 8;
            if queue == 0 {
                break;
            }
        }
    }
    lowered
}
