//! Needly - Fast Multi-Pattern String Search
//!
//! Needly finds every occurrence of a fixed set of byte needles in UTF-8
//! text in one pass, Aho-Corasick style. Each needle carries an arbitrary
//! payload that comes back on match, and results are delivered through a
//! caller-supplied reducer instead of an allocated match list, so the
//! scanning loop itself never allocates. Matching is either exact or
//! case-insensitive with the input folded to lowercase on the fly.
//!
//! # Quick Start
//!
//! ```rust
//! use needly::{CaseSensitivity, Next, Searcher};
//!
//! // Needles with payloads; the searcher lowercases them for IgnoreCase
//! let searcher = Searcher::build(
//!     CaseSensitivity::IgnoreCase,
//!     vec![("error", "red"), ("WARNING", "yellow")],
//! );
//!
//! for m in searcher.find_all(b"Warning: parse error at line 3") {
//!     println!("{} ends at byte {}", m.value, m.end_index);
//! }
//!
//! // Or drive the automaton directly with a reducer
//! let count = searcher
//!     .automaton()
//!     .run_lower(b"error, error", 0u32, |n, _| Next::Step(n + 1));
//! assert_eq!(count, 2);
//! ```
//!
//! # Key Features
//!
//! - **One pass, many needles**: amortized linear scan regardless of
//!   needle count, matches reported in end-position order
//! - **Payload-carrying**: every needle owns an opaque value, returned by
//!   reference on each occurrence
//! - **Fold-as-you-go case insensitivity**: no lowercased copy of the
//!   haystack, original byte offsets in every report
//! - **Reducer-driven**: the caller owns the accumulator and can stop the
//!   scan at any match
//! - **Shareable**: a built automaton is immutable and can serve any
//!   number of threads at once
//! - **Portable bytes**: automata over `u32` payloads round-trip through
//!   a validated little-endian binary format
//!
//! # Architecture
//!
//! ```text
//! needles ──> Builder (trie + failure links + output sets)
//!                 │ packs into
//!                 ▼
//!         ┌──────────────────────────────────────┐
//!         │  AcAutomaton (immutable)             │
//!         │  values / transitions / offsets /    │
//!         │  root ASCII dispatch table           │
//!         └──────────────────────────────────────┘
//!                 │ drives
//!                 ▼
//!         run / run_lower ──reducer──> accumulator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod automaton;
/// Little-endian interchange format for packed automata
pub mod binary;
mod builder;
/// Error types for needly operations
pub mod error;
pub mod matcher;
pub mod searcher;
pub mod utf8;

// Re-exports for the common surface

/// Packed automaton and its transition word
pub use crate::automaton::{AcAutomaton, Transition};

pub use crate::error::{Error, Result};
pub use crate::matcher::{CaseSensitivity, Match, Next};
pub use crate::searcher::Searcher;
