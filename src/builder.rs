//! Automaton construction
//!
//! Building is three passes over a temporary trie, then a packing step:
//!
//! 1. **Trie**: insert every needle byte by byte, allocating states for
//!    absent edges and recording the payload at the terminal state.
//! 2. **Failure links**: breadth-first from the root, so every state's
//!    parent has its link before the state is visited.
//! 3. **Output propagation**: in the same breadth-first order, append the
//!    failure target's payloads after the state's own, so a state reports
//!    its own needles first and inherited suffixes after.
//!
//! Packing then flattens the trie into the dense arrays of
//! [`AcAutomaton`], emitting each state's labeled edges byte-ascending
//! (for reproducible output) followed by its wildcard, and fills the root
//! ASCII dispatch table. The temporary trie is dropped as soon as packing
//! completes.

use crate::automaton::{AcAutomaton, Transition, ROOT};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Temporary trie state used during construction
struct TrieState<V> {
    edges: FxHashMap<u8, u32>,
    fail: u32,
    values: Vec<V>,
}

impl<V> TrieState<V> {
    fn new() -> Self {
        TrieState {
            edges: FxHashMap::default(),
            fail: ROOT,
            values: Vec::new(),
        }
    }
}

/// Walk the failure chain starting at `from` until a state with a labeled
/// edge on `byte` turns up, skipping `child` itself (the root can have a
/// labeled edge straight back to the state whose link is being computed).
fn fallback_target<V>(states: &[TrieState<V>], from: u32, byte: u8, child: u32) -> u32 {
    let mut state = from;
    loop {
        if let Some(&target) = states[state as usize].edges.get(&byte) {
            if target != child {
                return target;
            }
        }
        if state == ROOT {
            return ROOT;
        }
        state = states[state as usize].fail;
    }
}

impl<V: Clone> AcAutomaton<V> {
    /// Build an automaton from `(needle, payload)` pairs.
    ///
    /// Needles are arbitrary byte strings; payloads are opaque and come
    /// back verbatim on match. Duplicate needles are all retained, each
    /// occurrence reporting every payload in insertion order. An empty
    /// needle attaches its payload to the root, which makes every state a
    /// match state: the payload is reported once per consumed byte (or
    /// code point, under [`AcAutomaton::run_lower`]).
    ///
    /// Construction never fails. An empty needle set yields the one-state
    /// automaton that matches nothing.
    pub fn build<I, B>(needles: I) -> Self
    where
        I: IntoIterator<Item = (B, V)>,
        B: AsRef<[u8]>,
    {
        let mut states: Vec<TrieState<V>> = vec![TrieState::new()];

        // Pass 1: trie
        for (needle, value) in needles {
            let mut current = ROOT;
            for &byte in needle.as_ref() {
                if let Some(&next) = states[current as usize].edges.get(&byte) {
                    current = next;
                } else {
                    let next = states.len() as u32;
                    states.push(TrieState::new());
                    states[current as usize].edges.insert(byte, next);
                    current = next;
                }
            }
            states[current as usize].values.push(value);
        }

        // Pass 2: failure links, breadth-first. Depth-1 states keep the
        // root as their link; deeper states resolve through their
        // parent's link, which the BFS order guarantees is final.
        let mut queue: VecDeque<u32> = states[0].edges.values().copied().collect();
        let mut bfs_order = Vec::with_capacity(states.len() - 1);
        while let Some(state) = queue.pop_front() {
            bfs_order.push(state);
            let edges: Vec<(u8, u32)> = states[state as usize]
                .edges
                .iter()
                .map(|(&byte, &child)| (byte, child))
                .collect();
            for (byte, child) in edges {
                let fail = states[state as usize].fail;
                let target = fallback_target(&states, fail, byte, child);
                states[child as usize].fail = target;
                queue.push_back(child);
            }
        }

        // Pass 3: output propagation in the same order. The failure
        // target is strictly shallower, so its list is already complete.
        for &state in &bfs_order {
            let fail = states[state as usize].fail;
            if !states[fail as usize].values.is_empty() {
                let inherited = states[fail as usize].values.clone();
                states[state as usize].values.extend(inherited);
            }
        }

        // Packing
        let mut root_ascii = vec![Transition::wildcard(ROOT); 128];
        for (&byte, &target) in &states[0].edges {
            if byte < 0x80 {
                root_ascii[byte as usize] = Transition::labeled(byte, target);
            }
        }

        let edge_count: usize = states.iter().map(|s| s.edges.len()).sum();
        let mut values = Vec::with_capacity(states.len());
        let mut transitions = Vec::with_capacity(edge_count + states.len());
        let mut offsets = Vec::with_capacity(states.len() + 1);
        for state in states {
            offsets.push(transitions.len() as u32);
            let mut edges: Vec<(u8, u32)> = state.edges.into_iter().collect();
            edges.sort_unstable_by_key(|&(byte, _)| byte);
            transitions.extend(
                edges
                    .into_iter()
                    .map(|(byte, target)| Transition::labeled(byte, target)),
            );
            transitions.push(Transition::wildcard(state.fail));
            values.push(state.values);
        }
        offsets.push(transitions.len() as u32);

        AcAutomaton::from_parts(values, transitions, offsets, root_ascii.into_boxed_slice())
    }
}
