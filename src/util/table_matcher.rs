//! Dense transition-table matcher over sorted, deterministic automata.
//!
//! Adapts an input-deterministic, epsilon-free acceptor into a flat
//! `states x labels` table so symbol-table lookups cost O(1) for labels
//! below the cache size and O(log |labels|) otherwise. A state may carry a
//! rho (fallback) arc, taken when no explicit label matches.

use std::collections::BTreeSet;

/// Dense state identifier.
pub type StateId = u32;

/// Transition label. `fst`-built automata use byte labels; rho sentinels
/// live above the byte range.
pub type Label = u32;

/// "No transition" sentinel.
pub const NO_STATE: StateId = u32::MAX;

/// A single automaton transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Input label.
    pub label: Label,
    /// Target state.
    pub target: StateId,
}

/// A sorted, input-deterministic, epsilon-free acceptor.
///
/// `transitions(state)` must be sorted by label with no duplicates.
pub trait Fsa {
    /// Number of states; ids are dense in `0..num_states`.
    fn num_states(&self) -> usize;

    /// The start state.
    fn start(&self) -> StateId;

    /// Outgoing transitions of `state`, sorted by label.
    fn transitions(&self, state: StateId) -> &[Transition];

    /// Whether `state` is accepting.
    fn is_final(&self, state: StateId) -> bool;
}

/// An [`Fsa`] materialized from an [`fst::raw::Fst`] with dense state ids.
///
/// States are discovered breadth-first from the root, so the start state is
/// always 0.
#[derive(Debug, Clone)]
pub struct DenseFsa {
    transitions: Vec<Vec<Transition>>,
    finals: Vec<bool>,
}

impl DenseFsa {
    /// Flatten an fst automaton into dense states.
    pub fn from_fst<D: AsRef<[u8]>>(fst: &fst::raw::Fst<D>) -> Self {
        use std::collections::VecDeque;

        let mut ids = ahash::AHashMap::new();
        let mut transitions: Vec<Vec<Transition>> = Vec::new();
        let mut finals: Vec<bool> = Vec::new();
        let mut queue = VecDeque::new();

        let root = fst.root();
        ids.insert(root.addr(), 0 as StateId);
        transitions.push(Vec::new());
        finals.push(root.is_final());
        queue.push_back(root.addr());

        while let Some(addr) = queue.pop_front() {
            let state = ids[&addr];
            let node = fst.node(addr);
            let mut arcs = Vec::with_capacity(node.len());
            for t in node.transitions() {
                let target = *ids.entry(t.addr).or_insert_with(|| {
                    let id = transitions.len() as StateId;
                    transitions.push(Vec::new());
                    finals.push(fst.node(t.addr).is_final());
                    queue.push_back(t.addr);
                    id
                });
                arcs.push(Transition {
                    label: t.inp as Label,
                    target,
                });
            }
            transitions[state as usize] = arcs;
        }

        DenseFsa {
            transitions,
            finals,
        }
    }

    /// Build directly from per-state sorted transition lists.
    pub fn from_parts(transitions: Vec<Vec<Transition>>, finals: Vec<bool>) -> Self {
        debug_assert_eq!(transitions.len(), finals.len());
        DenseFsa {
            transitions,
            finals,
        }
    }
}

impl Fsa for DenseFsa {
    fn num_states(&self) -> usize {
        self.transitions.len()
    }

    fn start(&self) -> StateId {
        0
    }

    fn transitions(&self, state: StateId) -> &[Transition] {
        &self.transitions[state as usize]
    }

    fn is_final(&self, state: StateId) -> bool {
        self.finals[state as usize]
    }
}

/// Dense lookup table over an [`Fsa`], monomorphized per rho label and
/// cache size.
///
/// Construction enumerates the sorted set of labels used anywhere in the
/// automaton, allocates a `states x labels` table, fills each row carrying
/// a rho arc with the rho target and overwrites explicit arcs on top. The
/// first `CACHE_SIZE` labels resolve their column through a flat array;
/// larger labels binary-search the label set.
///
/// # Examples
///
/// ```
/// use sagitta::util::table_matcher::{DenseFsa, Fsa, TableMatcher, Transition, NO_STATE};
///
/// let fsa = DenseFsa::from_parts(
///     vec![
///         vec![Transition { label: b'a' as u32, target: 1 }],
///         vec![],
///     ],
///     vec![false, true],
/// );
/// let mut matcher = TableMatcher::<{ u32::MAX }, 256>::new(&fsa);
///
/// matcher.set_state(fsa.start());
/// assert_eq!(matcher.find(b'a' as u32), 1);
/// assert_eq!(matcher.find(b'b' as u32), NO_STATE);
/// ```
#[derive(Debug, Clone)]
pub struct TableMatcher<const RHO: u32, const CACHE_SIZE: usize> {
    labels: Vec<Label>,
    table: Vec<StateId>,
    cached_offsets: [usize; CACHE_SIZE],
    finals: Vec<bool>,
    start: StateId,
    row: usize,
}

impl<const RHO: u32, const CACHE_SIZE: usize> TableMatcher<RHO, CACHE_SIZE> {
    /// Build the transition table for `fsa`.
    pub fn new(fsa: &impl Fsa) -> Self {
        let mut label_set = BTreeSet::new();
        for state in 0..fsa.num_states() {
            for t in fsa.transitions(state as StateId) {
                label_set.insert(t.label);
            }
        }
        let labels: Vec<Label> = label_set.into_iter().collect();

        let num_labels = labels.len();
        let mut table = vec![NO_STATE; fsa.num_states() * num_labels];
        let mut finals = vec![false; fsa.num_states()];

        for state in 0..fsa.num_states() {
            let row = state * num_labels;
            finals[state] = fsa.is_final(state as StateId);

            let arcs = fsa.transitions(state as StateId);
            if let Some(last) = arcs.last() {
                if last.label == RHO {
                    table[row..row + num_labels].fill(last.target);
                }
            }
            for t in arcs {
                let offset = labels.binary_search(&t.label).expect("label enumerated");
                table[row + offset] = t.target;
            }
        }

        // Column lookup for small labels, one merge pass instead of a
        // binary search per slot.
        let mut cached_offsets = [num_labels; CACHE_SIZE];
        let mut offset = 0;
        for (label, slot) in cached_offsets.iter_mut().enumerate() {
            if offset < num_labels && labels[offset] == label as Label {
                *slot = offset;
                offset += 1;
            }
        }

        TableMatcher {
            labels,
            table,
            cached_offsets,
            finals,
            start: fsa.start(),
            row: fsa.start() as usize * num_labels,
        }
    }

    /// The automaton's start state.
    pub fn start(&self) -> StateId {
        self.start
    }

    /// Position the matcher at `state`.
    pub fn set_state(&mut self, state: StateId) {
        debug_assert!((state as usize) < self.finals.len());
        self.row = state as usize * self.labels.len();
    }

    /// Resolve `label` from the current state.
    ///
    /// Returns the target state, the rho target when the label is unknown
    /// and the state carries a rho arc, or [`NO_STATE`].
    pub fn find(&self, label: Label) -> StateId {
        self.resolve(self.row, label)
    }

    /// Resolve `label` from `state` without touching the cursor.
    pub fn transition(&self, state: StateId, label: Label) -> StateId {
        self.resolve(state as usize * self.labels.len(), label)
    }

    fn resolve(&self, row: usize, label: Label) -> StateId {
        let mut offset = if (label as usize) < CACHE_SIZE {
            self.cached_offsets[label as usize]
        } else {
            self.find_label_offset(label)
        };

        if offset == self.labels.len() {
            match self.labels.last() {
                Some(&last) if last == RHO => offset = self.labels.len() - 1,
                _ => return NO_STATE,
            }
        }

        self.table[row + offset]
    }

    /// Whether `state` is accepting.
    pub fn is_final(&self, state: StateId) -> bool {
        self.finals[state as usize]
    }

    fn find_label_offset(&self, label: Label) -> usize {
        match self.labels.binary_search(&label) {
            Ok(offset) => offset,
            Err(_) => self.labels.len(),
        }
    }
}
