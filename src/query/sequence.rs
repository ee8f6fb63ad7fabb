//! Ordered match state machine.
//!
//! Given one position list per query slot, computes the longest ordered
//! (not necessarily contiguous) subsequence of slots realized by ascending
//! positions within a document, and how many disjoint times it occurs.

/// Result of matching one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceMatch {
    /// Length of the longest ordered subsequence of slots.
    pub len: u32,
    /// Number of disjoint realizations of that length.
    pub freq: u64,
}

/// Best match ending at one slot: smallest ending position for the best
/// length seen so far. `len == 0` means unset.
#[derive(Clone, Copy)]
struct SlotBest {
    end: u64,
    len: u32,
}

/// Longest ordered subsequence over positions `>= cutoff`.
///
/// Returns the length and the smallest ending position among slots
/// achieving it (the earliest-ending realization).
fn longest(slots: &[&[u64]], cutoff: u64) -> (u32, u64) {
    let n = slots.len();
    let mut cursor: Vec<usize> = slots
        .iter()
        .map(|positions| positions.partition_point(|&p| p < cutoff))
        .collect();
    let mut best = vec![SlotBest { end: 0, len: 0 }; n];

    // Merged ascending scan over (position, slot) events; equal positions
    // resolve in slot order so a duplicated slot never chains onto the
    // position it is itself consuming.
    loop {
        let mut slot = usize::MAX;
        let mut position = u64::MAX;
        for (j, positions) in slots.iter().enumerate() {
            if cursor[j] < positions.len() && positions[cursor[j]] < position {
                position = positions[cursor[j]];
                slot = j;
            }
        }
        if slot == usize::MAX {
            break;
        }
        cursor[slot] += 1;

        // Extend the longest chain over earlier slots that ended strictly
        // before this position.
        let mut len = 1;
        for prior in &best[..slot] {
            if prior.len > 0 && prior.end < position && prior.len + 1 > len {
                len = prior.len + 1;
            }
        }
        if len > best[slot].len || (len == best[slot].len && position < best[slot].end) {
            best[slot] = SlotBest {
                end: position,
                len,
            };
        }
    }

    let len = best.iter().map(|b| b.len).max().unwrap_or(0);
    if len == 0 {
        return (0, u64::MAX);
    }
    let end = best
        .iter()
        .filter(|b| b.len == len)
        .map(|b| b.end)
        .min()
        .expect("some slot achieves the maximum");
    (len, end)
}

/// Match one document: longest ordered subsequence plus its disjoint
/// occurrence count.
///
/// Each repetition must be built from positions strictly past the previous
/// realization's endpoint, so no position is consumed twice.
///
/// # Examples
///
/// ```
/// use sagitta::query::sequence::match_slots;
///
/// // Query slots a, b over positions of a document "a b a b".
/// let a = [0, 2];
/// let b = [1, 3];
/// let result = match_slots(&[&a, &b]);
/// assert_eq!(result.len, 2);
/// assert_eq!(result.freq, 2);
/// ```
pub fn match_slots(slots: &[&[u64]]) -> SequenceMatch {
    let (target, first_end) = longest(slots, 0);
    if target == 0 {
        return SequenceMatch { len: 0, freq: 0 };
    }

    let mut freq = 1;
    let mut end = first_end;
    loop {
        let (len, next_end) = longest(slots, end + 1);
        if len < target {
            break;
        }
        freq += 1;
        end = next_end;
    }

    SequenceMatch { len: target, freq }
}
