//! Partitioning of a block into conflict-free levels.

use crate::access::AccessSet;

/// Groups transactions into ordered levels of pairwise non-conflicting
/// transactions.
///
/// Transaction `i` lands one level above the highest earlier transaction it
/// conflicts with, but never below transaction `i - 1`.  Levels therefore
/// hold contiguous runs of the block, and reading them in order yields the
/// block order again.  Merging in that order makes the block gas pool run
/// out at exactly the same transaction as it would serially.
///
/// Quadratic in the number of transactions.
pub fn build_levels(sets: &[AccessSet]) -> Vec<Vec<usize>> {
    if sets.len() <= 1 {
        return serial_levels(sets.len());
    }

    let mut assigned: Vec<usize> = Vec::with_capacity(sets.len());
    for (i, set) in sets.iter().enumerate() {
        let floor = assigned.last().copied().unwrap_or(0);
        let above_conflicts = (0..i)
            .filter(|&j| set.conflicts(&sets[j]))
            .map(|j| assigned[j] + 1)
            .max()
            .unwrap_or(0);
        assigned.push(floor.max(above_conflicts));
    }

    let depth = assigned.last().map_or(0, |l| l + 1);
    let mut levels = vec![Vec::new(); depth];
    for (i, level) in assigned.into_iter().enumerate() {
        levels[level].push(i);
    }
    levels
}

/// One transaction per level.  Zero transactions still yield a single empty
/// level.
pub fn serial_levels(n: usize) -> Vec<Vec<usize>> {
    match n {
        0 => vec![Vec::new()],
        1 => vec![vec![0]],
        n => (0..n).map(|i| vec![i]).collect(),
    }
}
