//! Range coalescing.
//!
//! Range-based selection models are cheapest to drive with as few range calls
//! as possible, so runs of adjacent indices are merged before being sent.

/// Merges a sorted, ascending list of distinct indices into the minimal list
/// of inclusive `(start, end)` ranges.
///
/// ```
/// use regolith::model::coalesce;
///
/// assert_eq!(coalesce(&[1, 2, 3, 7, 8, 10]), vec![(1, 3), (7, 8), (10, 10)]);
/// assert!(coalesce(&[]).is_empty());
/// ```
pub fn coalesce(indices: &[usize]) -> Vec<(usize, usize)> {
    debug_assert!(
        indices.windows(2).all(|w| w[0] < w[1]),
        "coalesce expects strictly ascending indices"
    );

    let mut ranges = Vec::new();
    let Some((&first, rest)) = indices.split_first() else {
        return ranges;
    };

    let (mut start, mut end) = (first, first);
    for &index in rest {
        if index == end + 1 {
            end = index;
        } else {
            ranges.push((start, end));
            start = index;
            end = index;
        }
    }
    ranges.push((start, end));
    ranges
}

/// Sorts and deduplicates `indices` in place, then coalesces them.
pub fn coalesce_unsorted(indices: &mut Vec<usize>) -> Vec<(usize, usize)> {
    indices.sort_unstable();
    indices.dedup();
    coalesce(indices)
}
