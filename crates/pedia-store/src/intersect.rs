//! Sorted merge-join over slot lists.

use crate::record::Slot;

/// Slots present in both ascending lists, in ascending order.
///
/// Both inputs must be strictly ascending; the walk advances whichever side
/// holds the smaller slot, so it runs in `O(a.len() + b.len())`.
pub fn intersect_sorted(a: &[Slot], b: &[Slot]) -> Vec<Slot> {
    debug_assert!(is_strictly_ascending(a));
    debug_assert!(is_strictly_ascending(b));

    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

pub fn is_strictly_ascending(slots: &[Slot]) -> bool {
    slots.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(raw: &[usize]) -> Vec<Slot> {
        raw.iter().copied().map(Slot).collect()
    }

    #[test]
    fn intersects_interleaved_lists() {
        let a = slots(&[0, 2, 3, 7, 9, 12]);
        let b = slots(&[1, 2, 7, 8, 12, 15]);
        assert_eq!(intersect_sorted(&a, &b), slots(&[2, 7, 12]));
    }

    #[test]
    fn disjoint_and_empty_inputs() {
        assert!(intersect_sorted(&slots(&[0, 2, 4]), &slots(&[1, 3, 5])).is_empty());
        assert!(intersect_sorted(&[], &slots(&[1])).is_empty());
        assert!(intersect_sorted(&slots(&[1]), &[]).is_empty());
    }

    #[test]
    fn identical_lists_intersect_to_themselves() {
        let a = slots(&[3, 4, 5]);
        assert_eq!(intersect_sorted(&a, &a), a);
    }

    #[test]
    fn ascending_check() {
        assert!(is_strictly_ascending(&slots(&[1, 2, 9])));
        assert!(!is_strictly_ascending(&slots(&[1, 1])));
        assert!(!is_strictly_ascending(&slots(&[2, 1])));
        assert!(is_strictly_ascending(&[]));
    }
}
