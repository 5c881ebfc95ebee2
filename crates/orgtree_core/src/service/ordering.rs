//! Sibling rank arithmetic shared by menu and member operations.
//!
//! Inputs are `(id, order)` pairs already sorted by `order ASC, id ASC`.

use crate::model::menu::Direction;
use crate::model::validation::{ensure_order, ValidationError};

/// Rank for a newly appended sibling: `max + 1`, or 1 when there are none.
///
/// Fails when the highest rank is already at the ceiling.
pub(crate) fn next_order(
    orders: impl IntoIterator<Item = i64>,
) -> Result<i64, ValidationError> {
    let max = orders.into_iter().max().unwrap_or(0);
    let next = max
        .checked_add(1)
        .ok_or(ValidationError::InvalidOrder(max))?;
    ensure_order(next)
}

/// Rank changes that place `id` at `new_order`.
///
/// A sibling already holding `new_order` takes over `id`'s current rank.
pub(crate) fn reorder_changes<T: Copy + PartialEq>(
    id: T,
    current_order: i64,
    new_order: i64,
    siblings: &[(T, i64)],
) -> Vec<(T, i64)> {
    if current_order == new_order {
        return Vec::new();
    }
    let mut changes = vec![(id, new_order)];
    if let Some((holder, _)) = siblings
        .iter()
        .find(|(candidate, order)| *candidate != id && *order == new_order)
    {
        changes.push((*holder, current_order));
    }
    changes
}

/// Rank changes swapping `id` with its neighbour in `direction`.
///
/// Empty at the boundary or when `id` is not among `ranked`.
pub(crate) fn swap_changes<T: Copy + PartialEq>(
    id: T,
    direction: Direction,
    ranked: &[(T, i64)],
) -> Vec<(T, i64)> {
    let Some(index) = ranked.iter().position(|(candidate, _)| *candidate == id) else {
        return Vec::new();
    };
    let target = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1),
    };
    let Some((neighbour, neighbour_order)) = target.and_then(|i| ranked.get(i)).copied() else {
        return Vec::new();
    };
    let current_order = ranked[index].1;
    vec![(id, neighbour_order), (neighbour, current_order)]
}

#[cfg(test)]
mod tests {
    use super::{next_order, reorder_changes, swap_changes};
    use crate::model::menu::Direction;
    use crate::model::validation::{ValidationError, MAX_ORDER};

    #[test]
    fn next_order_starts_at_one() {
        assert_eq!(next_order(Vec::new()), Ok(1));
        assert_eq!(next_order(vec![1, 4, 2]), Ok(5));
    }

    #[test]
    fn next_order_refuses_to_pass_the_ceiling() {
        assert_eq!(
            next_order(vec![1, MAX_ORDER]),
            Err(ValidationError::InvalidOrder(MAX_ORDER + 1))
        );
        assert_eq!(
            next_order(vec![i64::MAX]),
            Err(ValidationError::InvalidOrder(i64::MAX))
        );
    }

    #[test]
    fn reorder_swaps_with_rank_holder() {
        let siblings = [('a', 1), ('b', 2), ('c', 3)];
        assert_eq!(reorder_changes('c', 3, 1, &siblings), vec![('c', 1), ('a', 3)]);
        assert_eq!(reorder_changes('a', 1, 7, &siblings), vec![('a', 7)]);
        assert!(reorder_changes('b', 2, 2, &siblings).is_empty());
    }

    #[test]
    fn swap_is_noop_at_boundaries() {
        let ranked = [('a', 1), ('b', 2), ('c', 5)];
        assert!(swap_changes('a', Direction::Up, &ranked).is_empty());
        assert!(swap_changes('c', Direction::Down, &ranked).is_empty());
        assert!(swap_changes('z', Direction::Down, &ranked).is_empty());
        assert_eq!(
            swap_changes('c', Direction::Up, &ranked),
            vec![('c', 2), ('b', 5)]
        );
    }
}
