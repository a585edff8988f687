//! Validated permutation changes for ordered id lists.
//!
//! Used for floor order, room order per floor and media presets. Drag-and-drop
//! produces a whole new order ([`compute_reorder`]); the up/down buttons move
//! a single id ([`move_one_step`]).

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use crate::error::{StoreError, StoreResult};

/// Direction of a one-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0
    Up,
    /// Towards the end
    Down,
}

impl Direction {
    /// Maps the UI's `-1`/`+1` convention to a direction.
    pub fn from_step(step: i32) -> StoreResult<Self> {
        match step {
            -1 => Ok(Self::Up),
            1 => Ok(Self::Down),
            other => Err(StoreError::invalid(
                "direction",
                format!("expected -1 or +1, got {other}"),
            )),
        }
    }
}

/// The element a reorder moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedItem<T> {
    /// Id that moved
    pub id: T,
    /// Position before the reorder
    pub old_index: usize,
    /// Position after the reorder
    pub new_index: usize,
}

/// Outcome of a validated reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderResult<T> {
    /// The accepted order
    pub new_order: Vec<T>,
    /// The element whose position changed the most; `None` if nothing moved
    pub moved: Option<MovedItem<T>>,
}

impl<T> ReorderResult<T> {
    /// Whether the new order differs from the old one.
    pub const fn is_change(&self) -> bool {
        self.moved.is_some()
    }
}

/// Validates that `proposed` is a permutation of `current` and describes the move.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPermutation`] on a size mismatch, a duplicate
/// or an id that is not in `current`.
pub fn compute_reorder<T>(current: &[T], proposed: &[T]) -> StoreResult<ReorderResult<T>>
where
    T: Clone + Eq + Hash + Display,
{
    if current.len() != proposed.len() {
        return Err(StoreError::permutation(format!(
            "expected {} ids, got {}",
            current.len(),
            proposed.len()
        )));
    }

    let known: HashSet<&T> = current.iter().collect();
    let mut seen = HashSet::with_capacity(proposed.len());
    for id in proposed {
        if !known.contains(id) {
            return Err(StoreError::permutation(format!("foreign id {id}")));
        }
        if !seen.insert(id) {
            return Err(StoreError::permutation(format!("duplicate id {id}")));
        }
    }

    // Largest displacement wins; ties go to the lowest new index.
    let mut moved: Option<MovedItem<T>> = None;
    let mut best = 0usize;
    for (new_index, id) in proposed.iter().enumerate() {
        let Some(old_index) = current.iter().position(|other| other == id) else {
            continue;
        };
        let displacement = old_index.abs_diff(new_index);
        if displacement > best {
            best = displacement;
            moved = Some(MovedItem {
                id: id.clone(),
                old_index,
                new_index,
            });
        }
    }

    Ok(ReorderResult {
        new_order: proposed.to_vec(),
        moved,
    })
}

/// Swaps `id` with its neighbour in `direction`.
///
/// Returns the input unchanged when `id` is already at that boundary or is
/// not in `order`.
pub fn move_one_step<T>(order: &[T], id: &T, direction: Direction) -> Vec<T>
where
    T: Clone + PartialEq,
{
    let mut result = order.to_vec();
    let Some(index) = order.iter().position(|other| other == id) else {
        return result;
    };
    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < order.len() => index + 1,
        _ => return result,
    };
    result.swap(index, target);
    result
}

/// Effective display order: stored ids that are still known, followed by the
/// known ids the stored order does not mention, in `known` order.
pub fn effective_order<T>(stored: &[T], known: &[T]) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let known_set: HashSet<&T> = known.iter().collect();
    let mut seen = HashSet::with_capacity(known.len());
    let mut order: Vec<T> = stored
        .iter()
        .filter(|id| known_set.contains(id) && seen.insert(*id))
        .cloned()
        .collect();
    order.extend(known.iter().filter(|id| !seen.contains(id)).cloned());
    order
}
