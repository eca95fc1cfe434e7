//! Cursor-based navigation and deletion over a [`BoundSet`]
//!
//! The cursor is a small value. Every operation takes the current cursor and
//! returns the next one, so the caller always sees exactly which selection an
//! edit invalidated.

use crate::error::{BoundsError, BoundsResult, Level};

use super::bound_set::BoundSet;
use super::sphere::StructureSphere;

/// Which coarse and fine sphere the user currently has selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Selected coarse position
    pub coarse: Option<usize>,
    /// Selected fine position
    pub fine: Option<usize>,
}

impl Cursor {
    /// Nothing selected
    pub const NONE: Cursor = Cursor { coarse: None, fine: None };

    /// Cursor with both selections set
    pub fn at(coarse: Option<usize>, fine: Option<usize>) -> Self {
        Self { coarse, fine }
    }
}

/// Direction of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Towards higher indices
    Forward,
    /// Towards lower indices
    Backward,
}

impl Step {
    /// Step from a signed increment; zero or positive is forward
    pub fn from_increment(increment: i32) -> Self {
        if increment < 0 {
            Step::Backward
        } else {
            Step::Forward
        }
    }
}

/// Next position in `0..len` with wraparound; `None` when `len` is zero
fn wrap(current: Option<usize>, len: usize, step: Step) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match (current, step) {
        (None, Step::Forward) => Some(0),
        (None, Step::Backward) => Some(len - 1),
        (Some(i), Step::Forward) if i + 1 < len => Some(i + 1),
        (Some(_), Step::Forward) => Some(0),
        (Some(i), Step::Backward) if i > 0 && i <= len => Some(i - 1),
        (Some(_), Step::Backward) => Some(len - 1),
    }
}

/// Select a coarse sphere; out-of-range indices leave the cursor as it was
pub fn select_coarse(set: &BoundSet, cursor: Cursor, index: usize) -> BoundsResult<Cursor> {
    if index < set.coarse_len() {
        Ok(Cursor { coarse: Some(index), ..cursor })
    } else {
        Err(BoundsError::InvalidSelection {
            collection: Level::Coarse,
            index,
            len: set.coarse_len(),
        })
    }
}

/// Select a fine sphere; out-of-range indices leave the cursor as it was
pub fn select_fine(set: &BoundSet, cursor: Cursor, index: usize) -> BoundsResult<Cursor> {
    if index < set.fine_len() {
        Ok(Cursor { fine: Some(index), ..cursor })
    } else {
        Err(BoundsError::InvalidSelection {
            collection: Level::Fine,
            index,
            len: set.fine_len(),
        })
    }
}

/// Move the coarse selection one step, wrapping at either end
pub fn step_coarse(set: &BoundSet, cursor: Cursor, step: Step) -> Cursor {
    Cursor {
        coarse: wrap(cursor.coarse, set.coarse_len(), step),
        ..cursor
    }
}

/// Move the fine selection one step over all fine spheres, wrapping at either end
pub fn step_fine(set: &BoundSet, cursor: Cursor, step: Step) -> Cursor {
    Cursor {
        fine: wrap(cursor.fine, set.fine_len(), step),
        ..cursor
    }
}

/// Move the fine selection among the fine spheres of the selected coarse sphere
///
/// Selects the first coarse sphere if none is selected. Forward picks the
/// smallest reference above the current fine selection and wraps to the
/// smallest; backward mirrors that. Relies on reference lists being sorted,
/// which [`BoundSet`] guarantees.
pub fn step_fine_within_coarse(set: &BoundSet, cursor: Cursor, step: Step) -> Cursor {
    if set.fine_len() == 0 {
        return Cursor { fine: None, ..cursor };
    }
    if set.coarse_len() == 0 {
        return Cursor::NONE;
    }

    let coarse = match cursor.coarse {
        Some(c) if c < set.coarse_len() => c,
        _ => 0,
    };
    let references = set.coarse_references(coarse).unwrap_or_default();
    debug_assert!(references.windows(2).all(|w| w[0] < w[1]), "unsorted references");

    let fine = match step {
        Step::Forward => references
            .iter()
            .copied()
            .find(|&r| cursor.fine.map_or(true, |f| r > f))
            .or_else(|| references.first().copied()),
        Step::Backward => references
            .iter()
            .rev()
            .copied()
            .find(|&r| cursor.fine.is_some_and(|f| r < f))
            .or_else(|| references.last().copied()),
    };

    Cursor { coarse: Some(coarse), fine }
}

/// Delete a fine sphere and return the adjusted cursor
///
/// A fine selection at or above the deleted position is cleared.
pub fn delete_fine(
    set: &mut BoundSet,
    cursor: Cursor,
    target: usize,
) -> BoundsResult<(Cursor, StructureSphere)> {
    let removed = set.remove_fine(target)?;
    let fine = cursor.fine.filter(|&f| f < target);
    Ok((Cursor { fine, ..cursor }, removed))
}

/// Delete a coarse sphere and return the adjusted cursor
///
/// Fine spheres it referenced stay; orphans are removed by optimization.
pub fn delete_coarse(
    set: &mut BoundSet,
    cursor: Cursor,
    target: usize,
) -> BoundsResult<(Cursor, StructureSphere)> {
    let removed = set.remove_coarse(target)?;
    let coarse = cursor.coarse.filter(|&c| c < target);
    Ok((Cursor { coarse, ..cursor }, removed))
}
