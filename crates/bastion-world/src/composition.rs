//! Unit compositions: counts of units per [`UnitType`].
//!
//! Armies, garrisons and reinforcements all hold a [`Composition`]. Zero
//! counts are never stored, so an empty map means no units at all.

use std::collections::BTreeMap;

use bastion_types::UnitType;

use crate::error::WorldError;

/// Unit counts per unit type. Entries with a zero count are removed.
pub type Composition = BTreeMap<UnitType, u32>;

/// Total number of units across all types.
pub fn total(composition: &Composition) -> u64 {
    composition
        .values()
        .fold(0_u64, |acc, &n| acc.saturating_add(u64::from(n)))
}

/// Whether `have` holds at least `want` of every unit type.
pub fn covers(have: &Composition, want: &Composition) -> bool {
    want.iter()
        .all(|(unit, &n)| have.get(unit).copied().unwrap_or(0) >= n)
}

/// Whether every requested count is positive and at least one unit is
/// requested.
pub fn is_valid_request(want: &Composition) -> bool {
    !want.is_empty() && want.values().all(|&n| n > 0)
}

/// Remove `want` from `have`.
///
/// # Errors
///
/// Returns [`WorldError::Insufficient`] without modifying `have` if any unit
/// type is short.
pub fn subtract(have: &mut Composition, want: &Composition) -> Result<(), WorldError> {
    for (unit, &n) in want {
        let held = have.get(unit).copied().unwrap_or(0);
        if held < n {
            return Err(WorldError::Insufficient {
                what: format!("{unit:?}"),
                needed: u64::from(n),
                available: u64::from(held),
            });
        }
    }
    for (unit, &n) in want {
        if let Some(held) = have.get_mut(unit) {
            *held = held.saturating_sub(n);
            if *held == 0 {
                have.remove(unit);
            }
        }
    }
    Ok(())
}

/// Add every unit of `from` into `into`.
///
/// # Errors
///
/// Returns [`WorldError::ArithmeticOverflow`] without modifying `into` if a
/// count would overflow.
pub fn merge(into: &mut Composition, from: &Composition) -> Result<(), WorldError> {
    for (unit, &n) in from {
        into.get(unit)
            .copied()
            .unwrap_or(0)
            .checked_add(n)
            .ok_or(WorldError::ArithmeticOverflow)?;
    }
    for (unit, &n) in from {
        if n == 0 {
            continue;
        }
        let entry = into.entry(*unit).or_insert(0);
        *entry = entry.saturating_add(n);
    }
    Ok(())
}
