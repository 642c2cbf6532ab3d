//! Collision-free id allocation and unique naming.
//!
//! Template ids are timestamp-based, which collides when several ids are
//! needed within one millisecond (a batch import) or when a candidate's id is
//! already taken. Callers pass the set of ids they have seen so far and a
//! numeric suffix disambiguates.

use std::collections::HashSet;

use chrono::Utc;

/// Allocate an id that is not in `taken`.
pub fn allocate_id(taken: &HashSet<String>) -> String {
    allocate_id_at(Utc::now().timestamp_millis(), taken)
}

/// Allocation core, separated from the clock for testability.
pub fn allocate_id_at(millis: i64, taken: &HashSet<String>) -> String {
    let base = format!("tpl-{millis}");
    if !taken.contains(&base) {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Smallest free name: `base` itself, else `"{base} {n}"` for the smallest
/// `n >= 2` not in use. Gap-filling, not max-incrementing: with `X` and
/// `X 3` taken, the answer is `X 2`.
pub fn generate_unique_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base} {n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
