//! Deterministic top-K selection.

use std::cmp::Ordering;

use super::scanner::EntityCount;

/// Default number of products in a summary.
pub const DEFAULT_K: usize = 10;

/// Ranking order: higher count first, then identifier ascending.
fn rank(a: &EntityCount, b: &EntityCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id))
}

/// Returns at most `k` entities, highest count first. Equal counts are
/// ordered by identifier so the result does not depend on scan order.
#[must_use]
pub fn top_k(mut entities: Vec<EntityCount>, k: usize) -> Vec<EntityCount> {
    entities.sort_unstable_by(rank);
    entities.truncate(k);
    entities
}
