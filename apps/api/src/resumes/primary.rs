//! Primary-resume rules.
//!
//! Among one user's resumes exactly `min(1, count)` are primary. These
//! functions decide *which*; the stores apply the decision inside their
//! per-user serialization boundary.

use uuid::Uuid;

use crate::models::resume::ResumeRow;

/// A new upload is primary only when it is the user's first resume.
pub fn primary_on_create(existing_count: usize) -> bool {
    existing_count == 0
}

/// The resume that inherits the primary flag: newest `created_at`, with the
/// greater id breaking ties so the choice is deterministic.
pub fn select_successor<'a, I>(candidates: I) -> Option<&'a ResumeRow>
where
    I: IntoIterator<Item = &'a ResumeRow>,
{
    candidates
        .into_iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

/// Which resume, if any, must be promoted when `target` is deleted out of
/// `owned` (the owner's full resume set, `target` included).
pub fn successor_on_delete(target: &ResumeRow, owned: &[ResumeRow]) -> Option<Uuid> {
    if !target.is_primary {
        return None;
    }
    select_successor(owned.iter().filter(|r| r.id != target.id)).map(|r| r.id)
}

/// Listing order: primary first, then newest first.
pub fn sort_for_listing(rows: &mut [ResumeRow]) {
    rows.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
}

#[cfg(test)]
pub fn primary_count(rows: &[ResumeRow]) -> usize {
    rows.iter().filter(|r| r.is_primary).count()
}

/// True when `rows` (one user's resumes) have exactly `min(1, len)` primaries.
#[cfg(test)]
pub fn invariant_holds(rows: &[ResumeRow]) -> bool {
    primary_count(rows) == rows.len().min(1)
}
