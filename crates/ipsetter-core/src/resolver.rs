//! Record resolver
//!
//! Pure decision logic: given the records a provider returned for a domain,
//! decide whether the named A record must be created, updated, or left alone.
//! No I/O happens here.

use crate::record::RemoteRecord;

/// What a reconciliation pass has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// No A record with the name exists
    NeedsCreate,
    /// This record has the name but carries other data
    NeedsUpdate(&'a RemoteRecord),
    /// Every A record with the name already carries the proposed data;
    /// holds the first of them
    AlreadyCurrent(&'a RemoteRecord),
}

/// Decide the action for the A record `name` given the domain's `records`.
///
/// Records of another type or name are ignored. When several A records share
/// the name, the first one whose data differs from `proposed_value` is the
/// update target; the others are left alone.
pub fn resolve<'a>(records: &'a [RemoteRecord], name: &str, proposed_value: &str) -> Decision<'a> {
    let mut first_match = None;

    for record in records.iter().filter(|record| record.is_a_named(name)) {
        first_match.get_or_insert(record);

        if record.data != proposed_value {
            return Decision::NeedsUpdate(record);
        }
    }

    match first_match {
        Some(record) => Decision::AlreadyCurrent(record),
        None => Decision::NeedsCreate,
    }
}
