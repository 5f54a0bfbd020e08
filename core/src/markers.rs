//! Reconciliation of fetched status records into the two marker buckets.

use crate::types::{CountryMarker, CountryStatusRecord, StatusKind};

/// Markers partitioned by status, in server response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    pub visited: Vec<CountryMarker>,
    pub want_to_visit: Vec<CountryMarker>,
}

impl MarkerSet {
    pub fn len(&self) -> usize {
        self.visited.len() + self.want_to_visit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty() && self.want_to_visit.is_empty()
    }
}

/// Rebuild both buckets from scratch.
///
/// Records whose status is neither `visited` nor `want_to_visit` are skipped
/// and logged; they never land in either bucket.
pub fn partition_markers(records: &[CountryStatusRecord]) -> MarkerSet {
    let mut set = MarkerSet::default();
    for record in records {
        match record.kind() {
            Some(kind @ StatusKind::Visited) => {
                set.visited.push(CountryMarker::from_record(record, kind));
            }
            Some(kind @ StatusKind::WantToVisit) => {
                set.want_to_visit.push(CountryMarker::from_record(record, kind));
            }
            None => {
                tracing::warn!(
                    status_id = ?record.id,
                    country = record.country,
                    status = %record.status,
                    "dropping status record with unknown status"
                );
            }
        }
    }
    set
}
