use anyhow::{anyhow, Result};

use crate::model::{Record, SequencedRecord, SortOrder};

/// Sort records by post time and number them from `start`.
///
/// The sort is stable: records with equal timestamps keep their file order in
/// both directions. Fails if the last id would not fit in an `i64`.
pub fn assign(mut records: Vec<Record>, start: i64, order: SortOrder) -> Result<Vec<SequencedRecord>> {
    match order {
        SortOrder::Newest => records.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
        SortOrder::Oldest => records.sort_by(|a, b| a.posted_at.cmp(&b.posted_at)),
    }
    records
        .into_iter()
        .enumerate()
        .map(|(offset, record)| {
            i64::try_from(offset)
                .ok()
                .and_then(|offset| start.checked_add(offset))
                .map(|seq| SequencedRecord { seq, record })
                .ok_or_else(|| anyhow!("sequence overflows i64 (start {start}, record {offset})"))
        })
        .collect()
}
