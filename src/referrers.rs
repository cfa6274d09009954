use serde::Serialize;
use std::collections::HashMap;

/// Marker the log store records when a request carried no referrer.
pub const NO_REFERRER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrerEntry {
    pub referrer: String,
    pub count: u64,
}

/// Sums counts per referrer and orders the result by descending count.
///
/// Referrers are matched on exact string equality; normalization belongs to
/// the query that produced the rows. The sort is stable but the order among
/// equal counts follows map iteration and is not meaningful.
pub fn aggregate<I, S>(rows: I) -> Vec<ReferrerEntry>
where
    I: IntoIterator<Item = (S, u64)>,
    S: Into<String>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for (referrer, count) in rows {
        let referrer = referrer.into();
        if referrer == NO_REFERRER {
            continue;
        }
        *counts.entry(referrer).or_insert(0) += count;
    }

    let mut entries: Vec<ReferrerEntry> = counts
        .into_iter()
        .map(|(referrer, count)| ReferrerEntry { referrer, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}
