use chrono::{DateTime, Utc};

use crate::dates::{parse_time_ago, start_of_day};
use crate::models::Activity;

/// Pair permalinks, post texts and relative posting labels by position.
///
/// The three lists must come from the same page snapshot; extra entries in a
/// longer list are dropped.
pub fn zip_activities(
    links: Vec<String>,
    texts: Vec<String>,
    labels: Vec<String>,
    now: DateTime<Utc>,
) -> Vec<Activity> {
    if links.len() != texts.len() || texts.len() != labels.len() {
        tracing::warn!(
            links = links.len(),
            texts = texts.len(),
            labels = labels.len(),
            "Activity lists differ in length, truncating"
        );
    }

    links
        .into_iter()
        .zip(texts)
        .zip(labels)
        .map(|((link, text), label)| Activity {
            text,
            link: Some(link),
            posted_at: parse_time_ago(&label, now).map(start_of_day),
        })
        .collect()
}
