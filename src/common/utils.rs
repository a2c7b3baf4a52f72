use chrono::{DateTime, Utc};
use std::sync::OnceLock;
use timeago::Formatter;

pub fn comments_label(comments_count: &str) -> String {
    format!("{comments_count} comments")
}

pub fn time_ago(time: DateTime<Utc>) -> String {
    static INSTANCE: OnceLock<Formatter> = OnceLock::new();
    let secs = Utc::now().signed_duration_since(time).num_seconds();
    let duration = std::time::Duration::from_secs(secs.try_into().unwrap_or_default());
    INSTANCE.get_or_init(Formatter::new).convert(duration)
}
