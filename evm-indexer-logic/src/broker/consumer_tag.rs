use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Generates a consumer tag unique across processes and restarts: host
/// component + pid + nanosecond timestamp + random salt. Hot-reloads and
/// rolling restarts never reuse a tag, so a stale registration on the
/// broker can never collide with a freshly started consumer.
pub fn generate_consumer_tag(prefix: Option<&str>) -> String {
    let host = prefix
        .map(str::to_owned)
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown-host".to_owned());
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let salt: u32 = rand::rng().random();
    format!("{host}-{pid}-{nanos}-{salt:08x}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_tags_are_unique() {
        let tags: Vec<String> = (0..64).map(|_| generate_consumer_tag(Some("worker"))).collect();
        let unique: HashSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn tag_carries_the_supplied_prefix() {
        let tag = generate_consumer_tag(Some("evm-worker-7"));
        assert!(tag.starts_with("evm-worker-7-"));
    }
}
