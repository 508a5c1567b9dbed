//! Wall-clock helper shared by the HTTP handlers (mempool arrival
//! timestamps are stamped by the receiving node, not trusted from the
//! submitting client).

pub fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
