/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as entry ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: sequence within the millisecond
///
/// Ids are strictly increasing within a process. Past 4096 ids in one
/// millisecond (or when the wall clock steps back) the timestamp part
/// borrows from the next millisecond instead of wrapping the sequence.
pub fn snowflake_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static LAST: AtomicI64 = AtomicI64::new(0);

    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let floor = ts << 12;
    let prev = LAST
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(floor.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    floor.max(prev + 1)
}

/// Snowflake id rendered as a zero-padded string.
///
/// Padding keeps lexical order equal to numeric order, so string ids can
/// be used directly as redb keys and as a stable tie-break.
pub fn snowflake_string() -> String {
    format!("{:016}", snowflake_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_fits_in_53_bits() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1i64 << 53));
    }

    #[test]
    fn snowflake_ids_are_unique_within_a_burst() {
        let ids: std::collections::HashSet<i64> = (0..4000).map(|_| snowflake_id()).collect();
        assert_eq!(ids.len(), 4000);
    }

    #[test]
    fn snowflake_sequence_does_not_wrap() {
        // more ids than the 12-bit sequence holds, far faster than 1 per µs
        let ids: Vec<i64> = (0..20_000).map(|_| snowflake_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn snowflake_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..5_000).map(|_| snowflake_id()).collect::<Vec<_>>()))
            .collect();
        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 20_000);
    }

    #[test]
    fn snowflake_string_is_fixed_width() {
        let a = snowflake_string();
        let b = snowflake_string();
        assert_eq!(a.len(), 16);
        assert_eq!(a.len(), b.len());
    }
}
