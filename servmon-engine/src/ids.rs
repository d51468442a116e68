use time::OffsetDateTime;

/// Timestamp-based ids that stay strictly increasing within one engine,
/// even when several records are created in the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn next(&mut self, now: OffsetDateTime) -> u64 {
        let millis = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
        self.last = millis.max(self.last + 1);
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_ids_monotonic_within_same_millisecond() {
        let now = datetime!(2025-01-01 00:00 UTC);
        let mut ids = IdAllocator::default();

        let first = ids.next(now);
        let second = ids.next(now);
        assert_eq!(first, 1_735_689_600_000);
        assert_eq!(second, first + 1);
    }

    #[test]
    fn test_ids_never_go_backwards() {
        let mut ids = IdAllocator::default();
        let late = ids.next(datetime!(2025-01-01 00:00:01 UTC));
        let early = ids.next(datetime!(2025-01-01 00:00:00 UTC));
        assert!(early > late);
    }
}
