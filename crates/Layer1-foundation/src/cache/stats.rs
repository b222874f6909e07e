//! Cache statistics

/// Counters for monitoring the tiered cache
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Served from the memory tier
    pub memory_hits: u64,
    /// Served from the disk tier (and promoted)
    pub disk_hits: u64,
    /// Neither tier had a live entry
    pub misses: u64,
    /// Disk -> memory promotions
    pub promotions: u64,
    /// Entries dropped because their TTL had passed
    pub expired: u64,
    /// Live entries demoted out of memory to respect the threshold
    pub evictions: u64,
    /// Absorbed disk failures
    pub io_errors: u64,
    /// Completed sweeps (threshold-triggered or periodic)
    pub sweeps: u64,
}

impl CacheStats {
    /// Overall hit rate
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.memory_hits + self.disk_hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        (self.memory_hits + self.disk_hits) as f64 / total as f64
    }

    /// Share of hits answered by the memory tier
    #[inline]
    pub fn memory_hit_rate(&self) -> f64 {
        let total_hits = self.memory_hits + self.disk_hits;
        if total_hits == 0 {
            return 0.0;
        }
        self.memory_hits as f64 / total_hits as f64
    }
}

/// Outcome of one `cleanup` pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub memory_expired: usize,
    pub disk_expired: usize,
    pub disk_corrupt: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.memory_expired + self.disk_expired + self.disk_corrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            memory_hits: 1,
            disk_hits: 1,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
        assert!((stats.memory_hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_rates_are_zero() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.memory_hit_rate(), 0.0);
    }
}
