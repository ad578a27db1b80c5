//! アップロード進捗カウンタ
//!
//! `total` はスキャン時に一度だけ確定する。`processed` はジョブの決着
//! （成功・失敗どちらでも）のたびにそのチャンクの枚数分だけ増える。
//! 成功時のみ数える方式だと失敗があると完了判定に到達しないため、
//! 決着ベースで数える。

#[derive(Debug, Clone, Copy)]
pub struct ProgressTracker {
    processed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    /// 1ジョブの決着を記録する（`count` = そのチャンクの枚数）
    pub fn settle(&mut self, count: usize) {
        self.processed += count;
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 全ジョブが決着したか（エクスポート可否の判定に使う）
    pub fn all_processed(&self) -> bool {
        self.processed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker() {
        let tracker = ProgressTracker::new(25);
        assert_eq!(tracker.processed(), 0);
        assert_eq!(tracker.total(), 25);
        assert!(!tracker.all_processed());
    }

    #[test]
    fn test_settle_accumulates() {
        let mut tracker = ProgressTracker::new(25);
        tracker.settle(12);
        assert_eq!(tracker.processed(), 12);
        tracker.settle(12);
        assert_eq!(tracker.processed(), 24);
        assert!(!tracker.all_processed());
        tracker.settle(1);
        assert!(tracker.all_processed());
    }

    #[test]
    fn test_monotonic() {
        let mut tracker = ProgressTracker::new(10);
        let mut last = 0;
        for _ in 0..5 {
            tracker.settle(2);
            assert!(tracker.processed() >= last);
            last = tracker.processed();
        }
        assert!(tracker.all_processed());
    }

    #[test]
    fn test_zero_total_is_immediately_processed() {
        let tracker = ProgressTracker::new(0);
        assert!(tracker.all_processed());
    }
}
