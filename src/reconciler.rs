//! ポーリング照合
//!
//! 二段階型バックエンド（アップロード後に非同期でOCRを行う構成）向け。
//! 一覧エンドポイントの `all_processed` が立つまで一定間隔で同じページを
//! 取得し続ける。元実装は上限なしの自己再スケジュールだったため、
//! 最大試行回数を持つ明示的な状態機械に置き換えている。

use crate::api::types::ListingResponse;
use crate::error::{MeterOcrError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// 一覧取得の実体（HTTPクライアント、テストではモック）
#[async_trait]
pub trait ListingClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ListingResponse>;
}

/// 照合の進行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Submitted,
    Polling { attempt: u32 },
    Settled,
    TimedOut,
}

pub struct PollingReconciler<'a, T: ListingClient + Sync> {
    client: &'a T,
    interval: Duration,
    max_attempts: u32,
    state: ReconcileState,
}

impl<'a, T: ListingClient + Sync> PollingReconciler<'a, T> {
    pub fn new(client: &'a T, interval: Duration, max_attempts: u32) -> Self {
        Self {
            client,
            interval,
            max_attempts,
            state: ReconcileState::Submitted,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// `all_processed` が立つまで同じページをポーリングする
    ///
    /// 立った時点の一覧をそのまま返す。`max_attempts` 回取得しても
    /// 立たない場合は `ReconciliationTimeout`。401は呼び出し側で
    /// 再ログインを促せるよう区別して伝播する。
    pub async fn wait_until_processed(
        &mut self,
        page: u32,
        per_page: u32,
    ) -> Result<ListingResponse> {
        self.state = ReconcileState::Submitted;

        for attempt in 1..=self.max_attempts {
            self.state = ReconcileState::Polling { attempt };

            let listing = self.client.fetch_page(page, per_page).await?;

            if listing.all_processed {
                self.state = ReconcileState::Settled;
                return Ok(listing);
            }

            tokio::time::sleep(self.interval).await;
        }

        self.state = ReconcileState::TimedOut;
        Err(MeterOcrError::ReconciliationTimeout {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::OcrResult;
    use std::sync::Mutex;

    /// `ready_after` 回目以降の取得で all_processed を立てるモック
    struct MockListing {
        fetches: Mutex<u32>,
        ready_after: u32,
        total: u64,
    }

    impl MockListing {
        fn new(ready_after: u32, total: u64) -> Self {
            Self {
                fetches: Mutex::new(0),
                ready_after,
                total,
            }
        }

        fn fetch_count(&self) -> u32 {
            *self.fetches.lock().unwrap()
        }
    }

    #[async_trait]
    impl ListingClient for MockListing {
        async fn fetch_page(&self, _page: u32, per_page: u32) -> Result<ListingResponse> {
            let mut fetches = self.fetches.lock().unwrap();
            *fetches += 1;
            let done = *fetches > self.ready_after;

            Ok(ListingResponse {
                images: if done {
                    (0..self.total)
                        .map(|i| OcrResult {
                            image_url: format!("meter_{:03}.jpg", i),
                            ..Default::default()
                        })
                        .collect()
                } else {
                    Vec::new()
                },
                pages: 1,
                current_page: 1,
                per_page,
                total: self.total,
                all_processed: done,
            })
        }
    }

    #[tokio::test]
    async fn test_settles_after_k_polls() {
        // k回目までは未完了、k+1回目の取得で完了
        let k = 3;
        let client = MockListing::new(k, 25);
        let mut reconciler =
            PollingReconciler::new(&client, Duration::from_millis(1), 100);

        let listing = reconciler.wait_until_processed(1, 12).await.unwrap();

        assert_eq!(client.fetch_count(), k + 1);
        assert_eq!(listing.images.len(), 25);
        assert_eq!(listing.total, 25);
        assert_eq!(reconciler.state(), ReconcileState::Settled);
    }

    #[tokio::test]
    async fn test_immediate_settlement() {
        let client = MockListing::new(0, 5);
        let mut reconciler =
            PollingReconciler::new(&client, Duration::from_millis(1), 10);

        let listing = reconciler.wait_until_processed(1, 12).await.unwrap();

        assert_eq!(client.fetch_count(), 1);
        assert!(listing.all_processed);
    }

    #[tokio::test]
    async fn test_timeout_when_never_processed() {
        let client = MockListing::new(u32::MAX, 5);
        let mut reconciler = PollingReconciler::new(&client, Duration::from_millis(1), 4);

        let result = reconciler.wait_until_processed(1, 12).await;

        assert!(matches!(
            result,
            Err(MeterOcrError::ReconciliationTimeout { attempts: 4 })
        ));
        assert_eq!(client.fetch_count(), 4);
        assert_eq!(reconciler.state(), ReconcileState::TimedOut);
    }

    #[tokio::test]
    async fn test_auth_failure_propagates() {
        struct AuthFailing;

        #[async_trait]
        impl ListingClient for AuthFailing {
            async fn fetch_page(&self, _page: u32, _per_page: u32) -> Result<ListingResponse> {
                Err(MeterOcrError::AuthRequired)
            }
        }

        let client = AuthFailing;
        let mut reconciler = PollingReconciler::new(&client, Duration::from_millis(1), 10);

        assert!(matches!(
            reconciler.wait_until_processed(1, 12).await,
            Err(MeterOcrError::AuthRequired)
        ));
    }
}
