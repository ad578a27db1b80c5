//! 一括アップロードの調停
//!
//! スキャン済みアーカイブをチャンクに分割し、逐次またはバウンド付き並列で
//! バックエンドへ送信して部分結果をマージする。結果は決着順に追加するため、
//! 並列ポリシーではアーカイブ内の並びと一致しないことがある（仕様として許容。
//! 並び替えが必要な呼び出し側は image_url で突き合わせる）。
//!
//! 送信は1チャンクにつき最大1回。失敗したジョブの再送は行わず、その画像は
//! この実行の結果集合に現れない。再試行するかどうかは呼び出し側の判断。

mod packager;
mod progress;

pub use packager::package_chunk;
pub use progress::ProgressTracker;

use crate::api::types::OcrResult;
use crate::chunker;
use crate::error::Result;
use crate::scanner::Archive;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

/// チャンク送信の実体（HTTPクライアント、テストではモック）
#[async_trait]
pub trait UploadTransport {
    /// 1チャンク分のZIPペイロードを送信し、そのチャンクの結果バッチを返す
    async fn upload_chunk(&self, payload: Vec<u8>, file_name: &str) -> Result<Vec<OcrResult>>;

    /// 単一画像の送信（チャンク化なしの縮退パス）
    async fn upload_single(&self, payload: Vec<u8>, file_name: &str) -> Result<OcrResult>;
}

/// チャンク送信の方式
///
/// 逐次が既定。並列は全ジョブの決着を待ち合わせ、個々の失敗が他の
/// ジョブを中断させることはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// 前のチャンクの決着後に次を送信（同時実行数1）
    #[default]
    Sequential,
    /// 全チャンクを同時実行数 `max_in_flight` で並列送信
    BoundedParallel { max_in_flight: usize },
}

/// ジョブ状態（終端状態からの遷移はない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

/// 1チャンク送信の記録
#[derive(Debug, Clone)]
pub struct Job {
    pub chunk_index: usize,
    pub item_count: usize,
    pub state: JobState,
}

/// 1回の実行の結果
#[derive(Debug)]
pub struct UploadReport {
    /// 成功ジョブの結果バッチを決着順に連結したもの
    pub results: Vec<OcrResult>,
    pub jobs: Vec<Job>,
    pub processed: usize,
    pub total: usize,
}

impl UploadReport {
    pub fn all_processed(&self) -> bool {
        self.processed == self.total
    }

    pub fn failed_chunks(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.state == JobState::Failed)
            .count()
    }
}

pub struct UploadCoordinator<'a, T: UploadTransport + Sync> {
    transport: &'a T,
    chunk_size: usize,
    policy: DispatchPolicy,
}

impl<'a, T: UploadTransport + Sync> UploadCoordinator<'a, T> {
    pub fn new(transport: &'a T, chunk_size: usize, policy: DispatchPolicy) -> Self {
        Self {
            transport,
            chunk_size,
            policy,
        }
    }

    /// アーカイブ全体をチャンク送信する
    ///
    /// `on_progress` は各ジョブの決着時に (processed, total) で呼ばれる。
    pub async fn run(
        &self,
        archive: &Archive,
        on_progress: impl Fn(usize, usize),
    ) -> Result<UploadReport> {
        let items = archive.scan()?;
        let chunks = chunker::partition(&items, self.chunk_size)?;

        let total = items.len();
        let mut progress = ProgressTracker::new(total);
        let mut results: Vec<OcrResult> = Vec::new();
        let mut jobs: Vec<Job> = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| Job {
                chunk_index: i,
                item_count: c.len(),
                state: JobState::Pending,
            })
            .collect();

        match self.policy {
            DispatchPolicy::Sequential => {
                for (i, chunk) in chunks.iter().enumerate() {
                    jobs[i].state = JobState::InFlight;

                    match self.submit_chunk(archive, i, chunk).await {
                        Ok(batch) => {
                            jobs[i].state = JobState::Succeeded;
                            results.extend(batch);
                        }
                        Err(e) => {
                            jobs[i].state = JobState::Failed;
                            eprintln!("チャンク {} の送信に失敗: {}", i + 1, e);
                        }
                    }

                    progress.settle(chunk.len());
                    on_progress(progress.processed(), progress.total());
                }
            }
            DispatchPolicy::BoundedParallel { max_in_flight } => {
                for job in &mut jobs {
                    job.state = JobState::InFlight;
                }

                // 決着した順に取り出す（全ジョブの終了を待ち合わせる）
                let mut settled = stream::iter(chunks.iter().enumerate().map(|(i, chunk)| {
                    async move { (i, chunk.len(), self.submit_chunk(archive, i, chunk).await) }
                }))
                .buffer_unordered(max_in_flight.max(1));

                while let Some((i, count, outcome)) = settled.next().await {
                    match outcome {
                        Ok(batch) => {
                            jobs[i].state = JobState::Succeeded;
                            results.extend(batch);
                        }
                        Err(e) => {
                            jobs[i].state = JobState::Failed;
                            eprintln!("チャンク {} の送信に失敗: {}", i + 1, e);
                        }
                    }

                    progress.settle(count);
                    on_progress(progress.processed(), progress.total());
                }
            }
        }

        Ok(UploadReport {
            results,
            jobs,
            processed: progress.processed(),
            total,
        })
    }

    /// 単一画像の送信（縮退パス）
    pub async fn upload_single(&self, payload: Vec<u8>, file_name: &str) -> Result<OcrResult> {
        self.transport.upload_single(payload, file_name).await
    }

    /// チャンクのZIP化と送信。ZIP化に失敗したチャンクは送信しない。
    async fn submit_chunk(
        &self,
        archive: &Archive,
        index: usize,
        chunk: &[crate::scanner::ImageEntry],
    ) -> Result<Vec<OcrResult>> {
        let payload = package_chunk(archive, chunk)?;
        let file_name = format!("chunk_{}.zip", index + 1);
        self.transport.upload_chunk(payload, &file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeterOcrError;
    use crate::scanner::build_test_archive;
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::sync::Mutex;
    use zip::ZipArchive;

    /// ペイロードのZIPを開き、1エントリ＝1結果を返すモック
    struct MockTransport {
        calls: Mutex<Vec<String>>,
        fail: HashSet<String>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: HashSet::new(),
            }
        }

        fn failing(names: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: names.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UploadTransport for MockTransport {
        async fn upload_chunk(
            &self,
            payload: Vec<u8>,
            file_name: &str,
        ) -> Result<Vec<OcrResult>> {
            self.calls.lock().unwrap().push(file_name.to_string());

            if self.fail.contains(file_name) {
                return Err(MeterOcrError::Network("mock failure".into()));
            }

            let mut zip = ZipArchive::new(Cursor::new(payload)).unwrap();
            let mut batch = Vec::new();
            for i in 0..zip.len() {
                let name = zip.by_index(i).unwrap().name().to_string();
                batch.push(OcrResult {
                    image_url: name,
                    ..Default::default()
                });
            }
            Ok(batch)
        }

        async fn upload_single(&self, _payload: Vec<u8>, file_name: &str) -> Result<OcrResult> {
            self.calls.lock().unwrap().push(file_name.to_string());
            Ok(OcrResult {
                image_url: file_name.to_string(),
                ..Default::default()
            })
        }
    }

    fn archive_with(n: usize) -> Archive {
        let names: Vec<String> = (0..n).map(|i| format!("meter_{:03}.jpg", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        build_test_archive(&refs)
    }

    #[tokio::test]
    async fn test_sequential_all_success() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 12, DispatchPolicy::Sequential);
        let archive = archive_with(25);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        assert_eq!(report.results.len(), 25);
        assert_eq!(report.total, 25);
        assert!(report.all_processed());
        assert_eq!(report.failed_chunks(), 0);
        // 1チャンクにつき送信は1回だけ
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_sequential_preserves_archive_order() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 10, DispatchPolicy::Sequential);
        let archive = archive_with(23);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        let urls: Vec<&str> = report.results.iter().map(|r| r.image_url.as_str()).collect();
        let expected: Vec<String> = (0..23).map(|i| format!("meter_{:03}.jpg", i)).collect();
        assert_eq!(urls, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_partial_failure_isolated() {
        // n=25, b=12、チャンク2が失敗 → 成功したチャンク1と3の13件のみ
        let transport = MockTransport::failing(&["chunk_2.zip"]);
        let coordinator = UploadCoordinator::new(&transport, 12, DispatchPolicy::Sequential);
        let archive = archive_with(25);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        assert_eq!(report.results.len(), 13);
        assert_eq!(report.failed_chunks(), 1);
        assert_eq!(report.jobs[0].state, JobState::Succeeded);
        assert_eq!(report.jobs[1].state, JobState::Failed);
        assert_eq!(report.jobs[2].state, JobState::Succeeded);
        // 失敗しても progress は全決着まで進む
        assert!(report.all_processed());
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_parallel_all_success() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(
            &transport,
            12,
            DispatchPolicy::BoundedParallel { max_in_flight: 3 },
        );
        let archive = archive_with(25);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        assert_eq!(report.results.len(), 25);
        assert!(report.all_processed());
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_parallel_partial_failure() {
        let transport = MockTransport::failing(&["chunk_2.zip"]);
        let coordinator = UploadCoordinator::new(
            &transport,
            12,
            DispatchPolicy::BoundedParallel { max_in_flight: 3 },
        );
        let archive = archive_with(25);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        assert_eq!(report.results.len(), 13);
        assert_eq!(report.failed_chunks(), 1);
        assert!(report.all_processed());
    }

    #[tokio::test]
    async fn test_progress_callback_monotonic() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 12, DispatchPolicy::Sequential);
        let archive = archive_with(25);

        let seen = Mutex::new(Vec::new());
        let report = coordinator
            .run(&archive, |processed, total| {
                seen.lock().unwrap().push((processed, total));
            })
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![(12, 25), (24, 25), (25, 25)]);
        assert!(report.all_processed());
    }

    #[tokio::test]
    async fn test_empty_archive() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 10, DispatchPolicy::Sequential);
        let archive = build_test_archive(&["readme.txt"]);

        let report = coordinator.run(&archive, |_, _| {}).await.unwrap();

        assert_eq!(report.total, 0);
        assert!(report.results.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_chunk_size() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 0, DispatchPolicy::Sequential);
        let archive = archive_with(3);

        assert!(matches!(
            coordinator.run(&archive, |_, _| {}).await,
            Err(MeterOcrError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_single() {
        let transport = MockTransport::new();
        let coordinator = UploadCoordinator::new(&transport, 10, DispatchPolicy::Sequential);

        let result = coordinator
            .upload_single(b"jpeg bytes".to_vec(), "meter.jpg")
            .await
            .unwrap();

        assert_eq!(result.image_url, "meter.jpg");
        assert_eq!(transport.call_count(), 1);
    }
}
