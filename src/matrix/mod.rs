//! 都道府県×業種の件数集計
//!
//! 各セルは `limit=1` の検索で、件数はレスポンスの `total` を使う。
//! 大分類は5都道府県ずつ即時に集計し、中分類は3都道府県ずつ
//! バックグラウンドで埋めてメッセージで返す。

use crate::api::SearchApi;
use crate::error::Result;
use company_search_common::matrix::{CellKey, CellOutcome, CellState, CellUpdate, Matrix, UpdateOrigin};
use company_search_common::types::{Company, SearchRequest};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 大分類の同時集計単位（都道府県数）
pub const LARGE_BATCH_PREFECTURES: usize = 5;
/// 中分類の同時集計単位（都道府県数）
pub const MEDIUM_BATCH_PREFECTURES: usize = 3;
/// セルの企業一覧の最大件数
pub const CELL_LIST_LIMIT: u32 = 100;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// 1セルの件数（失敗はセル単位で吸収）
async fn count_with<S: SearchApi>(api: &S, key: &CellKey) -> CellOutcome {
    let request = SearchRequest::count_only(&key.prefecture, &key.large, &key.medium);
    match api.search(&request).await {
        Ok(response) => CellOutcome::Count(response.total),
        Err(e) => {
            tracing::warn!(cell = %key.cache_key(), error = %e, "cell count failed");
            CellOutcome::Failed
        }
    }
}

/// 中分類のバックグラウンド集計
pub struct MediumSweep {
    pub updates: mpsc::Receiver<CellUpdate>,
    pub handle: JoinHandle<()>,
    /// 送られてくるセル数
    pub total: usize,
}

pub struct MatrixAggregator<S> {
    api: Arc<S>,
}

impl<S> Clone for MatrixAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
        }
    }
}

impl<S: SearchApi + 'static> MatrixAggregator<S> {
    pub fn new(api: Arc<S>) -> Self {
        Self { api }
    }

    pub async fn count_cell(&self, key: &CellKey) -> CellOutcome {
        count_with(self.api.as_ref(), key).await
    }

    /// 大分類の件数を全都道府県で集計
    ///
    /// バッチ内は並行、バッチ間は順番に実行する。
    /// `progress` には (完了した都道府県数, 全都道府県数) を渡す。
    pub async fn load_large_counts<F>(&self, matrix: &mut Matrix, mut progress: F) -> usize
    where
        F: FnMut(usize, usize),
    {
        let prefectures = matrix.prefectures().to_vec();
        let larges: Vec<String> = matrix
            .columns()
            .iter()
            .filter(|c| c.is_large_only())
            .map(|c| c.large.clone())
            .collect();
        let mut failed = 0;
        let mut done = 0;

        for batch in prefectures.chunks(LARGE_BATCH_PREFECTURES) {
            let keys: Vec<CellKey> = batch
                .iter()
                .flat_map(|pref| larges.iter().map(move |large| CellKey::new(pref, large, "")))
                .collect();

            let outcomes = join_all(keys.iter().map(|key| self.count_cell(key))).await;

            for (key, outcome) in keys.into_iter().zip(outcomes) {
                if outcome == CellOutcome::Failed {
                    failed += 1;
                }
                matrix.apply(CellUpdate {
                    key,
                    outcome,
                    origin: UpdateOrigin::Eager,
                });
            }

            done += batch.len();
            progress(done, prefectures.len());
            tracing::debug!(done, total = prefectures.len(), "large category batch finished");
        }

        failed
    }

    /// 中分類の集計をバックグラウンドで開始
    ///
    /// 都道府県3件ずつ並行し、各都道府県の中では列順に取得する。
    /// 受信側が閉じられたら残りの集計をやめる。
    pub fn spawn_medium_sweep(&self, matrix: &Matrix) -> MediumSweep {
        let prefectures = matrix.prefectures().to_vec();
        let mediums: Vec<(String, String)> = matrix
            .columns()
            .iter()
            .filter(|c| !c.is_large_only())
            .map(|c| (c.large.clone(), c.medium.clone()))
            .collect();
        let total = prefectures.len() * mediums.len();

        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let api = Arc::clone(&self.api);

        let handle = tokio::spawn(async move {
            for batch in prefectures.chunks(MEDIUM_BATCH_PREFECTURES) {
                let sweeps = batch.iter().map(|pref| {
                    let api = api.as_ref();
                    let tx = tx.clone();
                    let mediums = &mediums;
                    async move {
                        for (large, medium) in mediums {
                            let key = CellKey::new(pref, large, medium);
                            let outcome = count_with(api, &key).await;
                            let update = CellUpdate {
                                key,
                                outcome,
                                origin: UpdateOrigin::Background,
                            };
                            if tx.send(update).await.is_err() {
                                return false;
                            }
                        }
                        true
                    }
                });

                let results = join_all(sweeps).await;
                if results.iter().any(|ok| !ok) {
                    tracing::debug!("medium sweep receiver closed");
                    return;
                }
            }
            tracing::debug!("medium sweep finished");
        });

        MediumSweep {
            updates: rx,
            handle,
            total,
        }
    }

    /// セルをクリックしたときの即時取得
    pub async fn fetch_cell(&self, matrix: &mut Matrix, key: &CellKey) -> CellState {
        if matrix.mark_loading(key) {
            let outcome = self.count_cell(key).await;
            matrix.apply(CellUpdate {
                key: key.clone(),
                outcome,
                origin: UpdateOrigin::User,
            });
        }
        matrix.state(key)
    }

    /// セルに該当する企業（最大100件、続きは取得しない）
    pub async fn list_companies(&self, key: &CellKey) -> Result<Vec<Company>> {
        let request =
            SearchRequest::for_cell(&key.prefecture, &key.large, &key.medium, CELL_LIST_LIMIT);
        Ok(self.api.search(&request).await?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use company_search_common::matrix::IndustryTaxonomy;
    use company_search_common::types::SearchResponse;
    use std::sync::Mutex;

    /// 中分類名の文字数を件数として返す偽API
    struct CountingApi {
        fail_pref: Option<String>,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl CountingApi {
        fn new(fail_pref: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                fail_pref: fail_pref.map(str::to_string),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl SearchApi for CountingApi {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if request.pref.is_some() && request.pref == self.fail_pref {
                return Err(AppError::Transport("connection reset".into()));
            }
            let total = match &request.industry_mid_name {
                Some(mid) => mid.chars().count() as u64,
                None => 100,
            };
            Ok(SearchResponse {
                total,
                next_cursor: None,
                items: Vec::new(),
            })
        }
    }

    fn matrix(prefs: &[&str]) -> Matrix {
        let mut taxonomy = IndustryTaxonomy::default();
        taxonomy.insert("製造業", Some("印刷業"));
        taxonomy.insert("製造業", Some("食料品製造業"));
        taxonomy.insert("卸売業", None);
        Matrix::new(prefs.iter().map(|p| p.to_string()).collect(), &taxonomy)
    }

    #[tokio::test]
    async fn test_large_counts_use_limit_one_and_total() {
        let api = CountingApi::new(None);
        let agg = MatrixAggregator::new(Arc::clone(&api));
        let mut m = matrix(&["北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県"]);

        let mut batches = Vec::new();
        let failed = agg.load_large_counts(&mut m, |done, total| batches.push((done, total))).await;
        assert_eq!(failed, 0);
        assert_eq!(batches, vec![(5, 6), (6, 6)]);
        assert_eq!(m.count(&CellKey::new("山形県", "製造業", "")), Some(100));
        // 中分類は未取得のまま
        assert_eq!(m.state(&CellKey::new("山形県", "製造業", "印刷業")), CellState::Unloaded);

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 12);
        assert!(requests.iter().all(|r| r.limit == Some(1) && r.industry_mid_name.is_none()));
    }

    #[tokio::test]
    async fn test_failed_cell_degrades_to_zero() {
        let api = CountingApi::new(Some("青森県"));
        let agg = MatrixAggregator::new(api);
        let mut m = matrix(&["北海道", "青森県"]);

        let failed = agg.load_large_counts(&mut m, |_, _| {}).await;
        assert_eq!(failed, 2);
        assert_eq!(m.state(&CellKey::new("青森県", "卸売業", "")), CellState::Failed);
        assert_eq!(m.count(&CellKey::new("青森県", "卸売業", "")), Some(0));
        assert_eq!(m.count(&CellKey::new("北海道", "卸売業", "")), Some(100));
    }

    #[tokio::test]
    async fn test_medium_sweep_does_not_overwrite_user_fetch() {
        let api = CountingApi::new(None);
        let agg = MatrixAggregator::new(api);
        let mut m = matrix(&["東京都", "大阪府"]);

        let user_key = CellKey::new("東京都", "製造業", "印刷業");
        m.mark_loading(&user_key);
        m.apply(CellUpdate {
            key: user_key.clone(),
            outcome: CellOutcome::Count(999),
            origin: UpdateOrigin::User,
        });

        let mut sweep = agg.spawn_medium_sweep(&m);
        assert_eq!(sweep.total, 4);
        let mut received = 0;
        while let Some(update) = sweep.updates.recv().await {
            received += 1;
            m.apply(update);
        }
        sweep.handle.await.unwrap();

        assert_eq!(received, 4);
        assert_eq!(m.count(&user_key), Some(999));
        assert_eq!(m.count(&CellKey::new("大阪府", "製造業", "食料品製造業")), Some(6));
        assert_eq!(m.progress(), (4, 8));
    }

    #[tokio::test]
    async fn test_fetch_cell_and_list() {
        let api = CountingApi::new(None);
        let agg = MatrixAggregator::new(Arc::clone(&api));
        let mut m = matrix(&["東京都"]);
        let key = CellKey::new("東京都", "製造業", "印刷業");

        assert_eq!(agg.fetch_cell(&mut m, &key).await, CellState::Loaded(3));
        // 取得済みなら再取得しない
        assert_eq!(agg.fetch_cell(&mut m, &key).await, CellState::Loaded(3));
        assert_eq!(api.requests.lock().unwrap().len(), 1);

        agg.list_companies(&key).await.unwrap();
        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.last().unwrap().limit, Some(100));
    }

    #[tokio::test]
    async fn test_sweep_stops_when_receiver_dropped() {
        let api = CountingApi::new(None);
        let agg = MatrixAggregator::new(api);
        let m = matrix(&["東京都", "大阪府", "京都府", "兵庫県"]);
        let sweep = agg.spawn_medium_sweep(&m);
        drop(sweep.updates);
        sweep.handle.await.unwrap();
    }
}
