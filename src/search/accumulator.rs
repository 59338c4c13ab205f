//! 絞り込み検索の結果蓄積
//!
//! サーバーのページ（最大200件、カーソル連結）を順番に取得してID基準で結合し、
//! サーバーが扱えない条件（複数都道府県・各種範囲）を取得後に適用する。

use crate::api::SearchApi;
use crate::error::{AppError, Result};
use company_search_common::filter::FilterSet;
use company_search_common::paging::{absorb_page, FetchPolicy, SearchMode};
use company_search_common::types::Company;
use std::collections::HashSet;

/// 1回の実行の内訳
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// 取得できたページ数
    pub pages: usize,
    /// サーバーから受け取った行数
    pub fetched: usize,
    /// 結果に加わった行数（絞り込み後）
    pub added: usize,
}

/// ページ取得ごとの進捗（ページ番号は1始まり、蓄積件数）
pub trait RunProgress {
    fn page_fetched(&mut self, page: usize, accumulated: usize);
}

impl<F: FnMut(usize, usize)> RunProgress for F {
    fn page_fetched(&mut self, page: usize, accumulated: usize) {
        self(page, accumulated)
    }
}

#[derive(Debug, Clone)]
pub struct SearchAccumulator {
    filters: FilterSet,
    page_size: u32,
    policy: FetchPolicy,
    rows: Vec<Company>,
    total: u64,
    cursor: Option<u64>,
    has_more: bool,
}

impl SearchAccumulator {
    pub fn new(filters: FilterSet, page_size: u32) -> Self {
        Self {
            filters,
            page_size,
            policy: FetchPolicy::default(),
            rows: Vec::new(),
            total: 0,
            cursor: None,
            has_more: false,
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// 条件を差し替え、結果をリセット
    pub fn set_filters(&mut self, filters: FilterSet) {
        *self = Self::new(filters, self.page_size).with_policy(self.policy);
    }

    pub fn rows(&self) -> &[Company] {
        &self.rows
    }

    /// 表示用の件数
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub async fn run<S: SearchApi>(&mut self, api: &S, mode: SearchMode) -> Result<RunReport> {
        self.run_with_progress(api, mode, |_: usize, _: usize| {}).await
    }

    /// 新規検索または追加読み込みを1回実行
    ///
    /// 途中で失敗した場合は残りの取得を打ち切り、それまでに受け取った
    /// ページを反映したうえでエラーを返す（続きは再度読み込める）。
    pub async fn run_with_progress<S, P>(
        &mut self,
        api: &S,
        mode: SearchMode,
        mut progress: P,
    ) -> Result<RunReport>
    where
        S: SearchApi,
        P: RunProgress,
    {
        if mode == SearchMode::LoadMore && !self.has_more {
            return Ok(RunReport::default());
        }

        let max_pages = self.policy.max_pages(&self.filters, mode);
        let mut cursor = match mode {
            SearchMode::New => None,
            SearchMode::LoadMore => self.cursor,
        };
        let mut fetched_rows: Vec<Company> = Vec::new();
        let mut report = RunReport::default();
        let mut has_more = true;
        let mut failure: Option<AppError> = None;

        tracing::debug!(?mode, max_pages, ?cursor, "accumulator run");

        while has_more && report.pages < max_pages {
            let request = self.filters.server_request(self.page_size, cursor);
            let page = match api.search(&request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(error = %e, pages = report.pages, "search aborted");
                    failure = Some(e);
                    break;
                }
            };

            let step = absorb_page(&mut fetched_rows, cursor, self.page_size, page);
            cursor = Some(step.next_cursor);
            has_more = step.has_more;
            report.pages += 1;
            report.fetched += step.fetched;
            progress.page_fetched(report.pages, fetched_rows.len());
        }

        if report.pages == 0 {
            // 何も受け取れなかった場合は前回の状態を保持
            if let Some(e) = failure {
                return Err(e);
            }
        }

        let matched: Vec<Company> = if self.filters.is_empty() {
            fetched_rows
        } else {
            fetched_rows
                .into_iter()
                .filter(|c| self.filters.matches(c))
                .collect()
        };

        match mode {
            SearchMode::New => {
                report.added = matched.len();
                self.rows = matched;
                self.total = self.rows.len() as u64;
            }
            SearchMode::LoadMore => {
                let known: HashSet<&str> = self.rows.iter().map(|c| c.id.as_str()).collect();
                let fresh: Vec<Company> = matched
                    .into_iter()
                    .filter(|c| !known.contains(c.id.as_str()))
                    .collect();
                report.added = fresh.len();
                self.total += fresh.len() as u64;
                self.rows.extend(fresh);
            }
        }

        self.cursor = cursor;
        match failure {
            Some(e) => {
                self.has_more = true;
                Err(e)
            }
            None => {
                self.has_more = has_more;
                tracing::debug!(?report, total = self.total, has_more, "accumulator run finished");
                Ok(report)
            }
        }
    }
}
