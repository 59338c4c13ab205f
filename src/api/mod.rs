//! 検索エンドポイントとの境界
//!
//! 検索・集計のロジックは `SearchApi` トレイト越しにのみ通信するため、
//! テストでは偽の実装に差し替えられる。

mod http;

pub use http::{HttpIngestClient, HttpSearchClient};

use crate::error::{AppError, Result};
use company_search_common::types::{Company, SearchRequest, SearchResponse};
use std::future::Future;

/// 検索エンドポイント
pub trait SearchApi: Send + Sync {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse>> + Send;
}

/// 企業データの取り込み先
pub trait CompanyIngest: Send + Sync {
    fn ingest(&self, company: &Company) -> impl Future<Output = Result<()>> + Send;
}

/// HTTPステータスをエラー種別に振り分ける
pub fn classify_status(status: u16, body: String) -> AppError {
    if (500..600).contains(&status) {
        AppError::ServiceUnavailable { status, body }
    } else {
        let body = if body.is_empty() {
            "fetch failed".to_string()
        } else {
            body
        };
        AppError::Api { status, body }
    }
}
