//! 検索の実行
//!
//! - accumulator: 絞り込み検索（複数ページ蓄積＋クライアント側絞り込み）
//! - keyword: キーワード検索（1ページずつ）

pub mod accumulator;
pub mod keyword;

pub use accumulator::{RunProgress, RunReport, SearchAccumulator};
pub use keyword::{KeywordSearch, KeywordTicket};

use crate::api::SearchApi;
use crate::error::{AppError, Result};
use company_search_common::types::{Company, SearchRequest};

/// IDで企業を特定する（IDを全文検索して完全一致の行を採る）
pub async fn find_company_by_id<S: SearchApi>(api: &S, id: &str) -> Result<Company> {
    let request = SearchRequest {
        q: Some(id.to_string()),
        limit: Some(10),
        ..Default::default()
    };
    let response = api.search(&request).await?;
    response
        .items
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| {
            AppError::NotFound(format!("企業ID: {} の詳細データが見つかりませんでした。", id))
        })
}
