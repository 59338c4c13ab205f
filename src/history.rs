//! 検索履歴（保存された検索条件）

use crate::error::{AppError, Result};
use crate::link::DeepLink;
use crate::store::models::new_id;
use crate::store::{DataStore, SavedQuery};
use chrono::{DateTime, Utc};
use company_search_common::filter::FilterSet;

/// 一覧の並び順
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HistoryOrder {
    /// 最終実行日時の新しい順
    #[default]
    Recent,
    /// 実行回数の多い順
    Popular,
}

/// 保存時のタイトル
pub fn query_title(filters: &FilterSet) -> String {
    match filters.keyword() {
        Some(q) => format!("キーワード: {}", q),
        None => format!("絞り込み: {}", filters.summary()),
    }
}

fn query_description(filters: &FilterSet) -> String {
    match filters.keyword() {
        Some(q) => format!("キーワード検索: {}", q),
        None => format!("絞り込み検索: {}", filters.summary()),
    }
}

/// 検索を履歴に記録
///
/// キーワードとタイトルが同じ既存の履歴があれば、実行回数・最終実行日時・
/// 件数を更新する。なければ新規に作成する。
pub fn record_search<D: DataStore>(
    store: &mut D,
    filters: &FilterSet,
    result_count: u64,
    created_by: &str,
    now: DateTime<Utc>,
) -> Result<SavedQuery> {
    let title = query_title(filters);
    let keyword = filters.keyword().map(str::to_string);

    let existing = store
        .list_all::<SavedQuery>()?
        .into_iter()
        .find(|q| q.title == title && q.keyword == keyword);

    if let Some(mut query) = existing {
        query.usage_count += 1;
        query.last_run_at = now;
        query.last_result_count = result_count;
        store.update(&query)?;
        tracing::debug!(id = %query.id, usage = query.usage_count, "saved query reused");
        return Ok(query);
    }

    let query = SavedQuery {
        id: new_id(),
        title,
        keyword,
        filters: serde_json::to_string(filters)?,
        last_result_count: result_count,
        last_run_at: now,
        created_at: now,
        usage_count: 1,
        tags: filters.tags(),
        is_public: true,
        created_by: created_by.to_string(),
        description: Some(query_description(filters)),
    };
    store.create(&query)?;
    tracing::debug!(id = %query.id, "saved query created");
    Ok(query)
}

pub fn list_saved<D: DataStore>(store: &D, order: HistoryOrder) -> Result<Vec<SavedQuery>> {
    let mut queries = store.list_all::<SavedQuery>()?;
    match order {
        HistoryOrder::Recent => queries.sort_by(|a, b| b.last_run_at.cmp(&a.last_run_at)),
        HistoryOrder::Popular => queries.sort_by(|a, b| b.usage_count.cmp(&a.usage_count)),
    }
    Ok(queries)
}

pub fn delete_saved<D: DataStore>(store: &mut D, id: &str) -> Result<()> {
    if store.delete::<SavedQuery>(id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("検索履歴 {} が見つかりません", id)))
    }
}

/// 保存された条件を検索画面へのリンクに戻す
///
/// キーワードがあればキーワード検索、なければ絞り込み条件の有無で振り分ける。
pub fn replay(query: &SavedQuery) -> DeepLink {
    let filters = query.filter_set();
    let keyword = query
        .keyword
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| filters.keyword().map(str::to_string));

    if keyword.is_none() && filters.has_advanced_facets() {
        return DeepLink::Advanced(filters);
    }
    DeepLink::Keyword {
        q: keyword,
        pref: filters.server_prefecture().map(str::to_string),
    }
}
