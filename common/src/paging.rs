//! ページ取得の補助ロジック
//!
//! 複数ページの結果をID基準で重複排除しながら結合し、
//! 次のカーソルと続きの有無を判定する。

use crate::filter::FilterSet;
use crate::types::{Company, SearchResponse};
use std::collections::HashMap;

/// 新規検索か追加読み込みか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    New,
    LoadMore,
}

/// 1回の検索で取得する最大ページ数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// 都道府県が1つだけ選択されている場合（約10,000件）
    pub single_prefecture_pages: usize,
    /// クライアント側の条件がある新規検索（約2,000件）
    pub filtered_pages: usize,
    /// それ以外
    pub default_pages: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            single_prefecture_pages: 50,
            filtered_pages: 10,
            default_pages: 1,
        }
    }
}

impl FetchPolicy {
    pub fn max_pages(&self, filters: &FilterSet, mode: SearchMode) -> usize {
        if filters.prefectures.len() == 1 {
            self.single_prefecture_pages
        } else if filters.has_local_facets() && mode == SearchMode::New {
            self.filtered_pages
        } else {
            self.default_pages
        }
    }
}

/// ID基準で結合し、追加された件数を返す
///
/// 既存IDの行は後から来た値で置き換え、位置は最初に現れた位置を保つ。
pub fn merge_unique(acc: &mut Vec<Company>, page: Vec<Company>) -> usize {
    let mut index: HashMap<String, usize> = acc
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();
    let before = acc.len();

    for company in page {
        match index.get(&company.id) {
            Some(&i) => acc[i] = company,
            None => {
                index.insert(company.id.clone(), acc.len());
                acc.push(company);
            }
        }
    }

    acc.len() - before
}

/// 次のカーソル（サーバー指定がなければ オフセット + 取得件数）
pub fn advance_cursor(previous: Option<u64>, response: &SearchResponse) -> u64 {
    response
        .next_cursor
        .unwrap_or_else(|| previous.unwrap_or(0) + response.items.len() as u64)
}

/// 続きのページがありそうか
pub fn infer_more(
    response: &SearchResponse,
    page_size: u32,
    added: usize,
    accumulated: usize,
) -> bool {
    response.next_cursor.is_some()
        || more_inferred(response.items.len(), page_size, added, response.total, accumulated)
}

// ページが埋まり、新規行があり、総件数に未到達（0は不明）
fn more_inferred(fetched: usize, page_size: u32, added: usize, total: u64, accumulated: usize) -> bool {
    fetched == page_size as usize && added > 0 && (total == 0 || (accumulated as u64) < total)
}

/// 1ページ分を取り込んだ結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStep {
    pub fetched: usize,
    pub added: usize,
    pub next_cursor: u64,
    pub has_more: bool,
}

/// ページを結合し、次のカーソルと続きの有無を返す
pub fn absorb_page(
    acc: &mut Vec<Company>,
    previous_cursor: Option<u64>,
    page_size: u32,
    page: SearchResponse,
) -> PageStep {
    let next_cursor = advance_cursor(previous_cursor, &page);
    let SearchResponse {
        total,
        next_cursor: server_cursor,
        items,
    } = page;
    let fetched = items.len();
    let added = merge_unique(acc, items);
    let has_more =
        server_cursor.is_some() || more_inferred(fetched, page_size, added, total, acc.len());

    PageStep {
        fetched,
        added,
        next_cursor,
        has_more,
    }
}
