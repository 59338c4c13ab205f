//! キーワード検索
//!
//! 1回の実行で1ページだけ取得する。カーソル0（または未指定）は置換、
//! 同じ条件でカーソルが進んでいれば追記。
//! 条件が変わった後に届いた古い結果は破棄する（最後の条件キーが勝つ）。

use crate::api::SearchApi;
use crate::error::Result;
use company_search_common::filter::FilterSet;
use company_search_common::paging::absorb_page;
use company_search_common::types::{Company, SearchRequest, SearchResponse};

/// 発行済みリクエスト（結果の受け入れ判定に使う）
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTicket {
    key: String,
    append: bool,
    pub request: SearchRequest,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordSearch {
    page_size: u32,
    filters: FilterSet,
    rows: Vec<Company>,
    total: u64,
    cursor: Option<u64>,
    has_more: bool,
    /// 最後に発行した条件
    active_key: Option<String>,
    /// 現在の行を生んだ条件
    rows_key: Option<String>,
}

impl KeywordSearch {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// 条件変更（結果は「未検索」に戻る）
    pub fn set_filters(&mut self, filters: FilterSet) {
        if filters != self.filters {
            self.filters = filters;
            self.rows.clear();
            self.total = 0;
            self.cursor = None;
            self.has_more = false;
        }
    }

    pub fn rows(&self) -> &[Company] {
        &self.rows
    }

    /// サーバーが返した総件数
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn next_cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    // サーバーに送る条件そのものをキーにする
    fn condition_key(&self) -> String {
        let request = self.filters.server_request(self.page_size, None);
        serde_json::to_string(&request).unwrap_or_default()
    }

    /// リクエストを組み立て、この条件を最新として記録
    pub fn prepare(&mut self, cursor: Option<u64>) -> KeywordTicket {
        let key = self.condition_key();
        let same_condition = self.rows_key.as_deref() == Some(key.as_str());
        let append = same_condition && cursor.is_some_and(|c| c > 0);
        self.active_key = Some(key.clone());

        KeywordTicket {
            key,
            append,
            request: self.filters.server_request(self.page_size, cursor),
        }
    }

    /// 結果を反映（古い条件の結果なら false）
    pub fn complete(&mut self, ticket: KeywordTicket, response: SearchResponse) -> bool {
        if self.active_key.as_deref() != Some(ticket.key.as_str()) {
            tracing::debug!("stale keyword result discarded");
            return false;
        }

        let total = response.total;
        if !ticket.append {
            self.rows.clear();
        }
        let step = absorb_page(&mut self.rows, ticket.request.cursor, self.page_size, response);

        self.total = total;
        self.cursor = Some(step.next_cursor);
        self.has_more = step.has_more;
        self.rows_key = Some(ticket.key);
        true
    }

    /// 先頭ページを検索（置換）
    pub async fn search<S: SearchApi>(&mut self, api: &S) -> Result<bool> {
        let ticket = self.prepare(Some(0));
        let response = api.search(&ticket.request).await?;
        Ok(self.complete(ticket, response))
    }

    /// 次のページを追記
    pub async fn next_page<S: SearchApi>(&mut self, api: &S) -> Result<bool> {
        if !self.has_more {
            return Ok(false);
        }
        let ticket = self.prepare(self.cursor);
        let response = api.search(&ticket.request).await?;
        Ok(self.complete(ticket, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(ids: &[&str], total: u64, next_cursor: Option<u64>) -> SearchResponse {
        SearchResponse {
            total,
            next_cursor,
            items: ids
                .iter()
                .map(|id| Company {
                    id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn keyword(q: &str) -> FilterSet {
        FilterSet {
            keyword: Some(q.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_replace_then_append() {
        let mut search = KeywordSearch::new(2);
        search.set_filters(keyword("印刷"));

        let t1 = search.prepare(Some(0));
        assert_eq!(t1.request.q.as_deref(), Some("印刷"));
        assert!(search.complete(t1, resp(&["a", "b"], 5, Some(2))));
        assert_eq!(search.rows().len(), 2);
        assert!(search.has_more());

        let t2 = search.prepare(search.next_cursor());
        assert!(t2.append);
        assert!(search.complete(t2, resp(&["c", "d"], 5, Some(4))));
        assert_eq!(search.rows().len(), 4);
        assert_eq!(search.total(), 5);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut search = KeywordSearch::new(20);
        search.set_filters(keyword("海苔"));
        let old = search.prepare(Some(0));

        search.set_filters(keyword("札幌"));
        let new = search.prepare(Some(0));

        assert!(search.complete(new, resp(&["s1"], 1, None)));
        assert!(!search.complete(old, resp(&["n1", "n2"], 2, None)));
        assert_eq!(search.rows()[0].id, "s1");
        assert!(!search.has_more());
    }

    #[test]
    fn test_cursor_zero_replaces_even_for_same_condition() {
        let mut search = KeywordSearch::new(2);
        search.set_filters(keyword("卸売"));
        let t = search.prepare(Some(0));
        search.complete(t, resp(&["a", "b"], 4, Some(2)));

        let again = search.prepare(Some(0));
        assert!(!again.append);
        search.complete(again, resp(&["x", "y"], 4, Some(2)));
        let ids: Vec<&str> = search.rows().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_changed_condition_clears_rows() {
        let mut search = KeywordSearch::new(2);
        search.set_filters(keyword("a"));
        let t = search.prepare(Some(0));
        search.complete(t, resp(&["1"], 1, None));
        search.set_filters(keyword("b"));
        assert!(search.rows().is_empty());
        assert_eq!(search.total(), 0);
    }
}
