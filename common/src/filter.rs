//! 検索条件（フィルターセット）
//!
//! サーバー側で絞り込める条件（キーワード・単一都道府県・業種・売上高）と、
//! 取得後にクライアント側で適用する条件（複数都道府県・各種範囲）を保持する。

use crate::facets::{region_prefectures, Facet, Range};
use crate::types::{Company, SearchRequest, DEFAULT_ORDER_BY, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub prefectures: Vec<String>,
    pub capital: Option<Range>,
    pub employees: Option<Range>,
    pub offices: Option<Range>,
    pub factories: Option<Range>,
    pub founded_year: Option<Range>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_major: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_mid_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_min_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_max_k: Option<i64>,
}

impl FilterSet {
    pub fn range(&self, facet: Facet) -> Option<&Range> {
        match facet {
            Facet::Capital => self.capital.as_ref(),
            Facet::Employees => self.employees.as_ref(),
            Facet::Offices => self.offices.as_ref(),
            Facet::Factories => self.factories.as_ref(),
            Facet::FoundedYear => self.founded_year.as_ref(),
        }
    }

    /// 区分ごとに排他で設定（Noneで解除）
    pub fn set_range(&mut self, facet: Facet, range: Option<Range>) {
        let slot = match facet {
            Facet::Capital => &mut self.capital,
            Facet::Employees => &mut self.employees,
            Facet::Offices => &mut self.offices,
            Facet::Factories => &mut self.factories,
            Facet::FoundedYear => &mut self.founded_year,
        };
        *slot = range;
    }

    pub fn is_active(&self, facet: Facet) -> bool {
        self.range(facet).is_some()
    }

    pub fn toggle_prefecture(&mut self, prefecture: &str) {
        if let Some(pos) = self.prefectures.iter().position(|p| p == prefecture) {
            self.prefectures.remove(pos);
        } else {
            self.prefectures.push(prefecture.to_string());
        }
    }

    /// 地域単位の切り替え（全選択済みなら外し、そうでなければ追加）
    pub fn toggle_region(&mut self, region: &str) -> bool {
        let Some(prefs) = region_prefectures(region) else {
            return false;
        };
        let all_selected = prefs.iter().all(|p| self.prefectures.iter().any(|s| s == p));
        if all_selected {
            self.prefectures.retain(|s| !prefs.contains(&s.as_str()));
        } else {
            for p in prefs {
                if !self.prefectures.iter().any(|s| s == p) {
                    self.prefectures.push(p.to_string());
                }
            }
        }
        true
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    fn has_range_facets(&self) -> bool {
        Facet::ALL.iter().any(|f| self.is_active(*f))
    }

    /// 絞り込み検索の条件（都道府県・範囲）が一つでもあるか
    pub fn has_advanced_facets(&self) -> bool {
        !self.prefectures.is_empty() || self.has_range_facets()
    }

    /// クライアント側で適用する条件があるか
    pub fn has_local_facets(&self) -> bool {
        self.prefectures.len() > 1 || self.has_range_facets()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_advanced_facets()
            && self.keyword().is_none()
            && self.industry_major.is_none()
            && self.industry_mid_name.is_none()
            && self.revenue_min_k.is_none()
            && self.revenue_max_k.is_none()
    }

    /// 前後の空白を除いたキーワード（空ならNone）
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// 単一都道府県ならサーバー側で絞り込む
    pub fn server_prefecture(&self) -> Option<&str> {
        match self.prefectures.as_slice() {
            [single] => Some(single.as_str()),
            _ => None,
        }
    }

    /// サーバーに送る条件のみを含むリクエスト
    pub fn server_request(&self, limit: u32, cursor: Option<u64>) -> SearchRequest {
        SearchRequest {
            q: self.keyword().map(str::to_string),
            pref: self.server_prefecture().map(str::to_string),
            industry_major: self.industry_major.clone(),
            industry_mid_name: self.industry_mid_name.clone(),
            revenue_min_k: self.revenue_min_k,
            revenue_max_k: self.revenue_max_k,
            order_by: Some(DEFAULT_ORDER_BY.to_string()),
            desc: Some(true),
            limit: Some(limit.clamp(1, MAX_PAGE_SIZE)),
            cursor,
            ..Default::default()
        }
    }

    /// クライアント側の条件で判定（値が欠けている企業は一致しない）
    pub fn matches(&self, company: &Company) -> bool {
        if self.prefectures.len() > 1 {
            let in_list = company
                .pref
                .as_ref()
                .is_some_and(|p| self.prefectures.iter().any(|s| s == p));
            if !in_list {
                return false;
            }
        }

        Facet::ALL.iter().all(|facet| match self.range(*facet) {
            None => true,
            Some(range) => facet
                .value_of(company)
                .is_some_and(|value| range.contains(value)),
        })
    }

    /// 条件の要約（保存タイトル・ファイル名に使用）
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.prefectures.is_empty() {
            parts.push(format!("都道府県: {}", self.prefectures.join(", ")));
        }
        for facet in Facet::ALL {
            if let Some(bin) = self.range(facet).and_then(|r| facet.bin_for(r)) {
                parts.push(format!("{}: {}", facet.name(), bin.label));
            }
        }
        if parts.is_empty() {
            "条件なし".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// 保存時のタグ（都道府県名と選択肢ラベル）
    pub fn tags(&self) -> Vec<String> {
        let mut tags = self.prefectures.clone();
        for facet in Facet::ALL {
            if let Some(bin) = self.range(facet).and_then(|r| facet.bin_for(r)) {
                tags.push(bin.label.to_string());
            }
        }
        tags
    }

    /// 条件の同一性判定用キー
    pub fn condition_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::CAPITAL_BINS;
    use crate::types::CompanyStats;

    fn company(id: &str, pref: &str, capital_k: Option<i64>) -> Company {
        Company {
            id: id.into(),
            pref: Some(pref.into()),
            company_stats: Some(CompanyStats {
                capital_k,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filter_set() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert!(!filters.has_local_facets());
        assert_eq!(filters.summary(), "条件なし");
    }

    #[test]
    fn test_blank_keyword_is_inactive() {
        let filters = FilterSet {
            keyword: Some("   ".into()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert_eq!(filters.server_request(20, None).q, None);
    }

    #[test]
    fn test_single_prefecture_goes_to_server() {
        let mut filters = FilterSet::default();
        filters.toggle_prefecture("東京都");
        let req = filters.server_request(200, Some(400));
        assert_eq!(req.pref.as_deref(), Some("東京都"));
        assert_eq!(req.cursor, Some(400));
        assert_eq!(req.order_by.as_deref(), Some("revenueK_latest"));
        assert!(!filters.has_local_facets());
    }

    #[test]
    fn test_multiple_prefectures_filtered_locally() {
        let mut filters = FilterSet::default();
        filters.toggle_prefecture("東京都");
        filters.toggle_prefecture("大阪府");
        assert_eq!(filters.server_request(200, None).pref, None);
        assert!(filters.has_local_facets());
        assert!(filters.matches(&company("1", "大阪府", None)));
        assert!(!filters.matches(&company("2", "京都府", None)));
    }

    #[test]
    fn test_toggle_region() {
        let mut filters = FilterSet::default();
        filters.toggle_prefecture("東京都");
        assert!(filters.toggle_region("関東"));
        assert_eq!(filters.prefectures.len(), 7);
        assert!(filters.toggle_region("関東"));
        assert!(filters.prefectures.is_empty());
        assert!(!filters.toggle_region("存在しない地域"));
    }

    #[test]
    fn test_range_filter_excludes_missing_values() {
        let mut filters = FilterSet::default();
        filters.set_range(Facet::Capital, Some(CAPITAL_BINS[1].range()));
        assert!(filters.matches(&company("1", "東京都", Some(99_999))));
        assert!(!filters.matches(&company("2", "東京都", Some(100_000))));
        assert!(!filters.matches(&company("3", "東京都", None)));
    }

    #[test]
    fn test_inactive_differs_from_unbounded() {
        let mut filters = FilterSet::default();
        assert!(filters.matches(&company("1", "東京都", None)));
        filters.set_range(Facet::Capital, Some(Range::new(Some(0), None)));
        assert!(filters.is_active(Facet::Capital));
        assert!(!filters.matches(&company("1", "東京都", None)));
    }

    #[test]
    fn test_summary_and_tags() {
        let mut filters = FilterSet::default();
        filters.toggle_prefecture("北海道");
        filters.set_range(Facet::Employees, Some(Range::new(Some(10), Some(100))));
        assert_eq!(filters.summary(), "都道府県: 北海道, 従業員数: 10-100人");
        assert_eq!(filters.tags(), vec!["北海道".to_string(), "10-100人".to_string()]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut filters = FilterSet::default();
        filters.set_range(Facet::FoundedYear, Some(Range::new(None, Some(1950))));
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["foundedYear"]["max"], 1950);
        assert!(json["capital"].is_null());
        assert!(json.get("keyword").is_none());

        let restored: FilterSet = serde_json::from_value(json).unwrap();
        assert_eq!(restored, filters);
    }

    #[test]
    fn test_condition_key_changes_with_filters() {
        let mut filters = FilterSet::default();
        let before = filters.condition_key();
        filters.toggle_prefecture("沖縄県");
        assert_ne!(before, filters.condition_key());
    }
}
