//! 都道府県×業種マトリックスの状態
//!
//! 各セルは明示的な状態タグを持ち、前方向にのみ遷移する:
//! `Unloaded → (Loading) → Loaded(n) | Failed`
//!
//! バックグラウンド集計の結果は `Unloaded` のセルにだけ書き込まれるため、
//! ユーザー操作で取得済みのセルを上書きしない。

use crate::facets::prefecture_index;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// セルの識別子（中分類が空なら大分類のみの列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub prefecture: String,
    pub large: String,
    pub medium: String,
}

impl CellKey {
    pub fn new(prefecture: &str, large: &str, medium: &str) -> Self {
        Self {
            prefecture: prefecture.to_string(),
            large: large.to_string(),
            medium: medium.to_string(),
        }
    }

    pub fn is_large_only(&self) -> bool {
        self.medium.is_empty()
    }

    /// キャッシュキー（`都道府県-大分類-中分類`）
    pub fn cache_key(&self) -> String {
        format!("{}-{}-{}", self.prefecture, self.large, self.medium)
    }
}

/// セルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Unloaded,
    Loading,
    Loaded(u64),
    /// 取得失敗（表示上は0件）
    Failed,
}

impl CellState {
    /// 表示用の件数（未取得はNone、失敗は0）
    pub fn count(&self) -> Option<u64> {
        match self {
            CellState::Loaded(n) => Some(*n),
            CellState::Failed => Some(0),
            CellState::Unloaded | CellState::Loading => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, CellState::Loaded(_) | CellState::Failed)
    }
}

/// 更新の発生元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// 大分類の初期集計
    Eager,
    /// 中分類のバックグラウンド集計
    Background,
    /// セルのクリック
    User,
}

/// 取得結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    Count(u64),
    Failed,
}

impl CellOutcome {
    fn into_state(self) -> CellState {
        match self {
            CellOutcome::Count(n) => CellState::Loaded(n),
            CellOutcome::Failed => CellState::Failed,
        }
    }
}

/// セル更新メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub key: CellKey,
    pub outcome: CellOutcome,
    pub origin: UpdateOrigin,
}

/// 業種分類（大分類 → 中分類）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndustryTaxonomy {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl IndustryTaxonomy {
    pub fn insert(&mut self, large: &str, medium: Option<&str>) {
        if large.is_empty() {
            return;
        }
        let mediums = self.categories.entry(large.to_string()).or_default();
        if let Some(m) = medium.filter(|m| !m.is_empty()) {
            mediums.insert(m.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 大分類（読み順）
    pub fn large_categories(&self) -> Vec<&str> {
        let mut larges: Vec<&str> = self.categories.keys().map(|s| s.as_str()).collect();
        larges.sort_by(|a, b| compare_ja(a, b));
        larges
    }

    /// 列の並び（大分類の直後にその中分類）
    pub fn columns(&self) -> Vec<IndustryColumn> {
        let mut columns = Vec::new();
        for large in self.large_categories() {
            columns.push(IndustryColumn {
                large: large.to_string(),
                medium: String::new(),
            });
            let mut mediums: Vec<&String> = self.categories[large].iter().collect();
            mediums.sort_by(|a, b| compare_ja(a, b));
            for medium in mediums {
                columns.push(IndustryColumn {
                    large: large.to_string(),
                    medium: medium.clone(),
                });
            }
        }
        columns
    }
}

/// マトリックスの列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryColumn {
    pub large: String,
    /// 空なら大分類のみ
    pub medium: String,
}

impl IndustryColumn {
    pub fn is_large_only(&self) -> bool {
        self.medium.is_empty()
    }

    pub fn label(&self) -> &str {
        if self.is_large_only() {
            &self.large
        } else {
            &self.medium
        }
    }
}

/// 都道府県を標準順に並べる（不明な名前は後ろに文字列順）
/// 日本語名の比較
///
/// カタカナはひらがな、全角英数は半角に寄せてから比べる。
/// 漢字は読みを持たないので符号位置順のまま。
pub fn compare_ja(a: &str, b: &str) -> Ordering {
    fn fold(c: char) -> char {
        let code = c as u32;
        let folded = match code {
            0x30A1..=0x30F6 => code - 0x60,
            0xFF01..=0xFF5E => code - 0xFEE0,
            _ => code,
        };
        char::from_u32(folded).unwrap_or(c)
    }

    a.chars()
        .map(fold)
        .cmp(b.chars().map(fold))
        .then_with(|| a.cmp(b))
}

pub fn sort_prefectures(prefectures: &mut [String]) {
    prefectures.sort_by(|a, b| match (prefecture_index(a), prefecture_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_ja(a, b),
    });
}

/// 件数マトリックス
#[derive(Debug, Clone, Default)]
pub struct Matrix {
    prefectures: Vec<String>,
    columns: Vec<IndustryColumn>,
    cells: HashMap<CellKey, CellState>,
}

impl Matrix {
    /// 全セルを未取得で初期化
    pub fn new(prefectures: Vec<String>, taxonomy: &IndustryTaxonomy) -> Self {
        let columns = taxonomy.columns();
        let mut cells = HashMap::new();
        for pref in &prefectures {
            for col in &columns {
                cells.insert(CellKey::new(pref, &col.large, &col.medium), CellState::Unloaded);
            }
        }
        Self {
            prefectures,
            columns,
            cells,
        }
    }

    pub fn prefectures(&self) -> &[String] {
        &self.prefectures
    }

    pub fn columns(&self) -> &[IndustryColumn] {
        &self.columns
    }

    /// 未登録のキーは未取得扱い
    pub fn state(&self, key: &CellKey) -> CellState {
        self.cells.get(key).copied().unwrap_or_default()
    }

    pub fn count(&self, key: &CellKey) -> Option<u64> {
        self.state(key).count()
    }

    pub fn large_keys(&self) -> Vec<CellKey> {
        self.keys_where(|col| col.is_large_only())
    }

    pub fn medium_keys(&self) -> Vec<CellKey> {
        self.keys_where(|col| !col.is_large_only())
    }

    fn keys_where(&self, pred: impl Fn(&IndustryColumn) -> bool) -> Vec<CellKey> {
        let mut keys = Vec::new();
        for pref in &self.prefectures {
            for col in self.columns.iter().filter(|c| pred(c)) {
                keys.push(CellKey::new(pref, &col.large, &col.medium));
            }
        }
        keys
    }

    /// クリックによる取得開始（未取得または失敗のセルのみ）
    pub fn mark_loading(&mut self, key: &CellKey) -> bool {
        let state = self.cells.entry(key.clone()).or_default();
        match state {
            CellState::Unloaded | CellState::Failed => {
                *state = CellState::Loading;
                true
            }
            CellState::Loading | CellState::Loaded(_) => false,
        }
    }

    /// 更新を適用し、書き込んだかどうかを返す
    pub fn apply(&mut self, update: CellUpdate) -> bool {
        let state = self.cells.entry(update.key).or_default();
        let writable = match update.origin {
            UpdateOrigin::Background => matches!(state, CellState::Unloaded),
            UpdateOrigin::Eager | UpdateOrigin::User => matches!(
                state,
                CellState::Unloaded | CellState::Loading | CellState::Failed
            ),
        };
        if writable {
            *state = update.outcome.into_state();
        }
        writable
    }

    /// (取得済み, 全セル)
    pub fn progress(&self) -> (usize, usize) {
        let settled = self.cells.values().filter(|s| s.is_settled()).count();
        (settled, self.cells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> IndustryTaxonomy {
        let mut t = IndustryTaxonomy::default();
        t.insert("製造業", Some("食料品製造業"));
        t.insert("製造業", Some("印刷業"));
        t.insert("卸売業", None);
        t.insert("", Some("無視される"));
        t
    }

    fn update(key: &CellKey, outcome: CellOutcome, origin: UpdateOrigin) -> CellUpdate {
        CellUpdate {
            key: key.clone(),
            outcome,
            origin,
        }
    }

    #[test]
    fn test_columns_order() {
        let cols = taxonomy().columns();
        let labels: Vec<&str> = cols.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["卸売業", "製造業", "印刷業", "食料品製造業"]);
    }

    #[test]
    fn test_new_matrix_is_unloaded() {
        let m = Matrix::new(vec!["東京都".into(), "大阪府".into()], &taxonomy());
        assert_eq!(m.large_keys().len(), 4);
        assert_eq!(m.medium_keys().len(), 4);
        assert_eq!(m.progress(), (0, 8));
        let key = CellKey::new("東京都", "製造業", "印刷業");
        assert_eq!(m.state(&key), CellState::Unloaded);
        assert_eq!(m.count(&key), None);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(CellKey::new("東京都", "製造業", "").cache_key(), "東京都-製造業-");
    }

    #[test]
    fn test_background_does_not_overwrite_user_fetch() {
        let mut m = Matrix::new(vec!["東京都".into()], &taxonomy());
        let key = CellKey::new("東京都", "製造業", "印刷業");

        assert!(m.mark_loading(&key));
        assert!(!m.apply(update(&key, CellOutcome::Count(9), UpdateOrigin::Background)));
        assert!(m.apply(update(&key, CellOutcome::Count(12), UpdateOrigin::User)));
        assert!(!m.apply(update(&key, CellOutcome::Count(9), UpdateOrigin::Background)));
        assert_eq!(m.count(&key), Some(12));
    }

    #[test]
    fn test_loaded_is_terminal() {
        let mut m = Matrix::new(vec!["東京都".into()], &taxonomy());
        let key = CellKey::new("東京都", "卸売業", "");
        assert!(m.apply(update(&key, CellOutcome::Count(3), UpdateOrigin::Eager)));
        assert!(!m.apply(update(&key, CellOutcome::Failed, UpdateOrigin::User)));
        assert!(!m.mark_loading(&key));
        assert_eq!(m.state(&key), CellState::Loaded(3));
    }

    #[test]
    fn test_failed_cell_shows_zero_and_can_be_retried_by_user() {
        let mut m = Matrix::new(vec!["東京都".into()], &taxonomy());
        let key = CellKey::new("東京都", "製造業", "食料品製造業");
        assert!(m.apply(update(&key, CellOutcome::Failed, UpdateOrigin::Background)));
        assert_eq!(m.count(&key), Some(0));

        // 失敗後はバックグラウンドからは書き換わらない
        assert!(!m.apply(update(&key, CellOutcome::Count(4), UpdateOrigin::Background)));
        assert!(m.mark_loading(&key));
        assert!(m.apply(update(&key, CellOutcome::Count(4), UpdateOrigin::User)));
        assert_eq!(m.count(&key), Some(4));
    }

    #[test]
    fn test_sort_prefectures() {
        let mut prefs = vec![
            "沖縄県".to_string(),
            "架空県".to_string(),
            "北海道".to_string(),
            "東京都".to_string(),
        ];
        sort_prefectures(&mut prefs);
        assert_eq!(prefs, vec!["北海道", "東京都", "沖縄県", "架空県"]);
    }

    #[test]
    fn test_katakana_sorts_by_reading() {
        let mut t = IndustryTaxonomy::default();
        t.insert("きのこ業", None);
        t.insert("カメラ業", Some("レンズ"));
        t.insert("カメラ業", Some("いす"));
        t.insert("アイス業", None);
        assert_eq!(t.large_categories(), vec!["アイス業", "カメラ業", "きのこ業"]);

        let labels: Vec<String> = t.columns().iter().map(|c| c.label().to_string()).collect();
        assert_eq!(labels, vec!["アイス業", "カメラ業", "いす", "レンズ", "きのこ業"]);
    }

    #[test]
    fn test_compare_ja_folds_width() {
        assert_eq!(compare_ja("Ａ社", "B社"), Ordering::Less);
        assert_eq!(compare_ja("ガス", "がす"), Ordering::Greater);
        assert_eq!(compare_ja("建設業", "建設業"), Ordering::Equal);
    }
}
