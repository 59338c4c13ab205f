//! 集計表の行・列をマスターから読み込む

use super::{AddressMaster, DataStore, IndustryMaster};
use crate::error::Result;
use company_search_common::facets::PREFECTURES;
use company_search_common::matrix::{sort_prefectures, IndustryTaxonomy};
use std::collections::BTreeSet;

const MASTER_PAGE_SIZE: usize = 1000;

/// 住所マスターから都道府県名を集める
///
/// 47件揃った時点で読み込みをやめる。マスターが空なら標準の47都道府県。
pub fn load_prefectures<D: DataStore>(store: &D) -> Result<Vec<String>> {
    let mut names = BTreeSet::new();
    let mut token: Option<String> = None;

    loop {
        let page = store.list::<AddressMaster>(MASTER_PAGE_SIZE, token.as_deref())?;
        names.extend(
            page.items
                .into_iter()
                .map(|r| r.prefecture_name)
                .filter(|name| !name.is_empty()),
        );
        if names.len() >= PREFECTURES.len() {
            break;
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    if names.is_empty() {
        tracing::debug!("address master is empty, using built-in prefectures");
        return Ok(PREFECTURES.iter().map(|p| p.to_string()).collect());
    }

    let mut prefectures: Vec<String> = names.into_iter().collect();
    sort_prefectures(&mut prefectures);
    Ok(prefectures)
}

/// 業種マスター全件から大分類→中分類を組み立てる
pub fn load_taxonomy<D: DataStore>(store: &D) -> Result<IndustryTaxonomy> {
    let mut taxonomy = IndustryTaxonomy::default();
    for row in store.list_all::<IndustryMaster>()? {
        let medium = Some(row.medium_category.as_str()).filter(|m| !m.is_empty());
        taxonomy.insert(&row.large_category, medium);
    }
    Ok(taxonomy)
}
