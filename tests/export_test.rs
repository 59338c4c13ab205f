//! 検索結果・集計表のExcel出力の統合テスト
//!
//! 偽の検索APIで結果を蓄積し、書き出したファイルをcalamineで読み戻して検証する。

use calamine::{open_workbook_auto, Data, Reader};
use company_search_common::export::columns::EXPORT_HEADERS;
use company_search_common::export::excel_core::{MATRIX_SHEET, RESULTS_SHEET};
use company_search_common::facets::Range;
use company_search_common::filter::FilterSet;
use company_search_common::matrix::{IndustryTaxonomy, Matrix};
use company_search_common::paging::SearchMode;
use company_search_common::types::{Company, CompanyStats, SearchRequest, SearchResponse};
use company_search_rust::api::SearchApi;
use company_search_rust::error::{AppError, Result};
use company_search_rust::export::{export_matrix, export_results, MATRIX_PREFIX, RESULTS_PREFIX};
use company_search_rust::matrix::MatrixAggregator;
use company_search_rust::search::SearchAccumulator;
use std::sync::Arc;
use tempfile::tempdir;

fn create_company(index: usize, pref: &str, employees: i64) -> Company {
    Company {
        id: format!("C{:04}", index),
        name: format!("テスト株式会社{}", index),
        pref: Some(pref.to_string()),
        company_stats: Some(CompanyStats {
            employees: Some(employees),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// 都道府県で絞り、オフセットでページを返す
struct PagedApi {
    data: Vec<Company>,
}

impl SearchApi for PagedApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let matching: Vec<&Company> = self
            .data
            .iter()
            .filter(|c| request.pref.is_none() || c.pref == request.pref)
            .collect();
        let start = request.cursor.unwrap_or(0) as usize;
        let limit = request.limit.unwrap_or(200) as usize;
        Ok(SearchResponse {
            total: matching.len() as u64,
            next_cursor: None,
            items: matching.into_iter().skip(start).take(limit).cloned().collect(),
        })
    }
}

fn sheet_rows(path: &std::path::Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto(path).expect("xlsxを開けること");
    let range = workbook.worksheet_range(sheet).expect("シートがあること");
    range.rows().map(|r| r.to_vec()).collect()
}

#[tokio::test]
async fn test_filtered_results_roundtrip_through_excel() {
    let mut data = Vec::new();
    for i in 0..30 {
        data.push(create_company(i, "東京都", if i % 2 == 0 { 50 } else { 500 }));
    }
    let api = PagedApi { data };

    let filters = FilterSet {
        prefectures: vec!["東京都".into()],
        employees: Some(Range::new(Some(10), Some(100))),
        ..Default::default()
    };
    let mut acc = SearchAccumulator::new(filters.clone(), 10);
    acc.run(&api, SearchMode::New).await.unwrap();
    assert_eq!(acc.rows().len(), 15);

    let dir = tempdir().expect("Failed to create temp dir");
    let path = export_results(acc.rows(), &filters.summary(), dir.path()).unwrap();

    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with(RESULTS_PREFIX));
    assert!(file_name.ends_with(".xlsx"));

    let rows = sheet_rows(&path, RESULTS_SHEET);
    assert_eq!(rows.len(), 16);
    assert_eq!(rows[0].len(), EXPORT_HEADERS.len());
    assert_eq!(rows[0][0], Data::String("企業ID".into()));
    assert_eq!(rows[1][0], Data::String("C0000".into()));
}

#[test]
fn test_export_to_explicit_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("nested").join("結果.xlsx");
    let companies = vec![create_company(1, "大阪府", 20)];

    let path = export_results(&companies, "都道府県: 大阪府", &target).unwrap();
    assert_eq!(path, target);
    assert!(target.exists());
}

#[test]
fn test_empty_results_are_not_exported() {
    let dir = tempdir().unwrap();
    let err = export_results(&[], "条件なし", dir.path()).unwrap_err();
    assert!(matches!(err, AppError::NothingToExport));
}

/// 件数 = 中分類名の文字数（大分類の合計は10）
struct CountingApi;

impl SearchApi for CountingApi {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let total = match request.industry_mid_name.as_deref() {
            Some(medium) if !medium.is_empty() => medium.chars().count() as u64,
            _ => 10,
        };
        Ok(SearchResponse {
            total,
            next_cursor: None,
            items: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_matrix_export_after_large_counts() {
    let mut taxonomy = IndustryTaxonomy::default();
    taxonomy.insert("製造業", Some("印刷業"));
    let mut matrix = Matrix::new(vec!["北海道".into(), "東京都".into()], &taxonomy);

    let aggregator = MatrixAggregator::new(Arc::new(CountingApi));
    let failed = aggregator.load_large_counts(&mut matrix, |_, _| {}).await;
    assert_eq!(failed, 0);

    let dir = tempdir().unwrap();
    let path = export_matrix(&matrix, dir.path()).unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(MATRIX_PREFIX));

    let rows = sheet_rows(&path, MATRIX_SHEET);
    // 見出し行 + 都道府県2行
    assert_eq!(rows.len(), 3);
}
