//! データストアを使う一連の流れ
//!
//! Excel取り込み → マスタ読み込み、検索履歴の保存 → 再実行、営業ステータスの永続化

use chrono::{Duration, TimeZone, Utc};
use company_search_common::facets::Range;
use company_search_common::filter::FilterSet;
use company_search_common::matrix::Matrix;
use company_search_common::status::PipelineStatus;
use company_search_common::types::Company;
use company_search_rust::history::{self, HistoryOrder};
use company_search_rust::import::{self, address_from_row, industry_from_row};
use company_search_rust::link::DeepLink;
use company_search_rust::store::reference::{load_prefectures, load_taxonomy};
use company_search_rust::store::{AddressMaster, IndustryMaster, LocalStore};
use company_search_rust::annotation;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::tempdir;

fn write_sheet(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            worksheet.write_string(r as u32, c as u16, *value).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

#[test]
fn test_import_masters_then_build_matrix() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store_path = dir.path().join("store.json");
    let industry_xlsx = dir.path().join("industry.xlsx");
    let address_xlsx = dir.path().join("address.xlsx");

    write_sheet(
        &industry_xlsx,
        &[
            &["小分類コード", "小分類", "中分類コード", "中分類", "大分類コード", "大分類"],
            &["1511", "活版印刷業", "15", "印刷業", "E", "製造業"],
            &["1531", "製本業", "15", "印刷業", "E", "製造業"],
            &["", "分類不能", "", "", "", ""],
            &["5311", "紙卸売業", "53", "紙・紙製品卸売業", "I", "卸売業"],
        ],
    );
    write_sheet(
        &address_xlsx,
        &[
            &["行政区域コード", "都道府県名", "市区町村名"],
            &["13101", "東京都", "千代田区"],
            &["13102", "東京都", "中央区"],
            &["01100", "北海道", "札幌市"],
        ],
    );

    let mut store = LocalStore::open(&store_path).unwrap();
    let rows = import::read_rows(&industry_xlsx).unwrap();
    let report = import::import_records(&mut store, &rows, industry_from_row);
    assert_eq!(report.success, 3);
    // コードのない行は取り込まない
    assert_eq!(report.skipped, 1);
    assert!(report.is_success());
    assert_eq!(report.message(), "インポート完了: 3件成功");

    let rows = import::read_rows(&address_xlsx).unwrap();
    let report = import::import_records(&mut store, &rows, address_from_row);
    assert_eq!(report.success, 3);

    // ファイルから読み直しても同じ
    let store = LocalStore::open(&store_path).unwrap();
    assert_eq!(store.len::<IndustryMaster>(), 3);

    let prefectures = load_prefectures(&store).unwrap();
    assert_eq!(prefectures, vec!["北海道", "東京都"]);

    let taxonomy = load_taxonomy(&store).unwrap();
    assert_eq!(taxonomy.large_categories(), vec!["卸売業", "製造業"]);

    let matrix = Matrix::new(prefectures, &taxonomy);
    // 大分類2 + 中分類2
    assert_eq!(matrix.columns().len(), 4);
    assert_eq!(matrix.large_keys().len(), 4);
    assert_eq!(matrix.medium_keys().len(), 4);
}

#[test]
fn test_history_roundtrip_to_link() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let t0 = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();

    let advanced = FilterSet {
        prefectures: vec!["東京都".into(), "大阪府".into()],
        capital: Some(Range::new(Some(10_000), Some(100_000))),
        ..Default::default()
    };
    let keyword = FilterSet {
        keyword: Some("印刷".into()),
        prefectures: vec!["東京都".into()],
        ..Default::default()
    };

    {
        let mut store = LocalStore::open(&store_path).unwrap();
        history::record_search(&mut store, &advanced, 120, "tester", t0).unwrap();
        history::record_search(&mut store, &keyword, 8, "tester", t0 + Duration::hours(1)).unwrap();
        history::record_search(&mut store, &advanced, 130, "tester", t0 + Duration::hours(2)).unwrap();
    }

    let store = LocalStore::open(&store_path).unwrap();
    let recent = history::list_saved(&store, HistoryOrder::Recent).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].usage_count, 2);
    assert_eq!(recent[0].last_result_count, 130);

    let link = history::replay(&recent[0]);
    let path = link.to_path_and_query().unwrap();
    assert!(path.starts_with("/advanced-search?filters="));
    assert_eq!(DeepLink::parse(&path).unwrap(), DeepLink::Advanced(advanced));

    let popular = history::list_saved(&store, HistoryOrder::Popular).unwrap();
    let keyword_query = &popular[1];
    assert_eq!(
        history::replay(keyword_query),
        DeepLink::Keyword {
            q: Some("印刷".into()),
            pref: Some("東京都".into()),
        }
    );
}

#[test]
fn test_status_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let company = Company {
        id: "C0001".into(),
        name: "株式会社テスト印刷".into(),
        pref: Some("東京都".into()),
        ..Default::default()
    };

    {
        let mut store = LocalStore::open(&store_path).unwrap();
        annotation::set_status(&mut store, &company, PipelineStatus::Appointment).unwrap();
        annotation::update_status(&mut store, "C0001", PipelineStatus::Won).unwrap();
    }

    let store = LocalStore::open(&store_path).unwrap();
    assert_eq!(annotation::current_status(&store, "C0001").unwrap(), PipelineStatus::Won);
    assert_eq!(annotation::current_status(&store, "C0002").unwrap(), PipelineStatus::None);

    let annotated = annotation::list_annotated(&store).unwrap();
    assert_eq!(annotated.len(), 1);
    assert_eq!(annotated[0].company_name.as_deref(), Some("株式会社テスト印刷"));
}

/// 書き込めないストアへの取り込みは全件失敗し、メモリにも残らない
#[test]
fn test_import_into_unwritable_store_keeps_nothing() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let address_xlsx = dir.path().join("address.xlsx");
    write_sheet(
        &address_xlsx,
        &[
            &["行政区域コード", "都道府県名", "市区町村名"],
            &["13101", "東京都", "千代田区"],
            &["27100", "大阪府", "大阪市"],
        ],
    );

    let mut store = LocalStore::open(&blocker.join("store.json")).unwrap();
    let rows = import::read_rows(&address_xlsx).unwrap();
    let report = import::import_records(&mut store, &rows, address_from_row);
    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 2);
    assert!(!report.is_success());
    assert_eq!(store.len::<AddressMaster>(), 0);
}
