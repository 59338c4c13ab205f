//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use company_search_common::matrix::{IndustryTaxonomy, Matrix};
use company_search_rust::annotation;
use company_search_rust::api::classify_status;
use company_search_rust::error::AppError;
use company_search_rust::export::export_matrix;
use company_search_rust::history;
use company_search_rust::import::read_rows;
use company_search_rust::link::DeepLink;
use company_search_rust::store::LocalStore;
use company_search_common::status::PipelineStatus;
use std::path::Path;
use tempfile::tempdir;

/// 別バージョンのストアファイルは開かない
#[test]
fn test_store_version_mismatch() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"version":99,"tables":{}}"#).unwrap();

    let result = LocalStore::open(&path);
    assert!(matches!(result, Err(AppError::Store(_))));
}

/// 壊れたストアファイル
#[test]
fn test_store_broken_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(LocalStore::open(&path), Err(AppError::JsonParse(_))));
}

/// 存在しないストアは空で開ける
#[test]
fn test_store_missing_file_opens_empty() {
    let dir = tempdir().unwrap();
    let store = LocalStore::open(&dir.path().join("none").join("store.json")).unwrap();
    assert_eq!(store.len::<company_search_rust::store::SavedQuery>(), 0);
}

#[test]
fn test_unknown_link_path() {
    let result = DeepLink::parse("/unknown-page?q=test");
    assert!(matches!(result, Err(AppError::InvalidLink(_))));
}

#[test]
fn test_broken_filters_in_link() {
    let result = DeepLink::parse("/advanced-search?filters=%7Bbroken");
    assert!(matches!(result, Err(AppError::InvalidLink(_))));
}

#[test]
fn test_delete_missing_history() {
    let mut store = LocalStore::in_memory();
    let err = history::delete_saved(&mut store, "01HXXXXXXXXXXXXXXXXXXXXXXX").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

/// 未登録の企業はステータス一覧から変更できない
#[test]
fn test_update_status_without_record() {
    let mut store = LocalStore::in_memory();
    let err = annotation::update_status(&mut store, "C9999", PipelineStatus::Won).unwrap_err();
    assert_eq!(err.to_string(), "企業ID: C9999 のステータスが登録されていません");
}

#[test]
fn test_export_empty_matrix() {
    let dir = tempdir().unwrap();
    let matrix = Matrix::new(Vec::new(), &IndustryTaxonomy::default());
    let err = export_matrix(&matrix, dir.path()).unwrap_err();
    assert!(matches!(err, AppError::NothingToExport));
}

#[test]
fn test_import_missing_file() {
    let result = read_rows(Path::new("/nonexistent/path/12345.xlsx"));
    assert!(result.is_err());
}

/// サーバー障害は汎用エラーと別の文言
#[test]
fn test_service_unavailable_message() {
    let err = classify_status(503, "upstream timeout".into());
    assert!(err.is_retryable_later());
    assert!(!err.to_string().contains("upstream"));

    let err = classify_status(400, "bad request".into());
    assert!(!err.is_retryable_later());
    assert!(err.to_string().contains("bad request"));
}
