//! company-search: 企業データベース検索・営業管理ツール

pub mod annotation;
pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod interactive;
pub mod link;
pub mod matrix;
pub mod search;
pub mod store;
