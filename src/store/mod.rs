//! 構造化データストア
//!
//! ユーザー・保存検索・企業ステータス・各種マスターをテーブル単位で保持する。
//! `LocalStore` はバージョン付きJSONファイル（またはメモリ）に保存する。

pub mod models;
pub mod reference;

pub use models::{AddressMaster, CompanyInfo, IndustryMaster, SavedQuery, User};

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// 1テーブル分のレコード
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

/// 一覧の1ページ
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 続きがあれば次の呼び出しに渡す（中身は不透明）
    pub next_token: Option<String>,
}

pub trait DataStore {
    fn get<R: Record>(&self, id: &str) -> Result<Option<R>>;

    fn list<R: Record>(&self, limit: usize, next_token: Option<&str>) -> Result<Page<R>>;

    /// 全ページを辿って取得
    fn list_all<R: Record>(&self) -> Result<Vec<R>> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list::<R>(LIST_ALL_PAGE_SIZE, token.as_deref())?;
            items.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(items),
            }
        }
    }

    /// 同じIDがあればエラー
    fn create<R: Record>(&mut self, record: &R) -> Result<()>;

    /// まとめて作成（結果はレコードごと）
    fn create_many<R: Record>(&mut self, records: &[R]) -> Vec<Result<()>> {
        records.iter().map(|record| self.create(record)).collect()
    }

    /// IDがなければエラー
    fn update<R: Record>(&mut self, record: &R) -> Result<()>;

    /// 削除したら true
    fn delete<R: Record>(&mut self, id: &str) -> Result<bool>;
}

const LIST_ALL_PAGE_SIZE: usize = 1000;

/// ストアファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// テーブル名 → (ID → レコード)
    tables: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl StoreFile {
    const CURRENT_VERSION: u32 = 1;
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            tables: BTreeMap::new(),
        }
    }
}

/// ローカルのデータストア
#[derive(Debug, Default)]
pub struct LocalStore {
    data: StoreFile,
    /// None ならメモリのみ
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// ファイルを開く（なければ空で作る）
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let data: StoreFile = serde_json::from_reader(reader)?;
            if data.version != StoreFile::CURRENT_VERSION {
                return Err(AppError::Store(format!(
                    "ストアのバージョンが異なります（{} != {}）: {}",
                    data.version,
                    StoreFile::CURRENT_VERSION,
                    path.display()
                )));
            }
            data
        } else {
            StoreFile::default()
        };

        tracing::debug!(path = %path.display(), tables = data.tables.len(), "store opened");
        Ok(Self {
            data,
            path: Some(path.to_path_buf()),
        })
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.data)?;
        Ok(())
    }

    /// テーブルの件数
    pub fn len<R: Record>(&self) -> usize {
        self.data.tables.get(R::TABLE).map_or(0, BTreeMap::len)
    }

    fn table_mut(&mut self, table: &str) -> &mut BTreeMap<String, serde_json::Value> {
        self.data.tables.entry(table.to_string()).or_default()
    }

    /// メモリ上にだけ追加（保存は呼び出し側）
    fn insert_new<R: Record>(&mut self, record: &R) -> Result<String> {
        let id = record.id().to_string();
        if id.is_empty() {
            return Err(AppError::Store(format!("{}: IDが空です", R::TABLE)));
        }
        let value = serde_json::to_value(record)?;
        let table = self.table_mut(R::TABLE);
        if table.contains_key(&id) {
            return Err(AppError::Store(format!("{}: ID {} は既に存在します", R::TABLE, id)));
        }
        table.insert(id.clone(), value);
        Ok(id)
    }

    /// 保存に失敗したらスロットを元に戻す
    fn save_or_restore(&mut self, table: &str, id: &str, previous: Option<serde_json::Value>) -> Result<()> {
        let saved = self.save();
        if saved.is_err() {
            let slots = self.table_mut(table);
            match previous {
                Some(value) => {
                    slots.insert(id.to_string(), value);
                }
                None => {
                    slots.remove(id);
                }
            }
        }
        saved
    }
}

impl DataStore for LocalStore {
    fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        match self.data.tables.get(R::TABLE).and_then(|t| t.get(id)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn list<R: Record>(&self, limit: usize, next_token: Option<&str>) -> Result<Page<R>> {
        let Some(table) = self.data.tables.get(R::TABLE) else {
            return Ok(Page {
                items: Vec::new(),
                next_token: None,
            });
        };

        // トークンは直前ページ最後のID
        let mut rows = table
            .iter()
            .filter(|(id, _)| next_token.is_none_or(|token| id.as_str() > token));

        let limit = limit.max(1);
        let mut items = Vec::with_capacity(limit.min(table.len()));
        let mut last_id = None;
        for (id, value) in rows.by_ref().take(limit) {
            items.push(serde_json::from_value(value.clone())?);
            last_id = Some(id.clone());
        }

        let next_token = if rows.next().is_some() { last_id } else { None };
        Ok(Page { items, next_token })
    }

    fn create<R: Record>(&mut self, record: &R) -> Result<()> {
        let id = self.insert_new(record)?;
        self.save_or_restore(R::TABLE, &id, None)
    }

    /// 追加はメモリ上で済ませ、ファイルへの書き込みは1回
    fn create_many<R: Record>(&mut self, records: &[R]) -> Vec<Result<()>> {
        let mut results = Vec::with_capacity(records.len());
        let mut inserted = Vec::new();
        for record in records {
            match self.insert_new(record) {
                Ok(id) => {
                    inserted.push(id);
                    results.push(Ok(()));
                }
                Err(e) => results.push(Err(e)),
            }
        }
        if inserted.is_empty() {
            return results;
        }

        if let Err(e) = self.save() {
            tracing::warn!(table = R::TABLE, error = %e, "batch save failed, rolled back");
            let message = e.to_string();
            let table = self.table_mut(R::TABLE);
            for id in &inserted {
                table.remove(id);
            }
            return results
                .into_iter()
                .map(|r| r.and_then(|()| Err(AppError::Store(message.clone()))))
                .collect();
        }
        results
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        let id = record.id().to_string();
        let value = serde_json::to_value(record)?;
        let previous = match self.table_mut(R::TABLE).get_mut(&id) {
            Some(slot) => std::mem::replace(slot, value),
            None => {
                return Err(AppError::Store(format!("{}: ID {} が見つかりません", R::TABLE, id)));
            }
        };
        self.save_or_restore(R::TABLE, &id, Some(previous))
    }

    fn delete<R: Record>(&mut self, id: &str) -> Result<bool> {
        let Some(previous) = self.table_mut(R::TABLE).remove(id) else {
            return Ok(false);
        };
        self.save_or_restore(R::TABLE, id, Some(previous))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user(email: &str) -> User {
        User::from_email(email)
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let mut store = LocalStore::in_memory();
        store.create(&user("a@example.com")).unwrap();
        let err = store.create(&user("a@example.com")).unwrap_err();
        assert!(err.to_string().contains("既に存在します"));
        assert_eq!(store.len::<User>(), 1);
    }

    #[test]
    fn test_update_requires_existing() {
        let mut store = LocalStore::in_memory();
        assert!(store.update(&user("x@example.com")).is_err());

        store.create(&user("x@example.com")).unwrap();
        let mut u = user("x@example.com");
        u.department = Some("営業部".into());
        store.update(&u).unwrap();
        let got: User = store.get("x@example.com").unwrap().unwrap();
        assert_eq!(got.department.as_deref(), Some("営業部"));
    }

    #[test]
    fn test_list_pages_with_token() {
        let mut store = LocalStore::in_memory();
        for i in 0..5 {
            store.create(&user(&format!("u{}@example.com", i))).unwrap();
        }

        let first: Page<User> = store.list(2, None).unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next_token.clone().unwrap();

        let second: Page<User> = store.list(2, Some(&token)).unwrap();
        assert_eq!(second.items[0].id, "u2@example.com");

        let third: Page<User> = store.list(2, second.next_token.as_deref()).unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(third.next_token.is_none());

        assert_eq!(store.list_all::<User>().unwrap().len(), 5);
    }

    #[test]
    fn test_delete_and_empty_table() {
        let mut store = LocalStore::in_memory();
        assert!(!store.delete::<User>("nobody").unwrap());
        assert!(store.list_all::<User>().unwrap().is_empty());
        store.create(&user("a@example.com")).unwrap();
        assert!(store.delete::<User>("a@example.com").unwrap());
        assert!(store.get::<User>("a@example.com").unwrap().is_none());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = LocalStore::open(&path).unwrap();
        store.create(&user("a@example.com")).unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.len::<User>(), 1);
    }

    #[test]
    fn test_version_mismatch_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version":99,"tables":{}}"#).unwrap();
        assert!(matches!(LocalStore::open(&path), Err(AppError::Store(_))));
    }

    /// 親が通常ファイルのパス（保存が必ず失敗する）
    fn unwritable_path(dir: &Path) -> PathBuf {
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, "").unwrap();
        blocker.join("store.json")
    }

    #[test]
    fn test_failed_save_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(&unwritable_path(dir.path())).unwrap();

        assert!(store.create(&user("a@example.com")).is_err());
        assert!(store.get::<User>("a@example.com").unwrap().is_none());
        assert_eq!(store.len::<User>(), 0);

        let results = store.create_many(&[user("b@example.com"), user("c@example.com")]);
        assert!(results.iter().all(|r| r.is_err()));
        assert_eq!(store.len::<User>(), 0);
    }

    #[test]
    fn test_failed_save_restores_update_and_delete() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::in_memory();
        store.create(&user("a@example.com")).unwrap();
        store.path = Some(unwritable_path(dir.path()));

        let mut changed = user("a@example.com");
        changed.department = Some("営業部".into());
        assert!(store.update(&changed).is_err());
        let kept: User = store.get("a@example.com").unwrap().unwrap();
        assert!(kept.department.is_none());

        assert!(store.delete::<User>("a@example.com").is_err());
        assert!(store.get::<User>("a@example.com").unwrap().is_some());
    }

    #[test]
    fn test_create_many_reports_each_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.create(&user("dup@example.com")).unwrap();

        let results = store.create_many(&[
            user("new1@example.com"),
            user("dup@example.com"),
            user("new2@example.com"),
        ]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.len::<User>(), 3);
    }
}
