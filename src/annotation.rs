//! 企業ごとの営業ステータス
//!
//! 行がない企業は「選択なし」。解除は「選択なし」を書き込む。
//! 同時編集の制御はなく、後から書いた方が残る。

use crate::error::{AppError, Result};
use crate::store::{CompanyInfo, DataStore};
use company_search_common::status::PipelineStatus;
use company_search_common::types::Company;

pub fn current_status<D: DataStore>(store: &D, company_id: &str) -> Result<PipelineStatus> {
    Ok(store
        .get::<CompanyInfo>(company_id)?
        .map(|info| info.status)
        .unwrap_or_default())
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// 企業詳細からステータスを保存（あれば更新、なければ作成）
pub fn set_status<D: DataStore>(
    store: &mut D,
    company: &Company,
    status: PipelineStatus,
) -> Result<CompanyInfo> {
    let info = CompanyInfo {
        id: company.id.clone(),
        status,
        company_name: non_empty(Some(company.name.clone())),
        prefecture_name: non_empty(company.pref.clone()),
        industry_major: non_empty(company.industry_major_text()),
        industry_mid_name: non_empty(company.industry_mid_text()),
    };

    if store.get::<CompanyInfo>(&info.id)?.is_some() {
        store.update(&info)?;
    } else {
        store.create(&info)?;
    }
    tracing::info!(company = %info.id, status = %status, "status saved");
    Ok(info)
}

/// ステータス一覧からの変更（既存行のみ）
pub fn update_status<D: DataStore>(
    store: &mut D,
    company_id: &str,
    status: PipelineStatus,
) -> Result<CompanyInfo> {
    let mut info = store.get::<CompanyInfo>(company_id)?.ok_or_else(|| {
        AppError::NotFound(format!("企業ID: {} のステータスが登録されていません", company_id))
    })?;
    info.status = status;
    store.update(&info)?;
    tracing::info!(company = %company_id, status = %status, "status updated");
    Ok(info)
}

/// 「選択なし」以外のステータスを持つ企業
pub fn list_annotated<D: DataStore>(store: &D) -> Result<Vec<CompanyInfo>> {
    Ok(store
        .list_all::<CompanyInfo>()?
        .into_iter()
        .filter(|info| info.status.is_set())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use company_search_common::types::OneOrMany;

    fn company() -> Company {
        Company {
            id: "C001".into(),
            name: "株式会社サンプル".into(),
            pref: Some("東京都".into()),
            industry_major: Some(OneOrMany::Many(vec!["製造業".into(), "卸売業".into()])),
            industry_mid_name: Some(OneOrMany::One("印刷業".into())),
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_row_reads_as_none() {
        let store = LocalStore::in_memory();
        assert_eq!(current_status(&store, "C001").unwrap(), PipelineStatus::None);
    }

    #[test]
    fn test_set_status_upserts_with_denormalized_fields() {
        let mut store = LocalStore::in_memory();
        let c = company();

        let info = set_status(&mut store, &c, PipelineStatus::Appointment).unwrap();
        assert_eq!(info.company_name.as_deref(), Some("株式会社サンプル"));
        assert_eq!(info.industry_major.as_deref(), Some("製造業, 卸売業"));
        assert_eq!(info.industry_mid_name.as_deref(), Some("印刷業"));

        set_status(&mut store, &c, PipelineStatus::Won).unwrap();
        assert_eq!(current_status(&store, "C001").unwrap(), PipelineStatus::Won);
        assert_eq!(store.len::<CompanyInfo>(), 1);
    }

    #[test]
    fn test_clearing_hides_from_list() {
        let mut store = LocalStore::in_memory();
        let c = company();
        set_status(&mut store, &c, PipelineStatus::Lost).unwrap();
        assert_eq!(list_annotated(&store).unwrap().len(), 1);

        set_status(&mut store, &c, PipelineStatus::None).unwrap();
        assert!(list_annotated(&store).unwrap().is_empty());
        // 行自体は残る
        assert_eq!(store.len::<CompanyInfo>(), 1);
    }

    #[test]
    fn test_update_status_requires_row() {
        let mut store = LocalStore::in_memory();
        assert!(matches!(
            update_status(&mut store, "missing", PipelineStatus::Won),
            Err(AppError::NotFound(_))
        ));

        set_status(&mut store, &company(), PipelineStatus::Appointment).unwrap();
        let info = update_status(&mut store, "C001", PipelineStatus::Won).unwrap();
        assert_eq!(info.status, PipelineStatus::Won);
        assert_eq!(info.company_name.as_deref(), Some("株式会社サンプル"));
    }
}
