use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("検索APIのURLが設定されていません。`company-search config --set-api-url URL` で設定してください")]
    MissingApiUrl,

    /// 5xx応答（時間をおいて再試行すれば回復しうる）
    #[error("検索サービスが一時的に利用できません。しばらくしてから再度お試しください。")]
    ServiceUnavailable { status: u16, body: String },

    #[error("検索エラー: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("検索エラー: {0}")]
    Transport(String),

    #[error("少なくとも1つの絞り込み条件を選択してください")]
    NoFilterSelected,

    #[error("エクスポートするデータがありません")]
    NothingToExport,

    #[error("選択肢が不正です: {0}")]
    InvalidSelector(String),

    #[error("リンクを解釈できません: {0}")]
    InvalidLink(String),

    #[error("{0}")]
    NotFound(String),

    #[error("データストアエラー: {0}")]
    Store(String),

    #[error("インポートエラー: {0}")]
    Import(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] company_search_common::Error),
}

impl AppError {
    /// 一時的な障害か（汎用エラーと表示を分ける）
    pub fn is_retryable_later(&self) -> bool {
        matches!(self, AppError::ServiceUnavailable { .. })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
