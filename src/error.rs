//! エラー型の定義

use thiserror::Error;

/// アプリケーションのエラー型
#[derive(Error, Debug)]
pub enum Error {
    /// アドレスにポート区切りが無い（`Host()`/`Port()`）
    #[error("Missing port in address: {0}")]
    MissingPort(String),

    /// Includeで読み込むファイルが開けない・読めない
    #[error("Failed to read included file {path}: {source}")]
    IncludeRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Includeで読み込むファイルがサイズ上限を超過
    #[error("Included file {path} is {size} bytes, exceeds limit of {limit} bytes")]
    IncludeTooLarge { path: String, size: u64, limit: u64 },

    /// テンプレート構文の解析エラー
    #[error("Failed to parse template {name}: {source}")]
    TemplateParse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// コンテキストが公開していない名前への参照
    #[error("{name} is not a field or method of RequestContext")]
    UnknownBinding { name: String },

    /// テンプレート実行時のエラー
    #[error("Failed to render template {name}: {source}")]
    TemplateRender {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// 無効なリクエストボディ
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// 無効なクッキー
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),
}

impl Error {
    /// エラーからHTTPステータスコードを取得
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingPort(_) => 400,
            Error::IncludeRead { .. } => 500,
            Error::IncludeTooLarge { .. } => 500,
            Error::TemplateParse { .. } => 500,
            Error::UnknownBinding { .. } => 500,
            Error::TemplateRender { .. } => 500,
            Error::InvalidRequestBody(_) => 400,
            Error::InvalidCookie(_) => 400,
        }
    }
}
