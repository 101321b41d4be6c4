//! HTTP関連の基本型（メソッドとリクエストスナップショット）

use std::collections::HashMap;
use std::fmt;
use serde::Deserialize;
use crate::error::Error;
use super::cookie::{self, Cookie};
use super::utils::{is_header_value_valid, parse_query_string};

/// HTTPメソッド
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
            Method::PUT => write!(f, "PUT"),
            Method::DELETE => write!(f, "DELETE"),
            Method::PATCH => write!(f, "PATCH"),
            Method::HEAD => write!(f, "HEAD"),
            Method::OPTIONS => write!(f, "OPTIONS"),
        }
    }
}

impl Method {
    /// 文字列からMethodに変換
    pub fn from_str(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "PATCH" => Some(Method::PATCH),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            _ => None,
        }
    }
}

/// HTTPリクエスト（テンプレート層へ渡す読み取り専用スナップショット）
///
/// ホスト側サーバーがリクエスト受信時に構築し、以降は変更しない。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTPメソッド
    pub method: Method,
    /// 受信したリクエストターゲットの生文字列（クエリ文字列を含む）
    pub uri: String,
    /// クエリ文字列を除いたリクエストパス
    pub path: String,
    /// クエリパラメータ
    pub query_params: HashMap<String, String>,
    /// HTTPヘッダー（キーは小文字に正規化して保持）
    pub headers: HashMap<String, String>,
    /// クライアントのリモートアドレス（`host:port`等、トランスポート層の報告値）
    pub remote_addr: String,
    /// Hostヘッダー値
    pub host: String,
    /// リクエストボディ
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// 新しいリクエストを作成
    ///
    /// `uri`はorigin-form（`/a/b?q=1`）とabsolute-form（`http://host/a/b`）の
    /// 両方を受け付け、パスとクエリパラメータを導出する。
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let (no_query, query) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri.as_str(), ""),
        };
        let path = match no_query.find("://") {
            // absolute-formはスキームとオーソリティを取り除く
            Some(idx) => {
                let after = &no_query[idx + 3..];
                match after.find('/') {
                    Some(slash) => &after[slash..],
                    None => "/",
                }
            }
            None => no_query,
        };
        Self {
            method,
            path: path.to_string(),
            query_params: parse_query_string(query),
            uri,
            headers: HashMap::new(),
            remote_addr: String::new(),
            host: String::new(),
            body: None,
        }
    }

    /// クエリパラメータを追加
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// ヘッダーを追加（キーは小文字へ正規化、CRLF等を含む値は拒否）
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_ascii_lowercase();
        let value = value.into();
        if !is_header_value_valid(&value) {
            log::warn!("Request::with_header rejected invalid value for {:?}", key);
            return self;
        }
        self.headers.insert(key, value);
        self
    }

    /// クッキーを追加（`cookie`ヘッダーへ `name=value` を連結）
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        let entry = self.headers.entry("cookie".to_string()).or_default();
        if entry.is_empty() {
            *entry = cookie.pair();
        } else {
            *entry = format!("{}; {}", entry, cookie.pair());
        }
        self
    }

    /// リモートアドレスを設定
    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    /// Hostヘッダー値を設定
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// ボディを追加
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// `cookie`ヘッダーをパースしてクッキー一覧を取得（出現順）
    ///
    /// 呼び出しごとにパースするため隠れた反復状態を持たない。
    pub fn cookies(&self) -> Vec<Cookie> {
        self.headers
            .get("cookie")
            .map(|value| cookie::parse_header(value))
            .unwrap_or_default()
    }

    /// ボディをJSONとしてパース
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, Error> {
        if let Some(body) = &self.body {
            serde_json::from_slice(body)
                .map_err(|e| Error::InvalidRequestBody(e.to_string()))
        } else {
            Err(Error::InvalidRequestBody("No request body".to_string()))
        }
    }
}
