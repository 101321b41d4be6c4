//! HTTPクッキー関連の実装（リクエスト側）

use crate::error::Error;
use super::utils::validate_cookie_name_value;

/// HTTPクッキー（`Cookie`ヘッダー内の name=value ペア）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    /// 新しいクッキーを作成
    /// 互換API: 無効な値はパニックせずログに出してデフォルト無害値に置換
    /// より厳密な扱いが必要な場合は `try_new` を使用
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        match Self::try_new(name, value) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Cookie::new received invalid name/value: {}. Replaced with safe defaults", e);
                Self {
                    name: "invalid".to_string(),
                    value: "".to_string(),
                }
            }
        }
    }

    /// 新しいクッキーをResultで作成（推奨）
    pub fn try_new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let n = name.into();
        let v = value.into();
        validate_cookie_name_value(&n, &v)?;
        Ok(Self { name: n, value: v })
    }

    /// `Cookie`ヘッダーに載せる `name=value` 表現を生成
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// `Cookie`ヘッダー値（`a=b; c=d`）をパースする
///
/// ヘッダー内の出現順を保持する。`=`を含まないペアや
/// 不正な名前・値を持つペアは警告ログを出してスキップする。
pub fn parse_header(value: &str) -> Vec<Cookie> {
    let mut cookies = Vec::new();
    for pair in value.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let name = parts.next().unwrap_or("");
        let Some(val) = parts.next() else {
            log::warn!("Skipped cookie pair without '=': {:?}", pair);
            continue;
        };
        match Cookie::try_new(name, val) {
            Ok(cookie) => cookies.push(cookie),
            Err(e) => log::warn!("Skipped malformed cookie pair {:?}: {}", pair, e),
        }
    }
    cookies
}
