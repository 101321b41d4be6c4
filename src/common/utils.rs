//! 共通ユーティリティ関数群（URLデコード、クエリ解析、アドレス分割 等）

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use crate::error::Error;

/// URLエンコーディングのデコード関数
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                result.push(h * 16 + l);
                i += 3;
                continue;
            }
        } else if bytes[i] == b'+' {
            result.push(b' ');
            i += 1;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&result).into_owned()
}

/// 16進数文字をバイト値に変換するヘルパー関数
fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// クエリ文字列をパースしてURLデコードを行う共通関数
pub fn parse_query_string(query_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if query_string.is_empty() {
        return params;
    }

    for pair in query_string.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let Some(key) = parts.next() {
            let value = parts.next().unwrap_or("");
            let decoded_key = percent_decode(key);
            let decoded_value = percent_decode(value);
            params.insert(decoded_key, decoded_value);
        }
    }

    params
}

/// `host:port`形式のアドレスをホスト部とポート部に分割する
///
/// 角括弧付きIPv6（`[addr]:port`）はホスト部の括弧を外して返し、
/// ゾーン識別子（`%eth0`など）はそのまま保持する。
/// ポート区切りが見つからない場合はNone（括弧の有無に関わらず）。
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')?;
        let host = &rest[..end];
        let port = rest[end + 1..].strip_prefix(':')?;
        Some((host, port))
    } else {
        let idx = addr.rfind(':')?;
        let (host, port) = (&addr[..idx], &addr[idx + 1..]);
        if host.contains(':') {
            // 角括弧なしでコロンを複数含む場合はポート区切りが判別できない
            return None;
        }
        Some((host, port))
    }
}

/// テンプレートが指定したパスをルート相対へ正規化する
///
/// 先頭の`/`と`.`セグメントは取り除き、`..`はルートで打ち止めにする。
/// 結果をルートへjoinしてもルートの外を指すことはない。
pub fn normalize_path(path: &str) -> PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Includeで読み込むファイルの最大サイズ（バイト）を取得する
/// 優先順位: 環境変数 `VIEWBRIDGE_MAX_INCLUDE_SIZE` -> デフォルト 1MB
pub fn get_max_include_size() -> u64 {
    const DEFAULT_MAX_SIZE: u64 = 1024 * 1024; // 1MB
    env::var("VIEWBRIDGE_MAX_INCLUDE_SIZE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_MAX_SIZE)
}

/// ヘッダー値に使用可能な文字かを判定（CRLF・制御文字を拒否）
pub fn is_header_value_valid(value: &str) -> bool {
    // RFC的にはobs-text等もありうるが、ここでは保守的にUS-ASCII可視範囲に限定し、
    // 制御文字(0x00-0x1F, 0x7F)およびCR/LFを拒否する
    if value.is_empty() {
        return true; // 空は許容（ヘッダー仕様上も可）
    }
    value.chars().all(|c| {
        let code = c as u32;
        code >= 0x20 && code != 0x7F && c != '\r' && c != '\n'
    })
}

/// Cookie名が安全なトークンか（RFC6265準拠の簡易版）
pub fn is_cookie_name_valid(name: &str) -> bool {
    if name.is_empty() { return false; }
    // tokenと同等: 制御/空白とセパレータを除外
    const FORBIDDEN: &[char] = &['(',')','<','>','@',',',';',':','\\','"','/','[',']','?','{','}',' ','\t','\r','\n'];
    name.chars().all(|c| c.is_ascii() && !c.is_ascii_control() && !FORBIDDEN.contains(&c))
}

/// Cookie値が安全か（RFC6265 cookie-octetの簡易版）
/// 許容: 0x21, 0x23-0x2B, 0x2D-0x3A, 0x3C-0x5B, 0x5D-0x7E
pub fn is_cookie_value_valid(value: &str) -> bool {
    value.chars().all(|c| {
        let b = c as u32;
        matches!(b,
            0x21 |
            0x23..=0x2B |
            0x2D..=0x3A |
            0x3C..=0x5B |
            0x5D..=0x7E
        )
    })
}

/// ヘルパー: 無効なCookie名/値ならErrorを返す
pub fn validate_cookie_name_value(name: &str, value: &str) -> Result<(), Error> {
    if !is_cookie_name_valid(name) {
        return Err(Error::InvalidCookie("cookie name contains invalid characters".into()));
    }
    if !is_cookie_value_valid(value) {
        return Err(Error::InvalidCookie("cookie value contains invalid characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_string() {
        let query = "name=John&age=30&city=Tokyo";
        let params = parse_query_string(query);

        assert_eq!(params.get("name"), Some(&"John".to_string()));
        assert_eq!(params.get("age"), Some(&"30".to_string()));
        assert_eq!(params.get("city"), Some(&"Tokyo".to_string()));
    }

    #[test]
    fn test_parse_query_string_url_encoding() {
        // URLエンコードされたクエリ文字列
        let query = "name=%E3%81%82%E3%81%84%E3%81%86%E3%81%88%E3%81%8A&city=Tokyo%20Station";
        let params = parse_query_string(query);

        // "あいうえお"（UTF-8でURLエンコード）
        assert_eq!(params.get("name"), Some(&"あいうえお".to_string()));
        // スペースが%20でエンコードされている
        assert_eq!(params.get("city"), Some(&"Tokyo Station".to_string()));
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("Hello%20World"), "Hello World");
        assert_eq!(percent_decode("test%2Bvalue"), "test+value");
        assert_eq!(percent_decode("normal"), "normal");
        assert_eq!(percent_decode("plus+space"), "plus space"); // +もスペースに変換
    }

    #[test]
    fn test_split_host_port() {
        // IPv4 + ポート
        assert_eq!(split_host_port("1.1.1.1:1111"), Some(("1.1.1.1", "1111")));
        // ポートなし
        assert_eq!(split_host_port("1.1.1.1"), None);
        assert_eq!(split_host_port("localhost:123"), Some(("localhost", "123")));
        // 角括弧付きIPv6 + ポート
        assert_eq!(split_host_port("[::1]:11"), Some(("::1", "11")));
        // 角括弧付きIPv6・ポートなし
        assert_eq!(split_host_port("[2001:db8:a0b:12f0::1]"), None);
        // ゾーン識別子はそのまま保持される
        assert_eq!(split_host_port("[fe80:1::3%eth0]:44"), Some(("fe80:1::3%eth0", "44")));
        // 角括弧なしIPv6はポート区切りが判別できない
        assert_eq!(split_host_port(":::::::::::::"), None);
        // 閉じ括弧の後にポートが続かない
        assert_eq!(split_host_port("[::1][]"), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("header.html"), PathBuf::from("header.html"));
        assert_eq!(normalize_path("/header.html"), PathBuf::from("header.html"));
        assert_eq!(normalize_path("a/./b"), PathBuf::from("a/b"));
        assert_eq!(normalize_path("a/x/../b"), PathBuf::from("a/b"));
        // ".."はルートで打ち止めになり、外には出られない
        assert_eq!(normalize_path("../secret"), PathBuf::from("secret"));
        assert_eq!(normalize_path("../../a/../secret"), PathBuf::from("secret"));
        assert_eq!(normalize_path(""), PathBuf::new());
    }

    #[test]
    fn test_get_max_include_size() {
        temp_env::with_var_unset("VIEWBRIDGE_MAX_INCLUDE_SIZE", || {
            assert_eq!(get_max_include_size(), 1024 * 1024);
        });
        temp_env::with_var("VIEWBRIDGE_MAX_INCLUDE_SIZE", Some("2048"), || {
            assert_eq!(get_max_include_size(), 2048);
        });
        // 数値として解釈できない値はデフォルトに戻す
        temp_env::with_var("VIEWBRIDGE_MAX_INCLUDE_SIZE", Some("not-a-number"), || {
            assert_eq!(get_max_include_size(), 1024 * 1024);
        });
    }
}
