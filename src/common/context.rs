//! リクエストコンテキストの実装（テンプレートへ公開するリクエスト面）

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Error;
use crate::template;
use super::http::Request;
use super::utils::{get_max_include_size, normalize_path, split_host_port};

/// リクエスト1件のライフサイクルに束縛されるテンプレートコンテキスト
///
/// ルートディレクトリと受信リクエストのスナップショットを包み、
/// テンプレート層から参照されるアクセサ群と`include`を提供する。
/// リクエストごとに新しいインスタンスを構築し、処理完了後に破棄する。
/// `Clone`はArcの参照カウント加算のみ（レンダリング時の束縛クロージャが保持する）。
#[derive(Debug, Clone)]
pub struct RequestContext {
    root: Arc<PathBuf>,
    request: Arc<Request>,
}

impl RequestContext {
    /// 新しいRequestContextを作成
    pub fn new(root: impl Into<PathBuf>, request: Request) -> Self {
        Self {
            root: Arc::new(root.into()),
            request: Arc::new(request),
        }
    }

    /// `Include`のファイル解決の起点となるルートディレクトリ
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 包んでいるリクエストの不変参照を取得
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// 名前が完全一致する最初のクッキーの値を取得（なければ空文字列）
    ///
    /// 大文字小文字を区別し、部分一致はしない。呼び出しごとに
    /// `cookie`ヘッダーをパースし直すため、呼び出し間で状態を共有しない。
    pub fn cookie(&self, name: &str) -> String {
        self.request
            .cookies()
            .into_iter()
            .find(|cookie| cookie.name == name)
            .map(|cookie| cookie.value)
            .unwrap_or_default()
    }

    /// ヘッダー値を取得（キーは大文字小文字を区別しない、なければ空文字列）
    pub fn header(&self, key: &str) -> String {
        self.request
            .headers
            .get(&key.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// リモートアドレスからホスト部を取り出す
    ///
    /// ポート区切りがあれば角括弧を外したホスト部（ゾーン識別子は保持）、
    /// 見つからなければリモートアドレスの生文字列をそのまま返す。
    pub fn ip(&self) -> String {
        let addr = &self.request.remote_addr;
        match split_host_port(addr) {
            Some((host, _port)) => host.to_string(),
            None => addr.clone(),
        }
    }

    /// 受信したリクエストターゲットの生文字列（クエリ文字列を含む）
    pub fn uri(&self) -> String {
        self.request.uri.clone()
    }

    /// HTTPメソッドのトークン
    pub fn method(&self) -> String {
        self.request.method.to_string()
    }

    /// Hostヘッダーのホスト部（最後のコロンで分割）
    ///
    /// ポートを含まないHostヘッダーはエラー。`ip()`と違い生文字列への
    /// フォールバックは行わない。
    pub fn host(&self) -> Result<String, Error> {
        let host = &self.request.host;
        match host.rfind(':') {
            Some(idx) => Ok(host[..idx].to_string()),
            None => Err(Error::MissingPort(host.clone())),
        }
    }

    /// Hostヘッダーのポート部（最後のコロンで分割）
    pub fn port(&self) -> Result<String, Error> {
        let host = &self.request.host;
        match host.rfind(':') {
            Some(idx) => Ok(host[idx + 1..].to_string()),
            None => Err(Error::MissingPort(host.clone())),
        }
    }

    /// リクエストパスが`pattern`で始まるかを判定する
    ///
    /// クエリ文字列を除いたパスに対するバイト単位の前方一致のみ。
    /// 空パターンは常にマッチする。グロブ展開はせず、先頭の`*`も
    /// リテラル文字として扱う。
    pub fn path_matches(&self, pattern: &str) -> bool {
        pattern.is_empty() || self.request.path.starts_with(pattern)
    }

    /// テンプレートソースをこのコンテキストを束縛して描画する
    ///
    /// ホスト側サーバーが外側ページの描画に使うエントリポイント。
    pub fn render(&self, source: &str) -> Result<String, Error> {
        template::render_source(self, "inline", source)
    }

    /// ルート配下のファイルを読み込み、テンプレートとして描画する
    ///
    /// 呼び出しごとにファイルを読み直して解析し直す（解析結果のキャッシュは
    /// 持たない）。パスはルート相対へ正規化され、ルートの外は参照できない。
    pub fn include(&self, path: &str) -> Result<String, Error> {
        let full_path = self.root.join(normalize_path(path));
        let display = full_path.display().to_string();

        let metadata = fs::metadata(&full_path).map_err(|e| Error::IncludeRead {
            path: display.clone(),
            source: e,
        })?;
        let limit = get_max_include_size();
        if metadata.len() > limit {
            return Err(Error::IncludeTooLarge {
                path: display,
                size: metadata.len(),
                limit,
            });
        }

        let source = fs::read_to_string(&full_path).map_err(|e| Error::IncludeRead {
            path: display.clone(),
            source: e,
        })?;
        log::debug!("Including template {} ({} bytes)", display, source.len());
        template::render_source(self, path, &source)
    }
}
