//! ViewBridge: HTTPリクエスト属性をテキストテンプレートへ公開するライブラリ
//!
//! リクエスト1件ごとに[`RequestContext`]を構築し、minijinjaテンプレートから
//! クッキー・ヘッダー・クライアントIPなどを名前で参照できるようにする。
//! ルートディレクトリ配下のファイルをテンプレートとして取り込む`Include`と、
//! リクエストパスの前方一致判定`PathMatches`を併せて提供する。
//!
//! ```no_run
//! use viewbridge::{Method, Request, RequestContext};
//!
//! let request = Request::new(Method::GET, "/dir1/dir2?q=1")
//!     .with_host("localhost:8080")
//!     .with_remote_addr("1.1.1.1:1111");
//! let context = RequestContext::new("/srv/pages", request);
//!
//! let page = context.render("client: {{ IP }} path ok: {{ PathMatches(\"/dir1\") }}")?;
//! let partial = context.include("header.html")?;
//! # Ok::<(), viewbridge::Error>(())
//! ```

pub mod common;
pub mod error;
pub mod template;

pub use common::*;
pub use error::*;
pub use template::BINDING_NAMES;
