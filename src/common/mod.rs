//! 共通のHTTPプリミティブとリクエストコンテキスト

pub mod context;
pub mod cookie;
pub mod http;
pub mod utils;

pub use context::RequestContext;
pub use cookie::Cookie;
pub use http::{Method, Request};
pub use utils::{get_max_include_size, normalize_path, parse_query_string, percent_decode, split_host_port};
