use std::fs;

use viewbridge::{Cookie, Method, Request, RequestContext};

// ホスト側サーバーがリクエスト1件に対して行う処理のデモ:
// リクエストのスナップショットを組み立て、コンテキストを束縛して
// インラインのページとルート配下のパーシャルを描画する
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ロガーを初期化
    env_logger::init();

    // デモ用のルートディレクトリとパーシャルを用意
    let root = std::env::temp_dir().join("viewbridge-demo");
    fs::create_dir_all(&root)?;
    fs::write(
        root.join("greeting.html"),
        "<p>hello {{ IP }} from {{ Root }}</p>",
    )?;

    // 受信リクエストのスナップショット（通常はサーバーが構築する）
    let request = Request::new(Method::GET, "/dir1/dir2?lang=ja")
        .with_header("User-Agent", "viewbridge-demo/0.1")
        .with_cookie(Cookie::new("session", "abc123"))
        .with_remote_addr("192.0.2.7:51412")
        .with_host("localhost:8080");
    let context = RequestContext::new(&root, request);

    // 外側ページの描画（パーシャルはIncludeで取り込む）
    let page = context.render(
        r#"method : {{ Method }}
uri    : {{ URI }}
cookie : {{ Cookie("session") }}
agent  : {{ Header("user-agent") }}
host   : {{ Host() }}:{{ Port() }}
admin? : {{ PathMatches("/admin") }}
{{ Include("greeting.html") }}"#,
    )?;

    println!("{}", page);
    Ok(())
}
