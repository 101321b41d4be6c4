//! minijinjaテンプレートとRequestContextの束縛
//!
//! テンプレート1回の描画ごとに使い捨ての`Environment`を組み立て、
//! コンテキストのアクセサを名前→関数の対応表として登録する。
//! リフレクションに頼らず、公開する名前は`BINDING_NAMES`で固定する。

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value};

use crate::common::context::RequestContext;
use crate::error::Error;

/// テンプレートから参照できる束縛名の一覧
///
/// この一覧に無い名前を参照するテンプレートは描画前に
/// `Error::UnknownBinding`で拒否される。
pub const BINDING_NAMES: &[&str] = &[
    "Root",
    "Cookie",
    "Header",
    "IP",
    "URI",
    "Host",
    "Port",
    "Method",
    "PathMatches",
    "Include",
];

/// テンプレートソースを解析し、コンテキストを束縛して描画する
///
/// `name`はエラーメッセージ用のテンプレート名（includeでは相対パス）。
pub(crate) fn render_source(
    context: &RequestContext,
    name: &str,
    source: &str,
) -> Result<String, Error> {
    let mut env = Environment::new();
    // プレーンテキストのテンプレート層なので拡張子によるHTMLエスケープはしない
    env.set_auto_escape_callback(|_name| AutoEscape::None);
    // 未定義値の黙殺はしない（束縛表の検査をすり抜けた参照への保険）
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    bind(context, &mut env);

    let template = env
        .template_from_named_str(name, source)
        .map_err(|e| Error::TemplateParse {
            name: name.to_string(),
            source: e,
        })?;

    // 実行前に未宣言の名前を束縛表と突き合わせる
    let mut undeclared: Vec<String> = template
        .undeclared_variables(false)
        .into_iter()
        .filter(|n| !BINDING_NAMES.contains(&n.as_str()))
        .collect();
    undeclared.sort();
    if let Some(unknown) = undeclared.into_iter().next() {
        return Err(Error::UnknownBinding { name: unknown });
    }

    template.render(()).map_err(|e| Error::TemplateRender {
        name: name.to_string(),
        source: e,
    })
}

/// コンテキストのアクセサ群を環境へ登録する
///
/// 引数なしで失敗しない射影は値として、引数を取るか失敗しうるものは
/// 関数として公開する。
fn bind(context: &RequestContext, env: &mut Environment<'_>) {
    env.add_global("Root", Value::from(context.root().display().to_string()));
    env.add_global("IP", Value::from(context.ip()));
    env.add_global("URI", Value::from(context.uri()));
    env.add_global("Method", Value::from(context.method()));

    let ctx = context.clone();
    env.add_function("Cookie", move |name: String| ctx.cookie(&name));

    let ctx = context.clone();
    env.add_function("Header", move |key: String| ctx.header(&key));

    let ctx = context.clone();
    env.add_function("Host", move || -> Result<String, minijinja::Error> {
        ctx.host().map_err(render_error)
    });

    let ctx = context.clone();
    env.add_function("Port", move || -> Result<String, minijinja::Error> {
        ctx.port().map_err(render_error)
    });

    let ctx = context.clone();
    env.add_function("PathMatches", move |pattern: String| ctx.path_matches(&pattern));

    let ctx = context.clone();
    env.add_function("Include", move |path: String| -> Result<String, minijinja::Error> {
        ctx.include(&path).map_err(render_error)
    });
}

/// 自前のエラーをminijinjaの実行時エラーへ変換する
fn render_error(err: Error) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::cookie::Cookie;
    use crate::common::http::{Method, Request};

    fn test_context() -> RequestContext {
        let request = Request::new(Method::GET, "/dir1/dir2?param=val")
            .with_header("User-Agent", "viewbridge-test")
            .with_cookie(Cookie::new("session", "abc123"))
            .with_remote_addr("1.1.1.1:1111")
            .with_host("localhost:123");
        RequestContext::new("/srv/pages", request)
    }

    #[test]
    fn test_render_root() {
        let context = test_context();
        let rendered = context.render("str1 {{ Root }} str2").unwrap();
        assert_eq!(rendered, "str1 /srv/pages str2");
    }

    #[test]
    fn test_render_projections() {
        let context = test_context();
        assert_eq!(context.render("{{ IP }}").unwrap(), "1.1.1.1");
        assert_eq!(context.render("{{ URI }}").unwrap(), "/dir1/dir2?param=val");
        assert_eq!(context.render("{{ Method }}").unwrap(), "GET");
    }

    #[test]
    fn test_render_functions() {
        let context = test_context();
        assert_eq!(context.render(r#"{{ Cookie("session") }}"#).unwrap(), "abc123");
        assert_eq!(context.render(r#"{{ Cookie("missing") }}"#).unwrap(), "");
        assert_eq!(context.render(r#"{{ Header("user-agent") }}"#).unwrap(), "viewbridge-test");
        assert_eq!(context.render(r#"{{ Host() }}"#).unwrap(), "localhost");
        assert_eq!(context.render(r#"{{ Port() }}"#).unwrap(), "123");
    }

    #[test]
    fn test_render_path_matches_in_condition() {
        let context = test_context();
        let rendered = context
            .render(r#"{% if PathMatches("/dir1") %}yes{% else %}no{% endif %}"#)
            .unwrap();
        assert_eq!(rendered, "yes");

        let rendered = context
            .render(r#"{% if PathMatches("*/dir2") %}yes{% else %}no{% endif %}"#)
            .unwrap();
        assert_eq!(rendered, "no");
    }

    #[test]
    fn test_render_parse_error() {
        let context = test_context();
        let err = context.render("str1 {{ Root } str2").unwrap_err();
        match &err {
            Error::TemplateParse { .. } => {}
            other => panic!("expected parse error, got {:?}", other),
        }
        // 構文診断（どのトークンが想定外か）がそのまま伝播する
        assert!(err.to_string().contains("unexpected"), "unexpected message: {}", err);
    }

    #[test]
    fn test_render_unknown_binding() {
        let context = test_context();
        let err = context.render("str1 {{ InvalidField }} str2").unwrap_err();
        match &err {
            Error::UnknownBinding { name } => assert_eq!(name, "InvalidField"),
            other => panic!("expected unknown binding error, got {:?}", other),
        }
        // 違反した識別子とコンテキスト型名の両方をエラーに含める
        let message = err.to_string();
        assert!(message.contains("InvalidField"));
        assert!(message.contains("RequestContext"));
    }

    #[test]
    fn test_render_host_error_propagates() {
        let request = Request::new(Method::GET, "/").with_host("localhost");
        let context = RequestContext::new("/srv/pages", request);

        let err = context.render("{{ Host() }}").unwrap_err();
        match &err {
            Error::TemplateRender { .. } => {}
            other => panic!("expected render error, got {:?}", other),
        }
        assert!(err.to_string().contains("Missing port"), "unexpected message: {}", err);
    }

    #[test]
    fn test_binding_names_are_exhaustive() {
        // 束縛表と実際に登録する名前がずれていないこと
        let context = test_context();
        for name in BINDING_NAMES {
            let source = match *name {
                "Cookie" => r#"{{ Cookie("session") }}"#.to_string(),
                "Header" => r#"{{ Header("user-agent") }}"#.to_string(),
                "PathMatches" => r#"{{ PathMatches("/") }}"#.to_string(),
                "Host" => r#"{{ Host() }}"#.to_string(),
                "Port" => r#"{{ Port() }}"#.to_string(),
                // Includeはファイルを要するため統合テスト側で検証する
                "Include" => continue,
                other => format!("{{{{ {} }}}}", other),
            };
            assert!(
                context.render(&source).is_ok(),
                "binding {} failed to render",
                name
            );
        }
    }
}
