//! Preflight and rejection behaviour over a real socket.

use pancors::config::ProxyConfig;
use pancors::HttpServer;
use reqwest::{Method, StatusCode};

mod common;

#[tokio::test]
async fn test_preflight_over_the_wire() {
    let mut config = ProxyConfig::default();
    config.cors.allow_origin = "https://app.test".into();
    config.cors.allow_credentials = "false".into();
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .request(Method::OPTIONS, format!("http://{}/", proxy))
        .header("Origin", "https://app.test")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let h = res.headers();
    assert_eq!(h["access-control-allow-origin"], "https://app.test");
    assert_eq!(h["access-control-allow-credentials"], "false");
    assert_eq!(h["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS, PATCH, HEAD");
    assert_eq!(
        h["access-control-allow-headers"],
        "Content-Type, Authorization, X-Requested-With, Accept, Origin, Access-Control-Request-Method, Access-Control-Request-Headers, Mcp-Session-Id"
    );
    assert_eq!(h["access-control-max-age"], "86400");
    assert!(h.contains_key("x-request-id"));
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejections_over_the_wire() {
    let (proxy, shutdown) = common::start_proxy(ProxyConfig::default()).await;
    let client = common::client();

    let cases: [(Option<&str>, &str, &str); 4] = [
        (None, "https://example.com", "Missing User-Agent header"),
        (None, "ftp://example.com/file", "Missing User-Agent header"),
        (Some("test-agent"), "not-a-valid-uri", "Invalid URL"),
        (Some("test-agent"), "ftp://example.com/file", "The URL scheme is neither HTTP nor HTTPS"),
    ];

    for (user_agent, url, expected) in cases {
        let mut req = client
            .get(format!("http://{}/", proxy))
            .query(&[("url", url)]);
        if let Some(ua) = user_agent {
            req = req.header("User-Agent", ua);
        }

        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "url={}", url);
        assert_eq!(res.text().await.unwrap(), expected, "url={}", url);
    }

    shutdown.trigger();
}

#[test]
fn test_invalid_credentials_prevent_startup() {
    let mut config = ProxyConfig::default();
    config.cors.allow_credentials = "yes".into();

    let err = HttpServer::new(config).err().expect("startup must fail");
    assert!(err.to_string().contains("'true' or 'false'"));
}

#[tokio::test]
async fn test_body_limit_answers_with_cors_headers() {
    let mut config = ProxyConfig::default();
    config.security.max_body_size = 1024;
    let (proxy, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let res = client
        .request(Method::OPTIONS, format!("http://{}/", proxy))
        .body(vec![0u8; 2048])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let res = client
        .post(format!("http://{}/", proxy))
        .query(&[("url", "http://127.0.0.1:1/")])
        .header("User-Agent", "test-agent")
        .body(vec![0u8; 2048])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");
    assert_eq!(res.text().await.unwrap(), "Request body too large");

    shutdown.trigger();
}
