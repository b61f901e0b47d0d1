//! Serve crawled routes on a real listener.

use std::time::Duration;

use route_crawler::{crawl, AppConfig, HttpServer, RouteTable};
use tokio::sync::oneshot;

mod common;

#[tokio::test]
async fn test_serves_crawled_routes_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    common::touch_all(dir.path(), &["get.js", "health/get.js"]);

    let table = RouteTable::new()
        .with("get.js", common::text_route("Howdy"))
        .with("health/get.js", common::text_route("ok"));
    let registrations = crawl(dir.path(), &table).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = HttpServer::new(AppConfig::default(), registrations);
    let handle = tokio::spawn(async move {
        server
            .run(listener, async {
                let _ = stopped.await;
            })
            .await
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let res = client.get(format!("http://{addr}/")).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "Howdy");

    let res = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client.get(format!("http://{addr}/missing")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_config_drives_crawler_and_route_defaults() {
    let config = route_crawler::config::loader::parse_config(
        r#"
        [crawler]
        extension = "route"
        param_marker = "_"

        [routes]
        require_authentication = true
        "#,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    common::touch_all(dir.path(), &["_id/get.route", "get.js"]);

    let guarded = route_crawler::Route::new(
        route_crawler::RouteOptions::from_defaults(&config.routes)
            .skipped_handler(common::text_handler("sign in"))
            .handler(common::text_handler("profile")),
    );
    let table = RouteTable::new().with("_id/get.route", guarded);
    let crawled = route_crawler::Crawler::new(&config.crawler)
        .with_root(dir.path())
        .crawl(&table)
        .unwrap();
    assert_eq!(crawled.len(), 1);
    assert_eq!(crawled[0].path, "/:id");

    let server = HttpServer::new(config, crawled.into_iter().map(|c| c.registration));
    let (status, body) = common::send(&server.router(), axum::http::Method::GET, "/7").await;
    assert_eq!(status, 200);
    assert_eq!(body, "sign in");
}
