mod common;

use cms_fallback::client::{CmsClient, MENU_ITEMS_ENDPOINT};
use cms_fallback::model::MenuItem;
use cms_fallback::Settings;
use common::{capture_logs, Reply, StubServer};

#[tokio::test]
async fn server_error_logs_terse_notice() {
    let server = StubServer::start(vec![("/api/", Reply::Json(500, "{}".into()))]).await;
    let client = CmsClient::new(Settings::new(Some(&server.base_url), None));

    let (logs, _guard) = capture_logs();
    let menu = client.fetch_menu_items().await;
    assert!(menu.items.is_empty());

    let out = logs.contents();
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("CMS server error; using fallback content"), "{out}");
    assert!(!out.contains("ServerError"), "{out}");
    assert!(!out.contains("server error (500"), "{out}");
}

#[tokio::test]
async fn debug_mode_logs_full_error() {
    let server = StubServer::start(vec![("/api/", Reply::Json(500, "{}".into()))]).await;
    let settings = Settings::new(Some(&server.base_url), None).with_debug(true);
    let client = CmsClient::new(settings);

    let (logs, _guard) = capture_logs();
    client.fetch_collection::<MenuItem>(MENU_ITEMS_ENDPOINT).await;

    let out = logs.contents();
    assert!(out.contains("CMS server error; using fallback content"), "{out}");
    assert!(out.contains("ServerError"), "{out}");
    assert!(out.contains("500"), "{out}");
}

#[tokio::test]
async fn unconfigured_fetch_stays_below_warn() {
    let client = CmsClient::new(Settings::unconfigured());

    let (logs, _guard) = capture_logs();
    client.fetch_menu_items().await;

    let out = logs.contents();
    assert!(out.contains("CMS unconfigured; using fallback content"), "{out}");
    assert!(!out.contains("WARN"), "{out}");
}

#[test]
fn announce_warns_when_unconfigured() {
    let (logs, _guard) = capture_logs();
    Settings::unconfigured().announce();

    let out = logs.contents();
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("CMS_URL is not set"), "{out}");
}

#[test]
fn announce_reports_configured_backend_at_info() {
    let (logs, _guard) = capture_logs();
    Settings::new(Some("https://cms.example.com"), Some("s3cret")).announce();

    let out = logs.contents();
    assert!(out.contains("INFO"), "{out}");
    assert!(!out.contains("WARN"), "{out}");
    assert!(out.contains("CMS backend configured"), "{out}");
    assert!(out.contains("https://cms.example.com"), "{out}");
    assert!(!out.contains("s3cret"), "{out}");
}
