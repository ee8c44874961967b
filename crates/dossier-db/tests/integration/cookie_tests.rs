use dossier_core::models::Cookie;
use dossier_db::CookieRepository;

use crate::integration::common::setup_test_db;

fn cookie(name: &str, value: &str) -> Cookie {
    Cookie {
        name: name.into(),
        value: value.into(),
        domain: Some(".linkedin.com".into()),
        path: Some("/".into()),
        expiry: Some(1_800_000_000),
        secure: Some(true),
        http_only: None,
    }
}

#[tokio::test]
async fn unknown_identity_has_no_cookies() {
    let (pool, _container) = setup_test_db().await;
    let jar = CookieRepository::new(pool);

    assert!(jar.load("nobody@example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn store_replaces_previous_cookies() {
    let (pool, _container) = setup_test_db().await;
    let jar = CookieRepository::new(pool);

    jar.store("me@example.com", &[cookie("li_at", "old"), cookie("JSESSIONID", "x")])
        .await
        .unwrap();
    jar.store("me@example.com", &[cookie("li_at", "new")])
        .await
        .unwrap();

    let cookies = jar.load("me@example.com").await.unwrap();
    assert_eq!(cookies, vec![cookie("li_at", "new")]);

    assert_eq!(jar.clear("me@example.com").await.unwrap(), 1);
    assert!(jar.load("me@example.com").await.unwrap().is_empty());
}
