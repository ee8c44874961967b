/// Smoke-test for `ChromeSession`.
///
/// Launches a headless Chromium, opens <https://example.com>, and checks
/// element lookup, text reads and cookies against the rendered page.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use dossier_client::ChromeSession;
use dossier_core::locator::Locator;
use dossier_core::traits::BrowserSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let session = ChromeSession::launch().await?;

    let url = "https://example.com/";
    println!("Opening {url} …");
    session.goto(url).await?;
    assert_eq!(session.current_url().await?, url);

    let headings = session.find_all(&Locator::css("h1")).await?;
    assert_eq!(headings.len(), 1, "expected exactly one <h1>");
    let text = session.property(&headings[0], "innerText").await?;
    assert_eq!(text.as_deref(), Some("Example Domain"));
    assert!(session.is_clickable(&headings[0]).await?);

    let links = session.find_all(&Locator::xpath("//a[@href]")).await?;
    println!("Found {} link(s), scroll height {}", links.len(), session.scroll_height().await?);
    println!("Network idle: {}", session.is_network_idle().await?);
    println!("Cookies: {}", session.cookies().await?.len());

    session.close().await?;
    println!("OK");
    Ok(())
}
