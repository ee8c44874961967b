use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{DispatchMouseEventParams, DispatchMouseEventType};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, TimeSinceEpoch};
use chromiumoxide::error::CdpError;
use chromiumoxide::layout::Point;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use dossier_core::error::AppError;
use dossier_core::locator::{Locator, LocatorKind};
use dossier_core::models::Cookie;
use dossier_core::traits::BrowserSession;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Pixels per simulated wheel notch.
const WHEEL_STEP: f64 = 400.0;
/// Upper bound on wheel notches spent bringing one element into view.
const MAX_WHEEL_STEPS: usize = 20;

const IS_CLICKABLE_JS: &str = r#"function() {
    const r = this.getBoundingClientRect();
    if (r.width === 0 || r.height === 0 || this.disabled) return false;
    const s = window.getComputedStyle(this);
    if (s.visibility === 'hidden' || s.display === 'none' || s.pointerEvents === 'none') return false;
    const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
    return hit === null || hit === this || this.contains(hit);
}"#;

const IN_VIEWPORT_JS: &str = r#"function() {
    const r = this.getBoundingClientRect();
    return r.top >= 0 && r.bottom <= window.innerHeight;
}"#;

/// One Chromium tab driven over the Chrome DevTools Protocol.
///
/// All calls act on a single [`Page`]. The browser process lives until
/// [`ChromeSession::close`] is called.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl ChromeSession {
    /// Launches a headless Chromium with a **30 s** navigation timeout.
    pub async fn launch() -> Result<Self, AppError> {
        Self::launch_with(true, Duration::from_secs(30)).await
    }

    /// Launches Chromium, optionally with a visible window.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$CHROME_BIN`, a
    /// well-known install path, or `chromiumoxide`'s own lookup.
    pub async fn launch_with(headless: bool, timeout: Duration) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .window_size(1366, 900);

        // Snap-packaged Chromium ships a wrapper that rejects standard
        // Chrome flags, so prefer the real binary inside the snap.
        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }

        let config = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to open tab: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
            timeout,
        })
    }

    /// Shut the browser down and stop the CDP handler.
    pub async fn close(mut self) -> Result<(), AppError> {
        let _ = self.page.clone().close().await;
        self.browser
            .close()
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to close browser: {e}")))?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expression: &str) -> Result<T, AppError> {
        self.page
            .evaluate(expression)
            .await
            .map_err(|e| cdp_error(e, "evaluate"))?
            .into_value::<T>()
            .map_err(|e| AppError::BrowserError(format!("Unexpected script result: {e}")))
    }

    async fn call_bool(&self, element: &Element, function: &str) -> Result<bool, AppError> {
        let returned = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| cdp_error(e, "call function on element"))?;
        Ok(returned
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn wheel(&self, at: Point, delta_y: f64) -> Result<(), AppError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(at.x)
            .y(at.y)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(AppError::BrowserError)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| cdp_error(e, "mouse wheel"))?;
        Ok(())
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// `CHROME_BIN` wins when it points at an existing file.
fn find_chrome_binary() -> Option<PathBuf> {
    let candidates: &[&str] = &[
        // Snap (Ubuntu default)
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        // Flatpak
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Map a CDP failure onto the error taxonomy. Detached or re-rendered nodes
/// become [`AppError::StaleElement`] so the retry primitive picks them up.
fn cdp_error(e: CdpError, action: &str) -> AppError {
    let message = e.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("no node")
        || lowered.contains("could not find node")
        || lowered.contains("not attached")
        || lowered.contains("cannot find context")
    {
        AppError::StaleElement(format!("{action}: {message}"))
    } else {
        AppError::BrowserError(format!("{action}: {message}"))
    }
}

fn from_cdp_cookie(cookie: chromiumoxide::cdp::browser_protocol::network::Cookie) -> Cookie {
    Cookie {
        name: cookie.name,
        value: cookie.value,
        domain: Some(cookie.domain),
        path: Some(cookie.path),
        // session cookies report -1
        expiry: (cookie.expires > 0.0).then_some(cookie.expires as i64),
        secure: Some(cookie.secure),
        http_only: Some(cookie.http_only),
    }
}

fn to_cookie_param(cookie: &Cookie) -> Result<CookieParam, AppError> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone());
    if let Some(domain) = &cookie.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(path) = &cookie.path {
        builder = builder.path(path.clone());
    }
    if let Some(expiry) = cookie.expiry {
        builder = builder.expires(TimeSinceEpoch::new(expiry as f64));
    }
    if let Some(secure) = cookie.secure {
        builder = builder.secure(secure);
    }
    if let Some(http_only) = cookie.http_only {
        builder = builder.http_only(http_only);
    }
    builder
        .build()
        .map_err(|e| AppError::BrowserError(format!("Invalid cookie '{}': {e}", cookie.name)))
}

impl BrowserSession for ChromeSession {
    type Element = Arc<Element>;

    async fn goto(&self, url: &str) -> Result<(), AppError> {
        tracing::debug!(%url, "Navigating");
        match tokio::time::timeout(self.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::BrowserError(format!(
                "Failed to navigate to {url}: {e}"
            ))),
            Err(_) => Err(AppError::WaitTimeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn current_url(&self) -> Result<String, AppError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| cdp_error(e, "read URL"))?;
        Ok(url.unwrap_or_default())
    }

    async fn content(&self) -> Result<String, AppError> {
        self.page
            .content()
            .await
            .map_err(|e| cdp_error(e, "read page content"))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Arc<Element>>, AppError> {
        let found = match (locator.kind, locator.as_css()) {
            (LocatorKind::XPath, _) | (_, None) => self.page.find_xpaths(locator.value.clone()).await,
            (_, Some(css)) => self.page.find_elements(css).await,
        };
        match found {
            Ok(elements) => Ok(elements.into_iter().map(Arc::new).collect()),
            // CDP reports an empty match set as a lookup failure
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(cdp_error(e, &format!("find {locator}"))),
        }
    }

    async fn attribute(&self, element: &Arc<Element>, name: &str) -> Result<Option<String>, AppError> {
        element
            .attribute(name)
            .await
            .map_err(|e| cdp_error(e, "read attribute"))
    }

    async fn property(&self, element: &Arc<Element>, name: &str) -> Result<Option<String>, AppError> {
        let value = element
            .property(name)
            .await
            .map_err(|e| cdp_error(e, "read property"))?;
        Ok(value.and_then(|v| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }))
    }

    async fn is_clickable(&self, element: &Arc<Element>) -> Result<bool, AppError> {
        self.call_bool(element, IS_CLICKABLE_JS).await
    }

    async fn move_and_click(&self, element: &Arc<Element>) -> Result<(), AppError> {
        element
            .scroll_into_view()
            .await
            .map_err(|e| cdp_error(e, "scroll into view"))?;
        let point = element
            .clickable_point()
            .await
            .map_err(|e| cdp_error(e, "locate click point"))?;
        self.page
            .move_mouse(point)
            .await
            .map_err(|e| cdp_error(e, "move mouse"))?;
        self.page
            .click(point)
            .await
            .map_err(|e| cdp_error(e, "click"))?;
        Ok(())
    }

    async fn type_text(&self, element: &Arc<Element>, text: &str) -> Result<(), AppError> {
        element
            .click()
            .await
            .map_err(|e| cdp_error(e, "focus input"))?;
        element
            .type_str(text)
            .await
            .map_err(|e| cdp_error(e, "type text"))?;
        Ok(())
    }

    async fn wheel_scroll_to(&self, element: &Arc<Element>) -> Result<(), AppError> {
        let origin = Point { x: 200.0, y: 300.0 };
        for _ in 0..MAX_WHEEL_STEPS {
            if self.call_bool(element, IN_VIEWPORT_JS).await? {
                return Ok(());
            }
            self.wheel(origin, WHEEL_STEP).await?;
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
        tracing::debug!("Element still outside the viewport after wheel scrolling");
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.eval::<serde_json::Value>(
            "window.scrollTo(0, document.body.scrollHeight); true",
        )
        .await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, AppError> {
        self.eval("document.documentElement.scrollHeight").await
    }

    async fn is_network_idle(&self) -> Result<bool, AppError> {
        // readyState plus any resource still without a response end
        self.eval(
            "document.readyState === 'complete' && performance.getEntriesByType('resource').every(e => e.responseEnd > 0)",
        )
        .await
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, AppError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| cdp_error(e, "read cookies"))?;
        Ok(cookies.into_iter().map(from_cdp_cookie).collect())
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), AppError> {
        let params = cookies
            .iter()
            .map(to_cookie_param)
            .collect::<Result<Vec<_>, _>>()?;
        self.page
            .set_cookies(params)
            .await
            .map_err(|e| cdp_error(e, "set cookies"))?;
        Ok(())
    }
}
