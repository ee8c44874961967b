//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::locator::Locator;
use crate::models::{CachedProfile, Cookie, ProfileRecord};
use crate::traits::{BrowserSession, CookieJar, IndustryClassifier, ProfileStore};

/// Render `(leading blanks, head)` pairs as a list page for the row splitter.
pub fn rows_page(rows: &[(usize, String)]) -> String {
    let items: String = rows
        .iter()
        .map(|(blanks, head)| format!("<li>{}{head}</li>", "\n".repeat(*blanks)))
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Element handle returned by [`MockSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    pub locator: String,
    pub index: usize,
    pub text: String,
}

#[derive(Default)]
struct SessionState {
    current_url: String,
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    /// `(cookie name, from, to)`: redirect applied only while the cookie is set.
    cookie_redirects: Vec<(String, String, String)>,
    /// Element texts keyed by locator display form.
    elements: HashMap<String, Vec<String>>,
    /// Items revealed one at a time by wheel scrolls.
    lazy: HashMap<String, VecDeque<String>>,
    /// Clicking an element of this locator lands on the URL.
    click_targets: HashMap<String, String>,
    /// Remaining `find_all` calls that fail with a stale reference.
    stale: HashMap<String, usize>,
    cookies: Vec<Cookie>,
    navigations: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    wheel_scrolls: usize,
    window_scrolls: usize,
}

/// Scriptable in-memory browser tab.
///
/// Pages are static HTML keyed by URL. Elements are keyed by locator and
/// expose their text through `textContent` only.
#[derive(Clone)]
pub struct MockSession {
    state: Arc<Mutex<SessionState>>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                current_url: "about:blank".into(),
                ..Default::default()
            })),
        }
    }

    pub fn add_page(&self, url: &str, html: &str) {
        let mut state = self.state.lock().unwrap();
        state.pages.insert(url.to_string(), html.to_string());
    }

    pub fn add_redirect(&self, from: &str, to: &str) {
        let mut state = self.state.lock().unwrap();
        state.redirects.insert(from.to_string(), to.to_string());
    }

    /// Redirect `from` to `to` once a cookie called `cookie_name` is set.
    pub fn redirect_with_cookie(&self, cookie_name: &str, from: &str, to: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .cookie_redirects
            .push((cookie_name.to_string(), from.to_string(), to.to_string()));
    }

    pub fn set_elements(&self, locator: &Locator, texts: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.elements.insert(
            locator.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// Each wheel scroll reveals the next of `texts` under `locator`.
    pub fn grow_on_scroll(&self, locator: &Locator, texts: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.lazy.insert(
            locator.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// Clicking any element of `locator` navigates to `url` and sets a
    /// `li_at` session cookie, like a successful sign-in.
    pub fn on_click_navigate(&self, locator: &Locator, url: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .click_targets
            .insert(locator.to_string(), url.to_string());
    }

    /// The next `times` lookups of `locator` fail with a stale reference.
    pub fn stale_for(&self, locator: &Locator, times: usize) {
        let mut state = self.state.lock().unwrap();
        state.stale.insert(locator.to_string(), times);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn wheel_scrolls(&self) -> usize {
        self.state.lock().unwrap().wheel_scrolls
    }

    pub fn window_scrolls(&self) -> usize {
        self.state.lock().unwrap().window_scrolls
    }

    pub fn session_cookies(&self) -> Vec<Cookie> {
        self.state.lock().unwrap().cookies.clone()
    }

    fn resolve(state: &SessionState, url: &str) -> String {
        for (cookie, from, to) in &state.cookie_redirects {
            if from == url && state.cookies.iter().any(|c| &c.name == cookie) {
                return to.clone();
            }
        }
        state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string())
    }
}

impl BrowserSession for MockSession {
    type Element = MockElement;

    async fn goto(&self, url: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.current_url = Self::resolve(&state, url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AppError> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn content(&self) -> Result<String, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pages
            .get(&state.current_url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<MockElement>, AppError> {
        let mut state = self.state.lock().unwrap();
        let key = locator.to_string();
        if let Some(remaining) = state.stale.get_mut(&key)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(AppError::StaleElement(key));
        }
        Ok(state
            .elements
            .get(&key)
            .map(|texts| {
                texts
                    .iter()
                    .enumerate()
                    .map(|(index, text)| MockElement {
                        locator: key.clone(),
                        index,
                        text: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn attribute(
        &self,
        element: &MockElement,
        name: &str,
    ) -> Result<Option<String>, AppError> {
        Ok((name == "aria-label").then(|| element.text.clone()))
    }

    async fn property(&self, element: &MockElement, name: &str) -> Result<Option<String>, AppError> {
        Ok((name == "textContent").then(|| element.text.clone()))
    }

    async fn is_clickable(&self, _element: &MockElement) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn move_and_click(&self, element: &MockElement) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(element.text.clone());
        if let Some(url) = state.click_targets.get(&element.locator).cloned() {
            state.current_url = url;
            state.cookies.push(Cookie {
                name: "li_at".into(),
                value: "session-token".into(),
                domain: Some(".linkedin.com".into()),
                path: Some("/".into()),
                expiry: None,
                secure: Some(true),
                http_only: Some(true),
            });
        }
        Ok(())
    }

    async fn type_text(&self, element: &MockElement, text: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state
            .typed
            .push((element.locator.clone(), text.to_string()));
        Ok(())
    }

    async fn wheel_scroll_to(&self, element: &MockElement) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.wheel_scrolls += 1;
        let revealed = state
            .lazy
            .get_mut(&element.locator)
            .and_then(VecDeque::pop_front);
        if let Some(text) = revealed {
            state
                .elements
                .entry(element.locator.clone())
                .or_default()
                .push(text);
        }
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().window_scrolls += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, AppError> {
        let state = self.state.lock().unwrap();
        let items: usize = state.elements.values().map(Vec::len).sum();
        Ok(1000 + 100 * items as u64)
    }

    async fn is_network_idle(&self) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, AppError> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), AppError> {
        self.state.lock().unwrap().cookies = cookies.to_vec();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory profile store that records writes.
#[derive(Clone, Default)]
pub struct MockStore {
    entries: Arc<Mutex<HashMap<String, CachedProfile>>>,
    saves: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with an explicit age.
    pub fn with_entry(self, key: &str, profile: ProfileRecord, updated_at: DateTime<Utc>) -> Self {
        let data_hash = profile
            .to_json()
            .map(|json| crate::models::compute_hash(&json))
            .unwrap_or_default();
        self.entries.lock().unwrap().insert(
            key.to_string(),
            CachedProfile {
                profile,
                data_hash,
                updated_at,
            },
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<CachedProfile> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Key lists of every `save` call, in order.
    pub fn saves(&self) -> Vec<Vec<String>> {
        self.saves.lock().unwrap().clone()
    }
}

impl ProfileStore for MockStore {
    async fn load(&self, key: &str) -> Result<Option<CachedProfile>, AppError> {
        Ok(self.get(key))
    }

    async fn save(
        &self,
        keys: &[String],
        profile: &ProfileRecord,
        data_hash: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.insert(
                key.clone(),
                CachedProfile {
                    profile: profile.clone(),
                    data_hash: data_hash.to_string(),
                    updated_at: now,
                },
            );
        }
        self.saves.lock().unwrap().push(keys.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<u64, AppError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(evicted) = entries.remove(key) else {
            return Ok(0);
        };
        let before = entries.len();
        if let Some(url) = evicted.profile.profile_url {
            entries.retain(|_, cached| cached.profile.profile_url.as_ref() != Some(&url));
        }
        Ok((1 + before - entries.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// MockCookieJar
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockCookieJar {
    jars: Arc<Mutex<HashMap<String, Vec<Cookie>>>>,
}

impl MockCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(self, identity: &str, cookies: Vec<Cookie>) -> Self {
        self.jars
            .lock()
            .unwrap()
            .insert(identity.to_string(), cookies);
        self
    }

    pub fn get(&self, identity: &str) -> Vec<Cookie> {
        self.jars
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }
}

impl CookieJar for MockCookieJar {
    async fn load(&self, identity: &str) -> Result<Vec<Cookie>, AppError> {
        Ok(self.get(identity))
    }

    async fn store(&self, identity: &str, cookies: &[Cookie]) -> Result<(), AppError> {
        self.jars
            .lock()
            .unwrap()
            .insert(identity.to_string(), cookies.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Industry classifier returning a fixed label (or error) and counting calls.
#[derive(Clone)]
pub struct MockClassifier {
    industry: Option<String>,
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl MockClassifier {
    pub fn new(industry: &str) -> Self {
        Self {
            industry: Some(industry.to_string()),
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            industry: None,
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl IndustryClassifier for MockClassifier {
    async fn classify(&self, _profile: &ProfileRecord) -> Result<Option<String>, AppError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(AppError::LlmError {
                message: "mock failure".into(),
                status_code: 503,
                retryable: true,
            });
        }
        Ok(self.industry.clone())
    }
}
