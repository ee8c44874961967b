use std::future::Future;

use crate::error::AppError;
use crate::locator::Locator;
use crate::models::{CachedProfile, Cookie, ProfileRecord};

/// A stateful remote UI automation session (one browser tab).
///
/// Every call acts on "the current page". Callers must not interleave
/// navigations from two logical operations on the same session.
pub trait BrowserSession: Send + Sync {
    /// Opaque handle to an element on the current page. Handles go stale
    /// when the page re-renders.
    type Element: Clone + Send + Sync;

    fn goto(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Fully rendered HTML of the current page.
    fn content(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// All elements matching `locator`. An empty result is not an error.
    fn find_all(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Vec<Self::Element>, AppError>> + Send;

    fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// A DOM property read as a string (`innerText`, `textContent`, ...).
    fn property(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Visible, enabled and not covered.
    fn is_clickable(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Simulated pointer move to the element's centre followed by press/release.
    fn move_and_click(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Simulated mouse-wheel scroll until `element` is in view.
    fn wheel_scroll_to(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn scroll_to_bottom(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Current scroll height of the document, used to detect growth.
    fn scroll_height(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// True once the document is complete and no requests are in flight.
    fn is_network_idle(&self) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn cookies(&self) -> impl Future<Output = Result<Vec<Cookie>, AppError>> + Send;

    fn set_cookies(&self, cookies: &[Cookie]) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Persists and retrieves cached profile snapshots.
pub trait ProfileStore: Send + Sync + Clone {
    /// The latest snapshot stored under `key`, regardless of age.
    fn load(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<CachedProfile>, AppError>> + Send;

    /// Upsert the same snapshot under every key (last write wins).
    fn save(
        &self,
        keys: &[String],
        profile: &ProfileRecord,
        data_hash: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Remove the snapshot stored under `key` and every other key holding the
    /// same profile (same `profile_url`). Returns the number of rows removed.
    fn remove(&self, key: &str) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Per-account cookie persistence.
pub trait CookieJar: Send + Sync + Clone {
    fn load(&self, identity: &str) -> impl Future<Output = Result<Vec<Cookie>, AppError>> + Send;

    fn store(
        &self,
        identity: &str,
        cookies: &[Cookie],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Scrape-time enrichment that derives an industry label for a profile.
pub trait IndustryClassifier: Send + Sync + Clone {
    fn classify(
        &self,
        profile: &ProfileRecord,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;
}

/// A no-op store/jar/classifier for use when persistence or enrichment is
/// not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl ProfileStore for NullStore {
    async fn load(&self, _key: &str) -> Result<Option<CachedProfile>, AppError> {
        Ok(None)
    }

    async fn save(
        &self,
        _keys: &[String],
        _profile: &ProfileRecord,
        _data_hash: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<u64, AppError> {
        Ok(0)
    }
}

impl CookieJar for NullStore {
    async fn load(&self, _identity: &str) -> Result<Vec<Cookie>, AppError> {
        Ok(vec![])
    }

    async fn store(&self, _identity: &str, _cookies: &[Cookie]) -> Result<(), AppError> {
        Ok(())
    }
}

impl IndustryClassifier for NullStore {
    async fn classify(&self, _profile: &ProfileRecord) -> Result<Option<String>, AppError> {
        Ok(None)
    }
}
