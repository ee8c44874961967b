use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::locator::Locator;
use crate::retry::{Expectation, resolve};
use crate::traits::BrowserSession;

/// Element lookups, clicks and scrolling on top of a [`BrowserSession`],
/// each wrapped in the configured retry budget.
pub struct ElementAccessor<'a, S: BrowserSession> {
    session: &'a S,
    config: &'a PipelineConfig,
    cancel: &'a CancellationToken,
}

impl<'a, S: BrowserSession> ElementAccessor<'a, S> {
    pub fn new(session: &'a S, config: &'a PipelineConfig, cancel: &'a CancellationToken) -> Self {
        Self {
            session,
            config,
            cancel,
        }
    }

    pub fn session(&self) -> &'a S {
        self.session
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn cancel(&self) -> &'a CancellationToken {
        self.cancel
    }

    /// First element matching `locator`.
    pub async fn get_element(
        &self,
        locator: &Locator,
        reason: &str,
        expectation: Expectation,
    ) -> Result<Option<S::Element>, AppError> {
        let found = self.get_elements(locator, reason, expectation).await?;
        Ok(found.into_iter().next())
    }

    /// All elements matching `locator`, waiting until at least one exists.
    pub async fn get_elements(
        &self,
        locator: &Locator,
        reason: &str,
        expectation: Expectation,
    ) -> Result<Vec<S::Element>, AppError> {
        let found = resolve(&self.config.retry, reason, expectation, self.cancel, move || {
            self.wait_present(locator)
        })
        .await?;
        Ok(found.unwrap_or_default())
    }

    /// Wait for a clickable element, pointer-click it, then let the network
    /// settle. Returns `false` when an optional element never showed up.
    pub async fn click(
        &self,
        locator: &Locator,
        reason: &str,
        expectation: Expectation,
    ) -> Result<bool, AppError> {
        let clicked = resolve(&self.config.retry, reason, expectation, self.cancel, move || async move {
            let element = self.wait_clickable(locator).await?;
            self.session.move_and_click(&element).await
        })
        .await?;

        if clicked.is_none() {
            return Ok(false);
        }
        self.wait_for_network_idle().await;
        Ok(true)
    }

    /// Type into the element found by `locator`.
    pub async fn fill(&self, locator: &Locator, reason: &str, text: &str) -> Result<(), AppError> {
        resolve(&self.config.retry, reason, Expectation::Always, self.cancel, move || async move {
            let element = self.wait_clickable(locator).await?;
            self.session.type_text(&element, text).await
        })
        .await?;
        Ok(())
    }

    /// Visible text of `element`: `innerText`, falling back to `textContent`.
    pub async fn text_of(&self, element: &S::Element) -> Result<String, AppError> {
        for property in ["innerText", "textContent"] {
            if let Some(text) = self.session.property(element, property).await?
                && !text.trim().is_empty()
            {
                return Ok(text.trim().to_string());
            }
        }
        Ok(String::new())
    }

    /// Wait until the document is complete and no requests have been in
    /// flight for the settle delay. Errors and timeouts are logged and
    /// swallowed: a page that never goes quiet is still worth reading.
    pub async fn wait_for_network_idle(&self) {
        let wait = self.config.retry.wait_timeout;
        match tokio::time::timeout(wait, self.poll_idle()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Network idle check failed"),
            Err(_) => tracing::debug!(timeout_ms = wait.as_millis() as u64, "Network never settled"),
        }
    }

    /// Scroll the window to the bottom `cycles` times, waiting for lazy
    /// content after each scroll.
    pub async fn scroll_page(&self, cycles: usize) -> Result<(), AppError> {
        for _ in 0..cycles {
            self.check_cancelled()?;
            self.session.scroll_to_bottom().await?;
            self.wait_for_network_idle().await;
        }
        Ok(())
    }

    /// Collect a lazily-rendered list by wheel-scrolling to its last item and
    /// re-querying.
    ///
    /// Stops when the item count is unchanged across two consecutive
    /// re-queries, when a scroll grows neither the count nor the document
    /// height, or after the configured ceiling.
    pub async fn scroll_collect(
        &self,
        locator: &Locator,
        reason: &str,
    ) -> Result<Vec<S::Element>, AppError> {
        let mut items = self.get_elements(locator, reason, Expectation::Optional).await?;
        if items.is_empty() {
            return Ok(items);
        }
        let mut height = self.session.scroll_height().await?;
        let mut unchanged = 0;

        for round in 0..self.config.scroll_ceiling {
            self.check_cancelled()?;
            if let Some(last) = items.last() {
                match self.session.wheel_scroll_to(last).await {
                    Ok(()) => {}
                    Err(e) if e.is_transient() => {
                        tracing::debug!(reason = %reason, error = %e, "Scroll target went stale");
                    }
                    Err(e) => return Err(e),
                }
            }
            self.wait_for_network_idle().await;

            let next = self.session.find_all(locator).await?;
            let next_height = self.session.scroll_height().await?;
            let grew = next.len() > items.len();

            if !grew && next_height == height {
                tracing::debug!(reason = %reason, round, count = items.len(), "Scroll produced no growth");
                break;
            }
            unchanged = if grew { 0 } else { unchanged + 1 };
            height = next_height;
            if next.len() >= items.len() {
                items = next;
            }
            if unchanged >= 2 {
                break;
            }
        }

        tracing::debug!(reason = %reason, count = items.len(), "Collected elements");
        Ok(items)
    }

    fn check_cancelled(&self) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    async fn wait_present(&self, locator: &Locator) -> Result<Vec<S::Element>, AppError> {
        loop {
            let found = self.session.find_all(locator).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            tokio::time::sleep(self.config.retry.poll_interval).await;
        }
    }

    async fn wait_clickable(&self, locator: &Locator) -> Result<S::Element, AppError> {
        loop {
            for element in self.session.find_all(locator).await? {
                if self.session.is_clickable(&element).await? {
                    return Ok(element);
                }
            }
            tokio::time::sleep(self.config.retry.poll_interval).await;
        }
    }

    async fn poll_idle(&self) -> Result<(), AppError> {
        let settle = self.config.settle_delay;
        let poll = self.config.retry.poll_interval.max(Duration::from_millis(1));
        loop {
            if self.session.is_network_idle().await? {
                tokio::time::sleep(settle).await;
                if self.session.is_network_idle().await? {
                    return Ok(());
                }
            }
            tokio::time::sleep(poll).await;
        }
    }
}
