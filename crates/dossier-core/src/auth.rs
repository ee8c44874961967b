use chrono::{DateTime, TimeDelta, Utc};

use crate::accessor::ElementAccessor;
use crate::error::AppError;
use crate::models::{Cookie, Credentials};
use crate::retry::{Expectation, resolve};
use crate::site::SiteLayout;
use crate::traits::{BrowserSession, CookieJar};

/// Lifetime given to persisted cookies that carry no usable expiry.
const DEFAULT_COOKIE_LIFETIME_DAYS: i64 = 30;

/// Normalize persisted cookies before they are handed to the browser.
///
/// Missing or non-positive expiries become `now + 30 days`, missing flags
/// become `false`, and nameless cookies are dropped.
pub fn prepare_cookies(cookies: Vec<Cookie>, now: DateTime<Utc>) -> Vec<Cookie> {
    let default_expiry = (now + TimeDelta::days(DEFAULT_COOKIE_LIFETIME_DAYS)).timestamp();
    cookies
        .into_iter()
        .filter_map(|mut cookie| {
            if cookie.name.trim().is_empty() {
                tracing::warn!(domain = ?cookie.domain, "Skipping cookie without a name");
                return None;
            }
            cookie.expiry = Some(cookie.expiry.filter(|&e| e > 0).unwrap_or(default_expiry));
            cookie.secure = Some(cookie.secure.unwrap_or(false));
            cookie.http_only = Some(cookie.http_only.unwrap_or(false));
            Some(cookie)
        })
        .collect()
}

/// Brings a session into a signed-in state for one account.
pub struct Authenticator<'a, S: BrowserSession, J: CookieJar> {
    accessor: &'a ElementAccessor<'a, S>,
    site: &'a SiteLayout,
    jar: &'a J,
}

impl<'a, S: BrowserSession, J: CookieJar> Authenticator<'a, S, J> {
    pub fn new(accessor: &'a ElementAccessor<'a, S>, site: &'a SiteLayout, jar: &'a J) -> Self {
        Self {
            accessor,
            site,
            jar,
        }
    }

    /// Reuse persisted cookies when they still yield a signed-in page,
    /// otherwise log in with `credentials`. The resulting cookies are
    /// persisted either way.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<(), AppError> {
        let identity = credentials.identity.as_str();
        let session = self.accessor.session();

        self.visit(&self.site.base_url).await?;

        let saved = match self.jar.load(identity).await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!(%identity, error = %e, "Could not load cookie jar");
                Vec::new()
            }
        };
        if !saved.is_empty() {
            let cookies = prepare_cookies(saved, Utc::now());
            tracing::debug!(%identity, count = cookies.len(), "Restoring saved cookies");
            session.set_cookies(&cookies).await?;
            self.visit(&self.site.base_url).await?;
        }

        if self.site.is_signed_in(&session.current_url().await?) {
            tracing::info!(%identity, "Session restored from cookies");
        } else {
            self.login(credentials).await?;
            tracing::info!(%identity, "Signed in with credentials");
        }

        let cookies = session.cookies().await?;
        if let Err(e) = self.jar.store(identity, &cookies).await {
            tracing::warn!(%identity, error = %e, "Could not persist cookies");
        }
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), AppError> {
        let failed = |message: String| AppError::AuthenticationFailed {
            identity: credentials.identity.clone(),
            message,
        };
        let login = &self.site.login;

        self.accessor
            .click(&login.sign_in_link, "Finding Sign In Link", Expectation::Optional)
            .await?;
        self.accessor
            .fill(&login.username_field, "Entering Username", &credentials.identity)
            .await
            .map_err(|e| failed(format!("username field: {e}")))?;
        self.accessor
            .fill(&login.password_field, "Entering Password", &credentials.secret)
            .await
            .map_err(|e| failed(format!("password field: {e}")))?;
        self.accessor
            .click(&login.submit_button, "Submitting Login", Expectation::Always)
            .await
            .map_err(|e| failed(format!("submit button: {e}")))?;

        let config = self.accessor.config();
        let signed_in = resolve(
            &config.retry,
            "Waiting For Feed",
            Expectation::Optional,
            self.accessor.cancel(),
            move || self.wait_signed_in(),
        )
        .await?;

        match signed_in {
            Some(()) => Ok(()),
            None => {
                let url = self.accessor.session().current_url().await.unwrap_or_default();
                Err(failed(format!("still on {url} after submitting credentials")))
            }
        }
    }

    async fn wait_signed_in(&self) -> Result<(), AppError> {
        let session = self.accessor.session();
        let poll = self.accessor.config().retry.poll_interval;
        loop {
            if self.site.is_signed_in(&session.current_url().await?) {
                return Ok(());
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn visit(&self, url: &str) -> Result<(), AppError> {
        self.accessor.session().goto(url).await?;
        self.accessor.wait_for_network_idle().await;
        Ok(())
    }
}
