use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::accessor::ElementAccessor;
use crate::auth::Authenticator;
use crate::cache::ProfileCache;
use crate::classifier::RowClassifier;
use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{Credentials, ProfileRecord};
use crate::sections::{ProfileHeader, Section, SectionExtractor};
use crate::site::SiteLayout;
use crate::traits::{BrowserSession, CookieJar, IndustryClassifier, NullStore, ProfileStore};

/// Where a profile request currently is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStage {
    Miss,
    Authenticating,
    Navigating,
    Extracting(Section),
    Assembled,
    Cached,
    FailedToAuthenticate,
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyStage::Miss => f.write_str("MISS"),
            AssemblyStage::Authenticating => f.write_str("AUTHENTICATING"),
            AssemblyStage::Navigating => f.write_str("NAVIGATING"),
            AssemblyStage::Extracting(section) => write!(f, "EXTRACTING({section})"),
            AssemblyStage::Assembled => f.write_str("ASSEMBLED"),
            AssemblyStage::Cached => f.write_str("CACHED"),
            AssemblyStage::FailedToAuthenticate => f.write_str("FAILED_TO_AUTHENTICATE"),
        }
    }
}

/// Serves profile records from the cache, scraping them on a miss.
///
/// Generic over the browser session, the snapshot store, the cookie jar and
/// the industry classifier so each can be swapped for a test double.
pub struct ProfileService<S, P, J, C = NullStore>
where
    S: BrowserSession,
    P: ProfileStore,
    J: CookieJar,
    C: IndustryClassifier,
{
    session: S,
    cache: ProfileCache<P>,
    jar: J,
    industry: Option<C>,
    site: SiteLayout,
    rows: RowClassifier,
    config: PipelineConfig,
}

impl<S, P, J> ProfileService<S, P, J, NullStore>
where
    S: BrowserSession,
    P: ProfileStore,
    J: CookieJar,
{
    /// Create a service without industry enrichment.
    pub fn new(session: S, store: P, jar: J, config: PipelineConfig) -> Self {
        Self {
            session,
            cache: ProfileCache::new(store, config.freshness),
            jar,
            industry: None,
            site: SiteLayout::default(),
            rows: RowClassifier::default(),
            config,
        }
    }

    /// Enrich scraped profiles with an industry label from `classifier`.
    pub fn with_classifier<C: IndustryClassifier>(self, classifier: C) -> ProfileService<S, P, J, C> {
        ProfileService {
            session: self.session,
            cache: self.cache,
            jar: self.jar,
            industry: Some(classifier),
            site: self.site,
            rows: self.rows,
            config: self.config,
        }
    }
}

impl<S, P, J, C> ProfileService<S, P, J, C>
where
    S: BrowserSession,
    P: ProfileStore,
    J: CookieJar,
    C: IndustryClassifier,
{
    pub fn with_site(mut self, site: SiteLayout) -> Self {
        self.site = site;
        self
    }

    pub fn with_row_classifier(mut self, rows: RowClassifier) -> Self {
        self.rows = rows;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn cache(&self) -> &ProfileCache<P> {
        &self.cache
    }

    /// Give the session back so the caller can release it.
    pub fn into_session(self) -> S {
        self.session
    }

    /// The signed-in account's own profile.
    ///
    /// `identity` keys the cache and back-fills the name when the header
    /// yields nothing. Mutual connections are not collected for oneself.
    pub async fn get_profile(
        &self,
        identity: &str,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<ProfileRecord, AppError> {
        if let Some(hit) = self.cached(identity).await {
            return Ok(hit);
        }
        self.transition(identity, AssemblyStage::Miss);

        let accessor = ElementAccessor::new(&self.session, &self.config, cancel);
        self.authenticate(&accessor, identity, credentials).await?;

        self.transition(identity, AssemblyStage::Navigating);
        let profile_url = self.open(&accessor, &self.site.my_profile_url).await?;

        let record = self
            .assemble(&accessor, identity, &profile_url, false)
            .await?;

        self.write_through(identity, vec![identity.to_string()], &record)
            .await?;
        Ok(record)
    }

    /// Someone else's profile, cached under its URL.
    pub async fn get_profile_by_url(
        &self,
        profile_url: &str,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<ProfileRecord, AppError> {
        if !self.site.is_profile_url(profile_url) {
            return Err(AppError::InvalidProfile(format!(
                "'{profile_url}' is not a profile URL"
            )));
        }
        if let Some(hit) = self.cached(profile_url).await {
            return Ok(hit);
        }
        self.transition(profile_url, AssemblyStage::Miss);

        let accessor = ElementAccessor::new(&self.session, &self.config, cancel);
        self.authenticate(&accessor, &credentials.identity, credentials)
            .await?;

        self.transition(profile_url, AssemblyStage::Navigating);
        let canonical = self.open(&accessor, profile_url).await?;

        let record = self
            .assemble(&accessor, profile_url, &canonical, true)
            .await?;

        self.write_through(profile_url, vec![profile_url.to_string()], &record)
            .await?;
        Ok(record)
    }

    /// Fresh cached record, if any. Store failures degrade to a miss.
    async fn cached(&self, key: &str) -> Option<ProfileRecord> {
        match self.cache.lookup(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Cache lookup failed, scraping instead");
                None
            }
        }
    }

    async fn authenticate(
        &self,
        accessor: &ElementAccessor<'_, S>,
        key: &str,
        credentials: &Credentials,
    ) -> Result<(), AppError> {
        check_cancelled(accessor.cancel())?;
        self.transition(key, AssemblyStage::Authenticating);
        let result = Authenticator::new(accessor, &self.site, &self.jar)
            .authenticate(credentials)
            .await;
        if let Err(AppError::AuthenticationFailed { message, .. }) = &result {
            tracing::error!(%key, stage = %AssemblyStage::FailedToAuthenticate, %message, "Authentication failed");
        }
        result
    }

    /// Navigate to `url` and return where the site actually landed.
    async fn open(&self, accessor: &ElementAccessor<'_, S>, url: &str) -> Result<String, AppError> {
        check_cancelled(accessor.cancel())?;
        self.session.goto(url).await?;
        accessor.wait_for_network_idle().await;
        self.session.current_url().await
    }

    /// Header plus every section, in random order, then enrichment.
    async fn assemble(
        &self,
        accessor: &ElementAccessor<'_, S>,
        key: &str,
        profile_url: &str,
        include_mutual: bool,
    ) -> Result<ProfileRecord, AppError> {
        let extractor = SectionExtractor::new(accessor, &self.site, &self.rows);

        let header = match extractor.header().await {
            Ok(header) => header,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Could not read profile header");
                ProfileHeader::default()
            }
        };
        let mut record = ProfileRecord {
            full_name: header.name.unwrap_or_default(),
            job_title: header.headline,
            company_name: header.current_company,
            connection_degree: header.connection_degree,
            ..Default::default()
        };

        let mut sections: Vec<Section> = Section::ALL
            .into_iter()
            .filter(|s| include_mutual || *s != Section::MutualConnections)
            .collect();
        shuffle(&mut sections, time_seed());

        for section in sections {
            check_cancelled(accessor.cancel())?;
            self.transition(key, AssemblyStage::Extracting(section));
            match extractor.extract_into(section, profile_url, &mut record).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(%key, section = %section, error = %e, "Section extraction failed, leaving it empty");
                }
            }
        }

        self.enrich(&mut record, key, profile_url).await;
        record.validate(&self.site)?;
        self.transition(key, AssemblyStage::Assembled);
        Ok(record)
    }

    async fn enrich(&self, record: &mut ProfileRecord, key: &str, profile_url: &str) {
        if record.full_name.trim().is_empty() {
            tracing::debug!(%key, "Header had no name, back-filling from identity");
            record.full_name = key.to_string();
        }
        if self.site.is_profile_url(profile_url) {
            record.profile_url = Some(profile_url.to_string());
        } else {
            tracing::warn!(%key, url = %profile_url, "Landed on a non-profile URL");
        }

        if let Some(classifier) = &self.industry {
            match classifier.classify(record).await {
                Ok(Some(industry)) => record.industry = Some(industry),
                Ok(None) => {}
                Err(e) => tracing::warn!(%key, error = %e, "Industry classification failed"),
            }
        }
    }

    /// Cache `record` under `keys` plus its canonical URL.
    async fn write_through(
        &self,
        key: &str,
        mut keys: Vec<String>,
        record: &ProfileRecord,
    ) -> Result<(), AppError> {
        if let Some(url) = &record.profile_url
            && !keys.contains(url)
        {
            keys.push(url.clone());
        }
        self.cache.store(&keys, record).await?;
        self.transition(key, AssemblyStage::Cached);
        Ok(())
    }

    fn transition(&self, key: &str, stage: AssemblyStage) {
        tracing::info!(%key, stage = %stage, "Profile assembly");
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), AppError> {
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Section order shuffling: xorshift seeded from the current time.
// ---------------------------------------------------------------------------

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Fisher–Yates shuffle driven by xorshift64.
fn shuffle<T>(items: &mut [T], seed: u64) {
    // xorshift must never start from zero
    let mut x = seed | 1;
    for i in (1..items.len()).rev() {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        let j = (x % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
