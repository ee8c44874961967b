use std::fmt;

use chrono::Utc;

use crate::accessor::ElementAccessor;
use crate::classifier::{RowClassifier, zip_activities};
use crate::dom;
use crate::error::AppError;
use crate::models::{Activity, Certification, Experience, ProfileRecord, Skill};
use crate::retry::Expectation;
use crate::site::SiteLayout;
use crate::traits::BrowserSession;

/// One part of a profile that is read from its own page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Experience,
    Education,
    Certifications,
    Skills,
    RecentActivity,
    MutualConnections,
}

impl Section {
    /// Every section, in declaration order.
    pub const ALL: [Section; 6] = [
        Section::Experience,
        Section::Education,
        Section::Certifications,
        Section::Skills,
        Section::RecentActivity,
        Section::MutualConnections,
    ];

    /// Path appended to the profile URL to reach this section's page.
    pub fn suffix(&self) -> &'static str {
        match self {
            Section::Experience => "/details/experience/",
            Section::Education => "/details/education/",
            Section::Certifications => "/details/certifications/",
            Section::Skills => "/details/skills/",
            Section::RecentActivity => "/recent-activity/all/",
            Section::MutualConnections => "/",
        }
    }

    /// Window scrolls needed before the page holds every lazy-loaded item.
    pub fn scroll_cycles(&self) -> usize {
        match self {
            Section::Certifications | Section::Skills | Section::RecentActivity => 2,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Experience => "experiences",
            Section::Education => "education",
            Section::Certifications => "certifications",
            Section::Skills => "skills",
            Section::RecentActivity => "recent_activities",
            Section::MutualConnections => "mutual_connections",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top card of a profile page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileHeader {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub connection_degree: Option<String>,
    pub current_company: Option<String>,
}

/// Navigates to each section page and turns it into profile fields.
pub struct SectionExtractor<'a, S: BrowserSession> {
    accessor: &'a ElementAccessor<'a, S>,
    site: &'a SiteLayout,
    classifier: &'a RowClassifier,
}

impl<'a, S: BrowserSession> SectionExtractor<'a, S> {
    pub fn new(
        accessor: &'a ElementAccessor<'a, S>,
        site: &'a SiteLayout,
        classifier: &'a RowClassifier,
    ) -> Self {
        Self {
            accessor,
            site,
            classifier,
        }
    }

    /// Extract `section` of the profile at `profile_url` into `record`.
    ///
    /// The record field is only touched when extraction succeeds.
    pub async fn extract_into(
        &self,
        section: Section,
        profile_url: &str,
        record: &mut ProfileRecord,
    ) -> Result<(), AppError> {
        match section {
            Section::Experience => record.experiences = self.experiences(profile_url).await?,
            Section::Education => record.education = self.education(profile_url).await?,
            Section::Certifications => {
                record.certifications = self.certifications(profile_url).await?
            }
            Section::Skills => record.skills = self.skills(profile_url).await?,
            Section::RecentActivity => {
                record.recent_activities = self.recent_activities(profile_url).await?
            }
            Section::MutualConnections => {
                record.mutual_connections = self.mutual_connections(profile_url).await?
            }
        }
        Ok(())
    }

    pub async fn experiences(&self, profile_url: &str) -> Result<Vec<Experience>, AppError> {
        let rows = self.rows(profile_url, Section::Experience).await?;
        Ok(self
            .classifier
            .experiences(&rows, Utc::now().date_naive()))
    }

    pub async fn education(&self, profile_url: &str) -> Result<Vec<String>, AppError> {
        let rows = self.rows(profile_url, Section::Education).await?;
        Ok(self.classifier.education(&rows))
    }

    pub async fn certifications(&self, profile_url: &str) -> Result<Vec<Certification>, AppError> {
        let rows = self.rows(profile_url, Section::Certifications).await?;
        Ok(self.classifier.certifications(&rows))
    }

    pub async fn skills(&self, profile_url: &str) -> Result<Vec<Skill>, AppError> {
        let rows = self.rows(profile_url, Section::Skills).await?;
        Ok(self.classifier.skills(&rows))
    }

    /// Links, texts and posting labels all come from one snapshot so that
    /// index `i` of each list describes the same post.
    pub async fn recent_activities(&self, profile_url: &str) -> Result<Vec<Activity>, AppError> {
        let html = self.snapshot(profile_url, Section::RecentActivity).await?;
        let layout = &self.site.activity;

        let links = dom::select_attrs(&html, &layout.post, &layout.urn_attribute)?
            .iter()
            .map(|urn| self.site.activity_permalink(urn))
            .collect();
        let texts = dom::select_texts(&html, &layout.text)?;
        let labels = dom::select_texts(&html, &layout.posted_label)?;

        Ok(zip_activities(links, texts, labels, Utc::now()))
    }

    /// Names listed behind the "shared connections" link. Empty when the
    /// link is absent.
    pub async fn mutual_connections(&self, profile_url: &str) -> Result<Vec<String>, AppError> {
        self.open(profile_url).await?;

        let layout = &self.site.mutual_connections;
        let clicked = self
            .accessor
            .click(
                &layout.shared_link,
                "Finding Mutual Connections Link",
                Expectation::Optional,
            )
            .await?;
        if !clicked {
            return Ok(Vec::new());
        }

        let elements = self
            .accessor
            .scroll_collect(&layout.names, "Getting Mutual Connection Names")
            .await?;
        let mut names = Vec::with_capacity(elements.len());
        for element in &elements {
            let name = self.accessor.text_of(element).await?;
            if !name.is_empty() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Read the top card of the page currently open in the session.
    pub async fn header(&self) -> Result<ProfileHeader, AppError> {
        let html = self.accessor.session().content().await?;
        let layout = &self.site.header;

        let current_company = match self
            .accessor
            .get_element(
                &layout.current_company,
                "Finding Company Name",
                Expectation::Optional,
            )
            .await?
        {
            Some(button) => Some(self.accessor.text_of(&button).await?).filter(|s| !s.is_empty()),
            None => None,
        };

        Ok(ProfileHeader {
            name: dom::select_first_text(&html, &layout.name)?,
            headline: dom::select_first_text(&html, &layout.headline)?,
            connection_degree: dom::select_first_text(&html, &layout.connection_degree)?,
            current_company,
        })
    }

    async fn rows(&self, profile_url: &str, section: Section) -> Result<Vec<Vec<String>>, AppError> {
        let html = self.snapshot(profile_url, section).await?;
        let rows = dom::rows_from_html(&html, &self.site.row_selector)?;
        tracing::debug!(section = %section, rows = rows.len(), "Split page into rows");
        Ok(rows)
    }

    async fn snapshot(&self, profile_url: &str, section: Section) -> Result<String, AppError> {
        let url = self.site.section_url(profile_url, section);
        self.open(&url).await?;
        self.accessor.scroll_page(section.scroll_cycles()).await?;
        self.accessor.session().content().await
    }

    /// Navigate unless the session is already there.
    async fn open(&self, url: &str) -> Result<(), AppError> {
        let session = self.accessor.session();
        if session.current_url().await? != url {
            session.goto(url).await?;
            self.accessor.wait_for_network_idle().await;
        }
        Ok(())
    }
}
