use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::site::SiteLayout;

/// End marker for a position that has no parseable end boundary.
pub const PRESENT: &str = "Present";

fn present() -> String {
    PRESENT.to_string()
}

/// Structured representation of a professional-network profile.
///
/// Serialized as flat JSON both for the cache and as prompt context for the
/// content-generation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub full_name: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub connection_degree: Option<String>,

    #[serde(default)]
    pub recent_activities: Vec<Activity>,
    #[serde(default)]
    pub mutual_connections: Vec<String>,

    #[serde(default)]
    pub endorsements: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub awards: Vec<String>,

    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl ProfileRecord {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.full_name.split_whitespace().next()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.full_name.split_whitespace().last()
    }

    /// True when the viewer is a first-degree connection of this profile.
    pub fn is_first_degree(&self) -> bool {
        self.connection_degree
            .as_deref()
            .is_some_and(|degree| degree.contains('1'))
    }

    /// One-sentence description used as prompt context.
    pub fn summary(&self) -> String {
        let mut summary = self.full_name.clone();
        if let Some(title) = &self.job_title {
            summary.push_str(&format!(" is currently working as a {title}"));
        }
        if let Some(company) = &self.company_name {
            summary.push_str(&format!(" at {company}"));
        }
        match &self.industry {
            Some(industry) => summary.push_str(&format!(" in the {industry} industry.")),
            None => summary.push('.'),
        }
        summary
    }

    /// Checks the record invariants: a non-blank name and, when present, a
    /// canonical profile URL for `site`.
    pub fn validate(&self, site: &SiteLayout) -> Result<(), AppError> {
        if self.full_name.trim().is_empty() {
            return Err(AppError::InvalidProfile("full_name is required".into()));
        }
        if let Some(url) = &self.profile_url
            && !site.is_profile_url(url)
        {
            return Err(AppError::InvalidProfile(format!(
                "'{url}' is not a canonical profile URL"
            )));
        }
        Ok(())
    }

    /// Serializes the record to its cache/prompt JSON form.
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One employer entry; groups the positions held there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl Experience {
    /// True when no position carries any data.
    pub fn is_sentinel(&self) -> bool {
        self.positions.iter().all(Position::is_sentinel)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default = "present")]
    pub end_date: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            title: None,
            start_date: None,
            end_date: present(),
            details: Vec::new(),
            skills: Vec::new(),
        }
    }
}

impl Position {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// True when the position is structurally equal to the freshly-opened
    /// placeholder.
    pub fn is_sentinel(&self) -> bool {
        *self == Position::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub endorsements: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// Posting day formatted like `Mar 04 2025`.
    pub fn posted_on(&self) -> Option<String> {
        self.posted_at.map(|t| t.format("%b %d %Y").to_string())
    }
}

/// Account credentials handed over by the credential store.
#[derive(Clone)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .finish()
    }
}

/// One entry of a per-account cookie jar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Unix timestamp (seconds). Missing values get a 30 day lifetime on load.
    #[serde(default)]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub http_only: Option<bool>,
}

/// A cached profile snapshot as returned by a [`crate::traits::ProfileStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedProfile {
    pub profile: ProfileRecord,
    /// SHA-256 of the serialized profile (change detection).
    pub data_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
