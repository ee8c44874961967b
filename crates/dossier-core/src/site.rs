//! Everything the pipeline knows about the target site's URLs and markup.
//!
//! The defaults describe the professional network the pipeline was built
//! against. Swapping the layout (together with a [`crate::classifier::LayoutTable`])
//! retargets the pipeline without touching the extraction algorithms.

use url::Url;

use crate::locator::Locator;
use crate::sections::Section;

/// Login form locators.
#[derive(Debug, Clone)]
pub struct LoginLayout {
    pub sign_in_link: Locator,
    pub username_field: Locator,
    pub password_field: Locator,
    pub submit_button: Locator,
}

/// Selectors for the profile header (top card).
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    pub name: String,
    pub headline: String,
    pub connection_degree: String,
    /// Label of the "current company" button; may be absent.
    pub current_company: Locator,
}

/// Selectors for the recent-activity feed.
///
/// All three are evaluated against the same HTML snapshot so their results
/// can be zipped by ordinal index.
#[derive(Debug, Clone)]
pub struct ActivityLayout {
    /// Post containers carrying the activity URN attribute.
    pub post: String,
    pub urn_attribute: String,
    pub text: String,
    pub posted_label: String,
    pub permalink_prefix: String,
}

#[derive(Debug, Clone)]
pub struct MutualConnectionsLayout {
    pub shared_link: Locator,
    pub names: Locator,
}

#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Scheme + host, no trailing slash.
    pub base_url: String,
    /// Redirects to the signed-in member's own profile.
    pub my_profile_url: String,
    /// Path prefix of canonical profile URLs.
    pub profile_path_prefix: String,
    /// URL fragment present only once signed in.
    pub signed_in_marker: String,
    /// Selector for one flattened text row.
    pub row_selector: String,
    pub login: LoginLayout,
    pub header: HeaderLayout,
    pub activity: ActivityLayout,
    pub mutual_connections: MutualConnectionsLayout,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            base_url: "https://www.linkedin.com".into(),
            my_profile_url: "https://www.linkedin.com/in/".into(),
            profile_path_prefix: "/in/".into(),
            signed_in_marker: "feed".into(),
            row_selector: "li".into(),
            login: LoginLayout {
                sign_in_link: Locator::xpath(r#"//a[contains(text(),"Sign in")][1]"#),
                username_field: Locator::id("username"),
                password_field: Locator::id("password"),
                submit_button: Locator::xpath(r#"//*[@type="submit"]"#),
            },
            header: HeaderLayout {
                name: "div.mt2.relative h1".into(),
                headline: "div.mt2.relative div.text-body-medium".into(),
                connection_degree: "span.dist-value".into(),
                current_company: Locator::xpath(
                    r#"//button[contains(@aria-label,"Current company")]"#,
                ),
            },
            activity: ActivityLayout {
                post: r#"div[data-urn*="activity"]"#.into(),
                urn_attribute: "data-urn".into(),
                text: "div.update-components-text".into(),
                posted_label: concat!(
                    r#"div[class*="fie-impression-container"] div.relative "#,
                    r#"span[class*="update-components-actor__sub-description"] "#,
                    r#"span[aria-hidden="true"]"#
                )
                .into(),
                permalink_prefix: "https://www.linkedin.com/feed/update/".into(),
            },
            mutual_connections: MutualConnectionsLayout {
                shared_link: Locator::xpath("//a[contains(@href,'facetNetwork')]"),
                names: Locator::xpath(
                    "//div[contains(@class,'linked-area')]//span//a//span//span[1]",
                ),
            },
        }
    }
}

impl SiteLayout {
    /// Canonical sub-page URL for `section` of the profile at `profile_url`.
    pub fn section_url(&self, profile_url: &str, section: Section) -> String {
        format!("{}{}", profile_url.trim_end_matches('/'), section.suffix())
    }

    /// True when `url` is an https URL on this site under the profile path
    /// prefix with a non-empty slug.
    pub fn is_profile_url(&self, url: &str) -> bool {
        let (Ok(candidate), Ok(base)) = (Url::parse(url), Url::parse(&self.base_url)) else {
            return false;
        };
        candidate.scheme() == "https"
            && candidate.host_str() == base.host_str()
            && candidate
                .path()
                .strip_prefix(&self.profile_path_prefix)
                .is_some_and(|slug| !slug.trim_matches('/').is_empty())
    }

    /// True when the session's current URL shows a signed-in page.
    pub fn is_signed_in(&self, current_url: &str) -> bool {
        current_url.contains(&self.signed_in_marker)
    }

    /// Absolute permalink for an activity URN.
    pub fn activity_permalink(&self, urn: &str) -> String {
        format!("{}{}", self.activity.permalink_prefix, urn)
    }
}
