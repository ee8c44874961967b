pub mod accessor;
pub mod assembler;
pub mod auth;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod dates;
pub mod dom;
pub mod error;
pub mod locator;
pub mod models;
pub mod retry;
pub mod sections;
pub mod site;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use assembler::{AssemblyStage, ProfileService};
pub use cache::{MemoryProfileStore, ProfileCache};
pub use config::{PipelineConfig, RetryPolicy};
pub use error::AppError;
pub use locator::Locator;
pub use models::{CachedProfile, Cookie, Credentials, ProfileRecord, compute_hash};
pub use sections::Section;
pub use site::SiteLayout;
pub use traits::{BrowserSession, CookieJar, IndustryClassifier, NullStore, ProfileStore};
