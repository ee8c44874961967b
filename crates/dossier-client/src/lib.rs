pub mod llm;

#[cfg(feature = "browser")]
pub mod browser_session;

#[cfg(feature = "browser")]
pub use browser_session::ChromeSession;
pub use llm::OpenAiIndustryClassifier;
