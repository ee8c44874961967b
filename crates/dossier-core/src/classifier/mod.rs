//! Reconstruct nested profile records from positionally-flattened text rows.
//!
//! Each row is the visible text of one list item split on newlines. The
//! number of leading blank tokens (the *start identifier*) says what kind of
//! row it is; a [`LayoutTable`] maps that number to a [`RowRole`] per
//! section. Everything downstream is a small state machine per section.

mod activity;
mod certification;
mod education;
mod experience;
mod layout;
mod skills;

use std::sync::Arc;

use chrono::NaiveDate;

pub use activity::zip_activities;
pub use layout::{LayoutTable, RowRole};

use crate::models::{Certification, Experience, Skill};
use crate::sections::Section;

/// Maps a raw token to the text the classifier reads.
pub trait TokenNormalizer: Send + Sync {
    fn normalize<'t>(&self, token: &'t str) -> &'t str;
}

/// Keeps the first half of every token.
///
/// The target site renders each label twice (a visible and a screen-reader
/// copy), so the flattened text of one label is the label doubled.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfSplit;

impl TokenNormalizer for HalfSplit {
    fn normalize<'t>(&self, token: &'t str) -> &'t str {
        let half = token.chars().count() / 2;
        match token.char_indices().nth(half) {
            Some((byte, _)) => &token[..byte],
            None => token,
        }
    }
}

/// Passes tokens through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl TokenNormalizer for Verbatim {
    fn normalize<'t>(&self, token: &'t str) -> &'t str {
        token
    }
}

/// Number of leading blank tokens, or `None` for a row with no text at all.
pub fn start_identifier<S: AsRef<str>>(row: &[S]) -> Option<usize> {
    row.iter().position(|token| !token.as_ref().trim().is_empty())
}

/// A row whose role is known.
pub(crate) struct ClassifiedRow<'r> {
    pub role: RowRole,
    tokens: &'r [String],
    start: usize,
    normalizer: &'r dyn TokenNormalizer,
}

impl ClassifiedRow<'_> {
    /// Normalized, trimmed first non-blank token.
    pub fn head(&self) -> String {
        self.normalized(self.start).unwrap_or_default()
    }

    /// Normalized, trimmed token at `offset`, absent when out of range or blank.
    pub fn field(&self, offset: usize) -> Option<String> {
        self.normalized(offset)
    }

    /// Normalized non-blank tokens from the head onwards.
    pub fn fields(&self) -> impl Iterator<Item = String> + '_ {
        (self.start..self.tokens.len()).filter_map(|i| self.normalized(i))
    }

    fn normalized(&self, offset: usize) -> Option<String> {
        let token = self.tokens.get(offset)?;
        let text = self.normalizer.normalize(token).trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Turns rows into records using a [`LayoutTable`] and a [`TokenNormalizer`].
#[derive(Clone)]
pub struct RowClassifier {
    table: LayoutTable,
    normalizer: Arc<dyn TokenNormalizer>,
    education_keywords: Vec<String>,
}

impl Default for RowClassifier {
    fn default() -> Self {
        Self::new(LayoutTable::default())
    }
}

impl std::fmt::Debug for RowClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowClassifier")
            .field("table", &self.table)
            .field("education_keywords", &self.education_keywords)
            .finish_non_exhaustive()
    }
}

impl RowClassifier {
    pub fn new(table: LayoutTable) -> Self {
        Self {
            table,
            normalizer: Arc::new(HalfSplit),
            education_keywords: ["university", "college", "ba"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: impl TokenNormalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    /// Lowercase whole words that mark an education row as an institution.
    pub fn with_education_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.education_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .collect();
        self
    }

    pub fn experiences(&self, rows: &[Vec<String>], today: NaiveDate) -> Vec<Experience> {
        experience::classify(self.classified(Section::Experience, rows), today)
    }

    pub fn education(&self, rows: &[Vec<String>]) -> Vec<String> {
        education::classify(
            self.classified(Section::Education, rows),
            &self.education_keywords,
        )
    }

    pub fn certifications(&self, rows: &[Vec<String>]) -> Vec<Certification> {
        certification::classify(self.classified(Section::Certifications, rows))
    }

    pub fn skills(&self, rows: &[Vec<String>]) -> Vec<Skill> {
        skills::classify(self.classified(Section::Skills, rows))
    }

    fn classified<'r>(
        &'r self,
        section: Section,
        rows: &'r [Vec<String>],
    ) -> impl Iterator<Item = ClassifiedRow<'r>> + 'r {
        rows.iter().filter_map(move |tokens| {
            let start = start_identifier(tokens)?;
            let Some(role) = self.table.role(section, start) else {
                tracing::trace!(section = %section, start, "Ignoring row with unknown start identifier");
                return None;
            };
            Some(ClassifiedRow {
                role,
                tokens,
                start,
                normalizer: self.normalizer.as_ref(),
            })
        })
    }
}

/// Build a row with `blanks` leading blank tokens followed by `tokens`.
#[cfg(test)]
pub(crate) fn padded_row(blanks: usize, tokens: &[&str]) -> Vec<String> {
    std::iter::repeat_n(String::new(), blanks)
        .chain(tokens.iter().map(|t| t.to_string()))
        .collect()
}

/// `text` rendered twice, the way the site flattens a label.
#[cfg(test)]
pub(crate) fn doubled(text: &str) -> String {
    format!("{text}{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_identifier_counts_leading_blanks() {
        assert_eq!(start_identifier(&["", " ", "\t", "Acme"]), Some(3));
        assert_eq!(start_identifier(&["Acme", "", "x"]), Some(0));
        assert_eq!(start_identifier(&["", "  "]), None);
        assert_eq!(start_identifier::<&str>(&[]), None);
    }

    #[test]
    fn half_split_keeps_first_copy() {
        assert_eq!(HalfSplit.normalize("Acme CorpAcme Corp"), "Acme Corp");
        assert_eq!(HalfSplit.normalize("ÉcoleÉcole"), "École");
        assert_eq!(HalfSplit.normalize("abc"), "a");
        assert_eq!(HalfSplit.normalize(""), "");
        assert_eq!(Verbatim.normalize("abc"), "abc");
    }

    #[test]
    fn unknown_start_identifier_is_ignored() {
        let classifier = RowClassifier::default();
        let rows = vec![padded_row(4, &[&doubled("State University")])];
        assert!(classifier.education(&rows).is_empty());
    }

    #[test]
    fn out_of_range_offsets_are_absent() {
        let classifier = RowClassifier::default();
        let row = padded_row(20, &[&doubled("CKA")]);
        let certs = classifier.certifications(&[row]);
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].company, None);
        assert!(certs[0].skills.is_empty());
    }

    #[test]
    fn verbatim_normalizer_reads_single_copy_labels() {
        let rows = vec![
            padded_row(15, &["Rust", "", "12 endorsements"]),
            padded_row(19, &["State University"]),
        ];

        let verbatim = RowClassifier::default().with_normalizer(Verbatim);
        let skills = verbatim.skills(&rows);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Rust");
        assert_eq!(skills[0].endorsements, Some(12));
        assert_eq!(verbatim.education(&rows), vec!["State University"]);

        // the default half-split would cut the same labels in two
        assert_eq!(RowClassifier::default().skills(&rows)[0].name, "Ru");
    }
}
