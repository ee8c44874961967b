use super::{ClassifiedRow, RowRole};

/// Institution rows whose lowercase words include one of `keywords`.
pub(super) fn classify<'r>(
    rows: impl Iterator<Item = ClassifiedRow<'r>>,
    keywords: &[String],
) -> Vec<String> {
    rows.filter(|row| row.role == RowRole::Institution)
        .map(|row| row.head())
        .filter(|line| {
            line.to_lowercase()
                .split(' ')
                .any(|word| keywords.iter().any(|k| k == word))
        })
        .collect()
}
