use super::{ClassifiedRow, RowRole};
use crate::models::Certification;

pub(super) fn classify<'r>(rows: impl Iterator<Item = ClassifiedRow<'r>>) -> Vec<Certification> {
    rows.filter_map(|row| {
        let RowRole::Certification {
            issuer,
            issued,
            skills,
            credential,
        } = row.role
        else {
            return None;
        };

        Some(Certification {
            name: row.head(),
            company: row.field(issuer),
            issue_date: row.field(issued).map(|s| strip_label(&s, "Issued ")),
            skills: row
                .field(skills)
                .map(|s| {
                    strip_label(&s, "Skills: ")
                        .split(" · ")
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            credential_id: row.field(credential).map(|s| strip_label(&s, "Credential ID ")),
        })
    })
    .collect()
}

fn strip_label(text: &str, label: &str) -> String {
    text.strip_prefix(label).unwrap_or(text).trim().to_string()
}
