use std::sync::LazyLock;

use regex::Regex;

use super::{ClassifiedRow, RowRole};
use crate::models::Skill;

static COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid count regex"));

pub(super) fn classify<'r>(rows: impl Iterator<Item = ClassifiedRow<'r>>) -> Vec<Skill> {
    let mut skills: Vec<Skill> = Vec::new();

    for row in rows {
        match row.role {
            RowRole::SkillName => {
                let endorsements = row.fields().skip(1).find_map(|f| endorsement_count(&f));
                skills.push(Skill {
                    name: row.head(),
                    endorsements,
                });
            }
            RowRole::Endorsement => {
                if let Some(skill) = skills.last_mut()
                    && skill.endorsements.is_none()
                {
                    skill.endorsements = row.fields().find_map(|f| endorsement_count(&f));
                }
            }
            _ => {}
        }
    }
    skills
}

/// First digit run of a label mentioning endorsements.
fn endorsement_count(label: &str) -> Option<u32> {
    if !label.to_lowercase().contains("endorsement") {
        return None;
    }
    COUNT.find(label)?.as_str().parse().ok()
}
