use std::collections::HashMap;

use crate::sections::Section;

/// What a row means once its section and start identifier are known.
///
/// Offsets are absolute token indices into the row; a second field living on
/// the same row is read from the offset carried by the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    /// Opens a new employer. If the token at `second` is a duration the row
    /// head is the company; otherwise the head is a position title, the
    /// company sits at `second` and the timeline at `dates`.
    Company { second: usize, dates: usize },
    /// Opens a new employer whose head reads `"<company> · <duration>"`.
    CompanyDuration,
    /// Adds a position to the open employer, timeline at `dates`.
    Title { dates: usize },
    /// Timeline of the most recent position.
    Dates,
    /// Description line or `Skills:` line of the most recent position.
    Detail,
    /// Candidate school name.
    Institution,
    SkillName,
    /// `"N endorsements"` label for the most recent skill.
    Endorsement,
    Certification {
        issuer: usize,
        issued: usize,
        skills: usize,
        credential: usize,
    },
}

/// `(section, start identifier) → role` lookup.
///
/// The defaults are inspection-derived constants for the target site's
/// current markup. They drift whenever the site's layout changes, so the
/// table is plain data that callers can override.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    roles: HashMap<(Section, usize), RowRole>,
}

impl LayoutTable {
    /// A table with no roles; every row is ignored.
    pub fn empty() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    pub fn with_role(mut self, section: Section, start: usize, role: RowRole) -> Self {
        self.roles.insert((section, start), role);
        self
    }

    pub fn role(&self, section: Section, start: usize) -> Option<RowRole> {
        self.roles.get(&(section, start)).copied()
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::empty()
            .with_role(
                Section::Experience,
                20,
                RowRole::Company {
                    second: 26,
                    dates: 29,
                },
            )
            .with_role(Section::Experience, 16, RowRole::Title { dates: 22 })
            .with_role(Section::Experience, 22, RowRole::Dates)
            .with_role(Section::Experience, 7, RowRole::Detail)
            .with_role(Section::Education, 19, RowRole::Institution)
            .with_role(Section::Skills, 15, RowRole::SkillName)
            .with_role(Section::Skills, 19, RowRole::Endorsement)
            .with_role(
                Section::Certifications,
                20,
                RowRole::Certification {
                    issuer: 26,
                    issued: 29,
                    skills: 74,
                    credential: 32,
                },
            )
    }
}
