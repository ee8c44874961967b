use chrono::NaiveDate;

use super::{ClassifiedRow, RowRole};
use crate::dates::{DateSpan, is_duration, parse_date_range};
use crate::models::{Experience, Position};

const CALL_TO_ACTION: [&str; 2] = ["Follow", "Connect"];

pub(super) fn classify<'r>(
    rows: impl Iterator<Item = ClassifiedRow<'r>>,
    today: NaiveDate,
) -> Vec<Experience> {
    let mut done = Vec::new();
    let mut open = Experience::default();

    for row in rows {
        match row.role {
            RowRole::Company { second, dates } => {
                done.push(std::mem::take(&mut open));
                match row.field(second) {
                    Some(duration) if is_duration(&duration) => {
                        open.company_name = Some(row.head());
                        set_span(last_position(&mut open), parse_date_range(&duration, today));
                    }
                    company => {
                        let mut position = Position::titled(row.head());
                        if let Some(line) = row.field(dates) {
                            set_span(&mut position, parse_date_range(&line, today));
                        }
                        open.positions.push(position);
                        open.company_name = company;
                    }
                }
            }
            RowRole::CompanyDuration => {
                done.push(std::mem::take(&mut open));
                let head = row.head();
                let (company, duration) = match head.split_once(" · ") {
                    Some((company, duration)) => (company.trim(), Some(duration)),
                    None => (head.as_str(), None),
                };
                open.company_name = Some(company.to_string());
                if let Some(duration) = duration {
                    set_span(last_position(&mut open), parse_date_range(duration, today));
                }
            }
            RowRole::Title { dates } => {
                let mut position = Position::titled(row.head());
                if let Some(line) = row.field(dates) {
                    set_span(&mut position, parse_date_range(&line, today));
                }
                open.positions.push(position);
            }
            RowRole::Dates => {
                set_span(last_position(&mut open), parse_date_range(&row.head(), today));
            }
            RowRole::Detail => add_detail(last_position(&mut open), row.head()),
            _ => {}
        }
    }
    done.push(open);

    prune(done)
}

fn last_position(experience: &mut Experience) -> &mut Position {
    if experience.positions.is_empty() {
        experience.positions.push(Position::default());
    }
    let last = experience.positions.len() - 1;
    &mut experience.positions[last]
}

fn set_span(position: &mut Position, span: DateSpan) {
    position.start_date = span.start;
    position.end_date = span.end;
}

fn add_detail(position: &mut Position, line: String) {
    if let Some(skills) = line.strip_prefix("Skills:") {
        position.skills = skills
            .split(" · ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        return;
    }

    let detail = line.trim();
    let is_call_to_action = detail
        .split_whitespace()
        .any(|word| CALL_TO_ACTION.contains(&word));
    if detail.is_empty() || is_call_to_action {
        return;
    }
    position.details.push(detail.to_string());
}

/// Drop sentinel employers, then sentinel positions inside the survivors.
fn prune(experiences: Vec<Experience>) -> Vec<Experience> {
    experiences
        .into_iter()
        .filter(|experience| !experience.is_sentinel())
        .map(|mut experience| {
            experience.positions.retain(|p| !p.is_sentinel());
            experience
        })
        .collect()
}
