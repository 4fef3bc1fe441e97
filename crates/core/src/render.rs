//! Attendance message rendering.
//!
//! Three renderings exist for one set of [`AttendanceFacts`]:
//!
//! - [`render_rich`] selects the provider template id by status and builds
//!   its positional variables (`1` student, `2` batch, `3` date/time).
//! - [`render_text`] produces the long-form body, from the institute's own
//!   template when it has one, with placeholder substitution limited to
//!   [`Placeholder`].
//! - [`render_plain`] produces the short SMS sentence, which always fits in
//!   [`PLAIN_BUDGET`] characters.
//!
//! All three are pure functions of their inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Character budget of a single plain SMS.
pub const PLAIN_BUDGET: usize = 160;

/// Longest student/batch/institute name used verbatim in a plain SMS.
pub const MAX_PLAIN_FIELD_CHARS: usize = 40;

/// Dates are shown in India Standard Time (UTC+05:30).
pub const DISPLAY_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// ---------------------------------------------------------------------------
// Attendance status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            other => Err(CoreError::Validation(format!(
                "Unknown attendance status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Everything needed to describe one student's attendance to a parent.
#[derive(Debug, Clone)]
pub struct AttendanceFacts {
    pub student_name: String,
    pub batch_name: String,
    pub institute_name: String,
    pub status: AttendanceStatus,
    pub date: Timestamp,
}

/// Provider template ids per status, as configured for the rich channel.
#[derive(Debug, Clone, Default)]
pub struct RichTemplateIds {
    pub absent: Option<String>,
    pub late: Option<String>,
    pub present: Option<String>,
}

impl RichTemplateIds {
    pub fn for_status(&self, status: AttendanceStatus) -> Option<&str> {
        match status {
            AttendanceStatus::Absent => self.absent.as_deref(),
            AttendanceStatus::Late => self.late.as_deref(),
            AttendanceStatus::Present => self.present.as_deref(),
        }
    }
}

/// Optional per-institute overrides of the long-form message.
#[derive(Debug, Clone, Default)]
pub struct InstituteTemplates {
    pub absent: Option<String>,
    pub late: Option<String>,
    pub present: Option<String>,
}

impl InstituteTemplates {
    fn for_status(&self, status: AttendanceStatus) -> Option<&str> {
        let template = match status {
            AttendanceStatus::Absent => self.absent.as_deref(),
            AttendanceStatus::Late => self.late.as_deref(),
            AttendanceStatus::Present => self.present.as_deref(),
        };
        template.filter(|t| !t.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Rich rendering
// ---------------------------------------------------------------------------

/// Template selection plus positional variables for the rich channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RichMessage {
    pub template_id: Option<String>,
    pub variables: BTreeMap<String, String>,
}

pub fn render_rich(facts: &AttendanceFacts, ids: &RichTemplateIds) -> RichMessage {
    let mut variables = BTreeMap::new();
    variables.insert("1".to_string(), facts.student_name.clone());
    variables.insert("2".to_string(), facts.batch_name.clone());
    variables.insert(
        "3".to_string(),
        local(facts.date).format("%a, %-d %b %Y, %I:%M %P").to_string(),
    );

    RichMessage {
        template_id: ids.for_status(facts.status).map(str::to_string),
        variables,
    }
}

// ---------------------------------------------------------------------------
// Long-form text
// ---------------------------------------------------------------------------

const DEFAULT_ABSENT_TEMPLATE: &str = "Dear Parent,\n\n\
    This is to inform you that *{student}* was *ABSENT* from *{batch}* on *{date}*.\n\n\
    If this absence was unplanned, please contact the institute.\n\n\
    Regards,\n{institute}";

const DEFAULT_LATE_TEMPLATE: &str = "Dear Parent,\n\n\
    *{student}* arrived *LATE* to *{batch}* on *{date}*.\n\n\
    Please ensure timely attendance for better learning.\n\n\
    Regards,\n{institute}";

const DEFAULT_PRESENT_TEMPLATE: &str = "Dear Parent,\n\n\
    *{student}* has arrived for *{batch}* on *{date}*.\n\n\
    Regards,\n{institute}";

/// The placeholders an institute template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Student,
    Batch,
    Date,
    Institute,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "student" => Some(Placeholder::Student),
            "batch" => Some(Placeholder::Batch),
            "date" => Some(Placeholder::Date),
            "institute" => Some(Placeholder::Institute),
            _ => None,
        }
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone)]
pub struct TemplateValues<'a> {
    pub student: &'a str,
    pub batch: &'a str,
    pub date: &'a str,
    pub institute: &'a str,
}

impl TemplateValues<'_> {
    fn get(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Student => self.student,
            Placeholder::Batch => self.batch,
            Placeholder::Date => self.date,
            Placeholder::Institute => self.institute,
        }
    }
}

/// Replace every `{name}` for a known [`Placeholder`]; anything else is
/// copied through untouched.
pub fn fill_template(template: &str, values: &TemplateValues<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match Placeholder::from_name(name) {
                    Some(p) => out.push_str(values.get(p)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn render_text(facts: &AttendanceFacts, templates: &InstituteTemplates) -> String {
    let template = templates
        .for_status(facts.status)
        .unwrap_or(match facts.status {
            AttendanceStatus::Absent => DEFAULT_ABSENT_TEMPLATE,
            AttendanceStatus::Late => DEFAULT_LATE_TEMPLATE,
            AttendanceStatus::Present => DEFAULT_PRESENT_TEMPLATE,
        });

    let date = local(facts.date).format("%A, %-d %B %Y").to_string();
    fill_template(
        template,
        &TemplateValues {
            student: &facts.student_name,
            batch: &facts.batch_name,
            date: &date,
            institute: &facts.institute_name,
        },
    )
}

// ---------------------------------------------------------------------------
// Plain SMS
// ---------------------------------------------------------------------------

/// Short-form attendance SMS.
///
/// Names are clipped to [`MAX_PLAIN_FIELD_CHARS`]; the fixed text around them
/// is at most 30 characters, so the result never exceeds [`PLAIN_BUDGET`].
pub fn render_plain(facts: &AttendanceFacts) -> String {
    let status_text = match facts.status {
        AttendanceStatus::Absent => "ABSENT from",
        AttendanceStatus::Late => "LATE to",
        AttendanceStatus::Present => "attended",
    };

    format!(
        "{}: {} was {} {} on {}.",
        clip(&facts.institute_name),
        clip(&facts.student_name),
        status_text,
        clip(&facts.batch_name),
        short_date(facts.date),
    )
}

/// `5 Mar` style day-and-month in display time.
pub fn short_date(at: Timestamp) -> String {
    local(at).format("%-d %b").to_string()
}

fn clip(field: &str) -> &str {
    match field.char_indices().nth(MAX_PLAIN_FIELD_CHARS) {
        Some((idx, _)) => &field[..idx],
        None => field,
    }
}

fn local(at: Timestamp) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(DISPLAY_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn facts(status: AttendanceStatus) -> AttendanceFacts {
        AttendanceFacts {
            student_name: "Aarav Sharma".into(),
            batch_name: "JEE Physics A".into(),
            institute_name: "Bright Minds Academy".into(),
            status,
            // 09:30 IST on Wednesday 5 March 2025.
            date: Utc.with_ymd_and_hms(2025, 3, 5, 4, 0, 0).unwrap(),
        }
    }

    fn template_ids() -> RichTemplateIds {
        RichTemplateIds {
            absent: Some("HX-absent".into()),
            late: Some("HX-late".into()),
            present: None,
        }
    }

    #[test]
    fn rich_selects_template_by_status() {
        let ids = template_ids();
        assert_eq!(
            render_rich(&facts(AttendanceStatus::Absent), &ids).template_id.as_deref(),
            Some("HX-absent")
        );
        assert_eq!(
            render_rich(&facts(AttendanceStatus::Late), &ids).template_id.as_deref(),
            Some("HX-late")
        );
        assert_eq!(
            render_rich(&facts(AttendanceStatus::Present), &ids).template_id,
            None
        );
    }

    #[test]
    fn rich_variables_are_positional() {
        let msg = render_rich(&facts(AttendanceStatus::Absent), &template_ids());
        assert_eq!(msg.variables["1"], "Aarav Sharma");
        assert_eq!(msg.variables["2"], "JEE Physics A");
        assert_eq!(msg.variables["3"], "Wed, 5 Mar 2025, 09:30 am");
        assert_eq!(msg.variables.len(), 3);
    }

    #[test]
    fn plain_canonical_messages() {
        assert_eq!(
            render_plain(&facts(AttendanceStatus::Absent)),
            "Bright Minds Academy: Aarav Sharma was ABSENT from JEE Physics A on 5 Mar."
        );
        assert_eq!(
            render_plain(&facts(AttendanceStatus::Late)),
            "Bright Minds Academy: Aarav Sharma was LATE to JEE Physics A on 5 Mar."
        );
        assert_eq!(
            render_plain(&facts(AttendanceStatus::Present)),
            "Bright Minds Academy: Aarav Sharma was attended JEE Physics A on 5 Mar."
        );
    }

    #[test]
    fn plain_never_exceeds_budget() {
        let date = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
        for len in [0, 1, 12, 39, 40, 41, 80, 200] {
            for status in [
                AttendanceStatus::Absent,
                AttendanceStatus::Late,
                AttendanceStatus::Present,
            ] {
                let f = AttendanceFacts {
                    student_name: "s".repeat(len),
                    batch_name: "बैच".repeat(len),
                    institute_name: "I".repeat(len),
                    status,
                    date,
                };
                let text = render_plain(&f);
                assert!(
                    text.chars().count() <= PLAIN_BUDGET,
                    "{} chars for field length {len}",
                    text.chars().count()
                );
            }
        }
    }

    #[test]
    fn plain_at_maximum_field_length_is_exactly_accounted() {
        let f = AttendanceFacts {
            student_name: "s".repeat(MAX_PLAIN_FIELD_CHARS),
            batch_name: "b".repeat(MAX_PLAIN_FIELD_CHARS),
            institute_name: "i".repeat(MAX_PLAIN_FIELD_CHARS),
            status: AttendanceStatus::Absent,
            date: Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap(),
        };
        // 3 * 40 names + ": " + " was " + "ABSENT from" + " " + " on " + "30 Sep" + "."
        assert_eq!(render_plain(&f).chars().count(), 120 + 30);
    }

    #[test]
    fn text_uses_defaults_without_institute_template() {
        let text = render_text(&facts(AttendanceStatus::Absent), &InstituteTemplates::default());
        assert!(text.starts_with("Dear Parent,"));
        assert!(text.contains("*Aarav Sharma* was *ABSENT* from *JEE Physics A*"));
        assert!(text.contains("Wednesday, 5 March 2025"));
        assert!(text.ends_with("Regards,\nBright Minds Academy"));
    }

    #[test]
    fn text_prefers_institute_template() {
        let templates = InstituteTemplates {
            late: Some("{student} late for {batch} ({date}) - {institute}".into()),
            ..Default::default()
        };
        let text = render_text(&facts(AttendanceStatus::Late), &templates);
        assert_eq!(
            text,
            "Aarav Sharma late for JEE Physics A (Wednesday, 5 March 2025) - Bright Minds Academy"
        );
    }

    #[test]
    fn blank_institute_template_falls_back_to_default() {
        let templates = InstituteTemplates {
            present: Some("   ".into()),
            ..Default::default()
        };
        let text = render_text(&facts(AttendanceStatus::Present), &templates);
        assert!(text.contains("has arrived for"));
    }

    #[test]
    fn fill_template_leaves_unknown_placeholders() {
        let values = TemplateValues {
            student: "A",
            batch: "B",
            date: "D",
            institute: "I",
        };
        assert_eq!(
            fill_template("{student}/{student} {fee} {batch", &values),
            "A/A {fee} {batch"
        );
        assert_eq!(fill_template("no placeholders", &values), "no placeholders");
    }

    #[test]
    fn status_round_trips_through_text() {
        for s in ["present", "absent", "late"] {
            assert_eq!(s.parse::<AttendanceStatus>().unwrap().as_str(), s);
        }
        assert!("excused".parse::<AttendanceStatus>().is_err());
    }
}
