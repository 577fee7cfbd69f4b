use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Which site form a submission came from. Each maps to a fixed target sheet
/// and a fixed, ordered list of columns after the date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    Hackathon,
    Member,
    Careers,
}

impl FormType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "hackathon" => Some(FormType::Hackathon),
            "member" => Some(FormType::Member),
            "careers" => Some(FormType::Careers),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Hackathon => "hackathon",
            FormType::Member => "member",
            FormType::Careers => "careers",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            FormType::Hackathon => "Hackathon Form",
            FormType::Member => "Main Form",
            FormType::Careers => "AI Tools Night - Applications",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            FormType::Hackathon => &[
                "fullName",
                "project",
                "linkedin",
                "phone",
                "presenting",
                "tools",
                "favoriteLLM",
            ],
            FormType::Member => &[
                "fullName",
                "email",
                "ageRange",
                "role",
                "school",
                "linkedin",
                "source",
                "notes",
            ],
            FormType::Careers => &[
                "role",
                "full_name",
                "email",
                "tools_used",
                "project_description",
                "working_style",
                "links",
                "location_timezone",
            ],
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body posted by the site forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(rename = "formType")]
    pub form_type: Option<String>,
    /// RFC 3339, set by the browser at submit time
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FormSubmission {
    /// `[date, field...]` in the column order of `form_type`.
    pub fn to_row(&self, form_type: FormType, now: DateTime<Utc>) -> Vec<String> {
        let mut row = Vec::with_capacity(form_type.fields().len() + 1);
        row.push(readable_date(self.timestamp.as_deref(), now));
        row.extend(form_type.fields().iter().map(|field| cell(self.fields.get(*field))));
        row
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.to_owned(),
        Some(other) => other.to_string(),
    }
}

/// `M/D/YYYY` in UTC. Falls back to `now` when the timestamp is absent or unparsable.
pub fn readable_date(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    let date = timestamp
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn submission(value: Value) -> FormSubmission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn readable_date_has_no_padding() {
        assert_eq!(readable_date(Some("2025-03-07T18:30:00.000Z"), now()), "3/7/2025");
        assert_eq!(readable_date(Some("2025-12-31T23:59:59+00:00"), now()), "12/31/2025");
    }

    #[test]
    fn readable_date_falls_back_to_now() {
        assert_eq!(readable_date(None, now()), "10/18/2026");
        assert_eq!(readable_date(Some("yesterday"), now()), "10/18/2026");
    }

    #[test]
    fn hackathon_row_follows_column_order() {
        let sub = submission(json!({
            "formType": "hackathon",
            "timestamp": "2025-03-07T18:30:00.000Z",
            "fullName": "Ada Lovelace",
            "project": "Engine",
            "linkedin": "in/ada",
            "phone": "555",
            "presenting": "yes",
            "tools": "Rust",
            "favoriteLLM": "any"
        }));
        assert_eq!(
            sub.to_row(FormType::Hackathon, now()),
            vec!["3/7/2025", "Ada Lovelace", "Engine", "in/ada", "555", "yes", "Rust", "any"]
        );
    }

    #[test]
    fn missing_fields_become_empty_cells() {
        let sub = submission(json!({ "formType": "member", "email": "a@b.c", "notes": null }));
        let row = sub.to_row(FormType::Member, now());
        assert_eq!(row.len(), 9);
        assert_eq!(row, vec!["10/18/2026", "", "a@b.c", "", "", "", "", "", ""]);
    }

    #[test]
    fn careers_uses_snake_case_fields() {
        let sub = submission(json!({
            "formType": "careers",
            "role": "Video Generation Tools",
            "full_name": "Grace Hopper",
            "tools_used": ["a", "b"],
            "location_timezone": 5
        }));
        let row = sub.to_row(FormType::Careers, now());
        assert_eq!(row[1], "Video Generation Tools");
        assert_eq!(row[2], "Grace Hopper");
        assert_eq!(row[4], r#"["a","b"]"#);
        assert_eq!(row[8], "5");
    }

    #[test]
    fn form_type_round_trips_names() {
        for ft in [FormType::Hackathon, FormType::Member, FormType::Careers] {
            assert_eq!(FormType::parse(ft.as_str()), Some(ft));
        }
        assert_eq!(FormType::parse("newsletter"), None);
        assert_eq!(FormType::Careers.sheet_name(), "AI Tools Night - Applications");
    }
}
