// Turns a raw submission into the fields a helpdesk ticket needs

use crate::directory::{Asset, Directory, Person, PersonKind, ScheduleEntry};
use crate::error::Result;
use crate::submission::{
    APPOINTMENT_NOTES, ASSET_TAG, COMPUTER_STATUS, DAMAGE_INFO, EMAIL, EMAIL_ADDRESS, FORM_USER,
    FormSubmission, INCIDENT_DESCRIPTION, NAME, PROBLEM, PROBLEM_DESCRIPTION, ResponseMap,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

pub const IMAGE_BASE: &str =
    "https://github.com/thinkle-iacs/chromebook-ticket-system/blob/main/icons/";
pub const IMAGE_SUFFIX: &str = "?raw=true";

/// Problem keyword -> card icon, checked in order.
pub const TICKET_IMAGES: &[(&str, &str)] = &[
    ("screen", "screen.png"),
    ("wet", "wet.png"),
    ("won't turn on", "no-on.png"),
    ("printer", "printer.png"),
    ("keys", "keyboard.png"),
    ("log-in", "log-in.png"),
    ("camera and/or microphone", "no-mic.png"),
    ("frame", "frame.png"),
];

pub const PROBLEM_KEYWORDS: &[&str] = &[
    "broken",
    "wet",
    "printer",
    "dead",
    "won't turn on",
    "internet",
    "won't load",
    "charger",
    "program or page isn't working",
    "password",
];

pub const ASSET_LINK_BASE: &str = "https://cb.innovationcharter.org/asset/";

/// Everything known about a submission once the directory has been consulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTicket {
    pub form_id: String,
    pub timestamp: DateTime<Utc>,
    /// The email the ticket is about. An `Email` answer overrides the respondent.
    pub form_email: String,
    pub submitted_by: String,
    pub form_name: Option<String>,
    pub form_asset: Option<String>,
    pub person: Option<Person>,
    pub advisor_emails: Vec<String>,
    pub asset: Option<Asset>,
    pub schedule: Option<ScheduleEntry>,
    pub grade: String,
    pub problem: String,
    pub description: String,
    pub appointment_notes: Option<String>,
    pub priority: u8,
    pub image_url: Option<String>,
    pub edit_url: Option<String>,
}

impl EnrichedTicket {
    pub fn priority_label(&self) -> &'static str {
        priority_label(self.priority)
    }

    /// Name from the directory, when the email matched someone.
    pub fn directory_name(&self) -> Option<&str> {
        self.person
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

/// Lowercased address with any `mailto:` prefix removed.
pub fn fix_email(email: &str) -> String {
    let email = email.trim().to_lowercase();
    email
        .strip_prefix("mailto:")
        .map(|e| e.trim().to_string())
        .unwrap_or(email)
}

/// Primary problem followed by each labelled detail block.
pub fn build_user_description(responses: &ResponseMap) -> String {
    let mut parts = Vec::new();
    if let Some(primary) = responses.joined(PROBLEM, "\n") {
        parts.push(primary);
    }
    for (title, label) in [
        (PROBLEM_DESCRIPTION, "Problem Description"),
        (DAMAGE_INFO, "Damage Info"),
        (INCIDENT_DESCRIPTION, "Incident"),
        (APPOINTMENT_NOTES, "Appointment Notes"),
    ] {
        if let Some(text) = responses.joined(title, "\n") {
            parts.push(format!("{}:\n{}", label, text));
        }
    }
    if let Some(name) = responses.first(NAME) {
        parts.push(format!("Form Name:\n{}", name));
    }
    parts.join("\n\n")
}

/// Priority 1 (minimal) to 5 (urgent) from the computer status answer.
pub fn compute_priority(status: Option<&str>, description: &str) -> u8 {
    let status = status.unwrap_or("").to_lowercase();
    if status.contains("unusable") {
        4
    } else if status.contains("hard") {
        3
    } else if status.contains("usable") {
        2
    } else if description.to_lowercase().contains("wet") {
        5
    } else {
        1
    }
}

pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        1 => "Minimal",
        2 => "Low (Usable)",
        3 => "Medium (Semi-Usable)",
        4 => "High (Unusable)",
        5 => "Urgent",
        _ => "None",
    }
}

/// Short keyword for the problem answer, or the answer itself.
pub fn process_problem(problem: &str) -> String {
    let lower = problem.to_lowercase();
    PROBLEM_KEYWORDS
        .iter()
        .find(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .unwrap_or_else(|| problem.trim().to_string())
}

/// Reason to drop a submission without creating a ticket.
pub fn should_skip_ticket(responses: &ResponseMap) -> Option<String> {
    let status = responses.first(COMPUTER_STATUS).unwrap_or("").to_lowercase();
    if status.contains("all set") {
        return Some("computer status is all set".to_string());
    }
    let problem = responses
        .joined(PROBLEM, " ")
        .unwrap_or_default()
        .to_lowercase();
    if problem.contains("charger") && problem.contains("lost") {
        return Some("lost charger".to_string());
    }
    None
}

/// Icon URL for a problem or description. Exact keyword match wins over a
/// substring match.
pub fn pick_ticket_image(text: &str) -> Option<String> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    TICKET_IMAGES
        .iter()
        .find(|(key, _)| text == *key)
        .or_else(|| TICKET_IMAGES.iter().find(|(key, _)| text.contains(key)))
        .map(|(_, file)| format!("{}{}{}", IMAGE_BASE, file, IMAGE_SUFFIX))
}

pub fn pick_image(problem: &str, description: &str) -> Option<String> {
    pick_ticket_image(problem).or_else(|| pick_ticket_image(description))
}

/// School and grade for a year of graduation, e.g. `HS (12th, '27)`.
/// Grades roll over in July.
pub fn school_label(yog: &str, today: NaiveDate) -> String {
    let Ok(yog) = yog.trim().parse::<i32>() else {
        return String::new();
    };
    let senior_yog = if today.month() >= 7 {
        today.year() + 1
    } else {
        today.year()
    };
    let grade = senior_yog - yog + 12;
    let school = if grade >= 9 {
        "HS"
    } else if (5..=8).contains(&grade) {
        "MS"
    } else {
        "?"
    };
    let yog = yog.to_string();
    format!(
        "{} ({}{}, '{})",
        school,
        grade,
        ordinal_suffix(grade),
        yog.get(2..).unwrap_or("")
    )
}

fn ordinal_suffix(n: i32) -> &'static str {
    match (n.rem_euclid(10), n.rem_euclid(100)) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Inventory link for a single tag; lists of tags are left as typed.
pub fn format_asset_link(tag: &str) -> String {
    let tag = tag.trim();
    if tag.contains(' ') {
        return tag.to_string();
    }
    format!("<a href=\"{}{}\">{}</a>", ASSET_LINK_BASE, tag, tag)
}

/// Look up the respondent, their device and their schedule.
pub fn enrich(
    submission: &FormSubmission,
    directory: &dyn Directory,
    today: NaiveDate,
) -> Result<EnrichedTicket> {
    let responses = submission.response_map();

    let submitted_by = responses.first(FORM_USER).map(fix_email).unwrap_or_default();
    let form_email = responses
        .first(EMAIL)
        .or_else(|| responses.first(EMAIL_ADDRESS))
        .map(fix_email)
        .unwrap_or_default();

    let person = directory.person(&form_email)?;
    let advisor_emails = match person.as_ref().and_then(|p| p.advisor.as_deref()) {
        Some(advisor) => directory.advisor_emails(advisor)?,
        None => Vec::new(),
    };

    // Only students carry a LASID, so staff tickets skip the schedule sheet
    let schedule = match person.as_ref().and_then(|p| p.lasid.as_deref()) {
        Some(lasid) => directory.schedules()?.lookup(lasid).cloned(),
        None => None,
    };

    let form_asset = responses.first(ASSET_TAG).map(String::from);
    let asset = match form_asset.as_deref() {
        Some(tag) => directory.asset(tag)?,
        None => None,
    };

    let grade = person
        .as_ref()
        .filter(|p| p.kind == PersonKind::Student)
        .and_then(|p| p.yog.as_deref())
        .map(|yog| school_label(yog, today))
        .unwrap_or_default();

    let description = build_user_description(&responses);
    let problem = responses.first(PROBLEM).map(process_problem).unwrap_or_default();
    let priority = compute_priority(responses.first(COMPUTER_STATUS), &description);
    let image_url = pick_image(&problem, &description);

    debug!(
        "Enriched {}: person={}, asset={}, priority={}",
        submission.id,
        person.is_some(),
        asset.is_some(),
        priority
    );

    Ok(EnrichedTicket {
        form_id: submission.id.clone(),
        timestamp: submission.timestamp,
        form_email,
        submitted_by,
        form_name: responses.first(NAME).map(String::from),
        form_asset,
        person,
        advisor_emails,
        asset,
        schedule,
        grade,
        problem,
        description,
        appointment_notes: responses.joined(APPOINTMENT_NOTES, "\n"),
        priority,
        image_url,
        edit_url: submission.edit_url.clone(),
    })
}
