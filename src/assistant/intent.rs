//! Keyword-based intent classification.
//!
//! A table of independent (keyword set, intent) rules evaluated over the
//! lowercased message by substring membership. Rules are non-exclusive:
//! several intents can fire for one message. No negation or disambiguation
//! is attempted.

use serde::Serialize;

/// A data-fetch intent derived from a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Intent {
    Timetable { day: Option<String> },
    Announcements { category: Option<String> },
    LostFound(LostFoundQuery),
    Profile,
    StudyHelp,
}

/// Refined lost & found query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LostFoundQuery {
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Primary trigger keywords per intent family.
const TIMETABLE_KEYWORDS: &[&str] = &["timetable", "class", "schedule", "missed", "catch up"];

/// Day names refining a timetable intent to a single day.
const DAY_NAMES: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];
const ANNOUNCEMENT_KEYWORDS: &[&str] = &["announcement", "notice", "news", "update"];
const LOSTFOUND_KEYWORDS: &[&str] = &["lost", "found", "missing"];
const PROFILE_KEYWORDS: &[&str] = &["profile", "who am i", "my info"];
const STUDY_KEYWORDS: &[&str] = &["study", "exam", "homework", "assignment"];

/// Secondary keywords refining an announcement intent to a category.
const ANNOUNCEMENT_CATEGORIES: &[(&str, &[&str])] = &[
    ("academic", &["academic", "exam", "lecture", "syllabus"]),
    ("event", &["event", "fest", "workshop", "seminar"]),
    ("urgent", &["urgent", "emergency", "important"]),
];

/// Secondary keywords refining a lost & found intent to an item category.
/// The first matching keyword doubles as the search term.
const LOSTFOUND_CATEGORIES: &[(&str, &[&str])] = &[
    ("electronics", &["phone", "laptop", "charger", "earphones", "calculator"]),
    ("books", &["book", "notes", "notebook"]),
    ("accessories", &["bottle", "bag", "umbrella", "keys", "wallet"]),
    ("documents", &["card", "id ", "certificate"]),
];

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| message.contains(k))
}

/// Derive a day filter from the message: an explicit day name wins,
/// "today" resolves against the clock.
fn derive_day(message: &str, today: &str) -> Option<String> {
    if let Some(day) = DAY_NAMES.iter().find(|d| message.contains(*d)) {
        return Some(day.to_string());
    }
    if message.contains("today") {
        return Some(today.to_string());
    }
    None
}

/// Classify a free-text message into zero or more data-fetch intents.
pub fn classify(message: &str) -> Vec<Intent> {
    let today = chrono::Local::now().format("%A").to_string().to_lowercase();
    classify_with_today(message, &today)
}

fn classify_with_today(message: &str, today: &str) -> Vec<Intent> {
    let message = message.to_lowercase();
    let mut intents = Vec::new();

    if contains_any(&message, TIMETABLE_KEYWORDS) {
        intents.push(Intent::Timetable {
            day: derive_day(&message, today),
        });
    }

    if contains_any(&message, ANNOUNCEMENT_KEYWORDS) {
        let category = ANNOUNCEMENT_CATEGORIES
            .iter()
            .find(|(_, keywords)| contains_any(&message, keywords))
            .map(|(category, _)| category.to_string());
        intents.push(Intent::Announcements { category });
    }

    if contains_any(&message, LOSTFOUND_KEYWORDS) {
        let item_type = if message.contains("found") {
            Some("found".to_string())
        } else if message.contains("lost") || message.contains("missing") {
            Some("lost".to_string())
        } else {
            None
        };

        let mut category = None;
        let mut search = None;
        for (cat, keywords) in LOSTFOUND_CATEGORIES {
            if let Some(hit) = keywords.iter().find(|k| message.contains(*k)) {
                category = Some(cat.to_string());
                search = Some(hit.trim().to_string());
                break;
            }
        }

        intents.push(Intent::LostFound(LostFoundQuery {
            item_type,
            category,
            search,
        }));
    }

    if contains_any(&message, PROFILE_KEYWORDS) {
        intents.push(Intent::Profile);
    }

    if contains_any(&message, STUDY_KEYWORDS) {
        intents.push(Intent::StudyHelp);
    }

    intents
}
