//! Campus data context assembly for the assistant.
//!
//! For each fired intent the fetcher calls the REST API's public mirror
//! endpoint with derived query parameters. Every fetch is best-effort
//! enrichment: on any network or HTTP failure it falls back to the injected
//! static sample dataset and reports `used_fallback` so callers and tests
//! can tell. A fetch failure never fails the chat flow.

use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use tracing::{debug, warn};

use crate::db::{self, Announcement, DbPool, LostFoundItem, TimetableRow};

use super::fallback::{FallbackData, STUDY_TIPS};
use super::intent::{classify, Intent, LostFoundQuery};

/// Result of one best-effort context fetch.
#[derive(Debug, Clone)]
pub struct ContextFetch {
    pub text: String,
    pub used_fallback: bool,
}

/// The assembled context block for one message.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub text: String,
    pub intents: Vec<Intent>,
    pub used_fallback: bool,
}

/// Fetches campus data for assistant context.
#[derive(Clone)]
pub struct ContextFetcher {
    client: Client,
    api_base_url: String,
    fallback: FallbackData,
    db: DbPool,
}

impl ContextFetcher {
    pub fn new(api_base_url: String, fallback: FallbackData, db: DbPool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base_url,
            fallback,
            db,
        }
    }

    /// Classify the message and assemble the full context block.
    ///
    /// The current day/time line is always included, even when no intent
    /// fires.
    pub async fn build_context(&self, user_id: &str, message: &str) -> AssembledContext {
        let intents = classify(message);
        let now = Local::now();
        let mut sections = vec![format!(
            "Current date/time: {}",
            now.format("%A, %Y-%m-%d %H:%M")
        )];
        let mut used_fallback = false;

        for intent in &intents {
            match intent {
                Intent::Timetable { day } => {
                    let fetch = self.fetch_timetable(user_id, day.as_deref()).await;
                    used_fallback |= fetch.used_fallback;
                    sections.push(format!("Timetable:\n{}", fetch.text));
                }
                Intent::Announcements { category } => {
                    let fetch = self.fetch_announcements(category.as_deref()).await;
                    used_fallback |= fetch.used_fallback;
                    sections.push(format!("Announcements:\n{}", fetch.text));
                }
                Intent::LostFound(query) => {
                    let fetch = self.fetch_lostfound(query).await;
                    used_fallback |= fetch.used_fallback;
                    sections.push(format!("Lost & found:\n{}", fetch.text));
                }
                Intent::Profile => {
                    if let Some(profile) = self.fetch_profile(user_id).await {
                        sections.push(format!("Student profile:\n{}", profile));
                    }
                }
                Intent::StudyHelp => {
                    sections.push(STUDY_TIPS.to_string());
                }
            }
        }

        AssembledContext {
            text: sections.join("\n\n"),
            intents,
            used_fallback,
        }
    }

    /// Fetch the user's timetable from the public mirror endpoint.
    pub async fn fetch_timetable(&self, user_id: &str, day: Option<&str>) -> ContextFetch {
        let mut url = format!(
            "{}/api/chatbot/timetables?user_id={}",
            self.api_base_url, user_id
        );
        if let Some(day) = day {
            url.push_str(&format!("&day={}", day));
        }

        match self.get_json::<Vec<TimetableRow>>(&url).await {
            Ok(rows) if rows.is_empty() => ContextFetch {
                text: "No enrolled classes on record.".to_string(),
                used_fallback: false,
            },
            Ok(rows) => ContextFetch {
                text: rows
                    .iter()
                    .map(|r| {
                        format!(
                            "{} {}-{} {} ({})",
                            r.day, r.start_time, r.end_time, r.class_name, r.instructor
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                used_fallback: false,
            },
            Err(e) => {
                warn!(error = %e, "Timetable fetch failed, using fallback data");
                ContextFetch {
                    text: self.fallback.timetable.clone(),
                    used_fallback: true,
                }
            }
        }
    }

    /// Fetch announcements, optionally filtered by category.
    pub async fn fetch_announcements(&self, category: Option<&str>) -> ContextFetch {
        let mut url = format!("{}/api/chatbot/announcements", self.api_base_url);
        if let Some(category) = category {
            url.push_str(&format!("?category={}", category));
        }

        match self.get_json::<Vec<Announcement>>(&url).await {
            Ok(rows) if rows.is_empty() => ContextFetch {
                text: "No announcements at the moment.".to_string(),
                used_fallback: false,
            },
            Ok(rows) => ContextFetch {
                text: rows
                    .iter()
                    .map(|a| format!("[{}] {}: {}", a.category, a.title, a.content))
                    .collect::<Vec<_>>()
                    .join("\n"),
                used_fallback: false,
            },
            Err(e) => {
                warn!(error = %e, "Announcement fetch failed, using fallback data");
                ContextFetch {
                    text: self.fallback.announcements.clone(),
                    used_fallback: true,
                }
            }
        }
    }

    /// Fetch lost & found items with derived filters.
    pub async fn fetch_lostfound(&self, query: &LostFoundQuery) -> ContextFetch {
        let mut params = Vec::new();
        if let Some(item_type) = &query.item_type {
            params.push(format!("type={}", item_type));
        }
        if let Some(category) = &query.category {
            params.push(format!("category={}", category));
        }
        if let Some(search) = &query.search {
            params.push(format!("search={}", search));
        }

        let mut url = format!("{}/api/chatbot/lostfound", self.api_base_url);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        match self.get_json::<Vec<LostFoundItem>>(&url).await {
            Ok(rows) if rows.is_empty() => ContextFetch {
                text: "No matching lost & found reports.".to_string(),
                used_fallback: false,
            },
            Ok(rows) => ContextFetch {
                text: rows
                    .iter()
                    .map(|i| {
                        format!(
                            "[{}] {} at {} ({}, {})",
                            i.item_type, i.title, i.location, i.category, i.status
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
                used_fallback: false,
            },
            Err(e) => {
                warn!(error = %e, "Lost & found fetch failed, using fallback data");
                ContextFetch {
                    text: self.fallback.lostfound.clone(),
                    used_fallback: true,
                }
            }
        }
    }

    /// Read the user's profile straight from the shared store. There is no
    /// public mirror for profiles; a miss simply omits the section.
    async fn fetch_profile(&self, user_id: &str) -> Option<String> {
        match db::get_user(&self.db, user_id).await {
            Ok(user) => Some(format!(
                "Name: {}\nEmail: {}\nStudent ID: {}\nRole: {}",
                user.name, user.email, user.student_id, user.role
            )),
            Err(e) => {
                debug!(error = %e, user_id, "Profile lookup failed, omitting section");
                None
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
