//! Static fallback datasets and fixed prompts for the assistant.
//!
//! Fallback data keeps the assistant responsive when the REST API is
//! unreachable. The datasets are injected into the context fetcher at
//! startup so tests can swap them.

/// Seed turn for every new conversation.
pub const SYSTEM_PROMPT: &str = "You are the campus assistant for the student portal. \
Answer questions about timetables, announcements, and lost & found items using the \
campus data provided in the conversation. Be concise and friendly. If the data does \
not contain the answer, say so instead of guessing.";

/// Fixed guidance block injected for study-help intents.
pub const STUDY_TIPS: &str = "Study guidance: break work into 25-minute focused sessions, \
review lecture notes within 24 hours, practice past exam questions, and plan assignment \
milestones backwards from the due date.";

/// Sample timetable shown when the timetable fetch fails.
pub const FALLBACK_TIMETABLE: &str = "\
Monday 09:00-10:30 Data Structures (Dr. Rao, Room 204)
Monday 11:00-12:30 Discrete Mathematics (Prof. Iyer, Room 108)
Tuesday 09:00-10:30 Operating Systems (Dr. Shah, Lab 2)
Wednesday 14:00-15:30 Database Systems (Dr. Rao, Room 204)
Friday 10:00-11:30 Computer Networks (Prof. Menon, Room 310)";

/// Sample announcements shown when the announcement fetch fails.
pub const FALLBACK_ANNOUNCEMENTS: &str = "\
[urgent] Library closed this Saturday for maintenance.
[academic] Midterm exams begin on the 15th; timetables on the notice board.
[event] Tech fest registrations close Friday at 5pm.";

/// Sample lost & found items shown when the lost & found fetch fails.
pub const FALLBACK_LOSTFOUND: &str = "\
[lost] Black smartphone near the cafeteria (electronics, active)
[found] Blue water bottle in Lab 2 (accessories, active)
[lost] Scientific calculator in Room 204 (electronics, active)";

/// The injectable fallback bundle.
#[derive(Debug, Clone)]
pub struct FallbackData {
    pub timetable: String,
    pub announcements: String,
    pub lostfound: String,
}

impl Default for FallbackData {
    fn default() -> Self {
        Self {
            timetable: FALLBACK_TIMETABLE.to_string(),
            announcements: FALLBACK_ANNOUNCEMENTS.to_string(),
            lostfound: FALLBACK_LOSTFOUND.to_string(),
        }
    }
}
