use serde::{Deserialize, Serialize};

use super::schedule::BusinessHours;

/// Sentinel staff name meaning "any staff, to be decided by the shop".
pub const UNASSIGNED_STAFF: &str = "unassigned";

/// Fallback when a reservation references a service no longer in the
/// catalog (e.g. the menu changed after it was booked).
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub duration_minutes: i64,
    pub price: i64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDefinition {
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub notify_address: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl StaffDefinition {
    pub fn is_unassigned(&self) -> bool {
        self.name == UNASSIGNED_STAFF
    }
}

/// Intent and navigation vocabularies, kept as data so a shop can reword
/// them without touching the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTables {
    #[serde(default = "default_reserve_keywords")]
    pub reserve: Vec<String>,
    #[serde(default = "default_modify_keywords")]
    pub modify: Vec<String>,
    #[serde(default = "default_cancel_keywords")]
    pub cancel: Vec<String>,
    /// Matched exactly (after trim/lowercase): aborts any in-progress flow.
    #[serde(default = "default_abort_keywords")]
    pub abort: Vec<String>,
    #[serde(default = "default_affirm_keywords")]
    pub affirm: Vec<String>,
    #[serde(default = "default_deny_keywords")]
    pub deny: Vec<String>,
    #[serde(default = "default_back_service_keywords")]
    pub back_service: Vec<String>,
    #[serde(default = "default_back_staff_keywords")]
    pub back_staff: Vec<String>,
    #[serde(default = "default_back_date_keywords")]
    pub back_date: Vec<String>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            reserve: default_reserve_keywords(),
            modify: default_modify_keywords(),
            cancel: default_cancel_keywords(),
            abort: default_abort_keywords(),
            affirm: default_affirm_keywords(),
            deny: default_deny_keywords(),
            back_service: default_back_service_keywords(),
            back_staff: default_back_staff_keywords(),
            back_date: default_back_date_keywords(),
        }
    }
}

impl KeywordTables {
    pub fn is_abort(&self, message: &str) -> bool {
        let msg = message.trim().to_lowercase();
        self.abort.iter().any(|k| msg == *k)
    }

    pub fn is_affirmative(&self, message: &str) -> bool {
        self.affirm.iter().any(|k| contains_phrase(message, k))
    }

    pub fn is_negative(&self, message: &str) -> bool {
        self.deny.iter().any(|k| contains_phrase(message, k))
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_reserve_keywords() -> Vec<String> {
    words(&["book", "reserve", "new reservation", "make a reservation"])
}

fn default_modify_keywords() -> Vec<String> {
    words(&["reschedule", "modify", "change"])
}

fn default_cancel_keywords() -> Vec<String> {
    words(&["cancel", "call off"])
}

fn default_abort_keywords() -> Vec<String> {
    words(&["cancel", "stop", "quit", "abort", "never mind", "nevermind"])
}

fn default_affirm_keywords() -> Vec<String> {
    words(&["yes", "yep", "confirm", "ok", "okay", "sure", "sounds good"])
}

fn default_deny_keywords() -> Vec<String> {
    words(&["no", "nope", "not yet"])
}

fn default_back_service_keywords() -> Vec<String> {
    words(&["change service", "different service"])
}

fn default_back_staff_keywords() -> Vec<String> {
    words(&["change staff", "different staff"])
}

fn default_back_date_keywords() -> Vec<String> {
    words(&["change date", "different date", "another date"])
}

/// Case-insensitive phrase match on word boundaries, so "book" matches
/// "book me in" but not "booking".
pub fn contains_phrase(message: &str, phrase: &str) -> bool {
    let haystack = message.to_lowercase();
    let needle = phrase.to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

/// Everything a shop configures about itself: the service menu, the staff
/// roster, weekly hours, and the conversation vocabularies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub services: Vec<ServiceDefinition>,
    pub staff: Vec<StaffDefinition>,
    pub hours: BusinessHours,
    #[serde(default)]
    pub keywords: KeywordTables,
}

impl BusinessProfile {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let profile: BusinessProfile = serde_json::from_str(s)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.services.is_empty(), "profile has no services");
        for svc in &self.services {
            anyhow::ensure!(
                svc.duration_minutes > 0,
                "service {} must have a positive duration",
                svc.name
            );
            anyhow::ensure!(svc.price >= 0, "service {} has a negative price", svc.name);
        }
        anyhow::ensure!(
            self.staff.iter().any(|s| s.is_unassigned()),
            "staff roster must include the {UNASSIGNED_STAFF} entry"
        );
        self.hours.validate()
    }

    pub fn find_service(&self, message: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|svc| {
            contains_phrase(message, &svc.name)
                || svc.aliases.iter().any(|a| contains_phrase(message, a))
        })
    }

    pub fn service_named(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn service_duration(&self, name: &str) -> i64 {
        self.service_named(name)
            .map(|s| s.duration_minutes)
            .unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    pub fn find_staff(&self, message: &str) -> Option<&StaffDefinition> {
        self.staff.iter().find(|st| {
            contains_phrase(message, &st.name)
                || st.aliases.iter().any(|a| contains_phrase(message, a))
        })
    }

    pub fn staff_named(&self, name: &str) -> Option<&StaffDefinition> {
        self.staff.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn service_menu(&self) -> String {
        self.services
            .iter()
            .map(|s| format!("- {} ({} min, ${})", s.name, s.duration_minutes, s.price))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn staff_menu(&self) -> String {
        self.staff
            .iter()
            .map(|s| {
                if s.is_unassigned() {
                    "- no preference (we'll assign someone)".to_string()
                } else {
                    let detail = match (&s.specialty, &s.experience) {
                        (Some(sp), Some(ex)) => format!(" ({sp}, {ex})"),
                        (Some(sp), None) => format!(" ({sp})"),
                        (None, Some(ex)) => format!(" ({ex})"),
                        (None, None) => String::new(),
                    };
                    format!("- {}{detail}", s.name)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for BusinessProfile {
    fn default() -> Self {
        let json = include_str!("default_profile.json");
        Self::from_json(json).expect("built-in profile must be valid")
    }
}
