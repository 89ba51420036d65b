//! Typed records kept in the scoped store: profile, checklist, community
//! contacts and dismissed notifications.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Record, RecordError};

pub const DEFAULT_ALERT_RADIUS_KM: u32 = 5;
pub const MIN_ALERT_RADIUS_KM: u32 = 1;
pub const MAX_ALERT_RADIUS_KM: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("no item with id {0}")]
    UnknownItem(String),
    #[error("no community member with id {0}")]
    UnknownMember(String),
    #[error("name must not be empty")]
    MissingName,
    #[error("unknown relationship {0:?}")]
    UnknownRelationship(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

// --- profile ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "alertRadius", default = "default_alert_radius")]
    pub alert_radius_km: u32,
}

fn default_alert_radius() -> u32 {
    DEFAULT_ALERT_RADIUS_KM
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            location: String::new(),
            alert_radius_km: DEFAULT_ALERT_RADIUS_KM,
        }
    }
}

impl Record for UserProfile {
    const KEY: &'static str = "userProfile";

    fn validate(&self) -> Result<(), String> {
        if !(MIN_ALERT_RADIUS_KM..=MAX_ALERT_RADIUS_KM).contains(&self.alert_radius_km) {
            return Err(format!(
                "alert radius {} km outside {MIN_ALERT_RADIUS_KM}..={MAX_ALERT_RADIUS_KM}",
                self.alert_radius_km
            ));
        }
        Ok(())
    }
}

impl UserProfile {
    /// The configured location, if the user entered one.
    pub fn location(&self) -> Option<&str> {
        let location = self.location.trim();
        (!location.is_empty()).then_some(location)
    }
}

// --- checklist ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bring,
    Avoid,
    Safety,
    Legal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub category: Category,
    pub priority: Priority,
    pub completed: bool,
    pub description: String,
}

/// Only the completion flag of a stored item is trusted; everything else
/// comes from the built-in item set.
#[derive(Debug, Deserialize)]
struct SavedItem {
    id: String,
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SavedItem>", into = "Vec<ChecklistItem>")]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub high_priority_remaining: usize,
}

const DEFAULT_ITEMS: [(&str, Category, Priority, &str); 16] = [
    ("Water bottle", Category::Bring, Priority::High, "Stay hydrated, especially during long events"),
    ("Face mask", Category::Bring, Priority::High, "Protect your identity and health"),
    ("First aid kit", Category::Bring, Priority::Medium, "Basic supplies for minor injuries"),
    ("Emergency contacts list", Category::Bring, Priority::High, "Written list of important phone numbers"),
    ("Cash for emergencies", Category::Bring, Priority::Medium, "Small bills for transportation or emergencies"),
    ("Comfortable shoes", Category::Bring, Priority::High, "Closed-toe shoes for walking and protection"),
    ("Snacks", Category::Bring, Priority::Low, "Energy bars or non-perishable food"),
    ("Portable phone charger", Category::Bring, Priority::Medium, "Keep your phone charged for communication"),
    ("Avoid wearing identifiable clothing", Category::Avoid, Priority::High, "No logos, unique patterns, or personal identifiers"),
    ("Don't bring valuable items", Category::Avoid, Priority::Medium, "Leave jewelry, expensive electronics at home"),
    ("Avoid bringing large bags", Category::Avoid, Priority::Medium, "May be searched or seen as suspicious"),
    ("Don't share location on social media", Category::Avoid, Priority::High, "Protect your privacy and safety"),
    ("Know your legal rights", Category::Legal, Priority::High, "Understand what to do if approached by police"),
    ("Plan exit routes", Category::Safety, Priority::High, "Know multiple ways to leave the area safely"),
    ("Stay with your group", Category::Safety, Priority::High, "Use the buddy system for safety"),
    ("Keep phone on airplane mode", Category::Safety, Priority::Medium, "Prevent location tracking while keeping emergency access"),
];

impl Default for Checklist {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, (text, category, priority, description))| ChecklistItem {
                id: (idx + 1).to_string(),
                text: (*text).to_string(),
                category: *category,
                priority: *priority,
                completed: false,
                description: (*description).to_string(),
            })
            .collect();
        Self { items }
    }
}

impl From<Vec<SavedItem>> for Checklist {
    fn from(saved: Vec<SavedItem>) -> Self {
        let completed: HashSet<String> = saved
            .into_iter()
            .filter(|item| item.completed)
            .map(|item| item.id)
            .collect();
        let mut checklist = Checklist::default();
        for item in &mut checklist.items {
            item.completed = completed.contains(&item.id);
        }
        checklist
    }
}

impl From<Checklist> for Vec<ChecklistItem> {
    fn from(checklist: Checklist) -> Self {
        checklist.items
    }
}

impl Record for Checklist {
    const KEY: &'static str = "actionPlan";
}

impl Checklist {
    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, RecordsError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| RecordsError::UnknownItem(id.to_string()))?;
        item.completed = !item.completed;
        Ok(item.completed)
    }

    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.completed = false;
        }
    }

    pub fn progress(&self) -> Progress {
        let total = self.items.len();
        let completed = self.items.iter().filter(|item| item.completed).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        let high_priority_remaining = self
            .items
            .iter()
            .filter(|item| item.priority == Priority::High && !item.completed)
            .count();
        Progress {
            completed,
            total,
            percent,
            high_priority_remaining,
        }
    }
}

// --- community ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "Family Member")]
    FamilyMember,
    Friend,
    Partner,
    Colleague,
    Neighbor,
    #[serde(rename = "Team Member")]
    TeamMember,
    Other,
}

impl Relationship {
    pub const ALL: [Relationship; 7] = [
        Relationship::FamilyMember,
        Relationship::Friend,
        Relationship::Partner,
        Relationship::Colleague,
        Relationship::Neighbor,
        Relationship::TeamMember,
        Relationship::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Relationship::FamilyMember => "Family Member",
            Relationship::Friend => "Friend",
            Relationship::Partner => "Partner",
            Relationship::Colleague => "Colleague",
            Relationship::Neighbor => "Neighbor",
            Relationship::TeamMember => "Team Member",
            Relationship::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMember {
    pub id: String,
    pub name: String,
    pub relationship: Relationship,
    pub location: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityList {
    members: Vec<CommunityMember>,
}

impl Record for CommunityList {
    const KEY: &'static str = "communityMembers";

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for member in &self.members {
            if member.name.trim().is_empty() {
                return Err(format!("member {} has an empty name", member.id));
            }
            if !seen.insert(member.id.as_str()) {
                return Err(format!("duplicate member id {}", member.id));
            }
        }
        Ok(())
    }
}

impl CommunityList {
    pub fn members(&self) -> &[CommunityMember] {
        &self.members
    }

    pub fn add(
        &mut self,
        name: &str,
        relationship: &str,
        location: Option<&str>,
    ) -> Result<CommunityMember, RecordsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecordsError::MissingName);
        }
        let relationship = Relationship::parse(relationship)
            .ok_or_else(|| RecordsError::UnknownRelationship(relationship.to_string()))?;
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("Unknown");

        let member = CommunityMember {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            relationship,
            location: location.to_string(),
            added_at: Utc::now(),
        };
        self.members.push(member.clone());
        Ok(member)
    }

    pub fn remove(&mut self, id: &str) -> Result<CommunityMember, RecordsError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| RecordsError::UnknownMember(id.to_string()))?;
        Ok(self.members.remove(idx))
    }
}

// --- notifications ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Alert,
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub priority: Priority,
    pub dismissed: bool,
}

struct FeedEntry {
    title: &'static str,
    message: &'static str,
    kind: NotificationKind,
    offset_hours: i64,
    location: Option<&'static str>,
    priority: Priority,
}

const FEED: [FeedEntry; 5] = [
    FeedEntry {
        title: "Protest Alert",
        message: "Large demonstration planned near City Hall tomorrow at 2 PM. Expected 500+ attendees.",
        kind: NotificationKind::Alert,
        offset_hours: 24,
        location: Some("City Hall, Manhattan"),
        priority: Priority::High,
    },
    FeedEntry {
        title: "Safety Update",
        message: "Police presence increased in downtown area. Plan alternate routes if attending events.",
        kind: NotificationKind::Warning,
        offset_hours: -2,
        location: Some("Downtown District"),
        priority: Priority::Medium,
    },
    FeedEntry {
        title: "Community Alert",
        message: "Weather advisory: Rain expected during evening protests. Bring waterproof gear.",
        kind: NotificationKind::Info,
        offset_hours: -4,
        location: None,
        priority: Priority::Medium,
    },
    FeedEntry {
        title: "Event Update",
        message: "Climate march route changed due to construction. New meeting point: Washington Square Park.",
        kind: NotificationKind::Info,
        offset_hours: -6,
        location: Some("Washington Square Park"),
        priority: Priority::High,
    },
    FeedEntry {
        title: "Safety Reminder",
        message: "Remember to stay hydrated and keep emergency contacts handy during events.",
        kind: NotificationKind::Success,
        offset_hours: -12,
        location: None,
        priority: Priority::Low,
    },
];

pub fn notification_ids() -> Vec<String> {
    (1..=FEED.len()).map(|id| id.to_string()).collect()
}

/// Built-in feed with timestamps relative to `now`, dismissal applied.
pub fn notification_feed(now: DateTime<Utc>, dismissed: &DismissedNotifications) -> Vec<Notification> {
    FEED.iter()
        .enumerate()
        .map(|(idx, entry)| {
            let id = (idx + 1).to_string();
            Notification {
                dismissed: dismissed.contains(&id),
                id,
                title: entry.title.to_string(),
                message: entry.message.to_string(),
                kind: entry.kind,
                timestamp: now + Duration::hours(entry.offset_hours),
                location: entry.location.map(str::to_string),
                priority: entry.priority,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DismissedNotifications {
    ids: Vec<String>,
}

impl Record for DismissedNotifications {
    const KEY: &'static str = "dismissedNotifications";
}

impl DismissedNotifications {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|d| d == id)
    }

    /// Returns false when `id` was already dismissed.
    pub fn dismiss(&mut self, id: &str) -> Result<bool, RecordsError> {
        if !notification_ids().iter().any(|known| known == id) {
            return Err(RecordsError::UnknownItem(id.to_string()));
        }
        if self.contains(id) {
            return Ok(false);
        }
        self.ids.push(id.to_string());
        Ok(true)
    }

    pub fn dismiss_all(&mut self, ids: impl IntoIterator<Item = String>) {
        for id in ids {
            if !self.contains(&id) {
                self.ids.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore, Scoped};

    fn store() -> Scoped<MemoryStore> {
        Scoped::new(MemoryStore::new(), "protestCopilot")
    }

    #[test]
    fn profile_defaults_and_radius_bounds() {
        let profile = UserProfile::default();
        assert_eq!(profile.alert_radius_km, 5);
        assert!(profile.location().is_none());

        let store = store();
        let too_far = UserProfile {
            alert_radius_km: 51,
            ..UserProfile::default()
        };
        assert!(matches!(
            store.save(&too_far),
            Err(RecordError::Invalid { key: "userProfile", .. })
        ));
        let zero = UserProfile {
            alert_radius_km: 0,
            ..UserProfile::default()
        };
        assert!(store.save(&zero).is_err());

        let ok = UserProfile {
            name: "Dewi".into(),
            location: "Jakarta".into(),
            alert_radius_km: 50,
        };
        store.save(&ok).unwrap();
        assert_eq!(store.load::<UserProfile>().unwrap(), ok);
    }

    #[test]
    fn profile_uses_camel_case_radius_key() {
        let json = serde_json::to_value(UserProfile::default()).unwrap();
        assert_eq!(json["alertRadius"], 5);
    }

    #[test]
    fn default_checklist_has_sixteen_items() {
        let checklist = Checklist::default();
        assert_eq!(checklist.items().len(), 16);
        assert_eq!(checklist.items()[0].text, "Water bottle");
        assert_eq!(checklist.items()[12].category, Category::Legal);
        assert_eq!(checklist.items()[15].id, "16");
        let progress = checklist.progress();
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.high_priority_remaining, 9);
    }

    #[test]
    fn toggle_reset_and_progress() {
        let mut checklist = Checklist::default();
        assert!(checklist.toggle("1").unwrap());
        assert!(checklist.toggle("2").unwrap());
        assert!(checklist.toggle("3").unwrap());
        assert!(checklist.toggle("4").unwrap());
        assert!(!checklist.toggle("4").unwrap());
        assert!(matches!(checklist.toggle("99"), Err(RecordsError::UnknownItem(_))));

        let progress = checklist.progress();
        assert_eq!(progress.completed, 3);
        assert_eq!(progress.percent, 19);

        checklist.reset();
        assert_eq!(checklist.progress().completed, 0);
    }

    #[test]
    fn stored_checklist_is_merged_onto_defaults() {
        let saved = r#"[
            {"id":"2","text":"renamed","completed":true},
            {"id":"42","text":"gone","completed":true},
            {"id":"5","completed":false}
        ]"#;
        let backing = MemoryStore::new();
        backing.set("protestCopilot_actionPlan", saved).unwrap();
        let scoped = Scoped::new(backing, "protestCopilot");

        let checklist: Checklist = scoped.load().unwrap();
        assert_eq!(checklist.items().len(), 16);
        assert_eq!(checklist.items()[1].text, "Face mask");
        assert!(checklist.items()[1].completed);
        assert_eq!(checklist.progress().completed, 1);

        let (updated, now_done) = scoped
            .update::<Checklist, _, RecordsError>(|c| c.toggle("7"))
            .unwrap();
        assert!(now_done);
        assert!(updated.items()[6].completed);
        let reloaded = scoped.load::<Checklist>().unwrap();
        assert!(reloaded.items()[1].completed);
        assert!(reloaded.items()[6].completed);
        assert_eq!(reloaded.progress().completed, 2);
    }

    #[test]
    fn community_add_and_remove() {
        let mut list = CommunityList::default();
        let member = list.add("  Sari ", "family member", None).unwrap();
        assert_eq!(member.name, "Sari");
        assert_eq!(member.relationship, Relationship::FamilyMember);
        assert_eq!(member.location, "Unknown");
        assert!(Uuid::parse_str(&member.id).is_ok());

        assert!(matches!(list.add(" ", "Friend", None), Err(RecordsError::MissingName)));
        assert!(matches!(
            list.add("Budi", "Enemy", None),
            Err(RecordsError::UnknownRelationship(_))
        ));

        let removed = list.remove(&member.id).unwrap();
        assert_eq!(removed, member);
        assert!(matches!(list.remove(&member.id), Err(RecordsError::UnknownMember(_))));
    }

    #[test]
    fn relationship_serializes_as_display_label() {
        let json = serde_json::to_string(&Relationship::TeamMember).unwrap();
        assert_eq!(json, r#""Team Member""#);
    }

    #[test]
    fn dismissal_is_idempotent_and_applied_to_feed() {
        let mut dismissed = DismissedNotifications::default();
        assert!(dismissed.dismiss("2").unwrap());
        assert!(!dismissed.dismiss("2").unwrap());
        assert!(matches!(dismissed.dismiss("9"), Err(RecordsError::UnknownItem(_))));

        let now = Utc::now();
        let feed = notification_feed(now, &dismissed);
        assert_eq!(feed.len(), 5);
        assert!(feed[1].dismissed);
        assert!(!feed[0].dismissed);
        assert_eq!(feed[0].timestamp, now + Duration::hours(24));

        dismissed.dismiss_all(notification_ids());
        assert!(notification_feed(now, &dismissed).iter().all(|n| n.dismissed));
        assert_eq!(dismissed.ids.len(), 5);
    }
}
