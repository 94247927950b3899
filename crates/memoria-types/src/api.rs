use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kinds::ReactionKind;

// -- JWT Claims --

/// JWT claims shared between the token issuer (auth handlers) and the
/// bearer middleware. Canonical definition lives here in memoria-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Form body of `POST /auth/token`. The `username` field carries the email,
/// matching the OAuth2 password-flow convention the clients use.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Memorials --

#[derive(Debug, Deserialize)]
pub struct MemorialCreate {
    pub name: String,
    pub epitaph: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemorialUpdate {
    pub name: Option<String>,
    pub epitaph: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemorialResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub epitaph: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Visitor-facing view of a memorial. No ids, no owner.
#[derive(Debug, Serialize)]
pub struct PublicMemorial {
    pub name: String,
    pub epitaph: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub image_url: Option<String>,
    /// Completed years between birth and death, when both dates are known.
    pub age: Option<i64>,
}

// -- Condolences --

#[derive(Debug, Deserialize)]
pub struct CondolenceCreate {
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_relationship: Option<String>,
    pub message: String,
    pub visitor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CondolenceUpdate {
    pub is_approved: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CondolenceResponse {
    pub id: i64,
    pub memorial_id: i64,
    pub author_name: String,
    pub author_relationship: Option<String>,
    pub message: String,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CondolenceListResponse {
    pub items: Vec<CondolenceResponse>,
    pub total: i64,
    /// Number of unapproved messages. Only populated for the owner view.
    pub pending_count: i64,
}

// -- Gallery --

#[derive(Debug, Deserialize)]
pub struct MediaItemUpdate {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub taken_at: Option<String>,
    pub location: Option<String>,
    pub display_order: Option<i64>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MediaItemResponse {
    pub id: i64,
    pub memorial_id: i64,
    pub url: String,
    pub media_type: String,
    pub mime_type: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub taken_at: Option<String>,
    pub location: Option<String>,
    pub display_order: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub memorial_id: i64,
    pub items: Vec<MediaItemResponse>,
}

// -- Timeline --

#[derive(Debug, Deserialize)]
pub struct TimelineEventCreate {
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD` or just `YYYY`.
    pub event_date: String,
    pub event_type: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineEventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub event_type: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TimelineEventResponse {
    pub id: i64,
    pub memorial_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_type: String,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub memorial_id: i64,
    pub events: Vec<TimelineEventResponse>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
pub struct ReactionCreate {
    pub reaction_type: String,
    pub visitor_id: String,
}

/// Per-type reaction tallies, always reporting all five types.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub candle: i64,
    pub flower: i64,
    pub heart: i64,
    pub pray: i64,
    pub dove: i64,
}

impl ReactionCounts {
    /// Zero-fills the five known types from sparse `(type, count)` rows.
    /// Unknown types are ignored.
    pub fn from_rows<S: AsRef<str>>(rows: &[(S, i64)]) -> Self {
        let mut counts = Self::default();
        for (ty, n) in rows {
            if let Some(kind) = ReactionKind::parse(ty.as_ref()) {
                *counts.slot_mut(kind) = *n;
            }
        }
        counts
    }

    pub fn get(&self, kind: ReactionKind) -> i64 {
        match kind {
            ReactionKind::Candle => self.candle,
            ReactionKind::Flower => self.flower,
            ReactionKind::Heart => self.heart,
            ReactionKind::Pray => self.pray,
            ReactionKind::Dove => self.dove,
        }
    }

    fn slot_mut(&mut self, kind: ReactionKind) -> &mut i64 {
        match kind {
            ReactionKind::Candle => &mut self.candle,
            ReactionKind::Flower => &mut self.flower,
            ReactionKind::Heart => &mut self.heart,
            ReactionKind::Pray => &mut self.pray,
            ReactionKind::Dove => &mut self.dove,
        }
    }

    pub fn total(&self) -> i64 {
        self.candle + self.flower + self.heart + self.pray + self.dove
    }
}

#[derive(Debug, Serialize)]
pub struct MemorialReactions {
    pub memorial_id: i64,
    pub counts: ReactionCounts,
    /// Reaction types the requesting visitor currently holds.
    pub user_reactions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleReactionResponse {
    /// "added" or "removed".
    pub action: String,
    pub reaction_type: String,
    pub counts: ReactionCounts,
    pub user_reactions: Vec<String>,
}

// -- Analytics --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVisitStat {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct VisitStats {
    pub total_visits: i64,
    pub today_visits: i64,
    pub week_visits: i64,
    pub month_visits: i64,
}

#[derive(Debug, Serialize)]
pub struct MemorialAnalytics {
    pub memorial_id: i64,
    pub memorial_name: String,
    pub memorial_slug: String,
    pub stats: VisitStats,
    pub daily_visits: Vec<DailyVisitStat>,
    pub reactions_count: ReactionCounts,
}

#[derive(Debug, Serialize)]
pub struct DashboardAnalytics {
    pub total_memorials: i64,
    pub total_visits: i64,
    pub total_reactions: i64,
    pub memorials_analytics: Vec<MemorialAnalytics>,
}

#[derive(Debug, Serialize)]
pub struct LocationStat {
    pub country: String,
    pub city: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct LocationStats {
    pub memorial_id: i64,
    pub locations: Vec<LocationStat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_counts_zero_fill() {
        let rows = vec![("candle".to_string(), 3), ("dove".to_string(), 1)];
        let counts = ReactionCounts::from_rows(&rows);
        assert_eq!(counts.candle, 3);
        assert_eq!(counts.dove, 1);
        assert_eq!(counts.flower, 0);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn reaction_counts_ignore_unknown_types() {
        let rows = vec![("candle".to_string(), 2), ("wave".to_string(), 9)];
        let counts = ReactionCounts::from_rows(&rows);
        assert_eq!(counts.total(), 2);
    }
}
