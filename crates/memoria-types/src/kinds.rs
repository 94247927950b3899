use serde::{Deserialize, Serialize};

/// The five reaction types a visitor can leave on a memorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Candle,
    Flower,
    Heart,
    Pray,
    Dove,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Candle,
        ReactionKind::Flower,
        ReactionKind::Heart,
        ReactionKind::Pray,
        ReactionKind::Dove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Candle => "candle",
            ReactionKind::Flower => "flower",
            ReactionKind::Heart => "heart",
            ReactionKind::Pray => "pray",
            ReactionKind::Dove => "dove",
        }
    }

    pub fn parse(s: &str) -> Option<ReactionKind> {
        match s {
            "candle" => Some(ReactionKind::Candle),
            "flower" => Some(ReactionKind::Flower),
            "heart" => Some(ReactionKind::Heart),
            "pray" => Some(ReactionKind::Pray),
            "dove" => Some(ReactionKind::Dove),
            _ => None,
        }
    }
}

/// Timeline event categories with their display icon and Spanish label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Birth,
    Education,
    Career,
    Family,
    Achievement,
    Travel,
    Hobby,
    General,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 9] = [
        EventType::Birth,
        EventType::Education,
        EventType::Career,
        EventType::Family,
        EventType::Achievement,
        EventType::Travel,
        EventType::Hobby,
        EventType::General,
        EventType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Birth => "birth",
            EventType::Education => "education",
            EventType::Career => "career",
            EventType::Family => "family",
            EventType::Achievement => "achievement",
            EventType::Travel => "travel",
            EventType::Hobby => "hobby",
            EventType::General => "general",
            EventType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<EventType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    pub fn icon(self) -> &'static str {
        match self {
            EventType::Birth => "👶",
            EventType::Education => "🎓",
            EventType::Career => "💼",
            EventType::Family => "💒",
            EventType::Achievement => "🏆",
            EventType::Travel => "✈️",
            EventType::Hobby => "🎨",
            EventType::General => "📌",
            EventType::Other => "✨",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventType::Birth => "Nacimiento",
            EventType::Education => "Educación",
            EventType::Career => "Carrera",
            EventType::Family => "Familia",
            EventType::Achievement => "Logro",
            EventType::Travel => "Viaje",
            EventType::Hobby => "Hobby",
            EventType::General => "General",
            EventType::Other => "Otro",
        }
    }
}
