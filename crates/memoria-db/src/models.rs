/// Database row types — these map directly to SQLite rows.
/// Distinct from memoria-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub is_active: bool,
    pub created_at: String,
}

pub struct MemorialRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub epitaph: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub image_filename: Option<String>,
    pub owner_id: i64,
    pub created_at: String,
}

pub struct CondolenceRow {
    pub id: i64,
    pub memorial_id: i64,
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_relationship: Option<String>,
    pub message: String,
    pub is_approved: bool,
    pub is_featured: bool,
    pub visitor_id: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
    pub approved_at: Option<String>,
}

pub struct MediaItemRow {
    pub id: i64,
    pub memorial_id: i64,
    pub filename: String,
    pub original_filename: Option<String>,
    pub media_type: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub taken_at: Option<String>,
    pub location: Option<String>,
    pub display_order: i64,
    pub is_featured: bool,
    pub is_cover: bool,
    pub created_at: String,
}

pub struct TimelineEventRow {
    pub id: i64,
    pub memorial_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: String,
    pub event_type: String,
    pub image_filename: Option<String>,
    pub icon: Option<String>,
    pub display_order: i64,
    pub created_at: String,
}
