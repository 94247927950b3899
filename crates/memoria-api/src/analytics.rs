use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use axum_extra::TypedHeader;
use axum_extra::headers::UserAgent;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use memoria_db::DateRange;
use memoria_db::models::MemorialRow;
use memoria_types::api::{
    DashboardAnalytics, LocationStat, LocationStats, MemorialAnalytics, MemorialReactions,
    ReactionCounts, ReactionCreate, ToggleReactionResponse, VisitStats,
};
use memoria_types::kinds::ReactionKind;

use crate::auth::authenticate;
use crate::chart::{self, Period};
use crate::error::{ApiError, ApiResult, memorial_not_found};
use crate::geo;
use crate::state::{AppState, AppStateInner};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ── Visits ──────────────────────────────────────────────────────────────

/// Public fire-and-forget visit counter. The row is inserted inline;
/// geolocation resolves on a background task so a slow provider never
/// delays the page load. Unknown slugs keep the legacy 200 error body.
pub async fn register_visit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user_agent: Option<TypedHeader<UserAgent>>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let Some(memorial) = state.db.get_memorial_by_slug(&slug)? else {
        return Ok(Json(json!({ "error": "Memorial no encontrado" })));
    };

    let ip = addr.ip().to_string();
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ua = user_agent.map(|TypedHeader(ua)| ua.to_string());

    let visit_id = state
        .db
        .insert_visit(memorial.id, Some(&ip), ua.as_deref(), referrer.as_deref())?;

    let geo_state = state.clone();
    tokio::spawn(async move {
        let location = geo::lookup(&ip).await;
        if location.country.is_some() {
            if let Err(e) = geo_state.db.set_visit_location(
                visit_id,
                location.country.as_deref(),
                location.city.as_deref(),
            ) {
                warn!("Failed to store visit location: {}", e);
            }
        }
    });

    Ok(Json(json!({ "message": "Visita registrada", "memorial_id": memorial.id })))
}

// ── Reactions ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactionsQuery {
    pub visitor_id: Option<String>,
}

/// Current tallies plus the requesting visitor's own active set. Public.
pub async fn get_reactions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ReactionsQuery>,
) -> ApiResult<Json<MemorialReactions>> {
    let Some(memorial) = state.db.get_memorial_by_slug(&slug)? else {
        return Ok(Json(MemorialReactions {
            memorial_id: 0,
            counts: ReactionCounts::default(),
            user_reactions: vec![],
        }));
    };

    let counts = ReactionCounts::from_rows(&state.db.reaction_counts(memorial.id, None)?);
    let user_reactions = match query.visitor_id.as_deref() {
        Some(visitor_id) => state.db.visitor_reactions(memorial.id, visitor_id)?,
        None => vec![],
    };

    Ok(Json(MemorialReactions { memorial_id: memorial.id, counts, user_reactions }))
}

/// Toggle: a visitor's second identical reaction removes the first. The
/// response always carries refreshed tallies so clients never count locally.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<ReactionCreate>,
) -> ApiResult<Json<serde_json::Value>> {
    let Some(memorial) = state.db.get_memorial_by_slug(&slug)? else {
        return Ok(Json(json!({ "error": "Memorial no encontrado" })));
    };
    let Some(kind) = ReactionKind::parse(&req.reaction_type) else {
        return Ok(Json(json!({ "error": "Tipo de reacción no válido" })));
    };
    if req.visitor_id.trim().is_empty() {
        return Err(ApiError::Validation("visitor_id es obligatorio".to_string()));
    }

    let added = state.db.toggle_reaction(memorial.id, kind.as_str(), &req.visitor_id)?;
    let counts = ReactionCounts::from_rows(&state.db.reaction_counts(memorial.id, None)?);
    let user_reactions = state.db.visitor_reactions(memorial.id, &req.visitor_id)?;

    let response = ToggleReactionResponse {
        action: if added { "added" } else { "removed" }.to_string(),
        reaction_type: kind.as_str().to_string(),
        counts,
        user_reactions,
    };
    Ok(Json(serde_json::to_value(response).map_err(anyhow::Error::from)?))
}

// ── Aggregates ──────────────────────────────────────────────────────────

/// Owner dashboard rollup: totals plus per-memorial analytics, optionally
/// scoped by period or custom date range.
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<DashboardAnalytics>> {
    let claims = authenticate(&state, &headers)?;
    let (range, chart_days) = resolve_window(&query)?;

    // One query per memorial per metric adds up; keep it off the runtime.
    let worker_state = state.clone();
    let user_id = claims.sub;
    let analytics = tokio::task::spawn_blocking(move || {
        build_dashboard(&worker_state, user_id, range, chart_days)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))??;

    Ok(Json(analytics))
}

/// Per-memorial analytics, owner only. Unknown slugs and foreign memorials
/// both read as not found.
pub async fn filtered(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<MemorialAnalytics>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(memorial_not_found());
    }

    let (range, chart_days) = resolve_window(&query)?;
    Ok(Json(memorial_analytics(&state, &memorial, range, chart_days)?))
}

/// Country/city breakdown of resolved visits. Owner only.
pub async fn locations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LocationStats>> {
    let claims = authenticate(&state, &headers)?;
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(ApiError::Forbidden(
            "No tienes permiso para ver estas estadísticas".to_string(),
        ));
    }

    let locations = state
        .db
        .location_stats(memorial.id)?
        .into_iter()
        .map(|(country, city, count)| LocationStat { country, city, count })
        .collect();

    Ok(Json(LocationStats { memorial_id: memorial.id, locations }))
}

/// The densified visit series rendered as a standalone SVG line chart.
pub async fn chart_svg(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<impl IntoResponse> {
    let claims = authenticate(&state, &headers)?;
    let memorial = state.db.get_memorial_by_slug(&slug)?.ok_or_else(memorial_not_found)?;
    if memorial.owner_id != claims.sub {
        return Err(memorial_not_found());
    }

    let (range, chart_days) = resolve_window(&query)?;
    let end = range.map(|r| r.end).unwrap_or_else(|| Utc::now().date_naive());
    let sparse = state.db.daily_visit_stats(memorial.id, chart::chart_window(chart_days, end))?;
    let series = chart::densify(&sparse, chart_days, end);

    let svg = chart::render_svg(&series, 640, 180);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

// ── Shared shaping ──────────────────────────────────────────────────────

/// Maps the query's period/date params onto a count-filter range and the
/// charted day count. Defaults to an unfiltered 30-day chart.
fn resolve_window(query: &AnalyticsQuery) -> ApiResult<(Option<DateRange>, i64)> {
    let today = Utc::now().date_naive();

    if let Some(period) = query.period.as_deref() {
        let period = Period::parse(period)
            .ok_or_else(|| ApiError::Validation("Período no válido".to_string()))?;
        return Ok((period.date_range(today), period.days()));
    }

    match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(ApiError::Validation(
                    "La fecha de inicio debe ser anterior a la fecha de fin".to_string(),
                ));
            }
            let range = DateRange { start, end };
            Ok((Some(range), chart::range_days(range)))
        }
        (None, None) => Ok((None, 30)),
        _ => Err(ApiError::Validation(
            "start_date y end_date deben enviarse juntas".to_string(),
        )),
    }
}

fn build_dashboard(
    state: &AppStateInner,
    user_id: i64,
    range: Option<DateRange>,
    chart_days: i64,
) -> ApiResult<DashboardAnalytics> {
    let memorials = state.db.list_memorials_by_owner(user_id)?;
    let ids: Vec<i64> = memorials.iter().map(|m| m.id).collect();

    let total_visits = state.db.total_visits_for(&ids, range)?;
    let total_reactions = state.db.total_reactions_for(&ids, range)?;

    let mut memorials_analytics = Vec::with_capacity(memorials.len());
    for memorial in &memorials {
        memorials_analytics.push(memorial_analytics(state, memorial, range, chart_days)?);
    }

    Ok(DashboardAnalytics {
        total_memorials: memorials.len() as i64,
        total_visits,
        total_reactions,
        memorials_analytics,
    })
}

fn memorial_analytics(
    state: &AppStateInner,
    memorial: &MemorialRow,
    range: Option<DateRange>,
    chart_days: i64,
) -> ApiResult<MemorialAnalytics> {
    let end = range.map(|r| r.end).unwrap_or_else(|| Utc::now().date_naive());
    let sparse = state.db.daily_visit_stats(memorial.id, chart::chart_window(chart_days, end))?;
    let daily_visits = chart::densify(&sparse, chart_days, end);

    let stats = VisitStats {
        total_visits: state.db.visit_count(memorial.id, range)?,
        today_visits: state.db.today_visit_count(memorial.id)?,
        week_visits: state.db.week_visit_count(memorial.id)?,
        month_visits: state.db.month_visit_count(memorial.id)?,
    };
    let reactions_count =
        ReactionCounts::from_rows(&state.db.reaction_counts(memorial.id, range)?);

    Ok(MemorialAnalytics {
        memorial_id: memorial.id,
        memorial_name: memorial.name.clone(),
        memorial_slug: memorial.slug.clone(),
        stats,
        daily_visits,
        reactions_count,
    })
}
