//! HTTP routes. Every request recomputes its tables; nothing is cached.

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::page::{render_page, PageContext};
use super::{AppError, AppState};
use crate::dashboard::{self, main_sources, Selection, View, SIDEBAR_SOURCE};
use crate::db::{QueryId, Table};

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub view: Option<String>,
}

/// Serve the dashboard page for the requested view
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, AppError> {
    let selection = Selection::resolve(query.view.as_deref());
    let snapshot = dashboard::load(&state.warehouse, &selection, state.dashboard.fetch_policy).await?;

    let html = render_page(&PageContext {
        title: &state.dashboard.title,
        subtitle: &state.dashboard.subtitle,
        logo: &state.logo,
        selection: &selection,
        snapshot: &snapshot,
    })?;
    Ok(Html(html))
}

/// API: selector options, in display order
pub async fn api_views() -> Json<Vec<&'static str>> {
    Json(View::ALL.into_iter().map(View::label).collect())
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// The requested label, known or not
    pub selection: String,
    pub view: Option<&'static str>,
    pub sidebar: Table,
    pub main: BTreeMap<QueryId, Table>,
}

/// API: the tables behind a view, resolved like the page
pub async fn api_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let selection = Selection::resolve(query.view.as_deref());
    let snapshot = dashboard::load(&state.warehouse, &selection, state.dashboard.fetch_policy).await?;

    let mut main = BTreeMap::new();
    for id in main_sources(&selection.plan()) {
        main.insert(id, snapshot.get(id)?.clone());
    }

    let view = selection.view().map(View::label);
    let selection = match selection {
        Selection::View(view) => view.label().to_string(),
        Selection::Unknown(label) => label,
    };

    Ok(Json(DashboardResponse {
        selection,
        view,
        sidebar: snapshot.get(SIDEBAR_SOURCE)?.clone(),
        main,
    }))
}

/// Liveness check
pub async fn healthz() -> &'static str {
    "ok"
}
