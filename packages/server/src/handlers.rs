//! HTTP handler functions for the pricing dashboard and its JSON API.

use actix_web::{HttpResponse, http::header, web};
use pricing_map_dataset::stats;
use pricing_map_models::{Criterion, FilterState};
use pricing_map_render::format::optional_criterion_value;
use pricing_map_render::{MapScene, Tab, Table, render_page};
use pricing_map_server_models::{
    ApiCriterion, ApiCriterionStats, ApiHealth, ApiSummaryDisplay, FilterQueryParams, ParamsError,
};

use crate::AppState;

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/dashboard"))
        .finish()
}

/// `GET /dashboard`
///
/// Renders the full HTML page for the requested tab and filters.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<FilterQueryParams>,
) -> HttpResponse {
    let tab = match parse_tab(&params) {
        Ok(tab) => tab,
        Err(e) => return bad_request(&e),
    };
    let filter = match resolve(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&state.dataset, &filter, tab))
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        municipalities: state.dataset.municipalities().len(),
    })
}

/// `GET /api/criteria`
///
/// Lists every criterion in display order with its global bounds.
pub async fn criteria(state: web::Data<AppState>) -> HttpResponse {
    let criteria: Vec<ApiCriterion> = Criterion::all()
        .iter()
        .map(|c| ApiCriterion::new(*c, state.dataset.bounds(*c)))
        .collect();
    HttpResponse::Ok().json(criteria)
}

/// `GET /api/states`
pub async fn states(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.dataset.states())
}

/// `GET /api/view`
///
/// Filtered rows as a styled `GeoJSON` scene with its legend.
pub async fn view(
    state: web::Data<AppState>,
    params: web::Query<FilterQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params) {
        Ok(filter) => HttpResponse::Ok().json(MapScene::build(&state.dataset.filter(&filter))),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/stats`
///
/// Min/mean/max and histogram of the selected criterion.
pub async fn criterion_stats(
    state: web::Data<AppState>,
    params: web::Query<FilterQueryParams>,
) -> HttpResponse {
    let filter = match resolve(&state, &params) {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };
    let summary = stats::criterion_summary(&state.dataset.filter(&filter));
    let criterion = summary.criterion;

    HttpResponse::Ok().json(ApiCriterionStats {
        criterion,
        label: criterion.label().to_string(),
        display: ApiSummaryDisplay {
            min: optional_criterion_value(criterion, summary.summary.min),
            mean: optional_criterion_value(criterion, summary.summary.mean),
            max: optional_criterion_value(criterion, summary.summary.max),
        },
        summary: summary.summary,
        histogram: summary.histogram,
    })
}

/// `GET /api/general`
///
/// Criterion-independent statistics over the filtered rows.
pub async fn general(
    state: web::Data<AppState>,
    params: web::Query<FilterQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params) {
        Ok(filter) => {
            HttpResponse::Ok().json(stats::general_summary(&state.dataset.filter(&filter)))
        }
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/table`
///
/// Filtered rows without geometry, as `{ columns, rows }`.
pub async fn table(
    state: web::Data<AppState>,
    params: web::Query<FilterQueryParams>,
) -> HttpResponse {
    match resolve(&state, &params) {
        Ok(filter) => HttpResponse::Ok().json(Table::build(&state.dataset.filter(&filter))),
        Err(e) => bad_request(&e),
    }
}

fn resolve(state: &AppState, params: &FilterQueryParams) -> Result<FilterState, ParamsError> {
    let dataset = &state.dataset;
    params.filter_state(dataset.states(), |c| dataset.bounds(c))
}

fn parse_tab(params: &FilterQueryParams) -> Result<Tab, ParamsError> {
    match params.tab.as_deref().map(str::trim) {
        None | Some("") => Ok(Tab::default()),
        Some(name) => name.parse().map_err(|_| ParamsError::UnknownTab {
            name: name.to_string(),
        }),
    }
}

fn bad_request(e: &ParamsError) -> HttpResponse {
    log::warn!("Bad request: {e}");
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": e.to_string()
    }))
}
