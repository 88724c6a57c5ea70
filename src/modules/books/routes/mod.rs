//! HTTP routes for the Books module.
//!
//! Every search route funnels into [`search`]; they differ only in the
//! [`SearchField`] the term is bound to.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, MethodRouter},
    Json, Router,
};
use folio_http::error::AppError;
use serde::Deserialize;
use serde_json::{json, value::RawValue};

use super::models::{InvalidPageRequest, PageRequest, SearchField, SearchQuery, SearchResponse};
use super::pagination;
use super::upstream::{CatalogClient, CatalogError};

pub type BookPage = SearchResponse<Box<RawValue>>;

type Catalog = Arc<CatalogClient>;

/// Pagination query parameters shared by every search route
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub results_per_page: Option<i64>,
}

/// Query parameters of the free-text search route
#[derive(Debug, Deserialize)]
pub struct KeywordParams {
    pub q: String,
    pub page: Option<i64>,
    pub results_per_page: Option<i64>,
}

/// Build the Books router around a shared catalog client
pub fn router(catalog: Catalog) -> Router {
    Router::new()
        .route("/", get(search_keyword))
        .route("/title/{title}", search_by(SearchField::Title))
        .route("/author/{author}", search_by(SearchField::Author))
        .route("/category/{category}", search_by(SearchField::Subject))
        .with_state(catalog)
}

async fn search_keyword(
    State(catalog): State<Catalog>,
    params: Result<Query<KeywordParams>, QueryRejection>,
) -> Result<Json<BookPage>, AppError> {
    let Query(params) = params.map_err(invalid_query)?;
    let page = page_request(params.page, params.results_per_page)?;
    search(&catalog, SearchQuery::new(SearchField::Any, params.q), page).await
}

/// GET route searching one catalog field, the term taken from the path
fn search_by(field: SearchField) -> MethodRouter<Catalog> {
    get(
        move |catalog: State<Catalog>,
              term: Result<Path<String>, PathRejection>,
              params: Result<Query<PageParams>, QueryRejection>| {
            search_field(field, catalog, term, params)
        },
    )
}

async fn search_field(
    field: SearchField,
    State(catalog): State<Catalog>,
    term: Result<Path<String>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<BookPage>, AppError> {
    let Path(term) = term.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let Query(params) = params.map_err(invalid_query)?;
    let page = page_request(params.page, params.results_per_page)?;
    search(&catalog, SearchQuery::new(field, term), page).await
}

async fn search(
    catalog: &CatalogClient,
    query: SearchQuery,
    page: PageRequest,
) -> Result<Json<BookPage>, AppError> {
    tracing::info!(
        field = ?query.field,
        term = %query.term,
        page = page.page(),
        results_per_page = page.results_per_page(),
        "book search"
    );

    let results = catalog.search(&query, page).await?;
    Ok(Json(pagination::build(results.total_items, page, results.items)))
}

fn page_request(page: Option<i64>, results_per_page: Option<i64>) -> Result<PageRequest, AppError> {
    PageRequest::new(
        page.unwrap_or(i64::from(PageRequest::DEFAULT_PAGE)),
        results_per_page.unwrap_or(i64::from(PageRequest::DEFAULT_RESULTS_PER_PAGE)),
    )
    .map_err(AppError::from)
}

fn invalid_query(rejection: QueryRejection) -> AppError {
    AppError::validation(
        vec![json!({ "field": "query", "error": rejection.body_text() })],
        "invalid query parameters",
    )
}

impl From<InvalidPageRequest> for AppError {
    fn from(err: InvalidPageRequest) -> Self {
        let details = err
            .violations
            .iter()
            .map(|v| json!({ "field": v.field, "error": v.error }))
            .collect();
        AppError::validation(details, err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Status(status) => AppError::upstream(status),
            CatalogError::Timeout(_) => AppError::gateway_timeout(err.to_string()),
            CatalogError::Transport(_) | CatalogError::Decode(_) => {
                AppError::bad_gateway(err.to_string())
            }
        }
    }
}
