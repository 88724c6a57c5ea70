pub mod models;
pub mod pagination;
pub mod routes;
pub mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use folio_kernel::{settings::Settings, InitCtx, Module};
use serde_json::json;

use upstream::CatalogClient;

/// Books module: paginated search over the upstream catalog.
pub struct BooksModule {
    catalog: Arc<CatalogClient>,
}

impl BooksModule {
    pub fn new(catalog: CatalogClient) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    fn base_path(&self) -> String {
        "/books".to_string()
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            upstream = %self.catalog.base_url(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.catalog))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let page_params = json!([
            {
                "name": "page",
                "in": "query",
                "required": false,
                "description": "Page number, starting from 1",
                "schema": { "type": "integer", "minimum": 1, "default": 1 }
            },
            {
                "name": "results_per_page",
                "in": "query",
                "required": false,
                "description": "Number of results per page (max 40)",
                "schema": { "type": "integer", "minimum": 1, "maximum": 40, "default": 10 }
            }
        ]);

        let responses = json!({
            "200": {
                "description": "One page of catalog records",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookSearchResponse" }
                    }
                }
            },
            "422": {
                "description": "Invalid pagination or query parameters",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            },
            "502": {
                "description": "Catalog unreachable or returned an unreadable body",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            }
        });

        let by_field = |summary: &str, param: &str| {
            let mut parameters = vec![json!({
                "name": param,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })];
            parameters.extend(page_params.as_array().cloned().unwrap_or_default());
            json!({
                "get": {
                    "summary": summary,
                    "tags": ["Books"],
                    "parameters": parameters,
                    "responses": responses
                }
            })
        };

        let mut keyword_params = vec![json!({
            "name": "q",
            "in": "query",
            "required": true,
            "description": "Free-text catalog query",
            "schema": { "type": "string" }
        })];
        keyword_params.extend(page_params.as_array().cloned().unwrap_or_default());

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search books",
                        "tags": ["Books"],
                        "parameters": keyword_params,
                        "responses": responses
                    }
                },
                "/title/{title}": by_field("Search books by title", "title"),
                "/author/{author}": by_field("Search books by author", "author"),
                "/category/{category}": by_field("Search books by subject", "category")
            },
            "components": {
                "schemas": {
                    "PaginationMetadata": {
                        "type": "object",
                        "properties": {
                            "total_items": { "type": "integer" },
                            "current_page": { "type": "integer" },
                            "total_pages": { "type": "integer" },
                            "results_per_page": { "type": "integer" },
                            "has_next_page": { "type": "boolean" },
                            "has_previous_page": { "type": "boolean" }
                        },
                        "required": [
                            "total_items",
                            "current_page",
                            "total_pages",
                            "results_per_page",
                            "has_next_page",
                            "has_previous_page"
                        ]
                    },
                    "BookSearchResponse": {
                        "type": "object",
                        "properties": {
                            "items": {
                                "type": "array",
                                "description": "Catalog records, passed through unmodified",
                                "items": { "type": "object" }
                            },
                            "pagination": { "$ref": "#/components/schemas/PaginationMetadata" }
                        },
                        "required": ["items", "pagination"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module with a catalog client built from `settings`
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    let catalog = CatalogClient::new(&settings.upstream)?;
    Ok(Arc::new(BooksModule::new(catalog)))
}
