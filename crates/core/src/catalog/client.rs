//! Paged catalog queries.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::client::wire::{ApiEnvelope, XkHttp, LIST_PATH};
use crate::config::ServiceConfig;
use crate::target::ClazzType;

use super::{CatalogError, ClassOffering};

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Default, Deserialize)]
struct ListPage {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    rows: Vec<Value>,
}

/// Lists course offerings for a batch.
pub struct CatalogClient {
    http: XkHttp,
}

impl CatalogClient {
    pub fn new(service: &ServiceConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            http: XkHttp::new(service)?,
        })
    }

    /// Fetch every offering of `category`, following pagination.
    ///
    /// A failed follow-up page is logged and skipped.
    pub async fn list_classes(
        &self,
        auth: &AuthContext,
        campus: &str,
        category: &ClazzType,
    ) -> Result<Vec<ClassOffering>, CatalogError> {
        let first = self.fetch_page(auth, campus, category, 1).await?;
        let total_pages = first.total.div_ceil(PAGE_SIZE);
        info!(
            category = %category,
            total = first.total,
            pages = total_pages,
            "Listing catalog"
        );

        let mut rows = first.rows;
        for page in 2..=total_pages {
            match self.fetch_page(auth, campus, category, page).await {
                Ok(next) => rows.extend(next.rows),
                Err(e) => warn!(page, error = %e, "Skipping catalog page"),
            }
        }

        let offerings = ClassOffering::from_rows(&rows);
        debug!(rows = rows.len(), offerings = offerings.len(), "Catalog flattened");
        Ok(offerings)
    }

    async fn fetch_page(
        &self,
        auth: &AuthContext,
        campus: &str,
        category: &ClazzType,
        page: u64,
    ) -> Result<ListPage, CatalogError> {
        let body = json!({
            "teachingClassType": category.code(),
            "pageNumber": page,
            "pageSize": PAGE_SIZE,
            "orderBy": "",
            "campus": campus,
        });

        let response = self.http.authed_post(LIST_PATH, auth).json(&body).send().await?;
        if response.status().as_u16() == 401 {
            return Err(CatalogError::AuthExpired);
        }
        let text = response.text().await?;

        let envelope: ApiEnvelope<ListPage> = serde_json::from_str(&text)
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;
        match envelope.code {
            200 => Ok(envelope.data.unwrap_or_default()),
            401 => Err(CatalogError::AuthExpired),
            code => Err(CatalogError::Api {
                code,
                message: envelope.message().to_string(),
            }),
        }
    }
}
