/*
[INPUT]:  Case filters and bearer credentials
[OUTPUT]: Case and category listings (read-only catalog source)
[POS]:    HTTP layer - catalog endpoints
[UPDATE]: When adding catalog filters or changing list envelopes
*/

use reqwest::Method;

use crate::http::{EngineClient, Result};
use crate::types::{Case, CaseQuery, CategoryList, Page};

impl EngineClient {
    /// List cases with optional filters
    ///
    /// GET /api/v1/cases?page={page}&page_size={page_size}&category_id=..&risk_level=..&is_enabled=..&keyword=..
    pub async fn list_cases(&self, query: &CaseQuery) -> Result<Page<Case>> {
        self.send_json(Method::GET, "cases", |builder| builder.query(query))
            .await
    }

    /// List all categories ordered by sort order
    ///
    /// GET /api/v1/categories
    pub async fn list_categories(&self) -> Result<CategoryList> {
        self.send_json(Method::GET, "categories", |builder| builder)
            .await
    }
}
