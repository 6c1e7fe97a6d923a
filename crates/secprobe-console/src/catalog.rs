/*
[INPUT]:  Paged case listings and category list from the ExecutionEngine
[OUTPUT]: Immutable CaseCatalog snapshot grouped by category
[POS]:    Composition layer - read-only source for the selection tree
[UPDATE]: When catalog grouping or paging rules change
*/

use std::collections::{BTreeMap, HashMap};

use secprobe_adapter::{Case, CaseId, CaseQuery, Category, CategoryId, ExecutionEngine};
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};

/// Upper bound on pages fetched for one snapshot.
const MAX_CASE_PAGES: u32 = 1_000;

/// One category and the enabled cases it groups.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCategory {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i32,
    pub case_ids: Vec<CaseId>,
}

/// Enabled cases at composition time.
///
/// Categories are ordered by `(sort_order, id)` and hold their case ids in
/// ascending order. Categories without enabled cases are not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseCatalog {
    cases: BTreeMap<CaseId, Case>,
    categories: Vec<CatalogCategory>,
    uncategorized: Vec<CaseId>,
}

impl CaseCatalog {
    /// Build a snapshot from raw listings. Disabled cases are dropped.
    pub fn from_parts(cases: Vec<Case>, categories: Vec<Category>) -> Self {
        let cases: BTreeMap<CaseId, Case> = cases
            .into_iter()
            .filter(|case| case.is_enabled)
            .map(|case| (case.id, case))
            .collect();

        let mut members: HashMap<CategoryId, Vec<CaseId>> = HashMap::new();
        for case in cases.values() {
            members.entry(case.category_id).or_default().push(case.id);
        }

        let mut categories: Vec<Category> = categories;
        categories.sort_by_key(|category| (category.sort_order, category.id));

        let mut grouped = Vec::with_capacity(categories.len());
        for category in categories {
            let Some(case_ids) = members.remove(&category.id) else {
                continue;
            };
            grouped.push(CatalogCategory {
                id: category.id,
                name: category.name,
                sort_order: category.sort_order,
                case_ids,
            });
        }

        let mut uncategorized: Vec<CaseId> = members.into_values().flatten().collect();
        uncategorized.sort_unstable();

        Self {
            cases,
            categories: grouped,
            uncategorized,
        }
    }

    /// Fetch every case page plus the category list.
    pub async fn fetch<E>(engine: &E) -> Result<Self>
    where
        E: ExecutionEngine + ?Sized,
    {
        let categories = engine
            .list_categories()
            .await
            .map_err(ConsoleError::from_engine)?
            .items;

        let mut query = CaseQuery::default();
        let mut cases = Vec::new();
        loop {
            let page = engine
                .list_cases(&query)
                .await
                .map_err(ConsoleError::from_engine)?;
            let received = page.items.len();
            let has_next = page.has_next();
            cases.extend(page.items);
            debug!(page = query.page, received, total = page.total, "catalog page loaded");

            if !has_next || received == 0 {
                break;
            }
            if query.page >= MAX_CASE_PAGES {
                warn!(pages = query.page, "catalog paging limit reached; snapshot truncated");
                break;
            }
            query.page += 1;
        }

        let catalog = Self::from_parts(cases, categories);
        debug!(
            cases = catalog.len(),
            categories = catalog.categories.len(),
            "catalog snapshot ready"
        );
        Ok(catalog)
    }

    pub fn case(&self, case_id: CaseId) -> Option<&Case> {
        self.cases.get(&case_id)
    }

    pub fn contains(&self, case_id: CaseId) -> bool {
        self.cases.contains_key(&case_id)
    }

    pub fn categories(&self) -> &[CatalogCategory] {
        &self.categories
    }

    pub fn category(&self, category_id: CategoryId) -> Option<&CatalogCategory> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    /// Case ids whose category is not in the category list.
    pub fn uncategorized(&self) -> &[CaseId] {
        &self.uncategorized
    }

    /// Ids of every enabled case, ascending.
    pub fn case_ids(&self) -> impl Iterator<Item = CaseId> + '_ {
        self.cases.keys().copied()
    }

    /// Enabled cases of one category; empty for an unknown category.
    pub fn cases_in(&self, category_id: CategoryId) -> impl Iterator<Item = &Case> + '_ {
        self.category(category_id)
            .map(|category| category.case_ids.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|case_id| self.cases.get(case_id))
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
