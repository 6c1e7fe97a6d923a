/*
[INPUT]:  CaseCatalog snapshot and operator selection operations
[OUTPUT]: Selection Set, Expansion Set and run-all mode of one composition
[POS]:    Composition layer - synchronous selection state, owned by one session
[UPDATE]: When adding selection operations or changing run-all semantics
*/

use std::collections::BTreeSet;
use std::sync::Arc;

use secprobe_adapter::{CaseId, CategoryId};

use crate::catalog::CaseCatalog;

/// Tri-state badge of a category in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    None,
    Partial,
    Full,
}

/// Selection tree for one composition session.
///
/// Every method is a single transition; there is no hidden state besides the
/// two sets and the run-all flag. Run-all is kept apart from the Selection
/// Set: selecting every case by hand still produces an explicit id list.
#[derive(Debug, Clone)]
pub struct SelectionTree {
    catalog: Arc<CaseCatalog>,
    selected: BTreeSet<CaseId>,
    expanded: BTreeSet<CategoryId>,
    run_all: bool,
}

impl SelectionTree {
    /// New tree in run-all mode with nothing selected or expanded.
    pub fn new(catalog: Arc<CaseCatalog>) -> Self {
        Self {
            catalog,
            selected: BTreeSet::new(),
            expanded: BTreeSet::new(),
            run_all: true,
        }
    }

    pub fn catalog(&self) -> &CaseCatalog {
        &self.catalog
    }

    pub fn run_all(&self) -> bool {
        self.run_all
    }

    /// Switch run-all mode. Turning it on drops the explicit selection.
    pub fn set_run_all(&mut self, run_all: bool) {
        if run_all {
            self.selected.clear();
        }
        self.run_all = run_all;
    }

    pub fn select_all(&mut self) {
        self.selected = self.catalog.case_ids().collect();
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    /// Flip one case. Returns `false` (and changes nothing) for ids outside the catalog.
    pub fn toggle_case(&mut self, case_id: CaseId) -> bool {
        if !self.catalog.contains(case_id) {
            return false;
        }
        if !self.selected.remove(&case_id) {
            self.selected.insert(case_id);
        }
        true
    }

    /// Add every case of the category, keeping other categories untouched.
    pub fn select_category(&mut self, category_id: CategoryId) {
        if let Some(category) = self.catalog.category(category_id) {
            self.selected.extend(category.case_ids.iter().copied());
        }
    }

    pub fn clear_category(&mut self, category_id: CategoryId) {
        if let Some(category) = self.catalog.category(category_id) {
            for case_id in &category.case_ids {
                self.selected.remove(case_id);
            }
        }
    }

    pub fn selected_count_for(&self, category_id: CategoryId) -> usize {
        self.catalog.category(category_id).map_or(0, |category| {
            category
                .case_ids
                .iter()
                .filter(|case_id| self.selected.contains(case_id))
                .count()
        })
    }

    pub fn category_state(&self, category_id: CategoryId) -> CategoryState {
        let total = self
            .catalog
            .category(category_id)
            .map_or(0, |category| category.case_ids.len());
        match self.selected_count_for(category_id) {
            0 => CategoryState::None,
            count if count == total => CategoryState::Full,
            _ => CategoryState::Partial,
        }
    }

    /// Flip expansion of a category. Returns whether it is now expanded.
    pub fn toggle_expansion(&mut self, category_id: CategoryId) -> bool {
        if self.expanded.remove(&category_id) {
            false
        } else {
            self.expanded.insert(category_id);
            true
        }
    }

    pub fn is_expanded(&self, category_id: CategoryId) -> bool {
        self.expanded.contains(&category_id)
    }

    pub fn is_selected(&self, case_id: CaseId) -> bool {
        self.selected.contains(&case_id)
    }

    pub fn selected(&self) -> &BTreeSet<CaseId> {
        &self.selected
    }

    pub fn expanded(&self) -> &BTreeSet<CategoryId> {
        &self.expanded
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::catalog;

    fn tree() -> SelectionTree {
        SelectionTree::new(Arc::new(catalog()))
    }

    #[test]
    fn test_starts_in_run_all_mode() {
        let tree = tree();
        assert!(tree.run_all());
        assert_eq!(tree.selected_count(), 0);
        assert!(tree.expanded().is_empty());
    }

    #[test]
    fn test_select_category_is_a_union() {
        let mut tree = tree();
        tree.set_run_all(false);
        tree.toggle_case(4);
        tree.select_category(1);
        tree.select_category(1);

        assert_eq!(tree.selected().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(tree.selected_count_for(1), 3);
        assert_eq!(tree.selected_count_for(2), 1);
        assert_eq!(tree.category_state(1), CategoryState::Full);
        assert_eq!(tree.category_state(2), CategoryState::Partial);
    }

    #[test]
    fn test_clear_category_keeps_others() {
        let mut tree = tree();
        tree.select_all();
        tree.clear_category(1);
        assert_eq!(tree.selected().iter().copied().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(tree.category_state(1), CategoryState::None);
    }

    #[test]
    fn test_toggle_unknown_case_is_noop() {
        let mut tree = tree();
        assert!(!tree.toggle_case(6));
        assert!(!tree.toggle_case(404));
        assert_eq!(tree.selected_count(), 0);

        assert!(tree.toggle_case(2));
        assert!(tree.is_selected(2));
        assert!(tree.toggle_case(2));
        assert!(!tree.is_selected(2));
    }

    #[test]
    fn test_select_all_skips_disabled_and_keeps_expansion() {
        let mut tree = tree();
        assert!(tree.toggle_expansion(2));
        tree.select_all();
        assert_eq!(tree.selected_count(), 5);
        assert!(tree.is_expanded(2));

        tree.clear_all();
        assert_eq!(tree.selected_count(), 0);
        assert!(tree.is_expanded(2));
        assert!(!tree.toggle_expansion(2));
    }

    #[test]
    fn test_enabling_run_all_clears_selection() {
        let mut tree = tree();
        tree.set_run_all(false);
        tree.select_category(2);
        tree.set_run_all(true);
        assert!(tree.run_all());
        assert_eq!(tree.selected_count(), 0);
    }

    #[test]
    fn test_unknown_category_counts_zero() {
        let mut tree = tree();
        tree.select_category(99);
        assert_eq!(tree.selected_count_for(99), 0);
        assert_eq!(tree.selected_count(), 0);
    }
}
