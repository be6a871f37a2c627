//! # Model Store
//!
//! The ordered, index-addressable list of constraint items owned by one session.
//!
//! - Pure CRUD: nothing here solves
//! - Every failed mutation leaves the store unchanged
//! - Insert and delete shift later positions contiguously
//! - Snapshots are copy-on-write (`Arc`), so reads never block or mutate

use crate::expr::{self, Expr, Parsed, Usage};
use crate::primitives::{MAX_ITEM_SOURCE_LENGTH, MAX_MODEL_ITEMS};
use crate::{ItemKind, SolverError, Sort};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// CONSTRAINT ITEM
// =============================================================================

/// Body of a constraint item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemBody {
    /// `name : sort`
    Declaration { name: String, sort: Sort },
    /// A boolean formula.
    Assertion(Expr),
}

/// A validated constraint item: its source text plus the parsed structure.
///
/// Construction validates, so a `ConstraintItem` value is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintItem {
    source: String,
    body: ItemBody,
}

impl ConstraintItem {
    /// Parse and validate an item from its textual form.
    ///
    /// Returns `SolverError::InvalidConstraint` if the text is empty, too long,
    /// syntactically malformed, or ill-sorted.
    pub fn parse(source: &str) -> Result<Self, SolverError> {
        let source = source.trim();
        if source.len() > MAX_ITEM_SOURCE_LENGTH {
            return Err(SolverError::InvalidConstraint(format!(
                "item length {} exceeds maximum {} bytes",
                source.len(),
                MAX_ITEM_SOURCE_LENGTH
            )));
        }

        let body = match expr::parse_item(source)? {
            Parsed::Declaration { name, sort } => Self::declaration_body(&name, &sort)?,
            Parsed::Assertion(expr) => Self::assertion_body(expr)?,
        };

        Ok(Self {
            source: source.to_string(),
            body,
        })
    }

    /// Build a declaration item from its parts.
    pub fn declaration(name: &str, sort: Sort) -> Result<Self, SolverError> {
        let body = Self::declaration_body(name, &sort.to_string())?;
        Ok(Self {
            source: format!("{name}: {sort}"),
            body,
        })
    }

    /// Build an assertion item from a structured expression.
    pub fn assertion(expr: Expr) -> Result<Self, SolverError> {
        let source = expr.to_string();
        let body = Self::assertion_body(expr)?;
        Ok(Self { source, body })
    }

    fn declaration_body(name: &str, sort: &str) -> Result<ItemBody, SolverError> {
        if !expr::is_identifier(name) {
            return Err(SolverError::InvalidConstraint(format!(
                "'{name}' is not a valid variable name"
            )));
        }
        let sort = Sort::parse(sort).ok_or_else(|| {
            SolverError::InvalidConstraint(format!(
                "unknown sort '{sort}' (expected int, real or bool)"
            ))
        })?;
        Ok(ItemBody::Declaration {
            name: name.to_string(),
            sort,
        })
    }

    fn assertion_body(expr: Expr) -> Result<ItemBody, SolverError> {
        let mut usage = BTreeMap::new();
        expr.collect_usage(Usage::Boolean, &mut usage)?;
        Ok(ItemBody::Assertion(expr))
    }

    /// The source text (trimmed).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed body.
    #[must_use]
    pub fn body(&self) -> &ItemBody {
        &self.body
    }

    /// Declaration or assertion.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self.body {
            ItemBody::Declaration { .. } => ItemKind::Declaration,
            ItemBody::Assertion(_) => ItemKind::Assertion,
        }
    }

    /// The declared variable name, for declarations.
    #[must_use]
    pub fn declared_name(&self) -> Option<&str> {
        match &self.body {
            ItemBody::Declaration { name, .. } => Some(name),
            ItemBody::Assertion(_) => None,
        }
    }

    /// The declared sort, for declarations.
    #[must_use]
    pub fn declared_sort(&self) -> Option<Sort> {
        match &self.body {
            ItemBody::Declaration { sort, .. } => Some(*sort),
            ItemBody::Assertion(_) => None,
        }
    }

    /// The formula, for assertions.
    #[must_use]
    pub fn formula(&self) -> Option<&Expr> {
        match &self.body {
            ItemBody::Assertion(expr) => Some(expr),
            ItemBody::Declaration { .. } => None,
        }
    }
}

// =============================================================================
// ITEM SPEC (wire input)
// =============================================================================

/// Item as supplied by a tool caller: plain text or a structured object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSpec {
    /// `"x: int"` or `"x >= 10"`.
    Text(String),
    /// `{"kind": "declaration", ...}` or `{"kind": "assertion", ...}`.
    Structured(StructuredItem),
}

/// Structured item input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StructuredItem {
    Declaration { name: String, sort: String },
    Assertion { expr: String },
}

impl ItemSpec {
    /// Parse and validate into a `ConstraintItem`.
    pub fn into_item(self) -> Result<ConstraintItem, SolverError> {
        match self {
            Self::Text(text) => ConstraintItem::parse(&text),
            Self::Structured(StructuredItem::Declaration { name, sort }) => {
                let body = ConstraintItem::declaration_body(name.trim(), &sort)?;
                let source = format!("{}: {}", name.trim(), sort.trim().to_ascii_lowercase());
                Ok(ConstraintItem { source, body })
            }
            Self::Structured(StructuredItem::Assertion { expr }) => {
                let item = ConstraintItem::parse(&expr)?;
                if item.kind() != ItemKind::Assertion {
                    return Err(SolverError::InvalidConstraint(
                        "assertion expected but the text is a declaration".to_string(),
                    ));
                }
                Ok(item)
            }
        }
    }
}

impl From<&str> for ItemSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Read-only view of an item at a position, as returned by `get_model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub index: usize,
    pub kind: ItemKind,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    pub source: String,
}

impl ItemView {
    fn new(index: usize, item: &ConstraintItem) -> Self {
        Self {
            index,
            kind: item.kind(),
            name: item.declared_name().map(str::to_string),
            sort: item.declared_sort(),
            source: item.source.clone(),
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Immutable view of a model at one revision.
#[derive(Debug, Clone, Default)]
pub struct ModelSnapshot {
    items: Arc<Vec<ConstraintItem>>,
    revision: u64,
}

impl ModelSnapshot {
    /// Wrap `items` as a snapshot at revision 0, detached from any store.
    #[must_use]
    pub fn from_items(items: Vec<ConstraintItem>) -> Self {
        Self {
            items: Arc::new(items),
            revision: 0,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ConstraintItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ConstraintItem> {
        self.items.get(index)
    }

    /// The store revision this snapshot was taken at.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Position-tagged views of every item.
    #[must_use]
    pub fn views(&self) -> Vec<ItemView> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| ItemView::new(i, item))
            .collect()
    }

    /// Indexed assertions, in model order.
    pub fn assertions(&self) -> impl Iterator<Item = (usize, &Expr)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.formula().map(|f| (i, f)))
    }

    /// The sort of every variable in the model.
    ///
    /// Declared variables keep their sort. Undeclared ones are inferred from
    /// use: `real` when used as a number, `bool` when used as a formula.
    pub fn signature(&self) -> Result<BTreeMap<String, Sort>, SolverError> {
        let mut sorts: BTreeMap<String, Sort> = BTreeMap::new();
        for (index, item) in self.items.iter().enumerate() {
            if let ItemBody::Declaration { name, sort } = &item.body {
                match sorts.get(name) {
                    Some(prev) if prev != sort => {
                        return Err(SolverError::InvalidConstraint(format!(
                            "item {index}: '{name}' redeclared as {sort} (was {prev})"
                        )));
                    }
                    _ => {
                        sorts.insert(name.clone(), *sort);
                    }
                }
            }
        }

        let mut inferred: BTreeMap<String, Usage> = BTreeMap::new();
        for (index, formula) in self.assertions() {
            let mut usage = BTreeMap::new();
            formula.collect_usage(Usage::Boolean, &mut usage)?;
            for (name, used) in usage {
                if let Some(sort) = sorts.get(&name) {
                    let compatible = match used {
                        Usage::Numeric => sort.is_numeric(),
                        Usage::Boolean => *sort == Sort::Bool,
                    };
                    if !compatible {
                        return Err(SolverError::InvalidConstraint(format!(
                            "item {index}: '{name}' is declared {sort} but used as {}",
                            if used == Usage::Numeric { "a number" } else { "a formula" }
                        )));
                    }
                    continue;
                }
                match inferred.get(&name) {
                    Some(prev) if *prev != used => {
                        return Err(SolverError::InvalidConstraint(format!(
                            "item {index}: '{name}' is used both as a number and as a formula"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        inferred.insert(name, used);
                    }
                }
            }
        }

        for (name, used) in inferred {
            let sort = match used {
                Usage::Numeric => Sort::Real,
                Usage::Boolean => Sort::Bool,
            };
            sorts.insert(name, sort);
        }
        Ok(sorts)
    }
}

impl PartialEq for ModelSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

// =============================================================================
// MODEL STORE
// =============================================================================

/// Outcome of `add_item`: the resulting item count and the assigned index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub count: usize,
    pub index: usize,
}

/// The ordered model of one session.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    items: Arc<Vec<ConstraintItem>>,
    revision: u64,
}

impl ModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Mutation counter; bumped by every successful mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Reset to an empty model. Idempotent.
    pub fn clear_model(&mut self) {
        if !self.items.is_empty() {
            self.items = Arc::new(Vec::new());
            self.revision = self.revision.saturating_add(1);
        }
    }

    /// Insert `item` at `index` (shifting later items) or append when `index` is `None`.
    pub fn add_item(
        &mut self,
        item: ConstraintItem,
        index: Option<usize>,
    ) -> Result<AddOutcome, SolverError> {
        let len = self.items.len();
        if len >= MAX_MODEL_ITEMS {
            return Err(SolverError::ModelBuild(format!(
                "model already holds the maximum of {MAX_MODEL_ITEMS} items"
            )));
        }
        let index = index.unwrap_or(len);
        if index > len {
            return Err(SolverError::ModelBuild(format!(
                "insert index {index} out of range for model of {len} items"
            )));
        }
        self.check_declaration(&item, None)?;

        Arc::make_mut(&mut self.items).insert(index, item);
        self.revision = self.revision.saturating_add(1);
        Ok(AddOutcome {
            count: self.items.len(),
            index,
        })
    }

    /// Remove the item at `index`, shifting later items back. Returns the new count.
    pub fn delete_item(&mut self, index: usize) -> Result<usize, SolverError> {
        self.check_index(index)?;
        Arc::make_mut(&mut self.items).remove(index);
        self.revision = self.revision.saturating_add(1);
        Ok(self.items.len())
    }

    /// Substitute the item at `index`. No other position changes.
    pub fn replace_item(&mut self, index: usize, item: ConstraintItem) -> Result<usize, SolverError> {
        self.check_index(index)?;
        self.check_declaration(&item, Some(index))?;
        Arc::make_mut(&mut self.items)[index] = item;
        self.revision = self.revision.saturating_add(1);
        Ok(index)
    }

    /// Immutable snapshot of the current items.
    #[must_use]
    pub fn get_model(&self) -> ModelSnapshot {
        ModelSnapshot {
            items: Arc::clone(&self.items),
            revision: self.revision,
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SolverError> {
        let len = self.items.len();
        if index >= len {
            return Err(SolverError::ModelBuild(format!(
                "index {index} out of range for model of {len} items"
            )));
        }
        Ok(())
    }

    /// Reject a declaration that redeclares a name with a different sort.
    /// `skip` is the slot being replaced, which does not count.
    fn check_declaration(
        &self,
        item: &ConstraintItem,
        skip: Option<usize>,
    ) -> Result<(), SolverError> {
        let ItemBody::Declaration { name, sort } = &item.body else {
            return Ok(());
        };
        let clash = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .find_map(|(i, existing)| match &existing.body {
                ItemBody::Declaration { name: n, sort: s } if n == name && s != sort => {
                    Some((i, *s))
                }
                _ => None,
            });
        match clash {
            Some((i, prev)) => Err(SolverError::InvalidConstraint(format!(
                "'{name}' is already declared as {prev} at index {i}"
            ))),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str) -> ConstraintItem {
        ConstraintItem::parse(source).expect("valid item")
    }

    fn sources(store: &ModelStore) -> Vec<String> {
        store
            .get_model()
            .items()
            .iter()
            .map(|i| i.source().to_string())
            .collect()
    }

    #[test]
    fn add_appends_by_default() {
        let mut store = ModelStore::new();
        let first = store.add_item(item("x: int"), None).expect("add");
        let second = store.add_item(item("x >= 10"), None).expect("add");

        assert_eq!(first, AddOutcome { count: 1, index: 0 });
        assert_eq!(second, AddOutcome { count: 2, index: 1 });
        assert_eq!(store.get_model().get(1), Some(&item("x >= 10")));
    }

    #[test]
    fn add_at_index_shifts_later_items() {
        let mut store = ModelStore::new();
        store.add_item(item("a > 1"), None).expect("add");
        store.add_item(item("c > 3"), None).expect("add");
        store.add_item(item("b > 2"), Some(1)).expect("insert");

        assert_eq!(sources(&store), vec!["a > 1", "b > 2", "c > 3"]);
    }

    #[test]
    fn add_rejects_index_past_end() {
        let mut store = ModelStore::new();
        let err = store.add_item(item("a > 1"), Some(1)).expect_err("out of range");
        assert_eq!(err.code(), "model_build_error");
        assert!(store.is_empty());
    }

    #[test]
    fn delete_reindexes_contiguously() {
        let mut store = ModelStore::new();
        for s in ["a > 1", "b > 2", "c > 3"] {
            store.add_item(item(s), None).expect("add");
        }
        let count = store.delete_item(0).expect("delete");

        assert_eq!(count, 2);
        let views = store.get_model().views();
        assert_eq!(views[0].index, 0);
        assert_eq!(views[0].source, "b > 2");
        assert_eq!(views[1].index, 1);
        assert_eq!(views[1].source, "c > 3");
    }

    #[test]
    fn delete_out_of_range_is_model_build_error() {
        let mut store = ModelStore::new();
        let err = store.delete_item(0).expect_err("empty");
        assert_eq!(err.code(), "model_build_error");
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn replace_touches_only_target() {
        let mut store = ModelStore::new();
        for s in ["a > 1", "b > 2", "c > 3"] {
            store.add_item(item(s), None).expect("add");
        }
        store.replace_item(1, item("b < 0")).expect("replace");
        assert_eq!(sources(&store), vec!["a > 1", "b < 0", "c > 3"]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = ModelStore::new();
        store.add_item(item("a > 1"), None).expect("add");
        store.clear_model();
        let revision = store.revision();
        store.clear_model();

        assert!(store.is_empty());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut store = ModelStore::new();
        store.add_item(item("a > 1"), None).expect("add");
        let snapshot = store.get_model();
        store.add_item(item("b > 1"), None).expect("add");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn conflicting_redeclaration_is_rejected() {
        let mut store = ModelStore::new();
        store.add_item(item("x: int"), None).expect("add");
        store.add_item(item("x: int"), None).expect("same sort is fine");
        let err = store.add_item(item("x: bool"), None).expect_err("conflict");
        assert_eq!(err.code(), "invalid_constraint");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replacing_a_declaration_may_change_its_sort() {
        let mut store = ModelStore::new();
        store.add_item(item("x: int"), None).expect("add");
        store.replace_item(0, item("x: real")).expect("replace own slot");
        assert_eq!(store.get_model().get(0).and_then(|i| i.declared_sort()), Some(Sort::Real));
    }

    #[test]
    fn structured_specs_validate() {
        let decl: ItemSpec =
            serde_json::from_str(r#"{"kind":"declaration","name":"n","sort":"INT"}"#)
                .expect("json");
        let decl = decl.into_item().expect("valid");
        assert_eq!(decl.source(), "n: int");
        assert_eq!(decl.declared_sort(), Some(Sort::Int));

        let bad: ItemSpec =
            serde_json::from_str(r#"{"kind":"assertion","expr":"x: int"}"#).expect("json");
        assert!(bad.into_item().is_err());

        let text: ItemSpec = serde_json::from_str(r#""y < 3""#).expect("json");
        assert_eq!(text.into_item().expect("valid").kind(), ItemKind::Assertion);
    }

    #[test]
    fn signature_infers_undeclared_sorts() {
        let snapshot = ModelSnapshot::from_items(vec![
            item("n: int"),
            item("n + r > 2"),
            item("flag or n < 0"),
        ]);
        let sig = snapshot.signature().expect("signature");
        assert_eq!(sig.get("n"), Some(&Sort::Int));
        assert_eq!(sig.get("r"), Some(&Sort::Real));
        assert_eq!(sig.get("flag"), Some(&Sort::Bool));
    }

    #[test]
    fn signature_rejects_cross_item_sort_clash() {
        let snapshot = ModelSnapshot::from_items(vec![item("p"), item("p > 1")]);
        assert!(snapshot.signature().is_err());

        let snapshot = ModelSnapshot::from_items(vec![item("b: bool"), item("b > 1")]);
        assert!(snapshot.signature().is_err());
    }
}
