// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! The scope/variable namespace of a VCD header.
//!
//! Scopes and variables live in an arena owned by [`ScopeTree`] and are
//! addressed through [`ScopeIdx`] and [`VarIdx`]. A scope owns its children
//! through name keyed maps; the `parent` link is only a handle used to
//! deregister from the parent's map. Freed slots are reused, but every
//! handle carries the generation of its slot, so a stale handle can only
//! ever resolve to nothing.

use std::collections::{HashMap, TryReserveError};

use log::debug;

use super::error::TreeError;
use super::types::{ScopeIdx, ScopeKind, VarIdx, VarType};

/// A (possibly bit selected) reference to a named signal, e.g.
/// `data[7:0]`. A single bit selection has `msb_index == lsb_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub identifier: String,
    pub msb_index: i64,
    pub lsb_index: i64,
}

impl Reference {
    pub fn new(identifier: impl Into<String>, lsb_index: i64, msb_index: i64) -> Reference {
        Reference {
            identifier: identifier.into(),
            msb_index,
            lsb_index,
        }
    }

    pub fn is_single_bit(&self) -> bool {
        self.msb_index == self.lsb_index
    }
}

#[derive(Debug)]
pub struct Scope {
    identifier: String,
    kind: ScopeKind,
    parent: Option<ScopeIdx>,
    child_scopes: HashMap<String, ScopeIdx>,
    child_variables: HashMap<String, VarIdx>,
}

impl Scope {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// `None` for a root scope.
    pub fn parent(&self) -> Option<ScopeIdx> {
        self.parent
    }

    pub fn child_scopes(&self) -> &HashMap<String, ScopeIdx> {
        &self.child_scopes
    }

    /// Child variables keyed by identifier code.
    pub fn child_variables(&self) -> &HashMap<String, VarIdx> {
        &self.child_variables
    }
}

#[derive(Debug)]
pub struct Variable {
    parent: Option<ScopeIdx>,
    var_type: VarType,
    width: u32,
    identifier_code: String,
    reference: Option<Reference>,
}

impl Variable {
    pub fn parent(&self) -> Option<ScopeIdx> {
        self.parent
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn identifier_code(&self) -> &str {
        &self.identifier_code
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with a free list. Removing a value drops it in place and
/// queues its slot for the next insert. The free list is grown on insert,
/// so removal never allocates.
#[derive(Debug)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena {
            slots: vec![],
            free: vec![],
        }
    }
}

impl<T> Arena<T> {
    fn get(&self, slot: usize, generation: u32) -> Option<&T> {
        self.slots
            .get(slot)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_ref())
    }

    fn get_mut(&mut self, slot: usize, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(slot)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_mut())
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Makes room for one more value. Must succeed before `insert`.
    fn reserve(&mut self) -> Result<(), TryReserveError> {
        if self.free.is_empty() {
            self.slots.try_reserve(1)?;
            // every slot, including the new one, may end up on the free list
            self.free.try_reserve(self.slots.len() + 1)?;
        }
        Ok(())
    }

    fn insert(&mut self, value: T) -> (usize, u32) {
        if let Some(slot) = self.free.pop() {
            if let Some(entry) = self.slots.get_mut(slot) {
                entry.value = Some(value);
                return (slot, entry.generation);
            }
        }

        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (self.slots.len() - 1, 0)
    }

    fn remove(&mut self, slot: usize, generation: u32) -> Option<T> {
        let entry = self
            .slots
            .get_mut(slot)
            .filter(|entry| entry.generation == generation)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        Some(value)
    }
}

#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Arena<Scope>,
    variables: Arena<Variable>,
    roots: Vec<ScopeIdx>,
}

impl ScopeTree {
    pub fn new() -> ScopeTree {
        ScopeTree::default()
    }

    pub fn scope(&self, idx: ScopeIdx) -> Option<&Scope> {
        let ScopeIdx(slot, generation) = idx;
        self.scopes.get(slot, generation)
    }

    pub fn variable(&self, idx: VarIdx) -> Option<&Variable> {
        let VarIdx(slot, generation) = idx;
        self.variables.get(slot, generation)
    }

    fn scope_mut(&mut self, idx: ScopeIdx) -> Result<&mut Scope, TreeError> {
        let ScopeIdx(slot, generation) = idx;
        self.scopes
            .get_mut(slot, generation)
            .ok_or(TreeError::UnknownScope(slot))
    }

    /// Parentless scopes in allocation order.
    pub fn roots(&self) -> &[ScopeIdx] {
        &self.roots
    }

    pub fn root_named(&self, identifier: &str) -> Option<ScopeIdx> {
        self.roots
            .iter()
            .copied()
            .find(|idx| self.scope(*idx).map(Scope::identifier) == Some(identifier))
    }

    pub fn child_scope(&self, parent: ScopeIdx, identifier: &str) -> Option<ScopeIdx> {
        self.scope(parent)?.child_scopes.get(identifier).copied()
    }

    pub fn child_variable(&self, parent: ScopeIdx, identifier_code: &str) -> Option<VarIdx> {
        self.scope(parent)?
            .child_variables
            .get(identifier_code)
            .copied()
    }

    /// Identifiers from the root down to `idx`, inclusive.
    pub fn scope_path(&self, idx: ScopeIdx) -> Vec<String> {
        let mut path = vec![];
        let mut curr = self.scope(idx);
        while let Some(scope) = curr {
            path.push(scope.identifier.clone());
            curr = scope.parent.and_then(|parent| self.scope(parent));
        }
        path.reverse();
        path
    }

    /// Number of scopes that have been allocated and not yet freed.
    pub fn live_scopes(&self) -> usize {
        self.scopes.len()
    }

    pub fn live_variables(&self) -> usize {
        self.variables.len()
    }

    /// Creates a scope and registers it under `parent`, or as a root.
    ///
    /// Every check and allocation happens before the tree is touched, so on
    /// failure nothing has been inserted anywhere.
    pub fn allocate_scope(
        &mut self,
        parent: Option<ScopeIdx>,
        identifier: &str,
        kind: ScopeKind,
    ) -> Result<ScopeIdx, TreeError> {
        let alloc_failed = |_| TreeError::AllocFailed(identifier.to_string());

        if let Some(parent_idx) = parent {
            let parent_scope = self.scope_mut(parent_idx)?;
            if parent_scope.child_scopes.contains_key(identifier) {
                return Err(TreeError::DuplicateScope(identifier.to_string()));
            }
            parent_scope.child_scopes.try_reserve(1).map_err(alloc_failed)?;
        } else {
            self.roots.try_reserve(1).map_err(alloc_failed)?;
        }
        self.scopes.reserve().map_err(alloc_failed)?;

        let (slot, generation) = self.scopes.insert(Scope {
            identifier: identifier.to_string(),
            kind,
            parent,
            child_scopes: HashMap::new(),
            child_variables: HashMap::new(),
        });
        let idx = ScopeIdx(slot, generation);

        match parent {
            Some(parent_idx) => {
                self.scope_mut(parent_idx)?
                    .child_scopes
                    .insert(identifier.to_string(), idx);
            }
            None => self.roots.push(idx),
        }
        debug!("allocated scope `{identifier}` as {idx:?} under {parent:?}");

        Ok(idx)
    }

    /// Removes `idx` from its parent and frees it together with every
    /// scope and variable beneath it. Freed slots are handed out again by
    /// later allocations.
    pub fn free_scope(&mut self, idx: ScopeIdx) -> Result<(), TreeError> {
        let (parent, identifier) = {
            let scope = self.scope_mut(idx)?;
            (scope.parent, scope.identifier.clone())
        };

        match parent {
            Some(parent_idx) => {
                if let Ok(parent_scope) = self.scope_mut(parent_idx) {
                    parent_scope.child_scopes.remove(&identifier);
                }
            }
            None => self.roots.retain(|root| *root != idx),
        }

        // depth first, without recursing on the call stack
        let mut pending = vec![idx];
        while let Some(ScopeIdx(slot, generation)) = pending.pop() {
            let Some(scope) = self.scopes.remove(slot, generation) else {
                continue;
            };
            pending.extend(scope.child_scopes.into_values());
            for VarIdx(var_slot, var_generation) in scope.child_variables.into_values() {
                self.variables.remove(var_slot, var_generation);
            }
        }
        debug!("freed scope `{identifier}` ({idx:?})");

        Ok(())
    }

    /// Creates a variable that owns `reference` and registers it under
    /// `parent` keyed by `identifier_code`.
    pub fn allocate_var(
        &mut self,
        parent: Option<ScopeIdx>,
        var_type: VarType,
        width: u32,
        reference: Option<Reference>,
        identifier_code: &str,
    ) -> Result<VarIdx, TreeError> {
        let alloc_failed = |_| TreeError::AllocFailed(identifier_code.to_string());

        if let Some(parent_idx) = parent {
            let parent_scope = self.scope_mut(parent_idx)?;
            if parent_scope.child_variables.contains_key(identifier_code) {
                return Err(TreeError::DuplicateVariable(identifier_code.to_string()));
            }
            parent_scope
                .child_variables
                .try_reserve(1)
                .map_err(alloc_failed)?;
        }
        self.variables.reserve().map_err(alloc_failed)?;

        let (slot, generation) = self.variables.insert(Variable {
            parent,
            var_type,
            width,
            identifier_code: identifier_code.to_string(),
            reference,
        });
        let idx = VarIdx(slot, generation);

        if let Some(parent_idx) = parent {
            self.scope_mut(parent_idx)?
                .child_variables
                .insert(identifier_code.to_string(), idx);
        }

        Ok(idx)
    }

    /// Removes `idx` from its parent and frees it, along with the
    /// reference it owns.
    pub fn free_var(&mut self, idx: VarIdx) -> Result<(), TreeError> {
        let VarIdx(slot, generation) = idx;
        let var = self
            .variables
            .remove(slot, generation)
            .ok_or(TreeError::UnknownVariable(slot))?;

        if let Some(parent_idx) = var.parent {
            if let Ok(parent_scope) = self.scope_mut(parent_idx) {
                parent_scope.child_variables.remove(&var.identifier_code);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reference() {
        let r = Reference::new("testident", 0, 5);
        assert_eq!(r.lsb_index, 0);
        assert_eq!(r.msb_index, 5);
        assert_eq!(r.identifier, "testident");
        assert!(!r.is_single_bit());
        assert!(Reference::new("clk", 3, 3).is_single_bit());
    }

    #[test]
    fn parentless_var() {
        let mut tree = ScopeTree::new();
        let r = Reference::new("testident", 0, 5);
        let v = tree
            .allocate_var(None, VarType::Wire, 8, Some(r.clone()), "abc")
            .unwrap();

        let var = tree.variable(v).unwrap();
        assert_eq!(var.parent(), None);
        assert_eq!(var.var_type(), VarType::Wire);
        assert_eq!(var.width(), 8);
        assert_eq!(var.identifier_code(), "abc");
        assert_eq!(var.reference(), Some(&r));

        tree.free_var(v).unwrap();
        assert!(tree.variable(v).is_none());
        assert_eq!(tree.live_variables(), 0);
    }

    #[test]
    fn var_with_parent() {
        let mut tree = ScopeTree::new();
        let s = tree.allocate_scope(None, "scope0", ScopeKind::Begin).unwrap();
        {
            let scope = tree.scope(s).unwrap();
            assert_eq!(scope.parent(), None);
            assert_eq!(scope.identifier(), "scope0");
            assert_eq!(scope.kind(), ScopeKind::Begin);
        }

        let r = Reference::new("testident", 0, 5);
        let v = tree
            .allocate_var(Some(s), VarType::Wire, 8, Some(r), "abc")
            .unwrap();
        assert_eq!(tree.variable(v).unwrap().parent(), Some(s));
        assert_eq!(tree.child_variable(s, "abc"), Some(v));
        assert_eq!(tree.child_variable(s, "xyz"), None);

        tree.free_var(v).unwrap();
        assert_eq!(tree.child_variable(s, "abc"), None);

        tree.free_scope(s).unwrap();
        assert_eq!(tree.live_scopes(), 0);
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn nested_scopes() {
        let mut tree = ScopeTree::new();
        let root = tree.allocate_scope(None, "root", ScopeKind::Module).unwrap();
        let child1 = tree.allocate_scope(Some(root), "child1", ScopeKind::Module).unwrap();
        let child2 = tree.allocate_scope(Some(root), "child2", ScopeKind::Task).unwrap();
        let v1 = tree
            .allocate_var(Some(child1), VarType::Reg, 1, None, "!")
            .unwrap();
        let v2 = tree
            .allocate_var(Some(child2), VarType::Wire, 4, Some(Reference::new("d", 0, 3)), "\"")
            .unwrap();

        assert_eq!(tree.child_scope(root, "child1"), Some(child1));
        assert_eq!(tree.child_scope(root, "child2"), Some(child2));
        assert_eq!(tree.child_variable(child1, "!"), Some(v1));
        assert_eq!(tree.child_variable(child2, "\""), Some(v2));

        // only reachable from the owning scope
        assert_eq!(tree.child_variable(root, "!"), None);
        assert_eq!(tree.child_variable(child2, "!"), None);
        assert_eq!(tree.child_variable(child1, "\""), None);
        assert_eq!(tree.child_scope(child1, "child2"), None);

        assert_eq!(tree.scope_path(child2), vec!["root", "child2"]);

        tree.free_scope(child2).unwrap();
        assert_eq!(tree.child_scope(root, "child2"), None);
        assert!(tree.scope(child2).is_none());
        assert!(tree.variable(v2).is_none());
        assert_eq!(tree.child_scope(root, "child1"), Some(child1));
        assert_eq!(tree.child_variable(child1, "!"), Some(v1));
        assert_eq!(tree.scope(root).unwrap().child_scopes().len(), 1);
        assert_eq!(tree.live_scopes(), 2);
        assert_eq!(tree.live_variables(), 1);

        tree.free_scope(root).unwrap();
        assert_eq!(tree.live_scopes(), 0);
        assert_eq!(tree.live_variables(), 0);
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn duplicates_leave_tree_untouched() {
        let mut tree = ScopeTree::new();
        let root = tree.allocate_scope(None, "root", ScopeKind::Module).unwrap();
        let child = tree.allocate_scope(Some(root), "child", ScopeKind::Module).unwrap();

        assert_eq!(
            tree.allocate_scope(Some(root), "child", ScopeKind::Fork).unwrap_err(),
            TreeError::DuplicateScope("child".to_string())
        );
        assert_eq!(tree.live_scopes(), 2);
        assert_eq!(tree.child_scope(root, "child"), Some(child));

        tree.allocate_var(Some(root), VarType::Wire, 1, None, "#").unwrap();
        assert_eq!(
            tree.allocate_var(Some(root), VarType::Reg, 1, None, "#").unwrap_err(),
            TreeError::DuplicateVariable("#".to_string())
        );
        assert_eq!(tree.live_variables(), 1);

        // a scope and a variable may share a name
        tree.allocate_var(Some(root), VarType::Wire, 1, None, "child").unwrap();
    }

    #[test]
    fn stale_handles() {
        let mut tree = ScopeTree::new();
        let root = tree.allocate_scope(None, "root", ScopeKind::Module).unwrap();
        tree.free_scope(root).unwrap();

        assert_eq!(tree.free_scope(root).unwrap_err(), TreeError::UnknownScope(0));
        assert_eq!(
            tree.allocate_scope(Some(root), "x", ScopeKind::Begin).unwrap_err(),
            TreeError::UnknownScope(0)
        );
        assert_eq!(
            tree.free_var(VarIdx(7, 0)).unwrap_err(),
            TreeError::UnknownVariable(7)
        );
        assert_eq!(tree.live_scopes(), 0);

        // the slot comes back under a new generation
        let again = tree.allocate_scope(None, "root", ScopeKind::Module).unwrap();
        assert_ne!(again, root);
        assert!(tree.scope(root).is_none());
        assert_eq!(tree.scope(again).unwrap().identifier(), "root");
        assert_eq!(tree.free_scope(root).unwrap_err(), TreeError::UnknownScope(0));
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut tree = ScopeTree::new();
        for round in 0..100_000 {
            let root = tree.allocate_scope(None, "root", ScopeKind::Module).unwrap();
            let var = tree
                .allocate_var(Some(root), VarType::Wire, 8, Some(Reference::new("d", 0, 7)), "!")
                .unwrap();
            assert_eq!(root, ScopeIdx(0, round));
            assert_eq!(var, VarIdx(0, round));
            tree.free_scope(root).unwrap();
        }
        assert_eq!(tree.live_scopes(), 0);
        assert_eq!(tree.live_variables(), 0);
        assert_eq!(tree.scopes.slots.len(), 1);
        assert_eq!(tree.variables.slots.len(), 1);
    }

    #[test]
    fn roots_in_allocation_order() {
        let mut tree = ScopeTree::new();
        let a = tree.allocate_scope(None, "a", ScopeKind::Module).unwrap();
        let b = tree.allocate_scope(None, "b", ScopeKind::Module).unwrap();
        let c = tree.allocate_scope(None, "c", ScopeKind::Module).unwrap();
        assert_eq!(tree.roots(), &[a, b, c]);

        tree.free_scope(b).unwrap();
        assert_eq!(tree.roots(), &[a, c]);
        assert_eq!(tree.root_named("c"), Some(c));
        assert_eq!(tree.root_named("b"), None);
    }
}
