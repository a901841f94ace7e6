//! Equivalence classes of virtual methods that must keep one name.

use rustc_hash::FxHashMap;

use crate::{
    deobfuscation::renamer::graph::{AccessorKind, DispatchGraph, MethodId, MethodNode},
    Result,
};

/// Virtual methods that share a dispatch slot somewhere in the hierarchy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MethodNameGroup {
    methods: Vec<MethodId>,
}

impl MethodNameGroup {
    /// Members, in the order they joined
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// Number of members
    #[must_use]
    pub fn count(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if the group has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Returns true if `method` is a member
    #[must_use]
    pub fn contains(&self, method: MethodId) -> bool {
        self.methods.contains(&method)
    }

    /// Returns true if a member is declared by a type that must not be renamed.
    ///
    /// Renaming such a group would break the binding to the external declaration.
    #[must_use]
    pub fn has_non_renamable_method(&self, graph: &DispatchGraph) -> bool {
        self.methods.iter().any(|&m| !graph.is_renamable(m))
    }

    /// Returns true if a member is declared by an interface
    #[must_use]
    pub fn has_interface_method(&self, graph: &DispatchGraph) -> bool {
        self.methods
            .iter()
            .any(|&m| graph.type_node(graph.method(m).owner).interface)
    }

    /// Returns true if a member is a property getter or setter
    #[must_use]
    pub fn has_getter_or_setter_property_method(&self, graph: &DispatchGraph) -> bool {
        self.methods.iter().any(|&m| {
            matches!(
                graph.accessor_kind(m),
                Some(AccessorKind::Getter | AccessorKind::Setter)
            )
        })
    }

    /// Returns true if a member is an event add, remove or raise accessor
    #[must_use]
    pub fn has_add_remove_or_raise_event_method(&self, graph: &DispatchGraph) -> bool {
        self.methods.iter().any(|&m| {
            matches!(
                graph.accessor_kind(m),
                Some(AccessorKind::Adder | AccessorKind::Remover | AccessorKind::Raiser)
            )
        })
    }

    /// Returns true if a member belongs to a property
    #[must_use]
    pub fn has_property(&self, graph: &DispatchGraph) -> bool {
        self.methods.iter().any(|&m| graph.method(m).property.is_some())
    }

    /// Returns true if a member belongs to an event
    #[must_use]
    pub fn has_event(&self, graph: &DispatchGraph) -> bool {
        self.methods.iter().any(|&m| graph.method(m).event.is_some())
    }

    fn merge(&mut self, other: MethodNameGroup) {
        self.methods.extend(other.methods);
    }
}

/// The partition of all virtual methods into [`MethodNameGroup`]s.
///
/// Groups live in a flat list, merged groups leave an empty entry behind so group
/// indices stay stable.
#[derive(Debug, Default, Clone)]
pub struct MethodNameGroups {
    groups: Vec<MethodNameGroup>,
    index: FxHashMap<MethodId, usize>,
}

impl MethodNameGroups {
    /// Creates an empty partition
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a virtual method in a group of its own, unless it already has one.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `method` is not virtual.
    pub fn add(&mut self, method: &MethodNode) -> Result<()> {
        self.get(method).map(|_| ())
    }

    fn get(&mut self, method: &MethodNode) -> Result<usize> {
        if !method.is_virtual() {
            return Err(invariant_error!(
                "Method {} '{}' is not virtual",
                method.token,
                method.name.escape_default()
            ));
        }

        if let Some(&group) = self.index.get(&method.id) {
            return Ok(group);
        }

        let group = self.groups.len();
        self.groups.push(MethodNameGroup {
            methods: vec![method.id],
        });
        self.index.insert(method.id, group);
        Ok(group)
    }

    /// Puts `a` and `b` into the same group. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if either method is not virtual.
    pub fn same(&mut self, a: &MethodNode, b: &MethodNode) -> Result<()> {
        let a = self.get(a)?;
        let b = self.get(b)?;
        self.merge(a, b);
        Ok(())
    }

    fn merge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        let (into, from) = if self.groups[a].count() < self.groups[b].count() {
            (b, a)
        } else {
            (a, b)
        };

        let moved = std::mem::take(&mut self.groups[from]);
        for method in &moved.methods {
            self.index.insert(*method, into);
        }
        self.groups[into].merge(moved);
    }

    /// Returns the group of `method`, `None` for non-virtual methods
    #[must_use]
    pub fn group_of(&self, method: MethodId) -> Option<&MethodNameGroup> {
        self.index.get(&method).map(|&group| &self.groups[group])
    }

    /// Returns true if `a` and `b` are in the same group
    #[must_use]
    pub fn are_same(&self, a: MethodId, b: MethodId) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Iterates over all non-empty groups, in creation order
    pub fn groups(&self) -> impl Iterator<Item = &MethodNameGroup> + '_ {
        self.groups.iter().filter(|group| !group.is_empty())
    }

    /// Number of non-empty groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups().count()
    }

    /// Returns true if there are no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
