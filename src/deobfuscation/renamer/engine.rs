//! Assignment of final names.
//!
//! [`RenamingEngine`] walks the dispatch graph and its method groups once and produces
//! a [`RenameMap`]. The order of the passes matters:
//!
//! 1. names that stay are registered, so nothing generated can shadow them
//! 2. stripped properties and events of overrides are restored
//! 3. types, base types first
//! 4. property and event accessor groups, which also fix the names of their properties
//!    and events
//! 5. the remaining virtual method groups
//! 6. properties and events without virtual accessors, then non-virtual methods and
//!    fields

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    deobfuscation::{
        config::RenamerConfig,
        events::{EventKind, EventLog},
        renamer::{
            graph::{AccessorKind, DispatchGraph, EventId, MethodId, PropertyId, TypeId},
            groups::{MethodNameGroup, MethodNameGroups},
            names::{NameChecker, NameCreator, NameRegistry, TypeNameCreator},
        },
    },
    metadata::token::Token,
    Result,
};

/// What a rename entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum RenameKind {
    /// A type
    Type,
    /// A method
    Method,
    /// A field
    Field,
    /// A property
    Property,
    /// An event
    Event,
}

impl RenameKind {
    fn event_kind(self) -> EventKind {
        match self {
            RenameKind::Type => EventKind::TypeRenamed,
            RenameKind::Method => EventKind::MethodRenamed,
            RenameKind::Field => EventKind::FieldRenamed,
            RenameKind::Property => EventKind::PropertyRenamed,
            RenameKind::Event => EventKind::EventRenamed,
        }
    }
}

/// A single rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    /// Kind of the renamed declaration
    pub kind: RenameKind,
    /// Name before renaming
    pub old_name: String,
    /// Name after renaming
    pub new_name: String,
}

/// A property or event that was recreated on an override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredMember {
    /// [`RenameKind::Property`] or [`RenameKind::Event`]
    pub kind: RenameKind,
    /// The type that gets the member
    pub owner: Token,
    /// Final name
    pub name: String,
    /// Accessor methods, in the order getter/setter or add/remove/raise, then others
    pub accessors: Vec<Token>,
}

/// The result of renaming: old identity to new name, ordered by token.
///
/// # Example
///
/// ```rust
/// use reactorscope::deobfuscation::renamer::engine::{RenameKind, RenameMap};
///
/// let map = RenameMap::new();
/// assert!(map.is_empty());
/// assert_eq!(map.count_kind(RenameKind::Method), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
    entries: BTreeMap<Token, RenameEntry>,
    restored: Vec<RestoredMember>,
}

impl RenameMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, token: Token, entry: RenameEntry) -> bool {
        if self.entries.contains_key(&token) {
            return false;
        }
        self.entries.insert(token, entry);
        true
    }

    /// Returns the entry of a declaration.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&RenameEntry> {
        self.entries.get(&token)
    }

    /// Returns the new name of a declaration, if it was renamed.
    #[must_use]
    pub fn new_name(&self, token: Token) -> Option<&str> {
        self.entries.get(&token).map(|entry| entry.new_name.as_str())
    }

    /// Returns true if the declaration was renamed.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.entries.contains_key(&token)
    }

    /// Number of renamed declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was renamed or restored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.restored.is_empty()
    }

    /// Iterates over all entries in token order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &RenameEntry)> + '_ {
        self.entries.iter().map(|(token, entry)| (*token, entry))
    }

    /// Counts the entries of one kind.
    #[must_use]
    pub fn count_kind(&self, kind: RenameKind) -> usize {
        self.entries.values().filter(|entry| entry.kind == kind).count()
    }

    /// Properties and events recreated on overrides.
    #[must_use]
    pub fn restored(&self) -> &[RestoredMember] {
        &self.restored
    }
}

/// Assigns new names to the declarations of one dispatch graph.
pub struct RenamingEngine<'a> {
    config: &'a RenamerConfig,
    log: &'a EventLog,
    registry: NameRegistry,
    type_names: TypeNameCreator,
    interface_methods: NameCreator,
    virtual_methods: NameCreator,
    methods: NameCreator,
    fields: NameCreator,
    properties: NameCreator,
    events: NameCreator,
    new_type_names: FxHashMap<TypeId, String>,
    property_names: FxHashMap<PropertyId, String>,
    event_names: FxHashMap<EventId, String>,
    done: FxHashSet<MethodId>,
    map: RenameMap,
}

impl<'a> RenamingEngine<'a> {
    /// Creates an engine with an empty registry.
    #[must_use]
    pub fn new(config: &'a RenamerConfig, log: &'a EventLog) -> Self {
        RenamingEngine {
            config,
            log,
            registry: NameRegistry::new(),
            type_names: TypeNameCreator::new(),
            interface_methods: NameCreator::new("imethod_"),
            virtual_methods: NameCreator::new("vmethod_"),
            methods: NameCreator::new("method_"),
            fields: NameCreator::new("field_"),
            properties: NameCreator::new("Property_"),
            events: NameCreator::new("Event_"),
            new_type_names: FxHashMap::default(),
            property_names: FxHashMap::default(),
            event_names: FxHashMap::default(),
            done: FxHashSet::default(),
            map: RenameMap::new(),
        }
    }

    /// Seeds the registry with names that must not be generated.
    #[must_use]
    pub fn with_registry(mut self, registry: &NameRegistry) -> Self {
        self.registry.merge(registry);
        self
    }

    /// Renames the declarations of `graph`.
    ///
    /// `groups` must come from [`DispatchGraph::group_methods`] on the same graph.
    /// Restored properties and events are added to the graph.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a name generator gets stuck, and
    /// [`crate::Error::AlreadyExists`] if a restored member collides with a declared one.
    pub fn run(
        mut self,
        graph: &mut DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<RenameMap> {
        if !self.config.any_enabled() {
            return Ok(self.map);
        }

        self.register_existing(graph);

        if self.config.restore_properties {
            self.restore_properties(graph, groups)?;
        }
        if self.config.restore_events {
            self.restore_events(graph, groups)?;
        }

        if self.config.rename_types {
            self.rename_types(graph)?;
        }

        self.rename_property_groups(graph, groups)?;
        self.rename_event_groups(graph, groups)?;
        if self.config.rename_methods {
            self.rename_virtual_groups(graph, groups)?;
        }

        self.rename_properties(graph)?;
        self.rename_events(graph)?;
        if self.config.rename_methods {
            self.rename_methods(graph)?;
        }
        if self.config.rename_fields {
            self.rename_fields(graph)?;
        }

        self.collect_restored(graph);
        Ok(self.map)
    }

    fn register_existing(&mut self, graph: &DispatchGraph) {
        let module = graph.module();
        let names = graph
            .types()
            .iter()
            .map(|t| t.name.as_str())
            .chain(graph.methods().iter().map(|m| m.name.as_str()))
            .chain(graph.properties().iter().map(|p| p.name.as_str()))
            .chain(graph.events().iter().map(|e| e.name.as_str()))
            .chain(module.fields().iter().map(|f| f.name.as_str()));

        for name in names {
            if !NameChecker::needs_rename(name) {
                self.registry.add(name);
            }
        }
    }

    fn record(&mut self, token: Token, kind: RenameKind, old_name: &str, new_name: &str) {
        if old_name == new_name {
            return;
        }

        let inserted = self.map.insert(
            token,
            RenameEntry {
                kind,
                old_name: old_name.to_string(),
                new_name: new_name.to_string(),
            },
        );

        if inserted {
            self.log
                .record(kind.event_kind())
                .token(token)
                .message(format!("'{}' -> '{}'", old_name.escape_default(), new_name));
        }
    }

    fn rename_method(&mut self, graph: &DispatchGraph, method: MethodId, new_name: &str) {
        if !self.done.insert(method) {
            return;
        }

        let node = graph.method(method);
        self.registry.add(new_name);
        self.record(node.token, RenameKind::Method, &node.name, new_name);
    }

    fn skip_group(&mut self, graph: &DispatchGraph, group: &MethodNameGroup) {
        self.done.extend(group.methods().iter().copied());

        let obfuscated = group
            .methods()
            .iter()
            .find(|&&m| NameChecker::needs_rename(&graph.method(m).name));

        if let Some(&method) = obfuscated {
            self.log
                .record(EventKind::GroupSkipped)
                .token(graph.method(method).token)
                .message(format!(
                    "{} method(s) bound to a non-renamable type",
                    group.count()
                ));
        }
    }

    fn restore_properties(
        &mut self,
        graph: &mut DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<()> {
        for group in groups.groups() {
            let source = group.methods().iter().find_map(|&m| match graph.accessor_kind(m) {
                Some(kind @ (AccessorKind::Getter | AccessorKind::Setter)) => {
                    graph.method(m).property.map(|p| (p, kind))
                }
                _ => None,
            });
            let Some((source, kind)) = source else {
                continue;
            };
            let name = graph.property(source).name.clone();

            for &method in group.methods() {
                let node = graph.method(method);
                if node.is_accessor() || !graph.is_renamable(method) {
                    continue;
                }

                let owner = node.owner;
                let token = node.token;
                let property = match graph.find_property(owner, &name) {
                    Some(property) => property,
                    None => {
                        let property = graph.create_property(owner, &name)?;
                        self.log
                            .record(EventKind::PropertyRestored)
                            .token(token)
                            .message(format!(
                                "property '{}' on {}",
                                name.escape_default(),
                                graph.type_node(owner).token
                            ));
                        property
                    }
                };
                graph.add_property_accessor(property, method, kind)?;
            }
        }
        Ok(())
    }

    fn restore_events(
        &mut self,
        graph: &mut DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<()> {
        for group in groups.groups() {
            let source = group.methods().iter().find_map(|&m| match graph.accessor_kind(m) {
                Some(
                    kind @ (AccessorKind::Adder | AccessorKind::Remover | AccessorKind::Raiser),
                ) => graph.method(m).event.map(|e| (e, kind)),
                _ => None,
            });
            let Some((source, kind)) = source else {
                continue;
            };
            let name = graph.event(source).name.clone();

            for &method in group.methods() {
                let node = graph.method(method);
                if node.is_accessor() || !graph.is_renamable(method) {
                    continue;
                }

                let owner = node.owner;
                let token = node.token;
                let event = match graph.find_event(owner, &name) {
                    Some(event) => event,
                    None => {
                        let event = graph.create_event(owner, &name)?;
                        self.log
                            .record(EventKind::EventRestored)
                            .token(token)
                            .message(format!(
                                "event '{}' on {}",
                                name.escape_default(),
                                graph.type_node(owner).token
                            ));
                        event
                    }
                };
                graph.add_event_accessor(event, method, kind)?;
            }
        }
        Ok(())
    }

    /// Orders types so that every base type comes before the types deriving from it.
    fn base_first(graph: &DispatchGraph) -> Vec<TypeId> {
        let count = graph.types().len();
        let mut placed = vec![false; count];
        let mut order = Vec::with_capacity(count);

        for start in graph.types() {
            let mut chain = Vec::new();
            let mut current = Some(start.id);
            while let Some(id) = current {
                if placed[id.index()] || chain.contains(&id) {
                    break;
                }
                chain.push(id);
                current = graph.type_node(id).base.as_ref().map(|base| base.node);
            }

            for id in chain.into_iter().rev() {
                placed[id.index()] = true;
                order.push(id);
            }
        }
        order
    }

    fn rename_types(&mut self, graph: &DispatchGraph) -> Result<()> {
        for id in Self::base_first(graph) {
            let node = graph.type_node(id);
            if !node.is_renamable() || !NameChecker::needs_rename(&node.name) {
                continue;
            }
            let Some(ty) = graph.type_def(id) else {
                continue;
            };

            let new_base = node
                .base
                .as_ref()
                .and_then(|base| self.new_type_names.get(&base.node))
                .map(String::as_str);
            let name = self.type_names.create(&mut self.registry, ty, new_base)?;

            self.record(node.token, RenameKind::Type, &node.name, &name);
            self.new_type_names.insert(id, name);
        }
        Ok(())
    }

    fn member_name(
        &mut self,
        current: &[&str],
        enabled: bool,
        kind: MemberKind,
    ) -> Result<String> {
        if let Some(clean) = current.iter().find(|name| !NameChecker::needs_rename(name)) {
            return Ok((*clean).to_string());
        }

        let first = current.first().copied().unwrap_or_default();
        if !enabled {
            return Ok(first.to_string());
        }

        let creator = match kind {
            MemberKind::Property => &mut self.properties,
            MemberKind::Event => &mut self.events,
        };
        self.registry.create_name(first, creator)
    }

    fn rename_accessors(
        &mut self,
        graph: &DispatchGraph,
        methods: &[MethodId],
        kind: AccessorKind,
        owner_name: &str,
    ) {
        if !self.config.rename_methods || NameChecker::needs_rename(owner_name) {
            return;
        }
        let Some(prefix) = kind.prefix() else {
            return;
        };

        let target = format!("{prefix}{owner_name}");
        for &method in methods {
            self.rename_method(graph, method, &target);
        }
    }

    fn rename_property_groups(
        &mut self,
        graph: &DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<()> {
        for group in groups.groups() {
            if !group.has_getter_or_setter_property_method(graph) {
                continue;
            }

            let mut properties: Vec<PropertyId> = Vec::new();
            for &method in group.methods() {
                if let Some(property) = graph.method(method).property {
                    if !properties.contains(&property) {
                        properties.push(property);
                    }
                }
            }

            if group.has_non_renamable_method(graph) {
                for &property in &properties {
                    self.property_names
                        .entry(property)
                        .or_insert_with(|| graph.property(property).name.clone());
                }
                self.skip_group(graph, group);
                continue;
            }

            let decided = properties
                .iter()
                .find_map(|p| self.property_names.get(p))
                .cloned();
            let name = match decided {
                Some(name) => name,
                None => {
                    let current: Vec<&str> = properties
                        .iter()
                        .map(|&p| graph.property(p).name.as_str())
                        .collect();
                    self.member_name(&current, self.config.rename_properties, MemberKind::Property)?
                }
            };

            for &property in &properties {
                self.assign_property_name(graph, property, &name);
            }

            let kind = group
                .methods()
                .iter()
                .find_map(|&m| graph.accessor_kind(m))
                .unwrap_or(AccessorKind::Other);
            self.rename_accessors(graph, group.methods(), kind, &name);
            self.done.extend(group.methods().iter().copied());
        }
        Ok(())
    }

    fn rename_event_groups(
        &mut self,
        graph: &DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<()> {
        for group in groups.groups() {
            if !group.has_add_remove_or_raise_event_method(graph) {
                continue;
            }

            let mut events: Vec<EventId> = Vec::new();
            for &method in group.methods() {
                if let Some(event) = graph.method(method).event {
                    if !events.contains(&event) {
                        events.push(event);
                    }
                }
            }

            if group.has_non_renamable_method(graph) {
                for &event in &events {
                    self.event_names
                        .entry(event)
                        .or_insert_with(|| graph.event(event).name.clone());
                }
                self.skip_group(graph, group);
                continue;
            }

            let decided = events.iter().find_map(|e| self.event_names.get(e)).cloned();
            let name = match decided {
                Some(name) => name,
                None => {
                    let current: Vec<&str> =
                        events.iter().map(|&e| graph.event(e).name.as_str()).collect();
                    self.member_name(&current, self.config.rename_events, MemberKind::Event)?
                }
            };

            for &event in &events {
                self.assign_event_name(graph, event, &name);
            }

            let kind = group
                .methods()
                .iter()
                .find_map(|&m| graph.accessor_kind(m))
                .unwrap_or(AccessorKind::Other);
            self.rename_accessors(graph, group.methods(), kind, &name);
            self.done.extend(group.methods().iter().copied());
        }
        Ok(())
    }

    fn assign_property_name(&mut self, graph: &DispatchGraph, property: PropertyId, name: &str) {
        if self.property_names.contains_key(&property) {
            return;
        }
        self.property_names.insert(property, name.to_string());

        let node = graph.property(property);
        self.registry.add(name);
        if let Some(token) = node.token {
            self.record(token, RenameKind::Property, &node.name, name);
        }
    }

    fn assign_event_name(&mut self, graph: &DispatchGraph, event: EventId, name: &str) {
        if self.event_names.contains_key(&event) {
            return;
        }
        self.event_names.insert(event, name.to_string());

        let node = graph.event(event);
        self.registry.add(name);
        if let Some(token) = node.token {
            self.record(token, RenameKind::Event, &node.name, name);
        }
    }

    fn rename_virtual_groups(
        &mut self,
        graph: &DispatchGraph,
        groups: &MethodNameGroups,
    ) -> Result<()> {
        for group in groups.groups() {
            let members: Vec<MethodId> = group
                .methods()
                .iter()
                .copied()
                .filter(|m| !self.done.contains(m))
                .collect();
            let Some(&first) = members.first() else {
                continue;
            };

            if group.has_non_renamable_method(graph) {
                self.skip_group(graph, group);
                continue;
            }

            let old_name = &graph.method(first).name;
            if !members
                .iter()
                .any(|&m| NameChecker::needs_rename(&graph.method(m).name))
            {
                self.done.extend(members);
                continue;
            }

            let creator = if group.has_interface_method(graph) {
                &mut self.interface_methods
            } else {
                &mut self.virtual_methods
            };
            let name = self.registry.create_name(old_name, creator)?;

            for method in members {
                self.rename_method(graph, method, &name);
            }
        }
        Ok(())
    }

    fn rename_properties(&mut self, graph: &DispatchGraph) -> Result<()> {
        for node in graph.properties() {
            if self.property_names.contains_key(&node.id)
                || !graph.type_node(node.owner).is_renamable()
            {
                continue;
            }

            let name = self.member_name(
                &[node.name.as_str()],
                self.config.rename_properties,
                MemberKind::Property,
            )?;
            self.assign_property_name(graph, node.id, &name);

            for method in node.accessors() {
                if let Some(kind) = node.accessor_kind(method) {
                    self.rename_accessors(graph, &[method], kind, &name);
                }
            }
        }
        Ok(())
    }

    fn rename_events(&mut self, graph: &DispatchGraph) -> Result<()> {
        for node in graph.events() {
            if self.event_names.contains_key(&node.id)
                || !graph.type_node(node.owner).is_renamable()
            {
                continue;
            }

            let name = self.member_name(
                &[node.name.as_str()],
                self.config.rename_events,
                MemberKind::Event,
            )?;
            self.assign_event_name(graph, node.id, &name);

            for method in node.accessors() {
                if let Some(kind) = node.accessor_kind(method) {
                    self.rename_accessors(graph, &[method], kind, &name);
                }
            }
        }
        Ok(())
    }

    fn rename_methods(&mut self, graph: &DispatchGraph) -> Result<()> {
        for node in graph.methods() {
            if self.done.contains(&node.id)
                || node.is_virtual()
                || !graph.is_renamable(node.id)
                || !NameChecker::needs_rename(&node.name)
            {
                continue;
            }

            let name = self.registry.create_name(&node.name, &mut self.methods)?;
            self.rename_method(graph, node.id, &name);
        }
        Ok(())
    }

    fn rename_fields(&mut self, graph: &DispatchGraph) -> Result<()> {
        let module = graph.module();
        for node in graph.types() {
            if !node.is_renamable() {
                continue;
            }

            for &token in &node.fields {
                let Some(field) = module.field(token) else {
                    continue;
                };
                if !NameChecker::needs_rename(&field.name) {
                    continue;
                }

                let name = self.registry.create_name(&field.name, &mut self.fields)?;
                self.record(token, RenameKind::Field, &field.name, &name);
            }
        }
        Ok(())
    }

    fn collect_restored(&mut self, graph: &DispatchGraph) {
        for node in graph.properties().iter().filter(|p| p.token.is_none()) {
            let name = self.property_names.get(&node.id).unwrap_or(&node.name).clone();
            self.map.restored.push(RestoredMember {
                kind: RenameKind::Property,
                owner: graph.type_node(node.owner).token,
                name,
                accessors: node.accessors().map(|m| graph.method(m).token).collect(),
            });
        }

        for node in graph.events().iter().filter(|e| e.token.is_none()) {
            let name = self.event_names.get(&node.id).unwrap_or(&node.name).clone();
            self.map.restored.push(RestoredMember {
                kind: RenameKind::Event,
                owner: graph.type_node(node.owner).token,
                name,
                accessors: node.accessors().map(|m| graph.method(m).token).collect(),
            });
        }
    }
}

#[derive(Clone, Copy)]
enum MemberKind {
    Property,
    Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::{FieldAttributes, MethodAttributes, TypeAttributes},
        members::{FieldDef, MethodDef, PropertyDef},
        module::Module,
        signatures::{MethodSig, TypeSig},
        typedef::TypeDef,
    };

    fn run(module: &Module, config: &RenamerConfig) -> Result<(RenameMap, EventLog)> {
        let log = EventLog::new();
        let mut graph = DispatchGraph::build(module)?;
        let groups = graph.group_methods(&log)?;
        let map = RenamingEngine::new(config, &log).run(&mut graph, &groups)?;
        Ok((map, log))
    }

    fn virtual_getter(name: &str, new_slot: bool) -> MethodDef {
        let mut flags =
            MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL | MethodAttributes::SPECIAL_NAME;
        if new_slot {
            flags |= MethodAttributes::NEW_SLOT;
        }
        MethodDef::new(name, flags, MethodSig::instance(TypeSig::I4, vec![]))
    }

    #[test]
    fn test_simple_members() -> Result<()> {
        let mut module = Module::new("test.dll");
        let ty = module.add_type(TypeDef::new("", "\u{200B}", TypeAttributes::PUBLIC));
        let clean = module.add_method(
            ty,
            MethodDef::new(
                "Run",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let obfuscated = module.add_method(
            ty,
            MethodDef::new(
                "\u{200C}",
                MethodAttributes::PRIVATE,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let ctor = module.add_method(
            ty,
            MethodDef::new(
                ".ctor",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let field = module.add_field(
            ty,
            FieldDef::new("\u{200D}", FieldAttributes::PRIVATE, TypeSig::I4),
        )?;

        let (map, log) = run(&module, &RenamerConfig::default())?;

        assert_eq!(map.new_name(ty), Some("Class0"));
        assert_eq!(map.new_name(obfuscated), Some("method_0"));
        assert_eq!(map.new_name(field), Some("field_0"));
        assert!(!map.contains(clean));
        assert!(!map.contains(ctor));
        assert_eq!(map.len(), 3);
        assert_eq!(log.count_kind(EventKind::MethodRenamed), 1);
        Ok(())
    }

    #[test]
    fn test_generated_names_avoid_existing() -> Result<()> {
        let mut module = Module::new("test.dll");
        let ty = module.add_type(TypeDef::new("", "Host", TypeAttributes::PUBLIC));
        module.add_method(
            ty,
            MethodDef::new(
                "method_0",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let obfuscated = module.add_method(
            ty,
            MethodDef::new(
                "\u{200C}",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;

        let (map, _) = run(&module, &RenamerConfig::default())?;
        assert_eq!(map.new_name(obfuscated), Some("method_1"));
        Ok(())
    }

    #[test]
    fn test_external_override_is_skipped() -> Result<()> {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference());
        let ext = module.add_type(
            TypeDef::new("Ext", "Base", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .reference(),
        );
        let local = module.add_type(
            TypeDef::new("", "\u{2000}", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("Ext.Base")),
        );
        let flags = MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL;
        module.add_method(
            ext,
            MethodDef::new(
                "\u{2001}",
                flags | MethodAttributes::NEW_SLOT,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let over = module.add_method(
            local,
            MethodDef::new("\u{2001}", flags, MethodSig::instance(TypeSig::Void, vec![])),
        )?;

        let (map, log) = run(&module, &RenamerConfig::default())?;
        assert!(!map.contains(over));
        assert_eq!(log.count_kind(EventKind::GroupSkipped), 1);
        assert!(map.contains(local));
        Ok(())
    }

    #[test]
    fn test_virtual_group_shares_name() -> Result<()> {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference());
        let base = module.add_type(
            TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC).with_base(TypeSig::Object),
        );
        let derived =
            module.add_type(
                TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC)
                    .with_base(TypeSig::class("Ns.Base")),
            );
        let flags = MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL;
        let a = module.add_method(
            base,
            MethodDef::new(
                "\u{2001}",
                flags | MethodAttributes::NEW_SLOT,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let b = module.add_method(
            derived,
            MethodDef::new("\u{2001}", flags, MethodSig::instance(TypeSig::Void, vec![])),
        )?;

        let (map, _) = run(&module, &RenamerConfig::default())?;
        assert_eq!(map.new_name(a), Some("vmethod_0"));
        assert_eq!(map.new_name(b), Some("vmethod_0"));
        Ok(())
    }

    #[test]
    fn test_property_group_and_restoration() -> Result<()> {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference());
        let base = module.add_type(
            TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC).with_base(TypeSig::Object),
        );
        let derived =
            module.add_type(
                TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC)
                    .with_base(TypeSig::class("Ns.Base")),
            );

        let base_get = module.add_method(base, virtual_getter("\u{2002}", true))?;
        let prop = module.add_property(
            base,
            PropertyDef::new("\u{2003}", TypeSig::I4).with_getter(base_get),
        )?;
        let derived_get = module.add_method(derived, virtual_getter("\u{2002}", false))?;

        let (map, log) = run(&module, &RenamerConfig::default())?;

        assert_eq!(map.new_name(prop), Some("Property_0"));
        assert_eq!(map.new_name(base_get), Some("get_Property_0"));
        assert_eq!(map.new_name(derived_get), Some("get_Property_0"));
        assert_eq!(log.count_kind(EventKind::PropertyRestored), 1);

        let restored = map.restored();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].owner, derived);
        assert_eq!(restored[0].name, "Property_0");
        assert_eq!(restored[0].accessors, vec![derived_get]);
        Ok(())
    }

    #[test]
    fn test_disabled_renames_nothing() -> Result<()> {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("", "\u{200B}", TypeAttributes::PUBLIC));

        let (map, log) = run(&module, &RenamerConfig::disabled())?;
        assert!(map.is_empty());
        assert!(log.is_empty());
        Ok(())
    }

    #[test]
    fn test_base_renamed_before_derived() -> Result<()> {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("System", "Exception", TypeAttributes::PUBLIC).reference());
        let derived = module.add_type(
            TypeDef::new("", "\u{2004}", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("\u{2005}")),
        );
        let base = module.add_type(
            TypeDef::new("", "\u{2005}", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("System.Exception")),
        );

        let (map, _) = run(&module, &RenamerConfig::default())?;
        assert_eq!(map.new_name(base), Some("Exception0"));
        assert_eq!(map.new_name(derived), Some("Exception1"));
        Ok(())
    }
}
