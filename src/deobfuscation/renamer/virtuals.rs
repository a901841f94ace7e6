//! Dispatch slot analysis.
//!
//! For every type the analysis computes two tables:
//!
//! - a `VirtualSlotTable` listing, per dispatch slot, every method instance from the
//!   base-most declaration to the most derived override
//! - an `InterfaceMethodMap` assigning each interface method the class method that
//!   implements it
//!
//! Types are processed ancestors first: a type's tables are derived from the tables of
//! its base type and interfaces, with the generic arguments of the reference substituted
//! into every inherited signature. Whenever two methods end up in the same slot, they
//! are merged into the same [`MethodNameGroup`](super::groups::MethodNameGroup).
//!
//! Interface slots are resolved in three passes, following ECMA-335 §II.12.2:
//!
//! 1. public virtual newslot methods of the type matching a method of a directly
//!    implemented interface
//! 2. for slots still empty, the most derived public method of each of the type's own
//!    slots, against all transitively implemented interfaces
//! 3. explicit override declarations, which replace whatever the first two passes found

use rustc_hash::FxHashMap;

use crate::{
    deobfuscation::{
        events::{EventKind, EventLog},
        renamer::{
            graph::{DispatchGraph, MethodId, MethodNode, TypeId, TypeRef},
            groups::MethodNameGroups,
        },
    },
    metadata::signatures::{MethodSig, TypeSig},
    Result,
};

/// One method as seen from a type in the hierarchy, with its signature substituted.
#[derive(Debug, Clone)]
pub(crate) struct MethodInst {
    pub(crate) method: MethodId,
    pub(crate) name: String,
    pub(crate) new_slot: bool,
    pub(crate) signature: MethodSig,
}

impl MethodInst {
    fn new(method: &MethodNode) -> Self {
        MethodInst {
            method: method.id,
            name: method.name.clone(),
            new_slot: method.is_new_slot(),
            signature: method.signature.clone(),
        }
    }

    fn substitute(&self, args: &[TypeSig]) -> Self {
        MethodInst {
            signature: self.signature.substitute_type_args(args),
            ..self.clone()
        }
    }
}

/// The dispatch slots visible from one type.
#[derive(Debug, Default, Clone)]
pub(crate) struct VirtualSlotTable {
    slots: Vec<Vec<MethodInst>>,
    index: FxHashMap<(String, MethodSig), usize>,
}

impl VirtualSlotTable {
    /// Adds an instance. A newslot instance, or one without matching slot, starts a
    /// fresh slot that replaces any slot with the same name and signature.
    fn add(&mut self, inst: MethodInst) {
        let key = (inst.name.clone(), inst.signature.clone());
        match self.index.get(&key) {
            Some(&slot) if inst.new_slot => self.slots[slot] = vec![inst],
            Some(&slot) => self.slots[slot].push(inst),
            None => {
                self.index.insert(key, self.slots.len());
                self.slots.push(vec![inst]);
            }
        }
    }

    fn initialize_from(&mut self, other: &VirtualSlotTable, args: &[TypeSig]) {
        for inst in other.slots.iter().flatten() {
            self.add(inst.substitute(args));
        }
    }

    fn lookup(&self, name: &str, signature: &MethodSig) -> Option<&[MethodInst]> {
        let key = (name.to_string(), signature.clone());
        self.index.get(&key).map(|&slot| self.slots[slot].as_slice())
    }

    fn slots(&self) -> impl Iterator<Item = &[MethodInst]> + '_ {
        self.slots.iter().map(Vec::as_slice)
    }
}

/// The implementation map of one interface as seen from one type.
#[derive(Debug, Clone)]
pub(crate) struct InterfaceMethods {
    iface: TypeRef,
    entries: Vec<(MethodId, Option<MethodId>)>,
}

impl InterfaceMethods {
    fn new(iface: TypeRef, methods: &[MethodId]) -> Self {
        InterfaceMethods {
            iface,
            entries: methods.iter().map(|&m| (m, None)).collect(),
        }
    }

    fn entry_mut(&mut self, iface_method: MethodId) -> Result<&mut Option<MethodId>> {
        let iface = &self.iface.sig;
        self.entries
            .iter_mut()
            .find(|(m, _)| *m == iface_method)
            .map(|(_, class_method)| class_method)
            .ok_or_else(|| {
                invariant_error!(
                    "Could not find method {} of interface {}",
                    iface_method.index(),
                    iface
                )
            })
    }

    fn add_method(&mut self, iface_method: MethodId, class_method: MethodId) -> Result<()> {
        *self.entry_mut(iface_method)? = Some(class_method);
        Ok(())
    }

    fn add_method_if_empty(
        &mut self,
        iface_method: MethodId,
        class_method: MethodId,
    ) -> Result<()> {
        self.entry_mut(iface_method)?.get_or_insert(class_method);
        Ok(())
    }

    /// Fills empty entries from `other`.
    fn merge(&mut self, other: &InterfaceMethods) {
        for &(iface_method, class_method) in &other.entries {
            let Some(class_method) = class_method else {
                continue;
            };
            if let Some((_, entry)) = self.entries.iter_mut().find(|(m, _)| *m == iface_method) {
                entry.get_or_insert(class_method);
            }
        }
    }
}

/// Interface implementation maps of one type, keyed by the interface reference.
#[derive(Debug, Default, Clone)]
pub(crate) struct InterfaceMethodMap {
    infos: Vec<InterfaceMethods>,
    index: FxHashMap<TypeSig, usize>,
}

impl InterfaceMethodMap {
    fn add_interface(&mut self, iface: &TypeRef, methods: &[MethodId]) {
        if !self.index.contains_key(&iface.sig) {
            self.index.insert(iface.sig.clone(), self.infos.len());
            self.infos.push(InterfaceMethods::new(iface.clone(), methods));
        }
    }

    /// Copies the maps of a base type or interface, as seen through a reference with `args`.
    fn initialize_from(&mut self, other: &InterfaceMethodMap, args: &[TypeSig]) {
        for info in &other.infos {
            let mut copy = InterfaceMethods {
                iface: info.iface.substitute(args),
                entries: info.entries.clone(),
            };

            match self.index.get(&copy.iface.sig) {
                Some(&pos) => {
                    copy.merge(&self.infos[pos]);
                    self.infos[pos] = copy;
                }
                None => {
                    self.index.insert(copy.iface.sig.clone(), self.infos.len());
                    self.infos.push(copy);
                }
            }
        }
    }

    fn info_mut(&mut self, iface: &TypeSig) -> Result<&mut InterfaceMethods> {
        match self.index.get(iface) {
            Some(&pos) => Ok(&mut self.infos[pos]),
            None => Err(invariant_error!("Could not find interface {}", iface)),
        }
    }

    fn add_method(
        &mut self,
        iface: &TypeSig,
        iface_method: MethodId,
        class_method: MethodId,
    ) -> Result<()> {
        self.info_mut(iface)?.add_method(iface_method, class_method)
    }

    fn add_method_if_empty(
        &mut self,
        iface: &TypeSig,
        iface_method: MethodId,
        class_method: MethodId,
    ) -> Result<()> {
        self.info_mut(iface)?
            .add_method_if_empty(iface_method, class_method)
    }

    fn entries(&self) -> impl Iterator<Item = (MethodId, Option<MethodId>)> + '_ {
        self.infos.iter().flat_map(|info| info.entries.iter().copied())
    }
}

/// Per-type state of the dispatch analysis.
#[derive(Debug, Default)]
pub(crate) struct DispatchState {
    initialized: bool,
    slots: VirtualSlotTable,
    interface_map: InterfaceMethodMap,
    all_interfaces: Vec<TypeRef>,
    resolved_all_interfaces: Option<bool>,
    resolved_base_classes: Option<bool>,
}

fn push_unique(list: &mut Vec<TypeRef>, iface: TypeRef) {
    if !list.contains(&iface) {
        list.push(iface);
    }
}

impl DispatchGraph<'_> {
    /// Runs the dispatch analysis and partitions all virtual methods into name groups.
    ///
    /// Every virtual method ends up in exactly one group. Types whose base chain and
    /// interfaces are fully resolved but which still leave interface methods without an
    /// implementation are reported as [`EventKind::InterfaceUnresolved`].
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if an interface map lost an interface or one of
    /// its methods.
    pub fn group_methods(&mut self, log: &EventLog) -> Result<MethodNameGroups> {
        let mut groups = MethodNameGroups::new();
        for index in 0..self.types.len() {
            self.initialize_virtual_members(TypeId(index), &mut groups)?;
        }

        for index in 0..self.types.len() {
            self.report_unresolved(TypeId(index), log);
        }

        Ok(groups)
    }

    fn initialize_virtual_members(
        &mut self,
        id: TypeId,
        groups: &mut MethodNameGroups,
    ) -> Result<()> {
        if self.types[id.0].dispatch.initialized {
            return Ok(());
        }
        self.types[id.0].dispatch.initialized = true;

        let node = &self.types[id.0];
        let interfaces: Vec<TypeId> = node.interfaces.iter().map(|iface| iface.node).collect();
        let base = node.base.as_ref().map(|base| base.node);

        for iface in interfaces {
            self.initialize_virtual_members(iface, groups)?;
        }
        if let Some(base) = base {
            self.initialize_virtual_members(base, groups)?;
        }

        for &method in &self.types[id.0].methods {
            let method = &self.methods[method.0];
            if method.is_virtual() {
                groups.add(method)?;
            }
        }

        self.instantiate_virtual_members(id, groups)?;
        self.initialize_interface_methods(id, groups)
    }

    fn instantiate_virtual_members(
        &mut self,
        id: TypeId,
        groups: &mut MethodNameGroups,
    ) -> Result<()> {
        let node = &self.types[id.0];
        let mut slots = VirtualSlotTable::default();

        if !node.interface {
            if let Some(base) = &node.base {
                slots.initialize_from(&self.types[base.node.0].dispatch.slots, base.generic_args());
            }

            for &method in &node.methods {
                let method = &self.methods[method.0];
                if !method.is_virtual() || method.is_new_slot() {
                    continue;
                }

                if let Some(instances) = slots.lookup(&method.name, &method.signature) {
                    for inst in instances {
                        groups.same(method, &self.methods[inst.method.0])?;
                    }
                }
            }
        }

        for &method in &node.methods {
            let method = &self.methods[method.0];
            if method.is_virtual() {
                slots.add(MethodInst::new(method));
            }
        }

        self.types[id.0].dispatch.slots = slots;
        Ok(())
    }

    fn inherit_interfaces(
        &self,
        from: &TypeRef,
        map: &mut InterfaceMethodMap,
        all: &mut Vec<TypeRef>,
    ) {
        let args = from.generic_args();
        let source = &self.types[from.node.0].dispatch;

        map.initialize_from(&source.interface_map, args);
        for iface in &source.all_interfaces {
            push_unique(all, iface.substitute(args));
        }
    }

    fn initialize_all_interfaces(&mut self, id: TypeId) {
        let mut map = std::mem::take(&mut self.types[id.0].dispatch.interface_map);
        let mut all = std::mem::take(&mut self.types[id.0].dispatch.all_interfaces);

        let node = &self.types[id.0];
        if let Some(base) = &node.base {
            self.inherit_interfaces(base, &mut map, &mut all);
        }

        for iface in &node.interfaces {
            push_unique(&mut all, iface.clone());
            map.add_interface(iface, &self.types[iface.node.0].methods);
            self.inherit_interfaces(iface, &mut map, &mut all);
        }

        let state = &mut self.types[id.0].dispatch;
        state.interface_map = map;
        state.all_interfaces = all;
    }

    fn initialize_interface_methods(
        &mut self,
        id: TypeId,
        groups: &mut MethodNameGroups,
    ) -> Result<()> {
        self.initialize_all_interfaces(id);
        if self.types[id.0].interface {
            return Ok(());
        }

        let mut map = std::mem::take(&mut self.types[id.0].dispatch.interface_map);
        let resolved = self.resolve_interface_slots(id, &mut map);

        let same: Vec<(MethodId, MethodId)> = map
            .entries()
            .filter_map(|(iface_method, class_method)| Some((iface_method, class_method?)))
            .filter(|&(a, b)| self.methods[a.0].name == self.methods[b.0].name)
            .collect();

        self.types[id.0].dispatch.interface_map = map;
        resolved?;

        for (iface_method, class_method) in same {
            groups.same(&self.methods[iface_method.0], &self.methods[class_method.0])?;
        }
        Ok(())
    }

    /// Looks up the class method for each virtual method of `iface` by its signature as
    /// seen through the reference.
    fn match_interface(
        &self,
        iface: &TypeRef,
        candidates: &FxHashMap<(&str, &MethodSig), MethodId>,
    ) -> Vec<(MethodId, MethodId)> {
        let mut matched = Vec::new();
        for instances in self.types[iface.node.0].dispatch.slots.slots() {
            let Some(inst) = instances.first() else {
                continue;
            };
            if !self.methods[inst.method.0].is_virtual() {
                continue;
            }

            let signature = inst.signature.substitute_type_args(iface.generic_args());
            if let Some(&class_method) = candidates.get(&(inst.name.as_str(), &signature)) {
                matched.push((inst.method, class_method));
            }
        }
        matched
    }

    fn resolve_interface_slots(&self, id: TypeId, map: &mut InterfaceMethodMap) -> Result<()> {
        let node = &self.types[id.0];

        if !node.interfaces.is_empty() {
            let mut own: FxHashMap<(&str, &MethodSig), MethodId> = FxHashMap::default();
            for &method in &node.methods {
                let m = &self.methods[method.0];
                if m.is_public() && m.is_virtual() && m.is_new_slot() {
                    own.insert((m.name.as_str(), &m.signature), method);
                }
            }

            for iface in &node.interfaces {
                for (iface_method, class_method) in self.match_interface(iface, &own) {
                    map.add_method(&iface.sig, iface_method, class_method)?;
                }
            }
        }

        let mut most_derived: FxHashMap<(&str, &MethodSig), MethodId> = FxHashMap::default();
        for instances in node.dispatch.slots.slots() {
            if let Some(inst) = instances
                .iter()
                .rev()
                .find(|inst| self.methods[inst.method.0].is_public())
            {
                most_derived.insert((inst.name.as_str(), &inst.signature), inst.method);
            }
        }

        for iface in &node.dispatch.all_interfaces {
            for (iface_method, class_method) in self.match_interface(iface, &most_derived) {
                map.add_method_if_empty(&iface.sig, iface_method, class_method)?;
            }
        }

        let mut declared: FxHashMap<(&TypeSig, &str, &MethodSig), MethodId> = FxHashMap::default();
        for iface in &node.dispatch.all_interfaces {
            for &method in &self.types[iface.node.0].methods {
                let m = &self.methods[method.0];
                if m.is_virtual() {
                    declared.insert((&iface.sig, m.name.as_str(), &m.signature), method);
                }
            }
        }

        for &method in &node.methods {
            let m = &self.methods[method.0];
            if !m.is_virtual() {
                continue;
            }

            for decl in &m.overrides {
                let key = (&decl.declaring_type, decl.name.as_str(), &decl.signature);
                if let Some(&iface_method) = declared.get(&key) {
                    map.add_method(&decl.declaring_type, iface_method, method)?;
                }
            }
        }

        Ok(())
    }

    fn resolved_base_classes(&mut self, id: TypeId) -> bool {
        if let Some(resolved) = self.types[id.0].dispatch.resolved_base_classes {
            return resolved;
        }
        self.types[id.0].dispatch.resolved_base_classes = Some(true);

        let node = &self.types[id.0];
        let resolved = if !node.declares_base {
            true
        } else {
            match node.base.as_ref().map(|base| base.node) {
                Some(base) => self.resolved_base_classes(base),
                None => false,
            }
        };

        self.types[id.0].dispatch.resolved_base_classes = Some(resolved);
        resolved
    }

    fn resolved_all_interfaces(&mut self, id: TypeId) -> bool {
        if let Some(resolved) = self.types[id.0].dispatch.resolved_all_interfaces {
            return resolved;
        }
        self.types[id.0].dispatch.resolved_all_interfaces = Some(true);

        let node = &self.types[id.0];
        let resolved = node.declared_interfaces == node.interfaces.len() && {
            let interfaces: Vec<TypeId> = node.interfaces.iter().map(|iface| iface.node).collect();
            interfaces
                .into_iter()
                .all(|iface| self.resolved_all_interfaces(iface))
        };

        self.types[id.0].dispatch.resolved_all_interfaces = Some(resolved);
        resolved
    }

    fn report_unresolved(&mut self, id: TypeId, log: &EventLog) {
        let node = &self.types[id.0];
        if node.interface || !node.is_renamable() {
            return;
        }

        let unresolved = node
            .dispatch
            .interface_map
            .entries()
            .filter(|(iface_method, class_method)| {
                class_method.is_none() && self.methods[iface_method.0].is_virtual()
            })
            .count();
        if unresolved == 0 {
            return;
        }

        if !self.resolved_all_interfaces(id) || !self.resolved_base_classes(id) {
            return;
        }

        log.record(EventKind::InterfaceUnresolved)
            .token(self.types[id.0].token)
            .message(format!("{unresolved} interface method(s) without implementation"));
    }

    /// Returns the class method implementing `iface_method` in type `ty`.
    ///
    /// Only meaningful after [`DispatchGraph::group_methods`].
    #[must_use]
    pub fn implementation_of(&self, ty: TypeId, iface_method: MethodId) -> Option<MethodId> {
        self.types[ty.0]
            .dispatch
            .interface_map
            .entries()
            .find(|&(m, class_method)| m == iface_method && class_method.is_some())
            .and_then(|(_, class_method)| class_method)
    }

    /// Returns all interfaces `ty` implements, directly or through its ancestors, as
    /// seen from `ty`.
    ///
    /// Only meaningful after [`DispatchGraph::group_methods`].
    #[must_use]
    pub fn all_interfaces(&self, ty: TypeId) -> &[TypeRef] {
        &self.types[ty.0].dispatch.all_interfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::{MethodAttributes, TypeAttributes},
        members::{MethodDef, MethodOverride},
        module::Module,
        token::Token,
        typedef::TypeDef,
    };

    const IFACE: TypeAttributes = TypeAttributes::PUBLIC
        .union(TypeAttributes::INTERFACE)
        .union(TypeAttributes::ABSTRACT);

    fn void() -> MethodSig {
        MethodSig::instance(TypeSig::Void, vec![])
    }

    fn abstract_method(name: &str) -> MethodDef {
        MethodDef::new(
            name,
            MethodAttributes::PUBLIC
                | MethodAttributes::VIRTUAL
                | MethodAttributes::NEW_SLOT
                | MethodAttributes::ABSTRACT,
            void(),
        )
    }

    fn new_slot(name: &str) -> MethodDef {
        MethodDef::new(
            name,
            MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL | MethodAttributes::NEW_SLOT,
            void(),
        )
    }

    fn override_of(name: &str) -> MethodDef {
        MethodDef::new(name, MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL, void())
    }

    fn with_object() -> Module {
        let mut module = Module::new("test.dll");
        module.add_type(TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference());
        module
    }

    fn ids(graph: &DispatchGraph, tokens: &[Token]) -> Vec<MethodId> {
        tokens.iter().map(|&t| graph.method_id(t).unwrap()).collect()
    }

    #[test]
    fn test_three_level_hierarchy_is_one_group() -> Result<()> {
        let mut module = with_object();
        let iface = module.add_type(TypeDef::new("Ns", "IRun", IFACE));
        let base = module.add_type(
            TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IRun")),
        );
        let derived = module.add_type(
            TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("Ns.Base")),
        );

        let i_run = module.add_method(iface, abstract_method("Run"))?;
        let b_run = module.add_method(base, new_slot("Run"))?;
        let d_run = module.add_method(derived, override_of("Run"))?;

        let mut graph = DispatchGraph::build(&module)?;
        let groups = graph.group_methods(&EventLog::new())?;
        let m = ids(&graph, &[i_run, b_run, d_run]);

        assert!(groups.are_same(m[0], m[1]));
        assert!(groups.are_same(m[1], m[2]));
        assert_eq!(groups.group_of(m[0]).unwrap().count(), 3);
        assert_eq!(groups.len(), 1);
        Ok(())
    }

    #[test]
    fn test_interface_priority() -> Result<()> {
        let mut module = with_object();
        let iface = module.add_type(TypeDef::new("Ns", "IFace", IFACE));
        let class = module.add_type(
            TypeDef::new("Ns", "Impl", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IFace")),
        );

        let i_foo = module.add_method(iface, abstract_method("Foo"))?;
        let i_baz = module.add_method(iface, abstract_method("Baz"))?;
        let c_foo = module.add_method(class, new_slot("Foo"))?;
        let c_bar = module.add_method(
            class,
            MethodDef::new(
                "Bar",
                MethodAttributes::PRIVATE
                    | MethodAttributes::VIRTUAL
                    | MethodAttributes::NEW_SLOT
                    | MethodAttributes::FINAL,
                void(),
            )
            .with_override(MethodOverride::new(TypeSig::class("Ns.IFace"), "Baz", void())),
        )?;

        let mut graph = DispatchGraph::build(&module)?;
        let log = EventLog::new();
        let groups = graph.group_methods(&log)?;
        let m = ids(&graph, &[i_foo, i_baz, c_foo, c_bar]);
        let class = graph.type_id(class).unwrap();

        assert_eq!(graph.implementation_of(class, m[0]), Some(m[2]));
        assert_eq!(graph.implementation_of(class, m[1]), Some(m[3]));
        assert!(groups.are_same(m[0], m[2]));
        assert!(!groups.are_same(m[1], m[3]));
        assert!(log.is_empty());
        Ok(())
    }

    #[test]
    fn test_generic_base_substitution() -> Result<()> {
        let mut module = with_object();
        let base = module.add_type(
            TypeDef::new("Ns", "Box`1", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_generic_params(1),
        );
        let derived = module.add_type(
            TypeDef::new("Ns", "IntBox", TypeAttributes::PUBLIC).with_base(TypeSig::generic_inst(
                TypeSig::class("Ns.Box`1"),
                vec![TypeSig::I4],
            )),
        );

        let b_put = module.add_method(
            base,
            MethodDef::new(
                "Put",
                MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL | MethodAttributes::NEW_SLOT,
                MethodSig::instance(TypeSig::Void, vec![TypeSig::Var(0)]),
            ),
        )?;
        let d_put = module.add_method(
            derived,
            MethodDef::new(
                "Put",
                MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL,
                MethodSig::instance(TypeSig::Void, vec![TypeSig::I4]),
            ),
        )?;

        let mut graph = DispatchGraph::build(&module)?;
        let groups = graph.group_methods(&EventLog::new())?;
        let m = ids(&graph, &[b_put, d_put]);
        assert!(groups.are_same(m[0], m[1]));
        Ok(())
    }

    #[test]
    fn test_new_slot_starts_new_group() -> Result<()> {
        let mut module = with_object();
        let iface = module.add_type(TypeDef::new("Ns", "IRun", IFACE));
        let base = module.add_type(
            TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IRun")),
        );
        let derived = module.add_type(
            TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("Ns.Base")),
        );

        let i_run = module.add_method(iface, abstract_method("Run"))?;
        let b_run = module.add_method(base, new_slot("Run"))?;
        let d_run = module.add_method(derived, new_slot("Run"))?;

        let mut graph = DispatchGraph::build(&module)?;
        let groups = graph.group_methods(&EventLog::new())?;
        let m = ids(&graph, &[i_run, b_run, d_run]);
        let derived = graph.type_id(derived).unwrap();

        assert!(groups.are_same(m[0], m[1]));
        assert!(!groups.are_same(m[1], m[2]));
        assert_eq!(graph.implementation_of(derived, m[0]), Some(m[1]));
        assert_eq!(graph.all_interfaces(derived).len(), 1);
        Ok(())
    }

    #[test]
    fn test_unresolved_slots() -> Result<()> {
        let mut module = with_object();
        let iface = module.add_type(TypeDef::new("Ns", "IFace", IFACE));
        let partial = module.add_type(
            TypeDef::new("Ns", "Partial", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IFace")),
        );
        let external = module.add_type(
            TypeDef::new("Ns", "External", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IFace"))
                .with_interface(TypeSig::class("Ext.IMissing")),
        );

        module.add_method(iface, abstract_method("Foo"))?;
        module.add_method(iface, abstract_method("Baz"))?;
        module.add_method(partial, new_slot("Foo"))?;
        module.add_method(external, new_slot("Foo"))?;

        let mut graph = DispatchGraph::build(&module)?;
        let log = EventLog::new();
        graph.group_methods(&log)?;

        assert_eq!(log.count_kind(EventKind::InterfaceUnresolved), 1);
        let event = log.iter().next().unwrap();
        assert_eq!(event.token, Some(partial));
        assert!(!log.has_errors());
        Ok(())
    }

    #[test]
    fn test_cyclic_base_terminates() -> Result<()> {
        let mut module = with_object();
        let a = module.add_type(
            TypeDef::new("Ns", "A", TypeAttributes::PUBLIC).with_base(TypeSig::class("Ns.B")),
        );
        let b = module.add_type(
            TypeDef::new("Ns", "B", TypeAttributes::PUBLIC).with_base(TypeSig::class("Ns.A")),
        );
        module.add_method(a, new_slot("Run"))?;
        module.add_method(b, override_of("Run"))?;

        let mut graph = DispatchGraph::build(&module)?;
        let groups = graph.group_methods(&EventLog::new())?;
        assert_eq!(groups.len(), 2);
        Ok(())
    }

    #[test]
    fn test_override_of_unimplemented_interface() -> Result<()> {
        let mut module = with_object();
        let iface = module.add_type(TypeDef::new("Ns", "IFace", IFACE));
        let class = module.add_type(
            TypeDef::new("Ns", "Impl", TypeAttributes::PUBLIC).with_base(TypeSig::Object),
        );
        module.add_method(iface, abstract_method("Foo"))?;
        module.add_method(
            class,
            new_slot("Bar")
                .with_override(MethodOverride::new(TypeSig::class("Ns.IFace"), "Foo", void())),
        )?;

        // not an interface override, the type does not implement IFace
        let mut graph = DispatchGraph::build(&module)?;
        let groups = graph.group_methods(&EventLog::new())?;
        assert_eq!(groups.len(), 2);
        Ok(())
    }
}
