//! The type hierarchy as an arena of nodes.
//!
//! [`DispatchGraph`] owns one node per declared type, method, property and event of a
//! [`Module`]. Nodes refer to each other through the index types [`TypeId`],
//! [`MethodId`], [`PropertyId`] and [`EventId`], never through references, so base
//! chains and interface lists can be cyclic in malformed input without any ownership
//! problem.
//!
//! Building the graph only resolves links and checks accessor linkage. The dispatch
//! analysis itself runs in [`DispatchGraph::group_methods`].

use rustc_hash::FxHashMap;

use crate::{
    deobfuscation::renamer::virtuals::DispatchState,
    metadata::{
        flags::MethodAttributes,
        members::MethodOverride,
        module::Module,
        signatures::{MethodSig, TypeSig},
        token::Token,
        typedef::{TypeDef, TypeOrigin},
    },
    Error, Result,
};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the node in its arena
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a [`TypeNode`]
    TypeId
);
arena_id!(
    /// Index of a [`MethodNode`]
    MethodId
);
arena_id!(
    /// Index of a [`PropertyNode`]
    PropertyId
);
arena_id!(
    /// Index of an [`EventNode`]
    EventId
);

/// A resolved type reference: the signature as written and the node it resolves to.
///
/// The signature carries the generic arguments the reference was made with, which the
/// dispatch analysis substitutes into inherited method signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// The reference as written
    pub sig: TypeSig,
    /// The declaration it resolves to
    pub node: TypeId,
}

impl TypeRef {
    /// Returns the generic arguments of the reference, empty if it is not an instantiation
    #[must_use]
    pub fn generic_args(&self) -> &[TypeSig] {
        self.sig.generic_args().unwrap_or(&[])
    }

    /// Rewrites the reference as seen through another reference with `args`
    #[must_use]
    pub fn substitute(&self, args: &[TypeSig]) -> TypeRef {
        TypeRef {
            sig: self.sig.substitute_type_args(args),
            node: self.node,
        }
    }
}

/// One declared type.
#[derive(Debug)]
pub struct TypeNode {
    /// Arena index
    pub id: TypeId,
    /// Declaration token
    pub token: Token,
    /// Simple name
    pub name: String,
    /// Declared in the module or reference-only
    pub origin: TypeOrigin,
    /// True for interfaces
    pub interface: bool,
    /// True if the declaration names a base type, resolvable or not
    pub declares_base: bool,
    /// Number of interfaces in the declaration, resolvable or not
    pub declared_interfaces: usize,
    /// Resolved base type
    pub base: Option<TypeRef>,
    /// Resolved directly implemented interfaces, in declaration order
    pub interfaces: Vec<TypeRef>,
    /// Types whose base is this type
    pub derived: Vec<TypeId>,
    /// Enclosing type of a nested type
    pub nesting: Option<TypeId>,
    /// Field tokens, in declaration order
    pub fields: Vec<Token>,
    /// Methods, in declaration order
    pub methods: Vec<MethodId>,
    /// Properties, declared ones first, then restored ones
    pub properties: Vec<PropertyId>,
    /// Events, declared ones first, then restored ones
    pub events: Vec<EventId>,
    pub(crate) dispatch: DispatchState,
}

impl TypeNode {
    /// Returns true if the type may be renamed
    #[must_use]
    pub fn is_renamable(&self) -> bool {
        self.origin == TypeOrigin::Defined
    }
}

/// One declared method.
#[derive(Debug)]
pub struct MethodNode {
    /// Arena index
    pub id: MethodId,
    /// Declaration token
    pub token: Token,
    /// Declaring type
    pub owner: TypeId,
    /// Name
    pub name: String,
    /// Method attributes
    pub flags: MethodAttributes,
    /// Signature as declared
    pub signature: MethodSig,
    /// Explicit override declarations
    pub overrides: Vec<MethodOverride>,
    /// The property this method is an accessor of
    pub property: Option<PropertyId>,
    /// The event this method is an accessor of
    pub event: Option<EventId>,
}

impl MethodNode {
    /// Returns true if the method is virtual
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MethodAttributes::VIRTUAL)
    }

    /// Returns true if the method introduces a new dispatch slot
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        self.flags.contains(MethodAttributes::NEW_SLOT)
    }

    /// Returns true if the method is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.access() == crate::metadata::flags::MemberAccess::Public
    }

    /// Returns true if the method is an accessor of a property or an event
    #[must_use]
    pub fn is_accessor(&self) -> bool {
        self.property.is_some() || self.event.is_some()
    }
}

/// The role of a method in its property or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum AccessorKind {
    /// Property getter
    Getter,
    /// Property setter
    Setter,
    /// Event add accessor
    Adder,
    /// Event remove accessor
    Remover,
    /// Event raise accessor
    Raiser,
    /// Any other accessor
    Other,
}

impl AccessorKind {
    /// Returns the name prefix compilers use for this accessor kind
    #[must_use]
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            AccessorKind::Getter => Some("get_"),
            AccessorKind::Setter => Some("set_"),
            AccessorKind::Adder => Some("add_"),
            AccessorKind::Remover => Some("remove_"),
            AccessorKind::Raiser => Some("raise_"),
            AccessorKind::Other => None,
        }
    }
}

/// A declared or restored property.
#[derive(Debug)]
pub struct PropertyNode {
    /// Arena index
    pub id: PropertyId,
    /// Declaration token, `None` for restored properties
    pub token: Option<Token>,
    /// Name
    pub name: String,
    /// Declaring type
    pub owner: TypeId,
    /// Getter
    pub getter: Option<MethodId>,
    /// Setter
    pub setter: Option<MethodId>,
    /// Other accessors
    pub others: Vec<MethodId>,
}

impl PropertyNode {
    /// Iterates over all accessors, getter and setter first
    pub fn accessors(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.getter
            .into_iter()
            .chain(self.setter)
            .chain(self.others.iter().copied())
    }

    /// Returns the role of `method` in this property
    #[must_use]
    pub fn accessor_kind(&self, method: MethodId) -> Option<AccessorKind> {
        if self.getter == Some(method) {
            Some(AccessorKind::Getter)
        } else if self.setter == Some(method) {
            Some(AccessorKind::Setter)
        } else if self.others.contains(&method) {
            Some(AccessorKind::Other)
        } else {
            None
        }
    }
}

/// A declared or restored event.
#[derive(Debug)]
pub struct EventNode {
    /// Arena index
    pub id: EventId,
    /// Declaration token, `None` for restored events
    pub token: Option<Token>,
    /// Name
    pub name: String,
    /// Declaring type
    pub owner: TypeId,
    /// Add accessor
    pub add: Option<MethodId>,
    /// Remove accessor
    pub remove: Option<MethodId>,
    /// Raise accessor
    pub raise: Option<MethodId>,
    /// Other accessors
    pub others: Vec<MethodId>,
}

impl EventNode {
    /// Iterates over all accessors, add, remove and raise first
    pub fn accessors(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.add
            .into_iter()
            .chain(self.remove)
            .chain(self.raise)
            .chain(self.others.iter().copied())
    }

    /// Returns the role of `method` in this event
    #[must_use]
    pub fn accessor_kind(&self, method: MethodId) -> Option<AccessorKind> {
        if self.add == Some(method) {
            Some(AccessorKind::Adder)
        } else if self.remove == Some(method) {
            Some(AccessorKind::Remover)
        } else if self.raise == Some(method) {
            Some(AccessorKind::Raiser)
        } else if self.others.contains(&method) {
            Some(AccessorKind::Other)
        } else {
            None
        }
    }
}

/// The type hierarchy of one module.
pub struct DispatchGraph<'a> {
    module: &'a Module,
    pub(crate) types: Vec<TypeNode>,
    pub(crate) methods: Vec<MethodNode>,
    pub(crate) properties: Vec<PropertyNode>,
    pub(crate) events: Vec<EventNode>,
    type_index: FxHashMap<Token, TypeId>,
    method_index: FxHashMap<Token, MethodId>,
}

impl<'a> DispatchGraph<'a> {
    /// Builds the graph of all types of `module`.
    ///
    /// Base types and interfaces that do not resolve to a declaration of the module are
    /// dropped from the node, the declaration counts are kept so the dispatch analysis
    /// can tell a fully resolved type from a partially resolved one.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a member token does not exist, or if a property
    /// or event accessor is not a method of the declaring type.
    pub fn build(module: &'a Module) -> Result<Self> {
        let mut graph = DispatchGraph {
            module,
            types: Vec::with_capacity(module.types().len()),
            methods: Vec::with_capacity(module.methods().len()),
            properties: Vec::with_capacity(module.properties().len()),
            events: Vec::with_capacity(module.events().len()),
            type_index: FxHashMap::default(),
            method_index: FxHashMap::default(),
        };

        for ty in module.types() {
            graph.add_type_node(ty);
        }

        for ty in module.types() {
            graph.link_type(ty);
        }

        for ty in module.types() {
            graph.add_members(ty)?;
        }

        Ok(graph)
    }

    fn add_type_node(&mut self, ty: &TypeDef) {
        let id = TypeId(self.types.len());
        self.type_index.insert(ty.token, id);
        self.types.push(TypeNode {
            id,
            token: ty.token,
            name: ty.name.clone(),
            origin: ty.origin,
            interface: ty.is_interface(),
            declares_base: ty.base.is_some(),
            declared_interfaces: ty.interfaces.len(),
            base: None,
            interfaces: Vec::new(),
            derived: Vec::new(),
            nesting: None,
            fields: ty.fields.clone(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            dispatch: DispatchState::default(),
        });
    }

    fn resolve(&self, sig: &TypeSig) -> Option<TypeRef> {
        let token = self.module.resolve_type(sig)?;
        let node = *self.type_index.get(&token)?;
        Some(TypeRef {
            sig: sig.clone(),
            node,
        })
    }

    fn link_type(&mut self, ty: &TypeDef) {
        let Some(&id) = self.type_index.get(&ty.token) else {
            return;
        };

        let base = ty.base.as_ref().and_then(|sig| self.resolve(sig));
        let interfaces: Vec<TypeRef> = ty
            .interfaces
            .iter()
            .filter_map(|sig| self.resolve(sig))
            .collect();
        let nesting = ty
            .enclosing
            .and_then(|token| self.type_index.get(&token).copied());

        if let Some(base) = &base {
            self.types[base.node.0].derived.push(id);
        }

        let node = &mut self.types[id.0];
        node.base = base;
        node.interfaces = interfaces;
        node.nesting = nesting;
    }

    fn add_members(&mut self, ty: &TypeDef) -> Result<()> {
        let Some(&owner) = self.type_index.get(&ty.token) else {
            return Ok(());
        };

        for &token in &ty.methods {
            let method = self
                .module
                .method(token)
                .ok_or_else(|| {
                    invariant_error!("Type {} lists unknown method {}", ty.token, token)
                })?;

            let id = MethodId(self.methods.len());
            self.method_index.insert(token, id);
            self.methods.push(MethodNode {
                id,
                token,
                owner,
                name: method.name.clone(),
                flags: method.flags,
                signature: method.signature.clone(),
                overrides: method.overrides.clone(),
                property: None,
                event: None,
            });
            self.types[owner.0].methods.push(id);
        }

        for &token in &ty.properties {
            let property = self.module.property(token).ok_or_else(|| {
                invariant_error!("Type {} lists unknown property {}", ty.token, token)
            })?;

            let getter = property
                .getter
                .map(|m| self.owned_accessor(owner, token, m))
                .transpose()?;
            let setter = property
                .setter
                .map(|m| self.owned_accessor(owner, token, m))
                .transpose()?;
            let others = property
                .others
                .iter()
                .map(|&m| self.owned_accessor(owner, token, m))
                .collect::<Result<Vec<_>>>()?;

            let id = PropertyId(self.properties.len());
            self.properties.push(PropertyNode {
                id,
                token: Some(token),
                name: property.name.clone(),
                owner,
                getter,
                setter,
                others,
            });
            self.types[owner.0].properties.push(id);
            self.link_property(id);
        }

        for &token in &ty.events {
            let event = self
                .module
                .event(token)
                .ok_or_else(|| {
                    invariant_error!("Type {} lists unknown event {}", ty.token, token)
                })?;

            let accessor = |m: Option<Token>| {
                m.map(|m| self.owned_accessor(owner, token, m)).transpose()
            };
            let add = accessor(event.add)?;
            let remove = accessor(event.remove)?;
            let raise = accessor(event.raise)?;
            let others = event
                .others
                .iter()
                .map(|&m| self.owned_accessor(owner, token, m))
                .collect::<Result<Vec<_>>>()?;

            let id = EventId(self.events.len());
            self.events.push(EventNode {
                id,
                token: Some(token),
                name: event.name.clone(),
                owner,
                add,
                remove,
                raise,
                others,
            });
            self.types[owner.0].events.push(id);
            self.link_event(id);
        }

        Ok(())
    }

    /// Resolves an accessor token, which must be a method of `owner`.
    fn owned_accessor(&self, owner: TypeId, member: Token, method: Token) -> Result<MethodId> {
        match self.method_index.get(&method) {
            Some(&id) if self.methods[id.0].owner == owner => Ok(id),
            _ => Err(invariant_error!(
                "{} references method {} which is not a method of type {}",
                member,
                method,
                self.types[owner.0].token
            )),
        }
    }

    fn link_property(&mut self, id: PropertyId) {
        let accessors: Vec<MethodId> = self.properties[id.0].accessors().collect();
        for method in accessors {
            let method = &mut self.methods[method.0];
            if method.property.is_none() {
                method.property = Some(id);
            }
        }
    }

    fn link_event(&mut self, id: EventId) {
        let accessors: Vec<MethodId> = self.events[id.0].accessors().collect();
        for method in accessors {
            let method = &mut self.methods[method.0];
            if method.event.is_none() {
                method.event = Some(id);
            }
        }
    }

    /// The module the graph was built from
    #[must_use]
    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// The declaration of a type node
    #[must_use]
    pub fn type_def(&self, id: TypeId) -> Option<&'a TypeDef> {
        self.module.type_def(self.types.get(id.0)?.token)
    }

    /// All type nodes, in declaration order
    #[must_use]
    pub fn types(&self) -> &[TypeNode] {
        &self.types
    }

    /// All method nodes, grouped by declaring type
    #[must_use]
    pub fn methods(&self) -> &[MethodNode] {
        &self.methods
    }

    /// All property nodes, restored ones last
    #[must_use]
    pub fn properties(&self) -> &[PropertyNode] {
        &self.properties
    }

    /// All event nodes, restored ones last
    #[must_use]
    pub fn events(&self) -> &[EventNode] {
        &self.events
    }

    /// Returns a type node
    #[must_use]
    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }

    /// Returns a method node
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodNode {
        &self.methods[id.0]
    }

    /// Returns a property node
    #[must_use]
    pub fn property(&self, id: PropertyId) -> &PropertyNode {
        &self.properties[id.0]
    }

    /// Returns an event node
    #[must_use]
    pub fn event(&self, id: EventId) -> &EventNode {
        &self.events[id.0]
    }

    /// Looks up the node of a type token
    #[must_use]
    pub fn type_id(&self, token: Token) -> Option<TypeId> {
        self.type_index.get(&token).copied()
    }

    /// Looks up the node of a method token
    #[must_use]
    pub fn method_id(&self, token: Token) -> Option<MethodId> {
        self.method_index.get(&token).copied()
    }

    /// Returns true if the method's declaring type may be renamed
    #[must_use]
    pub fn is_renamable(&self, method: MethodId) -> bool {
        self.types[self.methods[method.0].owner.0].is_renamable()
    }

    /// Returns the role of a method in its property or event
    #[must_use]
    pub fn accessor_kind(&self, method: MethodId) -> Option<AccessorKind> {
        let node = &self.methods[method.0];
        if let Some(property) = node.property {
            return self.properties[property.0].accessor_kind(method);
        }
        node.event
            .and_then(|event| self.events[event.0].accessor_kind(method))
    }

    /// Finds a property of `owner` by name
    #[must_use]
    pub fn find_property(&self, owner: TypeId, name: &str) -> Option<PropertyId> {
        self.types[owner.0]
            .properties
            .iter()
            .copied()
            .find(|&p| self.properties[p.0].name == name)
    }

    /// Finds an event of `owner` by name
    #[must_use]
    pub fn find_event(&self, owner: TypeId, name: &str) -> Option<EventId> {
        self.types[owner.0]
            .events
            .iter()
            .copied()
            .find(|&e| self.events[e.0].name == name)
    }

    /// Creates a property without accessors on `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `owner` already has a property called `name`.
    pub fn create_property(&mut self, owner: TypeId, name: &str) -> Result<PropertyId> {
        if self.find_property(owner, name).is_some() {
            return Err(Error::AlreadyExists(format!(
                "property '{}' of type {}",
                name, self.types[owner.0].token
            )));
        }

        let id = PropertyId(self.properties.len());
        self.properties.push(PropertyNode {
            id,
            token: None,
            name: name.to_string(),
            owner,
            getter: None,
            setter: None,
            others: Vec::new(),
        });
        self.types[owner.0].properties.push(id);
        Ok(id)
    }

    /// Creates an event without accessors on `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `owner` already has an event called `name`.
    pub fn create_event(&mut self, owner: TypeId, name: &str) -> Result<EventId> {
        if self.find_event(owner, name).is_some() {
            return Err(Error::AlreadyExists(format!(
                "event '{}' of type {}",
                name, self.types[owner.0].token
            )));
        }

        let id = EventId(self.events.len());
        self.events.push(EventNode {
            id,
            token: None,
            name: name.to_string(),
            owner,
            add: None,
            remove: None,
            raise: None,
            others: Vec::new(),
        });
        self.types[owner.0].events.push(id);
        Ok(id)
    }

    /// Makes `method` the `kind` accessor of `property`.
    ///
    /// An occupied getter or setter slot is left alone.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the method is declared by another type, or if
    /// `kind` is an event accessor kind.
    pub fn add_property_accessor(
        &mut self,
        property: PropertyId,
        method: MethodId,
        kind: AccessorKind,
    ) -> Result<()> {
        let owner = self.properties[property.0].owner;
        if self.methods[method.0].owner != owner {
            return Err(invariant_error!(
                "Cannot attach method {} to property '{}' of another type",
                self.methods[method.0].token,
                self.properties[property.0].name
            ));
        }

        let node = &mut self.properties[property.0];
        match kind {
            AccessorKind::Getter => {
                node.getter.get_or_insert(method);
            }
            AccessorKind::Setter => {
                node.setter.get_or_insert(method);
            }
            AccessorKind::Other => node.others.push(method),
            _ => {
                return Err(invariant_error!(
                    "{} is not a property accessor kind",
                    kind
                ))
            }
        }

        self.link_property(property);
        Ok(())
    }

    /// Makes `method` the `kind` accessor of `event`.
    ///
    /// An occupied add, remove or raise slot is left alone.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the method is declared by another type, or if
    /// `kind` is a property accessor kind.
    pub fn add_event_accessor(
        &mut self,
        event: EventId,
        method: MethodId,
        kind: AccessorKind,
    ) -> Result<()> {
        let owner = self.events[event.0].owner;
        if self.methods[method.0].owner != owner {
            return Err(invariant_error!(
                "Cannot attach method {} to event '{}' of another type",
                self.methods[method.0].token,
                self.events[event.0].name
            ));
        }

        let node = &mut self.events[event.0];
        match kind {
            AccessorKind::Adder => {
                node.add.get_or_insert(method);
            }
            AccessorKind::Remover => {
                node.remove.get_or_insert(method);
            }
            AccessorKind::Raiser => {
                node.raise.get_or_insert(method);
            }
            AccessorKind::Other => node.others.push(method),
            _ => {
                return Err(invariant_error!(
                    "{} is not an event accessor kind",
                    kind
                ))
            }
        }

        self.link_event(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::TypeAttributes,
        members::{EventDef, MethodDef, PropertyDef},
    };

    fn getter(name: &str) -> MethodDef {
        MethodDef::new(
            name,
            MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
            MethodSig::instance(TypeSig::I4, vec![]),
        )
    }

    #[test]
    fn test_build_links_hierarchy() -> Result<()> {
        let mut module = Module::new("test.dll");
        let object = module.add_type(
            TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference(),
        );
        let iface = module.add_type(TypeDef::new(
            "Ns",
            "IRun",
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        ));
        let base = module.add_type(
            TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC)
                .with_base(TypeSig::Object)
                .with_interface(TypeSig::class("Ns.IRun"))
                .with_interface(TypeSig::class("Ext.IMissing")),
        );
        let derived = module.add_type(
            TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC)
                .with_base(TypeSig::class("Ns.Base")),
        );
        let nested = module.add_type(
            TypeDef::new("", "Inner", TypeAttributes::NESTED_PRIVATE).nested_in(derived),
        );

        let graph = DispatchGraph::build(&module)?;
        let base_id = graph.type_id(base).unwrap();
        let base_node = graph.type_node(base_id);

        assert_eq!(base_node.base.as_ref().map(|b| b.node), graph.type_id(object));
        assert_eq!(base_node.interfaces.len(), 1);
        assert_eq!(base_node.interfaces[0].node, graph.type_id(iface).unwrap());
        assert_eq!(base_node.declared_interfaces, 2);
        assert_eq!(base_node.derived, vec![graph.type_id(derived).unwrap()]);
        assert!(base_node.is_renamable());
        assert!(!graph.type_node(graph.type_id(object).unwrap()).is_renamable());
        assert_eq!(
            graph.type_node(graph.type_id(nested).unwrap()).nesting,
            graph.type_id(derived)
        );
        Ok(())
    }

    #[test]
    fn test_accessor_linking() -> Result<()> {
        let mut module = Module::new("test.dll");
        let ty = module.add_type(TypeDef::new("Ns", "A", TypeAttributes::PUBLIC));
        let get = module.add_method(ty, getter("get_Value"))?;
        let add = module.add_method(
            ty,
            MethodDef::new(
                "add_Changed",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![TypeSig::class("System.EventHandler")]),
            ),
        )?;
        module.add_property(ty, PropertyDef::new("Value", TypeSig::I4).with_getter(get))?;
        module.add_event(
            ty,
            EventDef::new("Changed", TypeSig::class("System.EventHandler")).with_add(add),
        )?;

        let graph = DispatchGraph::build(&module)?;
        let get = graph.method_id(get).unwrap();
        let add = graph.method_id(add).unwrap();

        assert_eq!(graph.accessor_kind(get), Some(AccessorKind::Getter));
        assert_eq!(graph.accessor_kind(add), Some(AccessorKind::Adder));
        assert_eq!(graph.properties()[0].accessors().collect::<Vec<_>>(), vec![get]);
        assert!(graph.method(get).is_accessor());
        Ok(())
    }

    #[test]
    fn test_accessor_of_other_type() -> Result<()> {
        let mut module = Module::new("test.dll");
        let a = module.add_type(TypeDef::new("Ns", "A", TypeAttributes::PUBLIC));
        let b = module.add_type(TypeDef::new("Ns", "B", TypeAttributes::PUBLIC));
        let get = module.add_method(a, getter("get_Value"))?;
        module.add_property(b, PropertyDef::new("Value", TypeSig::I4).with_getter(get))?;

        assert!(matches!(
            DispatchGraph::build(&module),
            Err(Error::InvariantViolation { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_create_property_twice() -> Result<()> {
        let mut module = Module::new("test.dll");
        let ty = module.add_type(TypeDef::new("Ns", "A", TypeAttributes::PUBLIC));
        let get = module.add_method(ty, getter("get_Value"))?;

        let mut graph = DispatchGraph::build(&module)?;
        let owner = graph.type_id(ty).unwrap();
        let get = graph.method_id(get).unwrap();

        let property = graph.create_property(owner, "Value")?;
        graph.add_property_accessor(property, get, AccessorKind::Getter)?;
        assert_eq!(graph.method(get).property, Some(property));
        assert!(graph.property(property).token.is_none());

        assert!(matches!(
            graph.create_property(owner, "Value"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            graph.add_property_accessor(property, get, AccessorKind::Adder),
            Err(Error::InvariantViolation { .. })
        ));

        let event = graph.create_event(owner, "Changed")?;
        assert!(matches!(
            graph.create_event(owner, "Changed"),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(graph.find_event(owner, "Changed"), Some(event));
        Ok(())
    }
}
