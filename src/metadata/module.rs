//! The in-memory module registry.
//!
//! [`Module`] owns every declaration of one loaded module in flat, token-indexed tables.
//! Container loaders fill it, the deobfuscation passes only read from it. Row `n` of a
//! table lives at index `n - 1`, so token lookups are constant time.
//!
//! Besides plain lookups the module answers the three questions the structural matchers
//! need from a metadata collaborator:
//!
//! - [`Module::resolve_type`] - resolves a signature to a declaration, or `None` for an
//!   unresolved external
//! - [`Module::is_method`] - the "does method M have return type R and parameters P" predicate
//! - [`Module::called_methods`] - the call-graph query of a method body
//!
//! # Example
//!
//! ```rust
//! use reactorscope::metadata::{
//!     flags::{MethodAttributes, TypeAttributes},
//!     members::MethodDef,
//!     module::Module,
//!     signatures::{MethodSig, TypeSig},
//!     typedef::TypeDef,
//! };
//!
//! let mut module = Module::new("sample.dll");
//! let ty = module.add_type(TypeDef::new("Ns", "Worker", TypeAttributes::PUBLIC).with_base(TypeSig::Object));
//! let run = module.add_method(
//!     ty,
//!     MethodDef::new("Run", MethodAttributes::PUBLIC, MethodSig::instance(TypeSig::Void, vec![])),
//! )?;
//!
//! assert!(module.is_method(run, "System.Void", "()"));
//! assert_eq!(module.resolve_type(&TypeSig::class("Ns.Worker")), Some(ty));
//! # Ok::<(), reactorscope::Error>(())
//! ```

use rustc_hash::FxHashMap;

use crate::{
    metadata::{
        members::{EventDef, FieldDef, MethodDef, PropertyDef},
        resources::EmbeddedResource,
        signatures::TypeSig,
        token::Token,
        typedef::TypeDef,
    },
    Result,
};

/// A loaded module and all of its declarations.
#[derive(Debug, Default)]
pub struct Module {
    /// Module name, used to identify the module in diagnostics
    pub name: String,
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    events: Vec<EventDef>,
    resources: Vec<EmbeddedResource>,
    type_index: FxHashMap<String, Token>,
}

fn row_index(token: Token, table: u8) -> Option<usize> {
    if token.table() != table || token.row() == 0 {
        return None;
    }
    Some(token.row() as usize - 1)
}

fn next_token(table: u8, len: usize) -> Token {
    Token::from_parts(table, len as u32 + 1)
}

impl Module {
    /// Creates an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a type and returns its token.
    ///
    /// Nested types must be added after their enclosing type, the full name used for
    /// resolution is `Enclosing/Name`.
    pub fn add_type(&mut self, mut ty: TypeDef) -> Token {
        let token = next_token(Token::TYPE_DEF, self.types.len());
        ty.token = token;

        let full_name = self.full_name(&ty);
        self.type_index.entry(full_name).or_insert(token);
        self.types.push(ty);
        token
    }

    /// Adds a method to `owner` and returns its token.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `owner` is not a type of this module.
    pub fn add_method(&mut self, owner: Token, mut method: MethodDef) -> Result<Token> {
        let token = next_token(Token::METHOD_DEF, self.methods.len());
        let ty = self.type_def_mut(owner)?;
        ty.methods.push(token);

        method.token = token;
        method.declaring_type = owner;
        self.methods.push(method);
        Ok(token)
    }

    /// Adds a field to `owner` and returns its token.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `owner` is not a type of this module.
    pub fn add_field(&mut self, owner: Token, mut field: FieldDef) -> Result<Token> {
        let token = next_token(Token::FIELD, self.fields.len());
        let ty = self.type_def_mut(owner)?;
        ty.fields.push(token);

        field.token = token;
        field.declaring_type = owner;
        self.fields.push(field);
        Ok(token)
    }

    /// Adds a property to `owner` and returns its token.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `owner` is not a type of this module.
    pub fn add_property(&mut self, owner: Token, mut property: PropertyDef) -> Result<Token> {
        let token = next_token(Token::PROPERTY, self.properties.len());
        let ty = self.type_def_mut(owner)?;
        ty.properties.push(token);

        property.token = token;
        property.declaring_type = owner;
        self.properties.push(property);
        Ok(token)
    }

    /// Adds an event to `owner` and returns its token.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `owner` is not a type of this module.
    pub fn add_event(&mut self, owner: Token, mut event: EventDef) -> Result<Token> {
        let token = next_token(Token::EVENT, self.events.len());
        let ty = self.type_def_mut(owner)?;
        ty.events.push(token);

        event.token = token;
        event.declaring_type = owner;
        self.events.push(event);
        Ok(token)
    }

    /// Adds an embedded resource and returns its token.
    pub fn add_resource(&mut self, mut resource: EmbeddedResource) -> Token {
        let token = next_token(Token::MANIFEST_RESOURCE, self.resources.len());
        resource.token = token;
        self.resources.push(resource);
        token
    }

    fn type_def_mut(&mut self, token: Token) -> Result<&mut TypeDef> {
        row_index(token, Token::TYPE_DEF)
            .and_then(|index| self.types.get_mut(index))
            .ok_or_else(|| invariant_error!("Type {} is not part of the module", token))
    }

    /// All types, in declaration order
    #[must_use]
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// All methods, in declaration order
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// All fields, in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// All properties, in declaration order
    #[must_use]
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// All events, in declaration order
    #[must_use]
    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    /// All embedded resources
    #[must_use]
    pub fn resources(&self) -> &[EmbeddedResource] {
        &self.resources
    }

    /// Looks up a type
    #[must_use]
    pub fn type_def(&self, token: Token) -> Option<&TypeDef> {
        row_index(token, Token::TYPE_DEF).and_then(|index| self.types.get(index))
    }

    /// Looks up a method
    #[must_use]
    pub fn method(&self, token: Token) -> Option<&MethodDef> {
        row_index(token, Token::METHOD_DEF).and_then(|index| self.methods.get(index))
    }

    /// Looks up a field
    #[must_use]
    pub fn field(&self, token: Token) -> Option<&FieldDef> {
        row_index(token, Token::FIELD).and_then(|index| self.fields.get(index))
    }

    /// Looks up a property
    #[must_use]
    pub fn property(&self, token: Token) -> Option<&PropertyDef> {
        row_index(token, Token::PROPERTY).and_then(|index| self.properties.get(index))
    }

    /// Looks up an event
    #[must_use]
    pub fn event(&self, token: Token) -> Option<&EventDef> {
        row_index(token, Token::EVENT).and_then(|index| self.events.get(index))
    }

    /// Looks up an embedded resource
    #[must_use]
    pub fn resource(&self, token: Token) -> Option<&EmbeddedResource> {
        row_index(token, Token::MANIFEST_RESOURCE).and_then(|index| self.resources.get(index))
    }

    /// Finds an embedded resource by name
    #[must_use]
    pub fn resource_by_name(&self, name: &str) -> Option<&EmbeddedResource> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    /// Returns the full name of a type, `Namespace.Name` or `Enclosing/Name` for nested types
    #[must_use]
    pub fn full_name(&self, ty: &TypeDef) -> String {
        match ty.enclosing.and_then(|enclosing| self.type_def(enclosing)) {
            Some(enclosing) => format!("{}/{}", self.full_name(enclosing), ty.name),
            None if ty.namespace.is_empty() => ty.name.clone(),
            None => format!("{}.{}", ty.namespace, ty.name),
        }
    }

    /// Resolves a type signature to a declaration of this module.
    ///
    /// Generic instantiations resolve to their generic type. Returns `None` for
    /// signatures naming a type that is not loaded (an unresolved external) and for
    /// signatures that do not name a type at all (generic parameters, arrays).
    #[must_use]
    pub fn resolve_type(&self, sig: &TypeSig) -> Option<Token> {
        match sig.definition() {
            TypeSig::SzArray(_) | TypeSig::ByRef(_) | TypeSig::Var(_) | TypeSig::MVar(_) => None,
            definition => self.type_index.get(&definition.full_name()).copied(),
        }
    }

    /// Returns true if `method` returns `ret` and takes exactly the `params` list.
    ///
    /// Both are given in textual form, e.g. `"System.Reflection.Assembly"` and
    /// `"(System.Object,System.ResolveEventArgs)"`.
    #[must_use]
    pub fn is_method(&self, method: Token, ret: &str, params: &str) -> bool {
        self.method(method).is_some_and(|method| {
            method.signature.ret.full_name() == ret && method.signature.params_string() == params
        })
    }

    /// Returns the methods of this module called by `method`, deduplicated, in first-call order.
    #[must_use]
    pub fn called_methods(&self, method: Token) -> Vec<Token> {
        let Some(body) = self.method(method).and_then(|m| m.body.as_ref()) else {
            return Vec::new();
        };

        let mut called = Vec::new();
        for callee in &body.calls {
            if self.method(*callee).is_some() && !called.contains(callee) {
                called.push(*callee);
            }
        }
        called
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::{FieldAttributes, MethodAttributes, TypeAttributes},
        members::MethodBody,
        signatures::MethodSig,
    };

    #[test]
    fn test_token_assignment() -> crate::Result<()> {
        let mut module = Module::new("test.dll");
        let a = module.add_type(TypeDef::new("Ns", "A", TypeAttributes::PUBLIC));
        let b = module.add_type(TypeDef::new("Ns", "B", TypeAttributes::PUBLIC));
        assert_eq!(a, Token(0x02000001));
        assert_eq!(b, Token(0x02000002));

        let m = module.add_method(
            b,
            MethodDef::new(
                "M",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        )?;
        let f = module.add_field(
            b,
            FieldDef::new("f", FieldAttributes::PRIVATE, TypeSig::Boolean),
        )?;
        assert_eq!(m, Token(0x06000001));
        assert_eq!(f, Token(0x04000001));

        let ty = module.type_def(b).unwrap();
        assert_eq!(ty.methods, vec![m]);
        assert_eq!(ty.fields, vec![f]);
        assert_eq!(module.method(m).unwrap().declaring_type, b);
        Ok(())
    }

    #[test]
    fn test_add_member_to_unknown_type() {
        let mut module = Module::new("test.dll");
        let result = module.add_method(
            Token(0x02000009),
            MethodDef::new(
                "M",
                MethodAttributes::PUBLIC,
                MethodSig::instance(TypeSig::Void, vec![]),
            ),
        );
        assert!(matches!(result, Err(crate::Error::InvariantViolation { .. })));
    }

    #[test]
    fn test_resolve_type() {
        let mut module = Module::new("test.dll");
        let object = module.add_type(
            TypeDef::new("System", "Object", TypeAttributes::PUBLIC).reference(),
        );
        let outer = module.add_type(TypeDef::new("Ns", "Outer", TypeAttributes::PUBLIC));
        let inner = module.add_type(
            TypeDef::new("", "Inner", TypeAttributes::NESTED_PUBLIC).nested_in(outer),
        );
        let generic = module.add_type(
            TypeDef::new("Ns", "Box`1", TypeAttributes::PUBLIC).with_generic_params(1),
        );

        assert_eq!(module.resolve_type(&TypeSig::Object), Some(object));
        assert_eq!(module.resolve_type(&TypeSig::class("Ns.Outer/Inner")), Some(inner));
        assert_eq!(
            module.resolve_type(
                &TypeSig::generic_inst(TypeSig::class("Ns.Box`1"), vec![TypeSig::I4]),
            ),
            Some(generic)
        );
        assert_eq!(module.resolve_type(&TypeSig::class("Other.Missing")), None);
        assert_eq!(module.resolve_type(&TypeSig::Var(0)), None);
    }

    #[test]
    fn test_called_methods() -> crate::Result<()> {
        let mut module = Module::new("test.dll");
        let ty = module.add_type(TypeDef::new("Ns", "A", TypeAttributes::PUBLIC));
        let callee = module.add_method(
            ty,
            MethodDef::new(
                "Init",
                MethodAttributes::STATIC,
                MethodSig::static_method(TypeSig::Void, vec![]),
            ),
        )?;
        let caller = module.add_method(
            ty,
            MethodDef::new(
                "Run",
                MethodAttributes::STATIC,
                MethodSig::static_method(TypeSig::Void, vec![]),
            )
            .with_body(
                    MethodBody::new()
                        .with_call(callee)
                        .with_call(Token(0x06000099))
                        .with_call(callee),
                ),
        )?;

        assert_eq!(module.called_methods(caller), vec![callee]);
        assert!(module.called_methods(callee).is_empty());
        assert!(module.is_method(callee, "System.Void", "()"));
        assert!(!module.is_method(callee, "System.Int32", "()"));
        Ok(())
    }
}
