use crate::metadata::{flags::TypeAttributes, signatures::TypeSig, token::Token};

/// Where a type declaration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// Declared by the module being processed, renamable
    Defined,
    /// Loaded from a referenced assembly for hierarchy resolution only, never renamed
    Reference,
}

/// A declared type (class, struct, interface, enum, delegate).
///
/// Member lists hold tokens in declaration order. They are filled by
/// [`Module`](crate::metadata::module::Module) when members are added.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Token, assigned when the type is added to a module
    pub token: Token,
    /// `TypeNamespace` (empty for nested types and the global type)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Flags (a 4-byte bitmask of type `TypeAttributes`)
    pub flags: TypeAttributes,
    /// Declared in the module or loaded from a reference
    pub origin: TypeOrigin,
    /// The 'extends' reference, `None` for interfaces and `System.Object`
    pub base: Option<TypeSig>,
    /// Directly implemented interfaces, in declaration order
    pub interfaces: Vec<TypeSig>,
    /// The enclosing type of a nested type
    pub enclosing: Option<Token>,
    /// Number of generic parameters
    pub generic_params: u32,
    /// Fields of this type
    pub fields: Vec<Token>,
    /// Methods of this type
    pub methods: Vec<Token>,
    /// Properties of this type
    pub properties: Vec<Token>,
    /// Events of this type
    pub events: Vec<Token>,
}

impl TypeDef {
    /// Creates a new type declared by the module
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        flags: TypeAttributes,
    ) -> Self {
        TypeDef {
            token: Token(0),
            namespace: namespace.into(),
            name: name.into(),
            flags,
            origin: TypeOrigin::Defined,
            base: None,
            interfaces: Vec::new(),
            enclosing: None,
            generic_params: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Sets the base type
    #[must_use]
    pub fn with_base(mut self, base: TypeSig) -> Self {
        self.base = Some(base);
        self
    }

    /// Appends a directly implemented interface
    #[must_use]
    pub fn with_interface(mut self, iface: TypeSig) -> Self {
        self.interfaces.push(iface);
        self
    }

    /// Marks the type as reference-only
    #[must_use]
    pub fn reference(mut self) -> Self {
        self.origin = TypeOrigin::Reference;
        self
    }

    /// Nests the type inside `enclosing`
    #[must_use]
    pub fn nested_in(mut self, enclosing: Token) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    /// Sets the number of generic parameters
    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_params = count;
        self
    }

    /// Returns true if the module being processed owns this declaration
    #[must_use]
    pub fn has_module(&self) -> bool {
        self.origin == TypeOrigin::Defined
    }

    /// Returns true if the type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    /// Returns the full name of the base type, if any
    #[must_use]
    pub fn base_name(&self) -> Option<String> {
        self.base.as_ref().map(|base| base.definition().full_name())
    }

    /// Returns the simple name of the base type, without namespace or generic arity
    #[must_use]
    pub fn base_simple_name(&self) -> Option<String> {
        self.base_name().map(|full| {
            let simple = full.rsplit(|c| c == '.' || c == '/').next().unwrap_or(&full);
            simple.split('`').next().unwrap_or(simple).to_string()
        })
    }

    /// Returns true if the type derives directly from `System.Object` or has no base
    #[must_use]
    pub fn derives_from_object(&self) -> bool {
        match &self.base {
            None => !self.is_interface(),
            Some(base) => *base == TypeSig::Object,
        }
    }

    /// Returns true for enumerations
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.base_name().as_deref() == Some("System.Enum")
    }

    /// Returns true for value types, enumerations included
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.is_enum() || self.base_name().as_deref() == Some("System.ValueType")
    }

    /// Returns true for delegates
    #[must_use]
    pub fn is_delegate(&self) -> bool {
        matches!(
            self.base_name().as_deref(),
            Some("System.Delegate" | "System.MulticastDelegate")
        )
    }
}
