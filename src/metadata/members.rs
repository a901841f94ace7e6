//! Fields, methods, properties and events of a declared type.

use crate::metadata::{
    flags::{FieldAttributes, MemberAccess, MethodAttributes},
    signatures::{MethodSig, TypeSig},
    token::Token,
};

/// The parts of a method body the structural matchers look at.
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Number of exception handling clauses
    pub exception_handlers: usize,
    /// Types of the local variables, in slot order
    pub locals: Vec<TypeSig>,
    /// String literals loaded by the body (`ldstr` operands)
    pub strings: Vec<String>,
    /// `MethodDef` tokens of the methods called by the body, in call order
    pub calls: Vec<Token>,
}

impl MethodBody {
    /// Creates an empty body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a local variable
    #[must_use]
    pub fn with_local(mut self, local: TypeSig) -> Self {
        self.locals.push(local);
        self
    }

    /// Appends several local variables
    #[must_use]
    pub fn with_locals(mut self, locals: impl IntoIterator<Item = TypeSig>) -> Self {
        self.locals.extend(locals);
        self
    }

    /// Appends a string literal
    #[must_use]
    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.strings.push(value.into());
        self
    }

    /// Appends a call to `method`
    #[must_use]
    pub fn with_call(mut self, method: Token) -> Self {
        self.calls.push(method);
        self
    }

    /// Sets the number of exception handling clauses
    #[must_use]
    pub fn with_exception_handlers(mut self, count: usize) -> Self {
        self.exception_handlers = count;
        self
    }
}

/// An explicit override declaration (`MethodImpl` row).
///
/// The overridden method is named by its declaring type, name and signature exactly as
/// it appears in the metadata, i.e. with the generic parameters of the declaring type
/// left unsubstituted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodOverride {
    /// Declaring type of the overridden method
    pub declaring_type: TypeSig,
    /// Name of the overridden method
    pub name: String,
    /// Signature of the overridden method
    pub signature: MethodSig,
}

impl MethodOverride {
    /// Creates a new override declaration
    #[must_use]
    pub fn new(declaring_type: TypeSig, name: impl Into<String>, signature: MethodSig) -> Self {
        MethodOverride {
            declaring_type,
            name: name.into(),
            signature,
        }
    }
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Token, assigned when the method is added to a module
    pub token: Token,
    /// Method name
    pub name: String,
    /// Method attributes
    pub flags: MethodAttributes,
    /// Method signature
    pub signature: MethodSig,
    /// The type declaring this method
    pub declaring_type: Token,
    /// Explicit override declarations
    pub overrides: Vec<MethodOverride>,
    /// The body, `None` for abstract, runtime and P/Invoke methods
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Creates a new method without body
    #[must_use]
    pub fn new(name: impl Into<String>, flags: MethodAttributes, signature: MethodSig) -> Self {
        MethodDef {
            token: Token(0),
            name: name.into(),
            flags,
            signature,
            declaring_type: Token(0),
            overrides: Vec::new(),
            body: None,
        }
    }

    /// Sets the body
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends an explicit override declaration
    #[must_use]
    pub fn with_override(mut self, decl: MethodOverride) -> Self {
        self.overrides.push(decl);
        self
    }

    /// Returns true if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// Returns true if the method is virtual
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MethodAttributes::VIRTUAL)
    }

    /// Returns true if the method introduces a new vtable slot
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        self.flags.contains(MethodAttributes::NEW_SLOT)
    }

    /// Returns true if the method is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.access() == MemberAccess::Public
    }

    /// Returns true if the method has a body
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns true for instance and static constructors
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Token, assigned when the field is added to a module
    pub token: Token,
    /// Field name
    pub name: String,
    /// Field attributes
    pub flags: FieldAttributes,
    /// Field type
    pub field_type: TypeSig,
    /// The type declaring this field
    pub declaring_type: Token,
}

impl FieldDef {
    /// Creates a new field
    #[must_use]
    pub fn new(name: impl Into<String>, flags: FieldAttributes, field_type: TypeSig) -> Self {
        FieldDef {
            token: Token(0),
            name: name.into(),
            flags,
            field_type,
            declaring_type: Token(0),
        }
    }

    /// Returns true if the field is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldAttributes::STATIC)
    }
}

/// A declared property.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Token, assigned when the property is added to a module
    pub token: Token,
    /// Property name
    pub name: String,
    /// Property type
    pub property_type: TypeSig,
    /// The getter, if any
    pub getter: Option<Token>,
    /// The setter, if any
    pub setter: Option<Token>,
    /// Additional accessor methods
    pub others: Vec<Token>,
    /// The type declaring this property
    pub declaring_type: Token,
}

impl PropertyDef {
    /// Creates a new property without accessors
    #[must_use]
    pub fn new(name: impl Into<String>, property_type: TypeSig) -> Self {
        PropertyDef {
            token: Token(0),
            name: name.into(),
            property_type,
            getter: None,
            setter: None,
            others: Vec::new(),
            declaring_type: Token(0),
        }
    }

    /// Sets the getter
    #[must_use]
    pub fn with_getter(mut self, getter: Token) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Sets the setter
    #[must_use]
    pub fn with_setter(mut self, setter: Token) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Returns all accessor methods: getter, setter, then the others
    #[must_use]
    pub fn accessors(&self) -> Vec<Token> {
        self.getter
            .into_iter()
            .chain(self.setter)
            .chain(self.others.iter().copied())
            .collect()
    }
}

/// A declared event.
#[derive(Debug, Clone)]
pub struct EventDef {
    /// Token, assigned when the event is added to a module
    pub token: Token,
    /// Event name
    pub name: String,
    /// Event handler type
    pub event_type: TypeSig,
    /// The add accessor, if any
    pub add: Option<Token>,
    /// The remove accessor, if any
    pub remove: Option<Token>,
    /// The raise accessor, if any
    pub raise: Option<Token>,
    /// Additional accessor methods
    pub others: Vec<Token>,
    /// The type declaring this event
    pub declaring_type: Token,
}

impl EventDef {
    /// Creates a new event without accessors
    #[must_use]
    pub fn new(name: impl Into<String>, event_type: TypeSig) -> Self {
        EventDef {
            token: Token(0),
            name: name.into(),
            event_type,
            add: None,
            remove: None,
            raise: None,
            others: Vec::new(),
            declaring_type: Token(0),
        }
    }

    /// Sets the add accessor
    #[must_use]
    pub fn with_add(mut self, add: Token) -> Self {
        self.add = Some(add);
        self
    }

    /// Sets the remove accessor
    #[must_use]
    pub fn with_remove(mut self, remove: Token) -> Self {
        self.remove = Some(remove);
        self
    }

    /// Sets the raise accessor
    #[must_use]
    pub fn with_raise(mut self, raise: Token) -> Self {
        self.raise = Some(raise);
        self
    }

    /// Returns all accessor methods: add, remove, raise, then the others
    #[must_use]
    pub fn accessors(&self) -> Vec<Token> {
        self.add
            .into_iter()
            .chain(self.remove)
            .chain(self.raise)
            .chain(self.others.iter().copied())
            .collect()
    }
}
