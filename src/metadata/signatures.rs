//! Type and method signatures.
//!
//! [`TypeSig`] is the structural form of a type reference as it appears in field types,
//! method signatures, base types and interface lists. Named types are identified by their
//! full name, which is what the matching logic of this crate compares against
//! (`System.Boolean`, `System.String[]`, `System.Reflection.Assembly`, ...).
//!
//! Generic instantiations keep their arguments, so a signature seen through a
//! `Base<System.Int32>` reference can be rewritten with [`TypeSig::substitute_type_args`]
//! into the signature a derived type actually overrides.

use std::fmt;

/// A type reference inside a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeSig {
    /// `System.Void`
    Void,
    /// `System.Boolean`
    Boolean,
    /// `System.Char`
    Char,
    /// `System.SByte`
    I1,
    /// `System.Byte`
    U1,
    /// `System.Int16`
    I2,
    /// `System.UInt16`
    U2,
    /// `System.Int32`
    I4,
    /// `System.UInt32`
    U4,
    /// `System.Int64`
    I8,
    /// `System.UInt64`
    U8,
    /// `System.Single`
    R4,
    /// `System.Double`
    R8,
    /// `System.String`
    String,
    /// `System.Object`
    Object,
    /// `System.IntPtr`
    IntPtr,
    /// `System.UIntPtr`
    UIntPtr,
    /// A reference type, by full name
    Class(String),
    /// A value type, by full name
    ValueType(String),
    /// An instantiation of a generic type
    GenericInst {
        /// The generic type definition
        generic: Box<TypeSig>,
        /// The type arguments
        args: Vec<TypeSig>,
    },
    /// A single-dimension, zero-based array
    SzArray(Box<TypeSig>),
    /// A managed pointer
    ByRef(Box<TypeSig>),
    /// A generic parameter of the enclosing type
    Var(u32),
    /// A generic parameter of the enclosing method
    MVar(u32),
}

const PRIMITIVES: &[(&str, TypeSig)] = &[
    ("System.Void", TypeSig::Void),
    ("System.Boolean", TypeSig::Boolean),
    ("System.Char", TypeSig::Char),
    ("System.SByte", TypeSig::I1),
    ("System.Byte", TypeSig::U1),
    ("System.Int16", TypeSig::I2),
    ("System.UInt16", TypeSig::U2),
    ("System.Int32", TypeSig::I4),
    ("System.UInt32", TypeSig::U4),
    ("System.Int64", TypeSig::I8),
    ("System.UInt64", TypeSig::U8),
    ("System.Single", TypeSig::R4),
    ("System.Double", TypeSig::R8),
    ("System.String", TypeSig::String),
    ("System.Object", TypeSig::Object),
    ("System.IntPtr", TypeSig::IntPtr),
    ("System.UIntPtr", TypeSig::UIntPtr),
];

impl TypeSig {
    /// Creates a reference type signature, mapping well-known names to their primitive form.
    #[must_use]
    pub fn class(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        PRIMITIVES
            .iter()
            .find(|(name, _)| *name == full_name)
            .map_or(TypeSig::Class(full_name), |(_, sig)| sig.clone())
    }

    /// Creates a value type signature, mapping well-known names to their primitive form.
    #[must_use]
    pub fn value_type(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        PRIMITIVES
            .iter()
            .find(|(name, _)| *name == full_name)
            .map_or(TypeSig::ValueType(full_name), |(_, sig)| sig.clone())
    }

    /// Creates an instantiation of `generic` with `args`.
    #[must_use]
    pub fn generic_inst(generic: TypeSig, args: Vec<TypeSig>) -> Self {
        TypeSig::GenericInst {
            generic: Box::new(generic),
            args,
        }
    }

    /// Creates a single-dimension array of `element`.
    #[must_use]
    pub fn array(element: TypeSig) -> Self {
        TypeSig::SzArray(Box::new(element))
    }

    /// Returns the full name in ECMA textual form.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.to_string()
    }

    /// Returns the type arguments if this is a generic instantiation.
    #[must_use]
    pub fn generic_args(&self) -> Option<&[TypeSig]> {
        match self {
            TypeSig::GenericInst { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Returns the signature naming the type definition behind this reference.
    ///
    /// For generic instantiations this is the generic type itself, everything else
    /// is returned unchanged.
    #[must_use]
    pub fn definition(&self) -> &TypeSig {
        match self {
            TypeSig::GenericInst { generic, .. } => generic.definition(),
            other => other,
        }
    }

    /// Returns true if the signature references a generic parameter anywhere.
    #[must_use]
    pub fn contains_generic_param(&self) -> bool {
        match self {
            TypeSig::Var(_) | TypeSig::MVar(_) => true,
            TypeSig::GenericInst { generic, args } => {
                generic.contains_generic_param() || args.iter().any(TypeSig::contains_generic_param)
            }
            TypeSig::SzArray(inner) | TypeSig::ByRef(inner) => inner.contains_generic_param(),
            _ => false,
        }
    }

    /// Replaces type generic parameters (`!n`) with the given arguments.
    ///
    /// Parameters without a matching argument are left untouched, as are method
    /// generic parameters (`!!n`).
    #[must_use]
    pub fn substitute_type_args(&self, args: &[TypeSig]) -> TypeSig {
        if args.is_empty() {
            return self.clone();
        }

        match self {
            TypeSig::Var(index) => args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::GenericInst { generic, args: own } => TypeSig::GenericInst {
                generic: Box::new(generic.substitute_type_args(args)),
                args: own.iter().map(|a| a.substitute_type_args(args)).collect(),
            },
            TypeSig::SzArray(inner) => TypeSig::SzArray(Box::new(inner.substitute_type_args(args))),
            TypeSig::ByRef(inner) => TypeSig::ByRef(Box::new(inner.substitute_type_args(args))),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((name, _)) = PRIMITIVES.iter().find(|(_, sig)| sig == self) {
            return f.write_str(name);
        }

        match self {
            TypeSig::Class(name) | TypeSig::ValueType(name) => f.write_str(name),
            TypeSig::GenericInst { generic, args } => {
                write!(f, "{generic}<")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeSig::SzArray(inner) => write!(f, "{inner}[]"),
            TypeSig::ByRef(inner) => write!(f, "{inner}&"),
            TypeSig::Var(index) => write!(f, "!{index}"),
            TypeSig::MVar(index) => write!(f, "!!{index}"),
            // Primitives are handled by the table lookup above
            _ => f.write_str("?"),
        }
    }
}

/// A method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSig {
    /// Instance method (`this` is passed implicitly)
    pub has_this: bool,
    /// Number of generic parameters of the method
    pub generic_params: u32,
    /// Return type
    pub ret: TypeSig,
    /// Parameter types
    pub params: Vec<TypeSig>,
}

impl MethodSig {
    /// Creates an instance method signature.
    #[must_use]
    pub fn instance(ret: TypeSig, params: Vec<TypeSig>) -> Self {
        MethodSig {
            has_this: true,
            generic_params: 0,
            ret,
            params,
        }
    }

    /// Creates a static method signature.
    #[must_use]
    pub fn static_method(ret: TypeSig, params: Vec<TypeSig>) -> Self {
        MethodSig {
            has_this: false,
            generic_params: 0,
            ret,
            params,
        }
    }

    /// Sets the number of method generic parameters.
    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_params = count;
        self
    }

    /// Replaces type generic parameters in the return and parameter types.
    #[must_use]
    pub fn substitute_type_args(&self, args: &[TypeSig]) -> MethodSig {
        if args.is_empty() {
            return self.clone();
        }

        MethodSig {
            has_this: self.has_this,
            generic_params: self.generic_params,
            ret: self.ret.substitute_type_args(args),
            params: self
                .params
                .iter()
                .map(|p| p.substitute_type_args(args))
                .collect(),
        }
    }

    /// Returns the parameter list in textual form, e.g. `(System.Object,System.ResolveEventArgs)`.
    #[must_use]
    pub fn params_string(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeSig::full_name).collect();
        format!("({})", params.join(","))
    }

    /// Returns true for a parameter-less method returning `System.Void`.
    #[must_use]
    pub fn is_void_no_params(&self) -> bool {
        self.ret == TypeSig::Void && self.params.is_empty()
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ret, self.params_string())
    }
}
