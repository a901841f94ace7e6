//! Attribute flags of types, methods and fields.
//!
//! The flag values follow ECMA-335 §II.23.1. Visibility and member access are multi-bit
//! fields inside the flag words, so they are exposed through [`TypeVisibility`] and
//! [`MemberAccess`] instead of being tested with `contains`.

use bitflags::bitflags;
use strum::{Display, FromRepr};

/// Mask for the visibility bits of `TypeAttributes`
pub const TYPE_VISIBILITY_MASK: u32 = 0x0000_0007;
/// Mask for the member access bits of `MethodAttributes` and `FieldAttributes`
pub const MEMBER_ACCESS_MASK: u32 = 0x0000_0007;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Type attribute flags
    pub struct TypeAttributes: u32 {
        /// Class is not public scope
        const NOT_PUBLIC = 0x0000_0000;
        /// Class is public scope
        const PUBLIC = 0x0000_0001;
        /// Class is nested with public visibility
        const NESTED_PUBLIC = 0x0000_0002;
        /// Class is nested with private visibility
        const NESTED_PRIVATE = 0x0000_0003;
        /// Class is nested with family visibility
        const NESTED_FAMILY = 0x0000_0004;
        /// Class is nested with assembly visibility
        const NESTED_ASSEMBLY = 0x0000_0005;
        /// Class is nested with family and assembly visibility
        const NESTED_FAM_AND_ASSEM = 0x0000_0006;
        /// Class is nested with family or assembly visibility
        const NESTED_FAM_OR_ASSEM = 0x0000_0007;
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Class is abstract
        const ABSTRACT = 0x0000_0080;
        /// Class cannot be extended
        const SEALED = 0x0000_0100;
        /// Class name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Runtime should check name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method attribute flags
    pub struct MethodAttributes: u32 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method can only be overriden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, dpending upon the name of the method
        const RT_SPECIAL_NAME = 0x1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Field attribute flags
    pub struct FieldAttributes: u32 {
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Field can only be initialized, not written to after init
        const INIT_ONLY = 0x0020;
        /// Value is compile time constant
        const LITERAL = 0x0040;
        /// Field is special
        const SPECIAL_NAME = 0x0200;
    }
}

/// Visibility of a type, decoded from the visibility bits of [`TypeAttributes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(u32)]
pub enum TypeVisibility {
    /// Top-level, not public
    NotPublic = 0,
    /// Top-level, public
    Public = 1,
    /// Nested, public
    NestedPublic = 2,
    /// Nested, private
    NestedPrivate = 3,
    /// Nested, family
    NestedFamily = 4,
    /// Nested, assembly
    NestedAssembly = 5,
    /// Nested, family and assembly
    NestedFamAndAssem = 6,
    /// Nested, family or assembly
    NestedFamOrAssem = 7,
}

/// Accessibility of a method or field, decoded from the member access bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(u32)]
pub enum MemberAccess {
    /// Member not referenceable
    CompilerControlled = 0,
    /// Accessible only by the parent type
    Private = 1,
    /// Accessible by sub-types only in this Assembly
    FamAndAssem = 2,
    /// Accessibly by anyone in the Assembly
    Assem = 3,
    /// Accessible only by type and sub-types
    Family = 4,
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    FamOrAssem = 5,
    /// Accessibly by anyone who has visibility to this scope
    Public = 6,
}

impl TypeAttributes {
    /// Decodes the visibility bits
    #[must_use]
    pub fn visibility(&self) -> TypeVisibility {
        TypeVisibility::from_repr(self.bits() & TYPE_VISIBILITY_MASK)
            .unwrap_or(TypeVisibility::NotPublic)
    }

    /// Returns true if the type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.contains(TypeAttributes::INTERFACE)
    }
}

impl MethodAttributes {
    /// Decodes the member access bits
    #[must_use]
    pub fn access(&self) -> MemberAccess {
        MemberAccess::from_repr(self.bits() & MEMBER_ACCESS_MASK)
            .unwrap_or(MemberAccess::CompilerControlled)
    }
}

impl FieldAttributes {
    /// Decodes the member access bits
    #[must_use]
    pub fn access(&self) -> MemberAccess {
        MemberAccess::from_repr(self.bits() & MEMBER_ACCESS_MASK)
            .unwrap_or(MemberAccess::CompilerControlled)
    }
}
