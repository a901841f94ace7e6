use bitflags::bitflags;

use crate::metadata::token::Token;

bitflags! {
    #[derive(PartialEq, Debug, Clone, Copy)]
    /// All possible flags for ManifestResourceAttributes
    pub struct ManifestResourceAttributes : u32 {
        /// The Resource is exported from the Assembly
        const PUBLIC = 0x0001;
        /// The Resource is private to the Assembly
        const PRIVATE = 0x0002;
    }
}

/// A resource embedded in the module (`ManifestResource` without implementation).
#[derive(Debug, Clone)]
pub struct EmbeddedResource {
    /// Token, assigned when the resource is added to a module
    pub token: Token,
    /// Resource name
    pub name: String,
    /// Visibility flags
    pub flags: ManifestResourceAttributes,
    /// Raw resource data
    pub data: Vec<u8>,
}

impl EmbeddedResource {
    /// Creates a new private resource
    #[must_use]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        EmbeddedResource {
            token: Token(0),
            name: name.into(),
            flags: ManifestResourceAttributes::PRIVATE,
            data,
        }
    }

    /// Returns the size of the resource data in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the resource is public.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.contains(ManifestResourceAttributes::PUBLIC)
    }
}
