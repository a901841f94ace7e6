//! # reactorscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! reactorscope library. Import it to build modules and run the deobfuscator without
//! spelling out every path.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all reactorscope operations
pub use crate::Error;

/// The result type used throughout reactorscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Module driver and its output
pub use crate::deobfuscation::{DeobfuscationResult, Deobfuscator};

/// Configuration
pub use crate::deobfuscation::{DeobfuscatorConfig, RenamerConfig, ResourceConfig};

/// Diagnostics
pub use crate::deobfuscation::{Event, EventKind, EventLog};

// ================================================================================================
// Metadata Model
// ================================================================================================

/// Metadata token type for referencing declarations
pub use crate::metadata::token::Token;

/// The module registry
pub use crate::metadata::module::Module;

/// Declarations
pub use crate::metadata::{
    members::{EventDef, FieldDef, MethodBody, MethodDef, MethodOverride, PropertyDef},
    resources::EmbeddedResource,
    typedef::{TypeDef, TypeOrigin},
};

/// Signatures
pub use crate::metadata::signatures::{MethodSig, TypeSig};

/// Attribute flags
pub use crate::metadata::flags::{FieldAttributes, MethodAttributes, TypeAttributes};

// ================================================================================================
// Resource Recovery
// ================================================================================================

/// Decryptor abstraction
pub use crate::deobfuscation::{DecryptorProvider, ResourceDecryptor};

/// Recovery results and cleanup hand-off
pub use crate::deobfuscation::{CleanupRequest, DecryptedPayload};

// ================================================================================================
// Renaming
// ================================================================================================

/// Renaming results
pub use crate::deobfuscation::{RenameEntry, RenameKind, RenameMap, RestoredMember};

/// Lower-level renaming building blocks
pub use crate::deobfuscation::renamer::{
    graph::DispatchGraph,
    groups::{MethodNameGroup, MethodNameGroups},
    names::{NameChecker, NameRegistry},
    rename_module,
};
