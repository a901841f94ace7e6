//! In-memory metadata model of a loaded .NET module.
//!
//! Container loaders populate a [`module::Module`] with the declarations of one module
//! and the deobfuscation passes read it back through typed lookups. Every declaration is
//! identified by a [`token::Token`], signatures are kept in structural form so that
//! generic substitution and textual matching work on the same representation.
//!
//! # Key Components
//!
//! - [`module`] - The flat registry owning all declarations of a module
//! - [`typedef`] - Declared and reference-only types
//! - [`members`] - Methods, fields, properties, events and the parts of a method body
//!   the structural matchers inspect
//! - [`signatures`] - Type and method signatures
//! - [`flags`] - Attribute bitflags of types, methods and fields
//! - [`resources`] - Embedded manifest resources
//! - [`token`] - Metadata table row references
//!
//! # Examples
//!
//! ```rust
//! use reactorscope::metadata::{
//!     flags::TypeAttributes, module::Module, signatures::TypeSig, typedef::TypeDef,
//! };
//!
//! let mut module = Module::new("sample.dll");
//! let base = module.add_type(TypeDef::new("Ns", "Base", TypeAttributes::PUBLIC).with_base(TypeSig::Object));
//! let derived = module.add_type(
//!     TypeDef::new("Ns", "Derived", TypeAttributes::PUBLIC).with_base(TypeSig::class("Ns.Base")),
//! );
//!
//! let base_sig = module.type_def(derived).and_then(|ty| ty.base.clone());
//! assert_eq!(base_sig.and_then(|sig| module.resolve_type(&sig)), Some(base));
//! ```

/// Attribute bitflags of types, methods and fields
pub mod flags;
/// Methods, fields, properties and events
pub mod members;
/// The module registry
pub mod module;
/// Embedded manifest resources
pub mod resources;
/// Type and method signatures
pub mod signatures;
/// Commonly used metadata token type
pub mod token;
/// Declared types
pub mod typedef;
