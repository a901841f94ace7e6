//! Dispatch-safe symbol renaming.
//!
//! The protector replaces type and member names with invisible or unprintable
//! characters. Renaming them back to readable names is only sound if every method
//! sharing a dispatch slot with another keeps sharing its name afterwards, otherwise
//! a virtual or interface call would bind to a different method.
//!
//! # Architecture
//!
//! ```text
//! Module ──► DispatchGraph::build ──► DispatchGraph::group_methods ──► RenamingEngine::run
//!             (types, members,          (slot tables, interface        (names, restored
//!              hierarchy links)          maps, MethodNameGroups)         members, RenameMap)
//! ```
//!
//! - [`graph`] - Arena of type and member nodes with resolved hierarchy links
//! - [`virtuals`] - Virtual slot tables and interface maps, computed base types first
//! - [`groups`] - Equivalence classes of methods that must keep one name
//! - [`names`] - Obfuscated-name detection, the name registry and name generators
//! - [`engine`] - Final name assignment producing a [`engine::RenameMap`]
//!
//! # Example
//!
//! ```rust
//! use reactorscope::deobfuscation::{config::RenamerConfig, events::EventLog, renamer::rename_module};
//! use reactorscope::metadata::{
//!     flags::{MethodAttributes, TypeAttributes},
//!     members::MethodDef,
//!     module::Module,
//!     signatures::{MethodSig, TypeSig},
//!     typedef::TypeDef,
//! };
//!
//! let mut module = Module::new("sample.dll");
//! let ty = module.add_type(TypeDef::new("", "\u{200B}", TypeAttributes::PUBLIC));
//! let method = module.add_method(
//!     ty,
//!     MethodDef::new("\u{200C}", MethodAttributes::PUBLIC, MethodSig::instance(TypeSig::Void, vec![])),
//! )?;
//!
//! let log = EventLog::new();
//! let renames = rename_module(&module, &RenamerConfig::default(), &log)?;
//! assert_eq!(renames.new_name(ty), Some("Class0"));
//! assert_eq!(renames.new_name(method), Some("method_0"));
//! # Ok::<(), reactorscope::Error>(())
//! ```

pub mod engine;
pub mod graph;
pub mod groups;
pub mod names;
pub mod virtuals;

use crate::{
    deobfuscation::{config::RenamerConfig, events::EventLog},
    metadata::module::Module,
    Result,
};

use self::{
    engine::{RenameMap, RenamingEngine},
    graph::DispatchGraph,
};

/// Builds the dispatch graph of `module`, groups its virtual methods and renames it.
///
/// # Errors
///
/// Returns an invariant violation for malformed accessor links or a stuck name
/// generator, and [`crate::Error::AlreadyExists`] if restoring a property or event
/// collides with a declared one.
pub fn rename_module(module: &Module, config: &RenamerConfig, log: &EventLog) -> Result<RenameMap> {
    let mut graph = DispatchGraph::build(module)?;
    let groups = graph.group_methods(log)?;
    RenamingEngine::new(config, log).run(&mut graph, &groups)
}
