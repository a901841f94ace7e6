//! Deobfuscation of .NET Reactor protected modules.
//!
//! Two independent paths share nothing but the module they read:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Deobfuscator                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Input: Module                                                          │
//! │           │                                                             │
//! │     ┌─────┴──────────────────────────┐                                  │
//! │     ▼                                ▼                                  │
//! │  ┌──────────────────────────┐   ┌──────────────────────────────────┐    │
//! │  │   Resource Recovery      │   │   Symbol Renaming                │    │
//! │  │                          │   │                                  │    │
//! │  │  Fingerprint matcher     │   │  Dispatch graph                  │    │
//! │  │  Decryptor handle        │   │  Virtual slots, interface maps   │    │
//! │  │  QuickLZ → deflate       │   │  Method name groups              │    │
//! │  │  Cleanup hand-off        │   │  Renaming engine                 │    │
//! │  └────────────┬─────────────┘   └────────────────┬─────────────────┘    │
//! │               ▼                                  ▼                      │
//! │  Output: DeobfuscationResult (payload, cleanup, renames, events)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`Deobfuscator`] - Runs both paths on a module or a batch of modules
//! - [`resources`] - Structural recognition of the resource decryptor and payload recovery
//! - [`renamer`] - Dispatch-safe renaming of obfuscated symbols
//! - [`EventLog`] - Records every transformation and every skipped feature
//! - [`CleanupRequest`] - Protector artifacts for an external cleanup step
//!
//! # Error Handling
//!
//! A path that does not apply (no decryptor found) or cannot finish (payload does not
//! decompress) is recorded in the [`EventLog`] and the other path still runs.
//! Structural violations abort the module, see [`crate::Error::is_fatal`].
//!
//! # Usage
//!
//! ```rust
//! use reactorscope::deobfuscation::{Deobfuscator, DeobfuscatorConfig, RenamerConfig};
//! use reactorscope::metadata::module::Module;
//!
//! let config = DeobfuscatorConfig::new().with_renamer(RenamerConfig::new().with_fields(false));
//! let results = Deobfuscator::new(config).process_batch(&[Module::new("a.dll"), Module::new("b.dll")]);
//!
//! for result in results {
//!     println!("{}", result?.summary());
//! }
//! # Ok::<(), reactorscope::Error>(())
//! ```

pub mod cleanup;
pub mod config;
pub mod engine;
pub mod events;
pub mod renamer;
pub mod resources;

pub use cleanup::CleanupRequest;
pub use config::{DeobfuscatorConfig, RenamerConfig, ResourceConfig};
pub use engine::{DeobfuscationResult, Deobfuscator};
pub use events::{Event, EventKind, EventLog};
pub use renamer::engine::{RenameEntry, RenameKind, RenameMap, RestoredMember};
pub use resources::{
    decryptor::{DecryptorHandle, DecryptorProvider, ResourceDecryptor},
    pipeline::DecryptedPayload,
};
