// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # reactorscope
//!
//! Static deobfuscation of .NET Reactor protected modules, in pure Rust.
//!
//! `reactorscope` recovers the encrypted resources the protector hides behind an injected
//! assembly-resolve hook, and renames the symbols it mangled without ever changing which
//! method a virtual or interface call dispatches to. Nothing of the protected module is
//! executed: the decryptor is recognized by its structure, the hierarchy is analyzed
//! statically.
//!
//! ## Features
//!
//! - **Fingerprint matching** - Recognizes the protector's resource decryptor by field
//!   layout, resolve-callback signature and local variable types
//! - **Payload recovery** - Decrypts through a pluggable decryptor, then decompresses with
//!   QuickLZ or raw deflate
//! - **Dispatch-safe renaming** - Virtual slot tables and interface maps per ECMA-335
//!   §II.12.2 group methods that must keep one name
//! - **Property and event restoration** - Recreates properties and events stripped from
//!   overrides
//! - **Batch processing** - Independent modules run in parallel, a broken module does not
//!   affect the others
//!
//! ## Quick Start
//!
//! ```rust
//! use reactorscope::prelude::*;
//!
//! let mut module = Module::new("protected.dll");
//! let ty = module.add_type(TypeDef::new("", "\u{200B}", TypeAttributes::PUBLIC));
//!
//! let result = Deobfuscator::new(DeobfuscatorConfig::default()).process(&module)?;
//! assert_eq!(result.renames.new_name(ty), Some("Class0"));
//! println!("{}", result.summary());
//! # Ok::<(), reactorscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`metadata`] - In-memory model of a loaded module
//! - [`deobfuscation`] - Resource recovery, renaming and the module driver
//! - [`utils`] - Decompression codecs
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Errors that only disable a feature
//! are distinguished from errors that abort the module:
//!
//! ```rust
//! use reactorscope::Error;
//!
//! fn classify(err: &Error) -> &'static str {
//!     match err {
//!         Error::NotFound(_) => "not protected",
//!         Error::CorruptPayload(_) => "payload lost",
//!         err if err.is_fatal() => "module aborted",
//!         _ => "other",
//!     }
//! }
//! # assert_eq!(classify(&Error::NotFound("x".into())), "not protected");
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench dispatch
//!
//! # Decompression fuzzing
//! cargo +nightly fuzz run decompress --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use reactorscope::prelude::*;
///
/// let config = DeobfuscatorConfig::new().with_renamer(RenamerConfig::disabled());
/// let result = Deobfuscator::new(config).process(&Module::new("empty.dll"))?;
/// assert!(result.renames.is_empty());
/// # Ok::<(), reactorscope::Error>(())
/// ```
pub mod prelude;

/// In-memory metadata model.
///
/// Container loaders populate a [`metadata::module::Module`], tests build one directly.
/// It provides the declarations, the type-resolution and signature predicates, and the
/// call-graph query that the deobfuscation passes consume.
pub mod metadata;

/// Resource recovery, symbol renaming and the module driver.
pub mod deobfuscation;

/// Decompression codecs used by resource recovery.
pub mod utils;

/// `reactorscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `reactorscope` Error type
///
/// See [`Error::is_fatal`] for which errors abort a module.
pub use error::Error;
