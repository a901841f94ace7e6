use thiserror::Error;

use crate::utils::decompress::DecompressError;

macro_rules! invariant_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvariantViolation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvariantViolation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants follow the severity of the condition they describe. Some conditions only mean
/// that a feature does not apply to the module at hand, others mean the module itself violates
/// a structural assumption and must not be processed any further.
///
/// # Error Categories
///
/// ## Recoverable
/// - [`Error::NotFound`] - A fingerprint or pattern did not match anything
/// - [`Error::CorruptPayload`] - Neither decompression codec could recover a payload
/// - [`Error::Decompress`] - A single codec rejected its input
///
/// ## Fatal for the current module
/// - [`Error::InvariantViolation`] - Malformed or adversarial structure
/// - [`Error::AlreadyExists`] - A member was created twice
/// - [`Error::Module`] - A fatal error annotated with the module it came from
///
/// # Examples
///
/// ```rust
/// use reactorscope::Error;
///
/// fn report(err: &Error) {
///     if err.is_fatal() {
///         eprintln!("aborting module: {err}");
///     } else {
///         eprintln!("skipping feature: {err}");
///     }
/// }
/// # report(&Error::NotFound("encrypted resource".into()));
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A structural fingerprint did not match anything in the module.
    ///
    /// Non-fatal. The caller treats the affected feature as not applicable and
    /// carries on with everything else.
    #[error("Not found - {0}")]
    NotFound(String),

    /// The decrypted payload could not be decompressed by any known codec.
    ///
    /// The module itself is still intact, only the specific resource is lost.
    #[error("Corrupt payload - {0}")]
    CorruptPayload(String),

    /// A structural invariant of the input does not hold.
    ///
    /// Raised for accessors that reference methods missing from their owning type,
    /// interface maps that lost an interface, or name generators that cannot produce a
    /// fresh name. The error includes the source location where the violation was
    /// detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Invariant violation - {file}:{line}: {message}")]
    InvariantViolation {
        /// The message to be printed for the violation
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A property or event was created on a type that already declares it.
    #[error("Already exists - {0}")]
    AlreadyExists(String),

    /// A codec failed to decode its input.
    #[error("{0}")]
    Decompress(#[from] DecompressError),

    /// A fatal error raised while processing a named module of a batch.
    #[error("Module '{name}' - {source}")]
    Module {
        /// The name of the module that failed
        name: String,
        /// The underlying error
        source: Box<Error>,
    },
}

impl Error {
    /// Returns `true` if the error must abort the current module.
    ///
    /// `NotFound`, `CorruptPayload` and single codec failures only disable the feature
    /// that raised them.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation { .. } | Error::AlreadyExists(_) | Error::Module { .. }
        )
    }

    /// Annotates this error with the name of the module it was raised for.
    #[must_use]
    pub fn in_module(self, name: impl Into<String>) -> Self {
        match self {
            Error::Module { .. } => self,
            other => Error::Module {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }
}
