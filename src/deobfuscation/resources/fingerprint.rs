//! Structural recognition of the protector's resource decryptor.
//!
//! The protector injects a helper class that hooks assembly resolution and serves the
//! original resources from an encrypted blob. The helper is recognized without running
//! any of its code:
//!
//! 1. The class derives directly from `System.Object` and has a telltale field layout,
//!    3 or 4 fields with a fixed number of booleans (see [`check_fields`]).
//! 2. One of its static methods has the signature of a resolve callback and no
//!    exception handlers.
//! 3. That callback, or a parameter-less helper it calls, uses the local variable layout
//!    of a known decryption routine (see [`KNOWN_DECRYPTORS`]).
//! 4. The routine names an embedded resource of the module through a string literal.
//!
//! The field test runs before any method is looked at. It rejects almost every type of
//! a real module, so the method checks only run on a handful of candidates.

use rustc_hash::FxHashMap;

use crate::metadata::{
    members::MethodDef, module::Module, resources::EmbeddedResource, signatures::TypeSig,
    token::Token, typedef::TypeDef,
};

/// Return type of an assembly resolve callback.
pub const RESOLVE_RETURN_TYPE: &str = "System.Reflection.Assembly";

/// Parameter lists of the accepted resolve callbacks.
pub const RESOLVE_PARAMETERS: [&str; 2] = [
    "(System.Object,System.ResolveEventArgs)",
    "(System.Object,System.Object)",
];

/// Local variable layout of a known resource decryption routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptorLayout {
    /// Short name used in diagnostics
    pub name: &'static str,
    /// Full names of the local variable types the routine must declare
    pub required_locals: &'static [&'static str],
}

/// The closed set of decryption routines this crate recognizes.
pub const KNOWN_DECRYPTORS: [DecryptorLayout; 3] = [
    DecryptorLayout {
        name: "crypto-stream",
        required_locals: &[
            "System.Byte[]",
            "System.IO.MemoryStream",
            "System.Security.Cryptography.CryptoStream",
            "System.Security.Cryptography.ICryptoTransform",
        ],
    },
    DecryptorLayout {
        name: "binary-reader",
        required_locals: &[
            "System.Byte[]",
            "System.IO.BinaryReader",
            "System.IO.Stream",
            "System.Int32",
        ],
    },
    DecryptorLayout {
        name: "raw-array",
        required_locals: &[
            "System.Byte[]",
            "System.UInt32[]",
            "System.IO.Stream",
            "System.UInt32",
        ],
    },
];

/// Counts of field (or local) types by full name.
#[derive(Debug, Default)]
pub struct FieldTypes {
    counts: FxHashMap<String, usize>,
}

impl FieldTypes {
    /// Counts the given types.
    pub fn new<'a>(types: impl IntoIterator<Item = &'a TypeSig>) -> Self {
        let mut counts = FxHashMap::default();
        for sig in types {
            *counts.entry(sig.full_name()).or_insert(0) += 1;
        }
        FieldTypes { counts }
    }

    /// Returns how often `full_name` occurs.
    #[must_use]
    pub fn count(&self, full_name: &str) -> usize {
        self.counts.get(full_name).copied().unwrap_or(0)
    }

    /// Returns true if `full_name` occurs at least once.
    #[must_use]
    pub fn exists(&self, full_name: &str) -> bool {
        self.count(full_name) > 0
    }

    /// Returns true if every name in `full_names` occurs.
    #[must_use]
    pub fn all(&self, full_names: &[&str]) -> bool {
        full_names.iter().all(|name| self.exists(name))
    }
}

/// Checks the field layout of a decryptor class.
///
/// Accepts 3 fields with one boolean or 4 fields with two booleans, where the remaining
/// fields are either two `System.Object`s or a `System.String[]` plus either a
/// `System.Reflection.Assembly` or a `System.Object`.
#[must_use]
pub fn check_fields(module: &Module, ty: &TypeDef) -> bool {
    let count = ty.fields.len();
    if count != 3 && count != 4 {
        return false;
    }

    let fields = ty
        .fields
        .iter()
        .filter_map(|&token| module.field(token))
        .map(|field| &field.field_type);
    let field_types = FieldTypes::new(fields);

    let bools = if count == 3 { 1 } else { 2 };
    if field_types.count("System.Boolean") != bools {
        return false;
    }
    if field_types.count("System.Object") == 2 {
        return true;
    }
    if field_types.count("System.String[]") != 1 {
        return false;
    }
    field_types.count("System.Reflection.Assembly") == 1
        || field_types.count("System.Object") == 1
}

/// Returns true if `method` has the signature and body shape of a resolve callback.
#[must_use]
pub fn is_resolve_callback(module: &Module, method: &MethodDef) -> bool {
    let Some(body) = method.body.as_ref() else {
        return false;
    };

    method.is_static()
        && body.exception_handlers == 0
        && RESOLVE_PARAMETERS
            .iter()
            .any(|params| module.is_method(method.token, RESOLVE_RETURN_TYPE, params))
}

/// Returns the first embedded resource named by a string literal of `method`.
#[must_use]
pub fn find_resource<'a>(module: &'a Module, method: &MethodDef) -> Option<&'a EmbeddedResource> {
    method
        .body
        .as_ref()?
        .strings
        .iter()
        .find_map(|literal| module.resource_by_name(literal))
}

/// Returns the known layout `method` matches, if any.
///
/// With `check_resource` the method must also reference an embedded resource by name.
#[must_use]
pub fn known_decryptor(
    module: &Module,
    method: Token,
    check_resource: bool,
) -> Option<&'static DecryptorLayout> {
    let method = module.method(method)?;
    let body = method.body.as_ref()?;
    if !method.is_static() {
        return None;
    }
    if check_resource && find_resource(module, method).is_none() {
        return None;
    }

    let locals = FieldTypes::new(&body.locals);
    KNOWN_DECRYPTORS
        .iter()
        .find(|layout| locals.all(layout.required_locals))
}

/// Returns true if `method` matches one of the known decryption routines.
#[must_use]
pub fn is_known_decryptor(module: &Module, method: Token, check_resource: bool) -> bool {
    known_decryptor(module, method, check_resource).is_some()
}

/// Resolves the decryption routine behind a resolve callback.
///
/// The callback itself is tried first, then each parameter-less `void` method it calls.
#[must_use]
pub fn get_decryptor_method(module: &Module, method: Token, check_resource: bool) -> Option<Token> {
    if is_known_decryptor(module, method, check_resource) {
        return Some(method);
    }

    module
        .called_methods(method)
        .into_iter()
        .filter(|&callee| module.is_method(callee, "System.Void", "()"))
        .find(|&callee| is_known_decryptor(module, callee, check_resource))
}

/// A type recognized as the protector's resource decryptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCandidate {
    /// The decryptor class
    pub type_token: Token,
    /// The resolve callback that matched
    pub resolver: Token,
    /// The decryption routine, the resolver itself or a helper it calls
    pub decryptor: Token,
    /// The type declaring the decryption routine, not always the decryptor class
    pub decryptor_type: Token,
    /// The encrypted resource
    pub resource: Token,
    /// All methods of the decryptor class
    pub methods: Vec<Token>,
    /// Name of the matched layout
    pub layout: &'static str,
}

/// Scans a module for the resource decryptor.
pub struct PayloadFingerprintMatcher<'a> {
    module: &'a Module,
}

impl<'a> PayloadFingerprintMatcher<'a> {
    /// Creates a matcher over `module`.
    #[must_use]
    pub fn new(module: &'a Module) -> Self {
        PayloadFingerprintMatcher { module }
    }

    /// Returns the candidates in scan order.
    ///
    /// The iterator is lazy. Taking the first element stops the scan at the first type
    /// that yields both a decryption routine and its embedded resource.
    pub fn candidates(&self) -> impl Iterator<Item = PayloadCandidate> + 'a {
        let module = self.module;
        module
            .types()
            .iter()
            .filter(|ty| ty.has_module())
            .filter(|ty| ty.base.as_ref().map_or(true, |base| *base == TypeSig::Object))
            .filter(move |ty| check_fields(module, ty))
            .flat_map(move |ty| {
                ty.methods
                    .iter()
                    .filter_map(move |&method| Self::match_resolver(module, ty, method))
            })
    }

    /// Returns the first candidate, if any.
    #[must_use]
    pub fn locate(&self) -> Option<PayloadCandidate> {
        self.candidates().next()
    }

    fn match_resolver(module: &Module, ty: &TypeDef, method: Token) -> Option<PayloadCandidate> {
        let resolver = module.method(method)?;
        if !is_resolve_callback(module, resolver) {
            return None;
        }

        let decryptor = get_decryptor_method(module, method, true)
            .or_else(|| get_decryptor_method(module, method, false))?;
        let layout = known_decryptor(module, decryptor, false)?;

        // A fingerprint match without its resource is not enough
        let routine = module.method(decryptor)?;
        let resource = find_resource(module, routine)?;

        Some(PayloadCandidate {
            type_token: ty.token,
            resolver: method,
            decryptor,
            decryptor_type: routine.declaring_type,
            resource: resource.token,
            methods: ty.methods.clone(),
            layout: layout.name,
        })
    }
}
