//! Name allocation for renamed symbols.
//!
//! [`NameRegistry`] is the explicit registry of every name in use. Generators produce
//! candidates, the registry hands out the first candidate nobody else owns. Each
//! syntactic category has its own [`NameCreator`] counter, so the produced names are
//! deterministic for a given scan order.

use rustc_hash::FxHashSet;

use crate::{metadata::typedef::TypeDef, Result};

/// Decides whether a symbol name was mangled by the protector.
pub struct NameChecker;

impl NameChecker {
    /// Returns true if `name` contains characters no compiler emits for user code.
    ///
    /// Flags zero-width, bidi and other invisible formatting characters, private-use code
    /// points, non-alphabetic non-ASCII characters and ASCII control characters, as well
    /// as names starting with a digit.
    #[must_use]
    pub fn is_obfuscated(name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }

        name.chars().any(|c| match c {
            '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{206F}' => true,
            '\u{FEFF}' | '\u{E000}'..='\u{F8FF}' => true,
            c if c.is_ascii_control() => true,
            c if !c.is_ascii() => !c.is_alphabetic(),
            _ => false,
        })
    }

    /// Returns true for names with a meaning to the runtime or the compiler.
    #[must_use]
    pub fn is_special(name: &str) -> bool {
        if name == ".ctor" || name == ".cctor" {
            return true;
        }

        if name == "<Module>" || name == "<PrivateImplementationDetails>" {
            return true;
        }

        name.starts_with('<') && name.ends_with('>')
    }

    /// Returns true if `name` should be replaced.
    #[must_use]
    pub fn needs_rename(name: &str) -> bool {
        Self::is_obfuscated(name) && !Self::is_special(name)
    }
}

/// Produces `prefix0`, `prefix1`, ...
#[derive(Debug, Clone)]
pub struct NameCreator {
    prefix: String,
    next: u32,
}

impl NameCreator {
    /// Creates a counter starting at 0.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        NameCreator {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Returns the next candidate.
    pub fn create(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        name
    }
}

/// The set of names in use.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    names: FxHashSet<String>,
}

impl NameRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`.
    pub fn add(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Allocates a new name for a symbol currently called `old_name`.
    ///
    /// Calls `generate` until it returns a name that is free or equal to `old_name`, then
    /// registers and returns it.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if `generate` returns the same candidate twice in
    /// a row, since it would never produce a free name.
    pub fn get_name(
        &mut self,
        old_name: &str,
        mut generate: impl FnMut() -> String,
    ) -> Result<String> {
        let mut previous: Option<String> = None;
        loop {
            let name = generate();
            if previous.as_deref() == Some(name.as_str()) {
                return Err(invariant_error!(
                    "Could not rename symbol '{}', generator is stuck at '{}'",
                    old_name.escape_default(),
                    name
                ));
            }

            if !self.exists(&name) || name == old_name {
                self.names.insert(name.clone());
                return Ok(name);
            }
            previous = Some(name);
        }
    }

    /// Allocates a new name using the counter of `creator`.
    ///
    /// # Errors
    ///
    /// See [`NameRegistry::get_name`].
    pub fn create_name(&mut self, old_name: &str, creator: &mut NameCreator) -> Result<String> {
        self.get_name(old_name, || creator.create())
    }

    /// Registers every name of `other`.
    pub fn merge(&mut self, other: &NameRegistry) {
        self.names.extend(other.names.iter().cloned());
    }
}

/// Name categories of types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TypeCategory {
    /// Neither class nor interface, e.g. an interface that declares a base class
    Type,
    /// Enumeration
    Enum,
    /// Value type
    Struct,
    /// Delegate
    Delegate,
    /// Class without a more specific category
    Class,
    /// Interface
    Interface,
}

impl TypeCategory {
    /// Classifies a type by kind and base type.
    #[must_use]
    pub fn of(ty: &TypeDef) -> Self {
        if ty.is_enum() {
            TypeCategory::Enum
        } else if ty.is_value_type() {
            TypeCategory::Struct
        } else if ty.is_delegate() {
            TypeCategory::Delegate
        } else if !ty.is_interface() {
            TypeCategory::Class
        } else if ty.base.is_none() {
            TypeCategory::Interface
        } else {
            TypeCategory::Type
        }
    }
}

/// Base type names that give a class a more telling prefix.
const REFINEMENTS: [&str; 7] = [
    "Exception",
    "EventArgs",
    "Attribute",
    "Form",
    "Dialog",
    "Control",
    "Stream",
];

/// Generates type names from the kind and the base type of a type.
#[derive(Debug, Clone)]
pub struct TypeNameCreator {
    unknown: NameCreator,
    enums: NameCreator,
    structs: NameCreator,
    delegates: NameCreator,
    classes: NameCreator,
    interfaces: NameCreator,
    refinements: Vec<(&'static str, NameCreator)>,
}

impl Default for TypeNameCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeNameCreator {
    /// Creates fresh counters for every category.
    #[must_use]
    pub fn new() -> Self {
        TypeNameCreator {
            unknown: NameCreator::new("Type"),
            enums: NameCreator::new("Enum"),
            structs: NameCreator::new("Struct"),
            delegates: NameCreator::new("Delegate"),
            classes: NameCreator::new("Class"),
            interfaces: NameCreator::new("Interface"),
            refinements: REFINEMENTS
                .iter()
                .map(|&name| (name, NameCreator::new(name)))
                .collect(),
        }
    }

    fn creator(&mut self, ty: &TypeDef, new_base_name: Option<&str>) -> &mut NameCreator {
        match TypeCategory::of(ty) {
            TypeCategory::Enum => &mut self.enums,
            TypeCategory::Struct => &mut self.structs,
            TypeCategory::Delegate => &mut self.delegates,
            TypeCategory::Interface => &mut self.interfaces,
            TypeCategory::Type => &mut self.unknown,
            TypeCategory::Class => {
                let base_name = new_base_name
                    .map(str::to_string)
                    .or_else(|| ty.base_simple_name());

                let refinement = base_name.and_then(|base| {
                    self.refinements
                        .iter()
                        .position(|(name, _)| base.contains(name))
                });

                match refinement {
                    Some(index) => &mut self.refinements[index].1,
                    None => &mut self.classes,
                }
            }
        }
    }

    /// Allocates a name for `ty`.
    ///
    /// `new_base_name` is the new simple name of the base type if it was renamed itself,
    /// so that a class deriving from a renamed `Exception0` becomes another `Exception`.
    ///
    /// # Errors
    ///
    /// See [`NameRegistry::get_name`].
    pub fn create(
        &mut self,
        registry: &mut NameRegistry,
        ty: &TypeDef,
        new_base_name: Option<&str>,
    ) -> Result<String> {
        let creator = self.creator(ty, new_base_name);
        registry.create_name(&ty.name, creator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{flags::TypeAttributes, signatures::TypeSig};

    #[test]
    fn test_name_checker() {
        assert!(NameChecker::is_obfuscated("\u{200B}\u{200C}"));
        assert!(NameChecker::is_obfuscated("a\u{202E}b"));
        assert!(NameChecker::is_obfuscated("\u{E001}"));
        assert!(NameChecker::is_obfuscated("x\u{0001}"));
        assert!(NameChecker::is_obfuscated("1abc"));
        assert!(!NameChecker::is_obfuscated("Größe"));
        assert!(!NameChecker::is_obfuscated("ReadAll"));
        assert!(!NameChecker::is_obfuscated(""));

        assert!(NameChecker::is_special(".ctor"));
        assert!(NameChecker::is_special("<Module>"));
        assert!(NameChecker::is_special("<Main>b__0_0>"));
        assert!(!NameChecker::needs_rename("<\u{200B}>"));
        assert!(NameChecker::needs_rename("\u{200B}"));
    }

    #[test]
    fn test_get_name_skips_taken() -> Result<()> {
        let mut registry = NameRegistry::new();
        registry.add("method_0");

        let mut creator = NameCreator::new("method_");
        assert_eq!(registry.create_name("\u{200B}", &mut creator)?, "method_1");
        assert_eq!(registry.create_name("\u{200C}", &mut creator)?, "method_2");
        assert!(registry.exists("method_2"));
        Ok(())
    }

    #[test]
    fn test_get_name_allows_old_name() -> Result<()> {
        let mut registry = NameRegistry::new();
        registry.add("Run");
        assert_eq!(registry.get_name("Run", || "Run".to_string())?, "Run");
        Ok(())
    }

    #[test]
    fn test_get_name_stuck_generator() {
        let mut registry = NameRegistry::new();
        registry.add("Taken");

        let result = registry.get_name("\u{200B}", || "Taken".to_string());
        assert!(matches!(
            result,
            Err(crate::Error::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_merge() {
        let mut a = NameRegistry::new();
        let mut b = NameRegistry::new();
        a.add("A");
        b.add("B");
        a.merge(&b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_type_categories() -> Result<()> {
        let mut registry = NameRegistry::new();
        let mut creator = TypeNameCreator::new();

        let class = TypeDef::new("", "\u{2000}", TypeAttributes::PUBLIC).with_base(TypeSig::Object);
        let exception = TypeDef::new("", "\u{2001}", TypeAttributes::PUBLIC)
            .with_base(TypeSig::class("System.IO.IOException"));
        let stream = TypeDef::new("", "\u{2002}", TypeAttributes::PUBLIC)
            .with_base(TypeSig::class("Ns.\u{2003}"));
        let iface = TypeDef::new(
            "",
            "\u{2004}",
            TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        );
        let en = TypeDef::new("", "\u{2005}", TypeAttributes::PUBLIC)
            .with_base(TypeSig::class("System.Enum"));
        let st = TypeDef::new("", "\u{2006}", TypeAttributes::PUBLIC)
            .with_base(TypeSig::class("System.ValueType"));
        let del = TypeDef::new("", "\u{2007}", TypeAttributes::PUBLIC)
            .with_base(TypeSig::class("System.MulticastDelegate"));

        assert_eq!(creator.create(&mut registry, &class, None)?, "Class0");
        assert_eq!(creator.create(&mut registry, &class, None)?, "Class1");
        assert_eq!(creator.create(&mut registry, &exception, None)?, "Exception0");
        assert_eq!(creator.create(&mut registry, &stream, Some("Stream3"))?, "Stream0");
        assert_eq!(creator.create(&mut registry, &iface, None)?, "Interface0");
        assert_eq!(creator.create(&mut registry, &en, None)?, "Enum0");
        assert_eq!(creator.create(&mut registry, &st, None)?, "Struct0");
        assert_eq!(creator.create(&mut registry, &del, None)?, "Delegate0");
        Ok(())
    }
}
