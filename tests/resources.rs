//! Encrypted resource recovery on synthetic modules.
//!
//! The protector's helper class is rebuilt with the in-memory metadata model: the
//! field layout, the resolve callback and the local variables of the decryption
//! routine. Decryption itself is a trivial XOR provider.

use std::{io::Write, sync::Arc};

use flate2::{write::DeflateEncoder, Compression};
use reactorscope::{
    deobfuscation::resources::{
        fingerprint::PayloadFingerprintMatcher,
        pipeline::decompress,
        ResourceResolver,
    },
    prelude::*,
};

const LIMIT: usize = 1 << 20;
const RESOURCE: &str = "\u{2010}\u{2011}";

struct Xor(u8);

impl ResourceDecryptor for Xor {
    fn decrypt(&mut self, encrypted: &[u8]) -> Result<Vec<u8>> {
        Ok(encrypted.iter().map(|b| b ^ self.0).collect())
    }
}

impl DecryptorProvider for Xor {
    fn open(
        &self,
        _: &Module,
        _: Token,
        _: &EmbeddedResource,
    ) -> Result<Box<dyn ResourceDecryptor>> {
        Ok(Box::new(Xor(self.0)))
    }
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn stored_quicklz(payload: &[u8]) -> Vec<u8> {
    let mut frame = b"QCLZ".to_vec();
    frame.push(0x02);
    frame.extend_from_slice(&((payload.len() + 9) as u32).to_le_bytes());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn resolver_sig() -> MethodSig {
    MethodSig::static_method(
        TypeSig::class("System.Reflection.Assembly"),
        vec![TypeSig::Object, TypeSig::class("System.ResolveEventArgs")],
    )
}

fn reader_locals() -> Vec<TypeSig> {
    vec![
        TypeSig::array(TypeSig::U1),
        TypeSig::class("System.IO.BinaryReader"),
        TypeSig::class("System.IO.Stream"),
        TypeSig::I4,
    ]
}

/// Adds a helper class with the given fields and a matching resolve callback.
fn add_helper(module: &mut Module, fields: &[TypeSig]) -> Result<Token> {
    let ty = module.add_type(
        TypeDef::new("", "\u{2012}", TypeAttributes::NOT_PUBLIC | TypeAttributes::SEALED)
            .with_base(TypeSig::Object),
    );
    for sig in fields {
        module.add_field(
            ty,
            FieldDef::new(
                "\u{2013}",
                FieldAttributes::PRIVATE | FieldAttributes::STATIC,
                sig.clone(),
            ),
        )?;
    }
    module.add_method(
        ty,
        MethodDef::new(
            "\u{2014}",
            MethodAttributes::PRIVATE | MethodAttributes::STATIC,
            resolver_sig(),
        )
        .with_body(MethodBody::new().with_locals(reader_locals()).with_string(RESOURCE)),
    )?;
    Ok(ty)
}

fn protector_fields() -> Vec<TypeSig> {
    vec![
        TypeSig::Boolean,
        TypeSig::Boolean,
        TypeSig::array(TypeSig::String),
        TypeSig::class("System.Reflection.Assembly"),
    ]
}

/// One protector-shaped helper plus an unrelated class with plain methods.
fn protected_module(blob: Vec<u8>) -> Result<(Module, Token, Vec<Token>)> {
    let mut module = Module::new("protected.dll");
    module.add_resource(EmbeddedResource::new(RESOURCE, blob));
    let helper = add_helper(&mut module, &protector_fields())?;

    let app = module.add_type(
        TypeDef::new("App", "Program", TypeAttributes::PUBLIC).with_base(TypeSig::Object),
    );
    let mut plain = Vec::new();
    for name in ["Main", "Load", "Save"] {
        plain.push(module.add_method(
            app,
            MethodDef::new(
                name,
                MethodAttributes::PUBLIC | MethodAttributes::STATIC,
                MethodSig::static_method(TypeSig::Void, vec![]),
            ),
        )?);
    }
    Ok((module, helper, plain))
}

#[test]
fn codecs_agree_on_genuine_input() -> Result<()> {
    let plaintext = b"resources of the protected assembly, resources of the protected assembly";

    let from_quicklz = decompress(&stored_quicklz(plaintext), LIMIT)?;
    let from_deflate = decompress(&deflate(plaintext), LIMIT)?;

    assert_eq!(from_quicklz, from_deflate);
    assert_eq!(from_deflate, plaintext);
    Ok(())
}

#[test]
fn garbage_is_corrupt_payload() {
    for garbage in [vec![0xFF; 64], b"QCLZ\x01\x40\x40garbage".to_vec(), Vec::new()] {
        let result = decompress(&garbage, LIMIT);
        assert!(matches!(result, Err(Error::CorruptPayload(_))), "{garbage:?}");
    }
}

#[test]
fn matcher_is_idempotent() -> Result<()> {
    let (module, helper, _) = protected_module(vec![0; 8])?;

    let matcher = PayloadFingerprintMatcher::new(&module);
    let first = matcher.locate();
    let second = matcher.locate();

    assert_eq!(first, second);
    assert_eq!(first.map(|c| c.type_token), Some(helper));
    Ok(())
}

#[test]
fn five_fields_are_never_a_candidate() -> Result<()> {
    let mut module = Module::new("five.dll");
    module.add_resource(EmbeddedResource::new(RESOURCE, vec![0; 8]));

    let mut fields = protector_fields();
    fields.push(TypeSig::Object);
    add_helper(&mut module, &fields)?;

    assert_eq!(PayloadFingerprintMatcher::new(&module).candidates().count(), 0);
    Ok(())
}

#[test]
fn end_to_end_single_candidate() -> Result<()> {
    let plaintext = b"original manifest resources";
    let encrypted: Vec<u8> = deflate(plaintext).iter().map(|b| b ^ 0xA5).collect();
    let (module, helper, plain) = protected_module(encrypted)?;

    let candidates: Vec<_> = PayloadFingerprintMatcher::new(&module).candidates().collect();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].layout, "binary-reader");

    let result = Deobfuscator::new(DeobfuscatorConfig::default())
        .with_provider(Arc::new(Xor(0xA5)))
        .process(&module)?;

    let payload = result.payload.as_ref().unwrap();
    assert_eq!(payload.resource_name, RESOURCE);
    assert_eq!(payload.data, plaintext);

    assert!(result.cleanup.is_deleted(helper));
    assert_eq!(result.cleanup.resources_len(), 1);
    for token in plain {
        assert!(!result.renames.contains(token));
        assert!(!result.cleanup.is_deleted(token));
    }
    Ok(())
}

#[test]
fn delegated_routine_type_is_removed() -> Result<()> {
    let plaintext = b"resources behind a delegated routine";
    let encrypted: Vec<u8> = deflate(plaintext).iter().map(|b| b ^ 0x5A).collect();

    let mut module = Module::new("delegated.dll");
    module.add_resource(EmbeddedResource::new(RESOURCE, encrypted));
    let private_static = MethodAttributes::PRIVATE | MethodAttributes::STATIC;

    let matched = module.add_type(
        TypeDef::new("", "\u{2015}", TypeAttributes::NOT_PUBLIC).with_base(TypeSig::Object),
    );
    for sig in [TypeSig::Boolean, TypeSig::Object, TypeSig::Object] {
        module.add_field(
            matched,
            FieldDef::new("\u{2013}", FieldAttributes::PRIVATE | FieldAttributes::STATIC, sig),
        )?;
    }
    let routine_type = module.add_type(
        TypeDef::new("", "\u{2016}", TypeAttributes::NOT_PUBLIC).with_base(TypeSig::Object),
    );

    let routine = module.add_method(
        routine_type,
        MethodDef::new("\u{2017}", private_static, MethodSig::static_method(TypeSig::Void, vec![]))
            .with_body(MethodBody::new().with_locals(reader_locals()).with_string(RESOURCE)),
    )?;
    let resolver = module.add_method(
        matched,
        MethodDef::new("\u{2014}", private_static, resolver_sig())
            .with_body(MethodBody::new().with_call(routine)),
    )?;

    let result = Deobfuscator::new(DeobfuscatorConfig::default())
        .with_provider(Arc::new(Xor(0x5A)))
        .process(&module)?;

    assert_eq!(result.payload.as_ref().map(|p| p.data.as_slice()), Some(&plaintext[..]));
    assert!(result.cleanup.is_deleted(routine_type));
    assert!(result.cleanup.is_deleted(routine));
    assert!(result.cleanup.is_deleted(resolver));
    Ok(())
}

#[test]
fn unprotected_module_is_not_found() -> Result<()> {
    let module = Module::new("clean.dll");
    let config = ResourceConfig::default();
    let log = EventLog::new();
    let mut cleanup = CleanupRequest::new();

    let result = ResourceResolver::new(&module, &config, &log).execute(&Xor(0), &mut cleanup);
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(cleanup.is_empty());
    Ok(())
}

#[test]
fn batch_keeps_modules_apart() -> Result<()> {
    let encrypted: Vec<u8> = deflate(b"payload").iter().map(|b| b ^ 0x11).collect();
    let (protected, _, _) = protected_module(encrypted)?;
    let clean = Module::new("clean.dll");

    let results = Deobfuscator::new(DeobfuscatorConfig::default())
        .with_provider(Arc::new(Xor(0x11)))
        .process_batch(&[protected, clean]);

    let protected = results[0].as_ref().unwrap();
    let clean = results[1].as_ref().unwrap();
    assert_eq!(protected.payload.as_ref().map(|p| p.data.as_slice()), Some(&b"payload"[..]));
    assert!(clean.payload.is_none());
    assert!(clean.events.has(EventKind::Info));
    Ok(())
}
