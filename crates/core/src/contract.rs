//! Calling contracts each plugin role must satisfy.
//!
//! A contract fixes the leading parameters of the entry function (supplied
//! by the fuzzing engine at call time) and its return type. Everything after
//! the fixed prefix is a custom parameter chosen by the plugin author.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlugError, Result};
use crate::role::Role;
use crate::signature::{Parameter, Signature};

/// Package that declares the types shared between plugins and the engine.
pub const SHARED_PACKAGE: &str = "fuzzTypes";

/// A parameter every implementation of a role must declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedParam {
    pub name: &'static str,
    pub ty: &'static str,
}

/// Fixed prefix and return type of a role's entry function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleContract {
    pub role: Role,
    pub fixed: &'static [FixedParam],
    pub returns: &'static str,
}

const PAYLOAD_PROCESSOR: RoleContract = RoleContract {
    role: Role::PayloadProcessor,
    fixed: &[FixedParam {
        name: "payload",
        ty: "string",
    }],
    returns: "string",
};

const REACTOR: RoleContract = RoleContract {
    role: Role::Reactor,
    fixed: &[
        FixedParam {
            name: "request",
            ty: "*fuzzTypes.Req",
        },
        FixedParam {
            name: "resp",
            ty: "*fuzzTypes.Resp",
        },
    ],
    returns: "*fuzzTypes.Reaction",
};

const PREPROCESSOR: RoleContract = RoleContract {
    role: Role::Preprocessor,
    fixed: &[FixedParam {
        name: "fuzz",
        ty: "*fuzzTypes.Fuzz",
    }],
    returns: "*fuzzTypes.Fuzz",
};

const PAYLOAD_GENERATOR: RoleContract = RoleContract {
    role: Role::PayloadGenerator,
    fixed: &[],
    returns: "[]string",
};

const REQUEST_SENDER: RoleContract = RoleContract {
    role: Role::RequestSender,
    fixed: &[FixedParam {
        name: "sendMeta",
        ty: "*fuzzTypes.SendMeta",
    }],
    returns: "*fuzzTypes.Resp",
};

impl Role {
    /// The calling contract of this role.
    pub fn contract(self) -> &'static RoleContract {
        match self {
            Role::PayloadProcessor => &PAYLOAD_PROCESSOR,
            Role::Reactor => &REACTOR,
            Role::Preprocessor => &PREPROCESSOR,
            Role::PayloadGenerator => &PAYLOAD_GENERATOR,
            Role::RequestSender => &REQUEST_SENDER,
        }
    }
}

/// Why a signature does not satisfy a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    /// The function declares fewer parameters than the fixed prefix.
    MissingParameter { position: usize, expected: String },

    /// A fixed parameter has the wrong name.
    ParameterName {
        position: usize,
        expected: String,
        found: String,
    },

    /// A fixed parameter has the wrong type.
    ParameterType {
        position: usize,
        expected: String,
        found: String,
    },

    /// The return type differs from the contract.
    ReturnType { expected: String, found: String },
}

impl Mismatch {
    /// Position of the offending parameter, if the mismatch is about one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Mismatch::MissingParameter { position, .. }
            | Mismatch::ParameterName { position, .. }
            | Mismatch::ParameterType { position, .. } => Some(*position),
            Mismatch::ReturnType { .. } => None,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::MissingParameter { position, expected } => {
                write!(f, "missing parameter {} `{}`", position, expected)
            }
            Mismatch::ParameterName {
                position,
                expected,
                found,
            } => write!(
                f,
                "parameter {} is named `{}`, expected `{}`",
                position, found, expected
            ),
            Mismatch::ParameterType {
                position,
                expected,
                found,
            } => write!(
                f,
                "parameter {} has type `{}`, expected `{}`",
                position, found, expected
            ),
            Mismatch::ReturnType { expected, found } => {
                write!(f, "returns `{}`, expected `{}`", found, expected)
            }
        }
    }
}

/// Package names under which the shared types may be referenced.
///
/// `fuzzTypes` is always accepted; aliases bound to the shared package by the
/// plugin's imports can be added. Unqualified names are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifiers {
    names: Vec<String>,
}

impl Default for Qualifiers {
    fn default() -> Self {
        Self {
            names: vec![SHARED_PACKAGE.to_string()],
        }
    }
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `alias` as another name for the shared package.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.names.contains(&alias) {
            self.names.push(alias);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Strips an accepted qualifier from the named type at the core of `ty`.
    ///
    /// `*fuzzTypes.Req` becomes `*Req`; `[]other.Req` is returned unchanged.
    pub fn strip<'a>(&self, ty: &'a str) -> Cow<'a, str> {
        let core_start = ty.len() - ty.trim_start_matches(['*', '[', ']']).len();
        let (prefix, core) = ty.split_at(core_start);
        match core.split_once('.') {
            Some((qualifier, name)) if self.contains(qualifier) && !name.contains('.') => {
                Cow::Owned(format!("{}{}", prefix, name))
            }
            _ => Cow::Borrowed(ty),
        }
    }

    /// Whether a declared type satisfies an expected contract type.
    pub fn types_match(&self, expected: &str, found: &str) -> bool {
        expected == found || self.strip(expected) == self.strip(found)
    }
}

impl RoleContract {
    /// Example signature shown to users when validation fails.
    pub fn example(&self) -> String {
        let mut params: Vec<String> = self
            .fixed
            .iter()
            .map(|p| format!("{} {}", p.name, p.ty))
            .collect();
        params.push("{custom arguments}".to_string());

        format!(
            "{}({}) {}",
            self.role.entry_function(),
            params.join(", "),
            self.returns
        )
    }

    /// Checks `signature` against the contract, returning the custom parameters.
    pub fn validate(&self, signature: &Signature) -> Result<Vec<Parameter>> {
        self.validate_with(signature, &Qualifiers::default())
    }

    /// Like [`RoleContract::validate`], accepting extra shared-package aliases.
    pub fn validate_with(
        &self,
        signature: &Signature,
        qualifiers: &Qualifiers,
    ) -> Result<Vec<Parameter>> {
        self.check(signature, qualifiers)
            .map_err(|mismatch| PlugError::ContractMismatch {
                role: self.role,
                mismatch,
                expected: self.example(),
            })?;

        Ok(signature.parameters[self.fixed.len()..].to_vec())
    }

    fn check(&self, signature: &Signature, qualifiers: &Qualifiers) -> std::result::Result<(), Mismatch> {
        for (position, fixed) in self.fixed.iter().enumerate() {
            let Some(param) = signature.parameters.get(position) else {
                return Err(Mismatch::MissingParameter {
                    position,
                    expected: format!("{} {}", fixed.name, fixed.ty),
                });
            };

            if param.name != fixed.name {
                return Err(Mismatch::ParameterName {
                    position,
                    expected: fixed.name.to_string(),
                    found: param.name.clone(),
                });
            }

            if !qualifiers.types_match(fixed.ty, param.ty.as_str()) {
                return Err(Mismatch::ParameterType {
                    position,
                    expected: fixed.ty.to_string(),
                    found: param.ty.to_string(),
                });
            }
        }

        if !qualifiers.types_match(self.returns, signature.return_type.as_str()) {
            return Err(Mismatch::ReturnType {
                expected: self.returns.to_string(),
                found: signature.return_type.to_string(),
            });
        }

        Ok(())
    }
}

/// Validates `signature` against the contract of `role`.
pub fn validate(role: Role, signature: &Signature) -> Result<Vec<Parameter>> {
    role.contract().validate(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(params: &[(&str, &str)], ret: &str) -> Signature {
        Signature::new(
            params.iter().map(|(n, t)| Parameter::new(*n, *t)).collect(),
            ret,
        )
    }

    fn mismatch_of(err: PlugError) -> Mismatch {
        match err {
            PlugError::ContractMismatch { mismatch, .. } => mismatch,
            other => panic!("expected contract mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_processor_custom_params() {
        let signature = sig(&[("payload", "string"), ("seed", "int")], "string");
        let custom = validate(Role::PayloadProcessor, &signature).unwrap();
        assert_eq!(custom, vec![Parameter::new("seed", "int")]);
    }

    #[test]
    fn test_reactor_swapped_types() {
        let signature = sig(&[("request", "*Resp"), ("resp", "*Req")], "*Reaction");
        let err = validate(Role::Reactor, &signature).unwrap_err();
        let mismatch = mismatch_of(err);
        assert_eq!(mismatch.position(), Some(0));
        assert!(matches!(mismatch, Mismatch::ParameterType { .. }));
    }

    #[test]
    fn test_reactor_accepts_qualified_and_unqualified() {
        let qualified = sig(
            &[("request", "*fuzzTypes.Req"), ("resp", "*fuzzTypes.Resp"), ("n", "int")],
            "*fuzzTypes.Reaction",
        );
        assert_eq!(
            validate(Role::Reactor, &qualified).unwrap(),
            vec![Parameter::new("n", "int")]
        );

        let unqualified = sig(&[("request", "*Req"), ("resp", "*Resp")], "*Reaction");
        assert!(validate(Role::Reactor, &unqualified).unwrap().is_empty());
    }

    #[test]
    fn test_foreign_qualifier_rejected() {
        let signature = sig(&[("fuzz", "*other.Fuzz")], "*fuzzTypes.Fuzz");
        let err = validate(Role::Preprocessor, &signature).unwrap_err();
        assert_eq!(mismatch_of(err).position(), Some(0));
    }

    #[test]
    fn test_alias_qualifier_accepted() {
        let signature = sig(&[("sendMeta", "*ft.SendMeta")], "*ft.Resp");
        assert!(validate(Role::RequestSender, &signature).is_err());

        let qualifiers = Qualifiers::new().with_alias("ft");
        let custom = Role::RequestSender
            .contract()
            .validate_with(&signature, &qualifiers)
            .unwrap();
        assert!(custom.is_empty());
    }

    #[test]
    fn test_payload_generator_has_no_prefix() {
        let signature = sig(&[], "[]string");
        assert!(validate(Role::PayloadGenerator, &signature).unwrap().is_empty());

        let with_custom = sig(&[("count", "int"), ("prefix", "string")], "[]string");
        assert_eq!(
            validate(Role::PayloadGenerator, &with_custom).unwrap(),
            with_custom.parameters
        );
    }

    #[test]
    fn test_wrong_name_is_rejected() {
        let signature = sig(&[("p", "string")], "string");
        let mismatch = mismatch_of(validate(Role::PayloadProcessor, &signature).unwrap_err());
        assert_eq!(
            mismatch,
            Mismatch::ParameterName {
                position: 0,
                expected: "payload".to_string(),
                found: "p".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_parameter() {
        let signature = sig(&[("request", "*Req")], "*Reaction");
        let mismatch = mismatch_of(validate(Role::Reactor, &signature).unwrap_err());
        assert!(matches!(mismatch, Mismatch::MissingParameter { position: 1, .. }));
    }

    #[test]
    fn test_return_type_mismatch() {
        let signature = sig(&[("payload", "string")], "(string, error)");
        let mismatch = mismatch_of(validate(Role::PayloadProcessor, &signature).unwrap_err());
        assert_eq!(mismatch.position(), None);
        assert!(mismatch.to_string().contains("(string, error)"));
    }

    #[test]
    fn test_error_shows_example_signature() {
        let signature = sig(&[], "void");
        let err = validate(Role::Reactor, &signature).unwrap_err();
        let PlugError::ContractMismatch { expected, .. } = err else {
            panic!("expected contract mismatch");
        };
        assert_eq!(
            expected,
            "React(request *fuzzTypes.Req, resp *fuzzTypes.Resp, {custom arguments}) *fuzzTypes.Reaction"
        );
    }

    #[test]
    fn test_strip_qualifier() {
        let q = Qualifiers::default();
        assert_eq!(q.strip("*fuzzTypes.Req"), "*Req");
        assert_eq!(q.strip("[]*fuzzTypes.Req"), "[]*Req");
        assert_eq!(q.strip("*http.Request"), "*http.Request");
        assert_eq!(q.strip("string"), "string");
    }

    use proptest::prelude::*;

    fn custom_params() -> impl Strategy<Value = Vec<Parameter>> {
        prop::collection::vec(
            (
                "c[a-zA-Z0-9]{0,6}",
                prop::sample::select(vec!["int", "string", "[]string", "*fuzzTypes.Req"]),
            )
                .prop_map(|(name, ty)| Parameter::new(name, ty)),
            0..5,
        )
    }

    fn full_signature(contract: &RoleContract, custom: &[Parameter]) -> Signature {
        let mut params: Vec<Parameter> = contract
            .fixed
            .iter()
            .map(|p| Parameter::new(p.name, p.ty))
            .collect();
        params.extend_from_slice(custom);
        Signature::new(params, contract.returns)
    }

    proptest! {
        #[test]
        fn test_validate_returns_suffix_after_fixed_prefix(
            role in prop::sample::select(Role::ALL.to_vec()),
            custom in custom_params(),
        ) {
            let contract = role.contract();
            let signature = full_signature(contract, &custom);
            let validated = contract.validate_with(&signature, &Qualifiers::default()).unwrap();
            prop_assert_eq!(validated, custom);
        }

        #[test]
        fn test_renamed_fixed_parameter_is_rejected(
            role in prop::sample::select(Role::ALL.to_vec()),
            custom in custom_params(),
            index in any::<prop::sample::Index>(),
        ) {
            let contract = role.contract();
            prop_assume!(!contract.fixed.is_empty());

            let mut signature = full_signature(contract, &custom);
            let position = index.index(contract.fixed.len());
            signature.parameters[position].name.push('X');

            let err = contract.validate_with(&signature, &Qualifiers::default()).unwrap_err();
            prop_assert_eq!(mismatch_of(err).position(), Some(position));
        }
    }
}
