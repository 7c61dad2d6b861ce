//! Plugin roles understood by the fuzzing engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlugError;

/// Prefix of default artifact names.
const ARTIFACT_PREFIX: &str = "FuzzGIU";

/// Suffix of scaffolded Go module names.
const MODULE_SUFFIX: &str = "FuzzGIU";

/// One of the five plugin kinds the fuzzing engine can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Transforms a single payload before it is sent.
    #[serde(rename = "payloadProc")]
    PayloadProcessor,

    /// Inspects a request/response pair and decides how the engine reacts.
    #[serde(rename = "reactor")]
    Reactor,

    /// Rewrites a fuzz job before it is scheduled.
    #[serde(rename = "preprocess")]
    Preprocessor,

    /// Produces a list of payloads.
    #[serde(rename = "payloadGen")]
    PayloadGenerator,

    /// Sends a request and returns the response.
    #[serde(rename = "reqSender")]
    RequestSender,
}

impl Role {
    /// All roles, in the order they are presented to users.
    pub const ALL: [Role; 5] = [
        Role::PayloadProcessor,
        Role::Reactor,
        Role::Preprocessor,
        Role::PayloadGenerator,
        Role::RequestSender,
    ];

    /// Identifier used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Role::PayloadProcessor => "payloadProc",
            Role::Reactor => "reactor",
            Role::Preprocessor => "preprocess",
            Role::PayloadGenerator => "payloadGen",
            Role::RequestSender => "reqSender",
        }
    }

    /// Name of the Go function the plugin author must declare.
    pub fn entry_function(self) -> &'static str {
        match self {
            Role::PayloadProcessor => "PayloadProcessor",
            Role::Reactor => "React",
            Role::Preprocessor => "Preprocessor",
            Role::PayloadGenerator => "PayloadGenerator",
            Role::RequestSender => "ReqSender",
        }
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Role::PayloadProcessor => "transforms each payload before it is sent",
            Role::Reactor => "reacts to a request/response pair",
            Role::Preprocessor => "rewrites a fuzz job before it runs",
            Role::PayloadGenerator => "generates a list of payloads",
            Role::RequestSender => "sends a request and returns the response",
        }
    }

    /// File name of the wrapper template, e.g. `tmplReactor.gotmp`.
    pub fn template_name(self) -> String {
        let id = self.id();
        let mut chars = id.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("tmpl{}.gotmp", capitalized)
    }

    /// Default shared library name for this role on the current platform.
    pub fn default_artifact_name(self) -> String {
        format!(
            "{}{}.{}",
            ARTIFACT_PREFIX,
            self.entry_function(),
            std::env::consts::DLL_EXTENSION
        )
    }

    /// Module name written to `go.mod` by the scaffold generator.
    pub fn default_module_name(self) -> String {
        format!("{}{}", self.entry_function(), MODULE_SUFFIX)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Role {
    type Err = PlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.id() == s)
            .ok_or_else(|| PlugError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_id() {
        for role in Role::ALL {
            assert_eq!(role.id().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        let err = "payloadProcessor".parse::<Role>().unwrap_err();
        assert!(matches!(err, PlugError::UnknownRole(ref s) if s == "payloadProcessor"));
    }

    #[test]
    fn test_template_name() {
        assert_eq!(Role::PayloadProcessor.template_name(), "tmplPayloadProc.gotmp");
        assert_eq!(Role::Reactor.template_name(), "tmplReactor.gotmp");
        assert_eq!(Role::RequestSender.template_name(), "tmplReqSender.gotmp");
    }

    #[test]
    fn test_default_names() {
        let artifact = Role::Reactor.default_artifact_name();
        assert!(artifact.starts_with("FuzzGIUReact."));
        assert_eq!(Role::Preprocessor.default_module_name(), "PreprocessorFuzzGIU");
    }
}
