//! Go source templates with placeholder comments.
//!
//! A template is split once into literal text and marker slots. Each marker
//! may appear at most once and is bound at most once; rendering joins the
//! segments without rescanning substituted text.

use std::fmt;

use fuzzplug_core::{PlugError, Result, Role};

const PAYLOAD_PROC: &str = include_str!("../templates/tmplPayloadProc.gotmp");
const REACTOR: &str = include_str!("../templates/tmplReactor.gotmp");
const PREPROCESS: &str = include_str!("../templates/tmplPreprocess.gotmp");
const PAYLOAD_GEN: &str = include_str!("../templates/tmplPayloadGen.gotmp");
const REQ_SENDER: &str = include_str!("../templates/tmplReqSender.gotmp");
const PLUGIN: &str = include_str!("../templates/plugin.gotmp");

/// Declarations of the shared `fuzzTypes` package.
pub const FUZZ_TYPES_SOURCE: &str = include_str!("../templates/fuzzTypes.go");

/// File name of the scaffold template.
pub const PLUGIN_TEMPLATE_NAME: &str = "plugin.gotmp";

/// A placeholder comment inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    ModuleName,
    CustomImports,
    FormalParameters,
    ActualParameters,
    Code,
    PluginImports,
    PluginFunction,
}

impl Marker {
    pub const ALL: [Marker; 7] = [
        Marker::ModuleName,
        Marker::CustomImports,
        Marker::FormalParameters,
        Marker::ActualParameters,
        Marker::Code,
        Marker::PluginImports,
        Marker::PluginFunction,
    ];

    /// Markers every wrapper template must contain.
    pub const WRAPPER: [Marker; 4] = [
        Marker::CustomImports,
        Marker::FormalParameters,
        Marker::ActualParameters,
        Marker::Code,
    ];

    /// The comment text of the marker as it appears in a template.
    pub fn text(self) -> &'static str {
        match self {
            Marker::ModuleName => "/* MODULE NAME */",
            Marker::CustomImports => "/* CUSTOM IMPORTS */",
            Marker::FormalParameters => "/* FORMAL PARAMETERS */",
            Marker::ActualParameters => "/* ACTUAL PARAMETERS */",
            Marker::Code => "/* CODE */",
            Marker::PluginImports => "/* PLUGIN IMPORTS */",
            Marker::PluginFunction => "/* PLUGIN FUNCTION */",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Slot {
        marker: Marker,
        value: Option<String>,
    },
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Splits `text` into literal segments and marker slots.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut seen: Vec<Marker> = Vec::new();
        let mut rest = text;

        loop {
            let next = Marker::ALL
                .into_iter()
                .filter_map(|marker| rest.find(marker.text()).map(|at| (at, marker)))
                .min_by_key(|(at, _)| *at);

            let Some((at, marker)) = next else {
                if !rest.is_empty() {
                    segments.push(Segment::Text(rest.to_string()));
                }
                break;
            };

            if seen.contains(&marker) {
                return Err(PlugError::Template {
                    template: name,
                    message: format!("marker {} occurs more than once", marker),
                });
            }
            seen.push(marker);

            if at > 0 {
                segments.push(Segment::Text(rest[..at].to_string()));
            }
            segments.push(Segment::Slot {
                marker,
                value: None,
            });
            rest = &rest[at + marker.text().len()..];
        }

        Ok(Self { name, segments })
    }

    /// The compiled-in wrapper template for `role`.
    pub fn for_role(role: Role) -> Result<Self> {
        let text = match role {
            Role::PayloadProcessor => PAYLOAD_PROC,
            Role::Reactor => REACTOR,
            Role::Preprocessor => PREPROCESS,
            Role::PayloadGenerator => PAYLOAD_GEN,
            Role::RequestSender => REQ_SENDER,
        };

        let template = Self::parse(role.template_name(), text)?;
        template.require(&Marker::WRAPPER)?;
        Ok(template)
    }

    /// The compiled-in starter `plugin.go` template.
    pub fn scaffold() -> Result<Self> {
        let template = Self::parse(PLUGIN_TEMPLATE_NAME, PLUGIN)?;
        template.require(&[Marker::PluginImports, Marker::PluginFunction])?;
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the template contains `marker`.
    pub fn has(&self, marker: Marker) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot { marker: m, .. } if *m == marker))
    }

    /// Fails unless every marker in `markers` is present.
    pub fn require(&self, markers: &[Marker]) -> Result<()> {
        match markers.iter().find(|m| !self.has(**m)) {
            Some(missing) => Err(self.error(format!("marker {} is missing", missing))),
            None => Ok(()),
        }
    }

    /// Sets the substitution for `marker`.
    pub fn bind(&mut self, marker: Marker, text: impl Into<String>) -> Result<()> {
        let slot = self.segments.iter_mut().find_map(|s| match s {
            Segment::Slot { marker: m, value } if *m == marker => Some(value),
            _ => None,
        });

        let message = match slot {
            None => format!("marker {} is missing", marker),
            Some(Some(_)) => format!("marker {} is already bound", marker),
            Some(value) => {
                *value = Some(text.into());
                return Ok(());
            }
        };
        Err(self.error(message))
    }

    /// Renders the template, leaving unbound markers in place.
    pub fn source(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(text) => text.as_str(),
                Segment::Slot {
                    value: Some(value), ..
                } => value.as_str(),
                Segment::Slot {
                    marker,
                    value: None,
                } => marker.text(),
            })
            .collect()
    }

    /// Renders the template; every marker must have been bound.
    pub fn finish(self) -> Result<String> {
        let unbound = self.segments.iter().find_map(|s| match s {
            Segment::Slot {
                marker,
                value: None,
            } => Some(*marker),
            _ => None,
        });

        match unbound {
            Some(marker) => Err(self.error(format!("marker {} was not substituted", marker))),
            None => Ok(self.source()),
        }
    }

    fn error(&self, message: String) -> PlugError {
        PlugError::Template {
            template: self.name.clone(),
            message,
        }
    }
}
