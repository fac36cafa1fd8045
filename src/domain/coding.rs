//! Coded values
//!
//! [`CodeBinding`] is what a coded field offers; [`CodeableConcept`] is what
//! ends up on a resource after resolution.

use serde::{Deserialize, Serialize};

/// LOINC system URI
pub const LOINC_URI: &str = "http://loinc.org";
/// ICD-10 system URI
pub const ICD10_URI: &str = "http://hl7.org/fhir/sid/icd-10";
/// ICD-9-CM system URI
pub const ICD9_URI: &str = "http://hl7.org/fhir/sid/icd-9-cm";
/// SNOMED CT system URI
pub const SNOMED_URI: &str = "http://snomed.info/sct";
/// CPT system URI
pub const CPT_URI: &str = "http://www.ama-assn.org/go/cpt";

/// Coding system a binding was declared in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeSystem {
    /// Canonical lab vocabulary
    Loinc,
    /// Canonical diagnosis vocabulary
    Icd10,
    /// Any other declared system, raw identifier as sent
    Named(String),
    /// Local codes; the raw identifier is kept when one was sent
    Local(Option<String>),
}

impl CodeSystem {
    /// System URI to emit on a [`Coding`]
    ///
    /// Unknown named systems keep their raw identifier. Local codes without
    /// an identifier have no system.
    pub fn uri(&self) -> Option<String> {
        match self {
            CodeSystem::Loinc => Some(LOINC_URI.to_string()),
            CodeSystem::Icd10 => Some(ICD10_URI.to_string()),
            CodeSystem::Named(raw) => Some(named_system_uri(raw).unwrap_or(raw).to_string()),
            CodeSystem::Local(raw) => raw.clone(),
        }
    }

    /// True for [`CodeSystem::Local`]
    pub fn is_local(&self) -> bool {
        matches!(self, CodeSystem::Local(_))
    }
}

fn named_system_uri(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_uppercase().as_str() {
        "I9" | "I9C" | "ICD9" | "ICD-9" | "ICD9CM" | "ICD-9-CM" => Some(ICD9_URI),
        "SCT" | "SNM" | "SNM3" | "SNOMED" | "SNOMEDCT" | "SNOMED-CT" => Some(SNOMED_URI),
        "C4" | "C5" | "CPT" | "CPT4" | "CPT-4" => Some(CPT_URI),
        _ => None,
    }
}

/// One candidate code offered by a coded field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeBinding {
    pub system: CodeSystem,
    pub code: String,
    pub display: Option<String>,
}

impl CodeBinding {
    pub fn new(system: CodeSystem, code: impl Into<String>, display: Option<String>) -> Self {
        Self {
            system,
            code: code.into(),
            display: display.filter(|d| !d.is_empty()),
        }
    }

    /// Converts the binding to its output form
    pub fn to_coding(&self) -> Coding {
        Coding {
            system: self.system.uri(),
            code: self.code.clone(),
            display: self.display.clone(),
        }
    }
}

/// Output coding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Output concept: primary coding first, secondaries after
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Text-only concept, used for categories and interpretations
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    /// The primary coding, when there is one
    pub fn primary(&self) -> Option<&Coding> {
        self.coding.first()
    }
}
