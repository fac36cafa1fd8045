//! Code system resolution
//!
//! A coded field (CE/CWE) can offer several codes for one concept, e.g. a
//! local lab code next to its LOINC equivalent. [`CodeResolver`] picks one
//! primary code deterministically and keeps the rest as secondary codings.
//!
//! Ranking, lowest wins:
//!
//! | rank | binding |
//! |---|---|
//! | 0 | canonical vocabulary of the concept kind (LOINC for lab, ICD-10 for diagnosis) |
//! | 1 | any other named system |
//! | 2 | local or unspecified |
//!
//! Equal ranks keep input order, so the first same-system candidate wins.

use crate::config::TerminologyConfig;
use crate::core::parse::Field;
use crate::domain::coding::{CodeBinding, CodeSystem, CodeableConcept};
use std::collections::BTreeSet;

const LAB_SYSTEMS: &[&str] = &["LN", "LOINC"];
const DIAGNOSIS_SYSTEMS: &[&str] = &["I10", "I10C", "ICD10", "ICD-10", "ICD10CM", "ICD-10-CM"];

/// Which canonical vocabulary a concept prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptKind {
    Lab,
    Diagnosis,
}

/// Result of resolution: the chosen binding plus the other distinct ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCode {
    pub primary: CodeBinding,
    pub secondary: Vec<CodeBinding>,
}

impl ResolvedCode {
    /// Output concept with the primary coding first
    pub fn into_concept(self) -> CodeableConcept {
        let coding = std::iter::once(&self.primary)
            .chain(self.secondary.iter())
            .map(CodeBinding::to_coding)
            .collect();
        CodeableConcept { coding, text: None }
    }
}

/// Classifies system identifiers and ranks candidate codes
///
/// Alias tables are fixed at construction and shared read-only.
#[derive(Debug, Clone)]
pub struct CodeResolver {
    lab_aliases: BTreeSet<String>,
    diagnosis_aliases: BTreeSet<String>,
}

impl Default for CodeResolver {
    fn default() -> Self {
        Self::with_aliases(std::iter::empty::<&str>(), std::iter::empty::<&str>())
    }
}

impl CodeResolver {
    /// Built-in identifiers plus extra aliases for each canonical vocabulary
    ///
    /// Aliases are matched case-insensitively.
    pub fn with_aliases<L, D>(lab: L, diagnosis: D) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let normalize = |s: &str| s.trim().to_ascii_uppercase();
        let lab_aliases = LAB_SYSTEMS
            .iter()
            .copied()
            .map(normalize)
            .chain(lab.into_iter().map(|s| normalize(s.as_ref())))
            .filter(|s| !s.is_empty())
            .collect();
        let diagnosis_aliases = DIAGNOSIS_SYSTEMS
            .iter()
            .copied()
            .map(normalize)
            .chain(diagnosis.into_iter().map(|s| normalize(s.as_ref())))
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            lab_aliases,
            diagnosis_aliases,
        }
    }

    pub fn from_config(config: &TerminologyConfig) -> Self {
        Self::with_aliases(
            &config.lab_system_aliases,
            &config.diagnosis_system_aliases,
        )
    }

    /// Maps a raw coding-system identifier (CE-3 / CE-6) to a [`CodeSystem`]
    pub fn classify(&self, raw: &str) -> CodeSystem {
        let raw = raw.trim();
        if raw.is_empty() {
            return CodeSystem::Local(None);
        }
        let upper = raw.to_ascii_uppercase();
        if self.lab_aliases.contains(&upper) {
            CodeSystem::Loinc
        } else if self.diagnosis_aliases.contains(&upper) {
            CodeSystem::Icd10
        } else if upper == "L" || upper.starts_with("99") {
            CodeSystem::Local(Some(raw.to_string()))
        } else {
            CodeSystem::Named(raw.to_string())
        }
    }

    /// Candidate bindings offered by a coded field
    ///
    /// Components 1-3 and 4-6 of every repetition each form one triplet;
    /// triplets without a code are skipped.
    pub fn bindings(&self, field: &Field) -> Vec<CodeBinding> {
        let mut out = Vec::new();
        for rep in field.repetitions() {
            for offset in [0, 3] {
                let code = rep.text(offset + 1).trim();
                if code.is_empty() {
                    continue;
                }
                let display = rep.text(offset + 2).trim();
                let system = self.classify(rep.text(offset + 3));
                out.push(CodeBinding::new(
                    system,
                    code,
                    Some(display.to_string()),
                ));
            }
        }
        out
    }

    fn rank(binding: &CodeBinding, kind: ConceptKind) -> u8 {
        match (&binding.system, kind) {
            (CodeSystem::Loinc, ConceptKind::Lab) | (CodeSystem::Icd10, ConceptKind::Diagnosis) => 0,
            (CodeSystem::Local(_), _) => 2,
            _ => 1,
        }
    }

    /// Picks the primary binding; `None` when there are no candidates
    pub fn resolve(&self, bindings: &[CodeBinding], kind: ConceptKind) -> Option<ResolvedCode> {
        // min_by_key keeps the first of equal ranks
        let primary = bindings.iter().min_by_key(|b| Self::rank(b, kind))?;

        let mut seen = vec![(&primary.system, primary.code.as_str())];
        let mut secondary = Vec::new();
        for b in bindings {
            let key = (&b.system, b.code.as_str());
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            secondary.push(b.clone());
        }

        tracing::trace!(
            code = %primary.code,
            secondary = secondary.len(),
            "Resolved code"
        );
        Some(ResolvedCode {
            primary: primary.clone(),
            secondary,
        })
    }

    /// Bindings of `field` resolved straight into an output concept
    pub fn concept(&self, field: Option<&Field>, kind: ConceptKind) -> Option<CodeableConcept> {
        let bindings = self.bindings(field?);
        self.resolve(&bindings, kind).map(ResolvedCode::into_concept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::parse_message;
    use crate::domain::coding::{ICD10_URI, LOINC_URI};
    use test_case::test_case;

    fn binding(system: CodeSystem, code: &str) -> CodeBinding {
        CodeBinding::new(system, code, None)
    }

    #[test_case("LN", CodeSystem::Loinc ; "loinc")]
    #[test_case("ln", CodeSystem::Loinc ; "loinc lower case")]
    #[test_case("I10", CodeSystem::Icd10 ; "icd10")]
    #[test_case("ICD-10-CM", CodeSystem::Icd10 ; "icd10 cm")]
    #[test_case("SCT", CodeSystem::Named("SCT".into()) ; "snomed is named")]
    #[test_case("I9C", CodeSystem::Named("I9C".into()) ; "icd9 is named")]
    #[test_case("L", CodeSystem::Local(Some("L".into())) ; "local")]
    #[test_case("99ZLAB", CodeSystem::Local(Some("99ZLAB".into())) ; "local 99 prefix")]
    #[test_case("", CodeSystem::Local(None) ; "absent")]
    fn test_classify(raw: &str, expected: CodeSystem) {
        assert_eq!(CodeResolver::default().classify(raw), expected);
    }

    #[test]
    fn test_configured_aliases() {
        let resolver = CodeResolver::with_aliases(["loinc-2"], ["ICD10X"]);
        assert_eq!(resolver.classify("LOINC-2"), CodeSystem::Loinc);
        assert_eq!(resolver.classify("icd10x"), CodeSystem::Icd10);
        assert_eq!(resolver.classify("LN"), CodeSystem::Loinc);
    }

    #[test]
    fn test_canonical_wins_regardless_of_order() {
        let resolver = CodeResolver::default();
        let local = binding(CodeSystem::Local(Some("L".into())), "GLU-L");
        let loinc = binding(CodeSystem::Loinc, "2345-7");
        for input in [vec![local.clone(), loinc.clone()], vec![loinc.clone(), local.clone()]] {
            let resolved = resolver.resolve(&input, ConceptKind::Lab).unwrap();
            assert_eq!(resolved.primary, loinc);
            assert_eq!(resolved.secondary, vec![local.clone()]);
        }
    }

    #[test]
    fn test_kind_selects_canonical_vocabulary() {
        let resolver = CodeResolver::default();
        let input = vec![binding(CodeSystem::Loinc, "X"), binding(CodeSystem::Icd10, "E11.9")];
        assert_eq!(
            resolver.resolve(&input, ConceptKind::Diagnosis).unwrap().primary.code,
            "E11.9"
        );
        assert_eq!(resolver.resolve(&input, ConceptKind::Lab).unwrap().primary.code, "X");
    }

    #[test]
    fn test_named_beats_local() {
        let resolver = CodeResolver::default();
        let input = vec![
            binding(CodeSystem::Local(None), "A"),
            binding(CodeSystem::Named("SCT".into()), "B"),
        ];
        assert_eq!(resolver.resolve(&input, ConceptKind::Lab).unwrap().primary.code, "B");
    }

    #[test]
    fn test_same_system_first_occurrence_wins() {
        let resolver = CodeResolver::default();
        let input = vec![binding(CodeSystem::Loinc, "FIRST"), binding(CodeSystem::Loinc, "SECOND")];
        let resolved = resolver.resolve(&input, ConceptKind::Lab).unwrap();
        assert_eq!(resolved.primary.code, "FIRST");
        assert_eq!(resolved.secondary[0].code, "SECOND");
    }

    #[test]
    fn test_duplicates_collapse() {
        let resolver = CodeResolver::default();
        let input = vec![binding(CodeSystem::Loinc, "A"), binding(CodeSystem::Loinc, "A")];
        assert!(resolver.resolve(&input, ConceptKind::Lab).unwrap().secondary.is_empty());
    }

    #[test]
    fn test_no_bindings_no_code() {
        assert!(CodeResolver::default().resolve(&[], ConceptKind::Lab).is_none());
        assert!(CodeResolver::default().concept(None, ConceptKind::Lab).is_none());
    }

    #[test]
    fn test_bindings_from_field() {
        let msg = parse_message(
            "MSH|^~\\&|A\rOBX|1|NM|GLU-L^Glucose local^L^2345-7^Glucose^LN~^^^X1^^",
        )
        .unwrap();
        let field = msg.field("OBX", 3).unwrap();
        let resolver = CodeResolver::default();
        let bindings = resolver.bindings(field);
        let codes: Vec<&str> = bindings.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["GLU-L", "2345-7", "X1"]);
        assert_eq!(bindings[2].system, CodeSystem::Local(None));
        assert!(bindings[2].display.is_none());

        let concept = resolver.concept(Some(field), ConceptKind::Lab).unwrap();
        let primary = concept.primary().unwrap();
        assert_eq!(primary.system.as_deref(), Some(LOINC_URI));
        assert_eq!(primary.code, "2345-7");
        assert_eq!(primary.display.as_deref(), Some("Glucose"));
        assert_eq!(concept.coding.len(), 3);
    }

    #[test]
    fn test_local_without_system_is_unspecified() {
        let msg = parse_message("MSH|^~\\&|A\rDG1|1||X99^Local dx").unwrap();
        let concept = CodeResolver::default()
            .concept(msg.field("DG1", 3), ConceptKind::Diagnosis)
            .unwrap();
        assert!(concept.coding[0].system.is_none());
        assert_ne!(concept.coding[0].system.as_deref(), Some(ICD10_URI));
    }
}
