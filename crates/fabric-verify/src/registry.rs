//! Verifier registry
//!
//! Provides [`VerifierRegistry`], a memo of one verifier per [`SpecKind`].

use crate::verifier::{SpecKind, SpecRef, SpecVerifier, VerifyResult};
use dashmap::DashMap;
use fabric_spec::ApplicationId;
use std::sync::Arc;

/// Cache of verifiers keyed by specification kind
///
/// Verifiers are stateless, so one instance per kind is shared by every
/// pipeline run. The map only needs to be safe under concurrent access.
#[derive(Debug, Default)]
pub struct VerifierRegistry {
    verifiers: DashMap<SpecKind, Arc<SpecVerifier>>,
}

impl VerifierRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            verifiers: DashMap::new(),
        }
    }

    /// Get the verifier for a kind, creating it on first use
    #[must_use]
    pub fn get(&self, kind: SpecKind) -> Arc<SpecVerifier> {
        if let Some(existing) = self.verifiers.get(&kind) {
            return Arc::clone(existing.value());
        }

        let verifier = self
            .verifiers
            .entry(kind)
            .or_insert_with(|| {
                tracing::debug!(%kind, "creating verifier");
                Arc::new(SpecVerifier::for_kind(kind))
            });
        Arc::clone(verifier.value())
    }

    /// Verify a specification with the verifier for its kind
    #[must_use]
    pub fn verify(&self, app_id: &ApplicationId, spec: SpecRef<'_>) -> VerifyResult {
        self.get(spec.kind()).verify(app_id, spec)
    }

    /// Check if a kind has been cached
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: SpecKind) -> bool {
        self.verifiers.contains_key(&kind)
    }

    /// Number of cached verifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    /// Check if nothing has been cached yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_spec::{ApplicationSpecification, DatasetCreationSpec, ProgramSpecification, ProgramType};

    #[test]
    fn registry_new_empty() {
        let registry = VerifierRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_memoizes_per_kind() {
        let registry = VerifierRegistry::new();
        let a = registry.get(SpecKind::Application);
        let b = registry.get(SpecKind::Application);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_program_kinds_are_distinct() {
        let registry = VerifierRegistry::new();
        let mr = registry.get(SpecKind::Program(ProgramType::MapReduce));
        let spark = registry.get(SpecKind::Program(ProgramType::Spark));
        assert!(!Arc::ptr_eq(&mr, &spark));
        assert!(registry.contains(SpecKind::Program(ProgramType::MapReduce)));
        assert!(!registry.contains(SpecKind::DatasetCreation));
    }

    #[test]
    fn registry_verify_dispatches() {
        let registry = VerifierRegistry::new();
        let app_id = ApplicationId::new("ns", "app", "1");

        let app = ApplicationSpecification::new("app");
        assert!(registry.verify(&app_id, SpecRef::Application(&app)).is_success());

        let ds = DatasetCreationSpec::new("bad name", "table");
        assert!(!registry.verify(&app_id, SpecRef::DatasetCreation(&ds)).is_success());

        let mr = ProgramSpecification::mapreduce("p1");
        assert!(registry.verify(&app_id, SpecRef::Program(&mr)).is_success());

        assert_eq!(registry.len(), 3);
    }
}
