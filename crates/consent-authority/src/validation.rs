//! Real-time consent validation

use crate::{ConsentError, SigningAuthority};
use chrono::Utc;
use consent_domain::{ConsentStore, DenialReason, Grant, ValidationQuery, Verdict};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers "is this consent currently valid?"
///
/// Read-only with respect to the store.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    signer: Arc<SigningAuthority>,
}

impl ValidationEngine {
    /// Create an engine verifying against `signer`
    pub fn new(signer: Arc<SigningAuthority>) -> Self {
        Self { signer }
    }

    /// Validate a query against every artifact in `store`
    ///
    /// The first artifact that is active, unexpired, matches principal,
    /// fiduciary, purpose and data types, and carries a proof that verifies
    /// against its current content wins. An artifact whose proof fails is
    /// logged and skipped; it never grants and never aborts the scan.
    pub fn validate<S>(&self, store: &S, query: &ValidationQuery) -> Result<Verdict, ConsentError>
    where
        S: ConsentStore,
        S::Error: Display,
    {
        let missing = query.missing_fields();
        if !missing.is_empty() {
            return Err(ConsentError::missing_fields(&missing));
        }

        let now = Utc::now();
        let candidates = store.values().map_err(ConsentError::store)?;
        debug!(
            candidates = candidates.len(),
            principal = %query.principal_id,
            fiduciary = %query.fiduciary_id,
            purpose = %query.purpose_id,
            "Scanning consents"
        );

        for artifact in candidates.iter().filter(|a| a.matches(query, now)) {
            if let Err(e) = self.signer.verify_artifact(artifact) {
                warn!(
                    consent_id = %artifact.consent_id,
                    error = %e,
                    "Invalid signature for consent"
                );
                continue;
            }

            if let Some(grant) = Grant::from_artifact(artifact) {
                debug!(consent_id = %grant.consent_id, "Consent matched");
                return Ok(Verdict::Granted(grant));
            }
        }

        Ok(Verdict::Denied(DenialReason::NoMatchingConsent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConsentManager;
    use chrono::Duration;
    use consent_domain::{ConsentStore, NewConsent, Party, Purpose};
    use consent_store::MemoryStore;

    struct Fixture {
        manager: ConsentManager<MemoryStore>,
        engine: ValidationEngine,
        raw_store: MemoryStore,
    }

    fn fixture() -> Fixture {
        let signer = Arc::new(SigningAuthority::generate("consent-manager", "consent-key").unwrap());
        let raw_store = MemoryStore::new();
        Fixture {
            manager: ConsentManager::new(raw_store.clone(), Arc::clone(&signer)),
            engine: ValidationEngine::new(signer),
            raw_store,
        }
    }

    fn request() -> NewConsent {
        NewConsent::new(Party::new("P1"), Party::new("F1"), vec![Purpose::new("buy")])
            .with_data_types(["email", "phone"])
    }

    impl Fixture {
        fn check(&self, query: ValidationQuery) -> Verdict {
            self.engine.validate(self.manager.store(), &query).unwrap()
        }
    }

    #[test]
    fn test_match_returns_grant() {
        let mut fx = fixture();
        let artifact = fx.manager.create(request()).unwrap();

        let verdict = fx.check(ValidationQuery::new("P1", "F1", "buy"));
        let grant = verdict.grant().unwrap();
        assert_eq!(grant.consent_id, artifact.consent_id);
        assert_eq!(grant.granted_at, artifact.granted_at);
        assert_eq!(grant.proof.jws, artifact.proof.unwrap().jws);
    }

    #[test]
    fn test_missing_query_fields() {
        let fx = fixture();
        let result = fx
            .engine
            .validate(fx.manager.store(), &ValidationQuery::new("P1", "", "buy"));
        match result {
            Err(ConsentError::Validation(msg)) => assert_eq!(msg, "fiduciary_id required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_data_type_subset() {
        let mut fx = fixture();
        fx.manager.create(request()).unwrap();

        let query = || ValidationQuery::new("P1", "F1", "buy");
        assert!(fx.check(query().with_data_types(["email"])).is_valid());
        assert!(fx.check(query().with_data_types(Vec::<String>::new())).is_valid());
        assert!(!fx.check(query().with_data_types(["email", "address"])).is_valid());
    }

    #[test]
    fn test_expired_consent_never_validates() {
        let mut fx = fixture();
        fx.manager
            .create(request().with_expires_at(Utc::now() - Duration::minutes(1)))
            .unwrap();

        let verdict = fx.check(ValidationQuery::new("P1", "F1", "buy"));
        assert_eq!(verdict, Verdict::Denied(DenialReason::NoMatchingConsent));
    }

    #[test]
    fn test_tampered_consent_skipped_but_scan_continues() {
        let mut fx = fixture();
        let tampered = fx.manager.create(request()).unwrap();
        let honest = fx.manager.create(request()).unwrap();

        let mut forged = tampered.clone();
        forged.data_types.push("address".to_string());
        fx.raw_store.update(&tampered.consent_id, forged).unwrap();

        let verdict = fx.check(ValidationQuery::new("P1", "F1", "buy"));
        assert_eq!(verdict.grant().unwrap().consent_id, honest.consent_id);

        // The forged data type exists only on the tampered record
        let verdict = fx.check(ValidationQuery::new("P1", "F1", "buy").with_data_types(["address"]));
        assert!(!verdict.is_valid());
    }

    #[test]
    fn test_oldest_match_wins() {
        let mut fx = fixture();
        let first = fx.manager.create(request()).unwrap();
        fx.manager.create(request()).unwrap();

        let verdict = fx.check(ValidationQuery::new("P1", "F1", "buy"));
        assert_eq!(verdict.grant().unwrap().consent_id, first.consent_id);
    }
}
