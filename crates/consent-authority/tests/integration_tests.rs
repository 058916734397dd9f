//! Integration tests for the consent authority
//!
//! End-to-end lifecycle and validation scenarios over both store backends.

use chrono::{Duration, Utc};
use consent_authority::{ConsentError, ConsentManager, SigningAuthority, ValidationEngine};
use consent_domain::{
    ConsentStatus, ConsentStore, DenialReason, NewConsent, Party, Purpose, ValidationQuery,
    Verdict,
};
use consent_store::{MemoryStore, SqliteStore};
use std::sync::Arc;

fn signer() -> Arc<SigningAuthority> {
    Arc::new(SigningAuthority::generate("consent-manager", "consent-key").unwrap())
}

fn purchase_consent() -> NewConsent {
    NewConsent::new(Party::new("P1"), Party::new("F1"), vec![Purpose::new("buy")])
}

#[test]
fn test_created_artifacts_verify() {
    let signer = signer();
    let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));

    for i in 0..5 {
        let request = NewConsent::new(
            Party::new(format!("P{}", i)),
            Party::new("F1"),
            vec![Purpose::new("buy"), Purpose::new(format!("purpose-{}", i))],
        )
        .with_data_types(["email"]);
        let artifact = manager.create(request).unwrap();
        signer.verify_artifact(&artifact).unwrap();
    }
}

#[test]
fn test_grant_then_revoke_scenario() {
    let signer = signer();
    let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);
    let query = ValidationQuery::new("P1", "F1", "buy");

    let artifact = manager.create(purchase_consent()).unwrap();

    let verdict = engine.validate(manager.store(), &query).unwrap();
    assert!(verdict.is_valid());
    assert_eq!(verdict.grant().unwrap().consent_id, artifact.consent_id);

    manager.revoke(&artifact.consent_id, None).unwrap();

    let verdict = engine.validate(manager.store(), &query).unwrap();
    assert_eq!(verdict, Verdict::Denied(DenialReason::NoMatchingConsent));
    assert_eq!(
        serde_json::to_value(&verdict).unwrap(),
        serde_json::json!({"valid": false, "reason": "no_matching_consent"})
    );
}

#[test]
fn test_second_revoke_keeps_first_revocation() {
    let mut manager = ConsentManager::new(MemoryStore::new(), signer());
    let artifact = manager.create(purchase_consent()).unwrap();

    let first = manager.revoke(&artifact.consent_id, None).unwrap();
    let second = manager.revoke(&artifact.consent_id, Some("again".to_string()));
    assert!(matches!(second, Err(ConsentError::AlreadyRevoked(_))));

    let stored = manager.get(&artifact.consent_id).unwrap();
    assert_eq!(stored.status, ConsentStatus::Revoked);
    assert_eq!(stored.revoked_at, first.revoked_at);
    assert_eq!(stored.proof, first.proof);
}

#[test]
fn test_purpose_and_data_type_mismatches() {
    let signer = signer();
    let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);

    manager
        .create(purchase_consent().with_data_types(["y"]))
        .unwrap();

    let check = |query: ValidationQuery| engine.validate(manager.store(), &query).unwrap().is_valid();

    assert!(!check(ValidationQuery::new("P1", "F1", "marketing")));
    assert!(!check(ValidationQuery::new("P1", "F1", "buy").with_data_types(["x"])));
    assert!(check(ValidationQuery::new("P1", "F1", "buy").with_data_types(["y"])));
    assert!(check(ValidationQuery::new("P1", "F1", "buy").with_data_types(Vec::<String>::new())));
    assert!(!check(ValidationQuery::new("P2", "F1", "buy")));
    assert!(!check(ValidationQuery::new("P1", "F2", "buy")));
}

#[test]
fn test_email_phone_scenario() {
    let signer = signer();
    let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);

    manager
        .create(purchase_consent().with_data_types(["email", "phone"]))
        .unwrap();

    let email = ValidationQuery::new("P1", "F1", "buy").with_data_types(["email"]);
    let email_address = ValidationQuery::new("P1", "F1", "buy").with_data_types(["email", "address"]);

    assert!(engine.validate(manager.store(), &email).unwrap().is_valid());
    assert!(!engine.validate(manager.store(), &email_address).unwrap().is_valid());
}

#[test]
fn test_expiry() {
    let signer = signer();
    let mut manager = ConsentManager::new(MemoryStore::new(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);
    let query = ValidationQuery::new("P1", "F1", "buy");

    let past = manager
        .create(purchase_consent().with_expires_at(Utc::now() - Duration::hours(1)))
        .unwrap();
    assert_eq!(past.status, ConsentStatus::Active);
    assert!(!engine.validate(manager.store(), &query).unwrap().is_valid());

    let future = manager
        .create(purchase_consent().with_expires_at(Utc::now() + Duration::hours(1)))
        .unwrap();
    let verdict = engine.validate(manager.store(), &query).unwrap();
    assert_eq!(verdict.grant().unwrap().consent_id, future.consent_id);
}

#[test]
fn test_tampered_sqlite_record_is_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consents.db");

    let signer = signer();
    let mut manager = ConsentManager::new(SqliteStore::new(&path).unwrap(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);

    let artifact = manager.create(purchase_consent()).unwrap();
    let query = ValidationQuery::new("P1", "F1", "marketing");
    assert!(!engine.validate(manager.store(), &query).unwrap().is_valid());

    // Rewrite the purposes behind the manager's back, without re-signing
    let mut backdoor = SqliteStore::new(&path).unwrap();
    let mut forged = backdoor.get(&artifact.consent_id).unwrap().unwrap();
    forged.purposes.push(Purpose::new("marketing"));
    backdoor.update(&artifact.consent_id, forged).unwrap();

    // Field predicates now pass, but the proof no longer covers the content
    let stored = manager.get(&artifact.consent_id).unwrap();
    assert!(stored.covers_purpose("marketing"));
    assert!(!engine.validate(manager.store(), &query).unwrap().is_valid());
}

#[test]
fn test_artifact_from_other_authority_is_excluded() {
    let store = MemoryStore::new();
    let mut foreign = ConsentManager::new(store.clone(), signer());
    foreign.create(purchase_consent()).unwrap();

    let engine = ValidationEngine::new(signer());
    let verdict = engine
        .validate(&store, &ValidationQuery::new("P1", "F1", "buy"))
        .unwrap();
    assert!(!verdict.is_valid());
}

#[test]
fn test_sqlite_backend_lifecycle() {
    let signer = signer();
    let mut manager = ConsentManager::new(SqliteStore::new(":memory:").unwrap(), Arc::clone(&signer));
    let engine = ValidationEngine::new(signer);
    let query = ValidationQuery::new("P1", "F1", "buy");

    let artifact = manager.create(purchase_consent()).unwrap();
    assert!(engine.validate(manager.store(), &query).unwrap().is_valid());

    let revoked = manager.revoke(&artifact.consent_id, Some("closed account".to_string())).unwrap();
    assert_eq!(revoked.revocation_reason.as_deref(), Some("closed account"));
    assert_eq!(manager.store().len().unwrap(), 1);
    assert!(!engine.validate(manager.store(), &query).unwrap().is_valid());
}

fn consent_with_float_metadata() -> NewConsent {
    let mut request = purchase_consent();
    let metadata = serde_json::json!({
        "score": 1.0715660391465826e-75,
        "weights": [0.1, 2.5e-308, 1.7976931348623157e308],
    });
    request.metadata = metadata.as_object().cloned();
    request
}

fn assert_float_metadata_validates<S>(store: S)
where
    S: ConsentStore,
    S::Error: std::fmt::Display,
{
    let signer = signer();
    let mut manager = ConsentManager::new(store, Arc::clone(&signer));
    let engine = ValidationEngine::new(Arc::clone(&signer));

    let created = manager.create(consent_with_float_metadata()).unwrap();
    signer.verify_artifact(&created).unwrap();

    let stored = manager.get(&created.consent_id).unwrap();
    signer.verify_artifact(&stored).unwrap();
    assert_eq!(stored.metadata, created.metadata);

    let verdict = engine
        .validate(manager.store(), &ValidationQuery::new("P1", "F1", "buy"))
        .unwrap();
    assert_eq!(verdict.grant().unwrap().consent_id, created.consent_id);

    let revoked = manager.revoke(&created.consent_id, None).unwrap();
    signer.verify_artifact(&revoked).unwrap();
}

#[test]
fn test_float_metadata_verifies_in_memory() {
    assert_float_metadata_validates(MemoryStore::new());
}

#[test]
fn test_float_metadata_verifies_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    assert_float_metadata_validates(SqliteStore::new(dir.path().join("consents.db")).unwrap());
}
