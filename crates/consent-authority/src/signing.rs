//! Signing authority
//!
//! Holds one Ed25519 keypair for the process lifetime and produces compact
//! EdDSA JWS tokens over consent artifacts. There is no key rotation; the
//! key identifier is fixed at construction.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use consent_domain::{ConsentArtifact, Proof};
use ed25519_dalek::pkcs8::{EncodePrivateKey, KeypairBytes};
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The only algorithm this authority signs with or accepts
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::EdDSA;

const SIGNING_ALGORITHM_NAME: &str = "EdDSA";

/// Signing and verification failures
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Key material could not be encoded for the JWS backend
    #[error("Invalid key material: {0}")]
    KeyMaterial(String),

    /// Token encoding failed
    #[error("Failed to sign payload: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Payload could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Token is not a well-formed compact JWS
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Token was signed with a different algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Token names a key this authority does not hold
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// Signature or claims did not verify
    #[error("Signature verification failed: {0}")]
    Invalid(String),

    /// Artifact carries no proof
    #[error("Artifact has no proof")]
    MissingProof,

    /// Token is valid but was issued over different artifact content
    #[error("Signed payload does not match artifact content")]
    PayloadMismatch,
}

/// Claims carried in every artifact token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedClaims {
    /// Signer name
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Signed artifact view (every field except `proof`)
    pub artifact: Value,
}

/// Public verification material for relying parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    /// Key identifier, as carried in token headers
    pub kid: String,

    /// JWS algorithm
    pub alg: String,

    /// Raw Ed25519 public key, base64url without padding (JWK `x`)
    pub public_key: String,
}

/// Process-wide signer
pub struct SigningAuthority {
    signer_name: String,
    key_id: String,
    public_key: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SigningAuthority {
    /// Generate a fresh keypair
    ///
    /// The key identifier is `<key_id_prefix>-<unix millis>`.
    pub fn generate(signer_name: &str, key_id_prefix: &str) -> Result<Self, SignatureError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let key_id = format!("{}-{}", key_id_prefix, Utc::now().timestamp_millis());
        Self::from_signing_key(&signing_key, signer_name, &key_id)
    }

    /// Rebuild an authority from a 32-byte Ed25519 secret
    pub fn from_secret_bytes(
        secret: &[u8; SECRET_KEY_LENGTH],
        signer_name: &str,
        key_id: &str,
    ) -> Result<Self, SignatureError> {
        Self::from_signing_key(&SigningKey::from_bytes(secret), signer_name, key_id)
    }

    fn from_signing_key(
        signing_key: &SigningKey,
        signer_name: &str,
        key_id: &str,
    ) -> Result<Self, SignatureError> {
        // PKCS#8 v1 (no embedded public key) is what the JWS backend parses
        let keypair = KeypairBytes {
            secret_key: signing_key.to_bytes(),
            public_key: None,
        };
        let der = keypair
            .to_pkcs8_der()
            .map_err(|e| SignatureError::KeyMaterial(e.to_string()))?;

        let public_key = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes());
        let decoding_key = DecodingKey::from_ed_components(&public_key)
            .map_err(|e| SignatureError::KeyMaterial(e.to_string()))?;

        Ok(Self {
            signer_name: signer_name.to_string(),
            key_id: key_id.to_string(),
            public_key,
            encoding_key: EncodingKey::from_ed_der(der.as_bytes()),
            decoding_key,
        })
    }

    /// Signer name recorded in proofs and token issuer
    pub fn signer_name(&self) -> &str {
        &self.signer_name
    }

    /// Identifier of the held key
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public verification material
    pub fn public_key_info(&self) -> PublicKeyInfo {
        PublicKeyInfo {
            kid: self.key_id.clone(),
            alg: SIGNING_ALGORITHM_NAME.to_string(),
            public_key: self.public_key.clone(),
        }
    }

    /// Sign `payload`, returning a compact JWS whose header names the held key
    pub fn sign(&self, payload: &Value) -> Result<String, SignatureError> {
        let claims = SignedClaims {
            iss: self.signer_name.clone(),
            iat: Utc::now().timestamp(),
            artifact: payload.clone(),
        };

        let mut header = Header::new(SIGNING_ALGORITHM);
        header.kid = Some(self.key_id.clone());

        encode(&header, &claims, &self.encoding_key).map_err(SignatureError::Signing)
    }

    /// Verify a token against the held key and return its claims
    pub fn verify(&self, token: &str) -> Result<SignedClaims, SignatureError> {
        let header = decode_header(token).map_err(|e| SignatureError::Malformed(e.to_string()))?;

        if header.alg != SIGNING_ALGORITHM {
            return Err(SignatureError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        match header.kid.as_deref() {
            Some(kid) if kid == self.key_id => {}
            other => {
                return Err(SignatureError::UnknownKey(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        }

        let token_data = decode::<SignedClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| SignatureError::Invalid(e.to_string()))?;

        Ok(token_data.claims)
    }

    /// Sign the artifact's current content and attach the proof
    ///
    /// Replaces any existing proof.
    pub fn sign_artifact(&self, artifact: &mut ConsentArtifact) -> Result<(), SignatureError> {
        let jws = self.sign(&artifact.signable()?)?;
        artifact.proof = Some(Proof {
            signed_by: self.signer_name.clone(),
            signing_algorithm: SIGNING_ALGORITHM_NAME.to_string(),
            kid: self.key_id.clone(),
            jws,
        });
        Ok(())
    }

    /// Verify an artifact's proof against its current content
    ///
    /// Fails if the proof is missing, names another key or algorithm, does
    /// not verify, or was issued over different content.
    pub fn verify_artifact(&self, artifact: &ConsentArtifact) -> Result<(), SignatureError> {
        let proof = artifact.proof.as_ref().ok_or(SignatureError::MissingProof)?;

        if proof.signing_algorithm != SIGNING_ALGORITHM_NAME {
            return Err(SignatureError::UnsupportedAlgorithm(
                proof.signing_algorithm.clone(),
            ));
        }
        if proof.kid != self.key_id {
            return Err(SignatureError::UnknownKey(proof.kid.clone()));
        }

        let claims = self.verify(&proof.jws)?;
        if claims.artifact != artifact.signable()? {
            return Err(SignatureError::PayloadMismatch);
        }

        Ok(())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.signer_name]);
        validation
    }
}

impl std::fmt::Debug for SigningAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningAuthority")
            .field("signer_name", &self.signer_name)
            .field("key_id", &self.key_id)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
