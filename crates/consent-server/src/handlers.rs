//! HTTP request handlers for the consent server.
//!
//! Exposes consent creation, lookup, validation, revocation and the public
//! verification keys using axum.

use consent_authority::{ConsentError, ConsentManager, PublicKeyInfo, SigningAuthority, ValidationEngine};
use consent_domain::{ConsentArtifact, ConsentId, ConsentStore, NewConsent, ValidationQuery, Verdict};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

/// Shared application state
///
/// The manager sits behind a mutex, so `revoke`'s read-modify-write never
/// interleaves with another write.
pub struct AppState<S> {
    /// Lifecycle manager, sole writer of the store
    pub manager: Arc<Mutex<ConsentManager<S>>>,
    /// Validation engine
    pub engine: Arc<ValidationEngine>,
    /// Signing authority, for public key material
    pub signer: Arc<SigningAuthority>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            engine: Arc::clone(&self.engine),
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<S> AppState<S>
where
    S: ConsentStore,
    S::Error: Display,
{
    /// Wire a manager and engine around `store` and `signer`
    pub fn new(store: S, signer: Arc<SigningAuthority>) -> Self {
        Self {
            manager: Arc::new(Mutex::new(ConsentManager::new(store, Arc::clone(&signer)))),
            engine: Arc::new(ValidationEngine::new(Arc::clone(&signer))),
            signer,
        }
    }

    fn manager(&self) -> Result<MutexGuard<'_, ConsentManager<S>>, AppError> {
        self.manager
            .lock()
            .map_err(|_| AppError::Internal("consent manager lock poisoned".to_string()))
    }
}

/// Revocation request
#[derive(Debug, Default, Deserialize)]
pub struct RevokeRequest {
    /// Optional reason (defaults to "user_revoked")
    #[serde(default)]
    pub reason: Option<String>,
}

/// Public key listing
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicKeysResponse {
    /// Verification keys; a single entry for the process lifetime
    pub keys: Vec<PublicKeyInfo>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Number of stored consents
    pub consents: usize,
    /// Active signing key
    pub key_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Consent operation error
    Consent(ConsentError),
    /// Internal server error
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Consent(e) => {
                let status = match &e {
                    ConsentError::Validation(_) | ConsentError::AlreadyRevoked(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ConsentError::NotFound(_) => StatusCode::NOT_FOUND,
                    ConsentError::Signature(_) | ConsentError::Store(_) => {
                        error!(error = %e, "Consent operation failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<ConsentError> for AppError {
    fn from(e: ConsentError) -> Self {
        AppError::Consent(e)
    }
}

/// Unparseable identifiers can never name a stored consent
fn parse_consent_id(raw: &str) -> Result<ConsentId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Consent(ConsentError::NotFound(raw.to_string())))
}

/// POST /consents - Issue a consent
async fn create_consent<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<NewConsent>,
) -> Result<(StatusCode, Json<ConsentArtifact>), AppError>
where
    S: ConsentStore,
    S::Error: Display,
{
    let artifact = state.manager()?.create(request)?;
    Ok((StatusCode::CREATED, Json(artifact)))
}

/// GET /consents/:id - Fetch a consent
async fn get_consent<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<ConsentArtifact>, AppError>
where
    S: ConsentStore,
    S::Error: Display,
{
    let id = parse_consent_id(&id)?;
    let artifact = state.manager()?.get(&id)?;
    Ok(Json(artifact))
}

/// POST /consents/validate - Real-time consent check
async fn validate_consent<S>(
    State(state): State<AppState<S>>,
    Json(query): Json<ValidationQuery>,
) -> Result<Json<Verdict>, AppError>
where
    S: ConsentStore,
    S::Error: Display,
{
    let manager = state.manager()?;
    let verdict = state.engine.validate(manager.store(), &query)?;
    Ok(Json(verdict))
}

/// POST /consents/:id/revoke - Revoke a consent
///
/// The body is optional; without one the default reason is recorded.
async fn revoke_consent<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Option<Json<RevokeRequest>>,
) -> Result<Json<ConsentArtifact>, AppError>
where
    S: ConsentStore,
    S::Error: Display,
{
    let id = parse_consent_id(&id)?;
    let reason = body.and_then(|Json(request)| request.reason);
    let artifact = state.manager()?.revoke(&id, reason)?;
    Ok(Json(artifact))
}

/// GET /public-keys - Verification material for relying parties
async fn public_keys<S>(State(state): State<AppState<S>>) -> Json<PublicKeysResponse> {
    Json(PublicKeysResponse {
        keys: vec![state.signer.public_key_info()],
    })
}

/// GET /health - Health check
async fn health_check<S>(
    State(state): State<AppState<S>>,
) -> Result<Json<HealthCheckResponse>, AppError>
where
    S: ConsentStore,
    S::Error: Display,
{
    let consents = state
        .manager()?
        .store()
        .len()
        .map_err(|e| AppError::Consent(ConsentError::Store(e.to_string())))?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        consents,
        key_id: state.signer.key_id().to_string(),
    }))
}

/// Create the axum router with all routes
pub fn create_router<S>(state: AppState<S>) -> AxumRouter
where
    S: ConsentStore + Send + 'static,
    S::Error: Display,
{
    AxumRouter::new()
        .route("/consents", post(create_consent::<S>))
        .route("/consents/validate", post(validate_consent::<S>))
        .route("/consents/:id", get(get_consent::<S>))
        .route("/consents/:id/revoke", post(revoke_consent::<S>))
        .route("/public-keys", get(public_keys::<S>))
        .route("/health", get(health_check::<S>))
        .with_state(state)
}
