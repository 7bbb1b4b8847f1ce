//! Registration service: anti-duplication guard, code generation, and
//! atomic ticket creation with proof re-keying.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{NewTicket, Platform, TicketCode};
use crate::error::AppError;
use crate::notify::Notifier;
use crate::persistence::Store;
use crate::proof_store::ProofStore;

/// Bounded attempt count for collision-checked code generation.
pub const MAX_CODE_ATTEMPTS: u32 = 10;

/// Maximum accepted proof image size in bytes (5 MiB).
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

/// Input to [`RegistrationService::register`].
///
/// `ip_hash` is derived by the HTTP layer from the client address; the
/// raw address never reaches this service.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    /// Registrant name.
    pub name: String,
    /// Registrant phone number.
    pub phone: String,
    /// Optional registrant email.
    pub email: Option<String>,
    /// Client-supplied device identifier.
    pub device_id: String,
    /// Ephemeral proof-upload session ID.
    pub session_id: String,
    /// Salted hash of the client's network address.
    pub ip_hash: String,
    /// Client user agent, if any.
    pub user_agent: Option<String>,
}

/// Orchestrates the registration flow.
///
/// Every mutation follows the pattern: validate → guard → generate code
/// → one store transaction (insert ticket + re-key proof rows) with the
/// proof directory rename sequenced before commit → notify best-effort.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    store: Store,
    proofs: ProofStore,
    notifier: Notifier,
    config: Arc<AppConfig>,
}

impl RegistrationService {
    /// Creates a new `RegistrationService`.
    #[must_use]
    pub fn new(
        store: Store,
        proofs: ProofStore,
        notifier: Notifier,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            proofs,
            notifier,
            config,
        }
    }

    /// Issues a fresh proof-upload session identifier.
    #[must_use]
    pub fn start_session() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Stores one proof image for an upload session.
    ///
    /// Returns the relative file path recorded in the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for missing fields, non-image
    /// content, or oversized files; [`AppError::Store`] or
    /// [`AppError::Internal`] on persistence failures.
    pub async fn upload_proof(
        &self,
        session_id: &str,
        platform: Platform,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        if session_id.is_empty() {
            return Err(AppError::Validation("missing session_id".to_string()));
        }
        if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
            return Err(AppError::Validation("only images allowed".to_string()));
        }
        if bytes.len() > MAX_PROOF_BYTES {
            return Err(AppError::Validation("file too large (max 5MB)".to_string()));
        }

        let ext = file_name
            .and_then(|n| std::path::Path::new(n).extension())
            .map_or_else(|| ".jpg".to_string(), |e| format!(".{}", e.to_string_lossy()));

        let file_path = self.proofs.save(session_id, platform, &ext, bytes)?;
        self.store.insert_proof(session_id, platform, &file_path).await?;

        tracing::debug!(%session_id, %platform, %file_path, "proof stored");
        Ok(file_path)
    }

    /// Registers a new ticket.
    ///
    /// The anti-duplication guard rejects the registration if the phone,
    /// IP hash, or device ID already maps to a ticket, each with a
    /// distinct error and no side effects. On success the ticket row and
    /// the proof re-key commit atomically and the generated code is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for missing required fields.
    /// - [`AppError::DuplicatePhone`] / [`AppError::DuplicateLocation`] /
    ///   [`AppError::DuplicateDevice`] from the guard.
    /// - [`AppError::CodeSpaceExhausted`] if no free code is found within
    ///   [`MAX_CODE_ATTEMPTS`].
    /// - [`AppError::Store`] / [`AppError::Internal`] on persistence or
    ///   filesystem failures.
    pub async fn register(&self, reg: NewRegistration) -> Result<TicketCode, AppError> {
        if reg.name.is_empty()
            || reg.phone.is_empty()
            || reg.device_id.is_empty()
            || reg.session_id.is_empty()
        {
            return Err(AppError::Validation("missing required fields".to_string()));
        }

        if self.store.phone_exists(&reg.phone).await? {
            return Err(AppError::DuplicatePhone);
        }
        if self.store.ip_hash_exists(&reg.ip_hash).await? {
            return Err(AppError::DuplicateLocation);
        }
        if self.store.device_exists(&reg.device_id).await? {
            return Err(AppError::DuplicateDevice);
        }

        let city = self.config.city_code.clone();
        let code = unique_code(&self.store, || TicketCode::generate(&city)).await?;

        let new_ticket = NewTicket {
            name: reg.name.clone(),
            phone: reg.phone.clone(),
            email: reg.email.clone(),
            code: code.as_str().to_string(),
            ip_hash: reg.ip_hash,
            device_id: reg.device_id,
            user_agent: reg.user_agent,
        };

        let mut tx = self.store.begin().await?;
        Store::insert_ticket(&mut tx, &new_ticket).await?;
        Store::rekey_proofs(&mut tx, reg.session_id.as_str(), code.as_str()).await?;
        // Rename before commit: if the filesystem move fails, the
        // dropped transaction rolls the ticket back and no proofs end
        // up orphaned under the session key.
        self.proofs.rekey(&reg.session_id, code.as_str())?;
        tx.commit().await?;

        tracing::info!(%code, "ticket registered");
        self.notifier.notify(format!(
            "🎫 <b>New Registration</b>\n\n👤 Name: {}\n📱 Phone: {}\n🎟 Code: <code>{}</code>",
            reg.name, reg.phone, code
        ));

        Ok(code)
    }
}

/// Generates a collision-checked ticket code, retrying up to
/// [`MAX_CODE_ATTEMPTS`] times.
///
/// # Errors
///
/// Returns [`AppError::CodeSpaceExhausted`] when every attempt collides,
/// and [`AppError::Store`] on lookup failure.
async fn unique_code(
    store: &Store,
    mut generate: impl FnMut() -> TicketCode,
) -> Result<TicketCode, AppError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate();
        if !store.code_exists(code.as_str()).await? {
            return Ok(code);
        }
    }
    tracing::error!("code generation exhausted all attempts");
    Err(AppError::CodeSpaceExhausted)
}
