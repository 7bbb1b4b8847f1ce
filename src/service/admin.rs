//! Administrative operations: ticket review, prize inventory
//! management, and data export.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{NewPrize, Prize, PrizePatch, Proof, Ticket, TicketStatus};
use crate::error::AppError;
use crate::notify::Notifier;
use crate::persistence::Store;
use crate::proof_store::ProofStore;

/// Orchestrates the administrative surface.
///
/// Every operation requires a caller-supplied secret checked by
/// [`AdminService::authorize`]; the HTTP layer calls it before routing
/// into the methods here.
#[derive(Debug, Clone)]
pub struct AdminService {
    store: Store,
    proofs: ProofStore,
    notifier: Notifier,
    config: Arc<AppConfig>,
}

impl AdminService {
    /// Creates a new `AdminService`.
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

    /// Checks the caller-supplied admin secret.
    ///
    /// An unset secret disables the whole surface rather than leaving it
    /// open.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] on mismatch or when no secret
    /// is configured.
    pub fn authorize(&self, secret: Option<&str>) -> Result<(), AppError> {
        let configured = self.config.admin_secret.as_str();
        if configured.is_empty() || secret != Some(configured) {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }

    // ── Tickets ─────────────────────────────────────────────────────────

    /// Looks up one ticket by code, with its proofs and redemption
    /// record if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TicketNotFound`] for an unknown code and
    /// [`AppError::Store`] on lookup failure.
    pub async fn get_ticket(&self, code: &str) -> Result<TicketDetail, AppError> {
        let ticket = self
            .store
            .find_ticket(code)
            .await?
            .ok_or_else(|| AppError::TicketNotFound(code.to_string()))?;
        let proofs = self.store.proofs_for(code).await?;
        let prize = match self.store.redemption_for(code).await? {
            Some(redemption) => Some(redemption.snapshot()?),
            None => None,
        };
        Ok(TicketDetail {
            ticket,
            proofs,
            prize,
        })
    }

    /// Searches tickets by phone, code, or name fragment. An empty query
    /// lists the most recent tickets.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on lookup failure.
    pub async fn search_tickets(&self, query: Option<&str>) -> Result<Vec<Ticket>, AppError> {
        self.store.search_tickets(query).await
    }

    /// Applies a status and/or approval update to a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when neither field is given,
    /// [`AppError::TicketNotFound`] for an unknown code, and
    /// [`AppError::Store`] on update failure.
    pub async fn update_ticket(
        &self,
        code: &str,
        status: Option<TicketStatus>,
        approved: Option<bool>,
    ) -> Result<Ticket, AppError> {
        if status.is_none() && approved.is_none() {
            return Err(AppError::Validation("no updates provided".to_string()));
        }
        if !self.store.update_ticket(code, status, approved).await? {
            return Err(AppError::TicketNotFound(code.to_string()));
        }
        let ticket = self
            .store
            .find_ticket(code)
            .await?
            .ok_or_else(|| AppError::TicketNotFound(code.to_string()))?;

        if approved == Some(true) {
            self.notifier.notify(format!(
                "✅ <b>Ticket Approved</b>\n\n🎟 <code>{code}</code>"
            ));
        }
        tracing::info!(%code, ?status, ?approved, "ticket updated");
        Ok(ticket)
    }

    /// Deletes a ticket with its proofs, redemption record, and stored
    /// proof files.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TicketNotFound`] for an unknown code and
    /// [`AppError::Store`] on delete failure. Filesystem cleanup is
    /// best-effort and never fails the call.
    pub async fn delete_ticket(&self, code: &str) -> Result<(), AppError> {
        if !self.store.delete_ticket_cascade(code).await? {
            return Err(AppError::TicketNotFound(code.to_string()));
        }
        if let Err(e) = self.proofs.remove(code) {
            tracing::warn!(%code, error = %e, "proof directory cleanup failed");
        }
        tracing::info!(%code, "ticket deleted");
        self.notifier.notify(format!(
            "🗑 <b>Ticket Deleted</b>\n\n🎟 <code>{code}</code>"
        ));
        Ok(())
    }

    /// Exports every ticket as CSV, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on lookup failure.
    pub async fn export_csv(&self) -> Result<String, AppError> {
        let tickets = self.store.all_tickets().await?;
        let mut out =
            String::from("code,name,phone,email,status,approved,created_at\n");
        for t in &tickets {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_cell(&t.code),
                csv_cell(&t.name),
                csv_cell(&t.phone),
                csv_cell(t.email.as_deref().unwrap_or_default()),
                t.status,
                t.approved,
                t.created_at.to_rfc3339(),
            ));
        }
        Ok(out)
    }

    /// Lists proof rows recorded for a ticket code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on lookup failure.
    pub async fn proofs_for(&self, code: &str) -> Result<Vec<Proof>, AppError> {
        self.store.proofs_for(code).await
    }

    // ── Prizes ──────────────────────────────────────────────────────────

    /// Lists all prizes, newest first, including drained ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on lookup failure.
    pub async fn list_prizes(&self) -> Result<Vec<Prize>, AppError> {
        self.store.list_prizes().await
    }

    /// Creates a prize.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty title, non-positive
    /// weight, or a quantity below `-1`; [`AppError::Store`] on insert
    /// failure.
    pub async fn create_prize(&self, new: NewPrize) -> Result<i64, AppError> {
        validate_prize_fields(&new.title, new.weight, new.quantity)?;
        let id = self.store.insert_prize(&new).await?;
        tracing::info!(prize_id = id, title = %new.title, "prize created");
        Ok(id)
    }

    /// Applies a partial update to a prize.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty patch or invalid
    /// field values, [`AppError::PrizeNotFound`] for an unknown ID, and
    /// [`AppError::Store`] on update failure.
    pub async fn update_prize(&self, id: i64, patch: PrizePatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Err(AppError::Validation("no updates provided".to_string()));
        }
        if let Some(title) = &patch.title {
            if title.is_empty() {
                return Err(AppError::Validation("title must not be empty".to_string()));
            }
        }
        if let Some(weight) = patch.weight {
            if weight <= 0.0 {
                return Err(AppError::Validation("weight must be positive".to_string()));
            }
        }
        if let Some(quantity) = patch.quantity {
            if quantity < -1 {
                return Err(AppError::Validation(
                    "quantity must be -1 (unlimited) or >= 0".to_string(),
                ));
            }
        }
        if !self.store.update_prize(id, &patch).await? {
            return Err(AppError::PrizeNotFound(id));
        }
        tracing::info!(prize_id = id, "prize updated");
        Ok(())
    }

    /// Deletes a prize. Past redemption snapshots are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::PrizeNotFound`] for an unknown ID and
    /// [`AppError::Store`] on delete failure.
    pub async fn delete_prize(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete_prize(id).await? {
            return Err(AppError::PrizeNotFound(id));
        }
        tracing::info!(prize_id = id, "prize deleted");
        Ok(())
    }
}

/// One ticket with its attached proofs and the prize awarded, if
/// redeemed.
#[derive(Debug, Clone)]
pub struct TicketDetail {
    /// The ticket row.
    pub ticket: Ticket,
    /// Proof rows keyed to the ticket code.
    pub proofs: Vec<Proof>,
    /// Snapshot of the prize awarded, when the ticket was redeemed.
    pub prize: Option<Prize>,
}

fn validate_prize_fields(title: &str, weight: f64, quantity: i64) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if weight <= 0.0 {
        return Err(AppError::Validation("weight must be positive".to_string()));
    }
    if quantity < -1 {
        return Err(AppError::Validation(
            "quantity must be -1 (unlimited) or >= 0".to_string(),
        ));
    }
    Ok(())
}

/// Quotes a CSV cell when it contains a delimiter, quote, or newline.
fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use crate::domain::{NewTicket, PrizeKind, UNLIMITED_QUANTITY};

    use super::*;

    async fn service_with_secret(secret: &str) -> AdminService {
        let Ok(store) = Store::memory().await else {
            panic!("store setup failed");
        };
        let config = Arc::new(AppConfig {
            admin_secret: secret.to_string(),
            ..AppConfig::default()
        });
        let proof_root =
            std::env::temp_dir().join(format!("raffle-admin-{}", uuid::Uuid::new_v4()));
        AdminService::new(
            store,
            ProofStore::new(proof_root),
            Notifier::from_config(&config),
            config,
        )
    }

    async fn seed_ticket(svc: &AdminService, code: &str) {
        let Ok(mut tx) = svc.store.begin().await else {
            panic!("begin failed");
        };
        let new = NewTicket {
            name: "Admin Target".to_string(),
            phone: format!("+91-{code}"),
            email: None,
            code: code.to_string(),
            ip_hash: format!("ip-{code}"),
            device_id: format!("dev-{code}"),
            user_agent: None,
        };
        if Store::insert_ticket(&mut tx, &new).await.is_err() {
            panic!("insert failed");
        }
        if tx.commit().await.is_err() {
            panic!("commit failed");
        }
    }

    #[tokio::test]
    async fn authorize_checks_secret_and_rejects_unset() {
        let svc = service_with_secret("s3cret").await;
        assert!(svc.authorize(Some("s3cret")).is_ok());
        assert!(matches!(
            svc.authorize(Some("wrong")),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(svc.authorize(None), Err(AppError::Unauthorized)));

        let disabled = service_with_secret("").await;
        assert!(matches!(
            disabled.authorize(Some("")),
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn approve_then_fetch_detail() {
        let svc = service_with_secret("s").await;
        seed_ticket(&svc, "DRM25-KOL-AD0001").await;

        let Ok(ticket) = svc
            .update_ticket("DRM25-KOL-AD0001", None, Some(true))
            .await
        else {
            panic!("update failed");
        };
        assert!(ticket.approved);

        let Ok(detail) = svc.get_ticket("DRM25-KOL-AD0001").await else {
            panic!("detail failed");
        };
        assert!(detail.prize.is_none());
        assert!(detail.proofs.is_empty());
    }

    #[tokio::test]
    async fn empty_ticket_update_is_rejected() {
        let svc = service_with_secret("s").await;
        seed_ticket(&svc, "DRM25-KOL-AD0002").await;
        assert!(matches!(
            svc.update_ticket("DRM25-KOL-AD0002", None, None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_unknown_ticket_is_not_found() {
        let svc = service_with_secret("s").await;
        assert!(matches!(
            svc.delete_ticket("DRM25-KOL-FFFFFF").await,
            Err(AppError::TicketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn csv_export_quotes_awkward_cells() {
        let svc = service_with_secret("s").await;
        let Ok(mut tx) = svc.store.begin().await else {
            panic!("begin failed");
        };
        let new = NewTicket {
            name: "Last, First \"Nick\"".to_string(),
            phone: "+911234567890".to_string(),
            email: None,
            code: "DRM25-KOL-AD0003".to_string(),
            ip_hash: "ip-csv".to_string(),
            device_id: "dev-csv".to_string(),
            user_agent: None,
        };
        if Store::insert_ticket(&mut tx, &new).await.is_err() {
            panic!("insert failed");
        }
        if tx.commit().await.is_err() {
            panic!("commit failed");
        }

        let Ok(csv) = svc.export_csv().await else {
            panic!("export failed");
        };
        assert!(csv.starts_with("code,name,phone,email,status,approved,created_at\n"));
        assert!(csv.contains("\"Last, First \"\"Nick\"\"\""));
    }

    #[tokio::test]
    async fn prize_crud_with_validation() {
        let svc = service_with_secret("s").await;

        assert!(matches!(
            svc.create_prize(NewPrize {
                title: String::new(),
                kind: PrizeKind::Voucher,
                description: None,
                image_url: None,
                quantity: UNLIMITED_QUANTITY,
                weight: 1.0,
            })
            .await,
            Err(AppError::Validation(_))
        ));

        let Ok(id) = svc
            .create_prize(NewPrize {
                title: "Sticker Pack".to_string(),
                kind: PrizeKind::Voucher,
                description: None,
                image_url: None,
                quantity: UNLIMITED_QUANTITY,
                weight: 1.0,
            })
            .await
        else {
            panic!("create failed");
        };

        assert!(matches!(
            svc.update_prize(id, PrizePatch::default()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.update_prize(
                id,
                PrizePatch {
                    weight: Some(-1.0),
                    ..PrizePatch::default()
                }
            )
            .await,
            Err(AppError::Validation(_))
        ));

        let patch = PrizePatch {
            title: Some("Big Sticker Pack".to_string()),
            ..PrizePatch::default()
        };
        assert!(svc.update_prize(id, patch).await.is_ok());

        let prizes = svc.list_prizes().await.unwrap_or_default();
        assert!(prizes.iter().any(|p| p.title == "Big Sticker Pack"));

        assert!(svc.delete_prize(id).await.is_ok());
        assert!(matches!(
            svc.delete_prize(id).await,
            Err(AppError::PrizeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_prize_patch_is_not_found() {
        let svc = service_with_secret("s").await;
        let patch = PrizePatch {
            weight: Some(2.0),
            ..PrizePatch::default()
        };
        assert!(matches!(
            svc.update_prize(404, patch).await,
            Err(AppError::PrizeNotFound(404))
        ));
    }
}
