//! SQLite implementation of the persistence layer.
//!
//! The schema is created on startup with `CREATE TABLE IF NOT EXISTS`,
//! mirroring the embedded-database deployment model: a single store file
//! next to the process, WAL journaling, no external migrations.
//!
//! Redemption finalization is the one place where correctness depends on
//! the store: the ticket status flip and the inventory decrement are
//! conditional single-row updates executed inside one transaction, so two
//! racing redemptions of the same ticket cannot both succeed and the last
//! unit of a finite prize cannot be decremented twice.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{Sqlite, Transaction};

use crate::domain::{
    NewPrize, NewTicket, Platform, Prize, PrizePatch, Proof, Redemption, Ticket, TicketStatus,
};
use crate::error::AppError;

/// Outcome of an attempt to finalize a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The transaction committed: ticket used, inventory decremented,
    /// redemption recorded.
    Committed,
    /// The conditional status flip matched no row: another redemption
    /// won the race (or the ticket was cancelled meanwhile).
    TicketConflict,
    /// The conditional inventory decrement matched no row: the selected
    /// finite prize sold out between selection and finalization. The
    /// transaction was rolled back; the ticket is still active.
    PrizeExhausted,
}

/// SQLite-backed store using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a store at the given SQLite URL, creating the database file
    /// if needed and enabling WAL journaling.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the URL is invalid or the
    /// connection cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Store(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Opens an in-memory store with a single connection. Used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on connection failure.
    pub async fn memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates all tables and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT UNIQUE NOT NULL,
                email TEXT,
                code TEXT UNIQUE NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                approved INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                ip_hash TEXT NOT NULL,
                device_id TEXT NOT NULL,
                user_agent TEXT
            );
            CREATE TABLE IF NOT EXISTS proofs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code_or_session TEXT NOT NULL,
                platform TEXT NOT NULL,
                file_path TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS prizes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                quantity INTEGER NOT NULL DEFAULT -1,
                weight REAL NOT NULL DEFAULT 1.0,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS redemptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_code TEXT NOT NULL,
                prize_id INTEGER NOT NULL,
                prize_snapshot TEXT NOT NULL,
                phone TEXT NOT NULL,
                ip_hash TEXT NOT NULL,
                device_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tickets_phone ON tickets(phone);
            CREATE INDEX IF NOT EXISTS idx_tickets_code ON tickets(code);
            CREATE INDEX IF NOT EXISTS idx_tickets_ip_hash ON tickets(ip_hash);
            CREATE INDEX IF NOT EXISTS idx_tickets_device_id ON tickets(device_id);
            CREATE INDEX IF NOT EXISTS idx_proofs_key ON proofs(code_or_session);
            CREATE INDEX IF NOT EXISTS idx_redemptions_code ON redemptions(ticket_code);",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Begins a transaction for multi-statement writes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, AppError> {
        Ok(self.pool.begin().await?)
    }

    // ── Anti-duplication guard lookups ──────────────────────────────────

    /// Returns `true` if a ticket with the given phone number exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn phone_exists(&self, phone: &str) -> Result<bool, AppError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM tickets WHERE phone = ? LIMIT 1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns `true` if a ticket with the given IP hash exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn ip_hash_exists(&self, ip_hash: &str) -> Result<bool, AppError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM tickets WHERE ip_hash = ? LIMIT 1")
            .bind(ip_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns `true` if a ticket with the given device ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn device_exists(&self, device_id: &str) -> Result<bool, AppError> {
        let row =
            sqlx::query_scalar::<_, i64>("SELECT 1 FROM tickets WHERE device_id = ? LIMIT 1")
                .bind(device_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Returns `true` if a ticket with the given code exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM tickets WHERE code = ? LIMIT 1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    // ── Tickets ─────────────────────────────────────────────────────────

    /// Inserts a new ticket inside an open transaction.
    ///
    /// New tickets always start `active` and unapproved.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure (including unique
    /// constraint violations on phone or code).
    pub async fn insert_ticket(
        conn: &mut SqliteConnection,
        new: &NewTicket,
    ) -> Result<i64, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tickets \
             (name, phone, email, code, status, approved, created_at, updated_at, ip_hash, device_id, user_agent) \
             VALUES (?, ?, ?, ?, 'active', 0, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.code)
        .bind(now)
        .bind(now)
        .bind(&new.ip_hash)
        .bind(&new.device_id)
        .bind(&new.user_agent)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Re-keys proof rows from an ephemeral session ID to the permanent
    /// ticket code, rewriting stored file paths to match. Runs inside
    /// the registration transaction so the re-key is atomic with ticket
    /// creation.
    ///
    /// Returns the number of rows re-keyed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn rekey_proofs(
        conn: &mut SqliteConnection,
        session_id: &str,
        code: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE proofs SET \
             code_or_session = ?2, \
             file_path = replace(file_path, '/' || ?1 || '/', '/' || ?2 || '/') \
             WHERE code_or_session = ?1",
        )
        .bind(session_id)
        .bind(code)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetches a ticket by code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn find_ticket(&self, code: &str) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT id, name, phone, email, code, status, approved, created_at, updated_at, \
             ip_hash, device_id, user_agent FROM tickets WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    /// Applies an admin patch to a ticket. `None` fields are untouched;
    /// `updated_at` always advances.
    ///
    /// Returns `false` if no ticket with the code exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn update_ticket(
        &self,
        code: &str,
        status: Option<TicketStatus>,
        approved: Option<bool>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tickets SET \
             status = COALESCE(?1, status), \
             approved = COALESCE(?2, approved), \
             updated_at = ?3 \
             WHERE code = ?4",
        )
        .bind(status)
        .bind(approved)
        .bind(Utc::now())
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a ticket and all proof rows keyed by its code, in one
    /// transaction.
    ///
    /// Returns `false` if no ticket with the code exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn delete_ticket_cascade(&self, code: &str) -> Result<bool, AppError> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("DELETE FROM tickets WHERE code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query("DELETE FROM proofs WHERE code_or_session = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Searches tickets by phone, code, or name substring. Without a
    /// query, returns the most recent 100 tickets.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn search_tickets(&self, query: Option<&str>) -> Result<Vec<Ticket>, AppError> {
        let tickets = if let Some(q) = query.filter(|q| !q.is_empty()) {
            let pattern = format!("%{q}%");
            sqlx::query_as::<_, Ticket>(
                "SELECT id, name, phone, email, code, status, approved, created_at, updated_at, \
                 ip_hash, device_id, user_agent FROM tickets \
                 WHERE phone LIKE ?1 OR code LIKE ?1 OR name LIKE ?1 \
                 ORDER BY created_at DESC",
            )
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Ticket>(
                "SELECT id, name, phone, email, code, status, approved, created_at, updated_at, \
                 ip_hash, device_id, user_agent FROM tickets \
                 ORDER BY created_at DESC LIMIT 100",
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(tickets)
    }

    /// Returns every ticket, newest first. Used by the CSV export.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn all_tickets(&self) -> Result<Vec<Ticket>, AppError> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT id, name, phone, email, code, status, approved, created_at, updated_at, \
             ip_hash, device_id, user_agent FROM tickets ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    // ── Prizes ──────────────────────────────────────────────────────────

    /// Inserts a new prize and returns its row ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn insert_prize(&self, new: &NewPrize) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO prizes (title, kind, description, image_url, quantity, weight, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(new.kind)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.quantity)
        .bind(new.weight)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Returns all prizes, newest first. Admin inventory view.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn list_prizes(&self) -> Result<Vec<Prize>, AppError> {
        let prizes = sqlx::query_as::<_, Prize>(
            "SELECT id, title, kind, description, image_url, quantity, weight, created_at \
             FROM prizes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(prizes)
    }

    /// Returns prizes still eligible for selection (`quantity != 0`) in
    /// stable insertion order. Selection iterates this order, so it must
    /// not change between calls.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn available_prizes(&self) -> Result<Vec<Prize>, AppError> {
        let prizes = sqlx::query_as::<_, Prize>(
            "SELECT id, title, kind, description, image_url, quantity, weight, created_at \
             FROM prizes WHERE quantity != 0 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(prizes)
    }

    /// Applies a partial update to a prize. Only affects future draws;
    /// past redemption snapshots are never rewritten.
    ///
    /// Returns `false` if no prize with the ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn update_prize(&self, id: i64, patch: &PrizePatch) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE prizes SET \
             title = COALESCE(?1, title), \
             kind = COALESCE(?2, kind), \
             description = COALESCE(?3, description), \
             image_url = COALESCE(?4, image_url), \
             quantity = COALESCE(?5, quantity), \
             weight = COALESCE(?6, weight) \
             WHERE id = ?7",
        )
        .bind(&patch.title)
        .bind(patch.kind)
        .bind(&patch.description)
        .bind(&patch.image_url)
        .bind(patch.quantity)
        .bind(patch.weight)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a prize. Past redemption snapshots are unaffected.
    ///
    /// Returns `false` if no prize with the ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn delete_prize(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM prizes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Proofs ──────────────────────────────────────────────────────────

    /// Inserts a proof row keyed by session ID or ticket code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn insert_proof(
        &self,
        key: &str,
        platform: Platform,
        file_path: &str,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO proofs (code_or_session, platform, file_path, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(platform)
        .bind(file_path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Returns all proof rows for a session ID or ticket code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn proofs_for(&self, key: &str) -> Result<Vec<Proof>, AppError> {
        let proofs = sqlx::query_as::<_, Proof>(
            "SELECT id, code_or_session, platform, file_path, created_at \
             FROM proofs WHERE code_or_session = ? ORDER BY id",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;
        Ok(proofs)
    }

    // ── Redemption finalization ─────────────────────────────────────────

    /// Atomically finalizes a redemption: flips the ticket to `used`,
    /// decrements finite inventory, and records the redemption with a
    /// full prize snapshot, all inside one transaction.
    ///
    /// Both updates are conditional. The status flip matches only
    /// `status = 'active'` rows, so of N racing redemptions of the same
    /// code exactly one can commit. The decrement matches only
    /// `quantity > 0` rows, so the last unit of a finite prize cannot be
    /// drained twice; the losing transaction rolls back with
    /// [`FinalizeOutcome::PrizeExhausted`] and leaves the ticket active
    /// for a retry with a fresh selection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure, or
    /// [`AppError::Internal`] if the prize snapshot cannot be serialized.
    pub async fn finalize_redemption(
        &self,
        code: &str,
        prize: &Prize,
        phone: &str,
        ip_hash: &str,
        device_id: &str,
    ) -> Result<FinalizeOutcome, AppError> {
        let now = Utc::now();
        let mut tx = self.begin().await?;

        let flipped = sqlx::query(
            "UPDATE tickets SET status = 'used', updated_at = ?1 \
             WHERE code = ?2 AND status = 'active'",
        )
        .bind(now)
        .bind(code)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if flipped == 0 {
            // Dropping the transaction rolls it back.
            return Ok(FinalizeOutcome::TicketConflict);
        }

        if prize.quantity > 0 {
            let decremented =
                sqlx::query("UPDATE prizes SET quantity = quantity - 1 WHERE id = ? AND quantity > 0")
                    .bind(prize.id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            if decremented == 0 {
                return Ok(FinalizeOutcome::PrizeExhausted);
            }
        }

        let snapshot = serde_json::to_string(prize)?;
        sqlx::query(
            "INSERT INTO redemptions \
             (ticket_code, prize_id, prize_snapshot, phone, ip_hash, device_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(code)
        .bind(prize.id)
        .bind(snapshot)
        .bind(phone)
        .bind(ip_hash)
        .bind(device_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(FinalizeOutcome::Committed)
    }

    /// Fetches the redemption record for a ticket code, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database failure.
    pub async fn redemption_for(&self, code: &str) -> Result<Option<Redemption>, AppError> {
        let redemption = sqlx::query_as::<_, Redemption>(
            "SELECT id, ticket_code, prize_id, prize_snapshot, phone, ip_hash, device_id, \
             created_at FROM redemptions WHERE ticket_code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(redemption)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use crate::domain::PrizeKind;

    use super::*;

    async fn store() -> Store {
        match Store::memory().await {
            Ok(s) => s,
            Err(e) => panic!("store setup failed: {e}"),
        }
    }

    fn new_ticket(code: &str, suffix: &str) -> NewTicket {
        NewTicket {
            name: format!("User {suffix}"),
            phone: format!("+91900000{suffix}"),
            email: None,
            code: code.to_string(),
            ip_hash: format!("ip-{suffix}"),
            device_id: format!("dev-{suffix}"),
            user_agent: Some("test-agent".to_string()),
        }
    }

    async fn create_ticket(store: &Store, code: &str, suffix: &str) {
        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        if Store::insert_ticket(&mut tx, &new_ticket(code, suffix)).await.is_err() {
            panic!("insert failed");
        }
        if tx.commit().await.is_err() {
            panic!("commit failed");
        }
    }

    async fn create_prize(store: &Store, title: &str, kind: PrizeKind, quantity: i64) -> i64 {
        let new = NewPrize {
            title: title.to_string(),
            kind,
            description: None,
            image_url: None,
            quantity,
            weight: 1.0,
        };
        match store.insert_prize(&new).await {
            Ok(id) => id,
            Err(e) => panic!("prize insert failed: {e}"),
        }
    }

    async fn load_prize(store: &Store, id: i64) -> Prize {
        let prizes = store.list_prizes().await.unwrap_or_default();
        match prizes.into_iter().find(|p| p.id == id) {
            Some(p) => p,
            None => panic!("prize {id} not found"),
        }
    }

    #[tokio::test]
    async fn guard_lookups_detect_duplicates() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000001", "01").await;

        assert_eq!(store.phone_exists("+9190000001").await.ok(), Some(true));
        assert_eq!(store.phone_exists("+9190000099").await.ok(), Some(false));
        assert_eq!(store.ip_hash_exists("ip-01").await.ok(), Some(true));
        assert_eq!(store.ip_hash_exists("ip-99").await.ok(), Some(false));
        assert_eq!(store.device_exists("dev-01").await.ok(), Some(true));
        assert_eq!(store.device_exists("dev-99").await.ok(), Some(false));
        assert_eq!(store.code_exists("DRM25-KOL-000001").await.ok(), Some(true));
    }

    #[tokio::test]
    async fn ticket_round_trip_preserves_fields() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000002", "02").await;

        let Ok(Some(ticket)) = store.find_ticket("DRM25-KOL-000002").await else {
            panic!("ticket not found");
        };
        assert_eq!(ticket.status, TicketStatus::Active);
        assert!(!ticket.approved);
        assert_eq!(ticket.device_id, "dev-02");
        assert_eq!(ticket.user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn update_ticket_patches_only_given_fields() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000003", "03").await;

        let updated = store
            .update_ticket("DRM25-KOL-000003", None, Some(true))
            .await;
        assert_eq!(updated.ok(), Some(true));

        let Ok(Some(ticket)) = store.find_ticket("DRM25-KOL-000003").await else {
            panic!("ticket not found");
        };
        assert!(ticket.approved);
        assert_eq!(ticket.status, TicketStatus::Active);

        let missing = store.update_ticket("DRM25-KOL-FFFFFF", None, Some(true)).await;
        assert_eq!(missing.ok(), Some(false));
    }

    #[tokio::test]
    async fn delete_cascades_to_proofs() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000004", "04").await;
        let inserted = store
            .insert_proof(
                "DRM25-KOL-000004",
                Platform::Instagram,
                "/uploads/DRM25-KOL-000004/instagram.png",
            )
            .await;
        assert!(inserted.is_ok());

        let deleted = store.delete_ticket_cascade("DRM25-KOL-000004").await;
        assert_eq!(deleted.ok(), Some(true));

        let proofs = store.proofs_for("DRM25-KOL-000004").await.unwrap_or_default();
        assert!(proofs.is_empty());
    }

    #[tokio::test]
    async fn rekey_moves_proofs_and_rewrites_paths() {
        let store = store().await;
        let session = "7d0f9a3e-session";
        let inserted = store
            .insert_proof(session, Platform::Youtube, "/uploads/7d0f9a3e-session/youtube.png")
            .await;
        assert!(inserted.is_ok());

        let Ok(mut tx) = store.begin().await else {
            panic!("begin failed");
        };
        let moved = Store::rekey_proofs(&mut tx, session, "DRM25-KOL-000005").await;
        assert_eq!(moved.ok(), Some(1));
        if tx.commit().await.is_err() {
            panic!("commit failed");
        }

        let proofs = store.proofs_for("DRM25-KOL-000005").await.unwrap_or_default();
        let Some(proof) = proofs.first() else {
            panic!("rekeyed proof missing");
        };
        assert_eq!(proof.file_path, "/uploads/DRM25-KOL-000005/youtube.png");
        assert!(store.proofs_for(session).await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn available_prizes_excludes_exhausted() {
        let store = store().await;
        let unlimited = create_prize(&store, "coupon", PrizeKind::Voucher, -1).await;
        let finite = create_prize(&store, "mug", PrizeKind::Product, 2).await;
        let exhausted = create_prize(&store, "gone", PrizeKind::Product, 0).await;

        let available = store.available_prizes().await.unwrap_or_default();
        let ids: Vec<i64> = available.iter().map(|p| p.id).collect();
        assert!(ids.contains(&unlimited));
        assert!(ids.contains(&finite));
        assert!(!ids.contains(&exhausted));
        // Stable insertion order.
        assert_eq!(ids, {
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            sorted
        });
    }

    #[tokio::test]
    async fn finalize_commits_once_and_decrements() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000006", "06").await;
        let _ = store
            .update_ticket("DRM25-KOL-000006", None, Some(true))
            .await;
        let prize_id = create_prize(&store, "mug", PrizeKind::Product, 2).await;
        let prize = load_prize(&store, prize_id).await;

        let first = store
            .finalize_redemption("DRM25-KOL-000006", &prize, "+919", "ip", "dev")
            .await;
        assert_eq!(first.ok(), Some(FinalizeOutcome::Committed));

        let second = store
            .finalize_redemption("DRM25-KOL-000006", &prize, "+919", "ip", "dev")
            .await;
        assert_eq!(second.ok(), Some(FinalizeOutcome::TicketConflict));

        let after = load_prize(&store, prize_id).await;
        assert_eq!(after.quantity, 1);

        let Ok(Some(ticket)) = store.find_ticket("DRM25-KOL-000006").await else {
            panic!("ticket not found");
        };
        assert_eq!(ticket.status, TicketStatus::Used);
    }

    #[tokio::test]
    async fn finalize_with_stale_prize_rolls_back_ticket() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000007", "07").await;
        create_ticket(&store, "DRM25-KOL-000008", "08").await;
        let prize_id = create_prize(&store, "last-one", PrizeKind::Product, 1).await;
        let stale = load_prize(&store, prize_id).await;

        let first = store
            .finalize_redemption("DRM25-KOL-000007", &stale, "+917", "ip7", "dev7")
            .await;
        assert_eq!(first.ok(), Some(FinalizeOutcome::Committed));

        // Second redemption still holds the stale quantity=1 view.
        let second = store
            .finalize_redemption("DRM25-KOL-000008", &stale, "+918", "ip8", "dev8")
            .await;
        assert_eq!(second.ok(), Some(FinalizeOutcome::PrizeExhausted));

        // Rollback left the losing ticket active for a retry.
        let Ok(Some(ticket)) = store.find_ticket("DRM25-KOL-000008").await else {
            panic!("ticket not found");
        };
        assert_eq!(ticket.status, TicketStatus::Active);

        let after = load_prize(&store, prize_id).await;
        assert_eq!(after.quantity, 0);
    }

    #[tokio::test]
    async fn unlimited_prize_is_never_decremented() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-000009", "09").await;
        let prize_id = create_prize(&store, "coupon", PrizeKind::Voucher, -1).await;
        let prize = load_prize(&store, prize_id).await;

        let outcome = store
            .finalize_redemption("DRM25-KOL-000009", &prize, "+919", "ip", "dev")
            .await;
        assert_eq!(outcome.ok(), Some(FinalizeOutcome::Committed));

        let after = load_prize(&store, prize_id).await;
        assert_eq!(after.quantity, -1);
    }

    #[tokio::test]
    async fn snapshot_survives_prize_deletion() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-00000A", "0A").await;
        let prize_id = create_prize(&store, "limited-tee", PrizeKind::Product, 5).await;
        let prize = load_prize(&store, prize_id).await;

        let outcome = store
            .finalize_redemption("DRM25-KOL-00000A", &prize, "+91a", "ipa", "deva")
            .await;
        assert_eq!(outcome.ok(), Some(FinalizeOutcome::Committed));

        assert_eq!(store.delete_prize(prize_id).await.ok(), Some(true));

        let Ok(Some(redemption)) = store.redemption_for("DRM25-KOL-00000A").await else {
            panic!("redemption not found");
        };
        let Ok(snapshot) = redemption.snapshot() else {
            panic!("snapshot unreadable");
        };
        assert_eq!(snapshot.title, "limited-tee");
        assert_eq!(snapshot.quantity, 5);
    }

    #[tokio::test]
    async fn prize_patch_updates_only_given_fields() {
        let store = store().await;
        let prize_id = create_prize(&store, "tee", PrizeKind::Product, 10).await;

        let patch = PrizePatch {
            weight: Some(4.5),
            quantity: Some(7),
            ..PrizePatch::default()
        };
        assert_eq!(store.update_prize(prize_id, &patch).await.ok(), Some(true));

        let after = load_prize(&store, prize_id).await;
        assert_eq!(after.title, "tee");
        assert_eq!(after.quantity, 7);
        assert!((after.weight - 4.5).abs() < f64::EPSILON);

        assert_eq!(store.update_prize(9999, &patch).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn search_matches_phone_code_and_name() {
        let store = store().await;
        create_ticket(&store, "DRM25-KOL-00000B", "0B").await;
        create_ticket(&store, "DRM25-KOL-00000C", "0C").await;

        let by_code = store.search_tickets(Some("00000B")).await.unwrap_or_default();
        assert_eq!(by_code.len(), 1);

        let by_name = store.search_tickets(Some("User 0C")).await.unwrap_or_default();
        assert_eq!(by_name.len(), 1);

        let all = store.search_tickets(None).await.unwrap_or_default();
        assert_eq!(all.len(), 2);
    }
}
