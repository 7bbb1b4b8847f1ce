//! Redemption service: ticket finalization with weighted prize
//! allocation and bounded retry on concurrent exhaustion.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::config::AppConfig;
use crate::domain::{select_prize, Prize, PrizeKind, TicketStatus};
use crate::error::AppError;
use crate::notify::Notifier;
use crate::persistence::{FinalizeOutcome, Store};

/// Attempts at selecting and finalizing before giving up.
///
/// A retry only happens when a concurrent redemption drained the
/// selected prize between the snapshot read and the conditional
/// decrement, so the bound is rarely reached in practice.
const MAX_FINALIZE_ATTEMPTS: u32 = 3;

/// Source of uniform random numbers in `[0, 1)`.
///
/// Injected so selection is deterministic under test; production wiring
/// uses the thread-local generator.
pub type RandomSource = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Orchestrates the redeem flow: entitlement checks, tiered weighted
/// selection, and the single-transaction finalize.
#[derive(Clone)]
pub struct RedemptionService {
    store: Store,
    notifier: Notifier,
    config: Arc<AppConfig>,
    rand: RandomSource,
}

impl fmt::Debug for RedemptionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedemptionService")
            .field("store", &self.store)
            .field("notifier", &self.notifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedemptionService {
    /// Creates a new `RedemptionService` backed by the thread-local RNG.
    #[must_use]
    pub fn new(store: Store, notifier: Notifier, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            notifier,
            config,
            rand: Arc::new(|| rand::rng().random::<f64>()),
        }
    }

    /// Replaces the random source. Used by tests to force selection
    /// outcomes.
    #[must_use]
    pub fn with_random_source(mut self, rand: RandomSource) -> Self {
        self.rand = rand;
        self
    }

    /// Redeems a ticket, returning the prize won.
    ///
    /// The ticket must exist, be `active`, and be approved. Selection
    /// and finalization run in a loop of at most [`MAX_FINALIZE_ATTEMPTS`]:
    /// if the chosen prize is drained by a concurrent redemption the
    /// attempt rolls back and selection re-runs against a fresh
    /// snapshot. A ticket is consumed at most once regardless of
    /// concurrent calls.
    ///
    /// # Errors
    ///
    /// - [`AppError::TicketNotFound`] for an unknown code.
    /// - [`AppError::AlreadyFinalized`] when the ticket is `used` or
    ///   `cancelled`.
    /// - [`AppError::PendingApproval`] when the ticket awaits review.
    /// - [`AppError::NoPrizesAvailable`] when the pool is empty or every
    ///   attempt lost the race.
    /// - [`AppError::NoVouchersAvailable`] when the voucher tier is
    ///   empty, which is a pool misconfiguration, not a transient state.
    /// - [`AppError::Store`] on persistence failures.
    pub async fn redeem(
        &self,
        code: &str,
        device_id: &str,
        ip_hash: &str,
    ) -> Result<Prize, AppError> {
        let ticket = self
            .store
            .find_ticket(code)
            .await?
            .ok_or_else(|| AppError::TicketNotFound(code.to_string()))?;

        if ticket.status != TicketStatus::Active {
            return Err(AppError::AlreadyFinalized(ticket.status));
        }
        if !ticket.approved {
            return Err(AppError::PendingApproval);
        }

        for attempt in 1..=MAX_FINALIZE_ATTEMPTS {
            let pool = self.store.available_prizes().await?;
            let mut rand = || (self.rand)();
            let prize = select_prize(&pool, self.config.product_max_probability, &mut rand)?
                .clone();

            match self
                .store
                .finalize_redemption(code, &prize, &ticket.phone, ip_hash, device_id)
                .await?
            {
                FinalizeOutcome::Committed => {
                    tracing::info!(%code, prize_id = prize.id, attempt, "ticket redeemed");
                    self.announce(&ticket.name, code, &prize);
                    return Ok(prize);
                }
                FinalizeOutcome::TicketConflict => {
                    // Another call flipped the ticket first.
                    let current = self.store.find_ticket(code).await?;
                    return Err(match current {
                        Some(t) => AppError::AlreadyFinalized(t.status),
                        None => AppError::TicketNotFound(code.to_string()),
                    });
                }
                FinalizeOutcome::PrizeExhausted => {
                    tracing::warn!(%code, prize_id = prize.id, attempt, "prize drained mid-redeem, reselecting");
                }
            }
        }

        Err(AppError::NoPrizesAvailable)
    }

    fn announce(&self, name: &str, code: &str, prize: &Prize) {
        let text = if prize.kind == PrizeKind::Product {
            format!(
                "🏆 <b>PRODUCT WIN!</b>\n\n👤 {name}\n🎟 <code>{code}</code>\n🎁 {}",
                prize.title
            )
        } else {
            format!(
                "🎉 <b>Redemption</b>\n\n👤 {name}\n🎟 <code>{code}</code>\n🎁 {}",
                prize.title
            )
        };
        self.notifier.notify(text);
    }
}
