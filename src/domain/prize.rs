//! Prize inventory model and redemption audit records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prize tier discriminator.
///
/// `Voucher` is the unlimited default tier; `Product` is the scarce tier
/// whose selection probability is capped per draw.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PrizeKind {
    /// Unlimited-tier prize (discount codes, coupons).
    Voucher,
    /// Scarce physical prize with capped draw probability.
    Product,
}

impl fmt::Display for PrizeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Voucher => "voucher",
            Self::Product => "product",
        };
        write!(f, "{s}")
    }
}

/// Sentinel quantity marking a prize as unlimited stock.
pub const UNLIMITED_QUANTITY: i64 = -1;

/// An inventory item available for redemption draws.
///
/// `quantity` is `-1` for unlimited stock or `>= 0` for finite stock; it
/// never goes negative. A prize with `quantity == 0` is excluded from
/// selection. `weight` is relative within the prize's tier, not
/// normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Prize {
    /// Auto-increment row ID.
    pub id: i64,
    /// Prize title shown to winners.
    pub title: String,
    /// Tier discriminator.
    pub kind: PrizeKind,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional image reference for the UI.
    pub image_url: Option<String>,
    /// Remaining stock (`-1` = unlimited, `>= 0` = finite).
    pub quantity: i64,
    /// Relative draw weight within this prize's tier (`> 0`).
    pub weight: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Prize {
    /// Returns `true` if the prize has unlimited stock.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.quantity == UNLIMITED_QUANTITY
    }

    /// Returns `true` if the prize can still be awarded (unlimited or
    /// in stock).
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity != 0
    }
}

/// Field set required to create a prize.
#[derive(Debug, Clone)]
pub struct NewPrize {
    /// Prize title.
    pub title: String,
    /// Tier discriminator.
    pub kind: PrizeKind,
    /// Optional description.
    pub description: Option<String>,
    /// Optional image reference.
    pub image_url: Option<String>,
    /// Initial stock (`-1` = unlimited).
    pub quantity: i64,
    /// Relative draw weight.
    pub weight: f64,
}

/// Partial update applied to an existing prize.
///
/// `None` fields are left untouched. Edits affect only future draws;
/// past [`Redemption`] snapshots are never rewritten.
#[derive(Debug, Clone, Default)]
pub struct PrizePatch {
    /// New title, if any.
    pub title: Option<String>,
    /// New tier, if any.
    pub kind: Option<PrizeKind>,
    /// New description, if any.
    pub description: Option<String>,
    /// New image reference, if any.
    pub image_url: Option<String>,
    /// New stock level, if any.
    pub quantity: Option<i64>,
    /// New draw weight, if any.
    pub weight: Option<f64>,
}

impl PrizePatch {
    /// Returns `true` when the patch carries no field changes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.quantity.is_none()
            && self.weight.is_none()
    }
}

/// Immutable audit record of one successful prize award.
///
/// `prize_snapshot` holds a serialized copy of the [`Prize`] exactly as
/// awarded, so the record survives later edits or deletion of the live
/// prize row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Redemption {
    /// Auto-increment row ID.
    pub id: i64,
    /// Code of the redeemed ticket.
    pub ticket_code: String,
    /// ID of the awarded prize at award time.
    pub prize_id: i64,
    /// JSON snapshot of the prize as awarded.
    pub prize_snapshot: String,
    /// Registrant phone number.
    pub phone: String,
    /// Salted hash of the redeeming client's network address.
    pub ip_hash: String,
    /// Device identifier supplied at redemption time.
    pub device_id: String,
    /// Redemption timestamp.
    pub created_at: DateTime<Utc>,
}

impl Redemption {
    /// Deserializes the stored prize snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the stored snapshot is not valid
    /// JSON for a [`Prize`]. This only happens on store corruption.
    pub fn snapshot(&self) -> Result<Prize, serde_json::Error> {
        serde_json::from_str(&self.prize_snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_prize(quantity: i64) -> Prize {
        Prize {
            id: 1,
            title: "10% discount".to_string(),
            kind: PrizeKind::Voucher,
            description: None,
            image_url: None,
            quantity,
            weight: 1.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn availability_follows_quantity() {
        assert!(make_prize(UNLIMITED_QUANTITY).is_available());
        assert!(make_prize(3).is_available());
        assert!(!make_prize(0).is_available());
    }

    #[test]
    fn unlimited_sentinel() {
        assert!(make_prize(-1).is_unlimited());
        assert!(!make_prize(5).is_unlimited());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(PrizePatch::default().is_empty());
        let patch = PrizePatch {
            weight: Some(2.0),
            ..PrizePatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let prize = make_prize(5);
        let Ok(snapshot) = serde_json::to_string(&prize) else {
            panic!("snapshot serialization failed");
        };
        let redemption = Redemption {
            id: 1,
            ticket_code: "DRM25-KOL-A1B2C3".to_string(),
            prize_id: prize.id,
            prize_snapshot: snapshot,
            phone: "+900000001".to_string(),
            ip_hash: "hash".to_string(),
            device_id: "device-1".to_string(),
            created_at: Utc::now(),
        };
        let Ok(decoded) = redemption.snapshot() else {
            panic!("snapshot deserialization failed");
        };
        assert_eq!(decoded.title, prize.title);
        assert_eq!(decoded.quantity, 5);
    }
}
