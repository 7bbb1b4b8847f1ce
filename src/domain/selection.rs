//! Tiered weighted-random prize selection.
//!
//! Two-stage draw: first the tier (product vs voucher) is chosen with a
//! capped product probability, then one item within the tier is chosen
//! proportionally to its relative weight. The random source is injected
//! as a closure yielding uniform values in `[0, 1)`, which keeps both
//! stages pure and deterministic under test.

use crate::domain::prize::{Prize, PrizeKind};

/// Why a selection attempt produced no prize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The combined prize pool is empty.
    #[error("no prizes available")]
    NoPrizesAvailable,
    /// Voucher selection was attempted on an empty voucher pool. The
    /// operator must always keep at least one unlimited voucher.
    #[error("no vouchers available")]
    NoVouchersAvailable,
}

/// Picks one prize from `pool` proportionally to weight.
///
/// Draws `r ∈ [0, total_weight)` and walks the pool in its given order,
/// subtracting each weight from `r`; the first item where the running
/// remainder drops to `<= 0` is selected. If the walk completes without
/// triggering (floating-point edge case), the first item is returned.
/// That fallback is deliberate: the picker never returns "no selection"
/// for a non-empty pool.
///
/// Returns `None` only when `pool` is empty.
pub fn pick_weighted<'a, R: FnMut() -> f64>(
    pool: &[&'a Prize],
    rand: &mut R,
) -> Option<&'a Prize> {
    let first = *pool.first()?;

    let total_weight: f64 = pool.iter().map(|p| p.weight).sum();
    let mut remainder = rand() * total_weight;

    for prize in pool {
        remainder -= prize.weight;
        if remainder <= 0.0 {
            return Some(prize);
        }
    }

    Some(first)
}

/// Selects exactly one prize from the pool using the tiered draw.
///
/// `prizes` must already exclude finite-and-exhausted items
/// (`quantity == 0`); its iteration order is the stable selection order.
/// The first random draw decides the tier: if it lands under
/// `product_max_probability` and any products exist, the product tier is
/// tried; a product whose quantity turns out to be `0` (stale read) falls
/// back to the voucher tier rather than awarding out-of-stock inventory.
///
/// # Errors
///
/// - [`SelectionError::NoPrizesAvailable`] when the combined pool is empty.
/// - [`SelectionError::NoVouchersAvailable`] when voucher selection is
///   reached with an empty voucher pool, a fatal operator
///   misconfiguration, not a user-retryable state.
pub fn select_prize<'a, R: FnMut() -> f64>(
    prizes: &'a [Prize],
    product_max_probability: f64,
    rand: &mut R,
) -> Result<&'a Prize, SelectionError> {
    let vouchers: Vec<&Prize> = prizes
        .iter()
        .filter(|p| p.kind == PrizeKind::Voucher)
        .collect();
    let products: Vec<&Prize> = prizes
        .iter()
        .filter(|p| p.kind == PrizeKind::Product)
        .collect();

    if vouchers.is_empty() && products.is_empty() {
        return Err(SelectionError::NoPrizesAvailable);
    }

    let try_product = rand() < product_max_probability && !products.is_empty();

    if try_product {
        if let Some(prize) = pick_weighted(&products, rand) {
            if prize.quantity != 0 {
                return Ok(prize);
            }
            // Stale read: the product sold out between load and draw.
        }
    }

    pick_weighted(&vouchers, rand).ok_or(SelectionError::NoVouchersAvailable)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn prize(id: i64, kind: PrizeKind, quantity: i64, weight: f64) -> Prize {
        Prize {
            id,
            title: format!("prize-{id}"),
            kind,
            description: None,
            image_url: None,
            quantity,
            weight,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_pool_yields_none() {
        let mut rand = || 0.5;
        assert!(pick_weighted(&[], &mut rand).is_none());
    }

    #[test]
    fn pick_is_proportional_to_weight_boundaries() {
        let a = prize(1, PrizeKind::Voucher, -1, 1.0);
        let b = prize(2, PrizeKind::Voucher, -1, 3.0);
        let pool = vec![&a, &b];

        // total = 4; r2 = 0.2 * 4 = 0.8 lands in a's span [0, 1]
        let mut low = || 0.2;
        assert_eq!(pick_weighted(&pool, &mut low).map(|p| p.id), Some(1));

        // r2 = 0.5 * 4 = 2.0 lands in b's span (1, 4]
        let mut mid = || 0.5;
        assert_eq!(pick_weighted(&pool, &mut mid).map(|p| p.id), Some(2));
    }

    #[test]
    fn degenerate_random_source_falls_back_to_first() {
        let a = prize(1, PrizeKind::Voucher, -1, 2.0);
        let b = prize(2, PrizeKind::Voucher, -1, 2.0);
        let pool = vec![&a, &b];

        // An out-of-contract draw >= 1.0 leaves the remainder positive
        // after the full walk; the first item must still be returned.
        let mut broken = || 1.5;
        assert_eq!(pick_weighted(&pool, &mut broken).map(|p| p.id), Some(1));
    }

    #[test]
    fn no_prizes_at_all_is_an_error() {
        let mut rand = || 0.5;
        assert_eq!(
            select_prize(&[], 0.01, &mut rand),
            Err(SelectionError::NoPrizesAvailable)
        );
    }

    #[test]
    fn empty_voucher_pool_is_fatal_when_voucher_tier_chosen() {
        let prizes = vec![prize(1, PrizeKind::Product, 5, 1.0)];
        // 0.9 >= cap, so the voucher tier is chosen and found empty.
        let mut rand = || 0.9;
        assert_eq!(
            select_prize(&prizes, 0.01, &mut rand),
            Err(SelectionError::NoVouchersAvailable)
        );
    }

    #[test]
    fn stale_exhausted_product_falls_back_to_voucher() {
        let prizes = vec![
            prize(1, PrizeKind::Product, 0, 10.0),
            prize(2, PrizeKind::Voucher, -1, 1.0),
        ];
        // 0.0 < cap forces the product tier; its only item is exhausted.
        let mut rand = || 0.0;
        let Ok(selected) = select_prize(&prizes, 0.01, &mut rand) else {
            panic!("expected voucher fallback");
        };
        assert_eq!(selected.id, 2);
    }

    #[test]
    fn product_tier_respects_probability_cap() {
        let prizes = vec![
            prize(1, PrizeKind::Voucher, -1, 40.0),
            prize(2, PrizeKind::Voucher, -1, 30.0),
            prize(3, PrizeKind::Voucher, -1, 20.0),
            prize(4, PrizeKind::Voucher, -1, 9.0),
            prize(5, PrizeKind::Product, -1, 1.0),
        ];

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut rand = move || rng.random::<f64>();

        const DRAWS: u32 = 100_000;
        const CAP: f64 = 0.01;
        let mut counts: HashMap<i64, u32> = HashMap::new();
        for _ in 0..DRAWS {
            let Ok(selected) = select_prize(&prizes, CAP, &mut rand) else {
                panic!("selection failed");
            };
            *counts.entry(selected.id).or_insert(0) += 1;
        }

        // Product rate ≈ 1%. sd ≈ 31.5 at n=100k; allow 5 sd.
        let product_count = counts.get(&5).copied().unwrap_or(0);
        let expected = f64::from(DRAWS) * CAP;
        let tolerance = 5.0 * (f64::from(DRAWS) * CAP * (1.0 - CAP)).sqrt();
        let diff = (f64::from(product_count) - expected).abs();
        assert!(
            diff < tolerance,
            "product count {product_count} deviates from {expected} by more than {tolerance}"
        );

        // Voucher frequencies proportional to weights 40:30:20:9.
        let voucher_total: u32 = [1i64, 2, 3, 4]
            .iter()
            .map(|id| counts.get(id).copied().unwrap_or(0))
            .sum();
        let weight_total = 40.0 + 30.0 + 20.0 + 9.0;
        for (id, weight) in [(1i64, 40.0), (2, 30.0), (3, 20.0), (4, 9.0)] {
            let observed =
                f64::from(counts.get(&id).copied().unwrap_or(0)) / f64::from(voucher_total);
            let expected_share = weight / weight_total;
            assert!(
                (observed - expected_share).abs() < 0.02,
                "prize {id}: observed share {observed:.4}, expected {expected_share:.4}"
            );
        }
    }

    #[test]
    fn zero_cap_never_selects_products() {
        let prizes = vec![
            prize(1, PrizeKind::Voucher, -1, 1.0),
            prize(2, PrizeKind::Product, -1, 1000.0),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let mut rand = move || rng.random::<f64>();
        for _ in 0..1000 {
            let Ok(selected) = select_prize(&prizes, 0.0, &mut rand) else {
                panic!("selection failed");
            };
            assert_eq!(selected.kind, PrizeKind::Voucher);
        }
    }
}
