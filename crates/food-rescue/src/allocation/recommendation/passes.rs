use chrono::{DateTime, Duration, Utc};

use super::super::compatibility::is_compatible;
use super::super::domain::{
    BeneficiaryNeed, InventoryLot, InventorySnapshot, MatchCandidate, MatchRule, NeedPriority,
};
use super::claims::ClaimSet;
use super::config::RecommendationConfig;

/// Pass A: serve every high-priority need from its smallest compatible lot.
pub(crate) fn urgency_first(snapshot: &InventorySnapshot, claims: &mut ClaimSet) {
    let urgent = snapshot
        .needs
        .iter()
        .filter(|need| need.priority == NeedPriority::High);

    for need in urgent {
        if claims.is_full() {
            return;
        }
        if !open_need(need, claims) {
            continue;
        }

        // min_by_key keeps the first lot on ties, preserving snapshot order.
        let smallest = snapshot
            .lots
            .iter()
            .filter(|lot| open_lot(lot, claims) && is_compatible(lot, need))
            .min_by_key(|lot| lot.quantity());

        if let Some(lot) = smallest {
            claims.claim(MatchCandidate {
                lot_id: lot.id.clone(),
                need_id: need.id.clone(),
                quantity: lot.quantity().min(need.quantity_needed()),
                rule: MatchRule::Urgency,
                reason: format!(
                    "Fulfills a high-priority request from {}.",
                    need.beneficiary_name
                ),
            });
        }
    }
}

/// Pass B: route lots about to spoil to the first need that can take them.
pub(crate) fn waste_prevention(
    snapshot: &InventorySnapshot,
    config: &RecommendationConfig,
    now: DateTime<Utc>,
    claims: &mut ClaimSet,
) {
    let window = Duration::try_days(config.expiry_window_days).unwrap_or(Duration::MAX);
    let expiring = snapshot
        .lots
        .iter()
        .filter(|lot| lot.expires_within(now, window));

    for lot in expiring {
        if claims.is_full() {
            return;
        }
        if !open_lot(lot, claims) {
            continue;
        }

        let taker = snapshot
            .needs
            .iter()
            .find(|need| open_need(need, claims) && is_compatible(lot, need));

        if let Some(need) = taker {
            claims.claim(MatchCandidate {
                lot_id: lot.id.clone(),
                need_id: need.id.clone(),
                quantity: lot.quantity().min(need.quantity_needed()),
                rule: MatchRule::WastePrevention,
                reason: format!(
                    "Prevents waste by using {} which expires on {}.",
                    lot.item_name,
                    lot.expires_at.format("%Y-%m-%d")
                ),
            });
        }
    }
}

/// Pass C: hand a capped share of an abundant lot to an open "Anything" need.
pub(crate) fn abundance_fallback(
    snapshot: &InventorySnapshot,
    config: &RecommendationConfig,
    claims: &mut ClaimSet,
) {
    if claims.is_full() {
        return;
    }

    let general_needs = snapshot
        .needs
        .iter()
        .filter(|need| need.item.is_anything() && open_need(need, claims));

    for need in general_needs {
        let abundant = snapshot.lots.iter().find(|lot| {
            lot.quantity() > config.abundance_threshold
                && open_lot(lot, claims)
                && is_compatible(lot, need)
        });

        if let Some(lot) = abundant {
            claims.claim(MatchCandidate {
                lot_id: lot.id.clone(),
                need_id: need.id.clone(),
                quantity: lot
                    .quantity()
                    .min(need.quantity_needed())
                    .min(config.abundance_cap),
                rule: MatchRule::Abundance,
                reason: format!(
                    "{} is available in high quantity and can fulfill the general need of {}.",
                    lot.item_name, need.beneficiary_name
                ),
            });
            return;
        }
    }
}

fn open_lot(lot: &InventoryLot, claims: &ClaimSet) -> bool {
    lot.is_available() && !claims.lot_claimed(&lot.id)
}

fn open_need(need: &BeneficiaryNeed, claims: &ClaimSet) -> bool {
    !need.is_fulfilled() && !claims.need_claimed(&need.id)
}
