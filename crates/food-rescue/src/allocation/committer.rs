use serde::{Deserialize, Serialize};

use super::clock::{Clock, IdGenerator};
use super::compatibility::{is_compatible, missing_dietary_tags};
use super::domain::{
    Activity, ActivityKind, AllocationRequest, BeneficiaryNeed, InventoryLot, LotId, NeedId,
};

/// Kinds of records a request can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Lot,
    Need,
    Submission,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lot => "lot",
            Self::Need => "need",
            Self::Submission => "submission",
        }
    }
}

/// Why a requested quantity was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum QuantityIssue {
    NotPositive,
    ExceedsStock { available: u32 },
    ExceedsNeed { outstanding: u32 },
}

impl std::fmt::Display for QuantityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityIssue::NotPositive => write!(f, "quantity must be positive"),
            QuantityIssue::ExceedsStock { available } => {
                write!(f, "only {available} available in the lot")
            }
            QuantityIssue::ExceedsNeed { outstanding } => {
                write!(f, "only {outstanding} still needed")
            }
        }
    }
}

/// Validation errors raised by the committer and the intake matcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("{} '{id}' not found", .kind.label())]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid quantity {requested}: {issue}")]
    InvalidQuantity { requested: i64, issue: QuantityIssue },
    #[error("lot '{lot_id}' cannot satisfy need '{need_id}': {detail}")]
    IncompatibleMatch {
        lot_id: LotId,
        need_id: NeedId,
        detail: String,
    },
    #[error("submission '{id}' is {status}, only pending submissions can be matched")]
    SubmissionNotPending { id: String, status: &'static str },
}

impl AllocationError {
    pub(crate) fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Quantities a successful commit left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub lot_id: LotId,
    pub need_id: NeedId,
    pub quantity: u32,
    pub lot_remaining: u32,
    pub need_remaining: u32,
}

impl Transfer {
    /// Write the remaining quantities onto the matching records.
    ///
    /// Storage adapters call this under their own write lock. Returns `false`
    /// and leaves both slices untouched when either record is absent.
    pub fn apply_to(&self, lots: &mut [InventoryLot], needs: &mut [BeneficiaryNeed]) -> bool {
        let lot = lots.iter().position(|lot| lot.id == self.lot_id);
        let need = needs.iter().position(|need| need.id == self.need_id);
        match (lot, need) {
            (Some(lot), Some(need)) => {
                lots[lot].set_quantity(self.lot_remaining);
                needs[need].set_quantity_needed(self.need_remaining);
                true
            }
            _ => false,
        }
    }
}

/// Result of a commit: updated collections plus the audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub lots: Vec<InventoryLot>,
    pub needs: Vec<BeneficiaryNeed>,
    pub transfer: Transfer,
    pub activity: Activity,
}

/// Validate `request` against the collections and apply the transfer.
///
/// Checks run in order and the first failure wins: lot exists, need exists,
/// quantity positive, pair compatible, quantity within stock, quantity within
/// need. The inputs are never touched; on success the returned collections
/// differ from the inputs in exactly one lot and one need.
pub fn commit_allocation(
    lots: &[InventoryLot],
    needs: &[BeneficiaryNeed],
    request: &AllocationRequest,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
) -> Result<CommitOutcome, AllocationError> {
    let lot_index = lots
        .iter()
        .position(|lot| lot.id == request.lot_id)
        .ok_or_else(|| AllocationError::not_found(EntityKind::Lot, &request.lot_id))?;
    let need_index = needs
        .iter()
        .position(|need| need.id == request.need_id)
        .ok_or_else(|| AllocationError::not_found(EntityKind::Need, &request.need_id))?;

    let lot = &lots[lot_index];
    let need = &needs[need_index];
    let quantity = validate_quantity(lot, need, request)?;

    let lot_remaining = lot.quantity() - quantity;
    let need_remaining = need.quantity_needed() - quantity;

    let activity = Activity {
        id: ids.next_activity_id(),
        timestamp: clock.now(),
        description: format!(
            "{} ({} {}) matched to {}.",
            lot.item_name, quantity, lot.unit, need.beneficiary_name
        ),
        kind: ActivityKind::Match,
    };

    let mut updated_lots = lots.to_vec();
    updated_lots[lot_index].set_quantity(lot_remaining);
    let mut updated_needs = needs.to_vec();
    updated_needs[need_index].set_quantity_needed(need_remaining);

    Ok(CommitOutcome {
        lots: updated_lots,
        needs: updated_needs,
        transfer: Transfer {
            lot_id: request.lot_id.clone(),
            need_id: request.need_id.clone(),
            quantity,
            lot_remaining,
            need_remaining,
        },
        activity,
    })
}

fn validate_quantity(
    lot: &InventoryLot,
    need: &BeneficiaryNeed,
    request: &AllocationRequest,
) -> Result<u32, AllocationError> {
    let requested = request.quantity;
    if requested <= 0 {
        return Err(AllocationError::InvalidQuantity {
            requested,
            issue: QuantityIssue::NotPositive,
        });
    }

    if !is_compatible(lot, need) {
        let detail = if need.item.accepts(&lot.item_name) {
            format!(
                "missing dietary tags {}",
                missing_dietary_tags(lot, need).join(", ")
            )
        } else {
            format!(
                "need asks for {} but lot holds {}",
                need.item.label(),
                lot.item_name
            )
        };
        return Err(AllocationError::IncompatibleMatch {
            lot_id: lot.id.clone(),
            need_id: need.id.clone(),
            detail,
        });
    }

    let exceeds_stock = || AllocationError::InvalidQuantity {
        requested,
        issue: QuantityIssue::ExceedsStock {
            available: lot.quantity(),
        },
    };
    let quantity = u32::try_from(requested).map_err(|_| exceeds_stock())?;
    if quantity > lot.quantity() {
        return Err(exceeds_stock());
    }
    if quantity > need.quantity_needed() {
        return Err(AllocationError::InvalidQuantity {
            requested,
            issue: QuantityIssue::ExceedsNeed {
                outstanding: need.quantity_needed(),
            },
        });
    }

    Ok(quantity)
}
