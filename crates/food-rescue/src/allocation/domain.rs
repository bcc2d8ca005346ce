use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel item name a need uses to accept any donated item.
pub const ANY_ITEM: &str = "Anything";

/// Identifier wrapper for inventory lots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotId(pub String);

/// Identifier wrapper for beneficiary needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeedId(pub String);

/// Identifier wrapper for donor submissions awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Identifier wrapper for audit feed entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub String);

macro_rules! display_id {
    ($($name:ident),*) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_id!(LotId, NeedId, SubmissionId, ActivityId);

/// Storage category of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotCategory {
    Produce,
    CannedGoods,
    Bakery,
    Dairy,
    Other,
}

impl LotCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Produce => "Produce",
            Self::CannedGoods => "Canned Goods",
            Self::Bakery => "Bakery",
            Self::Dairy => "Dairy",
            Self::Other => "Other",
        }
    }

    /// Lenient lookup used by imports; unrecognised labels land in `Other`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "produce" => Self::Produce,
            "canned goods" | "canned" => Self::CannedGoods,
            "bakery" => Self::Bakery,
            "dairy" => Self::Dairy,
            _ => Self::Other,
        }
    }
}

/// A quantity of one donated item from one source.
///
/// Quantity only moves downward through a committed allocation and dietary
/// tags are fixed at creation, so both are exposed read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: LotId,
    pub item_name: String,
    pub category: LotCategory,
    quantity: u32,
    pub unit: String,
    pub donor: String,
    pub expires_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    dietary_tags: BTreeSet<String>,
}

impl InventoryLot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LotId,
        item_name: impl Into<String>,
        category: LotCategory,
        quantity: u32,
        unit: impl Into<String>,
        donor: impl Into<String>,
        expires_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_name: item_name.into(),
            category,
            quantity,
            unit: unit.into(),
            donor: donor.into(),
            expires_at,
            received_at,
            dietary_tags: BTreeSet::new(),
        }
    }

    pub fn with_dietary_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn dietary_tags(&self) -> &BTreeSet<String> {
        &self.dietary_tags
    }

    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_low_stock(&self, threshold: u32) -> bool {
        self.quantity < threshold
    }

    /// True when the lot spoils before `now + window`, already expired lots
    /// included. A horizon past the last representable instant covers every lot.
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.checked_add_signed(window)
            .map_or(window > Duration::zero(), |horizon| self.expires_at < horizon)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// What a need asks for: one named item or anything at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestedItem {
    Named(String),
    Anything,
}

impl RequestedItem {
    pub fn accepts(&self, item_name: &str) -> bool {
        match self {
            Self::Anything => true,
            Self::Named(name) => name == item_name,
        }
    }

    pub fn is_anything(&self) -> bool {
        matches!(self, Self::Anything)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Anything => ANY_ITEM,
            Self::Named(name) => name,
        }
    }
}

impl From<String> for RequestedItem {
    fn from(value: String) -> Self {
        if value == ANY_ITEM {
            Self::Anything
        } else {
            Self::Named(value)
        }
    }
}

impl From<&str> for RequestedItem {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<RequestedItem> for String {
    fn from(value: RequestedItem) -> Self {
        match value {
            RequestedItem::Anything => ANY_ITEM.to_string(),
            RequestedItem::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedPriority {
    High,
    Medium,
    Low,
}

impl NeedPriority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Outstanding request from a shelter or kitchen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryNeed {
    pub id: NeedId,
    pub beneficiary_name: String,
    pub item: RequestedItem,
    quantity_needed: u32,
    pub unit: String,
    pub priority: NeedPriority,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub current_stock: u32,
    #[serde(default)]
    pub dietary_requirements: BTreeSet<String>,
}

impl BeneficiaryNeed {
    pub fn new(
        id: NeedId,
        beneficiary_name: impl Into<String>,
        item: impl Into<RequestedItem>,
        quantity_needed: u32,
        unit: impl Into<String>,
        priority: NeedPriority,
    ) -> Self {
        Self {
            id,
            beneficiary_name: beneficiary_name.into(),
            item: item.into(),
            quantity_needed,
            unit: unit.into(),
            priority,
            address: String::new(),
            capacity: 0,
            current_stock: 0,
            dietary_requirements: BTreeSet::new(),
        }
    }

    pub fn with_dietary_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_site(mut self, address: impl Into<String>, capacity: u32, current_stock: u32) -> Self {
        self.address = address.into();
        self.capacity = capacity;
        self.current_stock = current_stock;
        self
    }

    pub fn quantity_needed(&self) -> u32 {
        self.quantity_needed
    }

    pub fn is_fulfilled(&self) -> bool {
        self.quantity_needed == 0
    }

    /// Free storage at the beneficiary site.
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_stock)
    }

    pub(crate) fn set_quantity_needed(&mut self, quantity: u32) {
        self.quantity_needed = quantity;
    }
}

/// Which ranking pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Urgency,
    WastePrevention,
    Abundance,
}

/// Proposed, unconfirmed allocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub lot_id: LotId,
    pub need_id: NeedId,
    pub quantity: u32,
    pub rule: MatchRule,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Match,
    Donation,
    Alert,
    Pledge,
}

impl ActivityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Donation => "donation",
            Self::Alert => "alert",
            Self::Pledge => "pledge",
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub kind: ActivityKind,
}

/// Operator request to move stock from one lot to one need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub lot_id: LotId,
    pub need_id: NeedId,
    pub quantity: i64,
}

impl From<&MatchCandidate> for AllocationRequest {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            lot_id: candidate.lot_id.clone(),
            need_id: candidate.need_id.clone(),
            quantity: i64::from(candidate.quantity),
        }
    }
}

/// Free-form category chosen by donors on the submission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionCategory {
    Food,
    Clothing,
    Medical,
    Other,
}

impl SubmissionCategory {
    pub const fn lot_category(self) -> LotCategory {
        match self {
            Self::Food => LotCategory::Produce,
            Self::Clothing | Self::Medical | Self::Other => LotCategory::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub category: SubmissionCategory,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub storage_notes: String,
}

/// Lifecycle owned by the surrounding application; intake only moves
/// `PendingReview` to `Matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingReview,
    Matched,
    Collected,
    InTransit,
    Delivered,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Matched => "matched",
            Self::Collected => "collected",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub need_id: NeedId,
    pub beneficiary_name: String,
}

/// Donor-submitted item list awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSubmission {
    pub id: SubmissionId,
    pub donor_id: String,
    pub donor_name: String,
    pub items: Vec<SubmissionItem>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub match_details: Option<MatchDetails>,
}

/// Point-in-time copy of the collections the engine reads.
///
/// Order is significant: every tie-break in the recommendation passes follows
/// the order lots and needs appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub lots: Vec<InventoryLot>,
    pub needs: Vec<BeneficiaryNeed>,
}

impl InventorySnapshot {
    pub fn lot(&self, id: &LotId) -> Option<&InventoryLot> {
        self.lots.iter().find(|lot| &lot.id == id)
    }

    pub fn need(&self, id: &NeedId) -> Option<&BeneficiaryNeed> {
        self.needs.iter().find(|need| &need.id == id)
    }
}
