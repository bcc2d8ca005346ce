use super::domain::{BeneficiaryNeed, InventoryLot};

/// Whether `lot` may satisfy `need`.
///
/// The need must ask for the lot's item by name (or for anything), and every
/// dietary requirement of the need must be among the lot's dietary tags.
pub fn is_compatible(lot: &InventoryLot, need: &BeneficiaryNeed) -> bool {
    need.item.accepts(&lot.item_name)
        && need
            .dietary_requirements
            .is_subset(lot.dietary_tags())
}

/// Dietary requirements of `need` the lot does not carry, in sorted order.
pub fn missing_dietary_tags<'a>(lot: &'a InventoryLot, need: &'a BeneficiaryNeed) -> Vec<&'a str> {
    need.dietary_requirements
        .difference(lot.dietary_tags())
        .map(String::as_str)
        .collect()
}
