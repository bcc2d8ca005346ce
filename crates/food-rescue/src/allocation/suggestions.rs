use serde::{Deserialize, Serialize};

use super::domain::{BeneficiaryNeed, NeedPriority, RequestedItem};

const MAX_SUGGESTIONS: usize = 3;

/// Item donors are nudged towards, with the demand behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSuggestion {
    pub item_name: String,
    pub reason: String,
}

struct Demand<'a> {
    item_name: &'a str,
    requests: usize,
    high_priority: bool,
}

/// Rank named items by open demand: high-priority items first, then by how
/// many partners asked, then by first appearance. Needs that only ask for
/// "Anything" fall back to staples; no needs at all suggest nothing.
pub fn suggest_donations(needs: &[BeneficiaryNeed]) -> Vec<DonationSuggestion> {
    if needs.is_empty() {
        return Vec::new();
    }

    let mut demand: Vec<Demand<'_>> = Vec::new();

    for need in needs {
        let RequestedItem::Named(item_name) = &need.item else {
            continue;
        };

        let index = match demand.iter().position(|entry| entry.item_name == item_name.as_str()) {
            Some(index) => index,
            None => {
                demand.push(Demand {
                    item_name: item_name.as_str(),
                    requests: 0,
                    high_priority: false,
                });
                demand.len() - 1
            }
        };

        let entry = &mut demand[index];
        entry.requests += 1;
        entry.high_priority |= need.priority == NeedPriority::High;
    }

    if demand.is_empty() {
        return staple_suggestions();
    }

    // Stable sort keeps first-appearance order among equals.
    demand.sort_by(|a, b| {
        b.high_priority
            .cmp(&a.high_priority)
            .then(b.requests.cmp(&a.requests))
    });

    demand
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|entry| {
            let partners = if entry.requests == 1 {
                "partner"
            } else {
                "partners"
            };
            let reason = if entry.high_priority {
                format!(
                    "A high-priority item requested by {} {partners}.",
                    entry.requests
                )
            } else {
                format!("Requested by {} {partners}.", entry.requests)
            };
            DonationSuggestion {
                item_name: entry.item_name.to_string(),
                reason,
            }
        })
        .collect()
}

fn staple_suggestions() -> Vec<DonationSuggestion> {
    vec![
        DonationSuggestion {
            item_name: "Rice".to_string(),
            reason: "A versatile staple that is always in high demand at community kitchens."
                .to_string(),
        },
        DonationSuggestion {
            item_name: "Cooking Oil".to_string(),
            reason: "Essential for preparing a wide variety of meals for large groups."
                .to_string(),
        },
    ]
}
