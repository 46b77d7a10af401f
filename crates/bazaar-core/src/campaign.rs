//! # Campaign Selector
//!
//! Picks the best single applicable seller campaign for one listing line.
//!
//! ## Selection Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  select_best_campaign(campaigns, listing, category, price, now)         │
//! │                                                                         │
//! │  restricted category? ──────────────────────────► None (hard exclusion) │
//! │       │                                                                 │
//! │       ▼  for each candidate                                             │
//! │  inactive / outside window? ─► drop                                     │
//! │  eligibility filters miss?  ─► drop                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount = unit_price × bps/10000 (half-up)  or  fixed cents           │
//! │  keep the strictly largest discount (first candidate wins ties)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  best discount ≤ 0? ──► None, else Some(AppliedCampaign)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure function: time is an input, nothing is mutated.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{AppliedCampaign, Campaign, Category};

/// Selects the campaign granting the largest per-unit discount on a line.
///
/// Each candidate's discount is rounded half-up to cents independently
/// before comparison. Ties keep the earliest candidate in slice order, so
/// selection is deterministic for a stable campaign query.
pub fn select_best_campaign(
    campaigns: &[Campaign],
    listing_id: &str,
    category: Category,
    unit_price: Money,
    now: DateTime<Utc>,
) -> Option<AppliedCampaign> {
    // Real-estate and vehicle listings are never discounted, regardless
    // of how any campaign is configured.
    if category.is_discount_restricted() {
        return None;
    }

    let mut best: Option<(&Campaign, Money)> = None;

    for campaign in campaigns {
        if !campaign.is_live(now) || !campaign.applies_to(listing_id, category) {
            continue;
        }

        let discount = campaign.discount_for(unit_price);
        match best {
            Some((_, best_discount)) if discount <= best_discount => {}
            _ => best = Some((campaign, discount)),
        }
    }

    match best {
        Some((campaign, discount)) if discount.is_positive() => Some(AppliedCampaign {
            campaign_id: campaign.id.clone(),
            unit_discount_cents: discount.cents(),
        }),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
