//! Subscription listing.

use crate::error::{AmlError, Result};
use crate::flatten::Row;
use crate::provider::{Subscription, SubscriptionProvider};
use crate::table::Table;
use serde_json::Value;

/// Header of the subscription table.
pub const SUBSCRIPTION_COLUMNS: [&str; 2] = ["Subscription_name", "Subscription ID"];

/// All visible subscriptions, one row each.
///
/// # Errors
///
/// Returns the provider's error.
pub fn subscription_table(provider: &dyn SubscriptionProvider) -> Result<Table> {
    let records = provider.subscriptions()?.into_iter().map(|s| {
        let Subscription {
            display_name,
            subscription_id,
        } = s;
        [
            (SUBSCRIPTION_COLUMNS[0].to_string(), Value::from(display_name)),
            (SUBSCRIPTION_COLUMNS[1].to_string(), Value::from(subscription_id)),
        ]
        .into_iter()
        .collect::<Row>()
    });
    let mut table = Table::new(SUBSCRIPTION_COLUMNS);
    for record in records {
        table.push_record(record);
    }
    Ok(table)
}

/// Find a subscription by display name or id.
///
/// # Errors
///
/// Returns `NotFound` when nothing matches.
pub fn find_subscription(
    provider: &dyn SubscriptionProvider,
    name_or_id: &str,
) -> Result<Subscription> {
    provider
        .subscriptions()?
        .into_iter()
        .find(|s| s.subscription_id == name_or_id || s.display_name == name_or_id)
        .ok_or_else(|| AmlError::not_found("subscription", name_or_id))
}
