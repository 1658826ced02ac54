//! Live-booking reconciler.
//!
//! Diffs the cached live bookings against a freshly scraped snapshot of what
//! the user actually holds on the portal. Keys are case-insensitive
//! (name, date, time) triples: entries only in the snapshot are inserted,
//! entries only in the cache are deleted, and entries present in both but
//! spelled differently get an in-place rename so the row id and any
//! back-reference to the recurring definition survive.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use eyre::Result;
use tracing::{debug, info};

use crate::store::BookingStore;
use rebook_core::models::class::LiveBookingSnapshot;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub removed: usize,
    pub renamed: usize,
}

impl ReconcileStats {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.renamed
    }
}

type Key = (String, NaiveDate, NaiveTime);

fn key(name: &str, date: NaiveDate, time: NaiveTime) -> Key {
    (name.to_lowercase(), date, time)
}

/// Idempotent: a second run with the same snapshot performs no mutations.
pub async fn reconcile(
    store: &dyn BookingStore,
    username: &str,
    scraped: &[LiveBookingSnapshot],
) -> Result<ReconcileStats> {
    let cached = store.list_live_bookings_for_user(username).await?;

    let mut scraped_by_key: HashMap<Key, &LiveBookingSnapshot> = HashMap::new();
    for snapshot in scraped {
        scraped_by_key.insert(
            key(&snapshot.class_name, snapshot.class_date, snapshot.class_time),
            snapshot,
        );
    }

    let mut stats = ReconcileStats::default();
    let mut cached_keys: HashSet<Key> = HashSet::new();

    for row in &cached {
        let k = key(&row.class_name, row.class_date, row.class_time);
        cached_keys.insert(k.clone());

        match scraped_by_key.get(&k) {
            None => {
                // Cancelled directly on the portal, or the class already
                // happened and dropped off.
                info!(
                    "Removing cached booking no longer held remotely: {} '{}' on {}",
                    username, row.class_name, row.class_date
                );
                store.delete_live_booking(row.id).await?;
                stats.removed += 1;
            }
            Some(snapshot) if snapshot.class_name != row.class_name => {
                debug!(
                    "Renaming cached booking '{}' to '{}' for {}",
                    row.class_name, snapshot.class_name, username
                );
                store.rename_live_booking(row.id, &snapshot.class_name).await?;
                stats.renamed += 1;
            }
            Some(_) => {}
        }
    }

    for (k, snapshot) in &scraped_by_key {
        if !cached_keys.contains(k) {
            info!(
                "Caching booking discovered remotely: {} '{}' on {}",
                username, snapshot.class_name, snapshot.class_date
            );
            store
                .upsert_live_booking(
                    username,
                    &snapshot.class_name,
                    snapshot.class_date,
                    snapshot.class_time,
                    None,
                    None,
                )
                .await?;
            stats.added += 1;
        }
    }

    Ok(stats)
}
