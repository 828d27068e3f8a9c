//! Entity fetch routines feeding the cache.
//!
//! Each fetch is independent: a failure for one entity type logs and
//! yields an empty set so a partial upstream outage still refreshes
//! what it can.

use std::sync::Arc;

use qbo_types::{Customer, Invoice, Item, Vendor};
use tracing::{error, info};

use crate::cache::CacheStore;
use crate::client::QboClient;

pub async fn fetch_customers(client: &QboClient) -> Vec<Customer> {
    match client.query("Customer").await {
        Ok(reply) => reply.query_response.customer,
        Err(e) => {
            error!("Customer fetch failed: {}", e);
            Vec::new()
        }
    }
}

pub async fn fetch_vendors(client: &QboClient) -> Vec<Vendor> {
    match client.query("Vendor").await {
        Ok(reply) => reply.query_response.vendor,
        Err(e) => {
            error!("Vendor fetch failed: {}", e);
            Vec::new()
        }
    }
}

pub async fn fetch_items(client: &QboClient) -> Vec<Item> {
    match client.query("Item").await {
        Ok(reply) => reply.query_response.item,
        Err(e) => {
            error!("Item fetch failed: {}", e);
            Vec::new()
        }
    }
}

pub async fn fetch_invoices(client: &QboClient) -> Vec<Invoice> {
    match client.query("Invoice").await {
        Ok(reply) => reply.query_response.invoice,
        Err(e) => {
            error!("Invoice fetch failed: {}", e);
            Vec::new()
        }
    }
}

/// Pull all four entity types and install them into the cache.
///
/// Requires an authenticated token; refuses (without touching the
/// network) when none is present so the scheduler can spin harmlessly
/// before the first OAuth connect.
pub async fn refresh_cache(client: &Arc<QboClient>, cache: &Arc<CacheStore>) -> bool {
    if client.tokens().snapshot().is_empty() {
        info!("Skipping cache refresh: not authenticated");
        return false;
    }
    if !client.tokens().ensure_valid().await {
        error!("Skipping cache refresh: could not obtain a valid token");
        return false;
    }

    info!("Refreshing entity cache from QuickBooks");
    let customers = fetch_customers(client).await;
    let vendors = fetch_vendors(client).await;
    let items = fetch_items(client).await;
    let invoices = fetch_invoices(client).await;

    let fetched_any = !customers.is_empty()
        || !vendors.is_empty()
        || !items.is_empty()
        || !invoices.is_empty();

    cache.install(customers, vendors, items, invoices);
    fetched_any
}
