//! In-memory entity cache with substring search indexes.
//!
//! Holds the last successful fetch of customers, vendors, items, and
//! invoices, plus flat search indexes rebuilt on every update. Reads
//! are snapshots; the whole structure sits behind one RwLock.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use qbo_types::{CacheSnapshot, Customer, Invoice, Item, Vendor};
use serde::Serialize;

/// One row of a search index. A single shape covers all indexes; fields
/// that do not apply to an index stay `None` and are skipped on output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchEntry {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

impl SearchEntry {
    fn blank(id: Option<String>, name: String, entry_type: &'static str, active: bool) -> Self {
        Self {
            id,
            name,
            entry_type,
            active,
            company_name: None,
            email: None,
            description: None,
            item_type: None,
            sku: None,
            unit_price: None,
        }
    }
}

/// Names of all search indexes, in presentation order.
pub const INDEX_NAMES: &[&str] = &[
    "client_names",
    "vendor_names",
    "client_pos",
    "product_names",
    "product_descriptions",
    "part_names",
    "part_numbers",
];

pub const DEFAULT_SEARCH_LIMIT: usize = 15;

#[derive(Debug, Default)]
struct SearchIndexes {
    client_names: Vec<SearchEntry>,
    vendor_names: Vec<SearchEntry>,
    /// Customer purchase orders; needs a PurchaseOrder entity query
    /// that is not wired up yet, so the slot stays empty.
    client_pos: Vec<SearchEntry>,
    product_names: Vec<SearchEntry>,
    product_descriptions: Vec<SearchEntry>,
    part_names: Vec<SearchEntry>,
    part_numbers: Vec<SearchEntry>,
}

impl SearchIndexes {
    fn by_name(&self, name: &str) -> Option<&Vec<SearchEntry>> {
        match name {
            "client_names" => Some(&self.client_names),
            "vendor_names" => Some(&self.vendor_names),
            "client_pos" => Some(&self.client_pos),
            "product_names" => Some(&self.product_names),
            "product_descriptions" => Some(&self.product_descriptions),
            "part_names" => Some(&self.part_names),
            "part_numbers" => Some(&self.part_numbers),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    customers: Vec<Customer>,
    vendors: Vec<Vendor>,
    items: Vec<Item>,
    invoices: Vec<Invoice>,
    last_updated: Option<DateTime<Utc>>,
    indexes: SearchIndexes,
}

/// Shared cache of QuickBooks entities.
#[derive(Debug, Default)]
pub struct CacheStore {
    inner: RwLock<CacheInner>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached data wholesale and rebuild all indexes.
    pub fn install(
        &self,
        customers: Vec<Customer>,
        vendors: Vec<Vendor>,
        items: Vec<Item>,
        invoices: Vec<Invoice>,
    ) {
        let indexes = build_indexes(&customers, &vendors, &items);
        let mut inner = self.inner.write();
        inner.customers = customers;
        inner.vendors = vendors;
        inner.items = items;
        inner.invoices = invoices;
        inner.last_updated = Some(Utc::now());
        inner.indexes = indexes;

        tracing::info!(
            customers = inner.customers.len(),
            vendors = inner.vendors.len(),
            items = inner.items.len(),
            invoices = inner.invoices.len(),
            "Cache updated"
        );
    }

    /// Drop everything, e.g. on disconnect.
    pub fn clear(&self) {
        *self.inner.write() = CacheInner::default();
    }

    /// Counts and freshness.
    pub fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.read();
        CacheSnapshot {
            customers_count: inner.customers.len(),
            vendors_count: inner.vendors.len(),
            items_count: inner.items.len(),
            invoices_count: inner.invoices.len(),
            last_updated: inner.last_updated,
        }
    }

    /// Entry count per index, for the index status endpoint.
    pub fn index_counts(&self) -> BTreeMap<&'static str, usize> {
        let inner = self.inner.read();
        INDEX_NAMES
            .iter()
            .map(|&name| (name, inner.indexes.by_name(name).map_or(0, Vec::len)))
            .collect()
    }

    /// Case-insensitive substring search over one index. Unknown index
    /// names return no results.
    pub fn search(&self, index_name: &str, query: &str, limit: usize) -> Vec<SearchEntry> {
        let inner = self.inner.read();
        let Some(index) = inner.indexes.by_name(index_name) else {
            return Vec::new();
        };
        let needle = query.to_lowercase();

        index
            .iter()
            .filter(|entry| entry_matches(index_name, entry, &needle))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn customers(&self, limit: usize) -> (Vec<Customer>, usize) {
        let inner = self.inner.read();
        (inner.customers.iter().take(limit).cloned().collect(), inner.customers.len())
    }

    pub fn vendors(&self, limit: usize) -> (Vec<Vendor>, usize) {
        let inner = self.inner.read();
        (inner.vendors.iter().take(limit).cloned().collect(), inner.vendors.len())
    }

    pub fn items(&self, limit: usize) -> (Vec<Item>, usize) {
        let inner = self.inner.read();
        (inner.items.iter().take(limit).cloned().collect(), inner.items.len())
    }

    pub fn invoices(&self, limit: usize) -> (Vec<Invoice>, usize) {
        let inner = self.inner.read();
        (inner.invoices.iter().take(limit).cloned().collect(), inner.invoices.len())
    }
}

fn contains(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_ref()
        .is_some_and(|v| v.to_lowercase().contains(needle))
}

/// Per-index field sets for matching.
fn entry_matches(index_name: &str, entry: &SearchEntry, needle: &str) -> bool {
    let name_hit = entry.name.to_lowercase().contains(needle);
    match index_name {
        "client_names" | "vendor_names" => {
            name_hit || contains(&entry.company_name, needle) || contains(&entry.email, needle)
        }
        "product_names" | "part_names" | "part_numbers" => {
            name_hit || contains(&entry.sku, needle)
        }
        "product_descriptions" => name_hit || contains(&entry.description, needle),
        _ => false,
    }
}

fn build_indexes(customers: &[Customer], vendors: &[Vendor], items: &[Item]) -> SearchIndexes {
    let mut indexes = SearchIndexes::default();

    for customer in customers {
        let Some(name) = &customer.name else { continue };
        let mut entry = SearchEntry::blank(customer.id.clone(), name.clone(), "customer", customer.active);
        entry.company_name = customer.company_name.clone().or_else(|| Some(name.clone()));
        entry.email = customer
            .primary_email_addr
            .as_ref()
            .and_then(|e| e.address.clone());
        indexes.client_names.push(entry);
    }

    for vendor in vendors {
        let Some(name) = &vendor.name else { continue };
        let mut entry = SearchEntry::blank(vendor.id.clone(), name.clone(), "vendor", vendor.active);
        entry.company_name = vendor.company_name.clone().or_else(|| Some(name.clone()));
        entry.email = vendor
            .primary_email_addr
            .as_ref()
            .and_then(|e| e.address.clone());
        indexes.vendor_names.push(entry);
    }

    for item in items {
        if let Some(name) = &item.name {
            let mut entry = SearchEntry::blank(item.id.clone(), name.clone(), "item", item.active);
            entry.item_type = item.item_type.clone();
            entry.sku = item.sku.clone();
            entry.unit_price = item.unit_price;

            // part_names is an alias view of product_names.
            indexes.product_names.push(entry.clone());
            indexes.part_names.push(entry.clone());

            if item.sku.is_some() {
                indexes.part_numbers.push(entry);
            }
        }

        if let (Some(name), Some(description)) = (&item.name, &item.description) {
            if !description.is_empty() {
                let mut entry = SearchEntry::blank(item.id.clone(), name.clone(), "item", item.active);
                entry.description = Some(description.clone());
                entry.item_type = item.item_type.clone();
                entry.sku = item.sku.clone();
                entry.unit_price = item.unit_price;
                indexes.product_descriptions.push(entry);
            }
        }
    }

    indexes
}
