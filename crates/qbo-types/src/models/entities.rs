//! Typed views of QuickBooks query responses.
//!
//! Only the fields the bridge actually consumes are modeled. Every
//! collection defaults to empty so an unexpected response shape decodes
//! to "no results" instead of an error (fail closed). Unknown fields
//! are preserved nowhere; this is a read-only projection.

use serde::{Deserialize, Serialize};

/// `PrimaryEmailAddr` sub-object on customers and vendors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmailAddress {
    #[serde(rename = "Address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "CompanyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "Active", default = "default_active")]
    pub active: bool,
    #[serde(rename = "PrimaryEmailAddr", default, skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "CompanyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "Active", default = "default_active")]
    pub active: bool,
    #[serde(rename = "PrimaryEmailAddr", default, skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Active", default = "default_active")]
    pub active: bool,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(rename = "Sku", default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "UnitPrice", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "DocNumber", default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(rename = "TotalAmt", default, skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<f64>,
}

fn default_active() -> bool {
    true
}

/// Inner `QueryResponse` object. Entities the query did not select are
/// simply absent, so everything defaults to an empty vec.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(rename = "Customer", default)]
    pub customer: Vec<Customer>,
    #[serde(rename = "Vendor", default)]
    pub vendor: Vec<Vendor>,
    #[serde(rename = "Item", default)]
    pub item: Vec<Item>,
    #[serde(rename = "Invoice", default)]
    pub invoice: Vec<Invoice>,
}

/// Top-level envelope of a `query?query=...` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryReply {
    #[serde(rename = "QueryResponse", default)]
    pub query_response: QueryResponse,
}

/// `CompanyInfo` body returned by `companyinfo/<id>`, used by the
/// connection-test endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyInfo {
    #[serde(rename = "CompanyName", default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyInfoReply {
    #[serde(rename = "CompanyInfo", default)]
    pub company_info: Option<CompanyInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reply_decodes_customers() {
        let body = serde_json::json!({
            "QueryResponse": {
                "Customer": [
                    {"Id": "1", "Name": "Acme", "CompanyName": "Acme Corp",
                     "PrimaryEmailAddr": {"Address": "po@acme.test"}}
                ]
            }
        });
        let reply: QueryReply = serde_json::from_value(body).unwrap();
        assert_eq!(reply.query_response.customer.len(), 1);
        let c = &reply.query_response.customer[0];
        assert_eq!(c.id.as_deref(), Some("1"));
        assert_eq!(c.name.as_deref(), Some("Acme"));
        assert!(c.active);
        assert!(reply.query_response.vendor.is_empty());
    }

    #[test]
    fn test_unexpected_shape_fails_closed() {
        let reply: QueryReply = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(reply.query_response.customer.is_empty());
        assert!(reply.query_response.invoice.is_empty());

        let reply: QueryReply =
            serde_json::from_value(serde_json::json!({"QueryResponse": {}})).unwrap();
        assert!(reply.query_response.item.is_empty());
    }
}
