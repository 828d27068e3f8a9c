//! Domain models shared between the connector core and the server.

mod cache;
mod entities;
mod token;

pub use cache::CacheSnapshot;
pub use entities::{
    CompanyInfo, CompanyInfoReply, Customer, EmailAddress, Invoice, Item, QueryReply,
    QueryResponse, Vendor,
};
pub use token::TokenState;
