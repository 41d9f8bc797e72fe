pub mod client;
pub mod source;
pub mod store;
pub mod tenant;

pub use client::Client;
pub use source::{Entity, EntityEvent, EntityRef, EntitySource, FileSource};
pub use store::EntityStore;
pub use tenant::Tenant;
