//! Clients for the storefront's two external collaborators: the order
//! fulfilment endpoint and the generative oil-finder assistant.

pub mod assistant;
pub mod orders;

pub use assistant::{AssistantClient, Recommendation};
pub use orders::{OrderClient, OrderError, OrderItem, OrderRequest};
