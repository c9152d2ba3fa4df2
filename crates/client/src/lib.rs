//! Client-side state for the quotes proxy.
//!
//! [`FavoritesStore`] keeps the user's favorites in memory and applies
//! changes optimistically; [`QuoteSession`] tracks the quote on display and
//! its translation. Both talk to the proxy through [`ProxyClient`] or any
//! other implementation of the API traits.

pub mod api;
pub mod error;
pub mod optimistic;
pub mod session;
pub mod store;

pub use api::{FavoritesApi, ProxyClient, QuotesApi};
pub use error::ClientError;
pub use optimistic::{Mutation, MutationState};
pub use session::{QuoteSession, Translation};
pub use store::{FavoritesStore, Toggled};
