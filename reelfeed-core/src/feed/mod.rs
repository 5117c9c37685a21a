//! Feed synchronizers
//!
//! Two deliberately separate models, never composed:
//!
//! - [`remote::RemoteFeed`] works against the video document collection
//!   and carries real per-account like semantics (liker set, un-like,
//!   idempotent toggle). This is the primary model.
//! - [`local::LocalFeed`] works against the key-value store with likes
//!   and comments in side-tables keyed by video id. Its like contract is
//!   strictly weaker: an anonymous monotonic counter with no un-like.
//!
//! Both own a transient projection that is rebuilt on every load and never
//! persisted; the stores hold all durable state.

pub mod local;
pub mod remote;

pub use local::LocalFeed;
pub use remote::RemoteFeed;
