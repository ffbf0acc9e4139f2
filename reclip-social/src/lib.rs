//! Social-platform surface used by the bot.
//!
//! [`traits::SocialClient`] is the seam the polling loop talks through;
//! [`twitter`] holds the concrete v1.1-style wrapper, the wire types, and
//! the pure media-extraction helpers.

pub mod traits;
pub mod twitter;

pub use traits::{SocialClient, SocialError};
pub use twitter::TwitterApi;
