//! Market data models
//!
//! - `bar` - Raw provider bars ([`RawBar`]) and aggregated candles ([`Candle`])
//! - `resolution` - Native bar resolutions the provider can serve
//! - `quote` - Canonical quote shape ([`ProviderQuote`])
//! - `profile` - Asset profile data ([`AssetProfile`])

mod bar;
mod profile;
mod quote;
mod resolution;

pub use bar::{Candle, RawBar};
pub use profile::AssetProfile;
pub use quote::ProviderQuote;
pub use resolution::BarResolution;
