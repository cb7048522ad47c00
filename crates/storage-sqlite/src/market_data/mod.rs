mod model;
mod repository;

pub use model::{PriceHistoryDB, QuoteDB};
pub use repository::MarketDataRepository;
