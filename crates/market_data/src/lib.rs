pub mod error;
pub mod remote;
pub mod traits;

pub use error::MarketDataError;
pub use remote::BinanceClient;
pub use traits::{MarketDataSource, RemoteResponse};
