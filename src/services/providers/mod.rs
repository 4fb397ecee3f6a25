pub mod price_board;
pub mod vndirect_ws;
pub mod vndirect_rest;
pub mod yahoo;

pub use price_board::PriceBoardProvider;
pub use vndirect_rest::VndirectRestProvider;
pub use vndirect_ws::VndirectSocketProvider;
pub use yahoo::YahooProvider;
