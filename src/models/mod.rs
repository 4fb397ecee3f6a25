pub mod observer;
pub mod alert_state;
pub mod history;
pub mod price;

pub use observer::{normalize_symbol, parse_target, Observers};
pub use alert_state::AlertState;
pub use history::{HistoryRecord, HISTORY_LIMIT};
pub use price::PriceMap;
