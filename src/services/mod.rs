pub mod providers;
pub mod price_lines;
pub mod symbols;
pub mod sample_feed;
pub mod price_fetcher;
pub mod telegram;
pub mod store;

pub mod alert_checker;
pub mod alert_monitor;
pub mod observers_service;
pub mod broadcast;
