pub mod asset;
pub mod balance;
pub mod exchange;
pub mod history;
pub mod preferences;
pub mod progress;
pub mod settings;
pub mod ticker;
