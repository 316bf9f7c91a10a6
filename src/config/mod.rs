pub mod settings;

pub use settings::{ApiSettings, AuthSettings, HistorySettings, ServerSettings, Settings};
