//! Tool settings parsing and validation.
//!
//! Settings describe where the render service and secret store live and how
//! aggressively to fetch; they say nothing about the configuration content
//! being validated.

mod parser;
mod settings;

pub use parser::{find_settings_file, SettingsLoader, DEFAULT_SETTINGS_FILES};
pub use settings::{FetchSettings, RenderSettings, Settings, VaultSettings};
