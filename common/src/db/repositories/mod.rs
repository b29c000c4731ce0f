// Repository layer for database operations

pub mod birthday;
pub mod settings;

pub use birthday::BirthdayRepository;
pub use settings::SettingsRepository;
