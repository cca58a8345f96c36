pub mod alert;
pub mod command_service;
pub mod signal_service;
pub mod telegram_service;
