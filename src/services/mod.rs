pub mod ai_content;
pub mod automations;
pub mod campaigns;
pub mod events;
pub mod init;
pub mod lifecycle;
pub mod metrics;
pub mod preferences;
pub mod segments;
pub mod templates;
