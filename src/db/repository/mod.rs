pub mod automation;
pub mod campaign;
pub mod customer;
pub mod event;
pub mod preferences;
pub mod recipient;
pub mod segment;
pub mod template;

pub use automation::AutomationRepository;
pub use campaign::{CampaignRepository, NewCampaign};
pub use customer::CustomerRepository;
pub use event::MarketingEventRepository;
pub use preferences::PreferencesRepository;
pub use recipient::RecipientRepository;
pub use segment::SegmentRepository;
pub use template::{EmailTemplateRepository, SmsTemplateRepository};
