//! Alert evaluation domain: conditions, severity, construction,
//! cooldown and rendering.

pub mod condition;
pub mod cooldown;
pub mod factory;
pub mod format;
pub mod severity;
pub mod types;

pub use condition::{AlertCondition, SUPPORTED_OPERATORS, validate_operator};
pub use cooldown::{CooldownTracker, DEFAULT_COOLDOWN_PERIOD, alert_key};
pub use factory::AlertFactory;
pub use format::{
    AttachmentField, ChannelAttachment, channel_attachment, format_alert_text,
    format_digest_text, local_timestamp,
};
pub use severity::classify;
pub use types::{Alert, AlertLevel, AlertType};
