//! Platform events the moderation core reacts to

mod platform_event;

pub use platform_event::PlatformEvent;
