//! Domain types for the mailing scheduler
//!
//! - Message: a pending outbound message with its sending window and recipient offset
//! - TemplateInfo: template description as loaded from the data source
//! - Template: a template bound to its planning strategy for one cycle
//! - Priority / Distribution: tier and time-of-day shape of a template

pub mod message;
pub mod template;

pub use message::Message;
pub use template::{Distribution, Priority, Template, TemplateInfo};
