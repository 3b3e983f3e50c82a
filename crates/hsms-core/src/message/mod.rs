//! Data messages, their builder, and the pieces they share.

pub mod builder;
pub mod completion;
pub mod context;
pub mod data;
pub mod kind;
pub mod validation;

pub use builder::{DataMessageBuilder, ReplyFlag};
pub use completion::{Completion, ReplyHandler};
pub use context::ContextCounter;
pub use data::{DataMessage, MessageFields, PrimaryMessage, ReplyMessage};
pub use kind::{Message, MessageKind};
pub use validation::{Field, MessageError};
