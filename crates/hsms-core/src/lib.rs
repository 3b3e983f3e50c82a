//! # hsms-core
//!
//! Data messages for SECS-II over HSMS: the value a host and a piece of
//! equipment exchange, plus the builder that is the only way to create one.
//!
//! This crate has no sockets, no wire codec and no timers.  It builds,
//! validates, compares and renders messages.  The connection layer that
//! sends them, and the codec that turns items into bytes, live elsewhere
//! and depend on this crate.
//!
//! # Overview (for beginners)
//!
//! Every exchange has two halves:
//!
//! - a **primary** message (odd function code, e.g. `S1F13`) sent by the side
//!   that wants something, and
//! - a **reply** (the next even function code, `S1F14`) that carries the same
//!   *context* so the sender can pair it with the request.
//!
//! The crate is split into:
//!
//! - **`message`** – [`DataMessage`], [`DataMessageBuilder`], context
//!   generation, completion callbacks and validation errors.
//! - **`item`** – [`DataItem`], the typed SECS-II payload a message carries.
//! - **`config`** – TOML defaults used to seed builders per connection.
//!
//! ```rust
//! use hsms_core::{DataItem, DataMessage};
//!
//! let mut builder = DataMessage::builder();
//! builder.stream_function("S1F13W")?.items(vec![DataItem::list(vec![])]);
//! let establish = builder.build();
//!
//! let mut reply = DataMessage::builder();
//! reply.reply(&establish)?.reply_expected(false);
//! assert_eq!(reply.build().to_string(), "S1F14  ");
//! # Ok::<(), hsms_core::MessageError>(())
//! ```

pub mod config;
pub mod item;
pub mod message;

pub use config::{ConfigError, MessageDefaults};
pub use item::{DataItem, ItemFormat, ItemSource, ItemValue};
pub use message::{
    Completion, ContextCounter, DataMessage, DataMessageBuilder, Field, Message, MessageError,
    MessageKind, PrimaryMessage, ReplyHandler, ReplyMessage,
};
