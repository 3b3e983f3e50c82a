//! Validating builder for [`DataMessage`].
//!
//! Every setter checks its input before storing it.  A rejected value
//! returns an error and leaves the previously stored value in place, so a
//! builder never holds a half-valid field.  The builder keeps its own state
//! after [`build`](DataMessageBuilder::build) and can be reused to produce
//! further messages.
//!
//! # Construction modes
//!
//! - plain: set fields, then `build()`;
//! - [`reply`](DataMessageBuilder::reply): seed the reply half of an exchange
//!   from a received primary message;
//! - [`copy`](DataMessageBuilder::copy): seed from an existing message under
//!   a fresh context.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::completion::{Completion, ReplyHandler};
use super::context::ContextCounter;
use super::data::DataMessage;
use super::validation::{
    parse_stream_function, ubyte_in_range, uint_in_range, ushort_in_range, Field, MessageError,
};
use crate::item::source::accept_items;
use crate::item::{DataItem, ItemSource};

/// Input accepted by [`DataMessageBuilder::reply_expected`].
///
/// Definite booleans keep their value.  Anything else coerces to `false`
/// instead of failing.
pub trait ReplyFlag {
    fn coerce(self) -> bool;
}

impl ReplyFlag for bool {
    fn coerce(self) -> bool {
        self
    }
}

impl ReplyFlag for Option<bool> {
    fn coerce(self) -> bool {
        self.unwrap_or(false)
    }
}

/// `"true"` (any case, surrounding whitespace ignored) is `true`; every
/// other string is `false`.
impl ReplyFlag for &str {
    fn coerce(self) -> bool {
        self.trim().eq_ignore_ascii_case("true")
    }
}

/// Mutable, reusable configuration for one [`DataMessage`].
///
/// # Examples
///
/// ```rust
/// use hsms_core::{DataItem, DataMessage};
///
/// let mut builder = DataMessage::builder();
/// builder
///     .device(1)?
///     .stream(6)?
///     .func(11)?
///     .description("event report")
///     .items(vec![DataItem::u4(vec![1]), DataItem::u4(vec![4000])]);
///
/// assert_eq!(builder.get_stream(), 6);
/// let msg = builder.build();
/// assert_eq!(msg.to_string(), "S6F11  W");
/// # Ok::<(), hsms_core::MessageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DataMessageBuilder {
    device: u16,
    context: u32,
    stream: u8,
    func: u8,
    description: String,
    reply_expected: bool,
    items: Vec<DataItem>,
    complete: Option<Completion>,
    contexts: Option<Arc<ContextCounter>>,
}

impl DataMessageBuilder {
    /// Creates a builder with all defaults: zero numeric fields, empty
    /// description, reply expected, no items, no completion.
    ///
    /// Contexts are drawn from the process-wide counter.
    pub fn new() -> Self {
        Self {
            device: 0,
            context: 0,
            stream: 0,
            func: 0,
            description: String::new(),
            reply_expected: true,
            items: Vec::new(),
            complete: None,
            contexts: None,
        }
    }

    /// Creates a builder that draws generated contexts from `contexts`,
    /// typically one counter per connection.
    pub fn with_contexts(contexts: Arc<ContextCounter>) -> Self {
        Self {
            contexts: Some(contexts),
            ..Self::new()
        }
    }

    // ── device ────────────────────────────────────────────────────────────────

    /// Sets the device address.
    ///
    /// # Errors
    ///
    /// [`MessageError::OutOfRange`] if `value` does not fit 16 bits unsigned.
    pub fn device(&mut self, value: i64) -> Result<&mut Self, MessageError> {
        self.device = ushort_in_range(value, Field::Device)?;
        trace!(device = self.device, "builder device set");
        Ok(self)
    }

    /// Device address that built messages will carry.
    pub fn get_device(&self) -> u16 {
        self.device
    }

    // ── context ───────────────────────────────────────────────────────────────

    /// Sets the correlation context; 0 means "generate one for primaries".
    ///
    /// # Errors
    ///
    /// [`MessageError::OutOfRange`] if `value` does not fit 32 bits unsigned.
    pub fn context(&mut self, value: i64) -> Result<&mut Self, MessageError> {
        self.context = uint_in_range(value, Field::Context)?;
        trace!(context = self.context, "builder context set");
        Ok(self)
    }

    /// Stored context; 0 until set or seeded by `reply`/`copy`.
    pub fn get_context(&self) -> u32 {
        self.context
    }

    // ── stream / func ─────────────────────────────────────────────────────────

    /// Sets the stream number.
    ///
    /// # Errors
    ///
    /// [`MessageError::OutOfRange`] if `value` does not fit 8 bits unsigned.
    pub fn stream(&mut self, value: i64) -> Result<&mut Self, MessageError> {
        self.stream = ubyte_in_range(value, Field::Stream)?;
        trace!(stream = self.stream, "builder stream set");
        Ok(self)
    }

    /// Stream number that built messages will carry.
    pub fn get_stream(&self) -> u8 {
        self.stream
    }

    /// Sets the function code.  Odd codes build primary messages.
    ///
    /// # Errors
    ///
    /// [`MessageError::OutOfRange`] if `value` does not fit 8 bits unsigned.
    pub fn func(&mut self, value: i64) -> Result<&mut Self, MessageError> {
        self.func = ubyte_in_range(value, Field::Func)?;
        trace!(func = self.func, "builder func set");
        Ok(self)
    }

    /// Function code that built messages will carry.
    pub fn get_func(&self) -> u8 {
        self.func
    }

    /// Sets stream, function and the wait bit from `SxFy` notation.
    ///
    /// A single trailing `W` sets the wait bit; without it the bit is
    /// cleared.  The short form of a built message parses back to the same
    /// header, so `"S1F3  W"` and `"S1F3W"` both mean "S1F3, reply expected".
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidFormat`] for text that is not `SxFy[W]`, and
    /// [`MessageError::OutOfRange`] when either number exceeds 255.  No field
    /// changes on error.
    pub fn stream_function(&mut self, text: &str) -> Result<&mut Self, MessageError> {
        let header = parse_stream_function(text)?;
        self.stream = header.stream;
        self.func = header.func;
        self.reply_expected = header.wait;
        trace!(
            stream = header.stream,
            func = header.func,
            wait = header.wait,
            "builder stream/function set"
        );
        Ok(self)
    }

    // ── description ───────────────────────────────────────────────────────────

    /// Sets the diagnostic label.  Not part of message equality.
    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = text.into();
        self
    }

    /// Diagnostic label copied into built messages.
    pub fn get_description(&self) -> &str {
        &self.description
    }

    // ── completion ────────────────────────────────────────────────────────────

    /// Sets the callback run when the reply to the built primary arrives.
    /// Ignored for reply messages.
    pub fn complete(&mut self, handler: impl ReplyHandler + 'static) -> &mut Self {
        self.complete = Some(Completion::new(handler));
        self
    }

    /// Same as [`complete`](Self::complete) for an existing handle.
    pub fn completion(&mut self, completion: Completion) -> &mut Self {
        self.complete = Some(completion);
        self
    }

    /// Completion handed to built primaries, if set.
    pub fn get_complete(&self) -> Option<&Completion> {
        self.complete.as_ref()
    }

    // ── reply_expected ────────────────────────────────────────────────────────

    /// Sets the wait bit.  See [`ReplyFlag`] for the coercion rules.
    pub fn reply_expected(&mut self, value: impl ReplyFlag) -> &mut Self {
        self.reply_expected = value.coerce();
        self
    }

    /// Wait bit copied into built messages.
    pub fn get_reply_expected(&self) -> bool {
        self.reply_expected
    }

    // ── items ─────────────────────────────────────────────────────────────────

    /// Replaces the item list.  Entries that do not hold a [`DataItem`] are
    /// dropped; the rest keep their order.
    pub fn items<I>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ItemSource,
    {
        self.items = accept_items(entries);
        self
    }

    /// Items copied into built messages.
    pub fn get_items(&self) -> &[DataItem] {
        &self.items
    }

    // ── construction modes ────────────────────────────────────────────────────

    /// Turns this builder into the reply half of `request`'s exchange:
    /// context and stream are copied, the function code is the request's
    /// plus one.  Does nothing when `request` is `None`.
    ///
    /// # Errors
    ///
    /// [`MessageError::OutOfRange`] when the request's function code is 255,
    /// which has no reply code.  The builder is unchanged in that case.
    pub fn reply<'a>(
        &mut self,
        request: impl Into<Option<&'a DataMessage>>,
    ) -> Result<&mut Self, MessageError> {
        let Some(request) = request.into() else {
            return Ok(self);
        };

        if !request.is_primary() {
            warn!(request = %request, "building a reply to a message that is not primary");
        }

        let func = ubyte_in_range(i64::from(request.func()) + 1, Field::Func)?;
        self.context = request.context();
        self.stream = request.stream();
        self.func = func;
        debug!(context = self.context, stream = self.stream, func, "builder seeded as reply");
        Ok(self)
    }

    /// Seeds this builder from `message` under a fresh context.
    ///
    /// Device, stream, function, description, reply flag and items are
    /// duplicated, as is the completion of a primary message.  A builder
    /// without its own counter adopts the one `message` was built with, so
    /// the copy's context comes from the same connection's sequence.  The
    /// new context always differs from the message's.
    pub fn copy(&mut self, message: &DataMessage) -> &mut Self {
        if self.contexts.is_none() {
            self.contexts = message.fields().contexts().cloned();
        }
        self.device = message.device();
        self.stream = message.stream();
        self.func = message.func();
        self.description = message.description().to_owned();
        self.reply_expected = message.reply_expected();
        self.items = message.items().to_vec();
        self.complete = message
            .as_primary()
            .and_then(|primary| primary.completion())
            .cloned();

        let mut context = self.next_context();
        if context == message.context() {
            context = self.next_context();
        }
        self.context = context;

        debug!(from = message.context(), to = context, "builder seeded as copy");
        self
    }

    /// Creates a message from the current state.  The builder keeps its
    /// state and can build again.
    pub fn build(&self) -> DataMessage {
        DataMessage::from_builder(self)
    }

    /// Connection-scoped counter, if one is attached.
    pub(crate) fn contexts(&self) -> Option<&Arc<ContextCounter>> {
        self.contexts.as_ref()
    }

    pub(crate) fn next_context(&self) -> u32 {
        match &self.contexts {
            Some(counter) => counter.next(),
            None => ContextCounter::process().next(),
        }
    }
}

impl Default for DataMessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
