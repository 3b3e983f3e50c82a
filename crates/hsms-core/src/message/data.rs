//! The immutable data message.
//!
//! A data message is either the *primary* half of an exchange (odd function
//! code, may carry a [`Completion`]) or the *reply* half (even function
//! code, never carries one).  The two halves are separate types inside
//! [`DataMessage`], so asking a reply for its completion does not compile.
//!
//! Messages are only created by [`DataMessageBuilder`], which validates every
//! field before the message exists.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::builder::DataMessageBuilder;
use super::completion::Completion;
use super::context::ContextCounter;
use super::kind::{Message, MessageKind};
use super::validation::MessageError;
use crate::item::DataItem;

/// Marker appended to the short form of messages that expect a reply.
const WAIT_MARKER: &str = "W";

/// Indent used for items in [`DataMessage::to_long_string`].
const ITEM_INDENT: &str = "  ";

/// Protocol fields shared by both halves of an exchange.
///
/// Also remembers the connection-scoped context counter the message was
/// built with, so copies keep drawing from the same sequence.
#[derive(Debug, Clone)]
pub struct MessageFields {
    device: u16,
    context: u32,
    stream: u8,
    func: u8,
    description: String,
    reply_expected: bool,
    items: Vec<DataItem>,
    contexts: Option<Arc<ContextCounter>>,
}

impl MessageFields {
    /// Device (session) address.
    pub fn device(&self) -> u16 {
        self.device
    }

    /// Correlation context shared by a primary and its reply.
    pub fn context(&self) -> u32 {
        self.context
    }

    /// Stream number, 0..=255.
    pub fn stream(&self) -> u8 {
        self.stream
    }

    /// Function code; odd for primaries, even for replies.
    pub fn func(&self) -> u8 {
        self.func
    }

    /// Diagnostic label.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Wait bit.
    pub fn reply_expected(&self) -> bool {
        self.reply_expected
    }

    /// Payload items in order.
    pub fn items(&self) -> &[DataItem] {
        &self.items
    }

    /// Counter of the builder this message came from, when it had one.
    pub(crate) fn contexts(&self) -> Option<&Arc<ContextCounter>> {
        self.contexts.as_ref()
    }

    /// Equality over everything except the description.
    fn same_exchange(&self, other: &MessageFields) -> bool {
        self.context == other.context
            && self.device == other.device
            && self.stream == other.stream
            && self.func == other.func
            && self.reply_expected == other.reply_expected
            && self.items == other.items
    }
}

/// Primary (request) half of an exchange.
#[derive(Debug, Clone)]
pub struct PrimaryMessage {
    fields: MessageFields,
    completion: Option<Completion>,
}

impl PrimaryMessage {
    /// Protocol fields of the request.
    pub fn fields(&self) -> &MessageFields {
        &self.fields
    }

    /// Callback to run when the correlated reply arrives, if one was set.
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Returns `true` if `reply` answers this message: same context and
    /// stream, function code one above the primary's.
    pub fn correlates(&self, reply: &DataMessage) -> bool {
        !reply.is_primary()
            && reply.context() == self.fields.context
            && reply.stream() == self.fields.stream
            && u16::from(reply.func()) == u16::from(self.fields.func) + 1
    }

    /// Invokes the completion with `reply` if the reply correlates.
    ///
    /// Returns `true` when a completion ran.
    pub fn complete_with(&self, reply: &DataMessage) -> bool {
        if !self.correlates(reply) {
            debug!(
                primary = %DataMessage::render_short(&self.fields),
                reply = %reply,
                "reply does not correlate; completion not invoked"
            );
            return false;
        }
        match &self.completion {
            Some(completion) => {
                completion.invoke(reply);
                true
            }
            None => false,
        }
    }
}

/// Reply half of an exchange.
#[derive(Debug, Clone)]
pub struct ReplyMessage {
    fields: MessageFields,
}

impl ReplyMessage {
    /// Protocol fields of the reply.
    pub fn fields(&self) -> &MessageFields {
        &self.fields
    }
}

/// A SECS-II data message.
///
/// # Examples
///
/// ```rust
/// use hsms_core::{DataItem, DataMessage};
///
/// let mut builder = DataMessage::builder();
/// builder.stream(1)?.func(3)?.items(vec![DataItem::u4(vec![1001])]);
/// let request = builder.build();
/// assert!(request.is_primary());
/// assert_ne!(request.context(), 0);
///
/// let reply = DataMessage::builder().reply(&request)?.build();
/// assert_eq!(reply.to_string(), "S1F4  W");
/// assert_eq!(reply.context(), request.context());
/// # Ok::<(), hsms_core::MessageError>(())
/// ```
#[derive(Debug, Clone)]
pub enum DataMessage {
    Primary(PrimaryMessage),
    Reply(ReplyMessage),
}

impl DataMessage {
    /// Returns a new, default-initialised builder.
    pub fn builder() -> DataMessageBuilder {
        DataMessageBuilder::new()
    }

    /// Snapshots the builder's current state into a message.
    ///
    /// A primary message built without a context receives the next value
    /// from the builder's context counter.
    pub(crate) fn from_builder(builder: &DataMessageBuilder) -> Self {
        let func = builder.get_func();
        let is_primary = Self::func_is_primary(func);

        let mut context = builder.get_context();
        if is_primary && context == 0 {
            context = builder.next_context();
            debug!(context, "generated context for primary message");
        }

        let fields = MessageFields {
            device: builder.get_device(),
            context,
            stream: builder.get_stream(),
            func,
            description: builder.get_description().to_owned(),
            reply_expected: builder.get_reply_expected(),
            items: builder.get_items().to_vec(),
            contexts: builder.contexts().cloned(),
        };

        if is_primary {
            DataMessage::Primary(PrimaryMessage {
                fields,
                completion: builder.get_complete().cloned(),
            })
        } else {
            DataMessage::Reply(ReplyMessage { fields })
        }
    }

    fn func_is_primary(func: u8) -> bool {
        func & 1 != 0
    }

    /// Protocol fields, whichever half of the exchange this is.
    pub fn fields(&self) -> &MessageFields {
        match self {
            DataMessage::Primary(m) => &m.fields,
            DataMessage::Reply(m) => &m.fields,
        }
    }

    /// Device (session) address.
    pub fn device(&self) -> u16 {
        self.fields().device
    }

    /// Correlation context; never 0 for a primary.
    pub fn context(&self) -> u32 {
        self.fields().context
    }

    /// Stream number.
    pub fn stream(&self) -> u8 {
        self.fields().stream
    }

    /// Function code.
    pub fn func(&self) -> u8 {
        self.fields().func
    }

    /// Diagnostic label.
    pub fn description(&self) -> &str {
        &self.fields().description
    }

    /// Wait bit as set on the builder.
    pub fn reply_expected(&self) -> bool {
        self.fields().reply_expected
    }

    /// Payload items in order.
    pub fn items(&self) -> &[DataItem] {
        &self.fields().items
    }

    /// Consumes the message and returns its items.
    pub fn into_items(self) -> Vec<DataItem> {
        match self {
            DataMessage::Primary(m) => m.fields.items,
            DataMessage::Reply(m) => m.fields.items,
        }
    }

    /// Always [`MessageKind::DataMessage`].
    pub fn kind(&self) -> MessageKind {
        MessageKind::DataMessage
    }

    /// `true` when bit 0 of the function code is set.
    pub fn is_primary(&self) -> bool {
        matches!(self, DataMessage::Primary(_))
    }

    /// `true` for primary messages that also expect a reply.
    pub fn is_reply_required(&self) -> bool {
        self.is_primary() && self.reply_expected()
    }

    /// The request half, or `None` for a reply.
    pub fn as_primary(&self) -> Option<&PrimaryMessage> {
        match self {
            DataMessage::Primary(m) => Some(m),
            DataMessage::Reply(_) => None,
        }
    }

    /// The reply half, or `None` for a primary.
    pub fn as_reply(&self) -> Option<&ReplyMessage> {
        match self {
            DataMessage::Reply(m) => Some(m),
            DataMessage::Primary(_) => None,
        }
    }

    /// Short form followed by every item on its own indented line and a
    /// closing period.
    pub fn to_long_string(&self) -> String {
        let mut s = self.to_string();
        for item in self.items() {
            s.push('\n');
            s.push_str(&item.render(ITEM_INDENT));
        }
        s.push('.');
        s
    }

    /// Same device, stream, function, description, reply flag and items,
    /// under a new context distinct from this message's.
    ///
    /// The context is drawn from the counter this message was built with,
    /// or from the process-wide counter when it had none.
    pub fn copy(&self) -> DataMessage {
        DataMessage::builder().copy(self).build()
    }

    /// Compares with any message kind; `false` for anything that is not an
    /// equal data message.
    pub fn equals(&self, other: &dyn Message) -> bool {
        other
            .as_any()
            .downcast_ref::<DataMessage>()
            .is_some_and(|other| self == other)
    }

    fn render_short(fields: &MessageFields) -> String {
        let marker = if fields.reply_expected { WAIT_MARKER } else { "" };
        format!("S{}F{}  {}", fields.stream, fields.func, marker)
    }
}

/// Equality ignores the description and the completion callback.
impl PartialEq for DataMessage {
    fn eq(&self, other: &Self) -> bool {
        self.fields().same_exchange(other.fields())
    }
}

impl fmt::Display for DataMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::render_short(self.fields()))
    }
}

impl Message for DataMessage {
    fn device(&self) -> u16 {
        DataMessage::device(self)
    }

    fn context(&self) -> u32 {
        DataMessage::context(self)
    }

    fn kind(&self) -> MessageKind {
        DataMessage::kind(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds a message from exactly one builder.
///
/// # Errors
///
/// Returns [`MessageError::MissingBuilder`] for an empty slice and
/// [`MessageError::TooManyArguments`] for more than one builder.
impl TryFrom<&[DataMessageBuilder]> for DataMessage {
    type Error = MessageError;

    fn try_from(builders: &[DataMessageBuilder]) -> Result<Self, Self::Error> {
        match builders {
            [] => Err(MessageError::MissingBuilder),
            [builder] => Ok(builder.build()),
            _ => Err(MessageError::TooManyArguments {
                count: builders.len(),
            }),
        }
    }
}
