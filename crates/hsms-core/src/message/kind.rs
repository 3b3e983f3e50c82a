//! Message kinds and the trait shared by every message on a connection.

use std::any::Any;

use serde::{Deserialize, Serialize};

/// All HSMS message kinds, discriminated by the session type (SType) byte.
///
/// Only [`MessageKind::DataMessage`] carries a stream, function and items.
/// The remaining kinds are session control messages handled by the
/// connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    DataMessage = 0x00,
    SelectReq = 0x01,
    SelectRsp = 0x02,
    DeselectReq = 0x03,
    DeselectRsp = 0x04,
    LinktestReq = 0x05,
    LinktestRsp = 0x06,
    RejectReq = 0x07,
    SeparateReq = 0x09,
}

impl MessageKind {
    /// Returns `true` for control messages that expect a response message.
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            MessageKind::SelectReq | MessageKind::DeselectReq | MessageKind::LinktestReq
        )
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(MessageKind::DataMessage),
            0x01 => Ok(MessageKind::SelectReq),
            0x02 => Ok(MessageKind::SelectRsp),
            0x03 => Ok(MessageKind::DeselectReq),
            0x04 => Ok(MessageKind::DeselectRsp),
            0x05 => Ok(MessageKind::LinktestReq),
            0x06 => Ok(MessageKind::LinktestRsp),
            0x07 => Ok(MessageKind::RejectReq),
            0x09 => Ok(MessageKind::SeparateReq),
            _ => Err(()),
        }
    }
}

/// Behaviour common to every message kind.
///
/// Callers that handle several kinds dispatch on [`Message::kind`] and
/// recover the concrete type through [`Message::as_any`].
pub trait Message: Send + Sync {
    /// Device (session) address the message is sent to.
    fn device(&self) -> u16;

    /// Correlation context; 0 when unset.
    fn context(&self) -> u32;

    /// Discriminator tag for this message.
    fn kind(&self) -> MessageKind;

    /// Upcast used for downcasting to the concrete message type.
    fn as_any(&self) -> &dyn Any;
}
