//! Typed message payloads: plain text messages and rich attachments.

mod attachment;
mod color;
mod message;

pub use attachment::{Attachment, AttachmentBuilder, Author, Field, MarkdownIn, Title};
pub use color::{reconcile_color, Severity};
pub use message::{Message, MessageBuilder, Parse};
