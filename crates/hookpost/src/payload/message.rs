use serde::{Deserialize, Serialize};

use super::attachment::Attachment;

/// How the platform should treat links and mentions in `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parse {
    Full,
    None,
}

/// Top-level payload posted to a webhook or the chat API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<Parse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unfurl_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Encode as the JSON body sent on the wire. Non-ASCII text is emitted
    /// as literal UTF-8.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.message.channel = Some(channel.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.message.username = Some(username.into());
        self
    }

    pub fn icon_url(mut self, url: impl Into<String>) -> Self {
        self.message.icon_url = Some(url.into());
        self
    }

    pub fn icon_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.message.icon_emoji = Some(emoji.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.message.text = Some(text.into());
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.message.attachments.push(attachment);
        self
    }

    pub fn attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.message.attachments.extend(attachments);
        self
    }

    pub fn link_names(mut self, link_names: bool) -> Self {
        self.message.link_names = Some(link_names);
        self
    }

    pub fn parse(mut self, parse: Parse) -> Self {
        self.message.parse = Some(parse);
        self
    }

    pub fn unfurl_links(mut self, unfurl: bool) -> Self {
        self.message.unfurl_links = Some(unfurl);
        self
    }

    pub fn unfurl_media(mut self, unfurl: bool) -> Self {
        self.message.unfurl_media = Some(unfurl);
        self
    }

    pub fn thread_ts(mut self, ts: impl Into<String>) -> Self {
        self.message.thread_ts = Some(ts.into());
        self
    }

    pub fn build(self) -> Message {
        let mut message = self.message;
        // Emoji icon takes precedence over an icon URL.
        if message.icon_emoji.is_some() && message.icon_url.take().is_some() {
            tracing::debug!("icon_emoji set, dropping icon_url");
        }
        message
    }
}
