use serde::{Deserialize, Serialize};

use super::color::{reconcile_color, Severity};
use crate::error::BuildError;

/// One title/value cell of an attachment's field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// Render side by side with the neighbouring field. Unset leaves the
    /// layout to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<bool>,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: None,
        }
    }

    pub fn short(mut self, short: bool) -> Self {
        self.short = Some(short);
        self
    }
}

/// Author line shown at the top of an attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub link: Option<String>,
    pub icon: Option<String>,
}

/// Bold title line, optionally hyperlinked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Title {
    pub text: Option<String>,
    pub link: Option<String>,
}

/// Attachment parts the platform should render as markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownIn {
    Pretext,
    Text,
    Fields,
}

/// A rich formatting block, serialized with the platform's flat key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub fallback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_icon: Option<String>,
    /// Unix timestamp shown next to the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<MarkdownIn>,
}

impl Attachment {
    pub fn builder() -> AttachmentBuilder {
        AttachmentBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentBuilder {
    fallback: Option<String>,
    severity: Option<Severity>,
    color: Option<String>,
    pretext: Option<String>,
    author: Author,
    title: Title,
    text: Option<String>,
    fields: Vec<Field>,
    image_url: Option<String>,
    thumb_url: Option<String>,
    footer: Option<String>,
    footer_icon: Option<String>,
    ts: Option<i64>,
    mrkdwn_in: Vec<MarkdownIn>,
}

impl AttachmentBuilder {
    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Free-form color (hex or any name the client understands).
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn pretext(mut self, pretext: impl Into<String>) -> Self {
        self.pretext = Some(pretext.into());
        self
    }

    pub fn author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    pub fn title(mut self, title: Title) -> Self {
        self.title = title;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn thumb_url(mut self, url: impl Into<String>) -> Self {
        self.thumb_url = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn footer_icon(mut self, url: impl Into<String>) -> Self {
        self.footer_icon = Some(url.into());
        self
    }

    pub fn ts(mut self, ts: i64) -> Self {
        self.ts = Some(ts);
        self
    }

    pub fn markdown_in(mut self, part: MarkdownIn) -> Self {
        if !self.mrkdwn_in.contains(&part) {
            self.mrkdwn_in.push(part);
        }
        self
    }

    /// Finish the attachment. Fails when no non-blank fallback was given.
    pub fn build(self) -> Result<Attachment, BuildError> {
        let fallback = self
            .fallback
            .filter(|f| !f.trim().is_empty())
            .ok_or(BuildError::MissingRequiredField("fallback"))?;

        tracing::debug!(
            fields = self.fields.len(),
            severity = ?self.severity,
            "built attachment"
        );

        Ok(Attachment {
            fallback,
            color: reconcile_color(self.severity, self.color),
            pretext: self.pretext,
            author_name: self.author.name,
            author_link: self.author.link,
            author_icon: self.author.icon,
            title: self.title.text,
            title_link: self.title.link,
            text: self.text,
            fields: self.fields,
            image_url: self.image_url,
            thumb_url: self.thumb_url,
            footer: self.footer,
            footer_icon: self.footer_icon,
            ts: self.ts,
            mrkdwn_in: self.mrkdwn_in,
        })
    }
}
