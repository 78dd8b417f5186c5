use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Profile;
use crate::error::BuildError;
use crate::payload::{Attachment, Author, Field, MarkdownIn, Message, Parse, Severity, Title};

/// Hookpost – send chat notifications to a webhook
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a message and post it
    Send {
        #[command(flatten)]
        destination: DestinationArgs,

        #[command(flatten)]
        message: MessageArgs,
    },
    /// Print the JSON payload without sending it
    Preview {
        /// Profile whose routing defaults are applied
        #[arg(short, long)]
        profile: Option<String>,

        #[command(flatten)]
        message: MessageArgs,
    },
    /// List profiles from the config file
    Profiles,
    /// Print build information
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct DestinationArgs {
    /// Profile from the config file (e.g., ops, alerts)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Incoming webhook URL
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true, conflicts_with = "token")]
    pub webhook: Option<String>,

    /// Bot token for the chat API
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Chat API method URL used with --token
    #[arg(long, requires = "token")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct MessageArgs {
    /// Plain message text
    #[arg(long)]
    pub text: Option<String>,
    /// Channel, group or user to post to
    #[arg(long)]
    pub channel: Option<String>,
    /// Display name of the bot
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub icon_url: Option<String>,
    /// Emoji icon such as :rocket: (wins over --icon-url)
    #[arg(long)]
    pub icon_emoji: Option<String>,
    /// Reply in this thread
    #[arg(long)]
    pub thread_ts: Option<String>,
    #[arg(long)]
    pub link_names: bool,
    /// Link and mention handling: full or none
    #[arg(long, value_name = "MODE", value_parser = parse_parse_mode)]
    pub parse: Option<Parse>,
    #[arg(long)]
    pub unfurl_links: Option<bool>,
    #[arg(long)]
    pub unfurl_media: Option<bool>,

    /// Plain-text summary of the attachment (required for rich messages)
    #[arg(long, help_heading = "Attachment")]
    pub fallback: Option<String>,
    /// good, warning or danger
    #[arg(long, value_parser = parse_severity, help_heading = "Attachment")]
    pub severity: Option<Severity>,
    /// Hex or named color; ignored when --severity is given
    #[arg(long, help_heading = "Attachment")]
    pub color: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub pretext: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub author_name: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub author_link: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub author_icon: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub title: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub title_link: Option<String>,
    /// Attachment body text
    #[arg(long, help_heading = "Attachment")]
    pub body: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub image_url: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub thumb_url: Option<String>,
    #[arg(long, help_heading = "Attachment")]
    pub footer: Option<String>,
    /// Field as TITLE=VALUE (repeatable, order kept)
    #[arg(
        long = "field",
        value_name = "TITLE=VALUE",
        value_parser = parse_field,
        help_heading = "Attachment"
    )]
    pub fields: Vec<Field>,
    /// Short field as TITLE=VALUE, shown side by side (repeatable)
    #[arg(
        long = "short-field",
        value_name = "TITLE=VALUE",
        value_parser = parse_short_field,
        help_heading = "Attachment"
    )]
    pub short_fields: Vec<Field>,
    /// Render these parts as markdown: pretext, text or fields (repeatable)
    #[arg(
        long,
        value_name = "PART",
        value_parser = parse_markdown_in,
        help_heading = "Attachment"
    )]
    pub markdown_in: Vec<MarkdownIn>,
}

fn parse_field(s: &str) -> Result<Field, String> {
    let (title, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TITLE=VALUE, got '{s}'"))?;
    Ok(Field::new(title, value))
}

fn parse_short_field(s: &str) -> Result<Field, String> {
    parse_field(s).map(|f| f.short(true))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse().map_err(|e: BuildError| e.to_string())
}

fn parse_markdown_in(s: &str) -> Result<MarkdownIn, String> {
    match s {
        "pretext" => Ok(MarkdownIn::Pretext),
        "text" => Ok(MarkdownIn::Text),
        "fields" => Ok(MarkdownIn::Fields),
        _ => Err(format!("expected pretext, text or fields, got '{s}'")),
    }
}

fn parse_parse_mode(s: &str) -> Result<Parse, String> {
    match s {
        "full" => Ok(Parse::Full),
        "none" => Ok(Parse::None),
        _ => Err(format!("expected full or none, got '{s}'")),
    }
}

impl MessageArgs {
    fn wants_attachment(&self) -> bool {
        self.fallback.is_some()
            || self.severity.is_some()
            || self.color.is_some()
            || self.pretext.is_some()
            || self.author_name.is_some()
            || self.author_link.is_some()
            || self.author_icon.is_some()
            || self.title.is_some()
            || self.title_link.is_some()
            || self.body.is_some()
            || self.image_url.is_some()
            || self.thumb_url.is_some()
            || self.footer.is_some()
            || !self.fields.is_empty()
            || !self.short_fields.is_empty()
            || !self.markdown_in.is_empty()
    }

    /// Assemble the message. Flags win over the profile's routing defaults;
    /// the two icon options count as one choice, so an icon flag discards
    /// both profile icons.
    pub fn build(&self, defaults: Option<&Profile>) -> Result<Message, BuildError> {
        let mut builder = Message::builder();

        let pick = |flag: &Option<String>, default: fn(&Profile) -> &Option<String>| {
            flag.clone().or_else(|| defaults.and_then(|p| default(p).clone()))
        };
        if let Some(channel) = pick(&self.channel, |p| &p.channel) {
            builder = builder.channel(channel);
        }
        if let Some(username) = pick(&self.username, |p| &p.username) {
            builder = builder.username(username);
        }
        let (icon_url, icon_emoji) = if self.icon_url.is_some() || self.icon_emoji.is_some() {
            (self.icon_url.clone(), self.icon_emoji.clone())
        } else {
            (
                defaults.and_then(|p| p.icon_url.clone()),
                defaults.and_then(|p| p.icon_emoji.clone()),
            )
        };
        if let Some(url) = icon_url {
            builder = builder.icon_url(url);
        }
        if let Some(emoji) = icon_emoji {
            builder = builder.icon_emoji(emoji);
        }
        if let Some(text) = &self.text {
            builder = builder.text(text);
        }
        if let Some(ts) = &self.thread_ts {
            builder = builder.thread_ts(ts);
        }
        if self.link_names {
            builder = builder.link_names(true);
        }
        if let Some(parse) = self.parse {
            builder = builder.parse(parse);
        }
        if let Some(unfurl) = self.unfurl_links {
            builder = builder.unfurl_links(unfurl);
        }
        if let Some(unfurl) = self.unfurl_media {
            builder = builder.unfurl_media(unfurl);
        }

        if self.wants_attachment() {
            builder = builder.attachment(self.build_attachment()?);
        }
        Ok(builder.build())
    }

    fn build_attachment(&self) -> Result<Attachment, BuildError> {
        let mut att = Attachment::builder()
            .author(Author {
                name: self.author_name.clone(),
                link: self.author_link.clone(),
                icon: self.author_icon.clone(),
            })
            .title(Title {
                text: self.title.clone(),
                link: self.title_link.clone(),
            })
            .fields(self.fields.iter().cloned())
            .fields(self.short_fields.iter().cloned());

        if let Some(fallback) = &self.fallback {
            att = att.fallback(fallback);
        }
        if let Some(severity) = self.severity {
            att = att.severity(severity);
        }
        if let Some(color) = &self.color {
            att = att.color(color);
        }
        if let Some(pretext) = &self.pretext {
            att = att.pretext(pretext);
        }
        if let Some(body) = &self.body {
            att = att.text(body);
        }
        if let Some(url) = &self.image_url {
            att = att.image_url(url);
        }
        if let Some(url) = &self.thumb_url {
            att = att.thumb_url(url);
        }
        if let Some(footer) = &self.footer {
            att = att.footer(footer);
        }
        for part in &self.markdown_in {
            att = att.markdown_in(*part);
        }
        att.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use assert_matches::assert_matches;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hookpost").chain(args.iter().copied())).unwrap()
    }

    fn message_args(cli: Cli) -> MessageArgs {
        match cli.command {
            Commands::Send { message, .. } | Commands::Preview { message, .. } => message,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn plain_text_has_no_attachment() {
        let args = message_args(parse(&["preview", "--text", "hello", "--channel", "ops"]));
        let msg = args.build(None).unwrap();
        assert!(msg.attachments.is_empty());
        assert_eq!(msg.to_json().unwrap(), r#"{"channel":"ops","text":"hello"}"#);
    }

    #[test]
    fn rich_flags_require_fallback() {
        let args = message_args(parse(&["preview", "--title", "T"]));
        assert_matches!(args.build(None), Err(BuildError::MissingRequiredField("fallback")));
    }

    #[test]
    fn fields_keep_command_line_order() {
        let args = message_args(parse(&[
            "preview",
            "--fallback",
            "x",
            "--field",
            "A=1",
            "--field",
            "B=x=y",
            "--short-field",
            "C=3",
        ]));
        let msg = args.build(None).unwrap();
        let fields = &msg.attachments[0].fields;
        assert_eq!(
            fields,
            &vec![
                Field::new("A", "1"),
                Field::new("B", "x=y"),
                Field::new("C", "3").short(true)
            ]
        );
    }

    #[test]
    fn malformed_field_is_a_usage_error() {
        let res =
            Cli::try_parse_from(["hookpost", "preview", "--fallback", "x", "--field", "oops"]);
        assert!(res.is_err());
    }

    #[test]
    fn severity_is_strict_color_is_not() {
        let res = Cli::try_parse_from([
            "hookpost",
            "preview",
            "--fallback",
            "x",
            "--severity",
            "critical",
        ]);
        assert!(res.is_err());

        let args = message_args(parse(&[
            "preview", "--fallback", "x", "--color", "#ff0000", "--severity", "warning",
        ]));
        assert_eq!(
            args.build(None).unwrap().attachments[0].color.as_deref(),
            Some("warning")
        );

        let args = message_args(parse(&["preview", "--fallback", "x", "--color", "mauve"]));
        assert_eq!(
            args.build(None).unwrap().attachments[0].color.as_deref(),
            Some("mauve")
        );
    }

    #[test]
    fn profile_defaults_fill_unset_routing() {
        let profile = Profile {
            target: Target::Webhook {
                url: "http://localhost/hook".into(),
            },
            channel: Some("#ops".into()),
            username: Some("deploybot".into()),
            icon_url: None,
            icon_emoji: Some(":rocket:".into()),
            timeout_secs: None,
        };
        let args = message_args(parse(&["preview", "--text", "hi", "--channel", "#dev"]));
        let msg = args.build(Some(&profile)).unwrap();
        assert_eq!(msg.channel.as_deref(), Some("#dev"));
        assert_eq!(msg.username.as_deref(), Some("deploybot"));
        assert_eq!(msg.icon_emoji.as_deref(), Some(":rocket:"));
    }

    fn profile_with_icons(icon_url: Option<&str>, icon_emoji: Option<&str>) -> Profile {
        Profile {
            target: Target::Webhook {
                url: "http://localhost/hook".into(),
            },
            channel: None,
            username: None,
            icon_url: icon_url.map(String::from),
            icon_emoji: icon_emoji.map(String::from),
            timeout_secs: None,
        }
    }

    #[test]
    fn icon_url_flag_replaces_profile_emoji() {
        let profile = profile_with_icons(None, Some(":rocket:"));
        let args = message_args(parse(&[
            "preview",
            "--text",
            "hi",
            "--icon-url",
            "https://x/y.png",
        ]));
        let msg = args.build(Some(&profile)).unwrap();
        assert_eq!(msg.icon_url.as_deref(), Some("https://x/y.png"));
        assert_eq!(msg.icon_emoji, None);
    }

    #[test]
    fn icon_emoji_flag_replaces_profile_url() {
        let profile = profile_with_icons(Some("https://x/profile.png"), None);
        let args = message_args(parse(&["preview", "--text", "hi", "--icon-emoji", ":bell:"]));
        let msg = args.build(Some(&profile)).unwrap();
        assert_eq!(msg.icon_url, None);
        assert_eq!(msg.icon_emoji.as_deref(), Some(":bell:"));
    }

    #[test]
    fn profile_icons_apply_without_icon_flags() {
        let profile = profile_with_icons(Some("https://x/profile.png"), None);
        let args = message_args(parse(&["preview", "--text", "hi"]));
        let msg = args.build(Some(&profile)).unwrap();
        assert_eq!(msg.icon_url.as_deref(), Some("https://x/profile.png"));
    }

    #[test]
    fn enum_flags_parse_wire_names() {
        let args = message_args(parse(&[
            "preview",
            "--fallback",
            "x",
            "--markdown-in",
            "text",
            "--markdown-in",
            "fields",
            "--parse",
            "none",
        ]));
        let msg = args.build(None).unwrap();
        assert_eq!(msg.parse, Some(Parse::None));
        assert_eq!(
            msg.attachments[0].mrkdwn_in,
            vec![MarkdownIn::Text, MarkdownIn::Fields]
        );
        assert!(Cli::try_parse_from(["hookpost", "preview", "--parse", "partial"]).is_err());
        assert!(Cli::try_parse_from(["hookpost", "preview", "--markdown-in", "title"]).is_err());
    }

    #[test]
    fn webhook_and_token_conflict() {
        let res = Cli::try_parse_from([
            "hookpost",
            "send",
            "--webhook",
            "http://localhost/hook",
            "--token",
            "xoxb",
            "--text",
            "hi",
        ]);
        assert!(res.is_err());
    }
}
