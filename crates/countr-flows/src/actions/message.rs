//! Send-message action and placeholder rendering

use async_trait::async_trait;
use countr_core::EVERYONE_MENTION;
use countr_platform::{AllowedMentions, OutgoingMessage, Platform};
use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::arg;
use crate::action::{ActionDescriptor, ActionHandler};
use crate::context::CountingContext;
use crate::outcome::{ActionReport, Outcome};
use crate::property::{PropertyType, PropertyValue};

const CHANNEL_AND_TEXT: &[PropertyType] = &[PropertyType::CHANNEL, PropertyType::TEXT];

pub(super) fn send_message() -> ActionDescriptor {
    ActionDescriptor::new(
        "sendmessage",
        "Send a message",
        CHANNEL_AND_TEXT,
        |values| format!("Send a message in {}: ```{}```", arg(values, 0), arg(values, 1)),
        SendMessage,
    )
    .with_long("This will send a message in any channel you'd like")
}

struct SendMessage;

#[async_trait]
impl ActionHandler for SendMessage {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport {
        let (Some(channel), Some(text)) = (
            values.first().and_then(PropertyValue::as_channel),
            values.get(1).and_then(PropertyValue::as_text),
        ) else {
            return ActionReport::skipped("no channel or text bound");
        };
        let Some(guild) = ctx.guild_id() else {
            return ActionReport::skipped("not in a guild");
        };
        match platform.channel(guild, channel) {
            Some(target) if target.kind.is_text_based() => {}
            _ => return ActionReport::skipped("channel not found or not text-based"),
        }

        let message = OutgoingMessage::new(render_placeholders(text, ctx))
            .with_allowed_mentions(AllowedMentions::all());
        let result = platform.send_message(channel, message).await;
        ActionReport::single(Outcome::best_effort("sendmessage", result))
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\{(count|mention|tag|username|nickname|everyone|score|content)\}")
            .expect("placeholder pattern is valid")
    })
}

/// Substitute `{count} {mention} {tag} {username} {nickname} {everyone}
/// {score} {content}` (case-insensitive) in one pass.
///
/// Substituted text is not scanned again, so a message content containing
/// `{count}` is sent as written.
pub fn render_placeholders(text: &str, ctx: &CountingContext) -> String {
    let message = &ctx.message;
    let member = message.member.as_ref();

    placeholder_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            match caps[1].to_ascii_lowercase().as_str() {
                "count" => ctx.count.to_string(),
                "mention" => member.map(|m| m.mention()).unwrap_or_default(),
                "tag" => message.author.tag(),
                "username" => message.author.username.clone(),
                "nickname" => member
                    .map(|m| m.display_name().to_string())
                    .unwrap_or_else(|| message.author.username.clone()),
                "everyone" => {
                    if message.guild_id.is_some() {
                        EVERYONE_MENTION.to_string()
                    } else {
                        String::new()
                    }
                }
                "score" => ctx.score.to_string(),
                "content" => message.content.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
