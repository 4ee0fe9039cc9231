//! Pin action

use async_trait::async_trait;
use countr_core::{MessageRef, PIN_LIMIT};
use countr_platform::Platform;
use tracing::debug;

use crate::action::{ActionDescriptor, ActionHandler};
use crate::context::CountingContext;
use crate::outcome::{ActionReport, Outcome};
use crate::property::PropertyValue;

pub(super) fn pin() -> ActionDescriptor {
    ActionDescriptor::new(
        "pin",
        "Pin the count message",
        &[],
        |_| "Pin the count".to_string(),
        Pin,
    )
}

struct Pin;

#[async_trait]
impl ActionHandler for Pin {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        _values: &[PropertyValue],
    ) -> ActionReport {
        let message = ctx.counting_message;
        let first = match platform.pin_message(message).await {
            Ok(()) => return ActionReport::single(Outcome::Applied),
            Err(error) => Outcome::best_effort::<()>("pin", Err(error)),
        };

        let mut outcomes = vec![first];
        outcomes.extend(make_room_and_retry(platform, message).await);
        ActionReport::new(outcomes)
    }
}

/// When the channel is at the pin cap, unpin the oldest pin and retry once
async fn make_room_and_retry(platform: &dyn Platform, message: MessageRef) -> Vec<Outcome> {
    let pinned = match platform.pinned_messages(message.channel_id).await {
        Ok(pinned) => pinned,
        Err(error) => return vec![Outcome::best_effort::<()>("pin", Err(error))],
    };
    if pinned.len() < PIN_LIMIT {
        return vec![Outcome::Skipped("pin limit not reached")];
    }

    // Pins come newest first
    let Some(&oldest) = pinned.last() else {
        return vec![Outcome::Skipped("no pinned messages")];
    };
    debug!(channel = %message.channel_id, oldest = %oldest, "Pin limit reached, unpinning oldest");

    let unpin = platform
        .unpin_message(MessageRef::new(message.channel_id, oldest))
        .await;
    if unpin.is_err() {
        return vec![Outcome::best_effort("pin", unpin)];
    }

    let retry = platform.pin_message(message).await;
    vec![Outcome::Applied, Outcome::best_effort("pin", retry)]
}
