//! Reset action

use async_trait::async_trait;
use countr_platform::Platform;

use crate::action::{ActionDescriptor, ActionHandler};
use crate::context::CountingContext;
use crate::outcome::{ActionReport, Outcome};
use crate::property::PropertyValue;

pub(super) fn reset() -> ActionDescriptor {
    ActionDescriptor::new(
        "reset",
        "Reset the count",
        &[],
        |_| "Reset the count to 0".to_string(),
        Reset,
    )
}

struct Reset;

#[async_trait]
impl ActionHandler for Reset {
    async fn run(
        &self,
        _platform: &dyn Platform,
        ctx: &CountingContext,
        _values: &[PropertyValue],
    ) -> ActionReport {
        if ctx.store().reset_count(ctx.channel_id()) {
            ActionReport::single(Outcome::Applied).with_reset(true)
        } else {
            ActionReport::skipped("channel has no counting data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countr_core::{ChannelId, GuildId, Message, MessageId, User, UserId};
    use countr_platform::{GuildSnapshot, RecordingPlatform};
    use countr_store::{ChannelData, GuildStore};
    use std::sync::Arc;

    fn context(store: Arc<GuildStore>) -> CountingContext {
        let message = Message::new(
            MessageId::new(7),
            ChannelId::new(20),
            User::new(UserId::new(30), "ada"),
        );
        CountingContext::for_message(12, 0, message, store)
    }

    #[test]
    fn test_reset_zeroes_count() {
        let platform = RecordingPlatform::new(GuildSnapshot::new(GuildId::new(1)));
        let store = Arc::new(GuildStore::new(GuildId::new(1)));
        store.insert(ChannelId::new(20), ChannelData::with_count(12));

        let report = tokio_test::block_on(Reset.run(&platform, &context(store.clone()), &[]));
        assert!(report.reset);
        assert_eq!(store.count(ChannelId::new(20)), Some(0));
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_reset_without_data() {
        let platform = RecordingPlatform::new(GuildSnapshot::new(GuildId::new(1)));
        let store = Arc::new(GuildStore::new(GuildId::new(1)));

        let report = tokio_test::block_on(Reset.run(&platform, &context(store), &[]));
        assert!(!report.reset);
        assert!(report.outcomes[0].is_skipped());
    }
}
