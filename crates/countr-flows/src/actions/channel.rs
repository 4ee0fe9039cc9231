//! Lock action

use async_trait::async_trait;
use countr_platform::{PermissionOverwrite, Platform};

use crate::action::{ActionDescriptor, ActionHandler};
use crate::context::CountingContext;
use crate::outcome::{ActionReport, Outcome};
use crate::property::PropertyValue;

pub(super) fn lock() -> ActionDescriptor {
    ActionDescriptor::new(
        "lock",
        "Lock the counting channel",
        &[],
        |_| "Lock the counting channel".to_string(),
        Lock,
    )
    .with_long("This will lock the counting channel for the everyone-role")
}

struct Lock;

#[async_trait]
impl ActionHandler for Lock {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        _values: &[PropertyValue],
    ) -> ActionReport {
        let Some(guild) = ctx.guild_id() else {
            return ActionReport::skipped("not in a guild");
        };
        if !ctx.message.channel_kind.supports_permission_overwrites() {
            return ActionReport::skipped("channel has no permission overwrites");
        }

        let result = platform
            .edit_permission_overwrite(
                ctx.channel_id(),
                guild.everyone_role(),
                PermissionOverwrite::deny_send_messages(),
            )
            .await;
        ActionReport::single(Outcome::best_effort("lock", result))
    }
}
