//! Role actions: giverole, takerole, prunerole

use async_trait::async_trait;
use countr_platform::Platform;
use futures::future::join_all;
use tracing::debug;

use super::arg;
use crate::action::{ActionDescriptor, ActionHandler};
use crate::context::CountingContext;
use crate::outcome::{ActionReport, Outcome};
use crate::property::{PropertyType, PropertyValue};

const ROLE: &[PropertyType] = &[PropertyType::ROLE];

pub(super) fn give_role() -> ActionDescriptor {
    ActionDescriptor::new(
        "giverole",
        "Give a role to the user",
        ROLE,
        |values| format!("Add the user to {}", arg(values, 0)),
        GiveRole,
    )
    .with_long("This will add a role to the user who triggered this flow.")
}

pub(super) fn take_role() -> ActionDescriptor {
    ActionDescriptor::new(
        "takerole",
        "Remove a role from the user",
        ROLE,
        |values| format!("Remove the user from {}", arg(values, 0)),
        TakeRole,
    )
    .with_long("This will remove a role from the user who triggered this flow.")
}

pub(super) fn prune_role() -> ActionDescriptor {
    ActionDescriptor::new(
        "prunerole",
        "Remove everyone from a role",
        ROLE,
        |values| format!("Remove everyone from {}", arg(values, 0)),
        PruneRole,
    )
    .with_long(
        "This will remove everyone from this role.\n\
         Note: This might not remove everyone from the role due to caching. \
         Some inactive users might not lose their role.",
    )
}

struct GiveRole;

#[async_trait]
impl ActionHandler for GiveRole {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport {
        let Some(role) = values.first().and_then(PropertyValue::as_role) else {
            return ActionReport::skipped("no role bound");
        };
        let (Some(guild), Some(member)) = (ctx.guild_id(), ctx.message.member.as_ref()) else {
            return ActionReport::skipped("author is not a guild member");
        };

        let result = platform.add_member_role(guild, member.user.id, role).await;
        ActionReport::single(Outcome::best_effort("giverole", result))
    }
}

struct TakeRole;

#[async_trait]
impl ActionHandler for TakeRole {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport {
        let Some(role) = values.first().and_then(PropertyValue::as_role) else {
            return ActionReport::skipped("no role bound");
        };
        let (Some(guild), Some(member)) = (ctx.guild_id(), ctx.message.member.as_ref()) else {
            return ActionReport::skipped("author is not a guild member");
        };

        let result = platform.remove_member_role(guild, member.user.id, role).await;
        ActionReport::single(Outcome::best_effort("takerole", result))
    }
}

struct PruneRole;

#[async_trait]
impl ActionHandler for PruneRole {
    async fn run(
        &self,
        platform: &dyn Platform,
        ctx: &CountingContext,
        values: &[PropertyValue],
    ) -> ActionReport {
        let Some(role) = values.first().and_then(PropertyValue::as_role) else {
            return ActionReport::skipped("no role bound");
        };
        let Some(guild) = ctx.guild_id() else {
            return ActionReport::skipped("not in a guild");
        };
        if platform.role(guild, role).is_none() {
            return ActionReport::skipped("role not found");
        }

        let members = platform.role_members(guild, role);
        debug!(role = %role, members = members.len(), "Pruning role");

        // Removals run concurrently; each failure is classified on its own
        let removals = members.into_iter().map(|user| async move {
            Outcome::best_effort("prunerole", platform.remove_member_role(guild, user, role).await)
        });
        ActionReport::new(join_all(removals).await)
    }
}
