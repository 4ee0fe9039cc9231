//! Built-in actions
//!
//! | key | properties | effect |
//! |---|---|---|
//! | `giverole` | role | add the role to the triggering member |
//! | `takerole` | role | remove the role from the triggering member |
//! | `prunerole` | role | remove the role from every cached member holding it |
//! | `pin` | - | pin the count message, making room when the pin cap is hit |
//! | `sendmessage` | channel, text | send a templated message |
//! | `lock` | - | deny send-messages for everyone in the counting channel |
//! | `reset` | - | reset the stored count to zero and request a reset |

mod channel;
mod count;
mod message;
mod pin;
mod roles;

pub use message::render_placeholders;

use crate::action::ActionDescriptor;
use crate::property::PropertyValue;

/// Descriptors of all built-in actions, in catalog order
pub fn builtin() -> Vec<ActionDescriptor> {
    vec![
        roles::give_role(),
        roles::take_role(),
        roles::prune_role(),
        pin::pin(),
        message::send_message(),
        channel::lock(),
        count::reset(),
    ]
}

/// Display a bound value for an explanation; empty when the caller passed too
/// few values
fn arg(values: &[PropertyValue], index: usize) -> String {
    values
        .get(index)
        .map(ToString::to_string)
        .unwrap_or_default()
}
