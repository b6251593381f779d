//! Room-authored rule layers. Each layer is a pure function of a
//! [`Query`] returning `Some(result)` when it claims the interaction.

use crate::models::flags::Flags;
use crate::models::types::{RoomId, Verb};

pub mod conditions;
pub mod generic;
pub mod linear;
pub mod parallel;
pub mod rules;

pub use generic::ChartRuntime;

/// Read-only view of one interaction as the rule layers see it.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub room_id: &'a RoomId,
    pub hotspot_id: &'a str,
    pub verb: Option<Verb>,
    pub item: Option<&'a str>,
    pub flags: &'a Flags,
}
