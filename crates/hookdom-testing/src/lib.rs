//! Testing utilities and harness for hookdom

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use hookdom_core::{
        use_effect, use_effect_with, use_state, EffectResult, Event, EventHandler, HostOp,
        PropValue, Props, RenderError, RenderResult, StateSetter, VNode,
    };
}
