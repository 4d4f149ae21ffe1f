pub mod base;
pub mod click;
pub mod executor;
pub mod keyboard;
pub mod navigate;
pub mod registry;
pub mod scroll;
pub mod step;
pub mod type_text;
pub mod wait;

pub use base::{Action, ActionContext, ActionError, ActionOutcome, ActionTiming};
pub use click::ClickAction;
pub use executor::ActionExecutor;
pub use keyboard::PressEnterAction;
pub use navigate::NavigateAction;
pub use registry::ActionRegistry;
pub use scroll::ScrollAction;
pub use step::{ActionKind, Query, ScrollDirection, Step};
pub use type_text::TypeAction;
pub use wait::{DoneAction, WaitForTextAction};
