pub mod account;
pub mod event;

pub use account::{Account, AccountRole};
pub use event::{Event, EventDto, EventInput, EventStatus};
