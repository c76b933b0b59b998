//! Village systems
//!
//! Register them in this order: the calendar first so the rest of the tick
//! sees the new day, the economy last so it sees every payment.

pub mod time_of_day;
pub mod regen;
pub mod crafting;
pub mod economy;

pub use time_of_day::TimeOfDaySystem;
pub use regen::RegenSystem;
pub use crafting::CraftingSystem;
pub use economy::EconomySystem;
