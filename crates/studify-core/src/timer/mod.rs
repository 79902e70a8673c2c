mod clock;
mod controller;
mod driver;
mod mode;
mod view;

pub use clock::{Clock, SystemClock, TickSource, TickSubscription};
pub use controller::{FocusController, TimerState};
pub use driver::{Command, FocusSession};
pub use mode::{TimerDurations, TimerMode};
pub use view::{format_clock, progress_fraction, TimerView};
