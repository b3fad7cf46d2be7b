mod change_event;
mod lms_row;

pub use change_event::ChangeEvent;
pub use lms_row::LmsRow;
