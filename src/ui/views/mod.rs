pub mod form;
pub mod overlay;
pub mod records;

pub use form::draw_form;
pub use overlay::{draw_modal, draw_toasts};
pub use records::{draw_filter_bar, draw_records};
