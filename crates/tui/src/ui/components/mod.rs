pub mod button;
pub mod common;
pub mod component;
pub mod form;
pub mod hint_bar;
pub mod status;
pub mod textarea;

pub use form::FormComponent;
pub use hint_bar::HintBarComponent;
pub use status::StatusComponent;
