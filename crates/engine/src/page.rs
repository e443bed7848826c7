//! Read-only view of the form page.
//!
//! Navigation and persistence only need to ask the page a handful of
//! questions; the terminal UI answers them from its element registry and
//! tests answer them from a plain struct.

use replykit_types::{ErrorSlot, FieldId};

pub trait PageView {
    /// Whether the page renders `field`.
    fn has_field(&self, field: FieldId) -> bool;

    /// Current value of `field`, `None` when the field is absent.
    fn value(&self, field: FieldId) -> Option<&str>;

    /// Output fields present on the page, in order.
    fn output_fields(&self) -> Vec<FieldId>;

    /// Text shown in an error slot, if any.
    fn error_text(&self, slot: ErrorSlot) -> Option<&str>;

    /// Path of the current location (`/` or `/submit`).
    fn location_path(&self) -> &str;
}
