//! Span and category data models

mod category;
mod span;

pub use category::Category;
pub use span::{AcceptedSpan, RawSpan, RejectedSpan, RejectionReason, Span, SpanSource};
pub(crate) use span::validate_bounds;
