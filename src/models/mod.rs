pub mod filter;
pub mod record;
pub mod stats;
pub mod view;
pub mod widget;

pub use filter::{CustomFieldFilter, FilterOperator, FilterSpec, RelativeRange, TimeRange};
pub use record::{LogRecord, SEVERITY_NAMES};
pub use stats::StatsSummary;
pub use view::{View, ViewDocument, ViewValidationError};
pub use widget::{Widget, WidgetBody, WidgetKind};
