pub mod filter;
pub mod models;
pub mod normalize;
pub mod priority;
pub mod time;

pub use filter::{
    apply, distinct_departments, distinct_event_types, sort_by_start, timeline, DateRange,
    FilterAxis, FilterCriteria,
};
pub use models::{CanonicalEvent, RawRecord, ALL_DEPARTMENTS};
pub use normalize::{normalize, Normalizer};
pub use priority::PriorityScale;
pub use time::EventTime;
