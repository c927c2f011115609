pub use fixtures::{Error, FIXTURE_NAMES, fixture_cohort, fixture_event_dates, fixture_series};
pub use synthetic::{SyntheticAnimal, hourly_series, synthetic_cohort};

mod fixtures;
mod synthetic;
