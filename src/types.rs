use crate::time_series::TimeSeries;
use crate::window::EventDate;

use std::collections::BTreeMap;

pub type AnimalId = u32;
pub type ExperimentId = u32;

/// Temperature recordings of a cohort: animal → experiment → time series
pub type Cohort = BTreeMap<AnimalId, BTreeMap<ExperimentId, TimeSeries>>;

/// Event (injury) date of every animal, a missing key is the same as [EventDate::Missing]
pub type EventDates = BTreeMap<AnimalId, EventDate>;
