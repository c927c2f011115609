use circadian_cosinor::chrono::{NaiveDateTime, TimeDelta};
use circadian_cosinor::{
    AnimalId, Cohort, CosinorParams, EventDate, EventDates, ExperimentId, TimeSeries,
};

use rand::prelude::*;
use rand_distr::StandardNormal;
use std::collections::BTreeMap;

/// Hourly series of `hours` samples starting at `start`, `params` switch to `params_after` at
/// `switch_at` hours from the start
pub fn hourly_series(
    start: NaiveDateTime,
    hours: i64,
    params: CosinorParams,
    params_after: Option<(i64, CosinorParams)>,
    noise: f64,
    rng: &mut impl Rng,
) -> TimeSeries {
    TimeSeries::from_samples((0..hours).map(|i| {
        let p = match params_after {
            Some((switch_at, after)) if i >= switch_at => after,
            _ => params,
        };
        let eps: f64 = rng.sample(StandardNormal);
        (start + TimeDelta::hours(i), p.eval(i as f64) + noise * eps)
    }))
    .expect("generated samples are sorted and finite")
}

/// Description of a synthetic animal
#[derive(Clone, Debug)]
pub struct SyntheticAnimal {
    pub animal: AnimalId,
    pub experiments: Vec<ExperimentId>,
    pub before: CosinorParams,
    pub after: CosinorParams,
    pub event_date: EventDate,
}

/// Cohort of two-week recordings with the event in the middle
///
/// Animals with a missing event date still get recordings, with the `before` rhythm only.
pub fn synthetic_cohort(
    start: NaiveDateTime,
    animals: &[SyntheticAnimal],
    noise: f64,
    seed: u64,
) -> (Cohort, EventDates) {
    const HOURS: i64 = 14 * 24;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cohort = Cohort::new();
    let mut event_dates = EventDates::new();
    for a in animals {
        let switch = a
            .event_date
            .resolve()
            .ok()
            .map(|event| ((event - start).num_hours(), a.after));
        let experiments: BTreeMap<_, _> = a
            .experiments
            .iter()
            .map(|&experiment| {
                let ts = hourly_series(start, HOURS, a.before, switch, noise, &mut rng);
                (experiment, ts)
            })
            .collect();
        cohort.insert(a.animal, experiments);
        event_dates.insert(a.animal, a.event_date.clone());
    }
    (cohort, event_dates)
}
