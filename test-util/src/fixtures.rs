use circadian_cosinor::{AnimalId, Cohort, EventDate, EventDates, ExperimentId, TimeSeries};

use chrono::NaiveDateTime;
use itertools::process_results;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Recordings shipped with the repository, named `bruna<animal>_<experiment>.csv`
pub const FIXTURE_NAMES: [&str; 3] = ["bruna1_1.csv", "bruna2_1.csv", "bruna4_1.csv"];

fn fixture_contents(name: &str) -> Option<&'static str> {
    match name {
        "bruna1_1.csv" => Some(include_str!("../../test-data/bruna1_1.csv")),
        "bruna2_1.csv" => Some(include_str!("../../test-data/bruna2_1.csv")),
        "bruna4_1.csv" => Some(include_str!("../../test-data/bruna4_1.csv")),
        "metadata.csv" => Some(include_str!("../../test-data/metadata.csv")),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown fixture {0}")]
    UnknownFixture(String),

    #[error("fixture name {0} is not bruna<animal>_<experiment>.csv")]
    BadName(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("cannot parse timestamp {0:?}")]
    Timestamp(String),

    #[error(transparent)]
    TimeSeries(#[from] circadian_cosinor::TimeSeriesError),
}

#[derive(Deserialize)]
struct TemperatureRecord {
    date_time: String,
    temp: f64,
}

#[derive(Deserialize)]
struct MetadataRecord {
    animal: AnimalId,
    tbi_date: Option<String>,
}

fn series_from_reader(reader: impl Read) -> Result<TimeSeries, Error> {
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    let iter = csv_reader
        .deserialize()
        .map(|record: Result<TemperatureRecord, _>| -> Result<_, Error> {
            let record = record?;
            let t = NaiveDateTime::parse_from_str(&record.date_time, DATE_TIME_FORMAT)
                .map_err(|_| Error::Timestamp(record.date_time.clone()))?;
            Ok((t, record.temp))
        });
    let samples: Vec<_> = process_results(iter, |iter| iter.collect())?;
    Ok(TimeSeries::from_samples(samples)?)
}

fn parse_name(name: &str) -> Result<(AnimalId, ExperimentId), Error> {
    let bad_name = || Error::BadName(name.to_owned());
    let stem = name
        .strip_prefix("bruna")
        .and_then(|s| s.strip_suffix(".csv"))
        .ok_or_else(bad_name)?;
    let (animal, experiment) = stem.split_once('_').ok_or_else(bad_name)?;
    Ok((
        animal.parse().map_err(|_| bad_name())?,
        experiment.parse().map_err(|_| bad_name())?,
    ))
}

pub fn fixture_series(name: &str) -> Result<TimeSeries, Error> {
    let contents = fixture_contents(name).ok_or_else(|| Error::UnknownFixture(name.to_owned()))?;
    series_from_reader(contents.as_bytes())
}

/// All recordings grouped by animal and experiment
pub fn fixture_cohort() -> Result<Cohort, Error> {
    let mut cohort = Cohort::new();
    for name in FIXTURE_NAMES {
        let (animal, experiment) = parse_name(name)?;
        cohort
            .entry(animal)
            .or_insert_with(BTreeMap::new)
            .insert(experiment, fixture_series(name)?);
    }
    Ok(cohort)
}

/// Event dates from the metadata table, empty cells are missing dates
pub fn fixture_event_dates() -> Result<EventDates, Error> {
    let contents = fixture_contents("metadata.csv")
        .ok_or_else(|| Error::UnknownFixture("metadata.csv".to_owned()))?;
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(contents.as_bytes());
    let iter = csv_reader
        .deserialize()
        .map(|record: Result<MetadataRecord, _>| {
            record.map(|r| (r.animal, r.tbi_date.map_or(EventDate::Missing, EventDate::Text)))
        });
    Ok(process_results(iter, |iter| iter.collect())?)
}
