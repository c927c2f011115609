use circadian_cosinor::chrono::NaiveDate;
use circadian_cosinor::{
    AcrophaseNormalization, AnalysisConfig, AnalysisWindow, CohortAnalysis, CosinorParams,
    DiagnosticKind, EventDate, ResultRecord, ResultTable, WindowMode,
};
use circadian_cosinor_test_util::{
    SyntheticAnimal, fixture_cohort, fixture_event_dates, synthetic_cohort,
};

use approx::assert_abs_diff_eq;
use itertools::Itertools;

fn canonical(record: &ResultRecord) -> CosinorParams {
    CosinorParams::new(record.mesor, record.amplitude, record.acrophase).canonical()
}

fn assert_params(record: &ResultRecord, expected: [f64; 3]) {
    let actual = canonical(record);
    assert_abs_diff_eq!(actual.mesor, expected[0], epsilon = 0.02);
    assert_abs_diff_eq!(actual.amplitude, expected[1], epsilon = 0.03);
    assert_abs_diff_eq!(actual.acrophase, expected[2], epsilon = 0.1);
}

fn fixture_report() -> circadian_cosinor::AnalysisReport {
    let cohort = fixture_cohort().unwrap();
    let event_dates = fixture_event_dates().unwrap();
    let analysis = CohortAnalysis::new(AnalysisConfig::default()).unwrap();
    analysis.analyze(&cohort, &event_dates, WindowMode::Both)
}

#[test]
fn fixture_cohort_records() {
    let report = fixture_report();

    let keys: Vec<_> = report.records.iter().map(|r| r.key()).collect();
    assert_eq!(
        keys,
        [
            (1, 1, AnalysisWindow::Before),
            (1, 1, AnalysisWindow::After),
            (2, 1, AnalysisWindow::Before),
            (2, 1, AnalysisWindow::After),
        ]
    );

    let sham_before = report.records.get(1, 1, AnalysisWindow::Before).unwrap();
    assert_eq!(sham_before.group, "Sham");
    assert_params(sham_before, [37.0, 0.55, 0.5]);
    let sham_after = report.records.get(1, 1, AnalysisWindow::After).unwrap();
    assert_params(sham_after, [37.0, 0.5, 0.5]);

    let tbi_before = report.records.get(2, 1, AnalysisWindow::Before).unwrap();
    assert_eq!(tbi_before.group, "TBI");
    assert_params(tbi_before, [37.1, 0.6, 0.4]);
    let tbi_after = report.records.get(2, 1, AnalysisWindow::After).unwrap();
    assert_params(tbi_after, [37.4, 0.25, 0.9]);
}

#[test]
fn fixture_missing_event_date() {
    let report = fixture_report();

    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.failures().count(), 2);
    for (diagnostic, window) in report
        .diagnostics
        .iter()
        .zip([AnalysisWindow::Before, AnalysisWindow::After])
    {
        assert_eq!(diagnostic.animal, 4);
        assert_eq!(diagnostic.experiment, Some(1));
        assert_eq!(diagnostic.window, Some(window));
        assert!(matches!(
            diagnostic.kind,
            DiagnosticKind::InvalidEventDate(_)
        ));
    }
}

#[test]
fn fixture_single_window() {
    let cohort = fixture_cohort().unwrap();
    let event_dates = fixture_event_dates().unwrap();
    let analysis = CohortAnalysis::default();
    let report = analysis.analyze(&cohort, &event_dates, WindowMode::After);
    assert_eq!(report.records.len(), 2);
    assert!(
        report
            .records
            .iter()
            .all(|r| r.window == AnalysisWindow::After)
    );
    assert_eq!(report.diagnostics.len(), 1);
}

#[test]
fn fixture_summary() {
    let report = fixture_report();
    let summary = report.records.summarize();

    let keys: Vec<_> = summary.iter().map(|s| (s.group.as_str(), s.window)).collect();
    assert_eq!(
        keys,
        [
            ("Sham", AnalysisWindow::Before),
            ("Sham", AnalysisWindow::After),
            ("TBI", AnalysisWindow::Before),
            ("TBI", AnalysisWindow::After),
        ]
    );
    assert!(summary.iter().all(|s| s.count == 1));
    assert!(summary.iter().all(|s| s.mesor.std.is_nan()));
    assert_abs_diff_eq!(summary[3].mesor.mean, 37.4, epsilon = 0.02);
}

#[test]
fn fixture_csv_export() {
    let report = fixture_report();
    let mut buffer = vec![];
    report.records.write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(ResultTable::COLUMNS.join(",").as_str()));
    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("1,Sham,1,before,"));
    assert!(rows[3].starts_with("2,TBI,1,after,"));

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let parsed = ResultTable::new(
        reader
            .deserialize::<ResultRecord>()
            .collect::<Result<_, _>>()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(parsed.len(), report.records.len());
    for (a, b) in parsed.iter().zip(report.records.iter()) {
        assert_eq!(a.key(), b.key());
        assert_abs_diff_eq!(a.mesor, b.mesor, epsilon = 1e-12);
    }
}

#[test]
fn synthetic_cohort_groups() {
    let event = NaiveDate::from_ymd_opt(2024, 2, 10)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 2, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let before = CosinorParams::new(37.0, 0.5, 0.3);
    let tbi_after = CosinorParams::new(37.4, 0.2, 1.2);
    let animals: Vec<_> = (1..=10)
        .map(|animal| SyntheticAnimal {
            animal,
            experiments: vec![1, 2],
            before,
            after: if [2, 3, 6, 7, 8].contains(&animal) {
                tbi_after
            } else {
                before
            },
            event_date: if animal == 10 {
                EventDate::text("n/a")
            } else {
                EventDate::text("2024-02-10")
            },
        })
        .collect();
    let (cohort, event_dates) = synthetic_cohort(start, &animals, 0.05, 42);
    assert_eq!(event_dates[&1].resolve().unwrap(), event);

    let config = AnalysisConfig {
        acrophase: AcrophaseNormalization::Canonical,
        ..Default::default()
    };
    let analysis = CohortAnalysis::new(config).unwrap();
    let report = analysis.analyze(&cohort, &event_dates, WindowMode::Both);

    // 9 animals with a valid date, 2 experiments, 2 windows
    assert_eq!(report.records.len(), 36);
    assert!(report.records.iter().map(|r| r.key()).all_unique());
    assert_eq!(report.diagnostics.len(), 4);
    assert!(report.diagnostics.iter().all(|d| d.animal == 10));

    assert!(
        report
            .records
            .iter()
            .all(|r| r.amplitude >= 0.0 && (0.0..std::f64::consts::TAU).contains(&r.acrophase))
    );

    let summary = report.records.summarize();
    let tbi_after_summary = summary
        .iter()
        .find(|s| s.group == "TBI" && s.window == AnalysisWindow::After)
        .unwrap();
    assert_eq!(tbi_after_summary.count, 10);
    assert_abs_diff_eq!(tbi_after_summary.mesor.mean, 37.4, epsilon = 0.01);
    assert_abs_diff_eq!(tbi_after_summary.amplitude.mean, 0.2, epsilon = 0.01);
    let sham_after_summary = summary
        .iter()
        .find(|s| s.group == "Sham" && s.window == AnalysisWindow::After)
        .unwrap();
    assert_eq!(sham_after_summary.count, 8);
    assert_abs_diff_eq!(sham_after_summary.mesor.mean, 37.0, epsilon = 0.01);

    let sham = report.records.by_group("Sham").count();
    let tbi = report.records.by_group("TBI").count();
    assert_eq!((sham, tbi), (16, 20));
}
