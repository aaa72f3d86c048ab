use chrono::{Datelike, NaiveDate};
use sunspan::{
    AnnualSeries, CivilRule, DayKind, Error, Horizon, Location, SeriesOptions, build, build_with,
    compute_events,
};

const EPSILON: f64 = 1e-4;

fn location(latitude: f64, longitude: f64) -> Location {
    Location::from_coordinates(latitude, longitude).unwrap()
}

fn utc_series(latitude: f64, longitude: f64, year: i32) -> AnnualSeries {
    build(&location(latitude, longitude), year, &CivilRule::utc()).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn lengths_between(series: &AnnualSeries, from: NaiveDate, to: NaiveDate) -> Vec<f64> {
    series
        .iter()
        .filter(|r| r.date >= from && r.date <= to)
        .map(|r| r.day_length_hours)
        .collect()
}

fn assert_non_decreasing(values: &[f64], label: &str) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[1] >= pair[0] - EPSILON,
            "{}: day {} shrinks from {} to {}",
            label,
            i,
            pair[0],
            pair[1]
        );
    }
}

fn assert_non_increasing(values: &[f64], label: &str) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[1] <= pair[0] + EPSILON,
            "{}: day {} grows from {} to {}",
            label,
            i,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_one_record_per_day_in_order() {
    for (year, expected) in [(2023, 365), (2024, 366), (2000, 366), (2100, 365)] {
        let series = utc_series(52.23, 21.01, year);
        assert_eq!(series.len(), expected, "{}", year);
        assert_eq!(series.year(), year);

        let dates: Vec<NaiveDate> = series.iter().map(|r| r.date).collect();
        assert_eq!(dates.first(), Some(&date(year, 1, 1)));
        assert_eq!(dates.last(), Some(&date(year, 12, 31)));
        assert!(dates.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
    }
}

#[test]
fn test_day_length_bounds_and_consistency() {
    for latitude in [-60.0, -33.87, 0.0, 21.3, 52.23, 60.0] {
        let series = utc_series(latitude, 21.01, 2024);
        for record in &series {
            assert!((0.0..=24.0).contains(&record.day_length_hours), "{:?}", record);
            match record.kind {
                DayKind::Normal => {
                    let sunrise = record.sunrise_local_hour.unwrap();
                    let sunset = record.sunset_local_hour.unwrap();
                    assert!((0.0..24.0).contains(&sunrise));
                    assert!((0.0..24.0).contains(&sunset));
                    if sunset > sunrise {
                        assert!((record.day_length_hours - (sunset - sunrise)).abs() < 1e-6);
                    }
                }
                DayKind::PolarDay => assert_eq!(record.day_length_hours, 24.0),
                DayKind::PolarNight => assert_eq!(record.day_length_hours, 0.0),
            }
        }
    }
}

#[test]
fn test_worker_count_is_invisible() {
    let warsaw = location(52.23, 21.01);
    let rule = CivilRule::warsaw();
    let inline = build_with(
        &warsaw,
        2024,
        &rule,
        &SeriesOptions {
            workers: 1,
            ..SeriesOptions::default()
        },
    )
    .unwrap();

    for workers in [2, 3, 8, 366, 1000] {
        let parallel = build_with(
            &warsaw,
            2024,
            &rule,
            &SeriesOptions {
                workers,
                ..SeriesOptions::default()
            },
        )
        .unwrap();
        assert_eq!(inline, parallel, "{} workers", workers);
    }
    assert_eq!(inline, build(&warsaw, 2024, &rule).unwrap());
}

#[test]
fn test_equinox_day_length_at_equator() {
    let series = utc_series(0.0, 0.0, 2024);
    for day in [date(2024, 3, 20), date(2024, 9, 22)] {
        let length = series.get(day).unwrap().day_length_hours;
        // Refraction and the solar disc lengthen the day by a few minutes.
        assert!(length > 12.0 && (length - 12.0).abs() < 0.15, "{}: {}", day, length);
    }

    let geometric = build_with(
        &location(0.0, 0.0),
        2024,
        &CivilRule::utc(),
        &SeriesOptions {
            horizon: Horizon::Custom(0.0),
            ..SeriesOptions::default()
        },
    )
    .unwrap();
    for day in [date(2024, 3, 20), date(2024, 9, 22)] {
        let length = geometric.get(day).unwrap().day_length_hours;
        assert!((length - 12.0).abs() < 0.1, "{}: {}", day, length);
    }
}

#[test]
fn test_day_length_follows_the_seasons() {
    for (latitude, longitude) in [(52.23, 21.01), (21.3, -157.86)] {
        let series = utc_series(latitude, longitude, 2024);
        let label = format!("{}N", latitude);
        assert_non_decreasing(
            &lengths_between(&series, date(2024, 1, 1), date(2024, 6, 19)),
            &label,
        );
        assert_non_increasing(
            &lengths_between(&series, date(2024, 6, 22), date(2024, 12, 20)),
            &label,
        );
        assert_non_decreasing(
            &lengths_between(&series, date(2024, 12, 22), date(2024, 12, 31)),
            &label,
        );
    }

    let sydney = utc_series(-33.87, 151.21, 2024);
    assert_non_increasing(
        &lengths_between(&sydney, date(2024, 1, 1), date(2024, 6, 19)),
        "33S",
    );
    assert_non_decreasing(
        &lengths_between(&sydney, date(2024, 6, 22), date(2024, 12, 20)),
        "33S",
    );
}

#[test]
fn test_solstice_extremes() {
    let series = utc_series(52.23, 21.01, 2024);
    let longest = series.longest_day().unwrap();
    let shortest = series.shortest_day().unwrap();
    assert!((longest.date.ordinal() as i32 - date(2024, 6, 20).ordinal() as i32).abs() <= 1);
    assert!((shortest.date.ordinal() as i32 - date(2024, 12, 21).ordinal() as i32).abs() <= 1);
    assert!(longest.day_length_hours > 16.5 && longest.day_length_hours < 17.0);
    assert!(shortest.day_length_hours > 7.5 && shortest.day_length_hours < 8.0);

    // Earliest sunrise comes before the solstice, latest sunset after it.
    assert!(series.earliest_sunrise().unwrap().date < date(2024, 6, 20));
    assert!(series.latest_sunset().unwrap().date > date(2024, 6, 21));
}

#[test]
fn test_polar_days_and_nights() {
    let series = utc_series(75.0, 0.0, 2024);
    assert!(series.polar_day_count() > 60);
    assert!(series.polar_night_count() > 60);

    let event = compute_events(date(2024, 6, 21), &location(75.0, 0.0)).unwrap();
    assert!(event.sunrise_utc.is_none() && event.sunset_utc.is_none());
    let summer = series.get(date(2024, 6, 21)).unwrap();
    assert_eq!(summer.kind, DayKind::PolarDay);
    assert_eq!(summer.sunrise_local_hour, None);
    assert_eq!(summer.sunset_local_hour, None);
    assert_eq!(summer.day_length_hours, 24.0);

    let winter = series.get(date(2024, 12, 21)).unwrap();
    assert_eq!(winter.kind, DayKind::PolarNight);
    assert_eq!(winter.day_length_hours, 0.0);

    let south = utc_series(-75.0, 0.0, 2024);
    assert_eq!(south.get(date(2024, 6, 21)).unwrap().kind, DayKind::PolarNight);
    assert_eq!(south.get(date(2024, 12, 21)).unwrap().kind, DayKind::PolarDay);

    let equinox = series.get(date(2024, 3, 20)).unwrap();
    assert_eq!(equinox.kind, DayKind::Normal);
}

#[test]
fn test_twilight_polar_night_is_shorter() {
    let standard = utc_series(75.0, 0.0, 2024);
    let civil = build_with(
        &location(75.0, 0.0),
        2024,
        &CivilRule::utc(),
        &SeriesOptions {
            horizon: Horizon::CivilTwilight,
            ..SeriesOptions::default()
        },
    )
    .unwrap();
    assert!(civil.polar_night_count() < standard.polar_night_count());
    assert!(civil.polar_day_count() > standard.polar_day_count());
}

#[test]
fn test_local_clock_wrapping_past_midnight() {
    // Far west of the UTC meridian the UTC sunset falls after midnight.
    let series = utc_series(40.0, -120.0, 2024);
    let summer = series.get(date(2024, 6, 21)).unwrap();
    assert_eq!(summer.kind, DayKind::Normal);
    assert!(summer.sunset_local_hour.unwrap() < summer.sunrise_local_hour.unwrap());
    assert!(
        summer.day_length_hours > 14.5 && summer.day_length_hours < 15.5,
        "{}",
        summer.day_length_hours
    );
}

#[test]
fn test_invalid_inputs() {
    let rule = CivilRule::utc();
    for (latitude, longitude) in [(90.0, 0.0), (-90.0, 0.0)] {
        let pole = Location::new("Pole", latitude, longitude).unwrap();
        assert!(matches!(build(&pole, 2024, &rule), Err(Error::InvalidLocation(_))));
        assert!(matches!(
            compute_events(date(2024, 6, 21), &pole),
            Err(Error::InvalidLocation(_))
        ));
    }
    assert!(matches!(
        Location::new("Nowhere", 91.0, 0.0),
        Err(Error::InvalidLocation(_))
    ));
    assert!(matches!(
        Location::new("Nowhere", 0.0, 180.5),
        Err(Error::InvalidLocation(_))
    ));
    assert!(matches!(
        build_with(
            &location(52.0, 21.0),
            2024,
            &rule,
            &SeriesOptions {
                horizon: Horizon::Custom(f64::NAN),
                ..SeriesOptions::default()
            },
        ),
        Err(Error::InvalidHorizon(_))
    ));
}

#[test]
fn test_warsaw_year_scenario() {
    let warsaw = Location::new("Warsaw", 52.23, 21.01).unwrap();
    let series = build(&warsaw, 2024, &CivilRule::warsaw()).unwrap();
    assert_eq!(series.len(), 366);
    assert_eq!(series.rule_name(), "Europe/Warsaw");
    assert_eq!(series.location(), &warsaw);
    assert_eq!(series.polar_day_count(), 0);
    assert_eq!(series.polar_night_count(), 0);

    let equinox = series.get(date(2024, 3, 20)).unwrap();
    assert!((equinox.sunrise_local_hour.unwrap() - 5.62).abs() < 0.05);
    assert!((equinox.sunset_local_hour.unwrap() - 17.82).abs() < 0.05);

    // CEST: the latest sunset is around 21:00 local time.
    let latest = series.latest_sunset().unwrap().sunset_local_hour.unwrap();
    assert!(latest > 20.9 && latest < 21.1, "{}", latest);
}
