mod common;

use labreport_pdf::{ClassifierConfig, ColorTag, ReferenceRange, Status, classify, classify_series};

fn cfg() -> ClassifierConfig {
    ClassifierConfig::default()
}

#[test]
fn crp_returning_to_range_is_improving() {
    let range = ReferenceRange::new(0.0, 0.5);
    assert_eq!(
        classify(&[3.04, 2.17, 0.47, 0.246], &range, &cfg()),
        Status::Improving
    );
}

#[test]
fn potassium_just_below_range_is_monitor() {
    let range = ReferenceRange::new(3.5, 5.2);
    assert_eq!(
        classify(&[3.42, 3.12, 3.09, 3.48], &range, &cfg()),
        Status::Monitor
    );
}

#[test]
fn boundaries_are_inclusive() {
    let range = ReferenceRange::new(3.5, 5.2);
    assert_eq!(classify(&[4.0, 3.5], &range, &cfg()), Status::Stable);
    assert_eq!(classify(&[4.0, 5.2], &range, &cfg()), Status::Stable);
}

#[test]
fn improving_from_below() {
    let range = ReferenceRange::new(37.0, 47.0);
    assert_eq!(classify(&[30.0, 33.0, 38.0], &range, &cfg()), Status::Improving);
}

#[test]
fn only_first_and_last_values_matter() {
    let range = ReferenceRange::new(10.0, 20.0);
    // Excursion in the middle does not make the series "improving".
    assert_eq!(classify(&[15.0, 50.0, 15.0], &range, &cfg()), Status::Stable);
}

#[test]
fn single_value_in_range_is_stable() {
    let range = ReferenceRange::new(10.0, 20.0);
    assert_eq!(classify(&[12.0], &range, &cfg()), Status::Stable);
}

#[test]
fn near_band_edge_is_monitor() {
    // width 10, band 1.0: 9.0 sits exactly on the band edge.
    let range = ReferenceRange::new(10.0, 20.0);
    assert_eq!(classify(&[12.0, 9.0], &range, &cfg()), Status::Monitor);
    assert_eq!(classify(&[12.0, 8.5], &range, &cfg()), Status::Low);
}

#[test]
fn hct_below_band_is_low_and_glucose_above_is_high() {
    let hct = ReferenceRange::new(37.0, 47.0);
    assert_eq!(classify(&[37.8, 35.4, 32.9, 35.4], &hct, &cfg()), Status::Low);

    let glucose = ReferenceRange::new(70.0, 110.0);
    assert_eq!(
        classify(&[174.0, 168.0, 169.0, 151.0], &glucose, &cfg()),
        Status::High
    );
}

#[test]
fn near_band_fraction_is_configurable() {
    let range = ReferenceRange::new(3.5, 5.2);
    let strict = ClassifierConfig {
        near_boundary_fraction: 0.0,
    };
    assert_eq!(classify(&[3.42, 3.48], &range, &strict), Status::Low);

    let wide = ClassifierConfig {
        near_boundary_fraction: 0.5,
    };
    assert_eq!(classify(&[4.0, 2.9], &range, &wide), Status::Monitor);
}

#[test]
fn open_upper_bound_has_no_monitor_band() {
    let range = ReferenceRange::at_least(10.0);
    assert_eq!(classify(&[12.0, 9.99], &range, &cfg()), Status::Low);
    assert_eq!(classify(&[12.0, 1000.0], &range, &cfg()), Status::Stable);
}

#[test]
fn open_lower_bound_never_low() {
    let range = ReferenceRange::at_most(35.0);
    assert_eq!(classify(&[20.0, -5.0], &range, &cfg()), Status::Stable);
    assert_eq!(classify(&[20.0, 40.0], &range, &cfg()), Status::High);
    assert_eq!(classify(&[40.0, 30.0], &range, &cfg()), Status::Improving);
}

#[test]
fn classify_is_total_over_value_grid() {
    let ranges = [
        ReferenceRange::new(3.5, 5.2),
        ReferenceRange::new(0.0, 0.5),
        ReferenceRange::at_least(150.0),
        ReferenceRange::at_most(35.0),
    ];
    let values = [-10.0, 0.0, 0.25, 0.5, 3.3, 3.49, 3.5, 4.0, 5.2, 5.3, 40.0, 1e6];
    for range in &ranges {
        for &first in &values {
            for &last in &values {
                let status = classify(&[first, last], range, &cfg());
                assert!(Status::ALL.contains(&status));
                // Rule precedence: in-range last value is always Improving or Stable.
                if range.contains(last) {
                    assert!(matches!(status, Status::Improving | Status::Stable));
                } else if range.is_above(last) {
                    assert_eq!(status, Status::High);
                } else {
                    assert!(matches!(status, Status::Monitor | Status::Low));
                }
            }
        }
    }
}

#[test]
fn color_tags_cover_every_status() {
    let tags: Vec<ColorTag> = Status::ALL.iter().map(|s| s.color_tag()).collect();
    assert_eq!(
        tags,
        vec![
            ColorTag::Positive,
            ColorTag::Caution,
            ColorTag::Alert,
            ColorTag::Alert,
            ColorTag::Positive,
        ]
    );
}

#[test]
fn post_op_key_parameters_classify_as_reported() {
    let model = common::post_op_model();
    let got: Vec<(String, Status)> = model
        .iter()
        .map(|s| (s.parameter.id.clone(), classify_series(s, &cfg())))
        .collect();
    let expected = [
        ("CRP", Status::Improving),
        ("WBC", Status::Improving),
        ("NEU", Status::Improving),
        ("GLU", Status::High),
        ("K", Status::Monitor),
        ("HCT", Status::Low),
    ];
    for ((id, status), (exp_id, exp_status)) in got.iter().zip(expected) {
        assert_eq!(id, exp_id);
        assert_eq!(*status, exp_status, "{id}");
    }
}
