mod common;

use rayon::prelude::*;

use labreport_pdf::{PageGeometry, ReportConfig, render_report};

/// Native renders share no state, so independent reports can be produced
/// concurrently.
#[test]
fn concurrent_native_renders() {
    common::init_logging();
    let model = common::full_panel_model();
    let narrative = common::narrative();

    let outputs: Vec<(usize, Vec<u8>)> = (0..8usize)
        .into_par_iter()
        .map(|i| {
            let config = ReportConfig {
                page: if i % 2 == 0 {
                    PageGeometry::a4()
                } else {
                    PageGeometry::letter()
                },
                ..ReportConfig::default()
            };
            (i, render_report(&model, &narrative, &config).unwrap())
        })
        .collect();

    assert_eq!(outputs.len(), 8);
    let pages_a4 = common::count_pages(&outputs[0].1);
    let pages_letter = common::count_pages(&outputs[1].1);
    for (i, bytes) in &outputs {
        assert!(bytes.starts_with(b"%PDF-"), "render {i}");
        let expected = if i % 2 == 0 { pages_a4 } else { pages_letter };
        assert_eq!(common::count_pages(bytes), expected, "render {i}");
    }
    assert!(pages_a4 >= 2);
}
