use sct_data::MonthlyMean;
use sct_viz_render::config::resolve_config;
use sct_viz_render::{RenderError, render_to_bytes, render_to_file};

fn density_json() -> String {
    let earnings: Vec<f64> = (0..40).map(|i| 35_000.0 + 1_250.0 * i as f64).collect();
    let art = sct_viz::density_artifact("median_earnings_10yr", &earnings, Some(61_400.0)).unwrap();
    serde_json::to_string(&art).unwrap()
}

fn trend_json() -> String {
    let means: Vec<MonthlyMean> = (1..=12)
        .map(|m| MonthlyMean {
            year_month: format!("2015-{m:02}").parse().unwrap(),
            in_city: None,
            mean_index_std: (m as f64 / 3.0).sin(),
            n: 20,
        })
        .collect();
    let art = sct_viz::trend_artifact(&means, Some("2015-09".parse().unwrap())).unwrap();
    serde_json::to_string(&art).unwrap()
}

#[test]
fn artifacts_render_through_json() {
    for theme in ["sctrends", "minimal", "print"] {
        let cfg = resolve_config(Some(theme), None).unwrap();
        for (kind, json) in [("density", density_json()), ("trend", trend_json())] {
            let bytes = render_to_bytes(&json, kind, "svg", &cfg).unwrap();
            let svg = String::from_utf8(bytes).unwrap();
            assert!(svg.starts_with("<svg"), "{theme}/{kind}");
            assert!(svg.contains(&format!("font-family=\"{}\"", cfg.font.family)));
        }
    }
}

#[test]
fn file_extension_picks_format() {
    let dir = std::env::temp_dir().join(format!("sct-viz-render-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cfg = resolve_config(None, None).unwrap();

    let path = dir.join("trend.svg");
    render_to_file(&trend_json(), "trend", &path, &cfg).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Search interest over time"));

    let err = render_to_file(&trend_json(), "trend", &dir.join("trend.bmp"), &cfg).unwrap_err();
    assert!(matches!(err, RenderError::UnknownFormat(f) if f == "bmp"));

    // a trend artifact is not a density artifact
    assert!(matches!(
        render_to_bytes(&trend_json(), "density", "svg", &cfg),
        Err(RenderError::Deserialize(_))
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}
