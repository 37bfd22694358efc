use approx::assert_abs_diff_eq;
use chart_draw::core::{
    BarSeries, PriceRange, PriceScale, PriceScaleOptions, ScaleMargins, VisibleRange,
};

fn scale(height: f64, margins: ScaleMargins) -> PriceScale {
    let mut price_scale = PriceScale::new(PriceScaleOptions {
        scale_margins: margins,
        ..PriceScaleOptions::default()
    });
    price_scale.set_height(height).expect("valid height");
    price_scale.set_price_range(Some(PriceRange::new(100.0, 200.0)));
    price_scale
}

fn no_margins() -> ScaleMargins {
    ScaleMargins {
        top: 0.0,
        bottom: 0.0,
    }
}

#[test]
fn rescale_drag_expands_range_around_center() {
    let mut price_scale = scale(800.0, ScaleMargins::default());
    price_scale.start_scale(500.0);
    price_scale.scale_to(600.0);
    price_scale.end_scale();

    let range = price_scale.price_range().expect("range");
    let factor = 0.5_f64.exp();
    assert_abs_diff_eq!(range.min(), 150.0 - 50.0 * factor, epsilon = 1e-9);
    assert_abs_diff_eq!(range.max(), 150.0 + 50.0 * factor, epsilon = 1e-9);
    assert_abs_diff_eq!(range.min(), 67.56, epsilon = 0.01);
    assert_abs_diff_eq!(range.max(), 232.44, epsilon = 0.01);
    assert!(!price_scale.is_auto_scale());
    assert!(!price_scale.is_scaling());
}

#[test]
fn rescale_drag_upwards_shrinks_range() {
    let mut price_scale = scale(800.0, ScaleMargins::default());
    price_scale.start_scale(500.0);
    price_scale.scale_to(400.0);
    let range = price_scale.price_range().expect("range");
    assert!(range.length() < 100.0);
    assert_abs_diff_eq!(range.center(), 150.0, epsilon = 1e-9);
}

#[test]
fn margins_reserve_pixels_at_both_edges() {
    let price_scale = scale(500.0, ScaleMargins::default());
    assert_abs_diff_eq!(price_scale.price_to_coordinate(200.0).get(), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(price_scale.price_to_coordinate(100.0).get(), 450.0, epsilon = 1e-9);
}

#[test]
fn inverted_scale_puts_high_prices_at_bottom() {
    let mut price_scale = scale(400.0, no_margins());
    price_scale.set_invert_scale(true);
    assert_abs_diff_eq!(price_scale.price_to_coordinate(200.0).get(), 400.0, epsilon = 1e-9);
    assert_abs_diff_eq!(price_scale.price_to_coordinate(100.0).get(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(price_scale.coordinate_to_price(100.0).get(), 125.0, epsilon = 1e-9);
}

#[test]
fn vertical_scroll_shifts_range_by_dragged_prices() {
    let mut price_scale = scale(400.0, no_margins());
    price_scale.start_scroll(100.0);
    price_scale.scroll_to(140.0);
    price_scale.end_scroll();

    let range = price_scale.price_range().expect("range");
    assert_abs_diff_eq!(range.min(), 110.0, epsilon = 1e-9);
    assert_abs_diff_eq!(range.max(), 210.0, epsilon = 1e-9);
}

#[test]
fn degenerate_range_projects_to_top_margin() {
    let mut price_scale = scale(400.0, ScaleMargins::default());
    price_scale.set_price_range(Some(PriceRange::new(5.0, 5.0)));
    let y = price_scale.price_to_coordinate(5.0).get();
    assert!(y.is_finite());
    assert_abs_diff_eq!(y, 80.0, epsilon = 1e-9);
    assert!(price_scale.price_per_pixel().is_none());
}

#[test]
fn autoscale_widens_flat_range_by_min_move() {
    let bars = BarSeries::from_closes(&[50.0; 10]).expect("bars");
    let mut price_scale = PriceScale::default();
    price_scale.set_height(300.0).expect("height");

    let changed = price_scale.autoscale(&bars, Some(VisibleRange { from: 0, to: 9 }));
    assert!(changed);
    let range = price_scale.price_range().expect("range");
    assert_abs_diff_eq!(range.min(), 49.95, epsilon = 1e-9);
    assert_abs_diff_eq!(range.max(), 50.05, epsilon = 1e-9);

    assert!(!price_scale.autoscale(&bars, Some(VisibleRange { from: 0, to: 9 })));
}

#[test]
fn autoscale_is_skipped_when_disabled_or_nothing_visible() {
    let bars = BarSeries::from_closes(&[10.0, 20.0, 30.0]).expect("bars");
    let mut price_scale = PriceScale::default();
    price_scale.set_height(300.0).expect("height");
    assert!(!price_scale.autoscale(&bars, None));

    price_scale.set_auto_scale(false);
    assert!(!price_scale.autoscale(&bars, Some(VisibleRange { from: 0, to: 2 })));
    assert!(price_scale.price_range().is_none());
}

#[test]
fn marks_are_round_and_inside_the_pane() {
    let price_scale = scale(400.0, ScaleMargins::default());
    let marks = price_scale.marks();
    assert!(marks.len() >= 3);
    for pair in marks.windows(2) {
        assert!(pair[0].price < pair[1].price);
        assert!(pair[0].coordinate > pair[1].coordinate);
    }
    for mark in &marks {
        assert!((0.0..=400.0).contains(&mark.coordinate));
        let scaled = mark.price / 5.0;
        assert_abs_diff_eq!(scaled, scaled.round(), epsilon = 1e-6);
    }
}

#[test]
fn rejects_invalid_margins() {
    let options = PriceScaleOptions {
        scale_margins: ScaleMargins {
            top: 0.6,
            bottom: 0.5,
        },
        ..PriceScaleOptions::default()
    };
    assert!(options.validate().is_err());
}
