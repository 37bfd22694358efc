use chart_draw::core::{
    BarIndex, LogicalPoint, PixelPoint, PriceRange, PriceScale, PriceScaleOptions, TimeScale,
    TimeScaleOptions,
};
use chart_draw::drawing::{DrawingKind, DrawingManager, DrawingManagerOptions, Projection};
use proptest::prelude::*;

fn time_scale(width: f64, bar_spacing: f64, points: usize) -> TimeScale {
    let mut scale = TimeScale::new(TimeScaleOptions {
        bar_spacing,
        ..TimeScaleOptions::default()
    });
    scale.set_width(width).expect("valid width");
    scale.set_points_count(points);
    scale
}

proptest! {
    #[test]
    fn time_projection_round_trip_property(
        width in 100.0f64..4_000.0,
        bar_spacing in 0.5f64..50.0,
        points in 1usize..10_000,
        index in -500.0f64..10_500.0
    ) {
        let scale = time_scale(width, bar_spacing, points);
        let x = scale.index_to_coordinate(BarIndex(index));
        let recovered = scale.coordinate_to_float_index(x).get();
        prop_assert!((recovered - index).abs() <= 1e-6);
    }

    #[test]
    fn zoom_fixed_point_property(
        bar_spacing in 1.0f64..40.0,
        anchor in 0.0f64..800.0,
        zoom in -1.0f64..1.0
    ) {
        let mut scale = time_scale(800.0, bar_spacing, 2_000);
        let before = scale.coordinate_to_float_index(anchor).get();
        scale.zoom(anchor, zoom);
        let after = scale.coordinate_to_float_index(anchor).get();
        prop_assert!((after - before).abs() <= 1e-6);
    }

    #[test]
    fn scroll_offset_stays_clamped_property(
        points in 1usize..500,
        deltas in proptest::collection::vec(-5_000.0f64..5_000.0, 1..20)
    ) {
        let mut scale = time_scale(800.0, 6.0, points);
        let last = (points - 1) as f64;
        for delta in deltas {
            scale.scroll_by(delta);
            prop_assert!(scale.scroll_offset() >= -last - 1e-9);
            prop_assert!(scale.scroll_offset() <= last + 1e-9);
        }
    }

    #[test]
    fn price_projection_round_trip_property(
        min in -1_000_000.0f64..1_000_000.0,
        span in 0.01f64..1_000_000.0,
        height in 100.0f64..2_000.0,
        ratio in 0.0f64..1.0,
        inverted in any::<bool>()
    ) {
        let mut scale = PriceScale::new(PriceScaleOptions::default());
        scale.set_height(height).expect("valid height");
        scale.set_invert_scale(inverted);
        scale.set_price_range(Some(PriceRange::new(min, min + span)));

        let y = ratio * height;
        let price = scale.coordinate_to_price(y);
        let recovered = scale.price_to_coordinate(price).get();
        prop_assert!((recovered - y).abs() <= 1e-3);
    }

    #[test]
    fn hit_test_is_monotonic_in_distance_property(
        offset in 0.0f64..40.0,
        line_width in 1.0f64..12.0,
        x in 50.0f64..350.0
    ) {
        let mut time = TimeScale::default();
        time.set_width(800.0).expect("width");
        time.set_points_count(100);
        let mut price = PriceScale::default();
        price.set_height(400.0).expect("height");
        price.set_price_range(Some(PriceRange::new(0.0, 200.0)));
        let projection = Projection::new(&time, &price);

        let mut drawings = DrawingManager::new(DrawingManagerOptions::default()).expect("manager");
        let id = drawings
            .add(DrawingKind::HorizontalLine, vec![LogicalPoint::new(95.0, 100.0)])
            .expect("add");
        let mut style = drawings.get(id).expect("drawing").style;
        style.line_width = line_width;
        drawings.set_style(id, style).expect("style");
        drawings.rebuild_geometry(&projection);

        let y = projection.to_pixel(LogicalPoint::new(95.0, 100.0)).y;
        let tolerance = drawings.options().hit_test.body_tolerance(line_width);
        let hit = drawings.hit_test(PixelPoint::new(x, y + offset)).is_some();
        if offset <= tolerance - 1e-6 {
            prop_assert!(hit);
        } else if offset >= tolerance + 1e-6 {
            prop_assert!(!hit);
        }
    }
}
