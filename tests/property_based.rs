// tests/property_based.rs
//
// Property tests for the planner invariants and the fill/fit geometry
// guarantees.

use image::{DynamicImage, Rgb, RgbImage};
use proptest::prelude::*;
use thumbkit::engine::{plan_dimensions, select_interpolator, SourceImage};
use thumbkit::{Interpolator, Options, Thumbnailer};

fn create_source(width: u32, height: u32) -> SourceImage {
    SourceImage::new(DynamicImage::ImageRgb8(RgbImage::from_fn(
        width,
        height,
        |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]),
    )))
}

fn window_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), Just(2u32), Just(4u32)]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_plan_invariants(
        src_w in 1u32..=8192,
        src_h in 1u32..=8192,
        target_w in 1u32..=512,
        target_h in 1u32..=512,
        crop in any::<bool>(),
        window in window_strategy(),
    ) {
        let opts = Options {
            crop,
            ..Options::new(target_w, target_h)
        };
        let plan = plan_dimensions(src_w, src_h, &opts, window);
        prop_assert!(plan.shrink >= 1);
        prop_assert!(plan.residual > 0.0);
        // The integer stage never shrinks the driving axis below one pixel.
        let driving = match plan.axis {
            thumbkit::engine::Axis::Horizontal => src_w,
            thumbkit::engine::Axis::Vertical => src_h,
        };
        prop_assert!(driving / plan.shrink >= 1);
    }

    #[test]
    fn prop_upscale_forces_nearest(
        src_w in 1u32..=256,
        src_h in 1u32..=256,
        target_w in 1u32..=256,
        target_h in 1u32..=256,
        crop in any::<bool>(),
    ) {
        let opts = Options {
            crop,
            ..Options::new(target_w, target_h)
        };
        let trial = plan_dimensions(src_w, src_h, &opts, 2);
        let selected = select_interpolator(&create_source(src_w, src_h), &opts);
        if trial.residual > 1.0 {
            prop_assert_eq!(selected, Interpolator::Nearest);
        } else {
            prop_assert_eq!(selected, Interpolator::Bicubic);
        }
    }

    #[test]
    fn prop_fill_mode_output_is_exactly_the_box(
        src_w in 1u32..=200,
        src_h in 1u32..=200,
        target_w in 1u32..=48,
        target_h in 1u32..=48,
    ) {
        let engine = Thumbnailer::new(Options {
            crop: true,
            ..Options::new(target_w, target_h)
        }).unwrap();
        let thumb = engine.render_decoded(create_source(src_w, src_h)).unwrap();
        prop_assert_eq!((thumb.width, thumb.height), (target_w, target_h));
    }

    #[test]
    fn prop_fit_mode_stays_inside_and_keeps_aspect(
        src_w in 1u32..=200,
        src_h in 1u32..=200,
        target_w in 8u32..=48,
        target_h in 8u32..=48,
    ) {
        let engine = Thumbnailer::new(Options::new(target_w, target_h)).unwrap();
        let thumb = engine.render_decoded(create_source(src_w, src_h)).unwrap();
        prop_assert!(thumb.width <= target_w);
        prop_assert!(thumb.height <= target_h);
        prop_assert!(thumb.width >= 1 && thumb.height >= 1);

        // Aspect preserved within one pixel of rounding on either axis
        // (the integer shrink truncates, the affine rounds).
        let ratio = src_w as f64 / src_h as f64;
        let w_err = (thumb.width as f64 - ratio * thumb.height as f64).abs();
        let h_err = (thumb.height as f64 - thumb.width as f64 / ratio).abs();
        prop_assert!(
            w_err <= 1.5 || h_err <= 1.5,
            "aspect drift: {}x{} -> {}x{}",
            src_w, src_h, thumb.width, thumb.height
        );
    }

    #[test]
    fn prop_orientation_mapping_is_total(value in any::<u16>()) {
        use thumbkit::engine::Angle;
        let angle = Angle::from_tag_value(&value.to_string());
        let expected = match value.to_string().chars().next() {
            Some('6') => Angle::D90,
            Some('8') => Angle::D270,
            Some('3') => Angle::D180,
            _ => Angle::D0,
        };
        prop_assert_eq!(angle, expected);
    }

    #[test]
    fn prop_thumbnail_bytes_are_jpeg(
        src_w in 8u32..=128,
        src_h in 8u32..=128,
    ) {
        let engine = Thumbnailer::new(Options {
            crop: true,
            ..Options::new(32, 32)
        }).unwrap();
        let thumb = engine.render_decoded(create_source(src_w, src_h)).unwrap();
        prop_assert!(!thumb.is_empty());
        prop_assert_eq!(&thumb.data[0..2], &[0xFF, 0xD8]);
    }
}
