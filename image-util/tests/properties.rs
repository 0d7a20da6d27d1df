//! End-to-end checks of the grid operations through the public API

use approx::{assert_abs_diff_eq, assert_relative_eq};
use image_util::{
    add_kernel, add_kernel_aligned, crop_center, filter_overlap, rebin_image, resize_by_factor,
    shift, stack_images, subtract_kernel_aligned, CoordinateTransform, GridShape, NoiseModel,
    PointSet, Position,
};
use ndarray::{s, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_grid(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-10.0..10.0))
}

fn integer_grid(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-50..50) as f64)
}

#[test]
fn test_kernel_block_in_zero_grid() {
    init_logging();
    let target = Array2::<f64>::zeros((5, 5));
    let kernel = Array2::<f64>::ones((3, 3));
    let out = add_kernel_aligned(&target.view(), 2, 2, &kernel.view()).unwrap();

    for ((r, c), &v) in out.indexed_iter() {
        let inside = (1..=3).contains(&r) && (1..=3).contains(&c);
        assert_eq!(v, if inside { 1.0 } else { 0.0 }, "pixel ({r}, {c})");
    }
}

#[test]
fn test_add_then_subtract_restores_interior() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..20 {
        let target = integer_grid(&mut rng, 21, 17);
        let kernel = integer_grid(&mut rng, 5, 7);
        // Interior positions: the whole kernel footprint lies inside the target
        let xi = rng.gen_range(3..14);
        let yi = rng.gen_range(2..19);

        let added = add_kernel_aligned(&target.view(), xi, yi, &kernel.view()).unwrap();
        let restored = subtract_kernel_aligned(&added.view(), xi, yi, &kernel.view()).unwrap();
        assert_eq!(restored, target);
    }
}

#[test]
fn test_add_then_subtract_restores_clipped() {
    let mut rng = StdRng::seed_from_u64(4);
    let target = random_grid(&mut rng, 9, 9);
    let kernel = random_grid(&mut rng, 7, 7);
    for (xi, yi) in [(0, 0), (8, 0), (-2, 4), (10, 10), (4, 11)] {
        let added = add_kernel_aligned(&target.view(), xi, yi, &kernel.view()).unwrap();
        let restored = subtract_kernel_aligned(&added.view(), xi, yi, &kernel.view()).unwrap();
        for (a, b) in restored.iter().zip(target.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_integer_position_matches_aligned() {
    let mut rng = StdRng::seed_from_u64(8);
    let target = random_grid(&mut rng, 15, 15);
    let kernel = random_grid(&mut rng, 5, 5);
    let aligned = add_kernel_aligned(&target.view(), 6, 9, &kernel.view()).unwrap();

    for order in 0..=5 {
        let placed = add_kernel(&target.view(), Position::new(6.0, 9.0), &kernel.view(), order).unwrap();
        for (a, b) in placed.iter().zip(aligned.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_subpixel_placement_conserves_interior_flux() {
    let target = Array2::<f64>::zeros((32, 32));
    let mut kernel = Array2::<f64>::zeros((9, 9));
    kernel.slice_mut(s![3..6, 3..6]).fill(1.0);

    let out = add_kernel(&target.view(), Position::new(15.3, 16.7), &kernel.view(), 1).unwrap();
    assert_relative_eq!(out.sum(), kernel.sum(), epsilon = 1e-12);
}

#[test]
fn test_shift_round_trip_by_whole_pixels() {
    let mut rng = StdRng::seed_from_u64(2);
    let grid = random_grid(&mut rng, 12, 10);
    let there = shift(&grid.view(), 2.0, -1.0, 3).unwrap();
    let back = shift(&there.view(), -2.0, 1.0, 3).unwrap();
    // Content that never left the grid survives unchanged
    for r in 1..12 {
        for c in 0..8 {
            assert_abs_diff_eq!(back[[r, c]], grid[[r, c]], epsilon = 1e-10);
        }
    }
}

#[test]
fn test_resize_identity_and_flux() {
    let mut rng = StdRng::seed_from_u64(11);
    let grid = random_grid(&mut rng, 12, 18);
    assert_eq!(resize_by_factor(&grid.view(), 1).unwrap(), grid);

    for factor in [2, 3, 6] {
        let small = resize_by_factor(&grid.view(), factor).unwrap();
        assert_eq!(GridShape::of(&small), GridShape::new(12 / factor, 18 / factor));
        assert_relative_eq!(
            small.sum() * (factor * factor) as f64,
            grid.sum(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_rebin_ones_scenario() {
    let ones = Array2::<f64>::ones((4, 4));
    let rebinned = rebin_image(
        2,
        &ones.view(),
        &ones.view(),
        0.1,
        &ones.view(),
        &ones.view(),
        &ones.view(),
    )
    .unwrap();
    assert_eq!(rebinned.image, Array2::from_elem((2, 2), 4.0));
    assert_eq!(rebinned.weight_map, Array2::ones((2, 2)));
    assert_eq!(rebinned.mask, Array2::ones((2, 2)));
    assert_relative_eq!(rebinned.background_sigma, 0.2, epsilon = 1e-15);
}

#[test]
fn test_rebin_bin_one_passes_through() {
    let mut rng = StdRng::seed_from_u64(5);
    let image = random_grid(&mut rng, 7, 5);
    let weight = random_grid(&mut rng, 7, 5).mapv(f64::abs);
    let x = random_grid(&mut rng, 7, 5);
    let y = random_grid(&mut rng, 7, 5);
    let mask = Array2::from_shape_fn((7, 5), |(r, c)| ((r + c) % 2) as f64);

    let (out_image, out_weight, sigma, out_x, out_y, out_mask) = rebin_image(
        1,
        &image.view(),
        &weight.view(),
        0.3,
        &x.view(),
        &y.view(),
        &mask.view(),
    )
    .unwrap()
    .into_tuple();
    assert_eq!(out_image, image);
    assert_eq!(out_weight, weight);
    assert_eq!(sigma, 0.3);
    assert_eq!(out_x, x);
    assert_eq!(out_y, y);
    assert_eq!(out_mask, mask);
}

#[test]
fn test_rebinned_coordinates_match_rebinned_transform() {
    let num_pix = 8;
    let transform = CoordinateTransform::centered(num_pix, 0.05).unwrap();
    let ra = Array2::from_shape_fn((num_pix, num_pix), |(r, c)| {
        transform.pixel_to_sky(c as f64, r as f64).0
    });
    let dec = Array2::from_shape_fn((num_pix, num_pix), |(r, c)| {
        transform.pixel_to_sky(c as f64, r as f64).1
    });
    let ones = Array2::<f64>::ones((num_pix, num_pix));

    for factor in [2, 4] {
        let rebinned = rebin_image(
            factor,
            &ones.view(),
            &ones.view(),
            1.0,
            &ra.view(),
            &dec.view(),
            &ones.view(),
        )
        .unwrap();
        let coarse = transform.rebinned(factor).unwrap();

        for ((r, c), &v) in rebinned.x_coords.indexed_iter() {
            let (ra_expected, dec_expected) = coarse.pixel_to_sky(c as f64, r as f64);
            assert_abs_diff_eq!(v, ra_expected, epsilon = 1e-12);
            assert_abs_diff_eq!(rebinned.y_coords[[r, c]], dec_expected, epsilon = 1e-12);
        }
        let (x0, y0) = coarse.sky_to_pixel(0.0, 0.0);
        let center = (num_pix / factor) as f64 / 2.0 - 0.5;
        assert_abs_diff_eq!(x0, center, epsilon = 1e-12);
        assert_abs_diff_eq!(y0, center, epsilon = 1e-12);
    }
}

#[test]
fn test_crop_center_properties() {
    let mut rng = StdRng::seed_from_u64(3);
    let square = random_grid(&mut rng, 9, 9);
    assert_eq!(crop_center(&square.view(), 9).unwrap(), square);

    for size in [1, 3, 5, 7] {
        let cropped = crop_center(&square.view(), size).unwrap();
        let margin = (9 - size) / 2;
        assert_eq!(margin * 2 + size, 9);
        assert_eq!(
            cropped,
            square.slice(s![margin..margin + size, margin..margin + size])
        );
    }
}

#[test]
fn test_filter_overlap_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..10 {
        let xs: Vec<f64> = (0..40).map(|_| rng.gen_range(-2.0..2.0)).collect();
        let ys: Vec<f64> = (0..40).map(|_| rng.gen_range(-2.0..2.0)).collect();
        let (once_x, once_y) = filter_overlap(&xs, &ys, 0.3).unwrap();
        let (twice_x, twice_y) = filter_overlap(&once_x, &once_y, 0.3).unwrap();
        assert_eq!(once_x, twice_x);
        assert_eq!(once_y, twice_y);

        let set = PointSet::new(xs, ys).unwrap();
        assert_eq!(set.filter_overlap(0.3).into_parts(), (once_x, once_y));
    }
}

#[test]
fn test_stack_single_exposure() {
    let mut rng = StdRng::seed_from_u64(6);
    let image = random_grid(&mut rng, 6, 4);
    let weight = Array2::<f64>::ones((6, 4));
    let stacked = stack_images(&[image.clone()], &[weight.clone()], &[1.3]).unwrap();
    assert_eq!(stacked.image, image);
    assert_eq!(stacked.mean_weight(), weight);
    assert_relative_eq!(stacked.sigma, 1.3, epsilon = 1e-15);
}

#[test]
fn test_noise_model_is_reproducible() {
    let image = Array2::from_elem((16, 16), 25.0);
    let model = NoiseModel {
        background_sigma: 0.5,
        exposure_time: Some(100.0),
    };
    let a = model.realize(&image.view(), &mut StdRng::seed_from_u64(99)).unwrap();
    let b = model.realize(&image.view(), &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, image);
}
