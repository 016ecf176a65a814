//! End-to-end light-transport scenarios.
//!
//! Deterministic, seeded renditions of the classic correctness scenes:
//! a Cornell box, mirror chambers, glass, absorbing and scattering media.
//! Tolerances are statistical, sized for the sample counts used here.

use helios_math::Vec3;
use helios_renderer::{
    render, trace_path, Camera, Material, Medium, Plane, Primitive, Ray, RayKind, Rectangle,
    RenderConfig, Scene, Sphere,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The Cornell-style room used by several scenarios: five diffuse walls,
/// a square ceiling light, one diffuse sphere.
fn cornell_box(width: usize, height: usize) -> Scene {
    let camera = Camera::new(
        Vec3::new(0.0, 1.0, 3.0),
        Vec3::new(0.0, -0.3, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        width,
        height,
    );
    let mut scene = Scene::new(camera);

    let white = scene.add_material(Material::diffuse(Vec3::splat(0.8)));
    let red = scene.add_material(Material::diffuse(Vec3::new(0.8, 0.1, 0.1)));
    let green = scene.add_material(Material::diffuse(Vec3::new(0.1, 0.8, 0.1)));
    let lamp = scene.add_material(Material::emitter(
        Vec3::splat(0.8),
        Vec3::new(1.0, 0.9, 0.7),
        10.0,
    ));

    // Floor, ceiling, back, front, left, right
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(0.0, -0.35, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
        white,
    )));
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(0.0, 1.2, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, 0.0),
        white,
    )));
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(0.0, 0.0, -0.35),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        white,
    )));
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(0.0, 0.0, 3.5),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        white,
    )));
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 1.0, 0.0),
        red,
    )));
    scene.add_primitive(Primitive::Plane(Plane::new(
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        green,
    )));

    scene.add_primitive(Primitive::Sphere(Sphere::new(
        Vec3::new(-0.45, 0.0, 0.6),
        0.35,
        white,
    )));

    // Ceiling light, facing down
    scene.add_primitive(Primitive::Rectangle(Rectangle::new(
        Vec3::new(0.0, 1.199, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, 0.0),
        1.0,
        1.0,
        lamp,
    )));

    scene
}

#[test]
fn cornell_box_luminance_is_stable() {
    init_logs();
    let scene = cornell_box(48, 48);
    let config = RenderConfig {
        width: 48,
        height: 48,
        samples_per_pixel: 48,
        seed: 7,
        ..RenderConfig::default()
    };
    let film = render(&scene, &config);

    // Everything the camera sees is lit: finite, non-negative radiance
    for pixel in &film.radiance {
        assert!(pixel.x.is_finite() && pixel.y.is_finite() && pixel.z.is_finite());
        assert!(pixel.x >= 0.0 && pixel.y >= 0.0 && pixel.z >= 0.0);
    }

    let mean = film.mean_luminance();
    assert!(mean > 0.05, "mean luminance {mean}");
    assert!(mean < 20.0, "mean luminance {mean}");

    // Auxiliary buffers carry first-hit geometry for every pixel (walls
    // enclose the camera completely)
    let zero_positions = film
        .position
        .iter()
        .filter(|p| **p == Vec3::ZERO)
        .count();
    assert_eq!(zero_positions, 0);
}

#[test]
fn cornell_box_nee_matches_bsdf_only() {
    // The same box must converge to the same mean with and without
    // next-event estimation; MIS weights must not double-count.
    init_logs();
    let scene = cornell_box(24, 24);
    let base = RenderConfig {
        width: 24,
        height: 24,
        samples_per_pixel: 96,
        seed: 11,
        ..RenderConfig::default()
    };

    let with_nee = render(
        &scene,
        &RenderConfig {
            enable_nee: true,
            ..base.clone()
        },
    )
    .mean_luminance();
    let without_nee = render(
        &scene,
        &RenderConfig {
            enable_nee: false,
            ..base
        },
    )
    .mean_luminance();

    let relative = (with_nee - without_nee).abs() / with_nee;
    assert!(
        relative < 0.12,
        "NEE mean {with_nee} vs BSDF-only mean {without_nee}"
    );
}

#[test]
fn mirror_chamber_follows_throughput_falloff() {
    // Camera - mirror - mirror - emitter: each specular bounce multiplies
    // the carried radiance by the mirror albedo, with no NEE involvement.
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        8,
        8,
    );
    let mut scene = Scene::new(camera);
    let albedo = 0.6;
    let mirror = scene.add_material(Material::mirror(Vec3::splat(albedo)));
    // Absorbing emitter: its own surface swallows continued paths, so the
    // carried radiance is exactly the two-bounce product
    let lamp = scene.add_material(Material::emitter(Vec3::ZERO, Vec3::ONE, 5.0));

    // Mirror at the origin tilted 45 degrees about y: reflects -z rays to +x
    scene.add_primitive(Primitive::Rectangle(Rectangle::new(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(-1.0, 0.0, 1.0),
        2.0,
        2.0,
        mirror,
    )));
    // Second mirror at x = 2, tilted to bounce +x rays to +z
    scene.add_primitive(Primitive::Rectangle(Rectangle::new(
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 1.0, 0.0),
        2.0,
        2.0,
        mirror,
    )));
    // Emitter facing the second mirror from +z
    scene.add_primitive(Primitive::Rectangle(Rectangle::new(
        Vec3::new(2.0, 0.0, 2.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        1.0,
        1.0,
        lamp,
    )));

    let config = RenderConfig {
        width: 8,
        height: 8,
        enable_nee: false,
        ..RenderConfig::default()
    };

    let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
    let mut rng = StdRng::seed_from_u64(13);
    let sample = trace_path(&scene, &config, ray, &mut rng);

    // Two mirror bounces: albedo^2 times the emitted radiance
    let expected = albedo * albedo * 5.0;
    assert!(
        (sample.radiance.x - expected).abs() < 1e-9,
        "radiance {:?} expected {expected}",
        sample.radiance
    );
}

#[test]
fn glass_sphere_transmits_and_reflects() {
    // A glass sphere between camera and emitter: paths either transmit
    // twice or bounce off; the estimator must stay finite and carry most
    // of the emitter's radiance through.
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        8,
        8,
    );
    let mut scene = Scene::new(camera);
    let glass = scene.add_material(Material::dielectric(1.5));
    let lamp = scene.add_material(Material::emitter(Vec3::ZERO, Vec3::ONE, 3.0));

    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.0, glass)));
    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, -6.0), 2.0, lamp)));

    let config = RenderConfig {
        width: 8,
        height: 8,
        enable_nee: false,
        ..RenderConfig::default()
    };

    let ray = Ray::new(Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
    let mut rng = StdRng::seed_from_u64(17);

    let samples = 20_000;
    let mut mean = Vec3::ZERO;
    for _ in 0..samples {
        let radiance = trace_path(&scene, &config, ray, &mut rng).radiance;
        assert!(radiance.x.is_finite());
        mean += radiance;
    }
    mean /= samples as f64;

    // Straight-through transmission dominates: the axis-aligned path meets
    // both interfaces at normal incidence where Fresnel loss is 4% each,
    // and the (n2/n1)^2 radiance scalings cancel on the way in and out.
    let expected = 3.0 * 0.96 * 0.96;
    let relative = (mean.x - expected).abs() / expected;
    assert!(relative < 0.05, "mean {mean:?} expected {expected}");
}

#[test]
fn absorbing_medium_matches_beer_lambert() {
    // Transmitted radiance through an absorbing sphere falls off as
    // exp(-sigma_a * path_length), componentwise.
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        8,
        8,
    );
    let mut scene = Scene::new(camera);
    let sigma = Vec3::new(1.0, 2.0, 3.0);
    let absorber = scene.add_medium(Medium::BeersLaw { sigma_a: sigma });
    let shell = scene.add_material(
        Material::dielectric(1.0)
            .with_medium(absorber)
            .with_allow_direct_light(),
    );
    let lamp = scene.add_material(Material::emitter(Vec3::ONE, Vec3::ONE, 1.0));

    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.0, shell)));
    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, lamp)));

    let config = RenderConfig {
        width: 8,
        height: 8,
        enable_nee: false,
        ..RenderConfig::default()
    };

    let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
    let mut rng = StdRng::seed_from_u64(19);
    let radiance = trace_path(&scene, &config, ray, &mut rng).radiance;

    // Diameter-long path through the absorber
    for axis in 0..3 {
        let expected = (-sigma[axis] * 2.0).exp();
        let ratio = radiance[axis] / expected;
        assert!(
            (ratio - 1.0).abs() < 0.01,
            "channel {axis}: {radiance:?} vs {expected}"
        );
    }
}

#[test]
fn scattering_medium_glows_and_attenuates() {
    // An emitter inside an isotropically scattering sphere: the glow
    // reaches the camera, and denser scattering dims the direct view.
    fn scene_with_sigma_s(sigma_s: f64) -> Scene {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            8,
            8,
        );
        let mut scene = Scene::new(camera);
        let fog = scene.add_medium(Medium::Homogeneous {
            sigma_a: Vec3::splat(0.02),
            sigma_s: Vec3::splat(sigma_s),
            g: 0.0,
        });
        let shell = scene.add_material(
            Material::dielectric(1.0)
                .with_medium(fog)
                .with_allow_direct_light(),
        );
        let lamp = scene.add_material(Material::emitter(Vec3::ONE, Vec3::ONE, 4.0));
        scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.5, shell)));
        scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 0.25, lamp)));
        scene
    }

    let config = RenderConfig {
        width: 8,
        height: 8,
        ..RenderConfig::default()
    };

    let estimate = |sigma_s: f64, seed: u64| {
        let scene = scene_with_sigma_s(sigma_s);
        let ray = Ray::new(
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, -1.0),
            RayKind::Camera,
        );
        let mut rng = StdRng::seed_from_u64(seed);
        let samples = 20_000;
        let mut mean = Vec3::ZERO;
        for _ in 0..samples {
            let radiance = trace_path(&scene, &config, ray, &mut rng).radiance;
            assert!(radiance.x.is_finite() && radiance.x >= 0.0);
            mean += radiance;
        }
        mean / samples as f64
    };

    let thin = estimate(0.1, 23);
    let thick = estimate(2.0, 29);

    assert!(thin.x > 0.5, "thin fog should transmit the emitter: {thin:?}");
    assert!(thick.x > 0.0, "thick fog still glows: {thick:?}");
    assert!(
        thick.x < thin.x,
        "denser fog must dim the view: {thick:?} vs {thin:?}"
    );
}

#[test]
fn russian_roulette_is_unbiased() {
    // The same scene estimated with aggressive roulette (from depth 1) and
    // with none inside the depth cap must agree in the mean.
    let scene = cornell_box(8, 8);
    let ray = Ray::new(
        Vec3::new(0.0, 1.0, 3.0),
        Vec3::new(0.05, -0.35, -1.0),
        RayKind::Camera,
    );

    let aggressive = RenderConfig {
        width: 8,
        height: 8,
        force_tracing_limit: 1,
        ..RenderConfig::default()
    };
    let lazy = RenderConfig {
        width: 8,
        height: 8,
        force_tracing_limit: 40,
        max_depth: 40,
        ..RenderConfig::default()
    };

    let samples = 40_000;
    let mut rng = StdRng::seed_from_u64(31);
    let mut mean_aggressive = 0.0;
    for _ in 0..samples {
        mean_aggressive += trace_path(&scene, &aggressive, ray, &mut rng).radiance.x;
    }
    mean_aggressive /= samples as f64;

    let mut mean_lazy = 0.0;
    for _ in 0..samples {
        mean_lazy += trace_path(&scene, &lazy, ray, &mut rng).radiance.x;
    }
    mean_lazy /= samples as f64;

    let relative = (mean_aggressive - mean_lazy).abs() / mean_lazy;
    assert!(
        relative < 0.1,
        "roulette {mean_aggressive} vs exhaustive {mean_lazy}"
    );
}

#[test]
fn medium_boundaries_balance_over_a_path() {
    // A ray through two nested absorbing shells enters and exits each
    // boundary once; radiance from behind carries both attenuations and
    // the path ends back in the background medium.
    let camera = Camera::new(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(0.0, 1.0, 0.0),
        8,
        8,
    );
    let mut scene = Scene::new(camera);
    let outer_sigma = Vec3::splat(0.2);
    let inner_sigma = Vec3::splat(0.5);
    let outer = scene.add_medium(Medium::BeersLaw { sigma_a: outer_sigma });
    let inner = scene.add_medium(Medium::BeersLaw { sigma_a: inner_sigma });
    let outer_shell = scene.add_material(
        Material::dielectric(1.0)
            .with_medium(outer)
            .with_allow_direct_light(),
    );
    let inner_shell = scene.add_material(
        Material::dielectric(1.0)
            .with_medium(inner)
            .with_allow_direct_light(),
    );
    let lamp = scene.add_material(Material::emitter(Vec3::ONE, Vec3::ONE, 1.0));

    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 2.0, outer_shell)));
    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.0, inner_shell)));
    scene.add_primitive(Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, -8.0), 1.0, lamp)));

    let config = RenderConfig {
        width: 8,
        height: 8,
        enable_nee: false,
        ..RenderConfig::default()
    };

    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
    let mut rng = StdRng::seed_from_u64(37);
    let radiance = trace_path(&scene, &config, ray, &mut rng).radiance;

    // 2 units in the inner medium, 2 units in the outer (1 each side)
    let expected = (-(inner_sigma.x * 2.0 + outer_sigma.x * 2.0)).exp();
    assert!(
        (radiance.x / expected - 1.0).abs() < 0.01,
        "radiance {radiance:?} expected {expected}"
    );
}
