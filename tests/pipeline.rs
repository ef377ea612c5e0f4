//! End-to-end checks of the observation pipeline against an in-memory
//! ephemeris.

use approx::assert_relative_eq;
use nalgebra::{Matrix3, Matrix3xX, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use starfield_positions::constants::{C_AUDAY, J2000};
use starfield_positions::earthlib::terra;
use starfield_positions::functions::{rotate_each, to_polar};
use starfield_positions::{
    itrf_to_gcrs, Body, CelestialObject, Ephemeris, Frame, GeocentricTarget, LinearEphemeris,
    PipelineConfig, Planet, Position, PositionError, Pressure, Temperature, Time, Topos,
};
use std::sync::Arc;

fn ephemeris() -> Arc<dyn Ephemeris> {
    Arc::new(
        LinearEphemeris::new(J2000)
            .with_body(Body::Sun, Vector3::new(-0.007, -0.003, -0.001), Vector3::zeros())
            .with_body(
                Body::Earth,
                Vector3::new(-0.184, 0.885, 0.384),
                Vector3::new(-0.0172, -0.0029, -0.0013),
            )
            .with_body(
                Body::Mars,
                Vector3::new(1.391, -0.013, -0.043),
                Vector3::new(0.0007, 0.0138, 0.0063),
            )
            .with_body(Body::Jupiter, Vector3::new(4.001, 2.735, 1.075), Vector3::zeros())
            .with_body(Body::Saturn, Vector3::new(6.406, 6.174, 2.275), Vector3::zeros()),
    )
}

fn random_batch(rng: &mut StdRng, n: usize) -> Matrix3xX<f64> {
    let vectors: Vec<Vector3<f64>> = (0..n)
        .map(|_| {
            Vector3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            )
        })
        .collect();
    Matrix3xX::from_columns(&vectors)
}

/// Angle between two vectors, accurate for tiny separations
fn separation(a: Vector3<f64>, b: Vector3<f64>) -> f64 {
    a.cross(&b).norm().atan2(a.dot(&b))
}

#[test]
fn subtraction_recovers_the_subtrahend() {
    let mut rng = StdRng::seed_from_u64(424242);
    let t = Time::from_tt_batch(&[J2000, J2000 + 1.0, J2000 + 2.0, J2000 + 3.0]);

    for _ in 0..20 {
        let a = Position::new(
            Frame::Barycentric,
            random_batch(&mut rng, 4),
            Some(random_batch(&mut rng, 4)),
            Some(t.clone()),
        )
        .unwrap();
        let b = Position::new(
            Frame::Barycentric,
            random_batch(&mut rng, 4),
            Some(random_batch(&mut rng, 4)),
            Some(t.clone()),
        )
        .unwrap();

        let a_minus_b = &a - &b;
        let back = &a - &a_minus_b;
        assert_relative_eq!(back.position_au(), b.position_au(), epsilon = 1e-12);

        // Velocities subtract the other way round
        let av = a.velocity_au_per_d().unwrap();
        let bv = b.velocity_au_per_d().unwrap();
        assert_relative_eq!(a_minus_b.velocity_au_per_d().unwrap(), &(bv - av), epsilon = 1e-12);
        assert_relative_eq!(
            back.velocity_au_per_d().unwrap(),
            &(bv - av - av),
            epsilon = 1e-12
        );
    }
}

#[rstest]
#[case(0.0, 0.0)]
#[case(90.0, 0.0)]
#[case(-90.0, 45.0)]
#[case(42.3583, -71.0603)]
#[case(-33.9, 180.0)]
#[case(12.0, -180.0)]
#[case(60.0, 179.999)]
fn topos_local_frame_is_orthonormal(#[case] latitude: f64, #[case] longitude: f64) {
    let topos = Topos::from_degrees(latitude, longitude, 0.0).unwrap();
    let (up, north, west) = (topos.up(), topos.north(), topos.west());

    for v in [up, north, west] {
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-15);
    }
    assert!(up.dot(north).abs() < 1e-15);
    assert!(up.dot(west).abs() < 1e-15);
    assert!(north.dot(west).abs() < 1e-15);
}

#[test]
fn horizon_rotation_is_orthonormal() {
    let mut rng = StdRng::seed_from_u64(7);
    let tts: Vec<f64> = (0..25).map(|_| J2000 + rng.gen_range(-20_000.0..20_000.0)).collect();
    let t = Time::from_tt_batch(&tts);
    let topos = Topos::from_degrees(
        rng.gen_range(-90.0..90.0),
        rng.gen_range(-180.0..180.0),
        0.0,
    )
    .unwrap();

    for r in topos.altaz_rotation(&t) {
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-13);
        // (north, east, up) is a left-handed triad
        assert_relative_eq!(r.determinant(), -1.0, epsilon = 1e-13);
    }
}

#[test]
fn topos_matches_itrf_to_gcrs() {
    let t = Time::from_tt_batch(&[J2000 + 0.1, J2000 + 3000.7]);
    let topos = Topos::from_degrees(-20.0, 150.0, 2500.0).unwrap();
    let (gcrs, _) = topos.position_and_velocity(&t);

    let elevation_au = topos.elevation().au()[0];
    let (itrf, _) = terra(
        (-20.0_f64).to_radians(),
        150.0_f64.to_radians(),
        elevation_au,
        &[0.0, 0.0],
    );
    let rotated = itrf_to_gcrs(&t, &itrf).unwrap();
    assert_relative_eq!(rotated, gcrs, epsilon = 1e-15);
}

#[test]
fn full_pipeline_from_an_earth_location() {
    let ephemeris = ephemeris();
    let t = Time::from_tt_batch(&[J2000, J2000 + 0.5, J2000 + 1.0]);
    let boston = Topos::new("42.3583 N", "71.0603 W", 0.0)
        .unwrap()
        .with_ephemeris(Arc::clone(&ephemeris));
    let mars = Planet::new(Body::Mars, ephemeris);

    let observer = boston.at(&t).unwrap();
    let astrometric = observer.observe(&mars).unwrap();
    assert_eq!(astrometric.frame(), Frame::Astrometric);
    assert_eq!(astrometric.observer().unwrap().frame(), Frame::Barycentric);

    let distance = astrometric.distance();
    for (lt, d) in astrometric.light_time().unwrap().iter().zip(distance.au()) {
        assert_relative_eq!(*lt, d / C_AUDAY, epsilon = 1e-11);
    }

    let apparent = astrometric.apparent().unwrap();
    assert_eq!(apparent.frame(), Frame::Apparent);
    assert_eq!(apparent.len(), 3);

    // Aberration moves the image by at most ~21"
    for i in 0..3 {
        let shift = separation(
            apparent.position_au().column(i).into_owned(),
            astrometric.position_au().column(i).into_owned(),
        );
        assert!(shift < 21.5 / 206_264.806, "shift {} rad", shift);
        assert!(shift > 0.0);
    }

    // Unrefracted altitude is exactly the polar decomposition
    let (alt, az, dist) = apparent.altaz().unwrap();
    let rotation = observer.horizon_rotation().unwrap();
    let (r, expected_alt, expected_az) = to_polar(&rotate_each(rotation, apparent.position_au()));
    assert_eq!(alt.radians(), expected_alt);
    assert_eq!(az.radians(), expected_az);
    assert_eq!(dist.au(), r.as_slice());

    // Standard conditions at sea level mean 10 C and 1010 mbar
    let config = PipelineConfig::default();
    let (standard, _, _) = apparent
        .altaz_with(Some(Temperature::Standard), Pressure::Standard, &config)
        .unwrap();
    let (explicit, _, _) = apparent
        .altaz_with(
            Some(Temperature::Celsius(10.0)),
            Pressure::Millibars(1010.0),
            &config,
        )
        .unwrap();
    assert_eq!(standard, explicit);
    for (refracted, geometric) in standard.degrees().iter().zip(alt.degrees()) {
        assert!(*refracted >= geometric);
    }
}

#[test]
fn deflectors_come_from_configuration() {
    let ephemeris = ephemeris();
    let t = Time::from_tt(J2000);
    let site = Topos::from_degrees(0.0, 0.0, 0.0).unwrap().with_ephemeris(Arc::clone(&ephemeris));
    let mars = Planet::new(Body::Mars, ephemeris);
    let astrometric = site.at(&t).unwrap().observe(&mars).unwrap();

    let no_deflection = PipelineConfig {
        deflectors: vec![],
        earth_deflection_limb_angle: f64::INFINITY,
        ..PipelineConfig::default()
    };
    let bent = astrometric.apparent().unwrap();
    let straight = astrometric.apparent_with(&no_deflection).unwrap();

    let angle = separation(
        bent.position_au().column(0).into_owned(),
        straight.position_au().column(0).into_owned(),
    );
    assert!(angle > 0.0);
    assert!(angle < 0.1 / 206_264.806, "deflection {} rad", angle);
}

#[test]
fn geocentric_observation_of_a_topos() {
    let t = Time::from_tt_batch(&[J2000, J2000 + 0.25]);
    let site = Topos::from_degrees(51.4769, -0.0005, 46.0).unwrap();
    let other = Topos::from_degrees(48.8566, 2.3522, 35.0).unwrap();

    let geocentric = site.gcrs(&t).unwrap();
    let apparent = geocentric.observe(&other).unwrap();
    assert_eq!(apparent.frame(), Frame::Apparent);
    assert!(apparent.velocity_au_per_d().is_some());

    // Paris sits below the Greenwich horizon
    let (alt, _, distance) = apparent.altaz().unwrap();
    assert!(alt.degrees().iter().all(|a| *a < 0.0 && *a > -5.0));
    assert!(distance.km().iter().all(|d| (300.0..400.0).contains(d)));
}

#[test]
fn geocentric_observer_needs_a_gcrs_target() {
    let t = Time::from_tt(J2000);
    let geocentric = Topos::from_degrees(0.0, 0.0, 0.0).unwrap().gcrs(&t).unwrap();
    let mars = Planet::new(Body::Mars, ephemeris());

    assert!(mars.as_geocentric().is_none());
    match geocentric.observe(&mars) {
        Err(PositionError::UnsupportedTarget { target, .. }) => assert_eq!(target, "Mars"),
        other => panic!("expected UnsupportedTarget, got {:?}", other.map(|p| p.frame())),
    }
}

#[test]
fn barycentric_observer_needs_an_astrometric_target() {
    let ephemeris = ephemeris();
    let t = Time::from_tt(J2000);
    let earth = Planet::new(Body::Earth, Arc::clone(&ephemeris)).at(&t).unwrap();
    let site = Topos::from_degrees(0.0, 0.0, 0.0).unwrap();

    assert!(matches!(
        earth.observe(&site),
        Err(PositionError::UnsupportedTarget { .. })
    ));
}

#[test]
fn altaz_needs_an_earth_location() {
    let ephemeris = ephemeris();
    let t = Time::from_tt(J2000);
    let earth = Planet::new(Body::Earth, Arc::clone(&ephemeris)).at(&t).unwrap();
    let mars = Planet::new(Body::Mars, ephemeris);

    let apparent = earth.observe(&mars).unwrap().apparent().unwrap();
    assert!(matches!(apparent.altaz(), Err(PositionError::MissingObserver)));
    // The geocenter observing Mars still has coordinates
    let (ra, dec, _) = apparent.radec(None).unwrap();
    assert_eq!(ra.len(), 1);
    assert_eq!(dec.len(), 1);
}

#[test]
fn apparent_needs_observer_velocity() {
    let ephemeris = ephemeris();
    let t = Time::from_tt(J2000);
    let observer = Position::new(
        Frame::Barycentric,
        Matrix3xX::from_column_slice(&[-0.18, 0.88, 0.38]),
        None,
        Some(t),
    )
    .unwrap()
    .with_ephemeris(Arc::clone(&ephemeris));
    let mars = Planet::new(Body::Mars, ephemeris);

    let astrometric = observer.observe(&mars).unwrap();
    assert!(astrometric.velocity_au_per_d().is_none());
    assert!(matches!(
        astrometric.apparent(),
        Err(PositionError::MissingVelocity(_))
    ));
}

#[test]
fn times_from_utc_flow_through() {
    use chrono::{TimeZone, Utc};

    let dt = Utc.with_ymd_and_hms(2000, 1, 1, 11, 58, 56).unwrap();
    let t = Time::from_datetime(dt).unwrap();
    assert_relative_eq!(t.tt()[0], J2000 + 0.184 / 86_400.0, epsilon = 1e-8);

    let site = Topos::from_degrees(0.0, 0.0, 0.0).unwrap().with_ephemeris(ephemeris());
    let position = site.at(&t).unwrap();
    assert_eq!(position.time().unwrap().tt(), t.tt());
}

#[test]
fn config_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");

    let config = PipelineConfig {
        deflectors: vec![Body::Sun, Body::Jupiter],
        light_time_max_iterations: 7,
        standard_temperature_c: -5.0,
        ..PipelineConfig::default()
    };
    config.save_to_file(&path).unwrap();
    let loaded = PipelineConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);

    std::fs::write(&path, "{ not json").unwrap();
    assert!(PipelineConfig::from_file(&path).is_err());
}
