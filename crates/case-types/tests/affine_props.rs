//! Property tests for placement transforms.

use case_types::vec3::{self, Vec3};
use case_types::{Affine, MirrorPlane};
use proptest::prelude::*;

fn arb_point() -> impl Strategy<Value = Vec3> {
    (-500.0f64..500.0, -500.0f64..500.0, -500.0f64..500.0).prop_map(|(x, y, z)| [x, y, z])
}

fn arb_axis() -> impl Strategy<Value = Vec3> {
    arb_point().prop_filter("non-zero axis", |a| vec3::norm(*a) > 1e-3)
}

const TOL: f64 = 1e-7;

proptest! {
    #[test]
    fn mirror_twice_restores_point(p in arb_point(), o in arb_point(), n in arb_axis()) {
        let m = Affine::reflection(o, n);
        let back = m.apply_point(m.apply_point(p));
        prop_assert!(vec3::distance(back, p) < TOL);
    }

    #[test]
    fn rotation_preserves_distance(p in arb_point(), q in arb_point(), axis in arb_axis(), deg in -360.0f64..360.0) {
        let r = Affine::rotation(axis, deg);
        let d0 = vec3::distance(p, q);
        let d1 = vec3::distance(r.apply_point(p), r.apply_point(q));
        prop_assert!((d0 - d1).abs() < TOL);
    }

    #[test]
    fn inverse_round_trips(p in arb_point(), axis in arb_axis(), deg in -180.0f64..180.0, t in arb_point()) {
        let a = Affine::rotation(axis, deg).then_translate(t);
        let inv = a.inverse().unwrap();
        prop_assert!(vec3::distance(inv.apply_point(a.apply_point(p)), p) < 1e-6);
    }

    #[test]
    fn default_mirror_is_x_negation(p in arb_point()) {
        let m = MirrorPlane::default();
        let r = m.reflect_point(p);
        prop_assert_eq!(r, [-p[0], p[1], p[2]]);
    }
}
