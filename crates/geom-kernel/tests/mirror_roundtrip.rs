//! Mirroring twice through the same plane restores every edge, on both kernels.

use case_types::vec3;
use case_types::{Affine, MirrorPlane};
use geom_kernel::{Kernel, KernelIntrospect, MockKernel, TruckKernel};

fn endpoints<K: Kernel + KernelIntrospect>(k: &K, h: &geom_kernel::KernelSolidHandle) -> Vec<[f64; 6]> {
    let mut v: Vec<[f64; 6]> = k
        .edges(h)
        .unwrap()
        .into_iter()
        .map(|e| {
            let snap = |p: [f64; 3]| p.map(|x| (x * 1e6).round() / 1e6);
            let (s, t) = (snap(e.start), snap(e.end));
            let (a, b) = if s <= t { (s, t) } else { (t, s) };
            [a[0], a[1], a[2], b[0], b[1], b[2]]
        })
        .collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

fn round_trip<K: Kernel + KernelIntrospect>(k: &mut K) {
    let plate = k.make_box([20.0, 10.0, 3.0]).unwrap();
    let hole = k
        .make_cylinder(2.0, 5.0, [6.0, 5.0, -1.0], [0.0, 0.0, 1.0])
        .unwrap();
    let drilled = k.boolean_subtract(&plate, &hole).unwrap();
    let plane = MirrorPlane::default().to_affine();

    let once = k.transform(&drilled, &plane).unwrap();
    let bb = k.bounding_box(&once).unwrap();
    assert!(bb.max[0] <= 1e-6, "mirrored solid should lie at x <= 0, got {:?}", bb);

    let twice = k.transform(&once, &plane).unwrap();
    let before = endpoints(k, &drilled);
    let after = endpoints(k, &twice);
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        for i in 0..6 {
            assert!((a[i] - b[i]).abs() < 1e-6, "{a:?} vs {b:?}");
        }
    }
    let v0 = k.volume(&drilled).unwrap();
    let v2 = k.volume(&twice).unwrap();
    assert!((v0 - v2).abs() < 1e-6 * v0.max(1.0));
}

#[test]
fn mock_mirror_round_trip() {
    round_trip(&mut MockKernel::new());
}

#[test]
fn truck_mirror_round_trip() {
    round_trip(&mut TruckKernel::new());
}

#[test]
fn rotation_then_inverse_is_identity_on_mock() {
    let mut k = MockKernel::new();
    let b = k.make_box([4.0, 2.0, 1.0]).unwrap();
    let r = Affine::rotation(vec3::Z, 37.0).then_translate([3.0, -2.0, 1.0]);
    let moved = k.transform(&b, &r).unwrap();
    let back = k.transform(&moved, &r.inverse().unwrap()).unwrap();
    assert_eq!(endpoints(&k, &b).len(), endpoints(&k, &back).len());
    for (a, c) in endpoints(&k, &b).iter().zip(&endpoints(&k, &back)) {
        for i in 0..6 {
            assert!((a[i] - c[i]).abs() < 1e-9);
        }
    }
}
