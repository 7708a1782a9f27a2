use glim_geom::{Aabb, Vec3};

#[test]
fn dot_and_cross_orthogonality() {
    let x = Vec3::new(1.0, 0.0, 0.0);
    let y = Vec3::new(0.0, 1.0, 0.0);
    assert_eq!(x.dot(y), 0.0);
    assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
}

#[test]
fn normalized_unit_length() {
    let v = Vec3::new(3.0, 4.0, 0.0);
    let n = v.normalized();
    assert!((n.length() - 1.0).abs() < 1e-6);
    // Zero stays zero rather than dividing by zero.
    assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
}

#[test]
fn aabb_center_and_containment() {
    let b = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(16.0, 16.0, 16.0));
    assert_eq!(b.center(), Vec3::new(8.0, 8.0, 8.0));
    assert!(b.contains_point(Vec3::new(0.0, 16.0, 8.0)));
    assert!(!b.contains_point(Vec3::new(-0.1, 8.0, 8.0)));
}
