use glim_geom::Vec3;
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f32> {
    -1.0e3f32..=1.0e3
}

fn vec3() -> impl Strategy<Value = Vec3> {
    (finite(), finite(), finite()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    // Addition and subtraction invert each other componentwise.
    #[test]
    fn add_sub_roundtrip(a in vec3(), b in vec3()) {
        let back = (a + b) - b;
        prop_assert!((back.x - a.x).abs() < 1e-3);
        prop_assert!((back.y - a.y).abs() < 1e-3);
        prop_assert!((back.z - a.z).abs() < 1e-3);
    }

    // Cross product is perpendicular to both operands.
    #[test]
    fn cross_is_perpendicular(a in vec3(), b in vec3()) {
        let c = a.cross(b);
        let scale = (a.length() * b.length()).max(1.0);
        prop_assert!((c.dot(a) / (scale * scale)).abs() < 1e-3);
        prop_assert!((c.dot(b) / (scale * scale)).abs() < 1e-3);
    }

    // dot(v, v) equals |v|^2.
    #[test]
    fn dot_self_is_length_sq(v in vec3()) {
        let d = v.dot(v);
        let l = v.length();
        prop_assert!((d - l * l).abs() <= 1e-2 * d.abs().max(1.0));
    }
}
