// src/vec3.rs

/// 3D vector dot product.
#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Component-wise scale: s * v.
#[inline]
pub fn scale(v: [f64; 3], s: f64) -> [f64; 3] {
    [s * v[0], s * v[1], s * v[2]]
}

/// In-place a += b.
#[inline]
pub fn add_assign(a: &mut [f64; 3], b: [f64; 3]) {
    a[0] += b[0];
    a[1] += b[1];
    a[2] += b[2];
}

/// Euclidean norm.
#[inline]
pub fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_agree() {
        let mut a = [1.0, 2.0, 2.0];
        assert_eq!(norm(a), 3.0);
        add_assign(&mut a, scale([1.0, 0.0, -1.0], 2.0));
        assert_eq!(a, [3.0, 2.0, 0.0]);
        assert_eq!(dot(a, [1.0, 1.0, 1.0]), 5.0);
    }
}
