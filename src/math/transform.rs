// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f, Matrix4f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix,
               inv_matrix: matrix.try_inverse().unwrap_or_else(Matrix4f::identity) }
    }

    /// Scale followed by translation, the composition the scene format exposes.
    pub fn from_translate_scale(translate: Vector3f, scale: Vector3f) -> Self {
        let mut matrix = Matrix4f::identity();
        matrix[(0, 0)] = scale[0];
        matrix[(1, 1)] = scale[1];
        matrix[(2, 2)] = scale[2];
        matrix[(0, 3)] = translate[0];
        matrix[(1, 3)] = translate[1];
        matrix[(2, 3)] = translate[2];
        Self::new(matrix)
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        let x = p[0] * self.matrix[(0, 0)] + p[1] * self.matrix[(0, 1)] +
            p[2] * self.matrix[(0, 2)] + self.matrix[(0, 3)];
        let y = p[0] * self.matrix[(1, 0)] + p[1] * self.matrix[(1, 1)] +
            p[2] * self.matrix[(1, 2)] + self.matrix[(1, 3)];
        let z = p[0] * self.matrix[(2, 0)] + p[1] * self.matrix[(2, 1)] +
            p[2] * self.matrix[(2, 2)] + self.matrix[(2, 3)];
        let w = p[0] * self.matrix[(3, 0)] + p[1] * self.matrix[(3, 1)] +
            p[2] * self.matrix[(3, 2)] + self.matrix[(3, 3)];

        Vector3f::new(x / w, y / w, z / w)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        let x = v[0] * self.matrix[(0, 0)] + v[1] * self.matrix[(0, 1)] + v[2] * self.matrix[(0, 2)];
        let y = v[0] * self.matrix[(1, 0)] + v[1] * self.matrix[(1, 1)] + v[2] * self.matrix[(1, 2)];
        let z = v[0] * self.matrix[(2, 0)] + v[1] * self.matrix[(2, 1)] + v[2] * self.matrix[(2, 2)];

        Vector3f::new(x, y, z)
    }

    // Normal transformation is different from point transformation.
    // Before transformation, we have n^Tx = 0
    // After transformation, we have (Sn)^T(Mx) = 0
    // Then, we will get: S = (M^{-1})^T
    pub fn apply_normal(&self, n: Vector3f) -> Vector3f {
        let transpose_inv = self.inv_matrix.transpose();
        let x = n[0] * transpose_inv[(0, 0)] + n[1] * transpose_inv[(0, 1)] + n[2] * transpose_inv[(0, 2)];
        let y = n[0] * transpose_inv[(1, 0)] + n[1] * transpose_inv[(1, 1)] + n[2] * transpose_inv[(1, 2)];
        let z = n[0] * transpose_inv[(2, 0)] + n[1] * transpose_inv[(2, 1)] + n[2] * transpose_inv[(2, 2)];

        Vector3f::new(x, y, z)
    }

    /// Largest axis scale factor, used to scale point/line radii.
    pub fn max_scale(&self) -> Float {
        let sx = self.apply_vector(Vector3f::new(1.0, 0.0, 0.0)).norm();
        let sy = self.apply_vector(Vector3f::new(0.0, 1.0, 0.0)).norm();
        let sz = self.apply_vector(Vector3f::new(0.0, 0.0, 1.0)).norm();
        sx.max(sy).max(sz)
    }
}

/* Tests for Transform */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_scale() {
        let t = Transform::from_translate_scale(Vector3f::new(1.0, 2.0, 3.0),
                                                Vector3f::new(2.0, 2.0, 2.0));
        let p = t.apply_point(Vector3f::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vector3f::new(3.0, 4.0, 5.0));

        let v = t.apply_vector(Vector3f::new(1.0, 0.0, 0.0));
        assert_eq!(v, Vector3f::new(2.0, 0.0, 0.0));
        assert!((t.max_scale() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_normal_under_nonuniform_scale() {
        let t = Transform::from_translate_scale(Vector3f::zeros(),
                                                Vector3f::new(2.0, 1.0, 1.0));
        // A normal of a plane spanning y-z stays along x after scaling x.
        let n = t.apply_normal(Vector3f::new(1.0, 0.0, 0.0)).normalize();
        assert!((n - Vector3f::new(1.0, 0.0, 0.0)).norm() < 1e-6);
    }
}
