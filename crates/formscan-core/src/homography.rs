use nalgebra::{Matrix3, Point2, RowSVector, SMatrix, SVector, Vector2, Vector3};

/// Smallest magnitude accepted for a homogeneous scale (`w`, `h33`, triangle area).
const EPS: f64 = 1e-12;

/// Errors produced while estimating or applying a homography.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomographyError {
    #[error("degenerate point configuration: {reason}")]
    DegenerateConfiguration { reason: &'static str },
    #[error("transform undefined: point maps to infinity")]
    TransformUndefined,
}

/// Planar projective transform `dst ~ H * src`.
///
/// Built once from a successful estimation and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Row-major construction, as stored in template files.
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// Map `p` through the transform, dividing by the homogeneous `w`.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Result<Point2<f64>, HomographyError> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if w.abs() < EPS {
            return Err(HomographyError::TransformUndefined);
        }
        let out = Point2::new(v[0] / w, v[1] / w);
        if !(out.x.is_finite() && out.y.is_finite()) {
            return Err(HomographyError::TransformUndefined);
        }
        Ok(out)
    }
}

/// Move the centroid to the origin and scale the mean distance to sqrt(2).
///
/// Returns the normalized points and the similarity that produced them.
fn normalize(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let centroid = pts.iter().fold(Vector2::<f64>::zeros(), |acc, p| acc + p.coords) / 4.0;
    let mean_dist = pts.iter().map(|p| (p.coords - centroid).norm()).sum::<f64>() / 4.0;
    let scale = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let mut t = Matrix3::from_diagonal(&Vector3::new(scale, scale, 1.0));
    t[(0, 2)] = -scale * centroid.x;
    t[(1, 2)] = -scale * centroid.y;

    (pts.map(|p| Point2::from((p.coords - centroid) * scale)), t)
}

/// True if any three of the four (normalized) points are collinear.
fn has_collinear_triple(pts: &[Point2<f64>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let ab = pts[b] - pts[a];
        let ac = pts[c] - pts[a];
        (ab.x * ac.y - ab.y * ac.x).abs() < 1e-9
    })
}

/// Two rows of the 8x8 system for one correspondence, unknowns
/// `[h11 h12 h13 h21 h22 h23 h31 h32]` with `h33 = 1`.
fn dlt_rows(s: Point2<f64>, d: Point2<f64>) -> (RowSVector<f64, 8>, RowSVector<f64, 8>) {
    let (x, y, u, v) = (s.x, s.y, d.x, d.y);
    (
        RowSVector::<f64, 8>::from_row_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y]),
        RowSVector::<f64, 8>::from_row_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y]),
    )
}

/// Compute `H` such that `dst ~ H * src` from exactly four correspondences.
///
/// Both point sets are Hartley-normalized before the 8x8 solve (with
/// `h33 = 1`). Fails when three points of either set are collinear or the
/// linear system is singular.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, HomographyError> {
    let (src_n, t_src) = normalize(src);
    let (dst_n, t_dst) = normalize(dst);

    if has_collinear_triple(&src_n) {
        return Err(HomographyError::DegenerateConfiguration {
            reason: "three source points are collinear",
        });
    }
    if has_collinear_triple(&dst_n) {
        return Err(HomographyError::DegenerateConfiguration {
            reason: "three destination points are collinear",
        });
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (k, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (row_u, row_v) = dlt_rows(*s, *d);
        a.set_row(2 * k, &row_u);
        a.set_row(2 * k + 1, &row_v);
        b[2 * k] = d.x;
        b[2 * k + 1] = d.y;
    }

    let singular = HomographyError::DegenerateConfiguration {
        reason: "singular linear system",
    };
    let sol = a.lu().solve(&b).ok_or(singular)?;
    let hn = Matrix3::from_iterator(sol.iter().copied().chain(std::iter::once(1.0))).transpose();

    // H = T_dst^{-1} * Hn * T_src
    let t_dst_inv = t_dst.try_inverse().ok_or(singular)?;
    let h = t_dst_inv * hn * t_src;

    let s = h[(2, 2)];
    if s.abs() < EPS || h.iter().any(|v| !v.is_finite()) {
        return Err(singular);
    }

    Ok(Homography::new(h / s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground_truth() -> Homography {
        Homography::new(Matrix3::new(
            0.97, -0.04, 35.0, //
            0.03, 1.02, -12.0, //
            0.00012, 0.00008, 1.0,
        ))
    }

    #[test]
    fn four_point_estimate_reproduces_destinations() {
        let h0 = ground_truth();
        let src = [
            Point2::new(40.0, 30.0),
            Point2::new(1200.0, 45.0),
            Point2::new(1180.0, 1650.0),
            Point2::new(55.0, 1630.0),
        ];
        let dst = src.map(|p| h0.apply(p).expect("finite"));

        let recovered = homography_from_4pt(&src, &dst).expect("recoverable");

        for (s, d) in src.iter().zip(dst.iter()) {
            let mapped = recovered.apply(*s).expect("finite");
            assert_relative_eq!(mapped, *d, max_relative = 1e-6);
        }
        let bubble = Point2::new(612.0, 904.0);
        assert_relative_eq!(
            recovered.apply(bubble).unwrap(),
            h0.apply(bubble).unwrap(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn collinear_sources_are_degenerate() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 50.0),
        ];
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let err = homography_from_4pt(&src, &dst).unwrap_err();
        assert!(matches!(err, HomographyError::DegenerateConfiguration { .. }));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let src = [Point2::new(3.0, 4.0); 4];
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_err());
    }

    #[test]
    fn point_on_line_at_infinity_is_undefined() {
        // w = x - 10, so x = 10 maps to infinity
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -10.0]]);
        assert_eq!(
            h.apply(Point2::new(10.0, 3.0)),
            Err(HomographyError::TransformUndefined)
        );
        assert!(h.apply(Point2::new(11.0, 3.0)).is_ok());
    }

    #[test]
    fn identity_keeps_points() {
        let p = Point2::new(12.5, -7.25);
        assert_eq!(Homography::identity().apply(p).unwrap(), p);
    }

    #[test]
    fn from_array_is_row_major() {
        let h = Homography::from_array([[1.0, 0.0, 7.0], [0.0, 1.0, -2.0], [0.0, 0.0, 1.0]]);
        assert_eq!(h.apply(Point2::new(0.0, 0.0)).unwrap(), Point2::new(7.0, -2.0));
    }
}
