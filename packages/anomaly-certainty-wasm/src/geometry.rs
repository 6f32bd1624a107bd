// Planar geometry kernel. Coordinates are (lon, lat) degrees treated as flat x/y.
use geo_types::Coord;

// Added to the ray-casting denominator so horizontal edges never divide by zero.
// Near-horizontal edges can be classified inconsistently as a result.
const HORIZONTAL_EDGE_EPSILON: f64 = 1e-12;

/// Ray casting containment test against an implicitly closed ring.
///
/// A horizontal ray is cast from `point` and the inside flag toggles on every
/// edge it crosses. Points lying exactly on an edge get whatever answer the
/// crossing arithmetic produces.
pub fn point_in_polygon(point: Coord<f64>, polygon: &[Coord<f64>]) -> bool {
    let mut inside = false;
    let x = point.x;
    let y = point.y;
    let n = polygon.len();

    for i in 0..n {
        let j = (i + 1) % n;
        let xi = polygon[i].x;
        let yi = polygon[i].y;
        let xj = polygon[j].x;
        let yj = polygon[j].y;

        let intersect = ((yi > y) != (yj > y))
            && (x < (xj - xi) * (y - yi) / (yj - yi + HORIZONTAL_EDGE_EPSILON) + xi);

        if intersect {
            inside = !inside;
        }
    }

    inside
}

/// Shortest Euclidean distance from `point` to the segment `a`-`b`, in input units.
pub fn distance_point_to_segment(point: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ap = point - a;
    let ab = b - a;

    let ab_len_sq = ab.x * ab.x + ab.y * ab.y;
    if ab_len_sq == 0.0 {
        // Zero-length segment
        return ap.x.hypot(ap.y);
    }

    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    let d = point - closest;
    d.x.hypot(d.y)
}
