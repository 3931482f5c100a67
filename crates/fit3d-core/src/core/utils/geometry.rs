use itertools::Itertools;
use nalgebra::{Point3, Rotation3, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Largest distance between any two points; 0 for fewer than two points.
pub fn max_pairwise_distance(points: &[Point3<f64>]) -> f64 {
    points
        .iter()
        .tuple_combinations()
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_empty_slice_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_averages_coordinates() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -6.0)];
        assert_eq!(centroid(&points).unwrap(), Point3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn calculate_rmsd_rejects_mismatched_lengths() {
        let a = [Point3::origin()];
        let b = [Point3::origin(), Point3::origin()];
        assert!(calculate_rmsd(&a, &b).is_none());
        assert!(calculate_rmsd(&[], &[]).is_none());
    }

    #[test]
    fn calculate_rmsd_of_shifted_points() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let b = [Point3::new(0.0, 3.0, 0.0), Point3::new(1.0, 3.0, 0.0)];
        assert!((calculate_rmsd(&a, &b).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn max_pairwise_distance_finds_farthest_pair() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
        ];
        assert!((max_pairwise_distance(&points) - 26.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(max_pairwise_distance(&points[..1]), 0.0);
    }

    #[test]
    fn rotation_from_axis_angle_uses_degrees() {
        let rotation = rotation_from_axis_angle(&Vector3::z(), 90.0);
        let rotated = rotation * Vector3::x();
        assert!((rotated - Vector3::y()).norm() < 1e-12);
    }
}
