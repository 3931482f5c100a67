use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;

/// Radius queries over the representative points of a target's leaves.
pub struct LeafEnvironment {
    points: Vec<[f64; 3]>,
    tree: Option<KdTree<f64, 3>>,
}

impl LeafEnvironment {
    pub fn new(points: &[Point3<f64>]) -> Self {
        let points: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree = (!points.is_empty()).then(|| (&points).into());
        Self { points, tree }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of all points within `radius` of point `center`, including `center` itself,
    /// in ascending index order.
    pub fn around(&self, center: usize, radius: f64) -> Vec<usize> {
        let (Some(tree), Some(query)) = (&self.tree, self.points.get(center)) else {
            return Vec::new();
        };
        let mut indices: Vec<usize> = tree
            .within_unsorted::<SquaredEuclidean>(query, radius * radius)
            .into_iter()
            .map(|neighbour| neighbour.item as usize)
            .collect();
        indices.sort_unstable();
        indices
    }
}
