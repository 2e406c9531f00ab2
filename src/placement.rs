//! Node placement samplers for positions and rotation angles.
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// How positions are assigned to a group of nodes.
#[derive(Debug, PartialEq, Clone)]
pub enum Placement {
    /// No positions, e.g. for virtual nodes.
    None,
    /// Positions uniform in a vertical cylindrical column centered at
    /// `center`, with random rotation angles around the y and z axes.
    Column {
        center: [f64; 3],
        max_radius: f64,
        height: f64,
    },
}

/// Sample `n` positions uniformly distributed in a vertical cylindrical column.
///
/// The column extends `height / 2` above and below `center` along the y axis.
/// Radii are drawn as the square root of a uniform sample so the positions
/// are uniform over the disk rather than clustered at the center.
pub fn column_positions<R: Rng>(
    n: usize,
    center: [f64; 3],
    max_radius: f64,
    height: f64,
    rng: &mut R,
) -> Vec<[f64; 3]> {
    let phi_dist = Uniform::new(0.0, 2.0 * std::f64::consts::PI);
    let r_dist = Uniform::new_inclusive(0.0, 1.0f64);
    let y_dist = Uniform::new_inclusive(center[1] - height / 2.0, center[1] + height / 2.0);

    (0..n)
        .map(|_| {
            let phi = phi_dist.sample(rng);
            let r = max_radius * r_dist.sample(rng).sqrt();
            [
                center[0] + r * phi.cos(),
                y_dist.sample(rng),
                center[2] + r * phi.sin(),
            ]
        })
        .collect()
}

/// Sample `n` values uniformly in `[min, max)`, e.g. random rotation angles.
pub fn rand_range<R: Rng>(n: usize, min: f64, max: f64, rng: &mut R) -> Vec<f64> {
    let dist = Uniform::new(min, max);
    (0..n).map(|_| dist.sample(rng)).collect()
}
