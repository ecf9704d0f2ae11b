use nalgebra::Vector3;

use crate::particle::Particle;
use crate::particles::Particles;

/// Cell grid over the current particle positions, bounding the pairwise
/// candidate search to same-cell and adjacent-cell pairs.
///
/// Cell edges are at least the maximum interaction length, so any pair
/// able to interact is never split across non-adjacent cells (no false
/// negatives). Pairs from adjacent cells that are in fact too far apart
/// are false positives, rejected downstream by the exact closest-approach
/// test.
#[derive(Debug)]
pub struct SpatialGrid {
    min: Vector3<f64>,
    /// Per-axis cell edge length [fm].
    lengths: Vector3<f64>,
    dims: [usize; 3],
    cells: Vec<Vec<u64>>,
}

impl SpatialGrid {
    /// Build a fresh grid from the current positions. `min_cell_length`
    /// is the maximum interaction range.
    pub fn build(particles: &Particles, min_cell_length: f64) -> Self {
        let mut min = Vector3::repeat(f64::INFINITY);
        let mut max = Vector3::repeat(f64::NEG_INFINITY);
        for p in particles.iter() {
            let x = p.position.threevec();
            for k in 0..3 {
                min[k] = min[k].min(x[k]);
                max[k] = max[k].max(x[k]);
            }
        }
        if particles.is_empty() {
            min = Vector3::zeros();
            max = Vector3::zeros();
        }

        let mut dims = [1usize; 3];
        let mut lengths = Vector3::repeat(min_cell_length);
        for k in 0..3 {
            let extent = max[k] - min[k];
            // flooring keeps every edge at or above the interaction range
            let n = ((extent / min_cell_length).floor() as usize).max(1);
            dims[k] = n;
            lengths[k] = if extent > 0.0 { extent / n as f64 } else { min_cell_length };
        }

        let mut grid = Self {
            min,
            lengths,
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        };
        for p in particles.iter() {
            let idx = grid.cell_of(&p.position.threevec());
            grid.cells[idx].push(p.id);
        }
        grid
    }

    fn coords_of(&self, x: &Vector3<f64>) -> [usize; 3] {
        let mut c = [0usize; 3];
        for k in 0..3 {
            let i = ((x[k] - self.min[k]) / self.lengths[k]).floor() as isize;
            c[k] = i.clamp(0, self.dims[k] as isize - 1) as usize;
        }
        c
    }

    fn cell_of(&self, x: &Vector3<f64>) -> usize {
        let c = self.coords_of(x);
        (c[0] * self.dims[1] + c[1]) * self.dims[2] + c[2]
    }

    /// Ids of all particles in the same and adjacent cells, excluding the
    /// particle itself. Every true interaction partner appears here.
    pub fn neighbors(&self, particle: &Particle) -> Vec<u64> {
        let c = self.coords_of(&particle.position.threevec());
        let mut found = Vec::new();
        for dx in -1isize..=1 {
            for dy in -1isize..=1 {
                for dz in -1isize..=1 {
                    let nx = c[0] as isize + dx;
                    let ny = c[1] as isize + dy;
                    let nz = c[2] as isize + dz;
                    if nx < 0
                        || ny < 0
                        || nz < 0
                        || nx >= self.dims[0] as isize
                        || ny >= self.dims[1] as isize
                        || nz >= self.dims[2] as isize
                    {
                        continue;
                    }
                    let idx = (nx as usize * self.dims[1] + ny as usize) * self.dims[2]
                        + nz as usize;
                    for &id in &self.cells[idx] {
                        if id != particle.id {
                            found.push(id);
                        }
                    }
                }
            }
        }
        found
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fourvector::FourVector;
    use crate::random::{uniform, Engine};
    use crate::species::ParticleType;

    fn pion_at(x: f64, y: f64, z: f64) -> Particle {
        let pi = ParticleType::lookup("pi0").unwrap();
        Particle::on_shell(pi, FourVector::new(0.0, x, y, z), 0.0, 0.0, 0.0)
    }

    #[test]
    fn test_single_cell_grid() {
        let mut set = Particles::new();
        set.insert(pion_at(0.0, 0.0, 0.0));
        set.insert(pion_at(0.1, 0.0, 0.0));
        let grid = SpatialGrid::build(&set, 2.0);
        assert_eq!(grid.cell_count(), 1);
        let first = set.iter().next().unwrap();
        assert_eq!(grid.neighbors(first).len(), 1);
    }

    #[test]
    fn test_no_false_negatives() {
        // random positions; every pair closer than the range must see
        // each other through the grid
        let mut rng = Engine::new(77);
        let mut set = Particles::new();
        for _ in 0..200 {
            set.insert(pion_at(
                uniform(&mut rng, -10.0, 10.0),
                uniform(&mut rng, -10.0, 10.0),
                uniform(&mut rng, -10.0, 10.0),
            ));
        }
        let range = 2.5;
        let grid = SpatialGrid::build(&set, range);
        let all: Vec<&Particle> = set.iter().collect();
        for a in &all {
            let partners = grid.neighbors(a);
            for b in &all {
                if a.id == b.id {
                    continue;
                }
                let d = (a.position.threevec() - b.position.threevec()).norm();
                if d < range {
                    assert!(
                        partners.contains(&b.id),
                        "pair at distance {} < {} missed by the grid",
                        d,
                        range
                    );
                }
            }
        }
    }

    #[test]
    fn test_distant_pair_not_neighbors() {
        let mut set = Particles::new();
        let a = set.insert(pion_at(0.0, 0.0, 0.0));
        let _ = set.insert(pion_at(9.0, 9.0, 9.0));
        set.insert(pion_at(0.5, 0.0, 0.0));
        let grid = SpatialGrid::build(&set, 1.0);
        let first = set.get(a).unwrap();
        let partners = grid.neighbors(first);
        assert_eq!(partners.len(), 1);
    }
}
