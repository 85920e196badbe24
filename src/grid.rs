use glam::{DVec3, IVec3};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::particle::{Particle, ParticleStore};

// Upper bound on the number of buckets one index may allocate.
const MAX_CELLS: i64 = 1 << 24;

/// A particle found by a neighbour query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    /// Minimum-image vector from the query point to the particle.
    pub displacement: DVec3,
}

impl Neighbor {
    pub fn distance(&self) -> f64 {
        self.displacement.length()
    }
}

/// Bucket grid over a [`Domain`] holding particle ids only.
///
/// Cells are `cell_size` wide on non-periodic axes. On periodic axes the
/// extent is split into a whole number of cells, each at least `cell_size`
/// wide, so the grid tiles the box exactly. Points outside the box on a
/// non-periodic axis are filed into the nearest boundary cell.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    domain: Domain,
    cell_size: f64,
    cell_width: DVec3,
    grid_dims: IVec3,
    cells: Vec<Vec<usize>>, // Stores particle ids
}

impl SpatialIndex {
    pub fn new(domain: Domain, cell_size: f64) -> Result<Self> {
        if !(cell_size > 0.0) || !cell_size.is_finite() {
            return Err(Error::Configuration(format!("cell size must be positive, got {cell_size}")));
        }

        let extent = domain.extent();
        for axis in 0..3 {
            if domain.is_periodic(axis) && extent[axis] < 2.0 * cell_size {
                return Err(Error::Configuration(format!(
                    "periodic axis {axis} has extent {}, needs at least twice the search radius {cell_size}",
                    extent[axis]
                )));
            }
        }
        let mut grid_dims = IVec3::ONE;
        let mut cell_width = DVec3::splat(cell_size);
        for axis in 0..3 {
            let cells_along = extent[axis] / cell_size;
            let n = if domain.is_periodic(axis) { cells_along.floor() } else { cells_along.ceil() };
            if n > MAX_CELLS as f64 {
                return Err(Error::Configuration(format!(
                    "cell size {cell_size} is too small for domain extent {}",
                    extent[axis]
                )));
            }
            let n = (n as i32).max(1);
            grid_dims[axis] = n;
            if domain.is_periodic(axis) {
                cell_width[axis] = extent[axis] / n as f64;
            }
        }

        let total = grid_dims.x as i64 * grid_dims.y as i64 * grid_dims.z as i64;
        if total > MAX_CELLS {
            return Err(Error::Configuration(format!(
                "neighbour grid would need {total} cells, cell size {cell_size} is too small"
            )));
        }

        Ok(Self {
            domain,
            cell_size,
            cell_width,
            grid_dims,
            cells: vec![Vec::new(); total as usize],
        })
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn grid_dims(&self) -> IVec3 {
        self.grid_dims
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Clears the grid and files every particle by its wrapped position.
    pub fn rebuild(&mut self, particles: &ParticleStore) {
        self.clear();
        for p in particles {
            self.insert(p);
        }
    }

    pub fn insert(&mut self, particle: &Particle) {
        let idx = self.flat_index(self.cell_coords(particle.position));
        self.cells[idx].push(particle.id());
    }

    pub fn cell_coords(&self, position: DVec3) -> IVec3 {
        let relative_pos = self.domain.wrap(position) - self.domain.min();
        let mut coords = (relative_pos / self.cell_width).floor().as_ivec3();
        for axis in 0..3 {
            let n = self.grid_dims[axis];
            coords[axis] = if self.domain.is_periodic(axis) {
                coords[axis].rem_euclid(n)
            } else {
                coords[axis].clamp(0, n - 1)
            };
        }
        coords
    }

    fn flat_index(&self, coords: IVec3) -> usize {
        (coords.x + coords.y * self.grid_dims.x + coords.z * self.grid_dims.x * self.grid_dims.y) as usize
    }

    // Cell coordinates along one axis that can hold a particle within `reach` cells.
    fn axis_candidates(&self, axis: usize, center: i32, reach: i32) -> Vec<i32> {
        let n = self.grid_dims[axis];
        if self.domain.is_periodic(axis) {
            if 2 * reach + 1 >= n {
                return (0..n).collect();
            }
            (center - reach..=center + reach).map(|c| c.rem_euclid(n)).collect()
        } else {
            ((center - reach).max(0)..=(center + reach).min(n - 1)).collect()
        }
    }

    /// Every particle whose minimum-image distance from `point` is strictly
    /// below `radius`, sorted by ascending id.
    ///
    /// For `radius <= cell_size` this scans the 3x3x3 block around the cell of
    /// `point`; larger radii widen the block. Periodic axes wrap the block
    /// around to the opposite face, non-periodic axes are cut at the boundary.
    pub fn query_neighbors(&self, point: DVec3, radius: f64, particles: &ParticleStore) -> Vec<Neighbor> {
        self.query(point, radius, None, particles)
    }

    /// Neighbours of particle `id` within `radius`, excluding the particle itself.
    pub fn query_neighbors_of(&self, id: usize, radius: f64, particles: &ParticleStore) -> Vec<Neighbor> {
        match particles.get(id) {
            Some(p) => self.query(p.position, radius, Some(id), particles),
            None => Vec::new(),
        }
    }

    fn query(&self, point: DVec3, radius: f64, exclude: Option<usize>, particles: &ParticleStore) -> Vec<Neighbor> {
        let mut neighbors = Vec::new();
        if !(radius > 0.0) {
            return neighbors;
        }

        let center = self.cell_coords(point);
        let reach = (radius / self.cell_width).ceil().as_ivec3().max(IVec3::ONE);
        let xs = self.axis_candidates(0, center.x, reach.x);
        let ys = self.axis_candidates(1, center.y, reach.y);
        let zs = self.axis_candidates(2, center.z, reach.z);

        for &z in &zs {
            for &y in &ys {
                for &x in &xs {
                    let idx = self.flat_index(IVec3::new(x, y, z));
                    for &j in &self.cells[idx] {
                        if exclude == Some(j) {
                            continue;
                        }
                        let other = &particles[j];
                        let displacement = self.domain.displacement(point, other.position);
                        if displacement.length() < radius {
                            neighbors.push(Neighbor { id: j, displacement });
                        }
                    }
                }
            }
        }

        // Contact sums are order sensitive, keep them reproducible
        neighbors.sort_unstable_by_key(|n| n.id);
        neighbors
    }
}
