use glam::DVec3;
use crate::error::Result;
use crate::particle::ParticleStore;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapshotParticle {
    pub id: usize,
    pub position: DVec3,
    pub radius: f64,
    pub velocity: DVec3,
}

/// Point-in-time copy of the particle state at an output boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub time: f64,
    pub particles: Vec<SnapshotParticle>,
}

impl Snapshot {
    pub fn capture(step: usize, time: f64, particles: &ParticleStore) -> Self {
        Self {
            step,
            time,
            particles: particles
                .iter()
                .map(|p| SnapshotParticle {
                    id: p.id(),
                    position: p.position,
                    radius: p.radius(),
                    velocity: p.velocity,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// Consumer of snapshots, e.g. a file writer.
pub trait SnapshotSink {
    fn write(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// Keeps every snapshot in memory.
impl SnapshotSink for Vec<Snapshot> {
    fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Drops every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&mut self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }
}

/// Notified once per output boundary.
pub trait ProgressSink {
    /// `index` counts output boundaries from 0 up to and including `total`.
    fn on_output(&mut self, index: usize, total: usize);
}

impl ProgressSink for () {
    fn on_output(&mut self, _index: usize, _total: usize) {}
}

impl ProgressSink for indicatif::ProgressBar {
    fn on_output(&mut self, index: usize, total: usize) {
        self.set_length(total as u64);
        self.set_position(index as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_copies_output_fields() {
        let mut store = ParticleStore::new();
        store.create(DVec3::new(1.0, 2.0, 3.0), 0.5, 1.0).unwrap().velocity = DVec3::X;
        let snapshot = Snapshot::capture(7, 0.5, &store);

        // Later mutation does not leak into the snapshot
        store.get_mut(0).unwrap().position = DVec3::ZERO;

        assert_eq!(snapshot.step, 7);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.particles[0].position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(snapshot.particles[0].velocity, DVec3::X);
        assert_eq!(snapshot.particles[0].radius, 0.5);
    }

    #[test]
    fn test_vec_sink_collects() {
        let store = ParticleStore::new();
        let mut sink: Vec<Snapshot> = Vec::new();
        sink.write(&Snapshot::capture(0, 0.0, &store)).unwrap();
        sink.write(&Snapshot::capture(10, 1.0, &store)).unwrap();
        assert_eq!(sink.iter().map(|s| s.step).collect::<Vec<_>>(), vec![0, 10]);
    }
}
