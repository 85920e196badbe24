use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use glam::DVec3;
use crate::error::Result;
use crate::output::{Snapshot, SnapshotParticle, SnapshotSink};

fn write_triples<W: Write>(out: &mut W, header: &str, mut values: impl Iterator<Item = DVec3>) -> io::Result<()> {
    writeln!(out, "{header}")?;
    values.try_for_each(|v| writeln!(out, "{} {} {}", v.x, v.y, v.z))
}

fn write_scalars<W: Write, T: Display>(
    out: &mut W,
    name: &str,
    kind: &str,
    mut values: impl Iterator<Item = T>,
) -> io::Result<()> {
    writeln!(out, "SCALARS {name} {kind} 1\nLOOKUP_TABLE default")?;
    values.try_for_each(|v| writeln!(out, "{v}"))
}

/// Writes `snapshot` as legacy ASCII VTK polydata: one point per particle
/// carrying velocity, radius and id.
pub fn write_vtk(path: &Path, snapshot: &Snapshot) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let particles: &[SnapshotParticle] = &snapshot.particles;
    let n = particles.len();

    writeln!(
        out,
        "# vtk DataFile Version 3.0\nDEM snapshot step {} time {}\nASCII\nDATASET POLYDATA",
        snapshot.step, snapshot.time
    )?;
    write_triples(&mut out, &format!("POINTS {n} double"), particles.iter().map(|p| p.position))?;

    writeln!(out, "POINT_DATA {n}")?;
    write_triples(&mut out, "VECTORS velocity double", particles.iter().map(|p| p.velocity))?;
    write_scalars(&mut out, "radius", "double", particles.iter().map(|p| p.radius))?;
    write_scalars(&mut out, "id", "int", particles.iter().map(|p| p.id))?;

    out.flush()
}

/// Writes each snapshot to `<directory>/<prefix>_<index>.vtk`.
pub struct VtkWriter {
    directory: PathBuf,
    prefix: String,
    index: usize,
}

impl VtkWriter {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            prefix: prefix.into(),
            index: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.index
    }

    fn next_path(&self) -> PathBuf {
        self.directory.join(format!("{}_{:05}.vtk", self.prefix, self.index))
    }
}

impl SnapshotSink for VtkWriter {
    fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
        write_vtk(&self.next_path(), snapshot)?;
        self.index += 1;
        Ok(())
    }
}
