use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::molecule::Molecule;
use crate::optimize::{CalcOutput, Calculator};

/// kcal/mol per eV
const KCALEV: f64 = 23.060547830619026;

#[derive(Debug, Error)]
pub enum MopacError {
    #[error("io error in scratch directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command:?} exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("no energy found in {0:?}")]
    NoEnergy(PathBuf),

    #[error("failed to parse energy {0:?}")]
    BadEnergy(String),

    #[error("expected {want} optimized atoms, found {got}")]
    BadGeometry { want: usize, got: usize },
}

/// Mopac holds the information needed to run one MOPAC job. `filename`
/// should not include an extension. `.mop` will be appended for the input
/// file, and `.aux` will be appended for the output read back after a run.
#[derive(Debug)]
pub struct Mopac {
    pub filename: PathBuf,
    pub molecule: Molecule,
}

pub fn geom_string(molecule: &Molecule) -> String {
    let mut ret = String::new();
    for atom in &molecule.atoms {
        ret.push_str(&atom.to_string());
        ret.push('\n');
    }
    ret
}

impl Mopac {
    pub fn new(dir: &Path, molecule: Molecule) -> Self {
        Self {
            filename: dir.join("calc"),
            molecule,
        }
    }

    fn infile(&self) -> PathBuf {
        self.filename.with_extension("mop")
    }

    fn auxfile(&self) -> PathBuf {
        self.filename.with_extension("aux")
    }

    pub fn write_input(&self) -> Result<(), MopacError> {
        let geom = geom_string(&self.molecule);
        let symbol = &self.molecule.symbol;
        let mut file = File::create(self.infile())?;
        write!(
            file,
            "aux(precision=14) PM7 OPT
{symbol}

{geom}"
        )?;
        Ok(())
    }

    /// Run `command` on the written input file. MOPAC puts its output files
    /// next to the input, so no working directory shuffling is needed.
    pub fn run(&self, command: &str) -> Result<(), MopacError> {
        let output = Command::new(command).arg(self.infile()).output().map_err(
            |source| MopacError::Spawn {
                command: command.to_string(),
                source,
            },
        )?;
        if !output.status.success() {
            return Err(MopacError::Failed {
                command: command.to_string(),
                status: output.status,
            });
        }
        Ok(())
    }

    /// Read the final heat of formation (converted to eV) and the optimized
    /// coordinates from the aux file. MOPAC repeats `HEAT_OF_FORMATION` as
    /// the optimization proceeds; the last occurrence is the final value.
    pub fn read_output(&self) -> Result<CalcOutput, MopacError> {
        let auxfile = self.auxfile();
        let f = BufReader::new(File::open(&auxfile)?);
        let mut energy = None;
        let mut geometry: Vec<[f64; 3]> = Vec::new();
        let mut in_coords = false;
        for line in f.lines() {
            let line = line?;
            if line.contains("HEAT_OF_FORMATION") {
                // line like HEAT_OF_FORMATION:KCAL/MOL=+0.97127947459164715838D+02
                let field = line
                    .split('=')
                    .nth(1)
                    .ok_or_else(|| MopacError::BadEnergy(line.clone()))?;
                let kcal = field
                    .trim()
                    .replace('D', "E")
                    .parse::<f64>()
                    .map_err(|_| MopacError::BadEnergy(field.to_string()))?;
                energy = Some(kcal / KCALEV);
                in_coords = false;
            } else if line.contains("ATOM_X_OPT") {
                geometry.clear();
                in_coords = true;
            } else if in_coords {
                let fields: Vec<f64> = line
                    .split_whitespace()
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if fields.len() == 3 {
                    geometry.push([fields[0], fields[1], fields[2]]);
                } else {
                    in_coords = false;
                }
            }
        }
        let energy = energy.ok_or(MopacError::NoEnergy(auxfile))?;
        if geometry.len() != self.molecule.len() {
            return Err(MopacError::BadGeometry {
                want: self.molecule.len(),
                got: geometry.len(),
            });
        }
        Ok(CalcOutput { energy, geometry })
    }
}

/// Runs the real MOPAC binary, one fresh scratch directory per job. The
/// directory is removed when the job finishes, on every exit path.
#[derive(Debug, Clone)]
pub struct MopacCalculator {
    command: String,
}

impl MopacCalculator {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl Calculator for MopacCalculator {
    fn optimize(&self, molecule: &Molecule) -> Result<CalcOutput, MopacError> {
        let dir = tempfile::tempdir()?;
        let job = Mopac::new(dir.path(), molecule.clone());
        job.write_input()?;
        job.run(&self.command)?;
        job.read_output()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use approx::assert_abs_diff_eq;

    use super::*;

    fn water() -> Molecule {
        Molecule::new("H2O", &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]])
            .unwrap()
    }

    #[test]
    fn test_write_input() {
        let dir = tempfile::tempdir().unwrap();
        let job = Mopac::new(dir.path(), water());
        job.write_input().unwrap();
        let got = fs::read_to_string(job.infile()).expect("file not found");
        let want = "aux(precision=14) PM7 OPT
H2O

H     0.0000000000 1    0.0000000000 1    0.0000000000 1
H     0.0000000000 1    0.0000000000 1    1.0000000000 1
O     0.0000000000 1    1.0000000000 1    0.0000000000 1
";
        assert_eq!(got, want);
    }

    #[test]
    fn test_read_output() {
        let job = Mopac {
            filename: PathBuf::from("test_files/job"),
            molecule: water(),
        };
        let got = job.read_output().expect("expected a value");
        let want = -0.57079920000000e+02 / KCALEV;
        assert_abs_diff_eq!(got.energy, want, epsilon = 1e-12);
        assert_eq!(got.geometry.len(), 3);
        assert_abs_diff_eq!(got.geometry[0][1], 0.7493, epsilon = 1e-12);
        assert_abs_diff_eq!(got.geometry[2][2], -0.0656, epsilon = 1e-12);
    }

    #[test]
    fn test_read_output_missing() {
        let job = Mopac {
            filename: PathBuf::from("test_files/nonexistent"),
            molecule: water(),
        };
        assert!(matches!(job.read_output(), Err(MopacError::Io(_))));
    }

    #[test]
    fn test_run_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let job = Mopac::new(dir.path(), water());
        job.write_input().unwrap();
        let got = job.run("definitely-not-mopac");
        assert!(matches!(got, Err(MopacError::Spawn { .. })));
    }
}
