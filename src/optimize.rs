use rand::Rng;
use tracing::warn;

use crate::molecule::Molecule;
use crate::mopac::MopacError;

/// energy reported when the calculator is unavailable
pub const MOCK_ENERGY: f64 = -1234.56;

/// half-width of the uniform jitter applied to each fallback coordinate
pub const JITTER: f64 = 0.5;

/// Energy and optimized geometry reported by a calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct CalcOutput {
    pub energy: f64,
    pub geometry: Vec<[f64; 3]>,
}

pub trait Calculator {
    fn optimize(&self, molecule: &Molecule) -> Result<CalcOutput, MopacError>;
}

/// Which branch produced an [Optimized] result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Real,
    Fallback,
}

impl Method {
    pub fn tag(&self) -> &'static str {
        match self {
            Method::Real => "MOPAC PM7",
            Method::Fallback => "Simulation (calculator not found)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    pub energy: f64,
    pub geometry: Vec<[f64; 3]>,
    pub method: Method,
}

/// Run a geometry optimization through `calc`. This never fails: any
/// calculator error is logged and replaced by the simulation fallback, a
/// copy of the input geometry jittered by up to [JITTER] per coordinate
/// with the fixed [MOCK_ENERGY].
pub fn run_optimization(calc: &dyn Calculator, molecule: &Molecule) -> Optimized {
    match calc.optimize(molecule) {
        Ok(out) => Optimized {
            energy: out.energy,
            geometry: out.geometry,
            method: Method::Real,
        },
        Err(e) => {
            warn!("MOPAC failed ({e}), falling back to simulation");
            let mut rng = rand::thread_rng();
            let geometry = molecule
                .geometry()
                .iter()
                .map(|c| {
                    [
                        c[0] + rng.gen_range(-JITTER..=JITTER),
                        c[1] + rng.gen_range(-JITTER..=JITTER),
                        c[2] + rng.gen_range(-JITTER..=JITTER),
                    ]
                })
                .collect();
            Optimized {
                energy: MOCK_ENERGY,
                geometry,
                method: Method::Fallback,
            }
        }
    }
}

/// minimal calculator standing in for a missing MOPAC install
#[cfg(test)]
pub(crate) struct NoMopac;

#[cfg(test)]
impl Calculator for NoMopac {
    fn optimize(&self, _: &Molecule) -> Result<CalcOutput, MopacError> {
        Err(MopacError::NoEnergy("missing.aux".into()))
    }
}

/// minimal calculator returning a fixed result
#[cfg(test)]
pub(crate) struct FixedCalc(pub CalcOutput);

#[cfg(test)]
impl Calculator for FixedCalc {
    fn optimize(&self, _: &Molecule) -> Result<CalcOutput, MopacError> {
        Ok(self.0.clone())
    }
}
