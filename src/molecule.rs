use std::fmt::{self, Display};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MoleculeError {
    #[error("cannot parse chemical formula {0:?}")]
    BadFormula(String),

    #[error("formula {symbol:?} implies {want} atoms but geometry has {got}")]
    GeometryMismatch {
        symbol: String,
        want: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub label: String,
    pub coord: [f64; 3],
}

impl Atom {
    pub fn new(label: String, coord: [f64; 3]) -> Self {
        Self { label, coord }
    }
}

/// MOPAC geometry line with optimization flags on all three coordinates
impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:2} {:15.10} 1 {:15.10} 1 {:15.10} 1",
            self.label, self.coord[0], self.coord[1], self.coord[2]
        )
    }
}

/// In-memory molecular structure built from a formula token and a geometry.
/// Construction fails if the formula is unparseable or its atom count
/// disagrees with the number of coordinate triples.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub symbol: String,
    pub atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(symbol: &str, geometry: &[[f64; 3]]) -> Result<Self, MoleculeError> {
        let labels = parse_formula(symbol)?;
        if labels.len() != geometry.len() {
            return Err(MoleculeError::GeometryMismatch {
                symbol: symbol.to_string(),
                want: labels.len(),
                got: geometry.len(),
            });
        }
        let atoms = labels
            .into_iter()
            .zip(geometry)
            .map(|(label, &coord)| Atom::new(label, coord))
            .collect();
        Ok(Self {
            symbol: symbol.to_string(),
            atoms,
        })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn geometry(&self) -> Vec<[f64; 3]> {
        self.atoms.iter().map(|a| a.coord).collect()
    }
}

/// expand a formula like "H2O" into one element label per atom: [H, H, O]
pub fn parse_formula(symbol: &str) -> Result<Vec<String>, MoleculeError> {
    let bad = || MoleculeError::BadFormula(symbol.to_string());
    let mut labels = Vec::new();
    let mut chars = symbol.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_ascii_uppercase() {
            return Err(bad());
        }
        let mut label = String::from(c);
        if let Some(&l) = chars.peek() {
            if l.is_ascii_lowercase() {
                label.push(l);
                chars.next();
            }
        }
        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }
        let count = if digits.is_empty() {
            1
        } else {
            digits.parse::<usize>().map_err(|_| bad())?
        };
        if count == 0 {
            return Err(bad());
        }
        for _ in 0..count {
            labels.push(label.clone());
        }
    }
    if labels.is_empty() {
        return Err(bad());
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formula() {
        let got = parse_formula("H2O").unwrap();
        let want = vec!["H", "H", "O"];
        assert_eq!(got, want);

        let got = parse_formula("CH4").unwrap();
        let want = vec!["C", "H", "H", "H", "H"];
        assert_eq!(got, want);

        let got = parse_formula("NaCl").unwrap();
        let want = vec!["Na", "Cl"];
        assert_eq!(got, want);

        assert!(parse_formula("").is_err());
        assert!(parse_formula("h2o").is_err());
        assert!(parse_formula("H0").is_err());
        assert!(parse_formula("2H").is_err());
    }

    #[test]
    fn test_new_molecule() {
        let mol =
            Molecule::new("H2O", &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]).unwrap();
        assert_eq!(mol.len(), 3);
        assert_eq!(mol.atoms[0].label, "H");
        assert_eq!(mol.atoms[2].label, "O");
        assert_eq!(mol.atoms[2].coord, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_geometry_mismatch() {
        let got = Molecule::new("H2O", &[[0.0, 0.0, 0.0]]).unwrap_err();
        let want = MoleculeError::GeometryMismatch {
            symbol: "H2O".to_string(),
            want: 3,
            got: 1,
        };
        assert_eq!(got, want);
    }

    #[test]
    fn test_atom_display() {
        let got = Atom::new("O".to_string(), [0.0, 1.0, -0.5]).to_string();
        let want = "O     0.0000000000 1    1.0000000000 1   -0.5000000000 1";
        assert_eq!(got, want);
    }
}
