/// Runtime configuration, read from the environment with fixed defaults.
#[derive(Debug, PartialEq)]
pub struct Config {
    /// calculator executable, from MOPAC_COMMAND
    pub mopac_command: String,
    /// SQLite database path, from MOLOPT_DB
    pub database: String,
    /// bind address, from MOLOPT_ADDR
    pub addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            mopac_command: get("MOPAC_COMMAND")
                .unwrap_or_else(|| "mopac".to_string()),
            database: get("MOLOPT_DB")
                .unwrap_or_else(|| "molecules.db".to_string()),
            addr: get("MOLOPT_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let got = Config::from_lookup(|_| None);
        let want = Config {
            mopac_command: "mopac".to_string(),
            database: "molecules.db".to_string(),
            addr: "0.0.0.0:8000".to_string(),
        };
        assert_eq!(got, want);
    }

    #[test]
    fn test_overrides() {
        let got = Config::from_lookup(|k| match k {
            "MOPAC_COMMAND" => Some("/opt/mopac/mopac".to_string()),
            "MOLOPT_DB" => Some(":memory:".to_string()),
            _ => None,
        });
        assert_eq!(got.mopac_command, "/opt/mopac/mopac");
        assert_eq!(got.database, ":memory:");
        assert_eq!(got.addr, "0.0.0.0:8000");
    }
}
