pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

use finlens_core::AnalysisConfig;

/// Command input from `--input`, else piped stdin. `None` when neither is
/// available so the caller can fall back to flags.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(file::read_file(p)?)),
        None => stdin::read_stdin(),
    }
}

/// Like [`load`], but input is mandatory.
pub fn require<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    load(path)?.ok_or_else(|| format!("{what} is required: pass --input <file> or pipe JSON on stdin").into())
}

/// Analysis settings from `--config`, or the defaults.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config: AnalysisConfig = match path {
        Some(p) => file::read_file(p)?,
        None => AnalysisConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
