mod cli;
mod display;
mod error;

use std::path::Path;

use clap::Parser;
use cli::{Cli, RunCommand};
use error::H2CliResult;
use h2latam::config::Config;
use log::debug;

const DEFAULT_LOGGING_LEVEL: &str = "warn";

fn main() -> H2CliResult<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config = args.apply_overrides(read_config_from_toml()?);
    debug!("config: {config:?}");

    if let Some(command) = args.command {
        command.run(config)?;
    }
    Ok(())
}

fn read_config_from_toml() -> H2CliResult<Config> {
    // macOS: ~/Library/Application Support/h2latam/config.toml
    match dirs::config_dir() {
        Some(dir) => read_config_file(&dir.join("h2latam").join("config.toml")),
        None => Ok(Config::default()),
    }
}

fn read_config_file(file_path: &Path) -> H2CliResult<Config> {
    match std::fs::read_to_string(file_path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::H2CliError;

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_file_is_read() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_path = \"facilities.csv\"").unwrap();
        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.data_path, "facilities.csv");
        assert_eq!(config.sheet, None);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_path = ").unwrap();
        assert!(matches!(
            read_config_file(file.path()),
            Err(H2CliError::TomlError(_))
        ));
    }
}
