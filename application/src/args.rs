//! [`Args`] definitions.

use clap::Parser;

/// Server of the sales aggregation and commission system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// Values of the file are overridden by the `CONF.`-prefixed environment
    /// variables (`CONF.SERVER.PORT=8080`).
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["application"]).unwrap();

        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn accepts_short_config_flag() {
        let args =
            Args::try_parse_from(["application", "-c", "prod.toml"]).unwrap();

        assert_eq!(args.config, "prod.toml");
    }
}
