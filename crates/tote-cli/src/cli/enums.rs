use clap::ValueEnum;
use tote_config::BuildMode;

/// Build mode selected on the command line
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ModeArg {
    /// Plain names, no optimization passes
    #[value(name = "development", alias = "dev")]
    Development,

    /// Content-hashed names, chunk splitting and minification
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => BuildMode::Development,
            ModeArg::Production => BuildMode::Production,
        }
    }
}
