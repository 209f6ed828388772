use std::path::PathBuf;

use brickevo_engine::GameConfig;
use brickevo_training::params::GaParams;

use crate::util::Output;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum ConfigKind {
    #[default]
    Game,
    Params,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DefaultConfigArg {
    /// Which defaults to print: `game` or `params`
    #[arg(long, default_value = "game")]
    kind: ConfigKind,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DefaultConfigArg) -> anyhow::Result<()> {
    let DefaultConfigArg { kind, output } = arg;
    match kind {
        ConfigKind::Game => Output::save_json(&GameConfig::default(), output.clone()),
        ConfigKind::Params => Output::save_json(&GaParams::default(), output.clone()),
    }
}
