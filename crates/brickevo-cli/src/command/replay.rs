use std::path::PathBuf;

use brickevo_evaluator::episode;
use brickevo_training::params::GaParams;

use crate::{
    export::{PolicyFile, ReplayFile},
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Policy file: a `best.json` snapshot or a bare policy
    policy: PathBuf,
    /// Episode seed (defaults to the seed stored in the snapshot)
    #[arg(long)]
    seed: Option<u32>,
    /// Step limit of the episode (defaults to the snapshot's GA params)
    #[arg(long)]
    horizon: Option<usize>,
    /// Game config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        policy,
        seed,
        horizon,
        config,
        output,
    } = arg;

    let file = PolicyFile::read(policy)?;
    let config = util::load_game_config(config.as_deref())?;
    let seed = seed.or(file.seed()).unwrap_or_default();
    let horizon = horizon
        .or(file.params().map(|p| p.horizon))
        .unwrap_or(GaParams::default().horizon);

    let mut steps = vec![];
    let outcome =
        episode::play_episode_with(&file.policy(), &config, seed, horizon, |s| steps.push(*s));
    Output::save_json(&ReplayFile::new(None, steps), output.clone())?;

    eprintln!(
        "Replay recorded: {} steps, {}/{} bricks, {} lives left",
        outcome.steps, outcome.destroyed, outcome.total_bricks, outcome.lives
    );
    Ok(())
}
