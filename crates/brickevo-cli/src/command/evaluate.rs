use std::path::PathBuf;

use serde::Serialize;

use crate::{
    export::PolicyFile,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Policy file: a `best.json` snapshot or a bare policy
    policy: PathBuf,
    /// Evaluation seed (defaults to the seed stored in the snapshot)
    #[arg(long)]
    seed: Option<u32>,
    /// Episodes per evaluation (defaults to the snapshot's GA params)
    #[arg(long)]
    episodes: Option<usize>,
    /// Step limit of each episode (defaults to the snapshot's GA params)
    #[arg(long)]
    horizon: Option<usize>,
    /// Game config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the evaluation as JSON to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EvaluationSummary {
    seed: u32,
    fitness: f64,
    episodes: Vec<brickevo_evaluator::episode::EpisodeOutcome>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        policy,
        seed,
        episodes,
        horizon,
        config,
        output,
    } = arg;

    let file = PolicyFile::read(policy)?;
    let config = util::load_game_config(config.as_deref())?;
    let seed = seed.or(file.seed()).unwrap_or_default();
    let policy = file.policy();
    let evaluator = file.evaluator(config, *episodes, *horizon);

    eprintln!("Evaluating {policy}");
    eprintln!(
        "  Seed: {seed}, episodes: {}, horizon: {}",
        evaluator.episodes(),
        evaluator.horizon()
    );

    let evaluation = evaluator.evaluate(&policy, seed);
    for (i, outcome) in evaluation.episodes.iter().enumerate() {
        eprintln!(
            "  Episode #{i} (seed {}): {}/{} bricks, {} lives, reward {:.3}, {} steps{}",
            outcome.seed,
            outcome.destroyed,
            outcome.total_bricks,
            outcome.lives,
            outcome.reward,
            outcome.steps,
            if outcome.cleared { ", cleared" } else { "" },
        );
    }
    eprintln!("  Fitness: {:.3}", evaluation.fitness);

    if output.is_some() {
        let summary = EvaluationSummary {
            seed,
            fitness: evaluation.fitness,
            episodes: evaluation.episodes,
        };
        Output::save_json(&summary, output.clone())?;
    }
    Ok(())
}
