use std::{
    io::{self, BufRead as _},
    path::PathBuf,
    thread,
};

use brickevo_evaluator::episode;
use brickevo_training::{
    observer::{self, RunObserver},
    run::{EvolutionRun, GenerationReport, PauseHandle, RunResult},
};

use crate::{export::RunContext, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Run seed
    #[arg(long, default_value_t = 1234)]
    seed: u32,
    /// Game config file (defaults are used for missing fields)
    #[arg(long)]
    config: Option<PathBuf>,
    /// GA parameter file (defaults are used for missing fields)
    #[arg(long)]
    params: Option<PathBuf>,
    /// Override the population size
    #[arg(long)]
    population: Option<usize>,
    /// Override the number of generations
    #[arg(long)]
    generations: Option<usize>,
    /// Override the episodes per evaluation
    #[arg(long)]
    episodes: Option<usize>,
    /// Override the step limit of each episode
    #[arg(long)]
    horizon: Option<usize>,
    /// Evaluate individuals on several threads
    #[arg(long)]
    parallel: bool,
    /// Directory receiving config/, logs/, best.json and replay/
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Also record a replay of the global best on its evaluation seed
    #[arg(long)]
    replay: bool,
    /// Toggle pause by pressing Enter
    #[arg(long)]
    interactive: bool,
}

/// Prints progress and feeds the export context.
struct TrainObserver {
    ctx: RunContext,
    interactive: bool,
    error: Option<anyhow::Error>,
}

impl TrainObserver {
    fn keep_first_error(&mut self, result: anyhow::Result<()>) {
        if let Err(err) = result {
            log::error!("export failed: {err:#}");
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }
}

impl RunObserver for TrainObserver {
    fn on_pause_handle(&mut self, handle: PauseHandle) {
        if !self.interactive {
            return;
        }
        eprintln!("Press Enter to pause or resume.");
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                if handle.toggle() {
                    eprintln!("Paused (evolution stops before the next generation).");
                } else {
                    eprintln!("Resumed.");
                }
            }
        });
    }

    fn on_generation(&mut self, report: &GenerationReport) {
        eprintln!(
            "Generation #{:3}: best {:10.3}  avg {:10.3}  worst {:10.3}  bricks {:2}/{}  [{} ms]",
            report.generation,
            report.best_fitness,
            report.average_fitness,
            report.worst_fitness,
            report.destroyed,
            report.total_bricks,
            report.elapsed.as_millis(),
        );
        if report.is_new_global_best {
            let global = &report.global_best;
            eprintln!(
                "  New global best: {:.3} (#{} seed {}) {}",
                global.fitness, global.index, global.seed, global.policy
            );
        }
        #[expect(clippy::cast_precision_loss)]
        let diversity = report
            .gene_stats
            .iter()
            .map(|s| s.normalized_std_dev)
            .sum::<f64>()
            / report.gene_stats.len().max(1) as f64;
        log::debug!(
            "generation {} gene means {:.3?}, mean normalized std dev {diversity:.3}",
            report.generation,
            report.gene_stats.iter().map(|s| s.mean).collect::<Vec<_>>(),
        );

        let result = self.ctx.record_generation(report);
        self.keep_first_error(result);
    }

    fn on_done(&mut self, result: &RunResult) {
        let outcome = self.ctx.finish(result);
        self.keep_first_error(outcome);
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        seed,
        config,
        params,
        population,
        generations,
        episodes,
        horizon,
        parallel,
        out_dir,
        replay,
        interactive,
    } = arg;

    let config = util::load_game_config(config.as_deref())?;
    let mut params = util::load_ga_params(params.as_deref())?;
    if let Some(population) = population {
        params.population = *population;
    }
    if let Some(generations) = generations {
        params.generations = *generations;
    }
    if let Some(episodes) = episodes {
        params.episodes = *episodes;
    }
    if let Some(horizon) = horizon {
        params.horizon = *horizon;
    }
    params.parallel |= *parallel;

    let run = EvolutionRun::new(config, params.clone(), *seed)?;
    let ctx = RunContext::create(out_dir, run.config(), &params, *seed)?;
    eprintln!(
        "Run {}: seed {seed}, population {}, generations {}",
        ctx.run_id(),
        params.population,
        params.generations
    );

    let mut observer = TrainObserver {
        ctx,
        interactive: *interactive,
        error: None,
    };
    let result = observer::drive(run, &mut observer);
    if let Some(err) = observer.error {
        return Err(err.context("Failed to export the training run"));
    }

    let best = &result.global_best;
    eprintln!();
    eprintln!("Training completed");
    eprintln!("  Best fitness: {:.3}", best.fitness);
    eprintln!("  Generation: {}, index: {}", best.generation, best.index);
    eprintln!("  Evaluation seed: {}", best.seed);
    eprintln!("  Policy: {}", best.policy);
    eprintln!("  Saved: {}", observer.ctx.best_path().display());

    if *replay {
        let mut steps = vec![];
        let config = &result.config;
        episode::play_episode_with(&best.policy, config, best.seed, config.horizon, |s| {
            steps.push(*s);
        });
        let path = observer.ctx.write_replay(steps)?;
        eprintln!("  Replay: {}", path.display());
    }

    Ok(())
}
