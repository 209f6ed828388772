//! Flat-file export of a training run.
//!
//! A [`RunContext`] is created when a run starts and fed every generation report.
//! It writes, below its output directory:
//!
//! ```text
//! config/run-<id>.json   run metadata, seed, GA params and game config
//! logs/run-<id>.jsonl    one line per generation
//! logs/run-<id>.csv      the same rows, every value quoted
//! best.json              genotype of the global best, rewritten on improvement
//! replay/run-<id>.json   optional step-by-step replay
//! ```
//!
//! `<id>` is the local start time, formatted as `YYYY-MM-DD_HH-MM-SS`.

use std::path::{Path, PathBuf};

use brickevo_engine::{FEATURE_COUNT, GameConfig};
use brickevo_evaluator::{episode::StepRecord, fitness::FitnessEvaluator, policy::Policy};
use brickevo_training::{
    params::GaParams,
    run::{GenerationReport, RunResult},
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{self, Output};

const RUN_NAME: &str = "brickevo";
const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Column order of the CSV log.
const CSV_COLUMNS: [&str; 11] = [
    "run",
    "gen",
    "best",
    "avg",
    "worst",
    "gen_ms",
    "destroyed",
    "total_bricks",
    "best_idx",
    "global_best_fit",
    "global_best_gen",
];

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub run_id: String,
}

/// Contents of `config/run-<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub meta: RunMeta,
    pub seed: u32,
    pub params: GaParams,
    pub config: GameConfig,
}

/// One line of `logs/run-<id>.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub run: String,
    pub r#gen: usize,
    pub best: f64,
    pub avg: f64,
    pub worst: f64,
    pub gen_ms: u128,
    pub destroyed: usize,
    pub total_bricks: usize,
    pub best_idx: usize,
    pub global_best_fit: f64,
    pub global_best_gen: usize,
}

impl LogRecord {
    fn from_report(run_id: &str, report: &GenerationReport) -> Self {
        Self {
            run: run_id.to_owned(),
            r#gen: report.generation,
            best: round6(report.best_fitness),
            avg: round6(report.average_fitness),
            worst: round6(report.worst_fitness),
            gen_ms: report.elapsed.as_millis(),
            destroyed: report.destroyed,
            total_bricks: report.total_bricks,
            best_idx: report.best_index,
            global_best_fit: round6(report.global_best.fitness),
            global_best_gen: report.global_best.generation,
        }
    }

    fn csv_values(&self) -> [String; CSV_COLUMNS.len()] {
        [
            self.run.clone(),
            self.r#gen.to_string(),
            self.best.to_string(),
            self.avg.to_string(),
            self.worst.to_string(),
            self.gen_ms.to_string(),
            self.destroyed.to_string(),
            self.total_bricks.to_string(),
            self.best_idx.to_string(),
            self.global_best_fit.to_string(),
            self.global_best_gen.to_string(),
        ]
    }
}

/// Genes of a policy, as stored in `best.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pub weights: [f64; FEATURE_COUNT],
    pub dead_zone: f64,
}

impl From<Policy> for Genotype {
    fn from(policy: Policy) -> Self {
        Self {
            weights: *policy.weights(),
            dead_zone: policy.dead_zone(),
        }
    }
}

impl From<Genotype> for Policy {
    fn from(genotype: Genotype) -> Self {
        Policy::new(genotype.weights, genotype.dead_zone)
    }
}

/// Contents of `best.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSnapshot {
    pub r#gen: usize,
    pub fitness: f64,
    /// Evaluation seed reproducing `fitness`.
    pub seed: u32,
    pub params: GaParams,
    pub genotype: Genotype,
}

/// A policy file given on the command line: either a `best.json` snapshot or a bare
/// policy object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyFile {
    Snapshot(BestSnapshot),
    Policy(Policy),
}

impl PolicyFile {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        util::read_json_file("policy", path)
    }

    pub fn policy(&self) -> Policy {
        match self {
            PolicyFile::Snapshot(snapshot) => snapshot.genotype.into(),
            PolicyFile::Policy(policy) => *policy,
        }
    }

    /// Seed stored with the policy, if any.
    pub fn seed(&self) -> Option<u32> {
        match self {
            PolicyFile::Snapshot(snapshot) => Some(snapshot.seed),
            PolicyFile::Policy(_) => None,
        }
    }

    /// GA parameters the policy was trained with, if any.
    pub fn params(&self) -> Option<&GaParams> {
        match self {
            PolicyFile::Snapshot(snapshot) => Some(&snapshot.params),
            PolicyFile::Policy(_) => None,
        }
    }

    /// Builds an evaluator scoring the policy the way its training run did.
    ///
    /// `episodes` and `horizon` override the stored parameters. A bare policy falls back
    /// to the default parameters.
    pub fn evaluator(
        &self,
        config: GameConfig,
        episodes: Option<usize>,
        horizon: Option<usize>,
    ) -> FitnessEvaluator {
        let defaults = GaParams::default();
        let params = self.params().unwrap_or(&defaults);
        FitnessEvaluator::new(
            config,
            episodes.unwrap_or(params.episodes),
            horizon.unwrap_or(params.horizon),
        )
        .with_weights(params.fitness)
    }
}

/// Contents of `replay/run-<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFile {
    pub created_at: DateTime<Utc>,
    pub run_id: Option<String>,
    pub steps: Vec<StepRecord>,
}

impl ReplayFile {
    pub fn new(run_id: Option<String>, steps: Vec<StepRecord>) -> Self {
        Self {
            created_at: Utc::now(),
            run_id,
            steps,
        }
    }
}

/// Formats a run id from a local timestamp.
pub fn run_id_at(time: &DateTime<Local>) -> String {
    time.format(RUN_ID_FORMAT).to_string()
}

fn csv_escape(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders log records as CSV: a header line, then one quoted row per record.
pub fn to_csv(records: &[LogRecord]) -> String {
    let mut text = CSV_COLUMNS.join(",");
    text.push('\n');
    for record in records {
        let row = record
            .csv_values()
            .iter()
            .map(|v| csv_escape(v))
            .collect::<Vec<_>>()
            .join(",");
        text.push_str(&row);
        text.push('\n');
    }
    text
}

/// Export bookkeeping of one training run.
#[derive(Debug)]
pub struct RunContext {
    out_dir: PathBuf,
    run_id: String,
    seed: u32,
    params: GaParams,
    logs: Vec<LogRecord>,
    best: Option<BestSnapshot>,
}

impl RunContext {
    /// Starts a run with an id taken from the current local time and writes its
    /// config snapshot.
    pub fn create(
        out_dir: &Path,
        config: &GameConfig,
        params: &GaParams,
        seed: u32,
    ) -> anyhow::Result<Self> {
        Self::with_run_id(out_dir, run_id_at(&Local::now()), config, params, seed)
    }

    pub fn with_run_id(
        out_dir: &Path,
        run_id: String,
        config: &GameConfig,
        params: &GaParams,
        seed: u32,
    ) -> anyhow::Result<Self> {
        let ctx = Self {
            out_dir: out_dir.to_owned(),
            run_id,
            seed,
            params: params.clone(),
            logs: vec![],
            best: None,
        };
        let snapshot = ConfigSnapshot {
            meta: RunMeta {
                name: RUN_NAME.to_owned(),
                created_at: Utc::now(),
                run_id: ctx.run_id.clone(),
            },
            seed,
            params: params.clone(),
            config: config.clone(),
        };
        Output::save_json(&snapshot, Some(ctx.config_path()))?;
        log::info!("run {} started, writing to {}", ctx.run_id, out_dir.display());
        Ok(ctx)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub fn config_path(&self) -> PathBuf {
        self.out_dir
            .join("config")
            .join(format!("run-{}.json", self.run_id))
    }

    pub fn jsonl_path(&self) -> PathBuf {
        self.out_dir
            .join("logs")
            .join(format!("run-{}.jsonl", self.run_id))
    }

    pub fn csv_path(&self) -> PathBuf {
        self.out_dir
            .join("logs")
            .join(format!("run-{}.csv", self.run_id))
    }

    pub fn best_path(&self) -> PathBuf {
        self.out_dir.join("best.json")
    }

    pub fn replay_path(&self) -> PathBuf {
        self.out_dir
            .join("replay")
            .join(format!("run-{}.json", self.run_id))
    }

    /// Appends the generation to the log and rewrites `best.json` on a new global best.
    pub fn record_generation(&mut self, report: &GenerationReport) -> anyhow::Result<()> {
        self.logs.push(LogRecord::from_report(&self.run_id, report));
        if report.is_new_global_best {
            let global = &report.global_best;
            let snapshot = BestSnapshot {
                r#gen: global.generation,
                fitness: round6(global.fitness),
                seed: global.seed,
                params: self.params.clone(),
                genotype: global.policy.into(),
            };
            Output::save_json(&snapshot, Some(self.best_path()))?;
            self.best = Some(snapshot);
        }
        Ok(())
    }

    /// Writes the generation logs and makes sure `best.json` exists.
    pub fn finish(&mut self, result: &RunResult) -> anyhow::Result<()> {
        Output::open(self.jsonl_path())?.write_json_lines(&self.logs)?;
        Output::open(self.csv_path())?.write_text(&to_csv(&self.logs))?;

        if self.best.is_none() {
            let global = &result.global_best;
            let snapshot = BestSnapshot {
                r#gen: global.generation,
                fitness: round6(global.fitness),
                seed: global.seed,
                params: self.params.clone(),
                genotype: global.policy.into(),
            };
            Output::save_json(&snapshot, Some(self.best_path()))?;
            self.best = Some(snapshot);
        }
        log::info!(
            "run {} finished with seed {}: {} generations logged",
            self.run_id,
            self.seed,
            self.logs.len()
        );
        Ok(())
    }

    pub fn write_replay(&self, steps: Vec<StepRecord>) -> anyhow::Result<PathBuf> {
        let path = self.replay_path();
        let replay = ReplayFile::new(Some(self.run_id.clone()), steps);
        Output::save_json(&replay, Some(path.clone()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use brickevo_engine::GameConfig;
    use brickevo_evaluator::episode;
    use brickevo_training::{observer, run::EvolutionRun};
    use chrono::TimeZone as _;

    use super::*;

    struct Collect<'a>(&'a mut RunContext);

    impl observer::RunObserver for Collect<'_> {
        fn on_generation(&mut self, report: &GenerationReport) {
            self.0.record_generation(report).unwrap();
        }

        fn on_done(&mut self, result: &RunResult) {
            self.0.finish(result).unwrap();
        }
    }

    fn small_params() -> GaParams {
        GaParams {
            population: 4,
            generations: 3,
            elite: 1,
            episodes: 1,
            horizon: 200,
            ..GaParams::default()
        }
    }

    fn train_into(dir: &Path, params: &GaParams, seed: u32) -> (RunContext, RunResult) {
        let run = EvolutionRun::new(GameConfig::default(), params.clone(), seed).unwrap();
        let mut ctx = RunContext::with_run_id(
            dir,
            "2024-01-02_03-04-05".to_owned(),
            run.config(),
            params,
            seed,
        )
        .unwrap();
        let result = observer::drive(run, &mut Collect(&mut ctx));
        (ctx, result)
    }

    #[test]
    fn test_run_id_format() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(run_id_at(&time), "2024-03-09_07-05-02");
    }

    #[test]
    fn test_csv_quotes_every_value() {
        let record = LogRecord {
            run: "a\"b".to_owned(),
            r#gen: 0,
            best: 1.5,
            avg: 1.0,
            worst: 0.5,
            gen_ms: 12,
            destroyed: 3,
            total_bricks: 50,
            best_idx: 2,
            global_best_fit: 1.5,
            global_best_gen: 0,
        };
        let csv = to_csv(&[record]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            r#""a""b","0","1.5","1","0.5","12","3","50","2","1.5","0""#
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_round6() {
        assert_eq!(round6(1.234_567_89), 1.234_568);
        assert_eq!(round6(-0.000_000_4), 0.0);
    }

    #[test]
    fn test_run_context_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let params = small_params();
        let (ctx, result) = train_into(dir.path(), &params, 99);

        let snapshot: ConfigSnapshot =
            util::read_json_file("config", ctx.config_path()).unwrap();
        assert_eq!(snapshot.seed, 99);
        assert_eq!(snapshot.params, params);
        assert_eq!(snapshot.config, result.config);
        assert_eq!(snapshot.config.horizon, params.horizon);
        assert_eq!(snapshot.config.episodes, params.episodes);
        assert_eq!(snapshot.meta.run_id, "2024-01-02_03-04-05");

        let jsonl = fs::read_to_string(ctx.jsonl_path()).unwrap();
        let records = jsonl
            .lines()
            .map(|l| serde_json::from_str::<LogRecord>(l).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(records.len(), 3);
        assert_eq!(records, ctx.logs());
        assert!(records.iter().all(|r| r.run == "2024-01-02_03-04-05"));

        let csv = fs::read_to_string(ctx.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 4);

        let best: BestSnapshot = util::read_json_file("best", ctx.best_path()).unwrap();
        assert_eq!(best.seed, result.global_best.seed);
        assert_eq!(best.r#gen, result.global_best.generation);
        assert_eq!(Policy::from(best.genotype), result.global_best.policy);

        let policy_file = PolicyFile::read(&ctx.best_path()).unwrap();
        assert_eq!(policy_file.seed(), Some(result.global_best.seed));
    }

    #[test]
    fn test_best_snapshot_reproduces_fitness() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = small_params();
        params.episodes = 2;
        params.horizon = 300;
        params.fitness.clear_bonus = 500.0;
        params.fitness.destroyed = 12.5;
        let (ctx, result) = train_into(dir.path(), &params, 17);

        let file = PolicyFile::read(&ctx.best_path()).unwrap();
        let PolicyFile::Snapshot(snapshot) = &file else {
            panic!("best.json is a snapshot");
        };
        let evaluator = file.evaluator(GameConfig::default(), None, None);
        assert_eq!(evaluator.episodes(), 2);
        assert_eq!(evaluator.horizon(), 300);
        assert_eq!(*evaluator.weights(), params.fitness);

        let evaluation = evaluator.evaluate(&file.policy(), file.seed().unwrap());
        assert_eq!(
            evaluation.fitness.to_bits(),
            result.global_best.fitness.to_bits()
        );
        assert_eq!(round6(evaluation.fitness).to_bits(), snapshot.fitness.to_bits());

        let overridden = file.evaluator(GameConfig::default(), Some(1), Some(50));
        assert_eq!(overridden.episodes(), 1);
        assert_eq!(overridden.horizon(), 50);
    }

    #[test]
    fn test_replay_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::with_run_id(
            dir.path(),
            "r1".to_owned(),
            &GameConfig::default(),
            &small_params(),
            1,
        )
        .unwrap();
        let policy = Policy::new([0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.0);
        let mut steps = vec![];
        let outcome =
            episode::play_episode_with(&policy, &GameConfig::default(), 4, 30, |s| steps.push(*s));
        let path = ctx.write_replay(steps).unwrap();
        assert!(path.ends_with("replay/run-r1.json"));
        let replay: ReplayFile = util::read_json_file("replay", &path).unwrap();
        assert_eq!(replay.run_id.as_deref(), Some("r1"));
        assert_eq!(replay.steps.len(), outcome.steps);
    }

    #[test]
    fn test_bare_policy_file() {
        let policy = Policy::new([0.5; FEATURE_COUNT], 0.1);
        let json = serde_json::to_string(&policy).unwrap();
        let file: PolicyFile = serde_json::from_str(&json).unwrap();
        assert_eq!(file.policy(), policy);
        assert_eq!(file.seed(), None);
        assert!(file.params().is_none());
        let evaluator = file.evaluator(GameConfig::default(), None, None);
        assert_eq!(evaluator.episodes(), GaParams::default().episodes);
        assert_eq!(evaluator.horizon(), GaParams::default().horizon);
    }
}
