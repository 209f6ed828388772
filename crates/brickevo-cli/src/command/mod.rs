use clap::{Parser, Subcommand};

use self::{
    default_config::DefaultConfigArg, evaluate::EvaluateArg, replay::ReplayArg, train::TrainArg,
};

mod default_config;
mod evaluate;
mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a policy with the genetic algorithm and export the run
    Train(#[clap(flatten)] TrainArg),
    /// Measure the fitness of a saved policy
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Record one episode of a saved policy step by step
    Replay(#[clap(flatten)] ReplayArg),
    /// Print the default game config or GA parameters as JSON
    DefaultConfig(#[clap(flatten)] DefaultConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::DefaultConfig(arg) => default_config::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_train_arguments() {
        let args = CommandArgs::try_parse_from([
            "brickevo",
            "train",
            "--seed",
            "7",
            "--generations",
            "3",
            "--parallel",
        ])
        .unwrap();
        assert!(matches!(args.mode, Mode::Train(_)));

        let args =
            CommandArgs::try_parse_from(["brickevo", "default-config", "--kind", "params"]);
        assert!(args.is_ok());
        assert!(CommandArgs::try_parse_from(["brickevo", "evaluate"]).is_err());
    }
}
