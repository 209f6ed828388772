mod command;
mod export;
mod util;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    command::run()
}
