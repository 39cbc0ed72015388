use std::process::ExitCode;

use clap::Parser;

use mandala::config::{Cli, StaticConfig};
use mandala::engine::Engine;
use mandala::error::AppError;
use mandala::{headless, window};

fn run(config: StaticConfig) -> Result<(), AppError> {
    log::info!(
        "n={} {}x{} seed={} palette={} sym={} mirror={} ssaa={} glow={} frac={:.2} adapt={} target={:.0}",
        config.n,
        config.width,
        config.height,
        config.seed,
        config.palette,
        config.symmetry,
        config.mirror,
        config.supersampling,
        config.glow,
        config.render_fraction,
        config.adapt,
        config.target_fps
    );

    let headless = config.headless;
    let engine = Engine::new(config)?;
    log::info!("{} worker threads", engine.scene().threads());

    if headless {
        headless::run(engine).map(|_| ())
    } else {
        window::run(engine)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
