use chessenv::codec::PLANES_NUM;
use chessenv::env::ChessEnv;
use chessenv::render::RenderMode;
use clap::Parser;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[clap(about, long_about = None)]
struct Args {
    #[clap(long, default_value = "512")]
    max_steps: u32,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long)]
    render: bool,
}

fn main() {
    chessenv::util::init_globals();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("random rollout, seed {}, max {} steps", seed, args.max_steps);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut env = ChessEnv::from_seed(seed);
    env.reset();

    for step_idx in 0..args.max_steps {
        let policy = Array3::from_shape_fn((8, 8, PLANES_NUM), |_| rng.gen::<f32>());
        let step = match env.step(&policy) {
            Ok(step) => step,
            Err(err) => {
                log::error!("step failed: {}", err);
                return;
            }
        };
        if args.render {
            env.render(RenderMode::Human);
        }
        log::debug!("step {}: {}", step_idx + 1, step.info.last_move);
        if step.terminal {
            log::info!(
                "game over after {} steps, reward {}",
                step_idx + 1,
                step.reward
            );
            return;
        }
    }
    log::info!("rollout hit the step limit without a terminal position");
}
