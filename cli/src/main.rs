use anyhow::Context;
use clap::{Parser, ValueEnum};
use merge2048_core::{
    Direction, EngineConfig, MemoryStore, MilestoneTracker, MoveReply, MoveSession, Persistence,
    SpawnPolicy, Tile,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod render;
mod store;

use store::JsonFileStore;

const HELP: &str = "\
Move with w/a/s/d, h/j/k/l or up/down/left/right, then Enter.
u: undo   n: new game   ?: help   q: quit";

#[derive(Parser, Debug)]
#[command(version, about = "Play 2048 in the terminal", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tile value that counts as a win, rounded up to a power of two
    #[arg(long, default_value_t = EngineConfig::DEFAULT_WIN_TILE)]
    win_tile: Tile,

    /// How new tiles are drawn
    #[arg(long, value_enum, default_value_t = Spawn::Standard)]
    spawn: Spawn,

    /// Directory holding the best score and the game in progress
    #[arg(long, default_value = ".merge2048")]
    state_dir: PathBuf,

    /// Keep everything in memory
    #[arg(long)]
    no_save: bool,

    /// Play this many games with random moves instead of reading input
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Move limit per game in headless mode
    #[arg(long, default_value_t = 100_000)]
    max_moves: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Spawn {
    /// 2 with 90% probability, 4 otherwise
    Standard,
    /// Always 2
    AlwaysTwo,
}

impl From<Spawn> for SpawnPolicy {
    fn from(spawn: Spawn) -> Self {
        match spawn {
            Spawn::Standard => SpawnPolicy::Standard,
            Spawn::AlwaysTwo => SpawnPolicy::AlwaysTwo,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = EngineConfig::new(args.win_tile, args.spawn.into());
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {}, config: {:?}", seed, config);

    if let Some(episodes) = args.episodes {
        return run_headless(config, seed, episodes, args.max_moves);
    }

    if args.no_save {
        run_interactive(&MoveSession::new(config, seed, MemoryStore::default()))
    } else {
        let store = JsonFileStore::open(&args.state_dir)
            .with_context(|| format!("opening state directory {:?}", args.state_dir))?;
        log::debug!("state directory: {:?}", store.dir());
        run_interactive(&MoveSession::new(config, seed, store))
    }
}

fn run_interactive<P: Persistence>(session: &MoveSession<P>) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    let mut milestones = MilestoneTracker::new();
    let mut announced_win = session.engine().state().has_won();

    writeln!(out, "{HELP}\n")?;
    render::draw(&mut out, &session.engine(), None)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading input")?;
        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "?" | "help" => writeln!(out, "{HELP}")?,
            "u" | "undo" => {
                if session.undo() {
                    render::draw(&mut out, &session.engine(), None)?;
                } else {
                    writeln!(out, "Nothing to undo")?;
                }
            }
            "n" | "new" => {
                if session.new_game() {
                    milestones.reset();
                    announced_win = false;
                    render::draw(&mut out, &session.engine(), None)?;
                }
            }
            input => {
                let direction = match input.parse::<Direction>() {
                    Ok(direction) => direction,
                    Err(err) => {
                        writeln!(out, "{err}: {input:?}, type ? for help")?;
                        continue;
                    }
                };

                let reply = session.request_move_with(direction, |result| -> io::Result<()> {
                    render::draw(&mut out, &session.engine(), Some(result))?;
                    for tile in milestones.observe(result).tiles() {
                        writeln!(out, "Reached {tile}!")?;
                    }
                    if result.is_win && !announced_win {
                        announced_win = true;
                        writeln!(out, "You win! Keep going for a higher score.")?;
                    }
                    if result.is_game_over {
                        let engine = session.engine();
                        writeln!(
                            out,
                            "Game over. Final score {}, best {}. Type n for a new game.",
                            engine.score(),
                            engine.best_score()
                        )?;
                    }
                    Ok(())
                })?;

                match reply {
                    MoveReply::Done(result) if !result.moved => {
                        writeln!(out, "Can't move {direction}")?;
                    }
                    MoveReply::Ignored => log::debug!("{} ignored", direction),
                    MoveReply::Done(_) => {}
                }
            }
        }
    }
    Ok(())
}

/// Plays `episodes` games choosing uniformly among legal moves.
fn run_headless(
    config: EngineConfig,
    seed: u64,
    episodes: u32,
    max_moves: u32,
) -> anyhow::Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut total_score = 0;
    let mut wins = 0;

    for episode in 0..episodes {
        let session = MoveSession::new(config, rng.random(), MemoryStore::default());
        let mut milestones = MilestoneTracker::new();
        let mut won = false;
        let mut moves = 0;

        while moves < max_moves {
            let legal: Vec<Direction> = session.engine().legal_directions().collect();
            if legal.is_empty() {
                break;
            }
            let direction = legal[rng.random_range(0..legal.len())];
            if let Some(result) = session.request_move(direction).into_result() {
                won |= result.is_win;
                for tile in milestones.observe(&result).tiles() {
                    log::info!("episode {}: reached {} after {} moves", episode + 1, tile, moves);
                }
            }
            moves += 1;
        }

        let engine = session.engine();
        if won {
            wins += 1;
        }
        total_score += engine.score();
        println!(
            "episode {:>4}: score {:>7}  max tile {:>5}  moves {:>5}  {:?}",
            episode + 1,
            engine.score(),
            engine.max_tile(),
            moves,
            engine.state()
        );
    }

    if episodes > 0 {
        println!(
            "{} games, average score {}, {} reached {}",
            episodes,
            total_score / u64::from(episodes),
            wins,
            config.win_tile()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_engine_config() {
        let args = Args::try_parse_from([
            "merge2048",
            "--spawn",
            "always-two",
            "--win-tile",
            "1000",
            "--seed",
            "5",
        ])
        .unwrap();

        let config = EngineConfig::new(args.win_tile, args.spawn.into());
        assert_eq!(config.win_tile(), 1024);
        assert_eq!(config.spawn(), SpawnPolicy::AlwaysTwo);
        assert_eq!(args.seed, Some(5));
        assert!(!args.no_save);
    }

    #[test]
    fn headless_runs_to_completion() {
        run_headless(EngineConfig::ALWAYS_TWO, 3, 2, 50).unwrap();
    }
}
