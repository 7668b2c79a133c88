//! Play a sequence of moves many times over, measuring the board after each run, and print how
//! often each outcome came up

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use qchess::{BranchingBackend, GameMode, QChess};

#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct Args {
    /// JSON game mode to play, standard chess if not given
    #[arg(short, long)]
    mode: Option<PathBuf>,

    /// How many times to play the moves
    #[arg(short, long, default_value_t = 1000)]
    shots: u64,

    /// Seed for the first run, each later run adds one
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Don't make the sides take turns
    #[arg(long)]
    no_turns: bool,

    /// Move commands such as `e2e4`, `b1^a3c3` or `a3c3^b1`
    commands: Vec<String>,
}

/// Play one run and measure it
fn shot(mode: &GameMode, args: &Args, seed: u64) -> Result<Vec<Vec<char>>> {
    let mut game = QChess::from_game_mode(mode, BranchingBackend::seeded(seed))?;
    for command in &args.commands {
        if let Err(e) = game.perform_command(command, !args.no_turns) {
            bail!("move {command:?} was rejected: {e}");
        }
    }
    game.collapse_board();
    Ok(game.get_simplified_matrix())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mode = match &args.mode {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("couldn't read {}", path.display()))?;
            GameMode::from_json(&json)?
        }
        None => GameMode::classic(),
    };

    let mut outcomes: Vec<(Vec<Vec<char>>, u64)> = Vec::new();
    for trial in 0..args.shots {
        let board = shot(&mode, &args, args.seed.wrapping_add(trial))?;
        match outcomes.iter_mut().find(|(seen, _)| *seen == board) {
            Some((_, count)) => *count += 1,
            None => outcomes.push((board, 1)),
        }
    }
    outcomes.sort_by(|(_, a), (_, b)| b.cmp(a));

    for (board, count) in outcomes {
        println!(
            "{count}/{} ({:.3})",
            args.shots,
            count as f64 / args.shots as f64
        );
        for row in board {
            let row: Vec<String> = row.into_iter().map(String::from).collect();
            println!("{}", row.join(" "));
        }
        println!();
    }
    Ok(())
}
