use clap::Parser;
use minesweeper_ai::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::thread;
use std::time::Duration;

/// Plays one game of Minesweeper using only logically certain moves, and
/// guesses when none are left.
#[derive(Parser, Debug)]
#[command(name = "minesweeper-ai", version, about = "Autonomous Minesweeper bot")]
struct Cli {
    /// Number of rows on the board.
    #[arg(long, default_value_t = 10)]
    height: usize,

    /// Number of columns on the board.
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Number of mines hidden on the board.
    #[arg(long, default_value_t = 15)]
    mines: usize,

    /// Seed for mine placement and guesses. Drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Pause between moves, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.mines >= cli.height * cli.width {
        anyhow::bail!("Total mines must be less than the number of cells on the board.");
    }

    // --- 1. Initialization ---
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut board = Board::new(cli.height, cli.width, cli.mines, &mut rng);
    let mut ai = KnowledgeBase::new(cli.height, cli.width);
    let safe_cells = cli.height * cli.width - cli.mines;

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Play logically safe moves, guess randomly otherwise.");
    println!("Initial Board:");
    print_board(&board, &ai, None);

    // --- 2. Game Loop ---
    let mut game_state = GameState::Playing;
    let mut move_count = 0;
    while game_state == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        // --- 3. Bot's Decision Logic ---
        let point_to_reveal = if let Some(cell) = ai.make_safe_move() {
            println!("Inference found a guaranteed safe cell.");
            Some(cell)
        } else if deepen(&mut ai)? && ai.make_safe_move().is_some() {
            println!("Exhaustive analysis found a safe cell inference missed.");
            ai.make_safe_move()
        } else {
            println!("No logically safe move found. Making a random guess...");
            ai.make_random_move(&mut rng)
        };

        // --- 4. Execute the Chosen Move ---
        let Some(cell) = point_to_reveal else {
            println!("No valid moves left for the bot to make.");
            break;
        };
        println!("Bot reveals {}...", cell);

        if board.is_mine(cell) {
            game_state = GameState::Lost;
            print_board(&board, &ai, Some(cell));
            break;
        }

        ai.add_knowledge(cell, board.nearby_mines(cell))?;
        for &mine in ai.mines() {
            board.flag(mine);
        }
        println!(
            "Known: {} safe, {} mines, {} live constraints.",
            ai.safes().len(),
            ai.mines().len(),
            ai.knowledge().len()
        );
        print_board(&board, &ai, None);

        if board.won() || ai.moves_made().len() == safe_cells {
            game_state = GameState::Won;
        }

        thread::sleep(Duration::from_millis(cli.delay_ms));
    }

    // --- 5. Final Result ---
    println!("\n--- Game Over after {} moves ---", move_count);

    match game_state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }

    Ok(())
}

/// Runs the SAT analysis over the live knowledge and feeds every forced cell
/// back into the engine. Returns whether anything was learned.
fn deepen(ai: &mut KnowledgeBase) -> anyhow::Result<bool> {
    if ai.knowledge().is_empty() {
        return Ok(false);
    }

    let analysis = analyze(ai.knowledge())?;
    let facts: Vec<Constraint> = analysis
        .forced_mines()
        .into_iter()
        .map(|mine| Constraint::new([mine], 1))
        .chain(
            analysis
                .forced_safes()
                .into_iter()
                .map(|safe| Constraint::new([safe], 0)),
        )
        .collect();

    for fact in &facts {
        ai.add_constraint(fact)?;
    }
    Ok(!facts.is_empty())
}

fn print_board(board: &Board, ai: &KnowledgeBase, exploded: Option<Cell>) {
    // Print header
    print!("   ");
    for col in 0..board.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(board.width));

    // Print rows
    for row in 0..board.height {
        print!("{:^2}|", row);
        for col in 0..board.width {
            let cell = Cell::new(row, col);
            let display = if exploded == Some(cell) {
                " * ".to_string()
            } else if ai.moves_made().contains(&cell) {
                format!(" {} ", board.nearby_mines(cell))
            } else if board.flagged().contains(&cell) {
                " F ".to_string()
            } else {
                " ■ ".to_string()
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
