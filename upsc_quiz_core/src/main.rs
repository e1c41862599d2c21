//! `upsc-quiz` command line: quiz selection, terminal play, results and PDF mining
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use upsc_quiz_core::{
    build_bank, convert_pdf_dir, merge_csv_dir, AnswerLetter, Config, Difficulty, QuestionBank, QuizAttempt,
    QuizError, QuizSelector, ResultStore,
};

const DEFAULT_PDF_DIR: &str = "data/raw/pdf";
const DEFAULT_CSV_DIR: &str = "data/raw/csv";
const DEFAULT_MASTER_CSV: &str = "data/raw/csv/upsc_master_questions.csv";

#[derive(Parser)]
#[command(name = "upsc-quiz", about = "UPSC quiz: question sourcing, PDF mining and results")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a quiz and print it as JSON
    Select {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 15)]
        count: usize,
        /// Only use pre-loaded questions (no generation)
        #[arg(long)]
        preloaded_only: bool,
    },
    /// Take a quiz in the terminal and save the result
    Play {
        #[arg(long, default_value = "student_1")]
        user: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 15)]
        count: usize,
        #[arg(long)]
        preloaded_only: bool,
    },
    /// Record a finished quiz
    SaveResult {
        #[arg(long)]
        user: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        difficulty: String,
        #[arg(long)]
        score: u32,
        #[arg(long)]
        total: u32,
    },
    /// Show a user's past results, newest first
    History {
        #[arg(long)]
        user: String,
    },
    /// Mine every PDF in a directory into per-file CSVs
    ConvertPdfs {
        #[arg(long, default_value = DEFAULT_PDF_DIR)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_CSV_DIR)]
        output: PathBuf,
        /// Also merge the CSVs into the master file
        #[arg(long)]
        merge: bool,
    },
    /// Merge every CSV in a directory into one master CSV
    MergeCsv {
        #[arg(long, default_value = DEFAULT_CSV_DIR)]
        dir: PathBuf,
        #[arg(long, default_value = DEFAULT_MASTER_CSV)]
        output: PathBuf,
    },
    /// Rebuild the question bank from a CSV or Excel file
    BuildBank {
        #[arg(long, default_value = DEFAULT_MASTER_CSV)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "quiz.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let cli = Cli::parse();
    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &Config) -> Result<(), QuizError> {
    match command {
        Command::Select {
            topic,
            difficulty,
            count,
            preloaded_only,
        } => {
            let selection =
                QuizSelector::from_config(config).select_questions_for_quiz(&topic, difficulty, count, preloaded_only)?;
            println!("{}", serde_json::to_string_pretty(&selection.questions)?);
            eprintln!(
                "Loaded {} questions ({} from bank/cache, {} new).",
                selection.questions.len(),
                selection.from_bank,
                selection.generated()
            );
        }
        Command::Play {
            user,
            topic,
            difficulty,
            count,
            preloaded_only,
        } => play(config, &user, &topic, difficulty, count, preloaded_only)?,
        Command::SaveResult {
            user,
            topic,
            difficulty,
            score,
            total,
        } => {
            let saved = ResultStore::from_config(config).save_result(&user, &topic, &difficulty, score, total)?;
            println!(
                "Result saved! Score: {}/{} ({}%).",
                saved.record.score, saved.record.total_questions, saved.record.percentage
            );
            println!("CSV saved at: {}", saved.csv_path.display());
        }
        Command::History { user } => {
            let history = ResultStore::from_config(config).load_user_history(&user)?;
            if history.is_empty() {
                println!("No attempts found yet.");
            }
            for entry in history {
                println!(
                    "{}  {:<20} {:<7} {:>3}/{:<3} {:>6.2}%",
                    entry.timestamp, entry.topic, entry.difficulty, entry.score, entry.total_questions, entry.percentage
                );
            }
        }
        Command::ConvertPdfs { input, output, merge } => {
            let converted = convert_pdf_dir(&input, &output)?;
            for c in &converted {
                println!("{} -> {} | rows: {}, rejected: {}", c.source.display(), c.csv_path.display(), c.rows, c.rejected);
            }
            if merge {
                let rows = merge_csv_dir(&output, output.join("upsc_master_questions.csv"))?;
                println!("Master CSV rows: {}", rows);
            }
        }
        Command::MergeCsv { dir, output } => {
            let rows = merge_csv_dir(&dir, &output)?;
            println!("MASTER CSV SAVED: {} ({} rows)", output.display(), rows);
        }
        Command::BuildBank { input } => {
            let bank = QuestionBank::new(&config.bank_path);
            let report = build_bank(&input, &bank)?;
            println!(
                "Bank saved -> {} | questions: {}, skipped rows: {}",
                bank.path().display(),
                report.questions.len(),
                report.skipped
            );
        }
    }
    Ok(())
}

fn play(
    config: &Config,
    user: &str,
    topic: &str,
    difficulty: Difficulty,
    count: usize,
    preloaded_only: bool,
) -> Result<(), QuizError> {
    let selection = QuizSelector::from_config(config).select_questions_for_quiz(topic, difficulty, count, preloaded_only)?;

    if selection.questions.is_empty() {
        println!("No questions available for {} - {}. Try another topic or allow generation.", topic, difficulty);
        return Ok(());
    }
    if preloaded_only && selection.questions.len() < count {
        println!(
            "Only {} questions available for {} - {}. Quiz shortened to available questions (no API used).",
            selection.questions.len(),
            topic,
            difficulty
        );
    }

    let mut attempt = QuizAttempt::new(topic, difficulty.as_str(), selection.questions);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(question) = attempt.current() {
        println!("\nQ{}. {}", attempt.current_index() + 1, question.question);
        for (letter, text) in question.options.iter() {
            println!("  ({}) {}", letter, text);
        }
        print!("Your answer [a-d, q to quit]: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            attempt.finish();
            break;
        };
        let input = line?;
        if input.trim().eq_ignore_ascii_case("q") {
            attempt.finish();
            break;
        }
        let Some(letter) = AnswerLetter::parse(&input) else {
            println!("Please answer with a, b, c or d.");
            continue;
        };

        if let Some(recorded) = attempt.answer(letter) {
            if recorded.is_correct {
                println!("Correct!");
            } else {
                println!("Wrong. Correct answer: ({}).", recorded.correct);
            }
            if let Some(explanation) = recorded.explanation {
                println!("{}", explanation);
            }
        }
    }

    let saved = attempt.save(&ResultStore::from_config(config), user)?;
    println!(
        "\nScore: {}/{} ({}%). CSV saved at: {}",
        saved.record.score,
        saved.record.total_questions,
        saved.record.percentage,
        saved.csv_path.display()
    );
    Ok(())
}
