use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_scheduler::config::{self, DEFAULT_MIXED_QUIZ_SIZE, DEFAULT_QUIZ_SIZE, DEFAULT_SCHEDULE_DAYS};
use quiz_scheduler::store::{open_store, ReviewStore};
use quiz_scheduler::{DifficultyAnalyzer, ItemId, QuestionSelector, Scheduler};

const USAGE: &str = "\
usage: quiz_scheduler <command> <user> [args]

commands:
  stats <user>                            SM-2 statistics
  schedule <user> [days]                  review calendar (default 7 days)
  summary <user>                          error summary with suggestions
  consistency <user>                      learning consistency
  recommendations <user>                  progress recommendations
  select <user> <due|difficult|mixed> [n] quiz over the user's known items";

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quiz_scheduler=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let args: Vec<String> = std::env::args().skip(1).collect();
  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(args: &[String]) -> CliResult<()> {
  let (command, user) = match args {
    [command, user, ..] => (command.as_str(), user.as_str()),
    _ => return Err(USAGE.into()),
  };
  let rest = &args[2..];

  let store_config = config::load_store_config()?;
  let store = open_store(&store_config)?;
  let scheduler = Scheduler::new(&store);
  let analyzer = DifficultyAnalyzer::new(&store);

  match command {
    "stats" => print_json(&scheduler.statistics(user)?),
    "schedule" => {
      let days = parse_count(rest.first(), DEFAULT_SCHEDULE_DAYS)?;
      print_json(&scheduler.schedule(user, days)?)
    }
    "summary" => print_json(&analyzer.error_summary(user)?),
    "consistency" => print_json(&analyzer.learning_consistency(user)?),
    "recommendations" => print_json(&analyzer.progress_recommendations(user)?),
    "select" => {
      let mode = rest.first().map(String::as_str).ok_or(USAGE)?;
      let pool: Vec<ItemId> = store.all_for_user(user)?.into_iter().map(|(item, _)| item).collect();
      let mut selector = QuestionSelector::new(&scheduler);
      let selected = match mode {
        "due" => selector.select_due_review(user, &pool, parse_count(rest.get(1), DEFAULT_QUIZ_SIZE)?)?,
        "difficult" => {
          selector.select_difficulty_focused(user, &pool, parse_count(rest.get(1), DEFAULT_QUIZ_SIZE)?)?
        }
        "mixed" => selector.select_mixed_review(user, &pool, parse_count(rest.get(1), DEFAULT_MIXED_QUIZ_SIZE)?)?,
        other => return Err(format!("unknown selection mode '{}'\n\n{}", other, USAGE).into()),
      };
      print_json(&selected)
    }
    other => Err(format!("unknown command '{}'\n\n{}", other, USAGE).into()),
  }
}

fn parse_count<T: std::str::FromStr>(arg: Option<&String>, default: T) -> CliResult<T> {
  match arg {
    Some(value) => value
      .parse()
      .map_err(|_| format!("expected a non-negative number, got '{}'", value).into()),
    None => Ok(default),
  }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
