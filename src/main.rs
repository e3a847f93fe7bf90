use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use dfp_remedy::event::{Event, EventId};
use dfp_remedy::program::Program;
use dfp_remedy::remedy::Remedy;
use dfp_remedy::time::Hours;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::Tabled;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// Path to the JSON program file
    #[arg(short, long, value_name = "FILE", default_value = "data/default.json")]
    scenario: PathBuf,

    /// Day to work on, defaults to the first day in the program
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    /// Pin the current time of day in hours, e.g. 7.5
    #[arg(long, value_name = "HOURS")]
    now: Option<f64>,
}

#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct CompleteHelper {
    pub commands: Vec<String>,
}

impl Completer for CompleteHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            })
            .collect();

        Ok((0, candidates))
    }
}

#[derive(Tabled)]
struct EventRow {
    id: String,
    resource: String,
    #[tabled(rename = "type")]
    kind: String,
    start: String,
    end: String,
    crew: String,
    syllabus: String,
    status: String,
}

impl EventRow {
    fn new(program: &Program, event: &Event) -> EventRow {
        let violations = program.detect_violations(&event.id).unwrap_or_default();
        let status = if violations.is_empty() {
            "ok".green().to_string()
        } else {
            violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ")
                .red()
                .to_string()
        };
        EventRow {
            id: event.id.to_string(),
            resource: event.resource_id.to_string(),
            kind: event.kind.to_string(),
            start: event.start_time.to_string(),
            end: event.end_time().to_string(),
            crew: event.personnel().join(", "),
            syllabus: event.flight_number.clone(),
            status,
        }
    }
}

#[derive(Tabled)]
struct RemedyRow {
    #[tabled(rename = "#")]
    index: usize,
    action: String,
    rank: String,
    duty: String,
    #[tabled(rename = "FLT/FTD/CPT/GRD")]
    load: String,
}

impl RemedyRow {
    fn new(index: usize, remedy: &Remedy) -> RemedyRow {
        let instructor = remedy.instructor();
        RemedyRow {
            index,
            action: remedy.to_string(),
            rank: instructor.rank.map(|r| r.to_string()).unwrap_or_default(),
            duty: instructor.duty_hours.to_string(),
            load: format!(
                "{}/{}/{}/{}",
                instructor.flights_today,
                instructor.ftds_today,
                instructor.cpts_today,
                instructor.ground_today
            ),
        }
    }
}

fn paginate(content: &str) -> std::io::Result<()> {
    let mut pager = Command::new("less")
        .arg("-R")
        .stdin(Stdio::piped())
        .spawn()
        // Fallback to 'more' if 'less' isn't available
        .or_else(|_| Command::new("more").stdin(Stdio::piped()).spawn())?;

    if let Some(mut stdin) = pager.stdin.take() {
        if let Err(e) = stdin.write_all(content.as_bytes()) {
            // Broken pipe is common if the user quits the pager early
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e);
            }
        }
    }

    // Wait for the user to close the pager before returning to the ">> " prompt
    pager.wait().map(|_| ())
}

fn print_table(mut table: tabled::Table, rows: usize) {
    table.with(Style::rounded());
    table.with(tabled::settings::Alignment::left());
    if rows > 20 {
        let content = table.to_string();
        if paginate(&content).is_err() {
            println!("{}", content);
        }
    } else {
        println!("{}", table);
    }
}

fn print_remedies(remedies: &[Remedy]) {
    if remedies.is_empty() {
        println!("{}", "No automated solution found.".yellow());
    } else {
        let rows = remedies
            .iter()
            .enumerate()
            .map(|(i, r)| RemedyRow::new(i + 1, r))
            .collect::<Vec<_>>();
        print_table(tabled::Table::new(&rows), rows.len());
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let mut program = Program::load_from_file(&args.scenario)?;
    if let Some(now) = args.now {
        program.config.clock = Some(Hours(now));
    }
    let Some(date) = args.date.or_else(|| program.dates().first().copied()) else {
        println!("No events in {}", args.scenario.display());
        return Ok(());
    };
    println!("Program loaded from {} for {}", args.scenario.display(), date);

    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();

    let helper = CompleteHelper {
        commands: ["ls", "check", "remedy", "swap", "apply", "help", "exit"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));

    // remedies last offered per event, so `apply` can refer to them by number
    let mut offered: HashMap<EventId, Vec<Remedy>> = HashMap::new();

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() { continue; }

                rl.add_history_entry(trimmed)?;

                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match parts[0] {
                    "ls" => {
                        let only_problems = matches!(parts.get(1), Some(&"p") | Some(&"problems"));
                        let problems = program.problems(date);
                        let rows = program
                            .events_on(date)
                            .iter()
                            .filter(|e| !only_problems || problems.iter().any(|p| p.event_id == e.id))
                            .map(|e| EventRow::new(&program, e))
                            .collect::<Vec<_>>();
                        if rows.is_empty() {
                            println!("No matching events found.")
                        } else {
                            print_table(tabled::Table::new(&rows), rows.len());
                        }
                    },
                    "check" => {
                        if let Some(id) = parts.get(1) {
                            match program.detect_violations(&Arc::from(*id)) {
                                Ok(v) if v.is_empty() => println!("{}", "No turnaround violations.".green()),
                                Ok(v) => v.iter().for_each(|v| println!("{}", v.to_string().red())),
                                Err(e) => println!("Error: {}", e),
                            }
                        } else {
                            println!("Usage: check <event_id>");
                        }
                    },
                    "remedy" | "swap" => {
                        if let Some(id) = parts.get(1) {
                            let id: EventId = Arc::from(*id);
                            let result = if parts[0] == "remedy" {
                                program.time_shift_remedies(&id)
                            } else {
                                program.instructor_remedies(&id)
                            };
                            match result {
                                Ok(remedies) => {
                                    print_remedies(&remedies);
                                    offered.insert(id, remedies);
                                },
                                Err(e) => println!("Error: {}", e),
                            }
                        } else {
                            println!("Usage: {} <event_id>", parts[0]);
                        }
                    },
                    "apply" => {
                        if let (Some(id), Some(n)) = (parts.get(1), parts.get(2)) {
                            let id: EventId = Arc::from(*id);
                            let chosen = n
                                .parse::<usize>()
                                .ok()
                                .and_then(|n| n.checked_sub(1))
                                .and_then(|n| offered.get(&id).and_then(|r| r.get(n)).cloned());
                            match chosen {
                                Some(remedy) => match program.apply_remedy(&id, &remedy) {
                                    Ok(()) => {
                                        offered.clear();
                                        println!("Applied: {}", remedy);
                                        if let Ok(v) = program.detect_violations(&id) {
                                            if !v.is_empty() {
                                                println!("{} still has {} violation(s), run remedy again.", id, v.len());
                                            }
                                        }
                                    },
                                    Err(e) => println!("Error: {}", e),
                                },
                                None => println!("No remedy {} listed for {}. Run remedy or swap first.", n, id),
                            }
                        } else {
                            println!("Usage: apply <event_id> <n>");
                        }
                    },
                    "help" | "?" => {
                        println!("\nAvailable Commands:");
                        println!("  ls [p]          - List events for the day, or only problem events");
                        println!("  check <id>      - Show turnaround violations for event <id>");
                        println!("  remedy <id>     - Suggest time shifts that clear the violation on <id>");
                        println!("  swap <id>       - Suggest substitute instructors at the current time");
                        println!("  apply <id> <n>  - Apply the n-th suggestion last listed for <id>");
                        println!("  help / ?        - Show this help menu");
                        println!("  exit / quit     - Exit\n");
                    },
                    "exit" | "quit" => break,
                    _ => println!("Unknown command: {}", parts[0]),
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            },
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            },
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
