use std::io::{self, Write};
use std::process::ExitCode;

use colored::Colorize;
use hero_api_check::{api_heroes, Check, Checker, Config, Context, Report, Verdict};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    #[cfg(target_family = "windows")]
    {
        if colored::control::set_virtual_terminal(true).is_err() {
            eprintln!("failed to print colorfully.")
        };
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    let checker = match Checker::new(&config) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    println!("Check hero restful api - {}", api_heroes(checker.base()));
    let checks = Check::sequence(config.extended);
    let report = checker
        .run(checks, config.policy, Context::default())
        .await;

    let mut out = std::io::stdout().lock();
    if let Err(e) = print_report(&mut out, &report) {
        eprintln!("{}", e);
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_report(out: &mut impl Write, report: &Report) -> io::Result<()> {
    for outcome in &report.outcomes {
        if let Some(note) = &outcome.note {
            writeln!(out, "  {}", note)?;
        }
        match &outcome.verdict {
            Verdict::Passed => writeln!(out, "{}  {}", "ok".green(), outcome.check.label())?,
            Verdict::Failed(e) => {
                writeln!(out, "{}  {}", "FAIL".red(), outcome.check.label())?;
                writeln!(out, "      {}", e)?;
            }
            Verdict::Skipped => writeln!(out, "{}  {}", "skip".yellow(), outcome.check.label())?,
        }
    }

    // passed/failed/skipped/total
    writeln!(
        out,
        "{}/{}/{}/{}",
        report.passed().to_string().green(),
        report.failed().to_string().red(),
        report.skipped().to_string().yellow(),
        report.total(),
    )?;
    writeln!(out, "** Api CRUD test is done! **")
}
