use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use refbot_core::config::{load_registry, resolve_config_path};
use refbot_core::events::{classify_outcome, render_game_event};
use refbot_core::placer::ReferenceSectionPlacer;
use refbot_core::scan::{ReviewDecision, collect_edits, review_edits, scan_pages};

#[derive(Debug, Parser)]
#[command(
    name = "refbot",
    version,
    about = "Wiki maintenance bot: missing references sections and game-event templates"
)]
struct Cli {
    #[arg(long, global = true, default_value = "blaseball", value_name = "NAME")]
    family: String,
    #[arg(long, global = true, default_value = "en", value_name = "CODE")]
    lang: String,
    #[arg(long, global = true, value_name = "PATH", help = "Site tables TOML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Report pages lacking a references list")]
    Check(CheckArgs),
    #[command(about = "Insert or repair references sections, with review")]
    Fix(FixArgs),
    #[command(about = "Classify one game-event line and render its template")]
    Outcome(OutcomeArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(value_name = "PATH", help = "Page file or directory of page files")]
    path: PathBuf,
    #[arg(long, help = "Emit the report as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct FixArgs {
    #[arg(value_name = "PATH", help = "Page file or directory of page files")]
    path: PathBuf,
    #[arg(long, help = "Apply every edit without prompting")]
    always: bool,
    #[arg(long, help = "Show diffs but write nothing")]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct OutcomeArgs {
    #[arg(value_name = "TEXT")]
    text: String,
    #[arg(long, default_value_t = 1)]
    season: u32,
    #[arg(long, default_value_t = 1)]
    day: u32,
    #[arg(long, default_value = "unknown", value_name = "ID")]
    game: String,
    #[arg(long, default_value = "Home", value_name = "TEAM")]
    home: String,
    #[arg(long, default_value = "Away", value_name = "TEAM")]
    away: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check(args)) => run_check(&cli.family, &cli.lang, cli.config.as_deref(), args),
        Some(Commands::Fix(args)) => run_fix(&cli.family, &cli.lang, cli.config.as_deref(), args),
        Some(Commands::Outcome(args)) => run_outcome(args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn load_site(
    family: &str,
    lang: &str,
    config: Option<&Path>,
) -> Result<refbot_core::config::SiteConfig> {
    let registry = match resolve_config_path(config) {
        Some(path) => load_registry(&path)?,
        None => refbot_core::config::SiteRegistry::builtin(),
    };
    Ok(registry.site(family, lang))
}

fn run_check(family: &str, lang: &str, config: Option<&Path>, args: CheckArgs) -> Result<()> {
    let site = load_site(family, lang, config)?;
    let placer = ReferenceSectionPlacer::new(&site)?;
    let report = scan_pages(&placer, &args.path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("references check");
    println!("site: {family}:{lang}");
    println!("scanned_pages: {}", report.scanned_pages);
    println!("lacking_references: {}", report.lacking_references);
    for page in &report.pages {
        let classification = serde_json::to_value(page.classification)?;
        println!(
            "page: {} ({})",
            page.path,
            classification.as_str().unwrap_or("unknown")
        );
    }
    Ok(())
}

fn run_fix(family: &str, lang: &str, config: Option<&Path>, args: FixArgs) -> Result<()> {
    let site = load_site(family, lang, config)?;
    let placer = ReferenceSectionPlacer::new(&site)?;
    let edits = collect_edits(&placer, &args.path)?;

    println!("references fix");
    println!("site: {family}:{lang}");
    println!("proposed_edits: {}", edits.len());
    if edits.is_empty() {
        return Ok(());
    }

    if args.dry_run {
        for edit in &edits {
            println!();
            println!("[{}] {}", edit.summary(), edit.path);
            print!("{}", edit.unified_diff());
        }
        println!();
        println!("dry_run: no files written");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let report = review_edits(&edits, |edit| {
        println!();
        println!("[{}] {}", edit.summary(), edit.path);
        print!("{}", edit.unified_diff());
        if args.always {
            return ReviewDecision::Accept;
        }
        prompt_decision(&mut lines)
    })?;

    println!();
    println!("accepted: {}", report.accepted);
    println!("rejected: {}", report.rejected);
    Ok(())
}

fn prompt_decision(lines: &mut impl Iterator<Item = io::Result<String>>) -> ReviewDecision {
    loop {
        print!("apply this edit? [y]es / [n]o / [a]ll: ");
        let _ = io::stdout().flush();
        let Some(Ok(answer)) = lines.next() else {
            // stdin closed: stop editing rather than guessing
            return ReviewDecision::Reject;
        };
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return ReviewDecision::Accept,
            "n" | "no" => return ReviewDecision::Reject,
            "a" | "all" => return ReviewDecision::AcceptAll,
            other => println!("unrecognized answer: {other}"),
        }
    }
}

fn run_outcome(args: OutcomeArgs) -> Result<()> {
    if args.text.trim().is_empty() {
        bail!("outcome requires a non-empty event line");
    }

    println!("event outcome");
    match classify_outcome(&args.text) {
        Some(matched) => {
            println!("type: {}", matched.kind.label());
            println!("player1: {}", matched.player1.as_deref().unwrap_or("<none>"));
            println!("player2: {}", matched.player2.as_deref().unwrap_or("<none>"));
            println!("team: {}", matched.team.as_deref().unwrap_or("<none>"));
            println!("notes: {}", matched.notes.as_deref().unwrap_or("<none>"));
        }
        None => println!("type: Unknown"),
    }
    println!();
    println!(
        "{}",
        render_game_event(
            &args.text,
            args.season,
            args.day,
            &args.game,
            &args.home,
            &args.away,
        )
    );
    Ok(())
}
