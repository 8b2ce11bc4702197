//! permcalc CLI: the `pcalc` command.
//!
//! Loads a JSON fixture of holders and their nodes and runs permission
//! checks and searches against it. Intended for inspecting why a holder
//! does or does not have a permission in a given context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use permcalc::node::normalize_permission;
use permcalc::search::{self, Comparison, Constraint, Page};
use permcalc::time::micros_to_rfc3339;
use permcalc::{
    CalculatorConfig, ContextSet, HolderHandle, MutableContextSet, PermissionCalculator,
    PermissionHolder, PermissionNode, ProcessorChain, StaticHolder,
};

/// Results shown per search page.
const SEARCH_PAGE_SIZE: usize = 15;

// ── Fixture format ────────────────────────────────────────────────────────────

/// On-disk fixture:
/// `{ "defaults": [node...], "holders": [ { "id": "...", "nodes": [node...] } ] }`
#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    defaults: Vec<PermissionNode>,
    holders: Vec<FixtureHolder>,
}

#[derive(Debug, Deserialize)]
struct FixtureHolder {
    id: String,
    #[serde(default)]
    nodes: Vec<PermissionNode>,
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&json)
        .with_context(|| format!("invalid fixture {}", path.display()))?;
    log::debug!(
        "loaded fixture {} ({} holders, {} defaults)",
        path.display(),
        fixture.holders.len(),
        fixture.defaults.len()
    );
    Ok(fixture)
}

fn load_chain(config: Option<&Path>, fixture: &Fixture) -> Result<ProcessorChain> {
    let mut config = match config {
        Some(path) => CalculatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CalculatorConfig::default(),
    };
    config.default_nodes.extend(fixture.defaults.iter().cloned());
    Ok(ProcessorChain::from_config(&config))
}

fn find_holder(fixture: &Fixture, id: &str) -> Result<Arc<StaticHolder>> {
    let holder = fixture
        .holders
        .iter()
        .find(|h| h.id == id)
        .ok_or_else(|| anyhow!("holder '{id}' not found in fixture"))?;
    Ok(Arc::new(StaticHolder::with_nodes(
        holder.id.clone(),
        holder.nodes.clone(),
    )))
}

/// Parse repeated `key=value` arguments into an active context.
fn parse_context(pairs: &[String]) -> Result<MutableContextSet> {
    let mut context = MutableContextSet::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("context '{pair}' must look like key=value"))?;
        context
            .add(key, value)
            .with_context(|| format!("invalid context '{pair}'"))?;
    }
    Ok(context)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// permcalc CLI: resolve and search permission assignments.
#[derive(Parser, Debug)]
#[command(
    name = "pcalc",
    about = "permcalc CLI",
    version,
    long_about = "pcalc: permcalc CLI\n\nResolve permissions for a holder in a context, list the nodes that\napply, and search assignments across holders."
)]
struct Cli {
    /// Fixture file with holders and nodes
    #[arg(short, long, global = true, default_value = "permissions.json")]
    file: PathBuf,

    /// Calculator config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a permission for a holder
    Check {
        /// Permission to resolve
        permission: String,

        /// Holder id
        #[arg(long)]
        holder: String,

        /// Active context entry (key=value), repeatable
        #[arg(long = "context")]
        contexts: Vec<String>,

        /// Decision to use when the result is undefined
        #[arg(long)]
        default: Option<bool>,
    },

    /// List the nodes that apply to a holder in a context
    Applicable {
        /// Holder id
        #[arg(long)]
        holder: String,

        /// Active context entry (key=value), repeatable
        #[arg(long = "context")]
        contexts: Vec<String>,
    },

    /// Search assignments across all holders
    Search {
        /// Comparison: ==, !=, ~~ (like), !~ (not like)
        comparison: String,

        /// Value or LIKE pattern
        value: String,

        /// Result page (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Check {
            permission,
            holder,
            contexts,
            default,
        } => cmd_check(
            &cli.file,
            cli.config.as_deref(),
            &holder,
            &contexts,
            &permission,
            default,
            verbose,
        ),
        Commands::Applicable { holder, contexts } => {
            cmd_applicable(&cli.file, cli.config.as_deref(), &holder, &contexts, verbose)
        }
        Commands::Search {
            comparison,
            value,
            page,
        } => cmd_search(&cli.file, &comparison, &value, page, verbose),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

fn build_calculator(
    file: &Path,
    config: Option<&Path>,
    holder_id: &str,
    contexts: &[String],
) -> Result<(Arc<StaticHolder>, PermissionCalculator)> {
    let fixture = load_fixture(file)?;
    let chain = load_chain(config, &fixture)?;
    let holder = find_holder(&fixture, holder_id)?;
    let active = parse_context(contexts)?;
    let calculator = PermissionCalculator::new(
        HolderHandle::new(&holder),
        active.make_immutable(),
        Arc::new(chain),
    );
    Ok((holder, calculator))
}

/// `pcalc check PERMISSION --holder ID [--context k=v]... [--default BOOL]`
fn cmd_check(
    file: &Path,
    config: Option<&Path>,
    holder_id: &str,
    contexts: &[String],
    permission: &str,
    default: Option<bool>,
    verbose: bool,
) -> Result<()> {
    if permission.trim().is_empty() {
        bail!("permission must not be empty");
    }
    let (_holder, calculator) = build_calculator(file, config, holder_id, contexts)?;
    let result = calculator.query(permission);

    println!("Holder:     {}", calculator.holder_id());
    println!("Context:    {}", calculator.context());
    println!("Permission: {}", normalize_permission(permission));
    println!("Result:     {}", result.result());
    if let Some(kind) = result.processor() {
        println!("Processor:  {kind}");
    }
    if let Some(cause) = result.cause() {
        println!("Cause:      {cause}");
    }
    if let Some(default) = default {
        let decision = result.result().as_bool_or(default);
        println!(
            "Decision:   {}",
            if decision { "ALLOW" } else { "DENY" }
        );
    }

    if verbose {
        let stats = calculator.stats();
        println!();
        println!("Chain:      {:?}", calculator.chain().kinds());
        println!("Applicable: {} nodes", calculator.applicable_nodes().len());
        println!("Stats:      {}", serde_json::to_string(&stats)?);
    }
    Ok(())
}

/// `pcalc applicable --holder ID [--context k=v]...`
fn cmd_applicable(
    file: &Path,
    config: Option<&Path>,
    holder_id: &str,
    contexts: &[String],
    verbose: bool,
) -> Result<()> {
    let (holder, calculator) = build_calculator(file, config, holder_id, contexts)?;
    let nodes = calculator.applicable_nodes();

    println!(
        "Applicable nodes for {} in {}: {}",
        calculator.holder_id(),
        calculator.context(),
        nodes.len()
    );
    for node in &nodes {
        print_node(node);
    }

    if verbose {
        let total = holder.node_snapshot().len();
        println!();
        println!("{} of {} stored nodes filtered out", total - nodes.len(), total);
    }
    Ok(())
}

/// `pcalc search COMPARISON VALUE [--page N]`
fn cmd_search(file: &Path, comparison: &str, value: &str, page: usize, verbose: bool) -> Result<()> {
    let fixture = load_fixture(file)?;
    let comparison = Comparison::parse(comparison)?;
    let constraint = Constraint::of(comparison, value)?;

    let results = search::search(
        fixture
            .holders
            .iter()
            .map(|h| (h.id.as_str(), h.nodes.as_slice())),
        &constraint,
    );

    let holder_count = {
        let mut ids: Vec<&str> = results.iter().map(|r| r.holder).collect();
        ids.dedup();
        ids.len()
    };
    println!(
        "Search '{constraint}': {} matches across {holder_count} holders",
        results.len()
    );
    if results.is_empty() {
        return Ok(());
    }

    let page = Page::of(&results, SEARCH_PAGE_SIZE, page);
    println!("Page {} of {}", page.number, page.total_pages);
    for held in page.items {
        // the permission itself is redundant for an equality search
        if comparison == Comparison::Equal {
            print!("  > {}", held.holder);
        } else {
            print!("  > {} - ({})", held.holder, held.node.permission());
        }
        print!(" - {}", held.node.value());
        if let Some(expiry) = held.node.expiry() {
            print!(" (expires {})", micros_to_rfc3339(expiry));
        }
        if !held.node.context().is_empty() {
            print!(" {}", held.node.context());
        }
        println!();
    }

    if verbose {
        println!();
        println!("{} holders in fixture", fixture.holders.len());
    }
    Ok(())
}

fn print_node(node: &PermissionNode) {
    let marker = if node.value() { "+" } else { "-" };
    print!("  {marker} {}", node.permission());
    if !node.context().is_empty() {
        print!(" {}", node.context());
    }
    if let Some(expiry) = node.expiry() {
        print!(" (expires {})", micros_to_rfc3339(expiry));
    }
    println!();
}
