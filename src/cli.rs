use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use docucanvas::{
    Canvas, CanvasConfig, CanvasEvent, GoalTree, GraphDocument, Outcome, Scene, SkinKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Parser)]
#[command(
    name = "docucanvas",
    version,
    about = "Render, validate and replay node-graph canvas documents."
)]
struct Cli {
    /// JSON file with canvas settings (grid size, zoom limits, new-node defaults).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Log state transitions and commits.
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a workflow document to SVG.
    Render(RenderArgs),
    /// Validate a document and report dangling connections.
    Check(CheckArgs),
    /// Apply a recorded list of canvas events and export the result.
    Replay(ReplayArgs),
    /// Print a goal tree with completion percentages.
    Goals(GoalsArgs),
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Path to the input document. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Path to the output file. Use '-' to write to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Node vocabulary used for sizes and colours.
    #[arg(long = "skin", value_enum, default_value_t = SkinKind::Workflow)]
    skin: SkinKind,

    /// Background color for the rendered canvas.
    #[arg(short = 'b', long = "background-color", default_value = "white")]
    background_color: String,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Path to the input document. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Path to the input document. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// JSON array of canvas events to dispatch in order.
    #[arg(long = "events")]
    events: PathBuf,

    /// Where to write the exported workflow. Use '-' for stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Also render the final canvas to this SVG file.
    #[arg(long = "svg")]
    svg: Option<PathBuf>,

    #[arg(long = "skin", value_enum, default_value_t = SkinKind::Workflow)]
    skin: SkinKind,
}

#[derive(Debug, Args)]
struct GoalsArgs {
    /// Path to a nested goal tree. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,
}

pub fn dispatch() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file '{}' does not exist", path.display());
            }
            CanvasConfig::load(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?
        }
        None => CanvasConfig::default(),
    };
    debug!(?config, "resolved canvas config");

    match cli.command {
        Command::Render(args) => run_render(args, config, cli.quiet),
        Command::Check(args) => run_check(args, cli.quiet),
        Command::Replay(args) => run_replay(args, config, cli.quiet),
        Command::Goals(args) => run_goals(args),
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run_render(args: RenderArgs, config: CanvasConfig, quiet: bool) -> Result<()> {
    let input_source = parse_input(args.input.as_deref())?;
    let output_dest = parse_output(args.output.as_deref(), &input_source, "svg")?;

    let contents = load_document(&input_source)?;
    let graph = GraphDocument::parse(&contents).context("failed to import document")?;
    let canvas = Canvas::with_config(graph, config, args.skin.skin());

    let svg = Scene::build(&canvas).to_svg(&args.background_color)?;
    write_output(output_dest, svg.as_bytes(), quiet)
}

fn run_check(args: CheckArgs, quiet: bool) -> Result<()> {
    let input_source = parse_input(args.input.as_deref())?;
    let contents = load_document(&input_source)?;
    let graph = GraphDocument::parse(&contents).context("document failed validation")?;

    let dangling = graph.dangling_references();
    for edge in &dangling {
        warn!(from = %edge.from, to = %edge.to, "connection points at a missing node");
    }

    if !quiet {
        println!(
            "{} nodes, {} connections, {} dangling",
            graph.len(),
            graph.connections().len(),
            dangling.len()
        );
        for edge in &dangling {
            println!("warning: '{}' -> '{}' has no target node", edge.from, edge.to);
        }
    }
    Ok(())
}

fn run_replay(args: ReplayArgs, config: CanvasConfig, quiet: bool) -> Result<()> {
    let input_source = parse_input(args.input.as_deref())?;
    let contents = load_document(&input_source)?;
    let workflow = GraphDocument::from_json(&contents)
        .context("failed to import document")?
        .into_workflow();
    let graph = workflow.graph().context("document failed validation")?;

    let raw_events = fs::read_to_string(&args.events)
        .with_context(|| format!("failed to read '{}'", args.events.display()))?;
    let events: Vec<CanvasEvent> = serde_json::from_str(&raw_events)
        .with_context(|| format!("failed to parse events in '{}'", args.events.display()))?;

    let mut canvas = Canvas::with_config(graph, config, args.skin.skin());
    let mut ignored = 0usize;
    for event in events {
        if canvas.dispatch(event) == Outcome::Ignored {
            ignored += 1;
        }
    }
    info!(
        snapshots = canvas.history().len(),
        ignored,
        mode = canvas.state().name(),
        "replay finished"
    );

    let exported = workflow.with_graph(&canvas.snapshot());
    let output_dest = match args.output.as_deref() {
        Some(_) => parse_output(args.output.as_deref(), &input_source, "json")?,
        None => {
            let name = exported.export_file_name();
            match &input_source {
                InputSource::File(path) => OutputDestination::File(path.with_file_name(name)),
                InputSource::Stdin => OutputDestination::File(PathBuf::from(name)),
            }
        }
    };

    if let Some(svg_path) = &args.svg {
        let svg = Scene::build(&canvas).to_svg("white")?;
        // The exported JSON owns stdout when it is written there.
        let svg_quiet = quiet || matches!(output_dest, OutputDestination::Stdout);
        write_output(OutputDestination::File(svg_path.clone()), svg.as_bytes(), svg_quiet)?;
    }
    let mut json = exported.to_json_pretty()?;
    json.push('\n');
    write_output(output_dest, json.as_bytes(), quiet)
}

fn run_goals(args: GoalsArgs) -> Result<()> {
    let input_source = parse_input(args.input.as_deref())?;
    let contents = load_document(&input_source)?;
    let tree = GoalTree::from_json(&contents).context("failed to import goal tree")?;

    let mut out = String::new();
    for (depth, goal) in tree.depth_first() {
        let progress = tree.progress(&goal.id).unwrap_or_default();
        let mark = if goal.is_leaf() {
            if goal.is_complete { "[x] " } else { "[ ] " }
        } else {
            ""
        };
        out.push_str(&format!(
            "{}{}{} ({}%)\n",
            "  ".repeat(depth),
            mark,
            goal.title,
            progress
        ));
    }
    write_output(OutputDestination::Stdout, out.as_bytes(), false)
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
        None => Ok(InputSource::Stdin),
    }
}

fn parse_output(
    output: Option<&str>,
    input: &InputSource,
    ext: &str,
) -> Result<OutputDestination> {
    match output {
        Some("-") => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
        None => match input {
            InputSource::File(path) => Ok(OutputDestination::File(default_output_path(path, ext))),
            InputSource::Stdin => Ok(OutputDestination::File(PathBuf::from(format!("out.{ext}")))),
        },
    }
}

fn default_output_path(input: &Path, ext: &str) -> PathBuf {
    let default_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("{name}.{ext}"))
        .unwrap_or_else(|| format!("out.{ext}"));
    input.with_file_name(default_name)
}

fn load_document(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            if buffer.trim().is_empty() {
                Err(anyhow!("no document supplied on stdin"))
            } else {
                Ok(buffer)
            }
        }
        InputSource::File(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            if contents.trim().is_empty() {
                Err(anyhow!("input file '{}' was empty", path.display()))
            } else {
                Ok(contents)
            }
        }
    }
}

fn write_output(dest: OutputDestination, bytes: &[u8], quiet: bool) -> Result<()> {
    match dest {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputDestination::File(path) => {
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            if !quiet {
                println!("Generated canvas -> {}", path.display());
            }
        }
    }
    Ok(())
}
