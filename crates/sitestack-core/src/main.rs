use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sitestack_core::{build_site, SiteConfig, SiteGraph, StackConfig};
use sitestack_kernel::hash::ContentHash;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config = Arg::new("config")
        .long("config")
        .short('c')
        .global(true)
        .default_value("stack.toml")
        .value_parser(value_parser!(PathBuf))
        .help("Stack configuration file");

    Command::new("sitestack")
        .version(sitestack_core::VERSION)
        .about("Static-site deployment graph: certificate, DNS validation, bucket and CDN")
        .subcommand_required(true)
        .arg(config)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose logging"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand(
            Command::new("preview")
                .about("Show the resources that would be registered, in submission order")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("graph").about("Print the dependency graph as Graphviz DOT"))
        .subcommand(
            Command::new("check")
                .about("Validate configuration and graph, print the fingerprint")
                .arg(
                    Arg::new("expect")
                        .long("expect")
                        .value_name("FINGERPRINT")
                        .help("Fail unless the graph fingerprint matches this hex digest"),
                ),
        )
}

fn init_logging(matches: &ArgMatches) {
    let filter = if matches.get_flag("debug") {
        EnvFilter::new("debug")
    } else if matches.get_flag("verbose") {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(matches.get_flag("debug"));

    if matches.get_one::<String>("log-format").map(String::as_str) == Some("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(path: &Path) -> anyhow::Result<SiteGraph> {
    let stack = StackConfig::from_file(path)
        .with_context(|| format!("failed to load stack configuration from {}", path.display()))?;
    let site = SiteConfig::from_stack_config(&stack)
        .with_context(|| format!("incomplete site configuration in {}", path.display()))?;
    let graph = build_site(&site, &stack.context()).context("failed to declare site graph")?;
    Ok(graph)
}

fn render_preview(site: &SiteGraph, json: bool) -> anyhow::Result<String> {
    let plan = site.graph.plan();
    if json {
        return Ok(serde_json::to_string_pretty(&plan)? + "\n");
    }

    let mut out = String::new();
    writeln!(out, "Stack {}/{} ({})", plan.project, plan.stack, plan.fingerprint.short())?;
    writeln!(out)?;
    for (index, step) in plan.steps.iter().enumerate() {
        writeln!(out, "{:>2}. {} {}", index + 1, step.resource_type, step.urn.name())?;
        if let Some(provider) = &step.provider {
            writeln!(out, "      provider: {}", provider.name())?;
        }
        for dependency in &step.depends_on {
            writeln!(out, "      after {} ({})", dependency.urn.name(), dependency.kinds)?;
        }
        writeln!(out, "      inputs: {}", step.inputs)?;
    }
    writeln!(out)?;
    writeln!(out, "Exports:")?;
    for (name, value) in &plan.exports {
        writeln!(out, "  {name} = {value}")?;
    }
    Ok(out)
}

fn render_check(site: &SiteGraph, expected: Option<&str>) -> anyhow::Result<String> {
    let fingerprint = site.graph.fingerprint();
    if let Some(expected) = expected {
        let expected: ContentHash = expected
            .parse()
            .with_context(|| format!("invalid fingerprint {expected:?}"))?;
        anyhow::ensure!(
            expected == fingerprint,
            "fingerprint mismatch: expected {expected}, declared graph is {fingerprint}"
        );
    }
    Ok(format!(
        "ok: {} resources, {} edges, fingerprint {fingerprint}\n",
        site.graph.node_count(),
        site.graph.edge_count(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_logging(&matches);

    let config_path = matches
        .get_one::<PathBuf>("config")
        .context("missing --config")?;
    let site = load(config_path)?;

    let output = match matches.subcommand() {
        Some(("preview", args)) => render_preview(&site, args.get_flag("json"))?,
        Some(("graph", _)) => site.graph.to_dot(),
        Some(("check", args)) => {
            render_check(&site, args.get_one::<String>("expect").map(String::as_str))?
        }
        _ => anyhow::bail!("unknown command; see --help"),
    };
    print!("{output}");
    Ok(())
}
