//! Demo application for the argweave resolver.
//!
//! Declares a small grammar (greet / serve / db init|migrate), resolves
//! the process arguments against it, prints the resolved flags as JSON
//! and dispatches triggered command actions. Also plays the part of the
//! collaborators the library leaves to embedders: help rendering (as
//! JSON help data), error rendering and action dispatch.

use anyhow::Result;
use argweave::{
    Error, ErrorKind, ErrorRenderer, HelpContext, ParseOutput, ROOT, Registry, RootDef, Value,
    cmd, flag, parse,
};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    init_tracing();
    let input: Vec<String> = std::env::args().skip(1).collect();
    let registry = build_grammar()?;

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(parse(&registry, &input));

    let output = match outcome {
        Ok(output) => output,
        Err(err) => {
            eprintln!("error: {}", renderer().render(&err));
            std::process::exit(1);
        }
    };

    if wants_help(&output) {
        return print_help(&registry, &output);
    }

    println!("{}", serde_json::to_string_pretty(&output.flags)?);

    tracing::debug!(commands = output.commands.len(), "dispatching actions");
    for command in &output.commands {
        if let Some(action) = &command.action {
            action(&output.flags);
        }
    }

    Ok(())
}

fn build_grammar() -> Result<Registry> {
    let mut registry = Registry::new(
        RootDef::new("argweave").describe("Demo CLI for the argweave grammar resolver"),
    );

    registry.register_flag(
        ROOT,
        flag("verbose")
            .alias("v")
            .describe("Enable verbose output")
            .switch(),
    )?;
    registry.register_flag(
        ROOT,
        flag("help")
            .alias("h")
            .describe("Show help data for the current command")
            .switch(),
    )?;

    registry.register_command(
        ROOT,
        cmd("greet")
            .describe("Greet someone by name")
            .flag(
                flag("name")
                    .alias("n")
                    .describe("Who to greet")
                    .string()
                    .required(true),
            )
            .flag(flag("shout").describe("Uppercase the greeting").switch())
            .action(|flags| {
                let name = flags.get("name").and_then(Value::as_str).unwrap_or("you");
                let mut line = format!("hello, {name}");
                if flags.get("shout").and_then(Value::as_bool).unwrap_or(false) {
                    line = line.to_uppercase();
                }
                println!("{line}");
            }),
    )?;

    registry.register_command(
        ROOT,
        cmd("serve")
            .describe("Start the demo server")
            .flag(
                flag("port")
                    .alias("p")
                    .describe("Port to listen on")
                    .number()
                    .default_value(8080.0),
            )
            .action(|flags| {
                let port = flags.get("port").and_then(Value::as_num).unwrap_or(0.0);
                println!("serving on port {port}");
            }),
    )?;

    registry.register_command(
        ROOT,
        cmd("db")
            .describe("Database maintenance")
            .flag(flag("url").describe("Connection string").string().required(true))
            .command(
                cmd("init")
                    .describe("Create the schema")
                    .action(|_| println!("database initialized")),
            )
            .command(
                cmd("migrate")
                    .describe("Apply pending migrations")
                    .action(|_| println!("migrations applied")),
            ),
    )?;

    Ok(registry)
}

fn wants_help(output: &ParseOutput) -> bool {
    output.flags.get("help").and_then(Value::as_bool) == Some(true)
}

/// Render help data for the innermost triggered command, or the root when
/// no command was given.
fn print_help(registry: &Registry, output: &ParseOutput) -> Result<()> {
    let focus = output
        .commands
        .last()
        .and_then(|c| registry.find_match(&c.name))
        .map(|node| node.index)
        .unwrap_or(ROOT);
    let Some(context) = HelpContext::new(registry, focus) else {
        anyhow::bail!("no help context for entry {focus}");
    };
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

fn renderer() -> ErrorRenderer {
    ErrorRenderer::new().on(ErrorKind::RequiredMissing, |err| match err {
        Error::RequiredMissing { name, parent } => {
            format!("missing required flag --{name} for '{parent}'")
        }
        other => other.to_string(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
