use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use sable::{
    Engine, Error, FailureMode, MapContext, ScriptSource, Value, render_error,
};
use std::io::{BufRead, BufReader, IsTerminal};
use std::path::PathBuf;
use url::Url;

/// Sable - an embeddable expression language
#[derive(Parser, Debug)]
#[command(name = "sable")]
#[command(about = "Evaluate Sable expressions and scripts", long_about = None)]
struct Args {
    /// Print the translated tree (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Report runtime errors instead of evaluating to null
    #[arg(long)]
    strict: bool,

    /// Run a script file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["url", "expression"])]
    script: Option<PathBuf>,

    /// Run a script fetched from a file:// or http(s):// URL
    #[arg(long, value_name = "URL", conflicts_with = "expression")]
    url: Option<Url>,

    /// Expression to evaluate (if not provided, reads lines from stdin)
    expression: Option<String>,
}

fn print_value(value: &Value) {
    println!("{}", value);
}

/// Compile and evaluate one line as an expression.
fn interpret_expression(engine: &Engine, ctx: &mut MapContext, input: &str, debug_parse: bool) {
    let expr = match engine.compile_expression(input) {
        Ok(expr) => expr,
        Err(e) => {
            render_error(&e, input);
            return;
        }
    };

    if debug_parse {
        println!("=== Translated Tree ===");
        println!("{}", expr.node().outline());
        println!();
    }

    match expr.evaluate(ctx) {
        Ok(value) => print_value(&value),
        Err(e) => render_error(&e, expr.source()),
    }
}

fn interpret_script(engine: &Engine, source: &ScriptSource, debug_parse: bool) -> Result<()> {
    let script = match engine.compile_script_from(Some(source)) {
        Ok(script) => script,
        Err(Error::SourceUnavailable(e)) => {
            return Err(e).into_diagnostic().wrap_err("cannot load script");
        }
        Err(e) => {
            render_error(&e, "");
            return Ok(());
        }
    };

    if debug_parse {
        println!("=== Translated Tree ===");
        println!("{}", script.root().outline());
        println!();
    }

    let mut ctx = MapContext::new();
    match script.execute(&mut ctx) {
        Ok(value) => print_value(&value),
        Err(e) => render_error(&e, script.text()),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control the log level, defaulting to WARN
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let failure_mode = if args.strict {
        FailureMode::Strict
    } else {
        FailureMode::Suppressing
    };
    let engine = Engine::builder()
        .failure_mode(failure_mode)
        .build()
        .into_diagnostic()?;

    if let Some(path) = args.script {
        return interpret_script(&engine, &ScriptSource::file(path), args.debug_parse);
    }
    if let Some(url) = args.url {
        return interpret_script(&engine, &ScriptSource::url(url), args.debug_parse);
    }

    let mut ctx = MapContext::new();

    if let Some(expr) = args.expression {
        interpret_expression(&engine, &mut ctx, &expr, args.debug_parse);
        return Ok(());
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Sable - type one expression per line (Ctrl+D to exit)");
    }

    // Variables assigned on one line stay visible to the following ones.
    let reader = BufReader::new(stdin.lock());
    for line in reader.lines() {
        let line = line.into_diagnostic().wrap_err("error reading from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        interpret_expression(&engine, &mut ctx, &line, args.debug_parse);
    }

    Ok(())
}
