use anyhow::{bail, Context};
use botflow_conditions::{
    evaluate_simple, is_complex_expression, ConditionEvaluator, EvaluatorConfig, ExecutionContext,
    MemoryVariables, Value,
};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Evaluator limits (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an expression against a variables file
    Eval {
        expression: String,

        /// JSON or YAML object with the execution's variables
        #[arg(long)]
        vars: Option<PathBuf>,

        /// Workflow version the expression belongs to
        #[arg(long = "workflow-version", default_value_t = 1)]
        workflow_version: u32,
    },
    /// Parse and validate an expression without running it
    Check { expression: String },
    /// Report whether an expression needs the full evaluator
    Classify { expression: String },
    /// Apply a simple operator to two JSON operands
    Compare {
        left: String,
        operator: String,
        right: String,

        #[arg(long)]
        case_sensitive: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EvaluatorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EvaluatorConfig::default(),
    }
    .apply_env()?;
    log::debug!("Evaluator config: {:?}", config);

    match args.command {
        Commands::Eval {
            expression,
            vars,
            workflow_version,
        } => {
            let variables = match vars {
                Some(path) => load_variables(&path)?,
                None => MemoryVariables::new(),
            };
            let execution_id = uuid::Uuid::new_v4().to_string();
            let ctx = ExecutionContext::new(
                execution_id,
                "cli",
                "cli",
                workflow_version,
                Arc::new(variables),
            );

            let evaluator = ConditionEvaluator::new(config);
            let value = evaluator.evaluate(&expression, &ctx).await?;
            println!("{}", serde_json::to_string(&value)?);
        }
        Commands::Check { expression } => {
            let evaluator = ConditionEvaluator::new(config);
            match evaluator.compile(&expression, 0).await {
                Ok(_) => println!("ok"),
                Err(e) => bail!("{}: {}", e.kind(), e),
            }
        }
        Commands::Classify { expression } => {
            if is_complex_expression(&expression) {
                println!("complex");
            } else {
                println!("simple");
            }
        }
        Commands::Compare {
            left,
            operator,
            right,
            case_sensitive,
        } => {
            let value = evaluate_simple(
                &parse_operand(&left),
                &operator,
                &parse_operand(&right),
                case_sensitive,
            )?;
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

fn load_variables(path: &Path) -> anyhow::Result<MemoryVariables> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read variables from {}", path.display()))?;
    // YAML parsing also accepts JSON documents
    let vars: serde_json::Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse variables in {}", path.display()))?;
    if !vars.is_object() {
        bail!("Variables file {} must contain an object", path.display());
    }
    Ok(MemoryVariables::from_json(vars))
}

/// JSON operand, falling back to a plain string for bare words
fn parse_operand(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}
