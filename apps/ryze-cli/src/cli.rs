use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;

use ryze_api::{ApiService, GenerateRequest, RuntimeApi};
use ryze_config::{load_config, RyzeConfig, DEFAULT_CONFIG_PATH};
use ryze_core::codegen::parse_code;
use ryze_core::{tree_to_code, validate_component_tree, ProgressEvent, SchemaRegistry};
use ryze_runtime::{GenerationHandle, RuntimeApp};

use crate::render::EventPrinter;

#[derive(Debug, Parser)]
#[command(name = "ryze", about = "Natural language to validated UI component trees")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP/SSE server
    Server(ServerArgs),
    /// Run one generation turn and print its progress
    Generate(GenerateArgs),
    /// Convert between component tree JSON and UI code
    #[command(subcommand)]
    Transcode(TranscodeCommand),
    /// Print the component library
    Describe,
}

#[derive(Debug, Args, Clone)]
struct ServerArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides `server.listen`
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[derive(Debug, Args, Clone)]
struct GenerateArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Enable pro mode
    #[arg(long)]
    pro: bool,
    /// Component tree JSON file to modify
    #[arg(long, value_name = "FILE")]
    previous: Option<PathBuf>,
    /// Print generated code as it streams
    #[arg(long)]
    code: bool,
    /// Show info-level logs
    #[arg(long)]
    verbose: bool,
    #[arg(value_name = "MESSAGE", required = true)]
    message: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum TranscodeCommand {
    /// Component tree JSON to UI code
    ToCode { file: PathBuf },
    /// UI code to component tree JSON
    ToTree { file: PathBuf },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Server(args) => ryze_server::run_server(args.config, args.listen).await,
            Command::Generate(args) => generate(args).await,
            Command::Transcode(TranscodeCommand::ToCode { file }) => {
                println!("{}", json_file_to_code(&file)?);
                Ok(())
            }
            Command::Transcode(TranscodeCommand::ToTree { file }) => {
                println!("{}", code_file_to_json(&file)?);
                Ok(())
            }
            Command::Describe => {
                print!("{}", SchemaRegistry::global().describe());
                Ok(())
            }
        }
    }
}

/// Load the config file; a missing file at the default path means defaults.
fn load_or_default(path: &Path) -> anyhow::Result<RyzeConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        return Ok(RyzeConfig::default());
    }
    load_config(path).with_context(|| format!("load config '{}' failed", path.display()))
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = load_or_default(&args.config)?;
    if !args.verbose {
        config.observability.log_level = "warn".to_string();
    }
    let previous_tree = match &args.previous {
        Some(path) => Some(read_json(path)?),
        None => None,
    };

    let app = RuntimeApp::from_config(config).context("build runtime app failed")?;
    let api = RuntimeApi::new(app);
    let request = GenerateRequest {
        message: Some(args.message.join(" ")),
        previous_tree,
        pro_mode: Some(args.pro),
        conversation_history: Vec::new(),
    };
    let GenerationHandle {
        mut events,
        cancel,
        task,
    } = api.generate(request).await?;

    let mut printer = EventPrinter::new(args.code);
    let mut stdout = std::io::stdout();
    let interrupt = async {
        // Without a signal handler the turn simply runs to the end.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let end = pump_events(&mut events, interrupt, &mut printer, &mut stdout).await?;
    if end == PumpEnd::Interrupted {
        cancel.cancel();
        drop(events);
        println!();
        println!("cancelled");
    }
    let _ = task.await;
    if end == (PumpEnd::Drained { failed: true }) {
        bail!("generation failed");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpEnd {
    Drained { failed: bool },
    Interrupted,
}

/// Print events until the stream ends or `interrupt` resolves.
///
/// `interrupt` is polled for the whole turn, so a signal that arrives while
/// an event is being printed is still observed on the next iteration.
async fn pump_events<W: Write>(
    events: &mut mpsc::Receiver<ProgressEvent>,
    interrupt: impl Future<Output = ()>,
    printer: &mut EventPrinter,
    out: &mut W,
) -> anyhow::Result<PumpEnd> {
    tokio::pin!(interrupt);
    let mut failed = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    return Ok(PumpEnd::Drained { failed });
                };
                failed |= event.error.is_some();
                write!(out, "{}", printer.render(&event))?;
                out.flush()?;
            }
            _ = &mut interrupt => return Ok(PumpEnd::Interrupted),
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read '{}' failed", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("'{}' is not valid JSON", path.display()))
}

fn json_file_to_code(path: &Path) -> anyhow::Result<String> {
    let value = read_json(path)?;
    let report = validate_component_tree(&value);
    for warning in &report.errors {
        eprintln!("warning: {}", warning);
    }
    let Some(tree) = report.sanitized_tree else {
        bail!("'{}' does not contain a component tree", path.display());
    };
    Ok(tree_to_code(&tree))
}

fn code_file_to_json(path: &Path) -> anyhow::Result<String> {
    let code = std::fs::read_to_string(path)
        .with_context(|| format!("read '{}' failed", path.display()))?;
    let tree = parse_code(&code)?;
    Ok(serde_json::to_string_pretty(&tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ryze-cli-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "ryze", "generate", "--pro", "--code", "a", "login", "form",
        ])
        .unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert!(args.pro && args.code);
                assert_eq!(args.message.join(" "), "a login form");
                assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["ryze", "generate"]).is_err());
    }

    #[test]
    fn test_transcode_files_round_trip() {
        let json = temp_file(
            "tree.json",
            r#"{"type": "Card", "props": {"title": "Hi"}, "children": [
                {"type": "Button", "props": {"text": "Go", "onClick": "x()"}}
            ]}"#,
        );
        let code = json_file_to_code(&json).unwrap();
        assert!(code.contains("<Button text=\"Go\" />"));
        assert!(!code.contains("onClick"));

        let code_path = temp_file("ui.tsx", &code);
        let tree: serde_json::Value =
            serde_json::from_str(&code_file_to_json(&code_path).unwrap()).unwrap();
        assert_eq!(tree["type"], "Card");
        assert_eq!(tree["children"][0]["props"]["text"], "Go");

        let broken = temp_file("broken.tsx", "export default function X() { return (<Card>); }");
        assert!(code_file_to_json(&broken).is_err());

        for path in [json, code_path, broken] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[tokio::test]
    async fn test_pump_drains_until_stream_ends() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(ProgressEvent::step(ryze_core::AgentStep::Planning, "Planning..."))
            .await
            .unwrap();
        tx.send(ProgressEvent::error("model unavailable")).await.unwrap();
        drop(tx);

        let mut printer = EventPrinter::new(false);
        let mut out = Vec::new();
        let end = pump_events(&mut rx, std::future::pending(), &mut printer, &mut out)
            .await
            .unwrap();
        assert_eq!(end, PumpEnd::Drained { failed: true });
        assert!(String::from_utf8(out).unwrap().contains("[planning] Planning..."));
    }

    #[tokio::test]
    async fn test_interrupt_during_busy_stream_is_observed() {
        // The producer keeps the channel full, so the receive arm is always
        // ready; an interrupt that fired mid-turn must still end the pump.
        let (tx, mut rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            while tx.send(ProgressEvent::explanation_chunk("x")).await.is_ok() {}
        });
        let (fire, fired) = tokio::sync::oneshot::channel::<()>();
        let interrupt = async move {
            let _ = fired.await;
        };

        let mut printer = EventPrinter::new(false);
        let mut out = Vec::new();
        let end = {
            let pump = pump_events(&mut rx, interrupt, &mut printer, &mut out);
            tokio::pin!(pump);
            for _ in 0..8 {
                tokio::select! {
                    biased;
                    _ = &mut pump => panic!("pump ended before the interrupt"),
                    _ = tokio::task::yield_now() => {}
                }
            }
            fire.send(()).unwrap();
            tokio::time::timeout(std::time::Duration::from_secs(1), pump)
                .await
                .expect("interrupt was not observed")
                .unwrap()
        };
        assert_eq!(end, PumpEnd::Interrupted);
        assert!(!out.is_empty());

        drop(rx);
        producer.await.unwrap();
    }

    #[test]
    fn test_missing_default_config_falls_back() {
        // Only the default path falls back; an explicit path must exist.
        assert!(load_or_default(Path::new("/no/such/ryze.yaml")).is_err());
    }
}
