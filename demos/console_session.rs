//! Type commands instead of speaking them.
//!
//! ```text
//! cargo run --example console_session -- [config.toml]
//! ```
//!
//! Runs without a language model, so only fast-path commands resolve.
//! An empty line counts as silence; `bye` ends the session.

use hearth::action::{Location, Switch};
use hearth::config::PipelineConfig;
use hearth::dispatch::{
    ActuatorError, Actuators, DeviceSnapshot, DispatchEnv, ReplySink, Session, Transcriber,
};
use hearth::llm::OfflineProvider;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct Keyboard;

impl Transcriber for Keyboard {
    fn listen(&self) -> String {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => "bye".to_string(),
            Ok(_) => line,
            Err(_) => String::new(),
        }
    }
}

struct PrintedPanel;

impl Actuators for PrintedPanel {
    fn set_temperature_display(&self, celsius: i32) -> Result<(), ActuatorError> {
        println!("  [display] {celsius} °C");
        Ok(())
    }

    fn set_fan(&self, state: Switch) -> Result<(), ActuatorError> {
        println!("  [fan] {}", state.as_str());
        Ok(())
    }

    fn set_light(&self, location: Location, state: Switch) -> Result<(), ActuatorError> {
        println!("  [light] {} {}", location.as_str(), state.as_str());
        Ok(())
    }
}

struct Console;

impl ReplySink for Console {
    fn say(&self, text: &str) -> io::Result<()> {
        println!("  {text}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hearth=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_file(&PathBuf::from(path))?,
        None => PipelineConfig::default(),
    };

    let env = DispatchEnv::from_config(
        &config,
        Arc::new(Keyboard),
        Arc::new(PrintedPanel),
        Arc::new(OfflineProvider),
    )
    .with_replies(Arc::new(Console));

    let setpoint = config.temperature.default_setpoint;
    let mut session = Session::new(env, DeviceSnapshot::with_setpoint(setpoint))?;
    let report = session.run().await?;

    println!(
        "session {} ended: {} after {} turns",
        report.id,
        report.final_status,
        report.turns.len()
    );
    Ok(())
}
