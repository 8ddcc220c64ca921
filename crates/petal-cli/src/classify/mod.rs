pub mod inference;
pub mod input;
pub mod interactive;

use anyhow::Result;
use std::io;

use petal_classifiers::session::ClassifierSession;

use input::ClassifyCliConfig;

/// Run an interactive session on stdin/stdout.
pub fn run_session(config: &ClassifyCliConfig) -> Result<()> {
    let registry = inference::load_registry(config)?;
    let mut session = ClassifierSession::new(registry)?;
    if let Some(kind) = config.descriptor {
        if let Err(e) = session.select_descriptor(kind) {
            log::warn!("[Petal::Interactive] {}; using {}", e, session.descriptor());
        }
    }
    let stdin = io::stdin();
    interactive::run_interactive(&mut session, stdin.lock(), io::stdout(), config.top_k)
}
