use super::{split_command, BrowserLauncher};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Opens pages in a configured browser program or the system default
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    program: Option<String>,
}

impl SystemBrowser {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }
}

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) {
        match self.program.as_deref().and_then(split_command) {
            Some((program, args)) => {
                debug!("Opening {} with {}", url, program);
                // The child is not awaited
                if let Err(e) = Command::new(&program)
                    .args(&args)
                    .arg(url)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                {
                    warn!("Failed to launch {}: {}", program, e);
                }
            }
            None => {
                if let Err(e) = webbrowser::open(url) {
                    warn!("Failed to open browser: {}", e);
                }
            }
        }
    }
}
