//! Plain-text rendering of progress events.

use ryze_core::{AgentStep, ProgressEvent};

/// Turns the event stream into terminal output.
///
/// Chunk events are written as they arrive; a step event first ends a
/// chunk run that stopped mid-line.
#[derive(Debug, Default)]
pub struct EventPrinter {
    show_code: bool,
    /// Last chunk left the cursor mid-line.
    in_chunks: bool,
    code_started: bool,
}

impl EventPrinter {
    pub fn new(show_code: bool) -> Self {
        Self {
            show_code,
            ..Self::default()
        }
    }

    pub fn render(&mut self, event: &ProgressEvent) -> String {
        let mut out = String::new();

        if let Some(chunk) = &event.code_chunk {
            if self.show_code {
                if !self.code_started {
                    self.close_chunks(&mut out);
                    out.push_str("--- code ---\n");
                    self.code_started = true;
                }
                out.push_str(chunk);
                self.in_chunks = !chunk.ends_with('\n');
            }
        }
        if let Some(chunk) = &event.explanation_chunk {
            out.push_str(chunk);
            self.in_chunks = !chunk.ends_with('\n');
        }

        let Some(step) = event.step else {
            return out;
        };
        self.close_chunks(&mut out);

        if let Some(response) = &event.direct_response {
            out.push_str(response);
            out.push('\n');
            return out;
        }
        match step {
            AgentStep::Error => {
                out.push_str("[error] ");
                out.push_str(event.error.as_deref().unwrap_or("unknown error"));
                out.push('\n');
            }
            AgentStep::Complete => {
                match event.version {
                    Some(version) => out.push_str(&format!("[complete] version {}\n", version)),
                    None => out.push_str("[complete]\n"),
                }
            }
            _ => {
                out.push_str(&format!(
                    "[{}] {}\n",
                    step.as_str(),
                    event.message.as_deref().unwrap_or_default()
                ));
            }
        }
        if let Some(plan) = &event.plan {
            out.push_str(&format!("  intent: {}\n  layout: {}\n", plan.intent, plan.layout));
        }
        if !event.warnings.is_empty() {
            out.push_str(&format!("  {} validation warning(s):\n", event.warnings.len()));
            for warning in &event.warnings {
                out.push_str(&format!("  - {}\n", warning));
            }
        }
        out
    }

    fn close_chunks(&mut self, out: &mut String) {
        if self.in_chunks {
            out.push('\n');
            self.in_chunks = false;
        }
    }
}
