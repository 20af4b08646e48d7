//! Output rendering for the chat shell.
//!
//! Sessions talk to a [`Renderer`] rather than to stdout so that the shell,
//! tests, and any future front end can present turns their own way.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// ANSI escape code for dim text (used for the waiting indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant's label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user's label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for informational lines).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Moves to the start of the line and clears it.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Shown while a reply is being prepared.
pub const THINKING_INDICATOR: &str = "pensando...";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a complete turn, e.g. when replaying history.
    fn print_turn(&mut self, label: &str, text: &str, is_user: bool);

    /// Print a complete message from the assistant that did not come from the model.
    fn print_assistant(&mut self, label: &str, text: &str) {
        self.print_turn(label, text, false);
    }

    /// Show that a reply is on its way.
    fn start_thinking(&mut self) {}

    /// Called before the first chunk of a reply; replaces the waiting indicator.
    fn start_response(&mut self, label: &str);

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Called when a response is complete.
    fn finish_response(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    thinking: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            thinking: false,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn label(&self, label: &str, is_user: bool) -> String {
        let color = if is_user { ANSI_GREEN } else { ANSI_CYAN };
        if self.use_color {
            format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET} ")
        } else {
            format!("{label}: ")
        }
    }

    fn clear_thinking(&mut self) {
        if self.thinking {
            if self.use_color {
                print!("{ANSI_CLEAR_LINE}");
            } else {
                println!();
            }
            self.thinking = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_turn(&mut self, label: &str, text: &str, is_user: bool) {
        self.clear_thinking();
        println!("{}{text}", self.label(label, is_user));
        self.flush();
    }

    fn start_thinking(&mut self) {
        print!("{}", self.paint(ANSI_DIM, THINKING_INDICATOR));
        self.thinking = true;
        self.flush();
    }

    fn start_response(&mut self, label: &str) {
        self.clear_thinking();
        print!("{}", self.label(label, false));
        self.flush();
    }

    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_thinking();
        self.flush();
        eprintln!("{}", self.paint(ANSI_RED, &format!("Erro: {error}")));
    }

    fn print_info(&mut self, info: &str) {
        self.clear_thinking();
        println!("{}", self.paint(ANSI_YELLOW, info));
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.clear_thinking();
        println!("{}", self.paint(ANSI_DIM, "[interrompido]"));
        self.flush();
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
