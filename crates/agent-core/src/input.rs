//! User Input
//!
//! Where the orchestrator blocks for a human. The CLI reads stdin; tests replay
//! a script.

use async_trait::async_trait;
use std::collections::VecDeque;

/// Sentinel that ends the session (case-insensitive)
pub const QUIT: &str = "quit";

pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(QUIT)
}

#[async_trait]
pub trait UserInput: Send {
    /// Next line of user text, or `None` once input is closed
    async fn next_line(&mut self) -> Option<String>;
}

/// Replays a fixed list of lines
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    reads: usize,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            reads: 0,
        }
    }

    /// How many times the orchestrator asked for input
    pub const fn reads(&self) -> usize {
        self.reads
    }
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        self.reads += 1;
        self.lines.pop_front()
    }
}
