//! UI utilities for the client.

use std::io::Write;

/// Prompt text: `alice> ` or `alice@bob> ` while a conversation is open
pub fn prompt(username: &str, peer_name: Option<&str>) -> String {
    match peer_name {
        Some(peer) => format!("{}@{}> ", username, peer),
        None => format!("{}> ", username),
    }
}

/// Print output and redisplay the prompt after it
pub fn print_with_prompt(output: &str, prompt: &str) {
    print!("{}", output);
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
