//! UI utilities for the client.

use std::io::{BufRead, Write};

use crate::domain::resolve_username;

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    std::io::stdout().flush().ok();
}

/// Ask for a display name on stdin. A blank answer means anonymous.
pub fn prompt_username() -> std::io::Result<String> {
    print!("Enter your name (blank for anonymous): ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(resolve_username(&input))
}
