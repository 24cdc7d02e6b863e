//! Message formatting utilities for client display.

use crate::protocol::ServerEvent;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a server event as a line for the terminal.
    pub fn format_event(event: &ServerEvent) -> String {
        match event {
            ServerEvent::SendChatToClient(message) => format!("\n[chat] {}\n", message),
            ServerEvent::Time { time } => format!("\n[time] {}\n", time),
            ServerEvent::ServerResponse { message } => format!("\n[server] {}\n", message),
        }
    }

    /// Format a frame that could not be parsed as a known event.
    pub fn format_raw_message(text: &str) -> String {
        format!("\n[raw] {}\n", text)
    }

    /// Format a notice about an incoming binary frame.
    pub fn format_binary_message(len: usize) -> String {
        format!("\n[binary] {} byte(s)\n", len)
    }
}
