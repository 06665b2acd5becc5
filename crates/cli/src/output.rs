//! Line-delimited JSON on stdout.
//!
//! Each UI boundary event becomes `{"channel": ..., "data": ...}` on its own
//! line, so a front end can consume the stream with any JSON-lines reader.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::Result;

/// Serializes `value` as a single line.
pub fn to_line<T: Serialize>(value: &T) -> Result<String> {
	Ok(serde_json::to_string(value)?)
}

/// Writes `value` as one line to `writer` and flushes it.
pub fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
	writeln!(writer, "{}", to_line(value)?)?;
	writer.flush()?;
	Ok(())
}

pub fn print_line<T: Serialize>(value: &T) -> Result<()> {
	write_line(&mut io::stdout().lock(), value)
}

#[cfg(test)]
mod tests {
	use lcu_protocol::{ConnectionStatus, UiEvent};
	use serde_json::json;

	use super::*;

	#[test]
	fn status_events_have_no_data() {
		let line = to_line(&UiEvent::Status(ConnectionStatus::Disconnected)).unwrap();
		assert_eq!(line, r#"{"channel":"disconnect"}"#);
	}

	#[test]
	fn payload_events_carry_data() {
		let line = to_line(&UiEvent::GameflowPhase(json!("ChampSelect"))).unwrap();
		assert_eq!(line, r#"{"channel":"gameFlowPhase","data":"ChampSelect"}"#);
	}

	#[test]
	fn write_line_terminates_each_record() {
		let mut buf = Vec::new();
		write_line(&mut buf, &UiEvent::Status(ConnectionStatus::Connecting)).unwrap();
		write_line(&mut buf, &UiEvent::Lobby(json!({"partyId": "p"}))).unwrap();

		let text = String::from_utf8(buf).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines, vec![r#"{"channel":"connecting"}"#, r#"{"channel":"lobby","data":{"partyId":"p"}}"#]);
	}
}
