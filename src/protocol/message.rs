//! Line tokenizer for controller messages
//!
//! Messages are space-separated parameters terminated by a newline, but the
//! final parameter of a message may itself contain spaces. The number of
//! parameters depends on the keyword, so the line cannot be split up front:
//! callers pull parameters one at a time and take the rest with
//! [`Message::final_token`].

use std::fmt;

/// Reasons a parameter could not be taken from a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
	/// The line was empty before any parameter was taken
	Empty,
	/// Two adjacent separators (or a leading space) produced an empty parameter
	Malformed { line: String },
	/// Every parameter has already been consumed
	Exhausted,
}

impl fmt::Display for MessageError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MessageError::Empty => write!(f, "empty message"),
			MessageError::Malformed { line } => {
				write!(f, "found an empty space-delimited parameter in line: {:?}", line)
			}
			MessageError::Exhausted => write!(f, "nothing remains to parse"),
		}
	}
}

impl std::error::Error for MessageError {}

/// Strip the line terminator (any trailing CR/LF run) from a raw line
pub fn trim_line_end(line: &str) -> &str {
	line.trim_end_matches(&['\r', '\n'][..])
}

/// One line received from the controller, consumed parameter by parameter
#[derive(Debug, Clone)]
pub struct Message {
	rest: String,
	consumed: bool,
}

impl Message {
	pub fn new(line: impl Into<String>) -> Self {
		Self { rest: line.into(), consumed: false }
	}

	/// The part of the line not consumed yet
	pub fn remaining(&self) -> &str {
		trim_line_end(&self.rest)
	}

	/// Consume the next space-delimited parameter
	pub fn next_token(&mut self) -> Result<String, MessageError> {
		let len = trim_line_end(&self.rest).len();
		self.rest.truncate(len);
		if self.rest.is_empty() {
			return Err(if self.consumed { MessageError::Exhausted } else { MessageError::Empty });
		}

		match self.rest.find(' ') {
			Some(0) => Err(MessageError::Malformed { line: self.rest.clone() }),
			Some(pos) => {
				let after = self.rest.split_off(pos + 1);
				let mut token = std::mem::replace(&mut self.rest, after);
				token.pop();
				self.consumed = true;
				Ok(token)
			}
			None => {
				self.consumed = true;
				Ok(std::mem::take(&mut self.rest))
			}
		}
	}

	/// Consume everything that is left as a single parameter (may be empty
	/// and may contain spaces)
	pub fn final_token(&mut self) -> String {
		let len = trim_line_end(&self.rest).len();
		self.rest.truncate(len);
		self.consumed = true;
		std::mem::take(&mut self.rest)
	}
}

impl fmt::Display for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.remaining())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_next_token_walks_parameters() {
		let mut msg = Message::new("a b c\n");
		assert_eq!(msg.next_token().unwrap(), "a");
		assert_eq!(msg.next_token().unwrap(), "b");
		assert_eq!(msg.next_token().unwrap(), "c");
		assert_eq!(msg.next_token(), Err(MessageError::Exhausted));
		assert_eq!(msg.next_token(), Err(MessageError::Exhausted));
	}

	#[test]
	fn test_final_token_keeps_spaces() {
		let mut msg = Message::new("a b c d\r\n");
		assert_eq!(msg.next_token().unwrap(), "a");
		assert_eq!(msg.next_token().unwrap(), "b");
		assert_eq!(msg.final_token(), "c d");
		assert_eq!(msg.next_token(), Err(MessageError::Exhausted));
		assert_eq!(msg.final_token(), "");
	}

	#[test]
	fn test_empty_line() {
		let mut msg = Message::new("\n");
		assert_eq!(msg.next_token(), Err(MessageError::Empty));

		let mut msg = Message::new("");
		assert_eq!(msg.final_token(), "");
	}

	#[test]
	fn test_double_space_is_malformed() {
		let mut msg = Message::new("TRANSFER  STORE key\n");
		assert_eq!(msg.next_token().unwrap(), "TRANSFER");
		assert!(matches!(msg.next_token(), Err(MessageError::Malformed { .. })));
	}

	#[test]
	fn test_leading_space_is_malformed() {
		let mut msg = Message::new(" VALUE x\n");
		assert!(matches!(msg.next_token(), Err(MessageError::Malformed { .. })));
	}

	#[test]
	fn test_single_keyword_line() {
		let mut msg = Message::new("PREPARE\r\n");
		assert_eq!(msg.next_token().unwrap(), "PREPARE");
		assert_eq!(msg.next_token(), Err(MessageError::Exhausted));
	}

	#[test]
	fn test_value_with_empty_payload() {
		// "VALUE " is how the controller reports an unset config
		let mut msg = Message::new("VALUE \n");
		assert_eq!(msg.next_token().unwrap(), "VALUE");
		assert_eq!(msg.final_token(), "");
	}

	#[test]
	fn test_trim_line_end() {
		assert_eq!(trim_line_end("abc\r\n"), "abc");
		assert_eq!(trim_line_end("abc\n\n"), "abc");
		assert_eq!(trim_line_end("a c "), "a c ");
	}

	#[test]
	fn test_remaining_and_display() {
		let mut msg = Message::new("CHECKPRESENT some key\n");
		msg.next_token().unwrap();
		assert_eq!(msg.remaining(), "some key");
		assert_eq!(msg.to_string(), "some key");
	}
}

// vim: ts=4
