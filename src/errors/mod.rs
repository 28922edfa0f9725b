use colored::*;
use std::{fmt, io};

pub type ReflectResult<T = ()> = Result<T, ReflectError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReflectErrorKind {
    Substitution,
    Input,
    IO,
}

impl fmt::Display for ReflectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ReflectErrorKind::Substitution => "substitution error",
                ReflectErrorKind::Input => "input error",
                ReflectErrorKind::IO => "i/o error",
            }
        )
    }
}

#[derive(Debug)]
pub struct ReflectError {
    pub msg: String,
    pub kind: ReflectErrorKind,
}

impl ReflectError {
    pub fn input<S: Into<String>>(msg: S) -> ReflectError {
        ReflectError {
            msg: msg.into(),
            kind: ReflectErrorKind::Input,
        }
    }

    /// Adds the offending path (or other context) in front of the message.
    pub fn context<S: fmt::Display>(mut self, ctx: S) -> ReflectError {
        self.msg = format!("{}: {}", ctx, self.msg);
        self
    }

    pub fn emit(self) {
        let kind = format!("{}:", self.kind);
        let indent = " ".repeat(kind.len() + 1);
        let msg = self
            .msg
            .lines()
            .enumerate()
            .map(|(i, s)| {
                if i == 0 {
                    s.to_string()
                } else {
                    format!("{}{}", indent, s)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        eprintln!("{} {}", kind.bold().red(), msg.bold());
    }
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl std::error::Error for ReflectError {}

impl From<io::Error> for ReflectError {
    fn from(err: io::Error) -> ReflectError {
        ReflectError {
            msg: err.to_string(),
            kind: ReflectErrorKind::IO,
        }
    }
}

impl From<serde_json::Error> for ReflectError {
    fn from(err: serde_json::Error) -> ReflectError {
        let kind = if err.is_io() {
            ReflectErrorKind::IO
        } else {
            ReflectErrorKind::Input
        };
        ReflectError {
            msg: err.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{ReflectError, ReflectErrorKind};

    #[test]
    fn io_errors_keep_their_message() {
        let err: ReflectError = io::Error::new(io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.kind, ReflectErrorKind::IO);
        assert_eq!(err.to_string(), "i/o error: no such file");
    }

    #[test]
    fn malformed_json_is_an_input_error() {
        let err: ReflectError = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err().into();
        assert_eq!(err.kind, ReflectErrorKind::Input);
    }

    #[test]
    fn context_prefixes_message() {
        let err = ReflectError::input("expected a list").context("bindings.json");
        assert_eq!(err.msg, "bindings.json: expected a list");
    }
}
