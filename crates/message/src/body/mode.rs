use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::error::MessageError;

/// The mode a stream was opened with, in the familiar `fopen` notation.
///
/// | mode | read | write | create | truncate |
/// |------|------|-------|--------|----------|
/// | `r`  | yes  |       |        |          |
/// | `r+` | yes  | yes   |        |          |
/// | `w`  |      | yes   | yes    | yes      |
/// | `w+` | yes  | yes   | yes    | yes      |
/// | `a`  |      | append| yes    |          |
/// | `a+` | yes  | append| yes    |          |
/// | `x`  |      | yes   | new    |          |
/// | `x+` | yes  | yes   | new    |          |
/// | `c`  |      | yes   | yes    |          |
/// | `c+` | yes  | yes   | yes    |          |
///
/// `b` and `t` flags are accepted and have no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    kind: ModeKind,
    plus: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeKind {
    Read,
    Write,
    Append,
    Exclusive,
    Create,
}

impl OpenMode {
    /// `w+`, the mode of in-memory streams.
    pub const READ_WRITE: OpenMode = OpenMode { kind: ModeKind::Write, plus: true };

    /// `r`
    pub const READ: OpenMode = OpenMode { kind: ModeKind::Read, plus: false };

    pub fn is_readable(self) -> bool {
        self.kind == ModeKind::Read || self.plus
    }

    pub fn is_writable(self) -> bool {
        self.kind != ModeKind::Read || self.plus
    }

    pub(crate) fn open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable());
        match self.kind {
            ModeKind::Read => {
                options.write(self.plus);
            }
            ModeKind::Write => {
                options.write(true).create(true).truncate(true);
            }
            ModeKind::Append => {
                options.append(true).create(true);
            }
            ModeKind::Exclusive => {
                options.write(true).create_new(true);
            }
            ModeKind::Create => {
                options.write(true).create(true);
            }
        }
        options
    }
}

impl FromStr for OpenMode {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('r') => ModeKind::Read,
            Some('w') => ModeKind::Write,
            Some('a') => ModeKind::Append,
            Some('x') => ModeKind::Exclusive,
            Some('c') => ModeKind::Create,
            _ => return Err(MessageError::invalid_argument(format!("invalid stream mode {s:?}"))),
        };

        let mut plus = false;
        for flag in chars {
            match flag {
                '+' if !plus => plus = true,
                'b' | 't' => {}
                _ => return Err(MessageError::invalid_argument(format!("invalid stream mode {s:?}"))),
            }
        }

        Ok(OpenMode { kind, plus })
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ModeKind::Read => "r",
            ModeKind::Write => "w",
            ModeKind::Append => "a",
            ModeKind::Exclusive => "x",
            ModeKind::Create => "c",
        };
        f.write_str(kind)?;
        if self.plus {
            f.write_str("+")?;
        }
        Ok(())
    }
}
