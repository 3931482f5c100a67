//! Fixed-column token definitions for PDB records.
//!
//! Every token names a 1-based, inclusive column range and a justification. The same
//! definition drives both extraction and re-serialization, which keeps written records in
//! the exact column layout they were read from.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub justification: Justification,
}

impl Token {
    pub const fn new(start: usize, end: usize, justification: Justification) -> Self {
        Self {
            start,
            end,
            justification,
        }
    }

    pub const fn width(&self) -> usize {
        self.end - self.start + 1
    }

    /// The human-readable column range, e.g. `"31-38"`.
    pub fn columns(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }

    /// Returns the untrimmed content of the token's columns, clipped to the line length.
    pub fn extract_raw<'a>(&self, line: &'a str) -> &'a str {
        if line.len() < self.start {
            return "";
        }
        let end = self.end.min(line.len());
        line.get(self.start - 1..end).unwrap_or("")
    }

    /// Returns the trimmed content of the token's columns; empty if the line ends before
    /// the token starts.
    pub fn extract<'a>(&self, line: &'a str) -> &'a str {
        self.extract_raw(line).trim()
    }

    /// Pads `value` with spaces to the token width according to its justification.
    /// Values wider than the token are cut to the width.
    pub fn format(&self, value: &str) -> String {
        let width = self.width();
        let value: String = value.chars().take(width).collect();
        match self.justification {
            Justification::Left => format!("{:<width$}", value),
            Justification::Right => format!("{:>width$}", value),
        }
    }
}

/// Builds a fixed-width record line by placing formatted tokens into a blank buffer.
#[derive(Debug, Clone)]
pub struct RecordLine {
    buffer: Vec<char>,
}

impl RecordLine {
    pub fn new(width: usize) -> Self {
        Self {
            buffer: vec![' '; width],
        }
    }

    pub fn put(&mut self, token: Token, value: &str) -> &mut Self {
        if self.buffer.len() < token.end {
            self.buffer.resize(token.end, ' ');
        }
        for (offset, c) in token.format(value).chars().enumerate() {
            self.buffer[token.start - 1 + offset] = c;
        }
        self
    }

    pub fn finish(&self) -> String {
        self.buffer.iter().collect()
    }
}

/// Classification of a raw line by its record name (columns 1-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Atom,
    Hetatm,
    Model,
    EndModel,
    Ter,
    Header,
    Title,
    End,
    Other,
}

impl RecordType {
    pub fn classify(line: &str) -> Self {
        match atom::RECORD_NAME.extract(line) {
            "ATOM" => Self::Atom,
            "HETATM" => Self::Hetatm,
            "MODEL" => Self::Model,
            "ENDMDL" => Self::EndModel,
            "TER" => Self::Ter,
            "HEADER" => Self::Header,
            "TITLE" => Self::Title,
            "END" => Self::End,
            _ => Self::Other,
        }
    }

    pub fn is_atom(self) -> bool {
        matches!(self, Self::Atom | Self::Hetatm)
    }

    /// Records after which the in-progress residue and chain are closed.
    pub fn is_terminator(self) -> bool {
        matches!(self, Self::Ter | Self::EndModel | Self::End)
    }
}

pub mod atom {
    use super::Justification::{Left, Right};
    use super::Token;

    pub const RECORD_NAME: Token = Token::new(1, 6, Left);
    pub const SERIAL: Token = Token::new(7, 11, Right);
    pub const NAME: Token = Token::new(13, 16, Left);
    pub const ALT_LOC: Token = Token::new(17, 17, Left);
    pub const RESIDUE_NAME: Token = Token::new(18, 20, Right);
    pub const CHAIN_ID: Token = Token::new(22, 22, Left);
    pub const RESIDUE_SERIAL: Token = Token::new(23, 26, Right);
    pub const INSERTION_CODE: Token = Token::new(27, 27, Left);
    pub const X: Token = Token::new(31, 38, Right);
    pub const Y: Token = Token::new(39, 46, Right);
    pub const Z: Token = Token::new(47, 54, Right);
    pub const OCCUPANCY: Token = Token::new(55, 60, Right);
    pub const TEMPERATURE_FACTOR: Token = Token::new(61, 66, Right);
    pub const ELEMENT: Token = Token::new(77, 78, Right);
    pub const CHARGE: Token = Token::new(79, 80, Left);

    pub const LINE_WIDTH: usize = 80;
}

pub mod model {
    use super::Justification::Right;
    use super::Token;

    pub const SERIAL: Token = Token::new(11, 14, Right);
}

pub mod ter {
    use super::Justification::{Left, Right};
    use super::Token;

    pub const SERIAL: Token = Token::new(7, 11, Right);
    pub const RESIDUE_NAME: Token = Token::new(18, 20, Right);
    pub const CHAIN_ID: Token = Token::new(22, 22, Left);
    pub const RESIDUE_SERIAL: Token = Token::new(23, 26, Right);
    pub const INSERTION_CODE: Token = Token::new(27, 27, Left);
}

pub mod header {
    use super::Justification::Left;
    use super::Token;

    pub const CLASSIFICATION: Token = Token::new(11, 50, Left);
    pub const DEPOSITION_DATE: Token = Token::new(51, 59, Left);
    pub const ID_CODE: Token = Token::new(63, 66, Left);
}

pub mod title {
    use super::Justification::{Left, Right};
    use super::Token;

    pub const CONTINUATION: Token = Token::new(9, 10, Right);
    pub const TEXT: Token = Token::new(11, 80, Left);
}
