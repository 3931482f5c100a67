use super::assembler::StructureAssembler;
use super::tokens::{RecordLine, atom, header, model, ter, title};
use super::traits::MolecularFile;
use crate::core::models::atom::{Atom, Element};
use crate::core::models::leaf::LeafSubstructure;
use crate::core::models::structure::Structure;
use crate::core::topology::registry::SkeletonRegistry;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid {field} in columns {columns} (value: '{value}')")]
    InvalidNumber {
        field: &'static str,
        columns: String,
        value: String,
    },
    #[error("Required field '{field}' in columns {columns} is empty")]
    MissingField { field: &'static str, columns: String },
    #[error("Unrecognized element symbol '{symbol}'")]
    UnknownElement { symbol: String },
}

/// The PDB fixed-column format.
///
/// Reading recognizes ATOM, HETATM, MODEL, ENDMDL, TER, END, HEADER and TITLE and ignores
/// every other record. Writing emits records in the same column layout, so a structure
/// read from a canonically formatted file is written back byte for byte.
pub struct PdbFile;

impl PdbFile {
    /// Reads a structure, classifying non-standard leaves with the given skeleton dictionary.
    pub fn read_with(
        reader: &mut impl BufRead,
        skeletons: &SkeletonRegistry,
    ) -> Result<Structure, PdbError> {
        let mut assembler = StructureAssembler::new(skeletons);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            assembler.consume_line(index + 1, &line)?;
        }
        Ok(assembler.finish())
    }

    pub fn read_from_str(content: &str) -> Result<Structure, PdbError> {
        Self::read_from(&mut Cursor::new(content))
    }

    pub fn write_to_string(structure: &Structure) -> Result<String, PdbError> {
        let mut buffer = Vec::new();
        Self::write_to(structure, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }
}

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        Self::read_with(reader, SkeletonRegistry::shared())
    }

    /// Reads a file, naming the structure after the file stem when no HEADER id is present.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut structure = Self::read_from(&mut BufReader::new(file))?;
        if structure.id().is_empty() {
            if let Some(stem) = path.file_stem() {
                structure.set_id(stem.to_string_lossy().to_string());
            }
        }
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        if !structure.id().is_empty() {
            let mut line = RecordLine::new(atom::LINE_WIDTH);
            line.put(atom::RECORD_NAME, "HEADER")
                .put(header::ID_CODE, structure.id());
            write_record(writer, &line.finish())?;
        }
        if let Some(text) = structure.title() {
            for (index, chunk) in wrap_title(text).iter().enumerate() {
                let mut line = RecordLine::new(atom::LINE_WIDTH);
                line.put(atom::RECORD_NAME, "TITLE");
                if index > 0 {
                    line.put(title::CONTINUATION, &(index + 1).to_string());
                }
                line.put(title::TEXT, chunk);
                write_record(writer, &line.finish())?;
            }
        }

        for m in structure.models() {
            if structure.is_multi_model() {
                let mut line = RecordLine::new(atom::LINE_WIDTH);
                line.put(atom::RECORD_NAME, "MODEL")
                    .put(model::SERIAL, &m.serial.to_string());
                write_record(writer, &line.finish())?;
            }
            for chain in m.chains() {
                for leaf in chain.leaves() {
                    for a in leaf.atoms() {
                        write_record(writer, &format_atom_record(leaf, a))?;
                    }
                }
                if let Some(last) = chain.leaves().last() {
                    write_record(writer, &format_ter_record(last))?;
                }
            }
            if structure.is_multi_model() {
                write_record(writer, "ENDMDL")?;
            }
        }
        write_record(writer, "END")?;
        Ok(())
    }
}

/// Records are written without trailing blanks.
fn write_record(writer: &mut impl Write, record: &str) -> io::Result<()> {
    writeln!(writer, "{}", record.trim_end())
}

/// Atom names shorter than four characters with a one-letter element start in column 14.
fn format_atom_name(name: &str, element: Element) -> String {
    if name.len() < 4 && element.symbol().len() == 1 {
        format!(" {}", name)
    } else {
        name.to_string()
    }
}

fn format_charge(charge: Option<i8>) -> String {
    match charge {
        Some(c) if c > 0 => format!("{}+", c),
        Some(c) if c < 0 => format!("{}-", -(c as i16)),
        _ => String::new(),
    }
}

fn optional_char(c: Option<char>) -> String {
    c.map(String::from).unwrap_or_default()
}

fn format_atom_record(leaf: &LeafSubstructure, a: &Atom) -> String {
    let id = leaf.id();
    let mut line = RecordLine::new(atom::LINE_WIDTH);
    line.put(
        atom::RECORD_NAME,
        if leaf.is_hetero() { "HETATM" } else { "ATOM" },
    )
    .put(atom::SERIAL, &a.serial.to_string())
    .put(atom::NAME, &format_atom_name(&a.name, a.element))
    .put(atom::ALT_LOC, &optional_char(a.alt_loc))
    .put(atom::RESIDUE_NAME, leaf.code())
    .put(atom::CHAIN_ID, &id.chain.to_string())
    .put(atom::RESIDUE_SERIAL, &id.serial.to_string())
    .put(atom::INSERTION_CODE, &optional_char(id.insertion_code))
    .put(atom::X, &format!("{:.3}", a.position.x))
    .put(atom::Y, &format!("{:.3}", a.position.y))
    .put(atom::Z, &format!("{:.3}", a.position.z))
    .put(
        atom::OCCUPANCY,
        &a.occupancy.map(|o| format!("{:.2}", o)).unwrap_or_default(),
    )
    .put(
        atom::TEMPERATURE_FACTOR,
        &a.b_factor.map(|b| format!("{:.2}", b)).unwrap_or_default(),
    )
    .put(atom::ELEMENT, a.element.symbol())
    .put(atom::CHARGE, &format_charge(a.charge));
    line.finish()
}

fn format_ter_record(last: &LeafSubstructure) -> String {
    let serial = last.atoms().iter().map(|a| a.serial).max().unwrap_or(0) + 1;
    let id = last.id();
    let mut line = RecordLine::new(atom::LINE_WIDTH);
    line.put(atom::RECORD_NAME, "TER")
        .put(ter::SERIAL, &serial.to_string())
        .put(ter::RESIDUE_NAME, last.code())
        .put(ter::CHAIN_ID, &id.chain.to_string())
        .put(ter::RESIDUE_SERIAL, &id.serial.to_string())
        .put(ter::INSERTION_CODE, &optional_char(id.insertion_code));
    line.finish()
}

/// Splits a title into word-aligned chunks that fit the TITLE text columns.
fn wrap_title(text: &str) -> Vec<String> {
    let width = title::TEXT.width();
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
