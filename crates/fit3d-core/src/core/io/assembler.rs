use super::pdb::{PdbError, PdbParseErrorKind};
use super::tokens::{RecordType, Token, atom, header, model, title};
use crate::core::models::atom::{Atom, Element};
use crate::core::models::chain::Chain;
use crate::core::models::family::StructuralFamily;
use crate::core::models::leaf::{LeafIdentifier, LeafKind, LeafSubstructure};
use crate::core::models::model::Model;
use crate::core::models::structure::Structure;
use crate::core::topology::registry::SkeletonRegistry;
use nalgebra::Point3;
use std::str::FromStr;
use tracing::{debug, trace};

/// Tracks whether the assembler is inside a block of TITLE records.
///
/// `Outside --TITLE--> InTitle --TITLE--> InTitle --other--> Outside`. A TITLE record seen
/// while `Outside` starts a new title unless it carries a continuation number, in which
/// case it extends the title collected so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleState {
    #[default]
    Outside,
    InTitle,
}

impl TitleState {
    pub fn next(self, record: RecordType) -> Self {
        match record {
            RecordType::Title => Self::InTitle,
            _ => Self::Outside,
        }
    }
}

#[derive(Debug)]
struct PendingLeaf {
    chain: char,
    serial: i32,
    insertion_code: Option<char>,
    code: String,
    hetero: bool,
    atoms: Vec<Atom>,
}

impl PendingLeaf {
    fn key(&self) -> (i32, Option<char>) {
        (self.serial, self.insertion_code)
    }
}

/// Single-pass state machine that turns a stream of PDB lines into a [`Structure`].
///
/// A fresh assembler is created for every parse; it holds the in-progress chain and
/// residue, the models assembled so far and the title/header state.
pub struct StructureAssembler<'a> {
    skeletons: &'a SkeletonRegistry,
    structure_id: String,
    title_state: TitleState,
    title: Option<String>,
    multi_model: bool,
    models: Vec<Model>,
    chain_id: Option<char>,
    chain: Option<Chain>,
    residue: Option<PendingLeaf>,
}

impl<'a> StructureAssembler<'a> {
    pub fn new(skeletons: &'a SkeletonRegistry) -> Self {
        Self {
            skeletons,
            structure_id: String::new(),
            title_state: TitleState::Outside,
            title: None,
            multi_model: false,
            models: Vec::new(),
            chain_id: None,
            chain: None,
            residue: None,
        }
    }

    pub fn consume_line(&mut self, line_number: usize, line: &str) -> Result<(), PdbError> {
        let record = RecordType::classify(line);
        let previous_title_state = self.title_state;
        self.title_state = previous_title_state.next(record);

        match record {
            r if r.is_atom() => {
                self.consume_atom(line_number, line, record == RecordType::Hetatm)?
            }
            r if r.is_terminator() => self.close_chain(),
            RecordType::Model => self.open_model(line_number, line)?,
            RecordType::Header => {
                let id = header::ID_CODE.extract(line);
                if !id.is_empty() {
                    self.structure_id = id.to_string();
                }
            }
            RecordType::Title => self.consume_title(line, previous_title_state),
            _ => {}
        }
        Ok(())
    }

    /// Closes everything still open, connects bonds and returns the assembled structure.
    pub fn finish(mut self) -> Structure {
        self.close_chain();
        if !self.multi_model && self.models.is_empty() {
            self.models.push(Model::new(1));
        }

        let mut structure =
            Structure::from_parts(String::new(), self.title, self.multi_model, self.models);
        structure.set_id(self.structure_id);
        connect_bonds(&mut structure, self.skeletons);

        debug!(
            id = structure.id(),
            models = structure.models().len(),
            atoms = structure.atom_count(),
            "Structure assembled."
        );
        structure
    }

    fn consume_atom(&mut self, line_number: usize, line: &str, hetero: bool) -> Result<(), PdbError> {
        let chain_id = atom::CHAIN_ID.extract(line).chars().next().unwrap_or(' ');
        let serial: i32 = parse_field(line_number, line, atom::RESIDUE_SERIAL, "residue serial")?;
        let insertion_code = atom::INSERTION_CODE.extract(line).chars().next();

        // The chain id is tracked on its own: the chain value only exists once a residue closes.
        if self.chain_id.is_some_and(|id| id != chain_id) {
            self.close_chain();
        }
        self.chain_id = Some(chain_id);
        if self
            .residue
            .as_ref()
            .is_some_and(|r| r.key() != (serial, insertion_code))
        {
            self.close_residue();
        }

        let parsed = parse_atom(line_number, line)?;
        let pending = self.residue.get_or_insert_with(|| PendingLeaf {
            chain: chain_id,
            serial,
            insertion_code,
            code: atom::RESIDUE_NAME.extract(line).to_string(),
            hetero,
            atoms: Vec::new(),
        });
        pending.atoms.push(parsed);
        Ok(())
    }

    fn consume_title(&mut self, line: &str, previous: TitleState) {
        let text = title::TEXT.extract(line);
        let is_continuation = !title::CONTINUATION.extract(line).is_empty();

        match (&mut self.title, previous) {
            (Some(existing), TitleState::InTitle) => {
                existing.push(' ');
                existing.push_str(text);
            }
            (Some(existing), TitleState::Outside) if is_continuation => {
                existing.push(' ');
                existing.push_str(text);
            }
            _ => self.title = Some(text.to_string()),
        }
    }

    fn open_model(&mut self, line_number: usize, line: &str) -> Result<(), PdbError> {
        self.close_chain();
        let raw = model::SERIAL.extract(line);
        let serial = if raw.is_empty() {
            self.models.len() as u32 + 1
        } else {
            parse_field(line_number, line, model::SERIAL, "model serial")?
        };

        if !self.multi_model {
            self.multi_model = true;
            self.models.retain(|m| !m.is_empty());
        }
        trace!(serial, "Opening model.");
        self.models.push(Model::new(serial));
        Ok(())
    }

    fn current_model_serial(&self) -> u32 {
        self.models.last().map_or(1, |m| m.serial)
    }

    fn close_residue(&mut self) {
        let Some(pending) = self.residue.take() else {
            return;
        };
        let leaf = self.build_leaf(pending);
        self.chain
            .get_or_insert_with(|| Chain::new(leaf.id().chain))
            .add_leaf(leaf);
    }

    fn close_chain(&mut self) {
        self.close_residue();
        self.chain_id = None;
        let Some(chain) = self.chain.take() else {
            return;
        };
        if chain.is_empty() {
            return;
        }
        if self.models.is_empty() {
            self.models.push(Model::new(1));
        }
        if let Some(model) = self.models.last_mut() {
            model.add_chain(chain);
        }
    }

    fn build_leaf(&self, pending: PendingLeaf) -> LeafSubstructure {
        let id = LeafIdentifier::new(
            self.structure_id.clone(),
            self.current_model_serial(),
            pending.chain,
            pending.serial,
            pending.insertion_code,
        );

        let leaf = if let Some(family) = StructuralFamily::by_code(&pending.code) {
            LeafSubstructure::from_family(id, family)
        } else if let Some(skeleton) = self.skeletons.get(&pending.code) {
            LeafSubstructure::new(
                id,
                &pending.code,
                skeleton.family.leaf_kind(),
                skeleton.structural_family(),
            )
            .with_modified(skeleton.family.is_modified())
        } else {
            debug!(code = %pending.code, leaf = %id, "Unknown leaf code, classified as ligand.");
            LeafSubstructure::new(
                id,
                &pending.code,
                LeafKind::Ligand,
                StructuralFamily::unknown_ligand(),
            )
        };

        let mut leaf = leaf.with_hetero(pending.hetero);
        for atom in pending.atoms {
            leaf.insert_atom(atom);
        }
        leaf
    }
}

/// Connects bonds inside every leaf from its family template, or from the skeleton
/// dictionary for leaves whose code is not a standard family. Purely table-driven.
fn connect_bonds(structure: &mut Structure, skeletons: &SkeletonRegistry) {
    for leaf in structure.leaves_mut() {
        if leaf.family().three_letter == leaf.code() {
            for &(first, second, order) in leaf.family().bond_template() {
                leaf.add_bond(first, second, order);
            }
        } else if let Some(skeleton) = skeletons.get(leaf.code()) {
            for bond in &skeleton.bonds {
                leaf.add_bond(&bond.first, &bond.second, bond.order);
            }
        }
    }
}

fn parse_field<T: FromStr>(
    line_number: usize,
    line: &str,
    token: Token,
    field: &'static str,
) -> Result<T, PdbError> {
    let value = token.extract(line);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_number,
        kind: PdbParseErrorKind::InvalidNumber {
            field,
            columns: token.columns(),
            value: value.to_string(),
        },
    })
}

fn parse_optional_field<T: FromStr>(
    line_number: usize,
    line: &str,
    token: Token,
    field: &'static str,
) -> Result<Option<T>, PdbError> {
    if token.extract(line).is_empty() {
        Ok(None)
    } else {
        parse_field(line_number, line, token, field).map(Some)
    }
}

pub(crate) fn parse_charge(value: &str) -> Option<i8> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let (digits, sign) = if let Some(d) = value.strip_suffix('+') {
        (d, 1)
    } else if let Some(d) = value.strip_suffix('-') {
        (d, -1)
    } else if let Some(d) = value.strip_prefix('+') {
        (d, 1)
    } else if let Some(d) = value.strip_prefix('-') {
        (d, -1)
    } else {
        (value, 1)
    };
    let magnitude: i8 = if digits.is_empty() { Some(1) } else { digits.parse().ok() }?;
    Some(sign * magnitude)
}

fn parse_atom(line_number: usize, line: &str) -> Result<Atom, PdbError> {
    let serial: u32 = parse_field(line_number, line, atom::SERIAL, "atom serial")?;
    let raw_name = atom::NAME.extract_raw(line);
    let name = raw_name.trim();
    if name.is_empty() {
        return Err(PdbError::Parse {
            line: line_number,
            kind: PdbParseErrorKind::MissingField {
                field: "atom name",
                columns: atom::NAME.columns(),
            },
        });
    }

    let x: f64 = parse_field(line_number, line, atom::X, "x coordinate")?;
    let y: f64 = parse_field(line_number, line, atom::Y, "y coordinate")?;
    let z: f64 = parse_field(line_number, line, atom::Z, "z coordinate")?;

    let symbol = atom::ELEMENT.extract(line);
    let element = if symbol.is_empty() {
        Element::infer_from_atom_name(raw_name)
    } else {
        Element::from_symbol(symbol)
    }
    .map_err(|e| PdbError::Parse {
        line: line_number,
        kind: PdbParseErrorKind::UnknownElement { symbol: e.0 },
    })?;

    let raw_charge = atom::CHARGE.extract(line);
    let charge = parse_charge(raw_charge);
    if charge.is_none() && !raw_charge.is_empty() {
        return Err(PdbError::Parse {
            line: line_number,
            kind: PdbParseErrorKind::InvalidNumber {
                field: "charge",
                columns: atom::CHARGE.columns(),
                value: raw_charge.to_string(),
            },
        });
    }

    let mut atom = Atom::new(serial, name, element, Point3::new(x, y, z));
    atom.alt_loc = atom::ALT_LOC.extract(line).chars().next();
    atom.occupancy = parse_optional_field(line_number, line, atom::OCCUPANCY, "occupancy")?;
    atom.b_factor =
        parse_optional_field(line_number, line, atom::TEMPERATURE_FACTOR, "temperature factor")?;
    atom.charge = charge;
    Ok(atom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(lines: &[&str]) -> Result<Structure, PdbError> {
        let registry = SkeletonRegistry::bundled().unwrap();
        let mut assembler = StructureAssembler::new(&registry);
        for (i, line) in lines.iter().enumerate() {
            assembler.consume_line(i + 1, line)?;
        }
        Ok(assembler.finish())
    }

    #[test]
    fn title_state_transitions() {
        assert_eq!(TitleState::Outside.next(RecordType::Title), TitleState::InTitle);
        assert_eq!(TitleState::InTitle.next(RecordType::Title), TitleState::InTitle);
        assert_eq!(TitleState::InTitle.next(RecordType::Atom), TitleState::Outside);
        assert_eq!(TitleState::Outside.next(RecordType::Other), TitleState::Outside);
    }

    #[test]
    fn title_continuations_are_joined() {
        let structure = assemble(&[
            "HEADER    HYDROLASE                               01-JAN-00   1ABC              ",
            "TITLE     CRYSTAL STRUCTURE OF A",
            "TITLE    2 SERINE PROTEASE",
            "REMARK   1",
            "TITLE    3 WITH BOUND INHIBITOR",
        ])
        .unwrap();
        assert_eq!(structure.id(), "1ABC");
        assert_eq!(
            structure.title(),
            Some("CRYSTAL STRUCTURE OF A SERINE PROTEASE WITH BOUND INHIBITOR")
        );
    }

    #[test]
    fn new_title_block_replaces_previous_title() {
        let structure = assemble(&["TITLE     FIRST", "REMARK   1", "TITLE     SECOND"]).unwrap();
        assert_eq!(structure.title(), Some("SECOND"));
    }

    #[test]
    fn parse_charge_accepts_both_sign_positions() {
        assert_eq!(parse_charge("2+"), Some(2));
        assert_eq!(parse_charge("1-"), Some(-1));
        assert_eq!(parse_charge("-2"), Some(-2));
        assert_eq!(parse_charge("+"), Some(1));
        assert_eq!(parse_charge(""), None);
        assert_eq!(parse_charge("x+"), None);
    }

    fn atom_line(record: &str, serial: u32, name: &str, code: &str, chain: char, seq: i32) -> String {
        let element = if code == "ZN" { "ZN" } else { &name.trim()[..1] };
        format!(
            "{:<6}{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record, serial, name, code, chain, seq, serial as f64, 0.0, 0.0, 1.0, 0.0, element
        )
    }

    fn chain_layout(structure: &Structure) -> Vec<(char, Vec<i32>)> {
        structure
            .chains()
            .iter()
            .map(|c| (c.id, c.leaves().iter().map(|l| l.id().serial).collect()))
            .collect()
    }

    #[test]
    fn chain_change_closes_residue_and_chain() {
        let structure = assemble(&[
            "ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00  0.00           C  ",
            "ATOM      2  CA  GLY B   1       1.000   0.000   0.000  1.00  0.00           C  ",
        ])
        .unwrap();
        assert_eq!(
            chain_layout(&structure),
            vec![('A', vec![1]), ('B', vec![1])]
        );
        assert_eq!(structure.leaves().count(), 2);
    }

    #[test]
    fn single_residue_chain_is_closed_before_the_next_chain() {
        let lines = [
            atom_line("ATOM", 1, " CA", "GLY", 'A', 1),
            atom_line("ATOM", 2, " CA", "GLY", 'A', 2),
            "TER       3      GLY A   2".to_string(),
            atom_line("HETATM", 4, "ZN", "ZN", 'B', 101),
            atom_line("ATOM", 5, " CA", "GLY", 'C', 1),
            atom_line("ATOM", 6, " CA", "GLY", 'C', 2),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let structure = assemble(&lines).unwrap();
        assert_eq!(
            chain_layout(&structure),
            vec![('A', vec![1, 2]), ('B', vec![101]), ('C', vec![1, 2])]
        );
        let zinc = &structure.chains()[1].leaves()[0];
        assert_eq!(zinc.code(), "ZN");
        assert_eq!(zinc.atom_count(), 1);
    }

    #[test]
    fn single_residue_chains_with_equal_serials_stay_distinct() {
        let lines = [
            atom_line("HETATM", 1, "ZN", "ZN", 'A', 1),
            atom_line("HETATM", 2, "ZN", "ZN", 'B', 1),
            atom_line("HETATM", 3, "ZN", "ZN", 'C', 1),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let structure = assemble(&lines).unwrap();
        assert_eq!(
            chain_layout(&structure),
            vec![('A', vec![1]), ('B', vec![1]), ('C', vec![1])]
        );
        assert!(structure.leaves().all(|l| l.atom_count() == 1));
    }

    #[test]
    fn chain_seen_again_reopens_the_existing_chain() {
        let lines = [
            atom_line("ATOM", 1, " CA", "GLY", 'A', 1),
            "TER       2      GLY A   1".to_string(),
            atom_line("ATOM", 3, " CA", "GLY", 'B', 1),
            "TER       4      GLY B   1".to_string(),
            atom_line("HETATM", 5, " O", "HOH", 'A', 301),
            atom_line("HETATM", 6, " O", "HOH", 'B', 302),
            atom_line("HETATM", 7, " O", "HOH", 'A', 303),
        ];
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let structure = assemble(&lines).unwrap();
        assert_eq!(
            chain_layout(&structure),
            vec![('A', vec![1, 301, 303]), ('B', vec![1, 302])]
        );
        let water = structure.chains()[0].leaves()[1].clone();
        assert!(water.is_hetero());
    }

    #[test]
    fn invalid_coordinate_is_fatal_and_reports_columns() {
        let result = assemble(&[
            "ATOM      1  CA  GLY A   1       0.000   abcde   0.000  1.00  0.00           C  ",
        ]);
        match result {
            Err(PdbError::Parse {
                line,
                kind: PdbParseErrorKind::InvalidNumber { columns, value, .. },
            }) => {
                assert_eq!(line, 1);
                assert_eq!(columns, "39-46");
                assert_eq!(value, "abcde");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_element_is_fatal() {
        let result = assemble(&[
            "ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00  0.00           QQ ",
        ]);
        assert!(matches!(
            result,
            Err(PdbError::Parse {
                kind: PdbParseErrorKind::UnknownElement { .. },
                ..
            })
        ));
    }

    #[test]
    fn blank_element_is_inferred_from_name() {
        let structure = assemble(&[
            "ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00  0.00",
            "HETATM    2 ZN    ZN A 101       3.000   0.000   0.000  1.00  0.00",
        ])
        .unwrap();
        let leaves: Vec<_> = structure.leaves().collect();
        assert_eq!(leaves[0].atom("CA").unwrap().element, Element::CARBON);
        assert_eq!(leaves[1].atom("ZN").unwrap().element.symbol(), "ZN");
    }

    #[test]
    fn ter_without_open_chain_is_harmless() {
        let structure = assemble(&["TER", "END"]).unwrap();
        assert!(!structure.is_multi_model());
        assert_eq!(structure.models().len(), 1);
        assert!(structure.chains().is_empty());
    }
}
