use crate::core::models::family::StructuralFamily;
use crate::core::models::leaf::LeafKind;

const BLOSUM62_ORDER: &str = "ARNDCQEGHILKMFPSTWYV";

#[rustfmt::skip]
const BLOSUM62: [[i8; 20]; 20] = [
    // A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V
    [  4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0], // A
    [ -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3], // R
    [ -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3], // N
    [ -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3], // D
    [  0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1], // C
    [ -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2], // Q
    [ -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2], // E
    [  0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3], // G
    [ -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3], // H
    [ -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3], // I
    [ -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1], // L
    [ -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2], // K
    [ -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1], // M
    [ -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1], // F
    [ -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2], // P
    [  1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2], // S
    [  0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0], // T
    [ -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3], // W
    [ -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1], // Y
    [  0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4], // V
];

const BLOSUM62_MIN: i32 = -4;

/// Amino-acid substitution matrices used to score a candidate motif against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubstitutionMatrix {
    #[default]
    Blosum62,
}

impl SubstitutionMatrix {
    /// Scores two one-letter amino-acid codes. Pairs outside the matrix score its minimum.
    pub fn score(&self, a: char, b: char) -> i32 {
        match self {
            Self::Blosum62 => {
                let index = |c: char| BLOSUM62_ORDER.find(c.to_ascii_uppercase());
                match (index(a), index(b)) {
                    (Some(i), Some(j)) => BLOSUM62[i][j] as i32,
                    _ => BLOSUM62_MIN,
                }
            }
        }
    }

    /// Scores two family keys (three-letter codes); non-amino-acid codes score the minimum.
    pub fn score_families(&self, a: &str, b: &str) -> i32 {
        let one_letter = |code: &str| {
            StructuralFamily::by_code(code)
                .filter(|f| f.kind == LeafKind::AminoAcid)
                .map(|f| f.one_letter)
        };
        match (one_letter(a), one_letter(b)) {
            (Some(x), Some(y)) => self.score(x, y),
            _ => BLOSUM62_MIN,
        }
    }

    /// Sum of pairwise scores over aligned family keys.
    pub fn score_alignment<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> i32 {
        pairs
            .into_iter()
            .map(|(a, b)| self.score_families(a, b))
            .sum()
    }
}
