use tracing::debug;

use crate::value::Scan;

/// Where a declared column lives in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The header has not been read yet.
    Unresolved,
    /// Zero-based field index in every record.
    Resolved(usize),
    /// The header was read and holds no matching name. Skipped on every row.
    Absent,
}

impl Position {
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Resolved(index) => Some(index),
            Self::Unresolved | Self::Absent => None,
        }
    }
}

pub(crate) struct BoundColumn {
    pub(crate) name: String,
    pub(crate) position: Position,
    pub(crate) scanner: Box<dyn Scan>,
}

/// Declared columns in declaration order.
///
/// Declaration order is also the order scanners run on each row, which
/// decides which conversion error gets latched first.
#[derive(Default)]
pub(crate) struct BindingTable {
    columns: Vec<BoundColumn>,
    sealed: bool,
}

impl BindingTable {
    /// Registers a column.
    ///
    /// # Panics
    ///
    /// Panics once the table is sealed; positions are fixed at the first
    /// advance and a late column could never be resolved.
    pub(crate) fn bind(&mut self, name: String, scanner: Box<dyn Scan>) {
        assert!(
            !self.sealed,
            "column '{name}' bound after iteration started; bind every column before the first advance"
        );
        self.columns.push(BoundColumn {
            name,
            position: Position::Unresolved,
            scanner,
        });
    }

    pub(crate) const fn seal(&mut self) {
        self.sealed = true;
    }

    /// Maps every unresolved column onto `header`. The lowest matching index
    /// wins when the header repeats a name.
    pub(crate) fn resolve(&mut self, header: &[String], case_sensitive: bool) {
        for column in &mut self.columns {
            if column.position != Position::Unresolved {
                continue;
            }
            let found = header
                .iter()
                .position(|candidate| names_match(&column.name, candidate, case_sensitive));
            column.position = match found {
                Some(index) => {
                    debug!(column = %column.name, index, "resolved column");
                    Position::Resolved(index)
                }
                None => {
                    debug!(column = %column.name, "column absent from header");
                    Position::Absent
                }
            };
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BoundColumn> {
        self.columns.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut BoundColumn> {
        self.columns.iter_mut()
    }
}

fn names_match(declared: &str, header: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        declared == header
    } else {
        fold_eq(declared, header)
    }
}

/// Unicode simple case folding: equal when every character folds to the same
/// character. Mappings that expand to several characters (`ß` to `SS`) are
/// not applied.
fn fold_eq(left: &str, right: &str) -> bool {
    left == right || left.chars().map(fold_char).eq(right.chars().map(fold_char))
}

/// Round-trips through uppercase so every case variant of a letter (`ς`, `σ`
/// and `Σ`; `ſ`, `s` and `S`) lands on one lowercase form.
fn fold_char(c: char) -> char {
    let upper = single(c.to_uppercase()).unwrap_or(c);
    single(upper.to_lowercase()).unwrap_or(upper)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
