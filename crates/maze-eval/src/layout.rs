//! Maze layout representation: cells, lettered doors and run directives.
//!
//! The layout is built once from line records and is immutable afterwards.
//! Per-state data (door open flags, predecessor links) lives in
//! [`crate::reachability::Traversal`], never here.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

use crate::error::LayoutError;

/// One door per letter `A`-`Z`.
pub const MAX_DOORS: usize = 26;

/// Index of a cell inside a [`Layout`].
pub type CellId = usize;

/// Index of a door inside a [`Layout`].
pub type DoorId = usize;

/// A door letter `A`-`Z`, stored as its alphabet position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "char")]
pub struct DoorLetter(u8);

impl DoorLetter {
    pub fn from_char(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() {
            Some(Self(c as u8 - b'A'))
        } else {
            None
        }
    }

    /// Alphabet position, `A` = 0.
    pub fn index(self) -> u32 {
        u32::from(self.0)
    }

    /// Single-bit mask for this letter in a state word.
    pub fn bit(self) -> u32 {
        1 << self.0
    }

    pub fn as_char(self) -> char {
        char::from(b'A' + self.0)
    }
}

impl From<DoorLetter> for char {
    fn from(letter: DoorLetter) -> char {
        letter.as_char()
    }
}

impl fmt::Display for DoorLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A set of door letters packed into a 26-bit word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LetterSet(u32);

impl LetterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the low 26 bits of `bits`.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits & ((1 << MAX_DOORS) - 1))
    }

    pub fn insert(&mut self, letter: DoorLetter) {
        self.0 |= letter.bit();
    }

    pub fn contains(self, letter: DoorLetter) -> bool {
        self.0 & letter.bit() != 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Letters in alphabetical order.
    pub fn iter(self) -> impl Iterator<Item = DoorLetter> {
        (0..MAX_DOORS as u8)
            .map(DoorLetter)
            .filter(move |letter| self.contains(*letter))
    }
}

impl Serialize for LetterSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// A room in the maze.
#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub name: String,
    /// Every door ever declared against this cell, in declaration order.
    pub doors: SmallVec<[DoorId; 4]>,
}

/// A lettered door between two cells.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Door {
    pub letter: DoorLetter,
    /// Endpoints from the most recent declaration of this letter.
    pub cells: (CellId, CellId),
}

impl Door {
    /// Given one endpoint, return the other one.
    ///
    /// Returns `None` when `cell` is not an endpoint, which happens when a
    /// letter is redeclared with a different pair of cells.
    pub fn other(&self, cell: CellId) -> Option<CellId> {
        if cell == self.cells.0 {
            Some(self.cells.1)
        } else if cell == self.cells.1 {
            Some(self.cells.0)
        } else {
            None
        }
    }
}

/// One structured line of a layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutRecord {
    Start(String),
    End(String),
    ForceClosed(DoorLetter),
    ForceOpen(DoorLetter),
    Contains(Vec<String>),
    Omits(Vec<String>),
    Predicate(String),
    Door {
        letter: DoorLetter,
        first: String,
        second: String,
    },
}

impl LayoutRecord {
    /// Parse one line. `line_no` is only used for error messages.
    ///
    /// Returns `Ok(None)` for lines that are not directives or door
    /// declarations; those are ignored.
    pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Self>, LayoutError> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("START ") {
            return Ok(Some(LayoutRecord::Start(rest.trim().to_string())));
        }
        if let Some(rest) = line.strip_prefix("END ") {
            return Ok(Some(LayoutRecord::End(rest.trim().to_string())));
        }
        if let Some(rest) = line.strip_prefix("CLOSE ") {
            return forced_letter(line_no, rest).map(|l| Some(LayoutRecord::ForceClosed(l)));
        }
        if let Some(rest) = line.strip_prefix("OPEN ") {
            return forced_letter(line_no, rest).map(|l| Some(LayoutRecord::ForceOpen(l)));
        }
        if let Some(rest) = line.strip_prefix("CONTAINS ") {
            return Ok(Some(LayoutRecord::Contains(split_names(rest))));
        }
        if let Some(rest) = line.strip_prefix("OMITS ") {
            return Ok(Some(LayoutRecord::Omits(split_names(rest))));
        }
        if let Some(rest) = line.strip_prefix("? ") {
            return Ok(Some(LayoutRecord::Predicate(rest.trim().to_string())));
        }

        let mut tokens = line.split_whitespace();
        let (Some(door), Some(first), Some(second)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Ok(None);
        };

        let mut door_chars = door.chars();
        let (Some(door_char), None) = (door_chars.next(), door_chars.next()) else {
            return Ok(None);
        };
        if !is_word_char(door_char) || !is_word(first) || !is_word(second) {
            return Ok(None);
        }

        let letter = DoorLetter::from_char(door_char).ok_or(LayoutError::InvalidDoorLetter {
            line: line_no,
            found: door_char,
        })?;

        Ok(Some(LayoutRecord::Door {
            letter,
            first: first.to_string(),
            second: second.to_string(),
        }))
    }
}

fn forced_letter(line_no: usize, rest: &str) -> Result<DoorLetter, LayoutError> {
    // Only the first character after the keyword is significant.
    let found = rest.chars().next().unwrap_or(' ');
    DoorLetter::from_char(found).ok_or(LayoutError::InvalidDoorLetter {
        line: line_no,
        found,
    })
}

fn split_names(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(is_word_char)
}

/// The full maze: graph structure plus run directives.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    cells: Vec<Cell>,
    doors: Vec<Door>,
    #[serde(skip)]
    cell_index: HashMap<String, CellId>,
    #[serde(skip)]
    door_index: [Option<DoorId>; MAX_DOORS],

    pub start: Option<String>,
    pub end: Option<String>,
    pub force_open: LetterSet,
    pub force_closed: LetterSet,
    /// Cells that must appear on the recorded path (`CONTAINS`).
    pub required_cells: Vec<String>,
    /// Cells that must not appear on the recorded path (`OMITS`).
    pub excluded_cells: Vec<String>,
    /// `?` expressions in declaration order.
    pub predicates: Vec<String>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete layout description.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut layout = Layout::new();
        for (idx, line) in text.lines().enumerate() {
            if let Some(record) = LayoutRecord::parse_line(idx + 1, line)? {
                layout.apply(record);
            }
        }
        Ok(layout)
    }

    /// Build a layout from already-parsed records.
    pub fn from_records(records: impl IntoIterator<Item = LayoutRecord>) -> Self {
        let mut layout = Layout::new();
        for record in records {
            layout.apply(record);
        }
        layout
    }

    /// Apply one record. Door declarations create or reuse the door and
    /// both cells; no further validation happens here.
    pub fn apply(&mut self, record: LayoutRecord) {
        match record {
            LayoutRecord::Start(name) => self.start = Some(name),
            LayoutRecord::End(name) => self.end = Some(name),
            LayoutRecord::ForceClosed(letter) => self.force_closed.insert(letter),
            LayoutRecord::ForceOpen(letter) => self.force_open.insert(letter),
            LayoutRecord::Contains(names) => self.required_cells.extend(names),
            LayoutRecord::Omits(names) => self.excluded_cells.extend(names),
            LayoutRecord::Predicate(expr) => self.predicates.push(expr),
            LayoutRecord::Door {
                letter,
                first,
                second,
            } => self.declare_door(letter, &first, &second),
        }
    }

    fn declare_door(&mut self, letter: DoorLetter, first: &str, second: &str) {
        let first = self.intern_cell(first);
        let second = self.intern_cell(second);

        let door_id = match self.door_index[letter.index() as usize] {
            Some(id) => {
                self.doors[id].cells = (first, second);
                id
            }
            None => {
                let id = self.doors.len();
                self.doors.push(Door {
                    letter,
                    cells: (first, second),
                });
                self.door_index[letter.index() as usize] = Some(id);
                id
            }
        };

        for cell in [first, second] {
            let doors = &mut self.cells[cell].doors;
            if !doors.contains(&door_id) {
                doors.push(door_id);
            }
        }
    }

    fn intern_cell(&mut self, name: &str) -> CellId {
        if let Some(&id) = self.cell_index.get(name) {
            return id;
        }
        let id = self.cells.len();
        self.cells.push(Cell {
            name: name.to_string(),
            doors: SmallVec::new(),
        });
        self.cell_index.insert(name.to_string(), id);
        id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }

    pub fn door(&self, id: DoorId) -> &Door {
        &self.doors[id]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }

    pub fn cell_id(&self, name: &str) -> Option<CellId> {
        self.cell_index.get(name).copied()
    }

    pub fn door_by_letter(&self, letter: DoorLetter) -> Option<DoorId> {
        self.door_index[letter.index() as usize]
    }

    /// Letters of every declared door.
    pub fn letters(&self) -> LetterSet {
        let mut set = LetterSet::new();
        for door in &self.doors {
            set.insert(door.letter);
        }
        set
    }

    /// Door ids ordered by letter.
    pub fn doors_by_letter(&self) -> Vec<DoorId> {
        self.letters()
            .iter()
            .filter_map(|letter| self.door_by_letter(letter))
            .collect()
    }

    /// Whether the declared letters are exactly `A`, `B`, ... with no gaps.
    ///
    /// When they are not, letters at alphabet positions at or past the door
    /// count are never enumerated open.
    pub fn has_contiguous_letters(&self) -> bool {
        let bits = self.letters().bits();
        bits & bits.wrapping_add(1) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(c: char) -> DoorLetter {
        DoorLetter::from_char(c).unwrap()
    }

    #[test]
    fn test_door_letter_bits() {
        assert_eq!(letter('A').bit(), 1);
        assert_eq!(letter('C').bit(), 0b100);
        assert_eq!(letter('Z').index(), 25);
        assert_eq!(letter('Q').as_char(), 'Q');
        assert!(DoorLetter::from_char('a').is_none());
        assert!(DoorLetter::from_char('1').is_none());
    }

    #[test]
    fn test_letter_set_iterates_alphabetically() {
        let mut set = LetterSet::new();
        set.insert(letter('D'));
        set.insert(letter('A'));
        set.insert(letter('Z'));
        let letters: String = set.iter().map(|l| l.as_char()).collect();
        assert_eq!(letters, "ADZ");
        assert!(set.contains(letter('D')));
        assert!(!set.contains(letter('B')));
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            LayoutRecord::parse_line(1, "START  Hall ").unwrap(),
            Some(LayoutRecord::Start("Hall".to_string()))
        );
        assert_eq!(
            LayoutRecord::parse_line(1, "CLOSE B").unwrap(),
            Some(LayoutRecord::ForceClosed(letter('B')))
        );
        assert_eq!(
            LayoutRecord::parse_line(1, "OMITS x y").unwrap(),
            Some(LayoutRecord::Omits(vec!["x".to_string(), "y".to_string()]))
        );
        assert_eq!(
            LayoutRecord::parse_line(1, "? open > closed").unwrap(),
            Some(LayoutRecord::Predicate("open > closed".to_string()))
        );
    }

    #[test]
    fn test_parse_door_and_ignored_lines() {
        assert_eq!(
            LayoutRecord::parse_line(1, "A hall kitchen extra").unwrap(),
            Some(LayoutRecord::Door {
                letter: letter('A'),
                first: "hall".to_string(),
                second: "kitchen".to_string(),
            })
        );
        assert_eq!(LayoutRecord::parse_line(1, "").unwrap(), None);
        assert_eq!(LayoutRecord::parse_line(1, "# A x y").unwrap(), None);
        assert_eq!(LayoutRecord::parse_line(1, "AB x y").unwrap(), None);
        assert_eq!(LayoutRecord::parse_line(1, "A x").unwrap(), None);
        assert_eq!(LayoutRecord::parse_line(1, "START").unwrap(), None);
    }

    #[test]
    fn test_lowercase_door_is_rejected() {
        let err = LayoutRecord::parse_line(4, "a x y").unwrap_err();
        assert_eq!(err, LayoutError::InvalidDoorLetter { line: 4, found: 'a' });
    }

    #[test]
    fn test_build_links_cells_and_doors() {
        let layout = Layout::parse("A X Y\nB Y Z\nSTART X\nEND Z\n").unwrap();
        assert_eq!(layout.cell_count(), 3);
        assert_eq!(layout.door_count(), 2);

        let y = layout.cell_id("Y").unwrap();
        assert_eq!(layout.cell(y).doors.len(), 2);

        let b = layout.door_by_letter(letter('B')).unwrap();
        let z = layout.cell_id("Z").unwrap();
        assert_eq!(layout.door(b).other(y), Some(z));
        assert_eq!(layout.door(b).other(layout.cell_id("X").unwrap()), None);
        assert_eq!(layout.start.as_deref(), Some("X"));
    }

    #[test]
    fn test_redeclared_door_keeps_old_links() {
        let layout = Layout::parse("A X Y\nA Y Z\n").unwrap();
        assert_eq!(layout.door_count(), 1);
        let x = layout.cell_id("X").unwrap();
        assert_eq!(layout.cell(x).doors.as_slice(), &[0]);
        assert_eq!(layout.door(0).other(x), None);
    }

    #[test]
    fn test_from_records_matches_parse() {
        let records = vec![
            LayoutRecord::Door {
                letter: letter('A'),
                first: "X".to_string(),
                second: "Y".to_string(),
            },
            LayoutRecord::Start("X".to_string()),
            LayoutRecord::Contains(vec!["Y".to_string()]),
        ];
        let built = Layout::from_records(records);
        let parsed = Layout::parse("A X Y\nSTART X\nCONTAINS Y\n").unwrap();
        assert_eq!(built.cell_count(), parsed.cell_count());
        assert_eq!(built.start, parsed.start);
        assert_eq!(built.required_cells, parsed.required_cells);
    }

    #[test]
    fn test_contiguous_letters() {
        assert!(Layout::parse("A X Y\nB Y Z\n").unwrap().has_contiguous_letters());
        assert!(!Layout::parse("A X Y\nC Y Z\n").unwrap().has_contiguous_letters());
        assert!(Layout::new().has_contiguous_letters());
    }

    #[test]
    fn test_serializes_structure_and_directives() {
        let layout = Layout::parse("B X Y\nSTART X\nEND Y\nOPEN B\n? B.open\n").unwrap();
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["doors"][0]["letter"], "B");
        assert_eq!(json["cells"][1]["name"], "Y");
        assert_eq!(json["force_open"], serde_json::json!(["B"]));
        assert_eq!(json["predicates"][0], "B.open");
    }

    #[test]
    fn test_doors_by_letter() {
        let layout = Layout::parse("C X Y\nA Y Z\n").unwrap();
        let ordered: Vec<char> = layout
            .doors_by_letter()
            .into_iter()
            .map(|id| layout.door(id).letter.as_char())
            .collect();
        assert_eq!(ordered, vec!['A', 'C']);
    }
}
