use super::{Cell, Pattern};
use crate::HarnessError;

const BLINKER: &[Cell] = &[(0, 0), (1, 0), (2, 0)];

const BEACON: &[Cell] = &[(0, 0), (1, 0), (-1, 0), (3, 3), (3, 2), (2, 3)];

const GLIDER: &[Cell] = &[(1, 0), (2, 1), (2, 2), (1, 2), (0, 2)];

const LIGHTWEIGHT_SPACESHIP: &[Cell] = &[
    (1, 0),
    (4, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (1, 3),
    (2, 3),
    (3, 3),
    (4, 2),
];

const EXPLODER: &[Cell] = &[
    (0, 0),
    (2, 0),
    (4, 0),
    (0, 1),
    (4, 1),
    (0, 2),
    (4, 2),
    (0, 3),
    (4, 3),
    (0, 4),
    (2, 4),
    (4, 4),
];

#[rustfmt::skip]
const BOWLING: &[Cell] = &[
    (-4, -4), (-3, -4), (-2, -4), (-4, 4), (-3, 4), (-2, 4), (-4, 0), (-3, 0), (-2, 0),
    (-8, 0), (-7, 0), (-6, 0), (-8, -8), (-7, -8), (-6, -8), (-8, 8), (-7, 8), (-6, 8),
    (1, 0), (2, 0), (3, 0),
    (21, 0), (24, 0), (20, 1), (20, 2), (20, 3), (21, 3), (22, 3), (23, 3), (24, 2),
    (-30, 0), (-30, 2), (-29, 3), (-28, 3), (-27, 0), (-27, 3), (-26, 1), (-26, 2), (-26, 3),
    (-50, 0), (-50, 2), (-49, 3), (-48, 3), (-47, 0), (-47, 3), (-46, 1), (-46, 2), (-46, 3),
    (51, 0), (54, 0), (50, 1), (50, 2), (50, 3), (51, 3), (52, 3), (53, 3), (54, 2),
];

/// Named primitives the scenario generator draws from.
///
/// Entries are kept sorted by name so that sampling with a seeded RNG
/// is reproducible.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<(String, Pattern)>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// Blinker, beacon, glider, lightweight spaceship, exploder and bowling.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (name, cells) in [
            ("blinker", BLINKER),
            ("beacon", BEACON),
            ("glider", GLIDER),
            ("lightweight_spaceship", LIGHTWEIGHT_SPACESHIP),
            ("exploder", EXPLODER),
            ("bowling", BOWLING),
        ] {
            catalog.insert(name, Pattern::new(cells.to_vec()));
        }
        catalog
    }

    /// Adds or replaces a primitive.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is empty.
    pub fn insert(&mut self, name: impl Into<String>, pattern: Pattern) {
        assert!(!pattern.is_empty(), "catalog primitives must be non-empty");
        let name = name.into();
        match self.entries.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(i) => self.entries[i].1 = pattern,
            Err(i) => self.entries.insert(i, (name, pattern)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Pattern, HarnessError> {
        self.entries
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .map(|i| &self.entries[i].1)
            .map_err(|_| HarnessError::UnknownPrimitive {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(","),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `i`-th entry in name order.
    pub fn entry(&self, i: usize) -> Option<(&str, &Pattern)> {
        self.entries.get(i).map(|(n, p)| (n.as_str(), p))
    }

    /// Largest distance from the local origin any primitive can reach,
    /// rotated or not.
    pub fn reach(&self) -> i64 {
        self.entries
            .iter()
            .filter_map(|(_, p)| p.bounds())
            .map(|((x0, y0), (x1, y1))| {
                let span = x1.abs_diff(x0).max(y1.abs_diff(y0));
                [x0, y0, x1, y1]
                    .into_iter()
                    .map(i64::unsigned_abs)
                    .max()
                    .unwrap_or(0)
                    .max(span)
            })
            .max()
            .map_or(0, |r| r.min(i64::MAX as u64) as i64)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_sorted() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            [
                "beacon",
                "blinker",
                "bowling",
                "exploder",
                "glider",
                "lightweight_spaceship"
            ]
        );
    }

    #[test]
    fn test_unknown_primitive_names_it() {
        let err = Catalog::builtin().get("pulsar").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid primitive: pulsar"), "{message}");
        assert!(message.contains("glider"), "{message}");
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = Catalog::builtin();
        let dot = Pattern::new(vec![(0, 0)]);
        catalog.insert("glider", dot.clone());
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.get("glider").unwrap(), &dot);
    }

    #[test]
    fn test_reach() {
        // bowling spans x in [-50, 54]
        assert_eq!(Catalog::builtin().reach(), 104);
        let mut catalog = Catalog::empty();
        catalog.insert("blinker", Pattern::new(BLINKER.to_vec()));
        assert_eq!(catalog.reach(), 2);
    }

    #[test]
    fn test_reach_of_plane_wide_pattern() {
        let mut catalog = Catalog::empty();
        catalog.insert("wide", Pattern::new(vec![(i64::MIN, 0), (i64::MAX, 0)]));
        assert_eq!(catalog.reach(), i64::MAX);
    }
}
