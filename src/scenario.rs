use ahash::AHashSet;
use log::trace;
use rand::Rng;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    ops::RangeInclusive,
    path::Path,
};

use crate::{
    Catalog, Cell, GeneratorConfig, HarnessError, ParseError, ParseErrorKind, PlacedPrimitive,
};

/// How a cell is written to a scenario file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CellFormat {
    /// `x,y`
    #[default]
    Bare,
    /// `(x,y)`
    Parenthesized,
}

impl CellFormat {
    pub fn write_cell(self, out: &mut impl Write, (x, y): Cell) -> io::Result<()> {
        match self {
            Self::Bare => writeln!(out, "{x},{y}"),
            Self::Parenthesized => writeln!(out, "({x},{y})"),
        }
    }
}

/// Live cells of generation 0, in the order they were generated.
///
/// Overlapping primitives are not deduplicated; the simulators see the union.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scenario {
    cells: Vec<Cell>,
}

impl Scenario {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The distinct live cells.
    pub fn live_cells(&self) -> AHashSet<Cell> {
        self.cells.iter().copied().collect()
    }

    pub fn write(&self, out: &mut impl Write, format: CellFormat) -> io::Result<()> {
        for &cell in &self.cells {
            format.write_cell(out, cell)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path, format: CellFormat) -> Result<(), HarnessError> {
        let file = File::create(path).map_err(|e| HarnessError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.write(&mut out, format)
            .and_then(|()| out.flush())
            .map_err(|e| HarnessError::io(path, e))
    }

    /// Reads cells in either [`CellFormat`], skipping blank lines.
    pub fn parse(input: impl BufRead) -> Result<Self, ParseError> {
        let mut cells = vec![];
        for (i, line) in input.lines().enumerate() {
            let fail = |kind| ParseError { line: i + 1, kind };
            let line = line.map_err(|e| fail(ParseErrorKind::Io(e)))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let inner = trimmed
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(trimmed);
            let cell = inner
                .split_once(',')
                .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)))
                .ok_or_else(|| fail(ParseErrorKind::BadCoordinate(line.clone())))?;
            cells.push(cell);
        }
        Ok(Self { cells })
    }

    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let file = File::open(path).map_err(|e| HarnessError::io(path, e))?;
        Self::parse(BufReader::new(file)).map_err(|e| {
            HarnessError::io(path, io::Error::new(io::ErrorKind::InvalidData, e))
        })
    }
}

/// Draws scenarios made of randomly rotated and placed catalog primitives.
pub struct ScenarioGenerator {
    catalog: Catalog,
    config: GeneratorConfig,
    anchor_x: RangeInclusive<i64>,
    anchor_y: RangeInclusive<i64>,
}

impl ScenarioGenerator {
    pub fn new(catalog: Catalog, config: GeneratorConfig) -> Result<Self, HarnessError> {
        if catalog.is_empty() {
            return Err(HarnessError::InvalidConfig("empty primitive catalog".into()));
        }
        if config.rotations.is_empty() || config.primitive_count.is_empty() {
            return Err(HarnessError::InvalidConfig(format!(
                "empty sampling range: rotations {:?}, primitive count {:?}",
                config.rotations, config.primitive_count
            )));
        }
        if config.window_width == 0 || config.window_height == 0 {
            return Err(HarnessError::InvalidConfig(
                "placement window must be non-empty".into(),
            ));
        }
        let reach = catalog.reach();
        let anchor_x = clamp_anchor(&config.anchor_x, config.window_width, reach)?;
        let anchor_y = clamp_anchor(&config.anchor_y, config.window_height, reach)?;
        Ok(Self {
            catalog,
            config,
            anchor_x,
            anchor_y,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of primitives for the next scenario.
    pub fn primitive_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.config.primitive_count.clone())
    }

    /// Draws an anchor, then `primitive_count` primitives placed within the
    /// window at that anchor.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        primitive_count: usize,
    ) -> Result<Scenario, HarnessError> {
        // full-domain inclusive ranges: no `hi - lo` is ever computed in i64
        let anchor_x = rng.gen_range(self.anchor_x.clone());
        let anchor_y = rng.gen_range(self.anchor_y.clone());

        let mut cells = vec![];
        for _ in 0..primitive_count {
            let (name, pattern) = self
                .catalog
                .entry(rng.gen_range(0..self.catalog.len()))
                .ok_or_else(|| HarnessError::InvalidConfig("empty primitive catalog".into()))?;
            let placed = PlacedPrimitive {
                name,
                pattern,
                x: anchor_x + rng.gen_range(0..self.config.window_width as i64),
                y: anchor_y + rng.gen_range(0..self.config.window_height as i64),
                rotations: rng.gen_range(self.config.rotations.clone()),
            };
            trace!(
                "{} rotated {} times at ({}, {})",
                placed.name,
                placed.rotations,
                placed.x,
                placed.y
            );
            cells.extend(placed.cells()?);
        }
        Ok(Scenario::new(cells))
    }

    /// [`Self::generate`] with a randomly drawn primitive count.
    pub fn generate_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Scenario, HarnessError> {
        let count = self.primitive_count(rng);
        self.generate(rng, count)
    }
}

/// Clamps `range` so that `anchor - reach` and `anchor + window - 1 + reach`
/// both stay within `i64`.
fn clamp_anchor(
    range: &RangeInclusive<i64>,
    window: u32,
    reach: i64,
) -> Result<RangeInclusive<i64>, HarnessError> {
    let min_ok = i64::MIN + reach;
    let max_ok = i64::MAX - reach - (i64::from(window) - 1);
    if range.is_empty() || min_ok > max_ok {
        return Err(HarnessError::InvalidConfig(format!(
            "anchor range {range:?} leaves no room for a {window}-cell window"
        )));
    }
    let (lo, hi) = range.clone().into_inner();
    Ok(lo.clamp(min_ok, max_ok)..=hi.clamp(min_ok, max_ok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pattern;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SEED: u64 = 42;

    fn generator(config: GeneratorConfig) -> ScenarioGenerator {
        ScenarioGenerator::new(Catalog::builtin(), config).unwrap()
    }

    #[test]
    fn test_same_seed_same_scenario() {
        let gen = generator(GeneratorConfig::default());
        let a = gen
            .generate_random(&mut ChaCha8Rng::seed_from_u64(SEED))
            .unwrap();
        let b = gen
            .generate_random(&mut ChaCha8Rng::seed_from_u64(SEED))
            .unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_cells_stay_near_anchor() {
        let config = GeneratorConfig {
            anchor_x: 1000..=1000,
            anchor_y: -1000..=-1000,
            ..Default::default()
        };
        let gen = generator(config);
        let reach = gen.catalog().reach();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        for _ in 0..20 {
            let scenario = gen.generate(&mut rng, 50).unwrap();
            for &(x, y) in scenario.cells() {
                assert!((1000 - reach..1030 + reach).contains(&x), "x = {x}");
                assert!((-1000 - reach..-970 + reach).contains(&y), "y = {y}");
            }
        }
    }

    #[test]
    fn test_extreme_anchors_do_not_overflow() {
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        for anchor in [i64::MIN..=i64::MIN, i64::MAX..=i64::MAX] {
            let gen = generator(GeneratorConfig {
                anchor_x: anchor.clone(),
                anchor_y: anchor,
                ..Default::default()
            });
            let scenario = gen.generate(&mut rng, 200).unwrap();
            assert!(scenario.len() >= 200 * 3);
        }
    }

    #[test]
    fn test_full_domain_anchor_range() {
        let gen = generator(GeneratorConfig {
            anchor_x: i64::MIN..=i64::MAX,
            anchor_y: i64::MIN..=i64::MAX,
            ..Default::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let mut negative = false;
        let mut positive = false;
        for _ in 0..64 {
            let scenario = gen.generate(&mut rng, 1).unwrap();
            let (x, _) = scenario.cells()[0];
            negative |= x < 0;
            positive |= x > 0;
        }
        assert!(negative && positive);
    }

    #[test]
    fn test_primitive_count_in_range() {
        let gen = generator(GeneratorConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        for _ in 0..1000 {
            assert!((10..200).contains(&gen.primitive_count(&mut rng)));
        }
    }

    #[test]
    fn test_never_unrotated_by_default() {
        // A lone blinker rotated 1 or 3 times is vertical, 2 times horizontal.
        let mut catalog = Catalog::empty();
        catalog.insert("blinker", crate::Pattern::new(vec![(0, 0), (1, 0), (2, 0)]));
        let gen = ScenarioGenerator::new(catalog, GeneratorConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        let (mut vertical, mut horizontal) = (0, 0);
        for _ in 0..300 {
            let scenario = gen.generate(&mut rng, 1).unwrap();
            let cells = scenario.cells();
            if cells.iter().all(|c| c.0 == cells[0].0) {
                vertical += 1;
            } else {
                horizontal += 1;
            }
        }
        assert!(vertical > horizontal, "{vertical} vs {horizontal}");
    }

    #[test]
    fn test_invalid_generator_config() {
        for config in [
            GeneratorConfig {
                anchor_x: 5..=4,
                ..Default::default()
            },
            GeneratorConfig {
                window_height: 0,
                ..Default::default()
            },
            GeneratorConfig {
                rotations: 3..=1,
                ..Default::default()
            },
            GeneratorConfig {
                primitive_count: 5..5,
                ..Default::default()
            },
        ] {
            let result = ScenarioGenerator::new(Catalog::builtin(), config);
            assert!(matches!(result, Err(HarnessError::InvalidConfig(_))));
        }
        let result = ScenarioGenerator::new(Catalog::empty(), GeneratorConfig::default());
        assert!(matches!(result, Err(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_huge_primitives_fail_without_panicking() {
        let mut catalog = Catalog::empty();
        catalog.insert("wide", Pattern::new(vec![(i64::MIN, 0), (i64::MAX, 0)]));
        let result = ScenarioGenerator::new(catalog, GeneratorConfig::default());
        assert!(matches!(result, Err(HarnessError::InvalidConfig(_))));

        let mut catalog = Catalog::empty();
        catalog.insert("long", Pattern::new(vec![(0, 0), (1 << 40, 0)]));
        let gen = ScenarioGenerator::new(catalog, GeneratorConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(SEED);
        assert!(matches!(
            gen.generate(&mut rng, 1),
            Err(HarnessError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_write_and_parse_formats() {
        let scenario = Scenario::new(vec![(1, 2), (-3, 4), (i64::MIN, i64::MAX)]);
        let mut bare = vec![];
        scenario.write(&mut bare, CellFormat::Bare).unwrap();
        assert_eq!(
            String::from_utf8(bare.clone()).unwrap(),
            format!("1,2\n-3,4\n{},{}\n", i64::MIN, i64::MAX)
        );
        let mut parens = vec![];
        scenario.write(&mut parens, CellFormat::Parenthesized).unwrap();
        assert!(String::from_utf8(parens.clone()).unwrap().starts_with("(1,2)\n"));

        assert_eq!(Scenario::parse(&bare[..]).unwrap(), scenario);
        assert_eq!(Scenario::parse(&parens[..]).unwrap(), scenario);
    }

    #[test]
    fn test_parse_reports_line() {
        let err = Scenario::parse(&b"1,2\n\n3;4\n"[..]).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ParseErrorKind::BadCoordinate(_)));
    }

    #[test]
    fn test_overlapping_primitives_kept() {
        let scenario = Scenario::new(vec![(0, 0), (1, 0), (0, 0)]);
        assert_eq!(scenario.len(), 3);
        assert_eq!(scenario.live_cells().len(), 2);
    }
}
