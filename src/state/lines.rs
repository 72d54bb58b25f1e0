use super::BoundingBox;
use crate::{ParseError, ParseErrorKind};
use std::io::BufRead;

/// Line-at-a-time reader that remembers where it is for error reporting.
pub(super) struct LineSource<R> {
    input: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: 0,
            buf: String::new(),
        }
    }

    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            kind,
        }
    }

    /// Next line without its terminator, `None` at end of stream.
    fn next_line(&mut self) -> Result<Option<&str>, ParseError> {
        self.buf.clear();
        let n = self
            .input
            .read_line(&mut self.buf)
            .map_err(|e| self.error(ParseErrorKind::Io(e)))?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }

    fn expect_line(&mut self) -> Result<&str, ParseError> {
        if self.next_line()?.is_none() {
            return Err(self.error(ParseErrorKind::UnexpectedEof));
        }
        Ok(self.buf.trim_end_matches(['\n', '\r']))
    }

    /// Bounding box opening a generation block, skipping blank lines.
    /// `None` when the stream has no further block.
    pub fn next_header(&mut self) -> Result<Option<BoundingBox>, ParseError> {
        loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    return parse_bounds(line)
                        .map(Some)
                        .map_err(|kind| self.error(kind))
                }
            }
        }
    }

    /// Bounding box of a subgrid.
    pub fn expect_header(&mut self) -> Result<BoundingBox, ParseError> {
        let line = self.expect_line()?;
        parse_bounds(line).map_err(|kind| self.error(kind))
    }

    pub fn expect_count(&mut self, what: &'static str) -> Result<u64, ParseError> {
        let line = self.expect_line()?;
        parse_count(line, what).map_err(|kind| self.error(kind))
    }

    /// Reads one comma-separated row of `0`/`1` values into `dst`.
    pub fn expect_row(&mut self, dst: &mut [bool]) -> Result<(), ParseError> {
        let line = self.expect_line()?;
        parse_row(line, dst).map_err(|kind| self.error(kind))
    }
}

/// `(xmin,ymin,width,height)`; the parentheses are optional.
fn parse_bounds(line: &str) -> Result<BoundingBox, ParseErrorKind> {
    let bad = || ParseErrorKind::BadHeader(line.to_string());
    let fields = line
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|f| f.trim().parse::<i64>().map_err(|_| bad()))
        .collect::<Result<Vec<_>, _>>()?;
    let &[xmin, ymin, width, height] = fields.as_slice() else {
        return Err(bad());
    };
    let bounds = BoundingBox::new(
        xmin,
        ymin,
        non_negative(width, "width")?,
        non_negative(height, "height")?,
    );
    if !bounds.fits_plane() {
        return Err(bounds.off_plane());
    }
    Ok(bounds)
}

fn parse_count(line: &str, what: &'static str) -> Result<u64, ParseErrorKind> {
    let value = line
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseErrorKind::BadInteger(line.to_string()))?;
    non_negative(value, what)
}

fn non_negative(value: i64, what: &'static str) -> Result<u64, ParseErrorKind> {
    u64::try_from(value).map_err(|_| ParseErrorKind::Negative { what, value })
}

fn parse_row(line: &str, dst: &mut [bool]) -> Result<(), ParseErrorKind> {
    let line = line.trim();
    if line.is_empty() {
        return match dst.len() {
            0 => Ok(()),
            n => Err(ParseErrorKind::RowLength {
                expected: n as u64,
                found: 0,
            }),
        };
    }
    let mut found = 0;
    for token in line.split(',') {
        let alive = match token.trim() {
            "0" => false,
            "1" => true,
            other => return Err(ParseErrorKind::BadCell(other.to_string())),
        };
        if let Some(cell) = dst.get_mut(found) {
            *cell = alive;
        }
        found += 1;
    }
    if found != dst.len() {
        return Err(ParseErrorKind::RowLength {
            expected: dst.len() as u64,
            found: found as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        assert_eq!(
            parse_bounds("(-9223372036854775808,5,30,60)").unwrap(),
            BoundingBox::new(i64::MIN, 5, 30, 60)
        );
        assert_eq!(
            parse_bounds(" 1, 2, 3, 4 ").unwrap(),
            BoundingBox::new(1, 2, 3, 4)
        );
        assert!(matches!(
            parse_bounds("(1,2,3)"),
            Err(ParseErrorKind::BadHeader(_))
        ));
        assert!(matches!(
            parse_bounds("(1,2,3,x)"),
            Err(ParseErrorKind::BadHeader(_))
        ));
        assert!(matches!(
            parse_bounds("(1,2,-3,4)"),
            Err(ParseErrorKind::Negative { what: "width", .. })
        ));
    }

    #[test]
    fn test_parse_bounds_at_plane_edge() {
        assert_eq!(
            parse_bounds("(9223372036854775807,9223372036854775806,1,2)").unwrap(),
            BoundingBox::new(i64::MAX, i64::MAX - 1, 1, 2)
        );
        assert!(matches!(
            parse_bounds("(9223372036854775807,0,2,1)"),
            Err(ParseErrorKind::OffPlane { width: 2, .. })
        ));
        assert!(matches!(
            parse_bounds("(0,9223372036854775807,1,2)"),
            Err(ParseErrorKind::OffPlane { height: 2, .. })
        ));
        assert!(matches!(
            parse_bounds("(-9223372036854775808,0,9223372036854775807,1)"),
            Ok(BoundingBox { width: 9223372036854775807, .. })
        ));
    }

    #[test]
    fn test_parse_row() {
        let mut row = [false; 4];
        parse_row("0,1,1,0", &mut row).unwrap();
        assert_eq!(row, [false, true, true, false]);
        assert!(matches!(
            parse_row("0,1,1", &mut row),
            Err(ParseErrorKind::RowLength {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            parse_row("0,1,1,0,1", &mut row),
            Err(ParseErrorKind::RowLength {
                expected: 4,
                found: 5
            })
        ));
        assert!(matches!(
            parse_row("0,2,1,0", &mut row),
            Err(ParseErrorKind::BadCell(_))
        ));
        parse_row("", &mut []).unwrap();
    }

    #[test]
    fn test_line_numbers() {
        let mut lines = LineSource::new(&b"\n\n(0,0,1,1)\nx\n"[..]);
        assert_eq!(
            lines.next_header().unwrap(),
            Some(BoundingBox::new(0, 0, 1, 1))
        );
        let err = lines.expect_count("generation").unwrap_err();
        assert_eq!(err.line, 4);
        assert!(matches!(err.kind, ParseErrorKind::BadInteger(_)));
        let err = lines.expect_row(&mut [false]).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof));
        assert_eq!(lines.next_header().unwrap(), None);
    }
}
