use std::path::Path;

use hicrs_core::{HicError, Result};

///
/// The resolvable coordinates of one fragment-end pair: chromosome and start of each end.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentPair<'a> {
    pub chr_a: &'a str,
    pub pos_a: u32,
    pub chr_b: &'a str,
    pub pos_b: u32,
}

impl<'a> FragmentPair<'a> {
    ///
    /// Parse a `chrA startA endA chrB startB endB` line.
    ///
    /// Only the start of each end is used; trailing columns are ignored.
    ///
    /// # Arguments
    /// - line: the tab separated line
    /// - line_no: 1-based line number, used in error messages
    /// - source: file the line was read from, used in error messages
    pub fn parse(line: &'a str, line_no: usize, source: &Path) -> Result<FragmentPair<'a>> {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 6 {
            return Err(HicError::format(
                source,
                format!(
                    "line {} has {} columns, expected at least 6",
                    line_no,
                    fields.len()
                ),
            ));
        }
        let position = |s: &str| {
            s.parse::<u32>().map_err(|_| {
                HicError::format(
                    source,
                    format!("line {}: invalid position {}", line_no, s),
                )
            })
        };
        Ok(FragmentPair {
            chr_a: fields[0],
            pos_a: position(fields[1])?,
            chr_b: fields[3],
            pos_b: position(fields[4])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parse_pair() {
        let pair = FragmentPair::parse("chr1\t8\t20\tchr2\t2\t30\t+\n", 1, Path::new("pairs.txt"))
                .unwrap();
        assert_eq!(
            pair,
            FragmentPair {
                chr_a: "chr1",
                pos_a: 8,
                chr_b: "chr2",
                pos_b: 2,
            }
        );
    }

    #[rstest]
    #[case("chr1\t8\t20\tchr2\t2")]
    #[case("chr1\t-8\t20\tchr2\t2\t30")]
    #[case("chr1\t8\t20\tchr2\ttwo\t30")]
    fn test_parse_malformed_pair(#[case] line: &str) {
        match FragmentPair::parse(line, 12, Path::new("sample.fragPairs.gz")) {
            Err(HicError::Format { path, msg }) => {
                assert_eq!(path, "sample.fragPairs.gz");
                assert!(msg.contains("line 12"));
            }
            other => panic!("expected a format error, got {:?}", other),
        }
    }
}
