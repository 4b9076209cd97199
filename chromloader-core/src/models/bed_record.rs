use std::str::FromStr;

use crate::errors::{RegionSetError, Result};

///
/// One raw row of a BED / narrowPeak file, before it is normalized into a [Region](super::Region).
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BedRecord {
    pub chr: String,
    pub start: u32,
    pub end: u32,

    /// narrowPeak summit offset relative to `start` (column 10), if present.
    pub summit: Option<u32>,
}

impl BedRecord {
    ///
    /// Position the fixed-width window is centered on: the summit when the
    /// record carries one, the midpoint of the record otherwise.
    ///
    pub fn anchor(&self) -> Result<u32> {
        let offset = match self.summit {
            Some(summit) => summit,
            None => self.end.saturating_sub(self.start) / 2,
        };
        self.start.checked_add(offset).ok_or_else(|| {
            RegionSetError::RegionParseError(format!(
                "anchor of {}:{}-{} overflows",
                self.chr, self.start, self.end
            ))
        })
    }
}

impl FromStr for BedRecord {
    type Err = RegionSetError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = line.trim_end().split('\t').collect();

        if parts.len() < 3 {
            return Err(RegionSetError::RegionParseError(format!(
                "expected at least 3 tab-separated fields, found {}",
                parts.len()
            )));
        }

        let chr = parts[0].trim();
        if chr.is_empty() {
            return Err(RegionSetError::RegionParseError(
                "empty chromosome name".to_string(),
            ));
        }

        let start = parts[1].trim().parse::<u32>().map_err(|_| {
            RegionSetError::RegionParseError(format!("invalid start position: {:?}", parts[1]))
        })?;
        let end = parts[2].trim().parse::<u32>().map_err(|_| {
            RegionSetError::RegionParseError(format!("invalid end position: {:?}", parts[2]))
        })?;

        if end < start {
            return Err(RegionSetError::RegionParseError(format!(
                "end ({}) is before start ({})",
                end, start
            )));
        }

        // narrowPeak uses -1 for "no summit called"
        let summit = match parts.get(9) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(s) if s < 0 => None,
                Ok(s) => match u32::try_from(s) {
                    Ok(s) if s <= end - start => Some(s),
                    _ => {
                        return Err(RegionSetError::RegionParseError(format!(
                            "summit offset {} lies outside {}-{}",
                            s, start, end
                        )));
                    }
                },
                Err(_) => {
                    return Err(RegionSetError::RegionParseError(format!(
                        "invalid summit offset: {:?}",
                        raw
                    )));
                }
            },
            None => None,
        };

        Ok(BedRecord {
            chr: chr.to_string(),
            start,
            end,
            summit,
        })
    }
}
