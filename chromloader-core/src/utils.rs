use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use fxhash::FxHashMap as HashMap;

use crate::errors::{RegionSetError, Result};
use crate::models::BedRecord;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| {
        RegionSetError::FileReadError(format!("{}: {}", path.display(), e))
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Lines that carry no region: blanks, comments and UCSC `track`/`browser` headers.
pub fn is_header_line(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

///
/// Read every record of a BED / narrowPeak file, in file order.
///
/// Fails on the first malformed row; the error names the 1-based line number.
///
pub fn read_bed_records<P: AsRef<Path>>(path: P) -> Result<Vec<BedRecord>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if is_header_line(&line) {
            continue;
        }
        let record = line.parse::<BedRecord>().map_err(|e| match e {
            RegionSetError::RegionParseError(msg) => RegionSetError::RegionParseError(format!(
                "{}:{}: {}",
                path.display(),
                idx + 1,
                msg
            )),
            other => other,
        })?;
        records.push(record);
    }

    Ok(records)
}

///
/// Read a chrom sizes file into a hash map.
///
pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<HashMap<String, u32>> {
    let reader = get_dynamic_reader(path.as_ref())?;

    let mut chrom_sizes: HashMap<String, u32> = HashMap::default();

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(name), Some(size)) = (parts.next(), parts.next()) else {
            return Err(RegionSetError::ChromSizesParseError(line.clone()));
        };
        let size = size
            .parse::<u32>()
            .map_err(|_| RegionSetError::ChromSizesParseError(line.clone()))?;

        chrom_sizes.insert(name.to_string(), size);
    }

    Ok(chrom_sizes)
}
