use std::io::BufRead;
use std::path::Path;

use log::{info, warn};

use chromloader_core::models::ChromSizes;
use chromloader_core::utils::{get_dynamic_reader, is_header_line};

use crate::error::{Result, StoreError};
use crate::store::InMemoryTrackStore;

impl InMemoryTrackStore {
    ///
    /// Build a dense per-base track from a bedGraph file (`chr start end value`).
    ///
    /// Chromosomes absent from `chrom_sizes` are skipped; uncovered bases are 0.
    ///
    pub fn from_bedgraph<P: AsRef<Path>>(path: P, chrom_sizes: &ChromSizes) -> Result<Self> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;

        let mut store = InMemoryTrackStore::zeros(chrom_sizes);
        let mut skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if is_header_line(&line) {
                continue;
            }

            let invalid = || StoreError::InvalidBedGraph(format!("{}:{}", path.display(), idx + 1));

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(invalid());
            }
            let start = parts[1].parse::<u32>().map_err(|_| invalid())?;
            let end = parts[2].parse::<u32>().map_err(|_| invalid())?;
            let value = parts[3].parse::<f32>().map_err(|_| invalid())?;

            let Some(track) = store.track_mut(parts[0]) else {
                skipped += 1;
                continue;
            };
            if start > end || end as usize > track.len() {
                return Err(invalid());
            }
            track[start as usize..end as usize].fill(value);
        }

        if skipped > 0 {
            warn!(
                "Skipped {} bedGraph intervals on chromosomes missing from chrom sizes",
                skipped
            );
        }
        info!("Loaded signal track from {}", path.display());

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::TrackStore;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[fixture]
    fn chrom_sizes() -> ChromSizes {
        vec![("chr1", 10u32)].into_iter().collect()
    }

    #[rstest]
    fn test_from_bedgraph(chrom_sizes: ChromSizes) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "track type=bedGraph").unwrap();
        writeln!(file, "chr1\t2\t4\t1.5").unwrap();
        writeln!(file, "chr1\t8\t10\t3").unwrap();
        writeln!(file, "chrM\t0\t5\t9").unwrap();

        let store = InMemoryTrackStore::from_bedgraph(file.path(), &chrom_sizes).unwrap();
        assert_eq!(
            store.values("chr1", 0, 10).unwrap(),
            vec![0.0, 0.0, 1.5, 1.5, 0.0, 0.0, 0.0, 0.0, 3.0, 3.0]
        );
    }

    #[rstest]
    fn test_from_gzipped_bedgraph(chrom_sizes: ChromSizes) {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signal.bedGraph.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, "chr1\t0\t3\t2").unwrap();
        encoder.finish().unwrap();

        let store = InMemoryTrackStore::from_bedgraph(&path, &chrom_sizes).unwrap();
        assert_eq!(store.values("chr1", 0, 4).unwrap(), vec![2.0, 2.0, 2.0, 0.0]);
    }

    #[rstest]
    fn test_interval_past_chrom_end(chrom_sizes: ChromSizes) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t5\t20\t1").unwrap();
        assert!(matches!(
            InMemoryTrackStore::from_bedgraph(file.path(), &chrom_sizes),
            Err(StoreError::InvalidBedGraph(_))
        ));
    }
}
