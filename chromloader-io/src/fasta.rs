use std::io::BufRead;
use std::path::Path;

use log::info;

use chromloader_core::utils::get_dynamic_reader;

use crate::error::{Result, StoreError};
use crate::store::{InMemorySequenceStore, SequenceStore};

/// Reference genome loaded fully into memory from a (optionally gzipped) FASTA file.
pub type FastaStore = InMemorySequenceStore;

impl InMemorySequenceStore {
    ///
    /// Load every record of a FASTA file.
    ///
    /// The record name is the first whitespace-delimited token of the header line.
    /// Duplicate names are rejected.
    ///
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path)?;

        let mut store = InMemorySequenceStore::new();
        let mut current: Option<(String, Vec<u8>)> = None;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();

            if let Some(header) = line.strip_prefix('>') {
                if let Some((name, seq)) = current.take() {
                    store.push_record(name, seq)?;
                }
                let name = header.split_whitespace().next().ok_or_else(|| {
                    StoreError::InvalidFasta(format!("empty header in {}", path.display()))
                })?;
                current = Some((name.to_string(), Vec::new()));
            } else if !line.is_empty() {
                match current.as_mut() {
                    Some((_, seq)) => seq.extend_from_slice(line.as_bytes()),
                    None => {
                        return Err(StoreError::InvalidFasta(format!(
                            "sequence data before first header in {}",
                            path.display()
                        )));
                    }
                }
            }
        }
        if let Some((name, seq)) = current.take() {
            store.push_record(name, seq)?;
        }

        info!(
            "Loaded {} sequences from {}",
            store.len(),
            path.display()
        );

        Ok(store)
    }

    fn push_record(&mut self, name: String, seq: Vec<u8>) -> Result<()> {
        if self.chrom_len(&name).is_some() {
            return Err(StoreError::InvalidFasta(format!(
                "duplicate sequence name: {}",
                name
            )));
        }
        self.insert(name, &seq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_from_fasta() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">chr1 some description").unwrap();
        writeln!(file, "ACGT").unwrap();
        writeln!(file, "acgt").unwrap();
        writeln!(file, ">chr2").unwrap();
        writeln!(file, "NNNN").unwrap();

        let store = FastaStore::from_fasta(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.fetch("chr1", 2, 7).unwrap(), b"GTACG".to_vec());
        assert_eq!(store.chrom_len("chr2"), Some(4));
    }

    #[rstest]
    fn test_from_gzipped_fasta() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.fa.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, ">chrX").unwrap();
        writeln!(encoder, "GATTACA").unwrap();
        writeln!(encoder, "CC").unwrap();
        encoder.finish().unwrap();

        let store = FastaStore::from_fasta(&path).unwrap();
        assert_eq!(store.chrom_len("chrX"), Some(9));
        assert_eq!(store.fetch("chrX", 4, 9).unwrap(), b"ACACC".to_vec());
    }

    #[rstest]
    fn test_sequence_before_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ACGT").unwrap();
        assert!(matches!(
            FastaStore::from_fasta(file.path()),
            Err(StoreError::InvalidFasta(_))
        ));
    }

    #[rstest]
    fn test_duplicate_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">chr1\nAC\n>chr1\nGT").unwrap();
        assert!(FastaStore::from_fasta(file.path()).is_err());
    }
}
