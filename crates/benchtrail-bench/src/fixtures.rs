//! Deterministic benchmark inputs.
//! Same size → same input, in every run and every process, so samples
//! taken against different commits stay comparable.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;

/// Upper bound (exclusive) of generated values.
const VALUE_RANGE: u64 = 1_000_000;

/// Mixed into the size so that size 0 and size 1 seed different streams.
const SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Input handed to a workload: `size` pseudo-random integers.
#[derive(Debug)]
pub struct BenchInput {
    size: u64,
    values: Vec<i64>,
    file: OnceLock<tempfile::NamedTempFile>,
}

impl BenchInput {
    /// Generate the input for `size`. A pure function of `size`.
    pub fn generate(size: u64) -> Self {
        let mut rng = SimpleRng::new(size ^ SEED_SALT);
        let values = (0..size)
            .map(|_| (rng.next_u64() % VALUE_RANGE) as i64)
            .collect();
        Self {
            size,
            values,
            file: OnceLock::new(),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Path of a temp file holding the values, one per line. Written on
    /// first call and reused afterwards; removed when the input drops.
    pub fn materialize(&self) -> std::io::Result<&Path> {
        if let Some(file) = self.file.get() {
            return Ok(file.path());
        }
        let mut file = tempfile::Builder::new()
            .prefix("benchtrail-input-")
            .suffix(".txt")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            for v in &self.values {
                writeln!(writer, "{v}")?;
            }
            writer.flush()?;
        }
        Ok(self.file.get_or_init(|| file).path())
    }
}

/// Xorshift64 generator. Deterministic: same seed → same sequence.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}
