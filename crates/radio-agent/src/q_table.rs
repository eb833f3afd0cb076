//! Dense Q-value table and its plain-text persistence.

use radio_core::{Error, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Row-major table of `states x actions` values
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    cancer_stages: usize,
    healthy_stages: usize,
    actions: usize,
    values: Vec<f64>,
}

impl QTable {
    /// A zero-initialized table
    pub fn new(cancer_stages: usize, healthy_stages: usize, actions: usize) -> Self {
        Self {
            cancer_stages,
            healthy_stages,
            actions,
            values: vec![0.0; cancer_stages * healthy_stages * actions],
        }
    }

    /// `(cancer_stages, healthy_stages, actions)`
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.cancer_stages, self.healthy_stages, self.actions)
    }

    pub fn num_states(&self) -> usize {
        self.cancer_stages * self.healthy_stages
    }

    pub fn num_actions(&self) -> usize {
        self.actions
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[self.index(state, action)]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        let index = self.index(state, action);
        self.values[index] = value;
    }

    pub fn row(&self, state: usize) -> &[f64] {
        assert!(state < self.num_states(), "state {} out of range", state);
        let start = state * self.actions;
        &self.values[start..start + self.actions]
    }

    /// Largest value in the row
    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Action with the largest value; the first one wins ties
    pub fn argmax(&self, state: usize) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn index(&self, state: usize, action: usize) -> usize {
        assert!(state < self.num_states(), "state {} out of range", state);
        assert!(action < self.actions, "action {} out of range", action);
        state * self.actions + action
    }

    /// Write the table in the `<cs> <hs> <actions>` + rows text format
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;

        info!(path = %path.display(), states = self.num_states(), "Saved Q-table");
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(
            writer,
            "{} {} {}",
            self.cancer_stages, self.healthy_stages, self.actions
        )?;
        for state in 0..self.num_states() {
            for value in self.row(state) {
                write!(writer, "{}, ", value)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Replace the values with those stored at `path`.
    ///
    /// The stored dimensions must match this table's. On any error the
    /// table is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        self.load_str(&text)?;

        info!(path = %path.display(), states = self.num_states(), "Loaded Q-table");
        Ok(())
    }

    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let mut lines = text.lines();

        let header = lines
            .next()
            .ok_or_else(|| Error::Parse("empty Q-table file".to_string()))?;
        let dims = parse_header(header)?;
        if dims != self.dims() {
            return Err(Error::DimensionMismatch {
                expected: format!(
                    "{} {} {}",
                    self.cancer_stages, self.healthy_stages, self.actions
                ),
                found: format!("{} {} {}", dims.0, dims.1, dims.2),
            });
        }

        let mut values = Vec::with_capacity(self.values.len());
        for state in 0..self.num_states() {
            let line = lines
                .next()
                .ok_or_else(|| Error::Parse(format!("missing row {}", state)))?;
            let row: Vec<f64> = line
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .take(self.actions)
                .map(|token| {
                    token.parse::<f64>().map_err(|e| {
                        Error::Parse(format!("row {}: bad value '{}': {}", state, token, e))
                    })
                })
                .collect::<Result<_>>()?;
            if row.len() != self.actions {
                return Err(Error::Parse(format!(
                    "row {} has {} values, expected {}",
                    state,
                    row.len(),
                    self.actions
                )));
            }
            values.extend(row);
        }

        self.values = values;
        Ok(())
    }
}

fn parse_header(line: &str) -> Result<(usize, usize, usize)> {
    let fields = line
        .split_whitespace()
        .map(|field| {
            field
                .parse::<usize>()
                .map_err(|e| Error::Parse(format!("bad header field '{}': {}", field, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    match fields.as_slice() {
        [cancer, healthy, actions] => Ok((*cancer, *healthy, *actions)),
        _ => Err(Error::Parse(format!(
            "header must hold 3 integers, found '{}'",
            line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_table() -> QTable {
        let mut table = QTable::new(3, 4, 5);
        for state in 0..table.num_states() {
            for action in 0..table.num_actions() {
                let value = (state as f64 - 5.5) * 0.1 + action as f64 / 3.0;
                table.set(state, action, value);
            }
        }
        table.set(7, 2, 1.0e-9);
        table.set(8, 4, -12345.678901234);
        table
    }

    #[test]
    fn test_new_table_is_zeroed() {
        let table = QTable::new(50, 5, 5);
        assert_eq!(table.dims(), (50, 5, 5));
        assert_eq!(table.values().len(), 1250);
        assert!(table.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_argmax_first_maximum_wins() {
        let mut table = QTable::new(3, 3, 4);
        assert_eq!(table.argmax(0), 0);

        table.set(1, 1, 2.0);
        table.set(1, 3, 2.0);
        assert_eq!(table.argmax(1), 1);
        assert_eq!(table.max_value(1), 2.0);

        table.set(2, 0, -3.0);
        table.set(2, 1, -1.0);
        table.set(2, 2, -2.0);
        table.set(2, 3, -1.5);
        assert_eq!(table.argmax(2), 1);
        assert_eq!(table.max_value(2), -1.0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_state_panics() {
        let table = QTable::new(3, 3, 2);
        table.get(9, 0);
    }

    #[test]
    fn test_text_format() {
        let mut table = QTable::new(3, 1, 2);
        table.set(0, 0, 1.5);
        table.set(2, 1, -0.25);

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "3 1 2\n1.5, 0, \n0, 0, \n0, -0.25, \n");
    }

    #[test]
    fn test_save_load_round_trip() {
        let table = sample_table();
        let temp_file = NamedTempFile::new().unwrap();
        table.save(temp_file.path()).unwrap();

        let mut loaded = QTable::new(3, 4, 5);
        loaded.load(temp_file.path()).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_tolerates_missing_trailing_comma() {
        let mut table = QTable::new(3, 1, 2);
        table
            .load_str("3 1 2\n1.5, -2\n0.25,3,\n  7 , 8 , \n")
            .unwrap();
        assert_eq!(table.row(0), &[1.5, -2.0]);
        assert_eq!(table.row(1), &[0.25, 3.0]);
        assert_eq!(table.row(2), &[7.0, 8.0]);
    }

    #[test]
    fn test_dimension_mismatch_leaves_table_untouched() {
        let temp_file = NamedTempFile::new().unwrap();
        sample_table().save(temp_file.path()).unwrap();

        let mut other = QTable::new(3, 4, 4);
        other.set(0, 0, 42.0);
        let before = other.clone();

        let err = other.load(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(other, before);
    }

    #[test]
    fn test_truncated_file_leaves_table_untouched() {
        let mut table = QTable::new(3, 1, 2);
        table.set(1, 1, 9.0);
        let before = table.clone();

        let err = table.load_str("3 1 2\n1, 2, \n3, \n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(table, before);

        let err = table.load_str("3 1 2\n1, 2, \n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(table, before);
    }

    #[test]
    fn test_bad_header() {
        let mut table = QTable::new(3, 1, 2);
        assert!(matches!(table.load_str(""), Err(Error::Parse(_))));
        assert!(matches!(table.load_str("3 1\n"), Err(Error::Parse(_))));
        assert!(matches!(table.load_str("3 x 2\n"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = QTable::new(3, 1, 2);
        let err = table.load(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
