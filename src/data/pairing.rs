use super::error::TableError;

/// Two adjacent columns forming one (independent, dependent) series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPair {
    /// Pair number; the columns sit at positions `2 * index` and `2 * index + 1`.
    pub index: usize,
    pub x_name: String,
    pub y_name: String,
}

impl ColumnPair {
    pub fn x_position(&self) -> usize {
        2 * self.index
    }

    pub fn y_position(&self) -> usize {
        2 * self.index + 1
    }
}

/// Split an ordered column sequence into adjacent pairs.
///
/// Pairing is purely positional: `(columns[2i], columns[2i + 1])`. Names are
/// never inspected.
pub fn pair_columns<S: AsRef<str>>(columns: &[S]) -> Result<Vec<ColumnPair>, TableError> {
    if columns.is_empty() {
        return Err(TableError::malformed("table has no columns"));
    }
    if columns.len() % 2 != 0 {
        return Err(TableError::malformed(format!(
            "expected (Temperature, CTE) column pairs but found {} columns",
            columns.len()
        )));
    }

    Ok(columns
        .chunks_exact(2)
        .enumerate()
        .map(|(index, pair)| ColumnPair {
            index,
            x_name: pair[0].as_ref().to_string(),
            y_name: pair[1].as_ref().to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_cover_every_column_in_order() {
        for n in 1..=6 {
            let columns: Vec<String> = (0..2 * n).map(|i| format!("c{i}")).collect();
            let pairs = pair_columns(&columns).unwrap();
            assert_eq!(pairs.len(), n);

            let flattened: Vec<String> = pairs
                .iter()
                .flat_map(|p| [p.x_name.clone(), p.y_name.clone()])
                .collect();
            assert_eq!(flattened, columns);

            for (i, pair) in pairs.iter().enumerate() {
                assert_eq!(pair.index, i);
                assert_eq!(columns[pair.x_position()], pair.x_name);
                assert_eq!(columns[pair.y_position()], pair.y_name);
            }
        }
    }

    #[test]
    fn names_do_not_influence_pairing() {
        let pairs = pair_columns(&["3K_CTE", "1K_Temperature"]).unwrap();
        assert_eq!(pairs[0].x_name, "3K_CTE");
        assert_eq!(pairs[0].y_name, "1K_Temperature");
    }

    #[test]
    fn odd_and_empty_sequences_are_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            pair_columns(&empty),
            Err(TableError::MalformedTable { .. })
        ));
        for n in [1, 3, 5, 7] {
            let columns: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
            assert!(matches!(
                pair_columns(&columns),
                Err(TableError::MalformedTable { .. })
            ));
        }
    }
}
