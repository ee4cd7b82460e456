use crate::error::{Result, StorageError};
use crate::models::{SHOTS_PER_SERIES, Shot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesScore {
    pub total: i32,
    pub inner_tens: i32,
}

/// Sums a series. `X` counts ten points and one inner ten.
pub fn score(shots: &[Shot; SHOTS_PER_SERIES]) -> SeriesScore {
    shots.iter().fold(SeriesScore::default(), |acc, shot| SeriesScore {
        total: acc.total + i32::from(shot.value()),
        inner_tens: acc.inner_tens + i32::from(shot.is_inner_ten()),
    })
}

/// Parses raw tokens into a full series, failing before any write happens.
pub fn parse_series<S: AsRef<str>>(tokens: &[S]) -> Result<[Shot; SHOTS_PER_SERIES]> {
    if tokens.len() != SHOTS_PER_SERIES {
        return Err(StorageError::Validation(format!(
            "shots: expected {} shots, got {}",
            SHOTS_PER_SERIES,
            tokens.len()
        )));
    }

    let mut shots = [Shot::Points(0); SHOTS_PER_SERIES];
    for (slot, token) in shots.iter_mut().zip(tokens) {
        *slot = token
            .as_ref()
            .parse()
            .map_err(|e| StorageError::Validation(format!("shots: {}", e)))?;
    }

    Ok(shots)
}
