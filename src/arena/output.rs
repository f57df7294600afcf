//! Match results and serialization

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::arena::rules::{Seat, SeatTally};
use crate::core::error::Result;
use crate::core::types::{Cyborgs, Turn};

/// Outcome of one self-play match
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchReport {
    pub seed: u64,
    pub factories: usize,
    pub turns: Turn,
    pub winner: Option<Seat>,
    pub cyborgs: [Cyborgs; 2],
    pub production: [i32; 2],
    pub factories_owned: [usize; 2],
    pub tallies: [SeatTally; 2],
    /// Command fragments the referee could not parse
    pub unparsed: [usize; 2],
    /// Turns a bot could not read and answered `WAIT`
    pub failed_turns: [usize; 2],
    pub elapsed_ms: u64,
}

impl MatchReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let winner = match self.winner {
            Some(Seat::First) => "first seat wins",
            Some(Seat::Second) => "second seat wins",
            None => "draw",
        };
        format!(
            "seed {}: {} after {} turns on {} factories ({} vs {} cyborgs, {} vs {} production) in {}ms",
            self.seed,
            winner,
            self.turns,
            self.factories,
            self.cyborgs[0],
            self.cyborgs[1],
            self.production[0],
            self.production[1],
            self.elapsed_ms,
        )
    }
}

/// Results of several matches
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeriesReport {
    pub matches: Vec<MatchReport>,
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
}

impl SeriesReport {
    pub fn new(matches: Vec<MatchReport>) -> Self {
        let mut report = Self::default();
        for m in &matches {
            match m.winner {
                Some(Seat::First) => report.first_wins += 1,
                Some(Seat::Second) => report.second_wins += 1,
                None => report.draws += 1,
            }
        }
        report.matches = matches;
        report
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Write the full report as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a report written by [`SeriesReport::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        for m in &self.matches {
            out.push_str(&m.summary());
            out.push('\n');
        }
        let turns: Turn = self.matches.iter().map(|m| m.turns).sum();
        let average = if self.matches.is_empty() {
            0.0
        } else {
            f64::from(turns) / self.matches.len() as f64
        };
        out.push_str(&format!(
            "{} matches: first {} / second {} / draws {}, {:.1} turns on average",
            self.matches.len(),
            self.first_wins,
            self.second_wins,
            self.draws,
            average,
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(seed: u64, winner: Option<Seat>) -> MatchReport {
        MatchReport {
            seed,
            factories: 9,
            turns: 120,
            winner,
            cyborgs: [80, 40],
            production: [7, 3],
            factories_owned: [6, 3],
            tallies: [SeatTally::default(); 2],
            unparsed: [0; 2],
            failed_turns: [0; 2],
            elapsed_ms: 15,
        }
    }

    #[test]
    fn test_series_counts_results() {
        let series = SeriesReport::new(vec![
            report(1, Some(Seat::First)),
            report(2, Some(Seat::Second)),
            report(3, None),
            report(4, Some(Seat::First)),
        ]);
        assert_eq!((series.first_wins, series.second_wins, series.draws), (2, 1, 1));
        assert!(series.summary().ends_with("4 matches: first 2 / second 1 / draws 1, 120.0 turns on average"));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("factory_siege_series_{}.json", std::process::id()));
        let series = SeriesReport::new(vec![report(9, None)]);
        series.save(&path).unwrap();
        let loaded = SeriesReport::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.draws, 1);
        assert_eq!(loaded.matches[0].seed, 9);
    }

    #[test]
    fn test_load_garbage_is_serde_error() {
        let path = std::env::temp_dir().join(format!("factory_siege_garbage_{}.json", std::process::id()));
        std::fs::write(&path, "not json").unwrap();
        let result = SeriesReport::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(crate::core::error::PlannerError::SerdeError(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let original = report(5, Some(Seat::Second));
        let parsed: MatchReport = serde_json::from_str(&original.to_json()).unwrap();
        assert_eq!(parsed.winner, Some(Seat::Second));
        assert_eq!(parsed.cyborgs, [80, 40]);
        assert!(original.summary().starts_with("seed 5: second seat wins after 120 turns"));
    }
}
