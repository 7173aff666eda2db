// The catalog of elections (maps.json) and the contest summaries.

use log::{debug, info};

use crate::render::config_reader::{MapSettings, DEFAULT_SHAPES_FILE};
use crate::render::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use std::collections::{BTreeMap, HashMap};
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub name: String,
    pub party: Option<String>,
    pub column: String,
    pub total: String,
    /// Overrides the results file of the election.
    pub csv: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub csv: String,
    pub candidates: Vec<CatalogCandidate>,
}

impl Election {
    pub fn candidate_file(&self, candidate: &CatalogCandidate) -> String {
        match candidate.csv.as_deref() {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => self.csv.clone(),
        }
    }

    /// The distinct results files of the election, in candidate order.
    pub fn files(&self) -> Vec<String> {
        let mut res: Vec<String> = Vec::new();
        for c in self.candidates.iter() {
            let f = self.candidate_file(c);
            if !res.contains(&f) {
                res.push(f);
            }
        }
        res
    }
}

/// The color preference of a party. Unknown parties have no preference.
pub fn party_color(party: Option<&str>) -> &'static str {
    match party {
        Some("dem") => "blue",
        Some("rep") => "red",
        Some("green") => "green",
        Some("lib") => "yellow",
        Some("una") => "purple",
        _ => "any",
    }
}

pub fn read_catalog(path: &str) -> MapResult<Vec<Election>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let elections: Vec<Election> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    info!("read_catalog: {} elections in {}", elections.len(), path);
    Ok(elections)
}

/// The elections carrying all the given tags.
pub fn filter_by_tags<'a>(elections: &'a [Election], tags: &[String]) -> Vec<&'a Election> {
    elections
        .iter()
        .filter(|e| tags.iter().all(|t| e.tags.contains(t)))
        .collect()
}

pub fn find_election<'a>(elections: &'a [Election], name: &str) -> MapResult<&'a Election> {
    elections
        .iter()
        .find(|e| e.name == name)
        .context(UnknownElectionSnafu { name })
}

fn candidate_list(election: &Election, f: impl Fn(&CatalogCandidate) -> String) -> Option<JSValue> {
    Some(JSValue::Array(
        election
            .candidates
            .iter()
            .map(|c| JSValue::String(f(c)))
            .collect(),
    ))
}

/// The map of an election: one series per candidate, colored by party,
/// over the default shapes.
pub fn settings_from_election(election: &Election) -> MapSettings {
    MapSettings {
        file: Some(DEFAULT_SHAPES_FILE.to_string()),
        csv: candidate_list(election, |c| election.candidate_file(c)),
        portion: candidate_list(election, |c| c.column.clone()),
        total: candidate_list(election, |c| c.total.clone()),
        name: candidate_list(election, |c| c.name.clone()),
        color: candidate_list(election, |c| party_color(c.party.as_deref()).to_string()),
        title: Some(election.name.clone()),
        ..MapSettings::default()
    }
}

/// Column name -> sum of the numeric cells of the column.
pub type ColumnSums = BTreeMap<String, f64>;

/// Sums every column of a results file. Cells that are not numbers are
/// ignored.
pub fn column_sums(rows: &[RawRow]) -> ColumnSums {
    let mut res: ColumnSums = BTreeMap::new();
    for row in rows.iter() {
        for (column, value) in row.iter() {
            if let Ok(x) = value.trim().parse::<f64>() {
                if x.is_finite() {
                    *res.entry(column.clone()).or_insert(0.0) += x;
                }
            }
        }
    }
    res
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ContestCounts {
    pub votes: f64,
    pub total_votes: f64,
    /// Rounded to two decimals, 0 when there are no votes at all.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CandidateSummary {
    pub name: String,
    pub party: Option<String>,
    /// Absent when the results file of the candidate could not be read.
    pub counts: Option<ContestCounts>,
}

/// Summarizes the contest of an election from the column sums of its files.
pub fn summarize(
    election: &Election,
    sums_by_file: &HashMap<String, ColumnSums>,
) -> Vec<CandidateSummary> {
    election
        .candidates
        .iter()
        .map(|c| {
            let counts = sums_by_file.get(&election.candidate_file(c)).map(|sums| {
                let votes = sums.get(&c.column).cloned().unwrap_or(0.0);
                let total_votes = sums.get(&c.total).cloned().unwrap_or(0.0);
                let percent = if total_votes > 0.0 {
                    (votes / total_votes * 100.0 * 100.0).round() / 100.0
                } else {
                    0.0
                };
                ContestCounts {
                    votes,
                    total_votes,
                    percent,
                }
            });
            debug!("summarize: {}: {:?}", c.name, counts);
            CandidateSummary {
                name: c.name.clone(),
                party: c.party.clone(),
                counts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"name": "2024 President", "tags": ["2024", "federal"], "csv": "pres2024.csv",
         "candidates": [
            {"name": "Harris", "party": "dem", "column": "harris", "total": "all"},
            {"name": "Trump", "party": "rep", "column": "trump", "total": "all"},
            {"name": "Oliver", "party": "lib", "column": "oliver", "total": "all", "csv": "minor2024.csv"}
         ]},
        {"name": "2022 Council", "tags": ["2022", "local"], "csv": "council2022.csv",
         "candidates": [
            {"name": "Smith", "column": "smith", "total": "ballots"}
         ]}
    ]"#;

    fn catalog() -> Vec<Election> {
        serde_json::from_str(CATALOG).unwrap()
    }

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn tags_must_all_match() {
        let elections = catalog();
        let names = |tags: &[&str]| -> Vec<String> {
            let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
            filter_by_tags(&elections, &tags)
                .iter()
                .map(|e| e.name.clone())
                .collect()
        };
        assert_eq!(names(&[]).len(), 2);
        assert_eq!(names(&["2024"]), vec!["2024 President"]);
        assert_eq!(names(&["2024", "local"]), Vec::<String>::new());
        assert!(find_election(&elections, "2022 Council").is_ok());
        assert!(matches!(
            find_election(&elections, "2020 Senate"),
            Err(MapError::UnknownElection { .. })
        ));
    }

    #[test]
    fn election_settings_use_the_party_colors() {
        let elections = catalog();
        let config = settings_from_election(&elections[0])
            .to_configuration()
            .unwrap();
        let ids: Vec<&str> = config.series().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["harris_pres2024.csv", "trump_pres2024.csv", "oliver_minor2024.csv"]
        );
        assert_eq!(config.scale_for("trump_pres2024.csv").name, "red");
        assert_eq!(config.scale_for("oliver_minor2024.csv").name, "yellow");
        assert_eq!(config.display().title.as_deref(), Some("2024 President"));
        assert_eq!(elections[0].files(), vec!["pres2024.csv", "minor2024.csv"]);
        assert_eq!(party_color(None), "any");
        assert_eq!(party_color(Some("ind")), "any");
    }

    #[test]
    fn contest_summary() {
        let elections = catalog();
        let rows = vec![
            row(&[("id", "01"), ("harris", "60"), ("trump", "30"), ("all", "90")]),
            row(&[("id", "02"), ("harris", "10"), ("trump", "x"), ("all", "30")]),
        ];
        let mut sums_by_file: HashMap<String, ColumnSums> = HashMap::new();
        sums_by_file.insert("pres2024.csv".to_string(), column_sums(&rows));

        let summary = summarize(&elections[0], &sums_by_file);
        assert_eq!(summary.len(), 3);
        let harris = summary[0].counts.unwrap();
        assert_eq!(harris.votes, 70.0);
        assert_eq!(harris.total_votes, 120.0);
        assert_eq!(harris.percent, 58.33);
        assert_eq!(summary[1].counts.unwrap().votes, 30.0);
        assert_eq!(summary[2].counts, None);

        let council = summarize(&elections[1], &{
            let mut m = HashMap::new();
            m.insert("council2022.csv".to_string(), ColumnSums::new());
            m
        });
        assert_eq!(council[0].counts.unwrap().percent, 0.0);
    }
}
