//! Print tables for newspaper editions.
//!
//! A paper map assigns RCDTS ids to paper codes. Each paper gets its own CSV
//! with one row per school or district it covers, drawn from the summary
//! query results.

use std::{
    collections::HashMap,
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::error::{Error, Result};

/// One result row keyed by column name.
pub type ResultRow = HashMap<String, String>;

pub const PAPER_FIELD: &str = "paper";

pub const PRINT_TABLE_FIELDS: &[&str] = &[
    "school_name",
    "district_name",
    "school_pct_proficiency_in_ela_parcc_2015_ela",
    "total_school_enrollment_in_ela_grade_3_8_hs_all",
    "pct_not_taking_ela_tests_school_all",
    "school_pct_proficiency_in_math_parcc_2015_math",
    "total_school_enrollment_in_math_grade_3_8_hs_all",
    "pct_not_taking_math_tests_school_all",
    "district_pct_proficiency_in_ela_parcc_2015_ela",
    "total_district_enrollment_in_ela_grade_3_8_hs_all",
    "pct_not_taking_ela_tests_district_all",
    "district_pct_proficiency_in_math_parcc_2015_math",
    "total_district_enrollment_in_math_grade_3_8_hs_all",
    "pct_not_taking_math_tests_district_all",
];

const DISTRICT_SUFFIX: &str = "0000";

/// District id for an RCDTS code: the last four characters become `0000`.
pub fn district_id(rcdts: &str) -> String {
    let keep = rcdts
        .char_indices()
        .rev()
        .nth(DISTRICT_SUFFIX.len() - 1)
        .map_or(0, |(idx, _)| idx);
    format!("{}{DISTRICT_SUFFIX}", &rcdts[..keep])
}

/// Copy of `row` without school-level fields.
pub fn district_view(row: &ResultRow) -> ResultRow {
    row.iter()
        .filter(|(key, _)| !key.contains("school"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperMap {
    papers: Vec<(String, Vec<String>)>,
    school_ids: Vec<String>,
}

impl PaperMap {
    pub fn from_reader<R: Read>(reader: R, paper_column: &str, rcdts_column: &str) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };
        let paper_idx = position(paper_column)?;
        let rcdts_idx = position(rcdts_column)?;

        let mut map = PaperMap::default();
        for record in reader.records() {
            let record = record?;
            let paper = record.get(paper_idx).unwrap_or_default().trim();
            if paper.is_empty() {
                continue;
            }
            let rcdts = record.get(rcdts_idx).unwrap_or_default().trim();
            for code in paper.split(',').map(str::trim) {
                map.assign(code, rcdts);
            }
        }
        debug!(
            "Paper map covers {} paper(s) and {} school(s)",
            map.papers.len(),
            map.school_ids.len()
        );
        Ok(map)
    }

    fn assign(&mut self, paper: &str, rcdts: &str) {
        match self.papers.iter_mut().find(|(code, _)| code == paper) {
            Some((_, ids)) => ids.push(rcdts.to_string()),
            None => self.papers.push((paper.to_string(), vec![rcdts.to_string()])),
        }
        if !rcdts.ends_with(DISTRICT_SUFFIX) && !self.school_ids.iter().any(|id| id == rcdts) {
            self.school_ids.push(rcdts.to_string());
        }
    }

    /// Paper codes with their RCDTS ids, in order of first appearance.
    pub fn papers(&self) -> &[(String, Vec<String>)] {
        &self.papers
    }

    /// Ids that name a school rather than a district.
    pub fn school_ids(&self) -> &[String] {
        &self.school_ids
    }

    /// Result rows for the mapped schools. District rows are only derived
    /// from these, so a district listed without any of its schools is absent.
    pub fn select_results(&self, results: &[ResultRow]) -> Vec<ResultRow> {
        results
            .iter()
            .filter(|row| {
                row.get("school_id")
                    .is_some_and(|id| self.school_ids.iter().any(|school| school == id))
            })
            .cloned()
            .collect()
    }
}

/// Reads summary query results exported as CSV with a header row.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    reader
        .records()
        .map(|record| {
            let record = record?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect())
        })
        .collect()
}

/// Indexes results by school id and by derived district id.
pub fn index_results(results: &[ResultRow]) -> HashMap<String, ResultRow> {
    let mut indexed = HashMap::with_capacity(results.len() * 2);
    for row in results {
        let Some(school_id) = row.get("school_id") else {
            continue;
        };
        indexed.insert(district_id(school_id), district_view(row));
        indexed.insert(school_id.clone(), row.clone());
    }
    indexed
}

/// `print_tables.csv` and paper `TRIB` give `print_tables__TRIB.csv`.
pub fn print_table_path(output_dir: &Path, file_name: &str, paper: &str) -> PathBuf {
    let (prefix, suffix) = file_name.split_once('.').unwrap_or((file_name, ""));
    if suffix.is_empty() {
        output_dir.join(format!("{prefix}__{paper}"))
    } else {
        output_dir.join(format!("{prefix}__{paper}.{suffix}"))
    }
}

/// Writes one CSV per paper and returns the paths written.
pub fn write_print_tables(
    results: &[ResultRow],
    paper_map: &PaperMap,
    output_dir: &Path,
    file_name: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let selected = paper_map.select_results(results);
    info!(
        "Using {} of {} summary row(s) for {} mapped school(s)",
        selected.len(),
        results.len(),
        paper_map.school_ids().len()
    );
    let indexed = index_results(&selected);
    let mut written = Vec::with_capacity(paper_map.papers().len());

    for (paper, ids) in paper_map.papers() {
        let path = print_table_path(output_dir, file_name, paper);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(std::iter::once(PAPER_FIELD).chain(PRINT_TABLE_FIELDS.iter().copied()))?;
        for id in ids {
            let Some(row) = indexed.get(id) else {
                warn!("No summary results for {id} on paper {paper}; skipping");
                continue;
            };
            let record = std::iter::once(paper.as_str()).chain(
                PRINT_TABLE_FIELDS
                    .iter()
                    .map(|field| row.get(*field).map_or("", String::as_str)),
            );
            writer.write_record(record)?;
        }
        writer.flush()?;
        info!("Wrote print table {}", path.display());
        written.push(path);
    }
    Ok(written)
}
