//! Reporting queries run against the loaded tables.
//!
//! The queries are rendered as PostgreSQL text with named bind parameters
//! (`:rcdts_ids`, `:counties`); executing them is up to the database client.

use std::fmt;

use clap::ValueEnum;

use crate::release::Release;

/// Counties making up the Chicago metropolitan area filter.
pub const CHICAGO_AREA_COUNTIES: &[&str] = &["Cook", "Dupage", "Will", "Lake", "McHenry", "Kane"];

/// SQL comment line naming the counties to bind as `:counties`.
pub fn counties_comment() -> String {
    format!("-- :counties = {}\n", CHICAGO_AREA_COUNTIES.join(", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Subject {
    Ela,
    Math,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subject::Ela => "ela",
            Subject::Math => "math",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

/// School and district proficiency plus participation for the print tables.
///
/// When `filtered` is set the query expects an `:rcdts_ids` array parameter.
pub fn summary_sql(release: Release, filtered: bool) -> String {
    let year = release.year();
    let mut query = format!(
        "SELECT s.school_id,
    s.school_name,
    overlay(s.school_id placing '0000' from 12 for 4) AS district_id,
    s.district_name,
    s.grades_in_school,
    a.school_pct_proficiency_in_ela_parcc_{year}_ela,
    a.district_pct_proficiency_in_ela_parcc_{year}_ela,
    a.school_pct_proficiency_in_math_parcc_{year}_math,
    a.district_pct_proficiency_in_math_parcc_{year}_math,
    ps.tested_enrollment_ela,
    (CAST(coalesce(ps.absent_ela, 0) + coalesce(ps.refusal_ela, 0) AS float) / ps.tested_enrollment_ela) * 100 AS pct_not_tested_ela,
    ps.tested_enrollment_math,
    ps.tested_math,
    (CAST(coalesce(ps.absent_math, 0) + coalesce(ps.refusal_math, 0) AS float) / ps.tested_enrollment_math) * 100 AS pct_not_tested_math,
    pd.tested_enrollment_ela AS tested_enrollment_ela_district,
    pd.tested_ela AS tested_ela_district,
    (CAST(coalesce(pd.absent_ela, 0) + coalesce(pd.refusal_ela, 0) AS float) / pd.tested_enrollment_ela) * 100 AS pct_not_tested_ela_district,
    pd.tested_enrollment_math AS tested_enrollment_math_district,
    pd.tested_math AS tested_math_district,
    (CAST(coalesce(pd.absent_math, 0) + coalesce(pd.refusal_math, 0) AS float) / pd.tested_enrollment_math) * 100 AS pct_not_tested_math_district
FROM assessment_{year}_schools s
JOIN parcc_participation_{year} ps ON ps.rcdts = s.school_id
JOIN parcc_participation_{year} pd ON pd.rcdts = overlay(s.school_id placing '0000' from 12 for 4)
JOIN assessment_{year}_overall_achievement_parcc_dlm_performance a ON a.school_id = s.school_id
"
    );
    if filtered {
        query.push_str("WHERE s.school_id = ANY(:rcdts_ids)\n");
    }
    query
}

/// Best or worst performing schools in a subject among schools where at
/// least 85% of eligible students were tested.
pub fn best_worst_sql(
    release: Release,
    subject: Subject,
    order: SortOrder,
    limit: usize,
    filter_counties: bool,
) -> String {
    let year = release.year();
    let mut query = format!(
        "SELECT ps.rcdts AS school_id,
    ps.district_name_school_name,
    ps.city,
    ps.county,
    ps.district_number,
    ps.tested_enrollment_{subject},
    ps.tested_{subject},
    CAST(ps.tested_{subject} AS float) / ps.tested_enrollment_{subject} AS percent_tested_{subject},
    pd.school_pct_proficiency_in_{subject}_parcc_{year}_{subject} AS passing
FROM parcc_participation_{year} ps
JOIN assessment_{year}_overall_achievement_parcc_dlm_performance pd ON pd.school_id = ps.rcdts
WHERE (CAST(ps.tested_{subject} AS float) / ps.tested_enrollment_{subject}) >= .85
"
    );
    if filter_counties {
        query.push_str("AND ps.county = ANY(:counties)\n");
    }
    query.push_str(&format!("ORDER BY passing {order}\nLIMIT {limit};\n"));
    query
}
