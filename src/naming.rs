//! Column naming for record layout fields.
//!
//! Layout descriptions are verbose ("PERCENT OF STUDENTS WHO MET OR EXCEEDED
//! EXPECTATIONS ..."), so names are built by running each label through an
//! ordered list of shortening filters and then slugifying the pieces. The
//! result must fit the 64 character identifier budget of the target database.

use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};

use crate::error::{Error, Result};

/// Longest identifier accepted by the target database.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// A single text rewrite applied to a label before slugification.
pub type NameFilter = fn(&str) -> Cow<'_, str>;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static naming pattern")
}

static DASH: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*-\s*"));
static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| compile(r"[^a-zA-Z0-9$_ ]"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));
static LEADING_ENUMERATION: LazyLock<Regex> = LazyLock::new(|| compile(r"^\d+ "));
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| compile(r"^[a-z][a-z0-9_]*$"));
static COUNT_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"^# of.*\(([A-Z]+)\)"));

static PERCENT_SIGN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^%( OF)?"));
static PERCENT_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)PERCENT(AGE)?"));
static AND_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+AND\s+"));
static FOR_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+FOR\s+"));
static YET_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+YET\s+"));
static COMPOSITE_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+COMPOSITE\s+"));
static STUDENTS_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+STUDENTS\s+"));
static NUMBER_WORD: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\s+(ONE|TWO|THREE|FOUR|FIVE|SIX|SEVEN|EIGHT|NINE)\s+")
});

/// Converts free text into a lowercase identifier.
///
/// Dashes (with any surrounding whitespace) and whitespace runs become
/// underscores, everything outside `[A-Za-z0-9$_ ]` is dropped and
/// leading/trailing underscores are stripped.
pub fn slugify(text: &str) -> String {
    let slug = DASH.replace_all(text.trim(), "_");
    let slug = INVALID_CHARS.replace_all(&slug, "");
    let slug = WHITESPACE.replace_all(&slug, "_");
    slug.to_lowercase().trim_matches('_').to_string()
}

/// Slugifies a layout label after dropping non-ASCII characters and the
/// enumeration prefix some labels carry (`"12 AVERAGE CLASS SIZE"`).
pub fn valid_column_name(text: &str) -> String {
    let ascii: String = text
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { '?' })
        .collect();
    let stripped = LEADING_ENUMERATION.replace(ascii.trim(), "");
    slugify(&stripped)
}

pub fn apply_filters(text: &str, filters: &[NameFilter]) -> String {
    filters
        .iter()
        .fold(text.to_string(), |cleaned, filter| filter(&cleaned).into_owned())
}

fn replace_literal<'a>(text: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    if text.contains(from) {
        Cow::Owned(text.replace(from, to))
    } else {
        Cow::Borrowed(text)
    }
}

pub fn replace_percent_sign(text: &str) -> Cow<'_, str> {
    PERCENT_SIGN.replace(text, "PCT")
}

pub fn abbreviate_percent(text: &str) -> Cow<'_, str> {
    PERCENT_WORD.replace_all(text, "PCT")
}

pub fn remove_and(text: &str) -> Cow<'_, str> {
    AND_WORD.replace_all(text, " ")
}

pub fn remove_for(text: &str) -> Cow<'_, str> {
    FOR_WORD.replace_all(text, " ")
}

pub fn remove_yet(text: &str) -> Cow<'_, str> {
    YET_WORD.replace_all(text, " ")
}

pub fn remove_composite(text: &str) -> Cow<'_, str> {
    COMPOSITE_WORD.replace_all(text, " ")
}

pub fn remove_students(text: &str) -> Cow<'_, str> {
    STUDENTS_WORD.replace_all(text, " ")
}

/// The layout misspells "PARTIALLY" in a few performance level labels.
pub fn fix_particially(text: &str) -> Cow<'_, str> {
    replace_literal(text, "PARTICIALLY", "PARTIALLY")
}

pub fn shorten_expectations(text: &str) -> Cow<'_, str> {
    replace_literal(text, "EXPECTATIONS", "EXPECTNS")
}

pub fn shorten_subregion(text: &str) -> Cow<'_, str> {
    replace_literal(text, "SUBREGION", "SUBRGN")
}

pub fn shorten_native_hawaiian(text: &str) -> Cow<'_, str> {
    replace_literal(text, "NATIVE HAWAIIAN AND OTHERS", "HAWAIIAN")
}

pub fn replace_number_symbol(text: &str) -> Cow<'_, str> {
    replace_literal(text, "#", "NUM")
}

pub fn fix_averge(text: &str) -> Cow<'_, str> {
    replace_literal(text, "AVERGE", "AVERAGE")
}

pub fn shorten_average(text: &str) -> Cow<'_, str> {
    replace_literal(text, "AVERAGE", "AVG")
}

pub fn shorten_physical_education(text: &str) -> Cow<'_, str> {
    replace_literal(text, "PHYSICAL EDUCATION", "PE")
}

/// Replaces whitespace-bounded number words (ONE through NINE) with digits.
///
/// Only the cases present in the layouts are handled; compound numbers such
/// as "TWENTY ONE" are left alone apart from the trailing word.
pub fn number_word_to_numeral(text: &str) -> Cow<'_, str> {
    NUMBER_WORD.replace_all(text, |caps: &Captures| {
        let digit = match &caps[1] {
            "ONE" => "1",
            "TWO" => "2",
            "THREE" => "3",
            "FOUR" => "4",
            "FIVE" => "5",
            "SIX" => "6",
            "SEVEN" => "7",
            "EIGHT" => "8",
            _ => "9",
        };
        format!(" {digit} ")
    })
}

/// Fails unless `name` is a lowercase identifier within the length budget.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::schema(format!(
            "'{name}' is too long at {} characters (maximum {MAX_IDENTIFIER_LEN})",
            name.len()
        )));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(Error::schema(format!(
            "'{name}' is not a valid column name"
        )));
    }
    Ok(())
}

/// How the test and subgroup pieces of a field label are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartStyle {
    Slug,
    ColumnName,
}

/// Naming configuration shared by the schema variants of a release.
#[derive(Debug, Clone)]
pub struct NamingRules {
    fixed_names: &'static [(&'static str, &'static str)],
    description_filters: &'static [NameFilter],
    subgroup_filters: &'static [NameFilter],
    count_tag_prefix: Option<&'static str>,
    part_style: PartStyle,
}

const ASSESSMENT_FIXED_NAMES: &[(&str, &str)] = &[
    ("SCHOOL ID", PRIMARY_KEY_NAME),
    ("SCHOOL TYPE CODE", "school_type_code"),
];

const REPORT_CARD_FIXED_NAMES: &[(&str, &str)] = &[
    ("SCHOOL ID", PRIMARY_KEY_NAME),
    ("SCHOOL TYPE CODE", "school_type_code"),
    ("DISTRICT TYPE CODE", "district_type_code"),
    ("DISTRICT SIZE CODE", "district_size_code"),
];

/// Description filters shared by every 2015 layout, applied in order.
const DESCRIPTION_FILTERS: &[NameFilter] = &[
    replace_percent_sign,
    replace_number_symbol,
    abbreviate_percent,
    remove_and,
    remove_for,
    remove_yet,
    remove_composite,
    fix_particially,
    fix_averge,
    shorten_expectations,
    shorten_subregion,
    shorten_average,
    shorten_physical_education,
    remove_students,
];

const SUBGROUP_FILTERS: &[NameFilter] = &[shorten_native_hawaiian, number_word_to_numeral];

/// Canonical name of the RCDTS school identifier column.
pub const PRIMARY_KEY_NAME: &str = "school_id";

impl NamingRules {
    pub fn assessment_2015() -> Self {
        Self {
            fixed_names: ASSESSMENT_FIXED_NAMES,
            description_filters: DESCRIPTION_FILTERS,
            subgroup_filters: SUBGROUP_FILTERS,
            count_tag_prefix: Some("lep_1st_year_in_us_"),
            part_style: PartStyle::Slug,
        }
    }

    pub fn report_card_2015() -> Self {
        Self {
            fixed_names: REPORT_CARD_FIXED_NAMES,
            description_filters: DESCRIPTION_FILTERS,
            subgroup_filters: SUBGROUP_FILTERS,
            count_tag_prefix: None,
            part_style: PartStyle::ColumnName,
        }
    }

    /// Builds the column name for a layout field from its test name,
    /// subgroup specifier and description cells.
    pub fn column_name(&self, test: &str, subgroup: &str, description: &str) -> Result<String> {
        let trimmed = description.trim();
        if let Some((_, name)) = self
            .fixed_names
            .iter()
            .find(|(prefix, _)| trimmed.starts_with(prefix))
        {
            return Ok((*name).to_string());
        }

        let shortened = apply_filters(description, self.description_filters);
        let subgroup = apply_filters(subgroup, self.subgroup_filters);

        let tagged = self.count_tag_prefix.and_then(|prefix| {
            COUNT_TAG
                .captures(trimmed)
                .map(|caps| format!("{prefix}{}", caps[1].to_lowercase()))
        });

        let name = match tagged {
            Some(name) => name,
            None => {
                let mut bits = vec![valid_column_name(&shortened)];
                if !test.trim().is_empty() {
                    bits.push(self.part(test));
                }
                if !subgroup.trim().is_empty() {
                    bits.push(self.part(&subgroup));
                }
                bits.join("_")
            }
        };

        validate_identifier(&name)?;
        Ok(name)
    }

    fn part(&self, text: &str) -> String {
        match self.part_style {
            PartStyle::Slug => slugify(text),
            PartStyle::ColumnName => valid_column_name(text),
        }
    }
}
