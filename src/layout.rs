//! Record layout compilation.
//!
//! A record layout is a spreadsheet describing the fields of a fixed-format
//! data file. Rows whose first cell is a number describe a field:
//!
//! | cell | content                                   |
//! |------|-------------------------------------------|
//! | 0    | field number                              |
//! | 1    | test name (`ALL TESTS`, `PARCC`, `DLM`)   |
//! | 2    | subgroup specifier (`ALL`, `MALE`, ...)   |
//! | 3    | character range (`120-125`)               |
//! | 4    | width                                     |
//! | 5    | description                               |
//! | 6    | type code (`A15`, `COMMA6`, `F5.1`)       |
//! | 7, 8 | start and end offsets                     |
//!
//! Any other row is a section marker (a heading or subheading). The
//! assessment layout uses markers to split fields into one table per section;
//! the report card layout ignores them and produces a single table.

use log::debug;

use crate::{
    data::Cell,
    error::{Error, Result},
    naming::{NamingRules, PRIMARY_KEY_NAME},
    schema::{Column, ColumnType, Schema, Table, resolve_type},
};

/// Table suffix holding the school metadata (RCDTS id, names, grades).
pub const SCHOOLS_TABLE: &str = "schools";

const FIELD_NUMBER: usize = 0;
const TEST: usize = 1;
const SUBGROUP: usize = 2;
const DESCRIPTION: usize = 5;
const TYPE_CODE: usize = 6;

static EMPTY: Cell = Cell::Empty;

fn cell(row: &[Cell], index: usize) -> &Cell {
    row.get(index).unwrap_or(&EMPTY)
}

fn at_row(row_number: usize) -> impl Fn(Error) -> Error {
    move |err| match err {
        Error::SchemaDefinition(message) => {
            Error::SchemaDefinition(format!("layout row {row_number}: {message}"))
        }
        other => other,
    }
}

type SectionKey = (Option<&'static str>, Option<&'static str>);

/// Known headings and subheadings of a layout and the table each
/// (heading, subheading) pair maps to.
#[derive(Debug, Clone)]
pub struct SectionMap {
    headings: &'static [&'static str],
    subheadings: &'static [&'static str],
    tables: &'static [(SectionKey, &'static str)],
}

const PARCC: &str = "PARTNERSHIP FOR ASSESSMENT OF READINESS FOR COLLEGE AND CAREERS (PARCC)";
const DLM: &str = "DYNAMIC LEARNING MAPS ALTERNATE ASSESSMENT (DLM)";
const STATE_ASSESSMENT: &str = "ILLINOIS STATE ASSESSMENT INFORMATION";
const ACCOUNTABILITY: &str = "ACCOUNTABILITY";

const HEADINGS_2015: &[&str] = &[STATE_ASSESSMENT, PARCC, DLM, ACCOUNTABILITY];

const SUBHEADINGS_2015: &[&str] = &[
    "TOTAL ENROLLMENT AND PERCENT NOT TESTED IN ENGLISH LANGUAGE ARTS/LITERACY (ELA)",
    "TOTAL ENROLLMENT AND PERCENT NOT TESTED IN MATH",
    "OVERALL ACHIEVEMENT PERFORMANCE (PARCC/DLM)",
    "OVERALL ACHIEVEMENT BY 5 PERFORMANCE LEVELS (PARCC/DLM)",
    "GRADE 3",
    "GRADE 4",
    "GRADE 5",
    "GRADE 6",
    "GRADE 7",
    "GRADE 8",
    "GRADE 9-12 HIGH SCHOOL SUJECTS COMBINED",
    "HIGH SCHOOL - ENGLISH LANGUAGE ARTS/LITERACY (ELA)",
    "HIGH SCHOOL - MATH",
    "ALGEBRA I, ALGEBRA II, AND GEOMETRY (ALG1, ALG II, GEO)",
    "MATHEMATICS I, II, AND III (MATH1, MATH II, MATH III)",
    "GRADE 11",
    "SCHOOL",
    "DISTRICT",
    "STATE",
];

const TABLES_2015: &[(SectionKey, &str)] = &[
    ((None, None), SCHOOLS_TABLE),
    (
        (
            Some(STATE_ASSESSMENT),
            Some("TOTAL ENROLLMENT AND PERCENT NOT TESTED IN ENGLISH LANGUAGE ARTS/LITERACY (ELA)"),
        ),
        "participation",
    ),
    (
        (
            Some(STATE_ASSESSMENT),
            Some("OVERALL ACHIEVEMENT PERFORMANCE (PARCC/DLM)"),
        ),
        "overall_achievement_parcc_dlm_performance",
    ),
    (
        (
            Some(STATE_ASSESSMENT),
            Some("OVERALL ACHIEVEMENT BY 5 PERFORMANCE LEVELS (PARCC/DLM)"),
        ),
        "overall_achievement_parcc_dlm_levels",
    ),
    ((Some(PARCC), Some("GRADE 3")), "parcc_grade_3"),
    ((Some(PARCC), Some("GRADE 4")), "parcc_grade_4"),
    ((Some(PARCC), Some("GRADE 5")), "parcc_grade_5"),
    ((Some(PARCC), Some("GRADE 6")), "parcc_grade_6"),
    ((Some(PARCC), Some("GRADE 7")), "parcc_grade_7"),
    ((Some(PARCC), Some("GRADE 8")), "parcc_grade_8"),
    (
        (Some(PARCC), Some("GRADE 9-12 HIGH SCHOOL SUJECTS COMBINED")),
        "parcc_high_school_combined",
    ),
    (
        (
            Some(PARCC),
            Some("HIGH SCHOOL - ENGLISH LANGUAGE ARTS/LITERACY (ELA)"),
        ),
        "parcc_high_school_ela",
    ),
    (
        (
            Some(PARCC),
            Some("ALGEBRA I, ALGEBRA II, AND GEOMETRY (ALG1, ALG II, GEO)"),
        ),
        "parcc_high_school_math_algebra_geometry",
    ),
    (
        (
            Some(PARCC),
            Some("MATHEMATICS I, II, AND III (MATH1, MATH II, MATH III)"),
        ),
        "parcc_high_school_math_i_ii_iii",
    ),
    ((Some(DLM), Some("GRADE 3")), "dlm_grade_3"),
    ((Some(DLM), Some("GRADE 4")), "dlm_grade_4"),
    ((Some(DLM), Some("GRADE 5")), "dlm_grade_5"),
    ((Some(DLM), Some("GRADE 6")), "dlm_grade_6"),
    ((Some(DLM), Some("GRADE 7")), "dlm_grade_7"),
    ((Some(DLM), Some("GRADE 8")), "dlm_grade_8"),
    ((Some(DLM), Some("GRADE 11")), "dlm_high_school"),
    ((Some(ACCOUNTABILITY), Some("SCHOOL")), "accountability"),
];

impl SectionMap {
    pub fn assessment_2015() -> Self {
        Self {
            headings: HEADINGS_2015,
            subheadings: SUBHEADINGS_2015,
            tables: TABLES_2015,
        }
    }

    fn heading(&self, text: &str) -> Option<&'static str> {
        self.headings.iter().copied().find(|h| *h == text)
    }

    fn subheading(&self, text: &str) -> Option<&'static str> {
        self.subheadings.iter().copied().find(|h| *h == text)
    }

    /// Table suffix for a (heading, subheading) pair, if the pair starts a
    /// table of its own.
    pub fn resolve(&self, heading: Option<&str>, subheading: Option<&str>) -> Option<&'static str> {
        self.tables
            .iter()
            .find(|((h, s), _)| *h == heading && *s == subheading)
            .map(|(_, suffix)| *suffix)
    }
}

/// Compilation state carried across layout rows.
#[derive(Debug, Clone)]
pub struct SectionState {
    schema_name: String,
    heading: Option<&'static str>,
    subheading: Option<&'static str>,
    open_table: Table,
    open_section: &'static str,
    primary_key: Option<Column>,
    next_index: usize,
}

impl SectionState {
    /// Starts with the schools table open; fields preceding any marker
    /// describe the school itself.
    pub fn new(schema_name: &str) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            heading: None,
            subheading: None,
            open_table: Table::new(format!("{schema_name}_{SCHOOLS_TABLE}")),
            open_section: SCHOOLS_TABLE,
            primary_key: None,
            next_index: 0,
        }
    }

    pub fn heading(&self) -> Option<&str> {
        self.heading
    }

    pub fn subheading(&self) -> Option<&str> {
        self.subheading
    }

    pub fn open_table(&self) -> &Table {
        &self.open_table
    }

    /// Applies a section marker row. Returns the table that was closed when
    /// the marker starts a new table.
    pub fn enter_marker(&mut self, text: &str, sections: &SectionMap) -> Result<Option<Table>> {
        if let Some(heading) = sections.heading(text) {
            self.heading = Some(heading);
            self.subheading = None;
        }
        if let Some(subheading) = sections.subheading(text) {
            self.subheading = Some(subheading);
        }

        let Some(suffix) = sections.resolve(self.heading, self.subheading) else {
            return Ok(None);
        };
        if suffix == self.open_section {
            return Ok(None);
        }

        let mut table = Table::new(format!("{}_{suffix}", self.schema_name));
        if suffix != SCHOOLS_TABLE {
            let primary_key = self.primary_key.as_ref().ok_or_else(|| {
                Error::schema(format!(
                    "section '{text}' starts table '{}' before a {PRIMARY_KEY_NAME} field was defined",
                    table.name
                ))
            })?;
            table.add_column(primary_key.detached())?;
        }
        self.open_section = suffix;
        Ok(Some(std::mem::replace(&mut self.open_table, table)))
    }

    /// Appends a field to the open table at the next column index.
    pub fn add_field(&mut self, name: String, column_type: ColumnType) -> Result<Column> {
        let mut column = Column::new(self.next_index, name, column_type);
        if column.name == PRIMARY_KEY_NAME {
            column = column.as_primary_key();
            self.primary_key = Some(column.clone());
        }
        let attached = self.open_table.add_column(column)?.clone();
        self.next_index += 1;
        Ok(attached)
    }

    pub fn finish(self) -> Table {
        self.open_table
    }
}

/// Compiles the multi-table assessment layout.
#[derive(Debug, Clone)]
pub struct AssessmentCompiler {
    schema_name: String,
    rules: NamingRules,
    sections: SectionMap,
}

impl AssessmentCompiler {
    pub fn new(schema_name: impl Into<String>, rules: NamingRules, sections: SectionMap) -> Self {
        Self {
            schema_name: schema_name.into(),
            rules,
            sections,
        }
    }

    pub fn compile(&self, rows: &[Vec<Cell>]) -> Result<Schema> {
        let mut schema = Schema::new(&self.schema_name);
        let mut state = SectionState::new(&self.schema_name);

        for (idx, row) in rows.iter().enumerate() {
            let located = at_row(idx + 1);
            let first = cell(row, FIELD_NUMBER);
            if !first.is_number() {
                let text = first.as_text();
                if let Some(closed) = state
                    .enter_marker(text.trim(), &self.sections)
                    .map_err(&located)?
                {
                    debug!(
                        "Closed table {} with {} column(s)",
                        closed.name,
                        closed.columns().len()
                    );
                    schema.push_table(closed).map_err(&located)?;
                }
                continue;
            }

            let name = self
                .rules
                .column_name(
                    &cell(row, TEST).as_text(),
                    &cell(row, SUBGROUP).as_text(),
                    &cell(row, DESCRIPTION).as_text(),
                )
                .map_err(&located)?;
            let column_type = resolve_type(&cell(row, TYPE_CODE).as_text()).map_err(&located)?;
            let column = state.add_field(name, column_type).map_err(&located)?;
            schema.columns.push(column);
        }

        schema.push_table(state.finish())?;
        Ok(schema)
    }
}

/// Compiles the single-table report card layout, where a field's position in
/// the data file is its field number.
#[derive(Debug, Clone)]
pub struct ReportCardCompiler {
    schema_name: String,
    rules: NamingRules,
}

impl ReportCardCompiler {
    pub fn new(schema_name: impl Into<String>, rules: NamingRules) -> Self {
        Self {
            schema_name: schema_name.into(),
            rules,
        }
    }

    pub fn compile(&self, rows: &[Vec<Cell>]) -> Result<Schema> {
        let mut table = Table::new(&self.schema_name);

        for (idx, row) in rows.iter().enumerate() {
            let located = at_row(idx + 1);
            let Cell::Number(field_number) = cell(row, FIELD_NUMBER) else {
                continue;
            };
            let field_number = *field_number;
            if !field_number.is_finite() || field_number.fract() != 0.0 || field_number < 1.0 {
                return Err(located(Error::schema(format!(
                    "field number {field_number} is not a positive whole number"
                ))));
            }

            let description = cell(row, DESCRIPTION).as_text();
            let name = self
                .rules
                .column_name(
                    &cell(row, TEST).as_text(),
                    &cell(row, SUBGROUP).as_text(),
                    &description,
                )
                .map_err(&located)?;
            let column_type = resolve_type(&cell(row, TYPE_CODE).as_text()).map_err(&located)?;

            let mut column = Column::new(field_number as usize - 1, name, column_type);
            if description.trim().starts_with("SCHOOL ID") {
                column = column.as_primary_key();
            }
            table.add_column(column).map_err(&located)?;
        }

        let mut schema = Schema::new(&self.schema_name);
        schema.columns = table.columns().to_vec();
        schema.push_table(table)?;
        Ok(schema)
    }
}

/// Layout variants understood by the compiler.
#[derive(Debug, Clone)]
pub enum LayoutCompiler {
    Assessment(AssessmentCompiler),
    ReportCard(ReportCardCompiler),
}

impl LayoutCompiler {
    pub fn compile(&self, rows: &[Vec<Cell>]) -> Result<Schema> {
        match self {
            LayoutCompiler::Assessment(compiler) => compiler.compile(rows),
            LayoutCompiler::ReportCard(compiler) => compiler.compile(rows),
        }
    }
}
