//! Data releases supported by the loader, keyed by school year.

use clap::ValueEnum;

use crate::{
    error::{Error, Result},
    layout::{AssessmentCompiler, LayoutCompiler, ReportCardCompiler, SectionMap},
    naming::NamingRules,
    participation,
    schema::Schema,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Multi-table assessment layout split by section headings
    Assessment,
    /// Single-table report card layout
    ReportCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Y2015,
}

impl Release {
    pub fn from_year(year: u16) -> Result<Self> {
        match year {
            2015 => Ok(Release::Y2015),
            other => Err(Error::UnsupportedRelease(other)),
        }
    }

    pub fn year(self) -> u16 {
        match self {
            Release::Y2015 => 2015,
        }
    }

    /// Schema name, also used as the prefix of every table it creates.
    pub fn schema_name(self, kind: LayoutKind) -> String {
        match kind {
            LayoutKind::Assessment => format!("assessment_{}", self.year()),
            LayoutKind::ReportCard => format!("report_card_{}", self.year()),
        }
    }

    pub fn participation_table(self) -> String {
        format!("parcc_participation_{}", self.year())
    }

    pub fn compiler(self, kind: LayoutKind) -> LayoutCompiler {
        let name = self.schema_name(kind);
        match (self, kind) {
            (Release::Y2015, LayoutKind::Assessment) => {
                LayoutCompiler::Assessment(AssessmentCompiler::new(
                    name,
                    NamingRules::assessment_2015(),
                    SectionMap::assessment_2015(),
                ))
            }
            (Release::Y2015, LayoutKind::ReportCard) => LayoutCompiler::ReportCard(
                ReportCardCompiler::new(name, NamingRules::report_card_2015()),
            ),
        }
    }

    pub fn participation_schema(self) -> Result<Schema> {
        match self {
            Release::Y2015 => participation::participation_schema(&self.participation_table()),
        }
    }
}
