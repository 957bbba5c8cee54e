//! Static URL pattern catalog for the CBSE sample-paper archive.
//!
//! Templates are relative to the archive base URL. `{year}` is replaced by the
//! academic-year token (`2020_21`), `{subject}` by one of the subject's name
//! variants. Percent escapes are part of the template text and are sent as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::AppError;

/// Archive root that every template is appended to.
pub const DEFAULT_BASE_URL: &str = "https://cbseacademic.nic.in/web_material/SQP";

/// Templates tried for every subject, once per name variant.
pub const GENERIC_TEMPLATES: &[&str] = &[
    "ClassX_{year}/{subject}-SQP.pdf",
    "CLASS_X_{year}/X_{subject}_SQP_{year}.pdf",
    "ClassX_{year}/{subject}_SQP.pdf",
    "Class_X_{year}/{subject}-SQP.pdf",
    "Class_X_{year}/{subject}_SQP_{year}.pdf",
    "CLASS_X_{year}/{subject}_SQP.pdf",
    "CLASS%20X_{year}/{subject}%20SQP%20({year}).pdf",
    "CLASS%20X_{year}/SQP%20of%20{subject}%20({year}).pdf",
    "CLASS%20X_{year}/{subject}%20Class%20X%20QP.pdf",
    "CLASS%20X_{year}/SQP%20{subject}%20set%20-I%20class%20X.pdf",
    "CLASS%20X_{year}/SQP%20{subject}%20set%20-II%20class%20X.pdf",
];

const SST_TEMPLATES: &[&str] = &[
    "CLASS_X_{year}/X-SS_SQP_{year}.pdf",
    "CLASS%20X_{year}/SQP%20of%20Social%20Science%20SQP%20({year}).pdf",
    "CLASS_X_{year}/Social_Science_SQP_{year}.pdf",
    "CLASS_X_{year}/SST_SQP_{year}.pdf",
    "ClassX_{year}/Social-Science-SQP.pdf",
    "ClassX_{year}/SocialScience-SQP.pdf",
    "CLASS%20X_{year}/Social%20Science/Social%20Science%20SQP%20_{year}_%20Set%201.pdf",
    "CLASS%20X_{year}/Social%20Science/Social%20Science%20SQP%20_{year}_%20Set%202.pdf",
    // 2018-19 style, year repeated
    "CLASS_X_{year}/X-SS_SQP_{year}-{year}.pdf",
    "CLASS%20X_{year}/Social%20Science/Social%20Science%20SQP%20_{year}.pdf",
    "CLASS%20X_{year}/Social%20Science/SST%20SQP%20_{year}.pdf",
];

const HINDI_B_TEMPLATES: &[&str] = &[
    "CLASS_X_{year}/X-Hindi-B_SQP_{year}.pdf",
    "CLASS%20X_{year}/Hindi-B%20Class%20X%20QP.pdf",
    "ClassX_{year}/Hindi-B-SQP.pdf",
    "CLASS_X_{year}/Hindi_B_SQP_{year}.pdf",
    "Class_X_{year}/Hindi-B_SQP.pdf",
    "ClassX_{year}/HindiCourseB-SQP.pdf",
];

const MATHS_TEMPLATES: &[&str] = &[
    "ClassX_{year}/MathsStandard-SQP.pdf",
    "ClassX_{year}/MathsBasic-SQP.pdf",
    "CLASS%20X_{year}/Maths/SQP%20Maths%20set%20-I%20class%20X.pdf",
    "CLASS%20X_{year}/Maths/SQP%20Maths%20set%20-II%20class%20X.pdf",
];

/// Subjects covered by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subject {
    Science,
    Maths,
    English,
    Sst,
    HindiB,
}

impl Subject {
    /// Every subject, in catalog order.
    pub const ALL: [Subject; 5] = [
        Subject::Science,
        Subject::Maths,
        Subject::English,
        Subject::Sst,
        Subject::HindiB,
    ];

    /// Short key used in directory and file names.
    pub fn key(self) -> &'static str {
        match self {
            Subject::Science => "science",
            Subject::Maths => "maths",
            Subject::English => "english",
            Subject::Sst => "sst",
            Subject::HindiB => "hindi-b",
        }
    }

    /// Spellings the archive has used for this subject over the years.
    pub fn variants(self) -> &'static [&'static str] {
        match self {
            Subject::Science => &["Science", "SCIENCE", "Science-Standard"],
            Subject::Maths => &[
                "Mathematics",
                "MATHEMATICS",
                "Maths",
                "MATHS",
                "MathsStandard",
                "Maths-Standard",
                "Mathematics-Standard",
                "MathsBasic",
                "Maths-Basic",
                "Mathematics-Basic",
            ],
            Subject::English => &[
                "English",
                "ENGLISH",
                "English-Language-and-Literature",
                "EnglishL",
            ],
            Subject::Sst => &[
                "Social-Science",
                "SOCIAL_SCIENCE",
                "Social_Science",
                "SS",
                "Social Science",
                "SocialScience",
            ],
            Subject::HindiB => &[
                "Hindi-B",
                "HINDI-B",
                "Hindi B",
                "HINDI B",
                "HindiCourseB",
                "Hindi-Course-B",
                "Hindi_Course_B",
            ],
        }
    }

    /// Templates that only apply to this subject. Probed before the generic pool.
    pub fn specific_templates(self) -> &'static [&'static str] {
        match self {
            Subject::Sst => SST_TEMPLATES,
            Subject::HindiB => HINDI_B_TEMPLATES,
            Subject::Maths => MATHS_TEMPLATES,
            Subject::Science | Subject::English => &[],
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidInput(format!("unknown subject: {s}")))
    }
}

/// Substitute placeholders in a catalog template.
pub fn render_template(template: &str, year: &str, subject_variant: Option<&str>) -> String {
    let rendered = template.replace("{year}", year);
    match subject_variant {
        Some(variant) => rendered.replace("{subject}", variant),
        None => rendered,
    }
}
