//! Target descriptor types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Teaching-class category understood by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ClazzType {
    /// Courses in the student's study plan.
    #[default]
    InPlan,
    /// Retake courses.
    Retake,
    /// Graded (tiered) courses.
    Graded,
    /// Quality-development electives.
    QualityElective,
    /// Minor courses.
    Minor,
    /// Courses open to the whole school.
    AllSchool,
    /// A category code this build does not know about.
    Other(String),
}

impl ClazzType {
    /// All known categories, in menu order.
    pub const KNOWN: [ClazzType; 6] = [
        ClazzType::InPlan,
        ClazzType::Retake,
        ClazzType::Graded,
        ClazzType::QualityElective,
        ClazzType::Minor,
        ClazzType::AllSchool,
    ];

    /// Wire code sent as `clazzType` / `teachingClassType`.
    pub fn code(&self) -> &str {
        match self {
            ClazzType::InPlan => "FANKC",
            ClazzType::Retake => "CXKC",
            ClazzType::Graded => "TYKC",
            ClazzType::QualityElective => "XGKC",
            ClazzType::Minor => "FXKC",
            ClazzType::AllSchool => "ALLKC",
            ClazzType::Other(code) => code,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            ClazzType::InPlan => "方案内课程",
            ClazzType::Retake => "重修课程",
            ClazzType::Graded => "分级课程",
            ClazzType::QualityElective => "素质拓展选修课",
            ClazzType::Minor => "辅修课程",
            ClazzType::AllSchool => "全校课程",
            ClazzType::Other(code) => code,
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "FANKC" => ClazzType::InPlan,
            "CXKC" => ClazzType::Retake,
            "TYKC" => ClazzType::Graded,
            "XGKC" => ClazzType::QualityElective,
            "FXKC" => ClazzType::Minor,
            "ALLKC" => ClazzType::AllSchool,
            other => ClazzType::Other(other.to_string()),
        }
    }

    /// Resolve a 1-based menu index ("1".."6").
    pub fn from_menu_index(index: &str) -> Option<Self> {
        let n: usize = index.trim().parse().ok()?;
        Self::KNOWN.get(n.checked_sub(1)?).cloned()
    }
}

impl fmt::Display for ClazzType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ClazzType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ClazzType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ClazzType::from_code(&code))
    }
}

/// One contested course section the engine tries to acquire.
///
/// Serialized with the field names of the on-disk descriptor files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Teaching-class id (`clazzId`).
    #[serde(rename = "clazzId")]
    pub id: String,
    /// Per-class acquisition secret (`secretVal`).
    #[serde(rename = "secretVal")]
    pub secret: String,
    /// Display name (`courseName`).
    #[serde(rename = "courseName", default)]
    pub name: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(rename = "clazzType", default)]
    pub category: ClazzType,
}

impl Target {
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        name: impl Into<String>,
        category: ClazzType,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            name: name.into(),
            teacher: String::new(),
            category,
        }
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teacher = teacher.into();
        self
    }

    /// Name used in log lines; falls back to the id for unnamed descriptors.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
