//! Types for the course catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::target::{ClazzType, Target};

/// Category label the service uses for quality-elective rows, which are
/// themselves the teaching class.
pub(crate) const QUALITY_ELECTIVE_LABEL: &str = "素质拓展选修课";

/// One teaching class of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOffering {
    pub course_name: String,
    pub course_code: String,
    pub department: String,
    pub teacher: String,
    /// Class number within the course.
    pub class_no: String,
    /// Room and time slots.
    pub place: String,
    pub capacity: Option<u32>,
    pub enrolled: Option<u32>,
    pub clazz_id: String,
    pub secret: String,
}

impl ClassOffering {
    /// Whether the class reports no free seats.
    pub fn is_full(&self) -> bool {
        matches!((self.capacity, self.enrolled), (Some(cap), Some(n)) if n >= cap)
    }

    /// Convert into an acquisition target for `category`.
    pub fn into_target(self, category: ClazzType) -> Target {
        Target::new(self.clazz_id, self.secret, self.course_name, category).with_teacher(self.teacher)
    }

    /// Flatten catalog rows into offerings.
    ///
    /// Regular courses carry their classes in `tcList`; quality-elective rows
    /// are the class. Entries without a class id are skipped.
    pub fn from_rows(rows: &[Value]) -> Vec<ClassOffering> {
        let mut offerings = Vec::new();
        for row in rows {
            if text(row, "XGXKLB") == QUALITY_ELECTIVE_LABEL {
                offerings.extend(Self::from_class(row, row));
            } else if let Some(classes) = row.get("tcList").and_then(Value::as_array) {
                offerings.extend(classes.iter().filter_map(|class| Self::from_class(row, class)));
            }
        }
        offerings
    }

    fn from_class(course: &Value, class: &Value) -> Option<ClassOffering> {
        let clazz_id = text(class, "JXBID");
        if clazz_id.is_empty() {
            return None;
        }
        Some(ClassOffering {
            course_name: text(course, "KCM"),
            course_code: text(course, "KCH"),
            department: text(course, "KKDW"),
            teacher: text(class, "SKJS"),
            class_no: text(class, "KXH"),
            place: text(class, "teachingPlace"),
            capacity: number(class, "KRL"),
            enrolled: number(class, "YXRS"),
            clazz_id,
            secret: text(class, "secretVal"),
        })
    }
}

/// String field, accepting numbers; empty when absent.
fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Numeric field, accepting numeric strings.
fn number(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Errors from catalog queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Session expired")]
    AuthExpired,

    #[error("Service error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        CatalogError::Http(crate::client::wire::describe_transport_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_regular_course_yields_one_offering_per_class() {
        let rows = vec![json!({
            "KCM": "高等数学",
            "KCH": "MATH101",
            "KKDW": "理学院",
            "tcList": [
                {"JXBID": "c1", "secretVal": "s1", "SKJS": "张老师", "KXH": "01",
                 "teachingPlace": "A101", "KRL": 60, "YXRS": 60},
                {"JXBID": "c2", "secretVal": "s2", "SKJS": "李老师", "KXH": "02",
                 "teachingPlace": "A102", "KRL": "50", "YXRS": "12"}
            ]
        })];

        let offerings = ClassOffering::from_rows(&rows);
        assert_eq!(offerings.len(), 2);
        assert_eq!(offerings[0].course_name, "高等数学");
        assert_eq!(offerings[0].teacher, "张老师");
        assert!(offerings[0].is_full());
        assert_eq!(offerings[1].capacity, Some(50));
        assert_eq!(offerings[1].enrolled, Some(12));
        assert!(!offerings[1].is_full());
    }

    #[test]
    fn test_quality_elective_row_is_the_class() {
        let rows = vec![json!({
            "KCM": "音乐鉴赏",
            "XGXKLB": "素质拓展选修课",
            "JXBID": "q1",
            "secretVal": "sq",
            "SKJS": "王老师",
            "KRL": 100,
            "YXRS": 3
        })];

        let offerings = ClassOffering::from_rows(&rows);
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings[0].clazz_id, "q1");
        assert_eq!(offerings[0].course_name, "音乐鉴赏");
    }

    #[test]
    fn test_rows_without_classes_are_skipped() {
        let rows = vec![
            json!({"KCM": "No classes"}),
            json!({"KCM": "Missing id", "tcList": [{"secretVal": "x"}]}),
        ];
        assert!(ClassOffering::from_rows(&rows).is_empty());
    }

    #[test]
    fn test_into_target() {
        let offering = ClassOffering {
            course_name: "Physics".to_string(),
            course_code: "PHY".to_string(),
            department: String::new(),
            teacher: "Dr. P".to_string(),
            class_no: "01".to_string(),
            place: String::new(),
            capacity: None,
            enrolled: None,
            clazz_id: "c9".to_string(),
            secret: "s9".to_string(),
        };
        let target = offering.into_target(ClazzType::Retake);
        assert_eq!(target.id, "c9");
        assert_eq!(target.secret, "s9");
        assert_eq!(target.name, "Physics");
        assert_eq!(target.teacher, "Dr. P");
        assert_eq!(target.category, ClazzType::Retake);
    }
}
