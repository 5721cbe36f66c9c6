use entity::employees;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, value::MapDeserializer},
};

/// A persisted employee record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "edad")]
    pub age: i32,
    #[serde(rename = "puesto")]
    pub position: String,
    #[serde(rename = "departamento")]
    pub department: String,
}

impl Employee {
    /// Replace every mutable field with the draft's values. `id` is kept.
    pub fn apply(&mut self, draft: EmployeeDraft) {
        self.name = draft.name;
        self.age = draft.age;
        self.position = draft.position;
        self.department = draft.department;
    }
}

impl From<employees::Model> for Employee {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            age: model.age,
            position: model.position,
            department: model.department,
        }
    }
}

/// Candidate payload for create and update.
///
/// Missing fields deserialize to their empty value so validation, rather than
/// the JSON layer, reports them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeeDraft {
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(rename = "edad", default)]
    pub age: i32,
    #[serde(rename = "puesto", default)]
    pub position: String,
    #[serde(rename = "departamento", default)]
    pub department: String,
}

impl EmployeeDraft {
    pub fn new(
        name: impl Into<String>,
        age: i32,
        position: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age,
            position: position.into(),
            department: department.into(),
        }
    }
}

/// Wire names of the listing filters.
const FILTER_KEYS: [&str; 4] = ["edadMin", "edadMax", "puesto", "departamento"];

/// Optional constraints for listing. Every supplied field must hold.
///
/// Blank age values count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeeFilter {
    #[serde(rename = "edadMin", default, deserialize_with = "optional_age")]
    pub min_age: Option<i32>,
    #[serde(rename = "edadMax", default, deserialize_with = "optional_age")]
    pub max_age: Option<i32>,
    #[serde(rename = "puesto", default, deserialize_with = "optional_text")]
    pub position: Option<String>,
    #[serde(rename = "departamento", default, deserialize_with = "optional_text")]
    pub department: Option<String>,
}

impl EmployeeFilter {
    /// Build a filter from decoded query-string pairs.
    ///
    /// Keys match regardless of case, unknown keys are ignored and the first
    /// occurrence of a repeated key wins.
    pub fn from_query_pairs<I>(pairs: I) -> Result<Self, de::value::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut known: Vec<(String, String)> = Vec::new();
        for (key, value) in pairs {
            let Some(canonical) = FILTER_KEYS
                .iter()
                .find(|name| name.eq_ignore_ascii_case(key.trim()))
            else {
                continue;
            };
            if known.iter().all(|(seen, _)| seen != canonical) {
                known.push((canonical.to_string(), value));
            }
        }
        let deserializer: MapDeserializer<'_, _, de::value::Error> =
            MapDeserializer::new(known.into_iter());
        Self::deserialize(deserializer)
    }

    /// Records with `age > threshold`.
    pub fn older_than(threshold: i32) -> Self {
        Self {
            min_age: Some(threshold.saturating_add(1)),
            ..Self::default()
        }
    }

    /// Position filter, or `None` when absent or blank.
    pub fn position(&self) -> Option<&str> {
        non_blank(self.position.as_deref())
    }

    /// Department filter, or `None` when absent or blank.
    pub fn department(&self) -> Option<&str> {
        non_blank(self.department.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn optional_age<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|_| de::Error::custom(format!("invalid age filter {trimmed:?}")))
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeStatistics {
    #[serde(rename = "totalEmpleados")]
    pub total: u64,
    #[serde(rename = "promedioEdad")]
    pub average_age: f64,
    #[serde(rename = "cantidadPorPuesto")]
    pub count_by_position: Vec<PositionCount>,
    #[serde(rename = "cantidadPorDepartamento")]
    pub count_by_department: Vec<DepartmentCount>,
}

impl EmployeeStatistics {
    pub fn empty() -> Self {
        Self {
            total: 0,
            average_age: 0.0,
            count_by_position: Vec::new(),
            count_by_department: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PositionCount {
    #[serde(rename = "puesto")]
    pub position: String,
    #[serde(rename = "cantidad")]
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    #[serde(rename = "departamento")]
    pub department: String,
    #[serde(rename = "cantidad")]
    pub count: u64,
}
