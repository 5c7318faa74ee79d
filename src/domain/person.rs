use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};

/// The demo record edited by the person view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "Person")]
pub struct SamplePerson {
    #[schemars(skip)]
    #[serde(default)]
    pub id: Option<EntityId>,
    #[schemars(skip)]
    #[serde(default)]
    pub version: i32,
    #[schemars(title = "First Name", length(min = 1))]
    pub first_name: String,
    #[schemars(title = "Last Name", length(min = 1))]
    pub last_name: String,
    #[schemars(title = "Email", email, length(min = 1))]
    pub email: String,
    #[schemars(title = "Phone")]
    #[serde(default)]
    pub phone: Option<String>,
    #[schemars(title = "Date Of Birth")]
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[schemars(title = "Occupation")]
    #[serde(default)]
    pub occupation: Option<String>,
    #[schemars(title = "Role")]
    #[serde(default)]
    pub role: Option<String>,
    #[schemars(title = "Important")]
    #[serde(default)]
    pub important: bool,
}

impl Entity for SamplePerson {
    const LABEL: &'static str = "person";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn stamp(&mut self, id: EntityId, version: i32) {
        self.id = Some(id);
        self.version = version;
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "Ken", "Margaret", "Dennis",
    "Radia", "John", "Hedy", "Niklaus", "Katherine", "Tony",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Thompson",
    "Hamilton", "Ritchie", "Perlman", "McCarthy", "Lamarr", "Wirth", "Johnson", "Hoare",
];

const OCCUPATIONS: &[&str] = &[
    "Engineer", "Mathematician", "Researcher", "Teacher", "Analyst", "Designer", "Architect",
];

const ROLES: &[&str] = &["Worker", "Supervisor", "Manager", "External"];

/// Deterministic demo rows, unsaved (no id), for seeding an empty store.
pub fn sample_people(count: usize) -> Vec<SamplePerson> {
    (0..count)
        .map(|index| {
            let first = FIRST_NAMES[index % FIRST_NAMES.len()];
            let last = LAST_NAMES[(index / FIRST_NAMES.len() + index) % LAST_NAMES.len()];
            let year = 1950 + (index * 7 % 50) as i32;
            let month = 1 + (index % 12) as u32;
            let day = 1 + (index * 3 % 28) as u32;
            SamplePerson {
                id: None,
                version: 0,
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!(
                    "{}.{}{}@example.com",
                    first.to_ascii_lowercase(),
                    last.to_ascii_lowercase(),
                    index
                ),
                phone: Some(format!("+1-555-{:03}-{:04}", index % 1000, (index * 37) % 10_000)),
                date_of_birth: NaiveDate::from_ymd_opt(year, month, day),
                occupation: Some(OCCUPATIONS[index % OCCUPATIONS.len()].to_string()),
                role: Some(ROLES[index % ROLES.len()].to_string()),
                important: index % 3 == 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_people_are_unsaved_and_deterministic() {
        let first = sample_people(20);
        let second = sample_people(20);
        assert_eq!(first, second);
        assert!(first.iter().all(|person| person.id.is_none()));
        assert!(first.iter().all(|person| person.date_of_birth.is_some()));
        assert_eq!(first[0].first_name, "Ada");
        assert!(first[0].important);
        assert!(!first[1].important);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let person = SamplePerson {
            first_name: "Ada".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
            ..SamplePerson::default()
        };
        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["dateOfBirth"], "1815-12-10");
        assert_eq!(value["id"], serde_json::Value::Null);
    }
}
