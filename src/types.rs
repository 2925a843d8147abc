use serde::{Deserialize, Serialize};

pub const FIXTURE_ID: i64 = 1000;
pub const FIXTURE_NAME: &str = "Dummy";
/// Name the update check writes over the fixture.
pub const UPDATED_NAME: &str = "Changed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: i64,
    pub name: String,
}

impl Hero {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Default for Hero {
    fn default() -> Self {
        Self::new(FIXTURE_ID, FIXTURE_NAME)
    }
}
