use charybdis::macros::charybdis_udt_model;
use charybdis::types::{Int, Text, Uuid};
use serde::{Deserialize, Serialize};

/// One answered block inside a response batch.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[charybdis_udt_model(type_name = answer)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub connection_id: Uuid,
    pub answer_text: Text,
    // serialized JSON
    pub answer_value: Option<Text>,
    pub time_spent: Option<Int>,
}
