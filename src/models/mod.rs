use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod book;
pub mod review;
pub mod user;

/// A 12-byte document identifier, exposed as its 24-character hex string at
/// the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GqlObjectId(pub ObjectId);

#[Scalar(name = "ObjectId")]
impl ScalarType for GqlObjectId {
    fn parse(value: Value) -> InputValueResult<Self> {
        if let Value::String(hex) = &value {
            if let Ok(id) = ObjectId::parse_str(hex) {
                return Ok(GqlObjectId(id));
            }
        }

        Err(InputValueError::expected_type(value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_hex())
    }
}

impl From<ObjectId> for GqlObjectId {
    fn from(id: ObjectId) -> Self {
        GqlObjectId(id)
    }
}

impl GqlObjectId {
    pub fn hex(&self) -> String {
        self.0.to_hex()
    }
}
