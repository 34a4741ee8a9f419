use serde_json::{json, Value};

/// One argument slot of an operation. Every declared field is a JSON string;
/// the store owns any richer typing.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// One entry of the operation catalog: the shape the model is allowed to
/// propose. The catalog is the single source of truth for which operations
/// exist; nothing outside it is ever dispatched.
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

const USER_ID: FieldSpec = FieldSpec {
    name: "user_id",
    required: true,
    description: "Opaque id of an existing user record",
};

const NAME: FieldSpec = FieldSpec {
    name: "name",
    required: true,
    description: "Full display name of the user",
};

const EMAIL: FieldSpec = FieldSpec {
    name: "email",
    required: true,
    description: "Email address of the user",
};

const ROLE: FieldSpec = FieldSpec {
    name: "role",
    required: true,
    description: "Role assigned to the user, e.g. 'user' or 'admin'",
};

/// The fixed five-operation catalog. Built into the binary, immutable for the
/// process lifetime.
pub const CATALOG: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "create_user",
        description: "Create a new user record with a server-generated id",
        fields: &[NAME, EMAIL, ROLE],
    },
    OperationDescriptor {
        name: "get_user",
        description: "Fetch a single user record by id",
        fields: &[USER_ID],
    },
    OperationDescriptor {
        name: "get_users",
        description: "List every user record in the store",
        fields: &[],
    },
    OperationDescriptor {
        name: "update_user",
        description: "Fully replace the fields of an existing user record",
        fields: &[USER_ID, NAME, EMAIL, ROLE],
    },
    OperationDescriptor {
        name: "delete_user",
        description: "Delete a user record by id",
        fields: &[USER_ID],
    },
];

pub fn descriptor(name: &str) -> Option<&'static OperationDescriptor> {
    CATALOG.iter().find(|entry| entry.name == name)
}

impl OperationDescriptor {
    /// JSON schema of the argument object, in the shape the model service
    /// expects for a function tool.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({ "type": "string", "description": field.description }),
            );
            if field.required {
                required.push(field.name);
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
