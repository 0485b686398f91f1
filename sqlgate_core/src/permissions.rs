use sqlgate_driver::WriteGate;
use std::collections::HashMap;

/// Allow table for one write gate: a global default plus per-schema overrides.
#[derive(Clone, Debug, Default)]
pub struct SchemaPermissions {
    default_allowed: bool,
    overrides: HashMap<String, bool>,
}

impl SchemaPermissions {
    pub fn new(default_allowed: bool, overrides: HashMap<String, bool>) -> Self {
        Self {
            default_allowed,
            overrides,
        }
    }

    /// An override for the schema wins; otherwise the global default applies.
    /// A statement with no resolved schema is judged by the global default.
    pub fn is_allowed(&self, schema: Option<&str>) -> bool {
        match schema {
            Some(schema) => self
                .overrides
                .get(schema)
                .copied()
                .unwrap_or(self.default_allowed),
            None => self.default_allowed,
        }
    }
}

/// Permission oracle: one allow table per write gate. Built once from the
/// environment and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct PermissionTable {
    insert: SchemaPermissions,
    update: SchemaPermissions,
    delete: SchemaPermissions,
    ddl: SchemaPermissions,
}

impl PermissionTable {
    pub fn new(
        insert: SchemaPermissions,
        update: SchemaPermissions,
        delete: SchemaPermissions,
        ddl: SchemaPermissions,
    ) -> Self {
        Self {
            insert,
            update,
            delete,
            ddl,
        }
    }

    pub fn is_allowed(&self, gate: WriteGate, schema: Option<&str>) -> bool {
        self.table(gate).is_allowed(schema)
    }

    fn table(&self, gate: WriteGate) -> &SchemaPermissions {
        match gate {
            WriteGate::Insert => &self.insert,
            WriteGate::Update => &self.update,
            WriteGate::Delete => &self.delete,
            WriteGate::Ddl => &self.ddl,
        }
    }

    pub(crate) fn from_environment(environment: &HashMap<String, String>) -> Self {
        Self {
            insert: gate_permissions(environment, WriteGate::Insert),
            update: gate_permissions(environment, WriteGate::Update),
            delete: gate_permissions(environment, WriteGate::Delete),
            ddl: gate_permissions(environment, WriteGate::Ddl),
        }
    }
}

fn gate_permissions(environment: &HashMap<String, String>, gate: WriteGate) -> SchemaPermissions {
    let keyword = gate.keyword();
    let default_allowed = environment
        .get(&format!("ALLOW_{keyword}_OPERATION"))
        .is_some_and(|value| value == "true");
    let overrides = environment
        .get(&format!("SCHEMA_{keyword}_PERMISSIONS"))
        .map(|value| parse_schema_permissions(value))
        .unwrap_or_default();
    SchemaPermissions::new(default_allowed, overrides)
}

/// Parses a comma-separated `schema:true|false` list. Entries are trimmed and
/// malformed pairs are skipped.
pub fn parse_schema_permissions(value: &str) -> HashMap<String, bool> {
    let mut permissions = HashMap::new();
    for entry in value.split(',') {
        let Some((schema, allowed)) = entry.split_once(':') else {
            continue;
        };
        let schema = schema.trim();
        if schema.is_empty() {
            continue;
        }
        permissions.insert(schema.to_string(), allowed.trim() == "true");
    }
    permissions
}
