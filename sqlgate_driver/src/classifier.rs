use crate::error::Result;
use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::Dialect;
use sqlparser::parser::Parser;
use std::fmt;
use tracing::debug;

/// Operation tag for a single parsed statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperationKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Truncate,
    Other(String),
}

impl OperationKind {
    /// The permission gate this operation falls under, or `None` when the
    /// operation is never gated.
    #[must_use]
    pub fn write_gate(&self) -> Option<WriteGate> {
        match self {
            OperationKind::Insert => Some(WriteGate::Insert),
            OperationKind::Update => Some(WriteGate::Update),
            OperationKind::Delete => Some(WriteGate::Delete),
            OperationKind::Create
            | OperationKind::Alter
            | OperationKind::Drop
            | OperationKind::Truncate => Some(WriteGate::Ddl),
            OperationKind::Select | OperationKind::Other(_) => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationKind::Select => write!(f, "select"),
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::Create => write!(f, "create"),
            OperationKind::Alter => write!(f, "alter"),
            OperationKind::Drop => write!(f, "drop"),
            OperationKind::Truncate => write!(f, "truncate"),
            OperationKind::Other(keyword) => write!(f, "{keyword}"),
        }
    }
}

/// The four gated operation groups; `create`, `alter`, `drop` and `truncate`
/// share the `Ddl` gate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteGate {
    Insert,
    Update,
    Delete,
    Ddl,
}

impl WriteGate {
    /// Gates in the order they are checked.
    pub const ALL: [WriteGate; 4] = [
        WriteGate::Insert,
        WriteGate::Update,
        WriteGate::Delete,
        WriteGate::Ddl,
    ];

    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            WriteGate::Insert => "INSERT",
            WriteGate::Update => "UPDATE",
            WriteGate::Delete => "DELETE",
            WriteGate::Ddl => "DDL",
        }
    }
}

/// Classifier output: one operation tag per statement plus the inferred
/// target schema, if any.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedStatements {
    pub kinds: Vec<OperationKind>,
    pub schema: Option<String>,
}

impl ParsedStatements {
    /// `true` when any statement falls under the given gate.
    #[must_use]
    pub fn requires(&self, gate: WriteGate) -> bool {
        self.kinds.iter().any(|kind| kind.write_gate() == Some(gate))
    }

    /// `true` when any statement is a gated write.
    #[must_use]
    pub fn has_writes(&self) -> bool {
        self.kinds.iter().any(|kind| kind.write_gate().is_some())
    }
}

/// Classifies a SQL string into per-statement operation tags and an inferred
/// target schema.
///
/// A configured `fixed_schema` wins over inference; otherwise the schema is
/// read from a `USE <schema>` clause or a `schema.table` reference in the
/// text. The textual inference is a best effort label, not AST-level schema
/// binding.
///
/// # Errors
/// if the SQL cannot be parsed into a statement list.
pub fn classify(
    dialect: &dyn Dialect,
    sql: &str,
    fixed_schema: Option<&str>,
) -> Result<ParsedStatements> {
    let statements = Parser::parse_sql(dialect, sql)?;
    let kinds: Vec<OperationKind> = statements.iter().map(operation_kind).collect();
    let schema = infer_schema(sql, fixed_schema)?;
    debug!("classified sql: kinds={kinds:?}, schema={schema:?}");
    Ok(ParsedStatements { kinds, schema })
}

fn operation_kind(statement: &Statement) -> OperationKind {
    match statement {
        Statement::Query(_) => OperationKind::Select,
        Statement::Insert(_) => OperationKind::Insert,
        Statement::Update { .. } => OperationKind::Update,
        Statement::Delete(_) => OperationKind::Delete,
        Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateView { .. }
        | Statement::CreateIndex(_)
        | Statement::CreateTable(_)
        | Statement::CreateSequence { .. } => OperationKind::Create,
        Statement::AlterTable { .. } | Statement::AlterIndex { .. } => OperationKind::Alter,
        Statement::Drop { .. } => OperationKind::Drop,
        Statement::Truncate { .. } => OperationKind::Truncate,
        statement => keyword_kind(statement),
    }
}

/// Fallback classification by leading keyword so statement forms without a
/// dedicated arm still land on the right gate.
fn keyword_kind(statement: &Statement) -> OperationKind {
    let rendered = statement.to_string();
    let keyword = rendered
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_lowercase();
    match keyword.as_str() {
        "insert" => OperationKind::Insert,
        "update" => OperationKind::Update,
        "delete" => OperationKind::Delete,
        "create" => OperationKind::Create,
        "alter" => OperationKind::Alter,
        "drop" => OperationKind::Drop,
        "truncate" => OperationKind::Truncate,
        _ => OperationKind::Other(keyword),
    }
}

fn infer_schema(sql: &str, fixed_schema: Option<&str>) -> Result<Option<String>> {
    if let Some(schema) = fixed_schema {
        return Ok(Some(schema.to_string()));
    }

    let use_statement = Regex::new(r"(?i)USE\s+`?([a-zA-Z0-9_]+)`?")?;
    if let Some(captures) = use_statement.captures(sql) {
        return Ok(captures.get(1).map(|capture| capture.as_str().to_string()));
    }

    let qualified_table = Regex::new(r"`?([a-zA-Z0-9_]+)`?\.`?[a-zA-Z0-9_]+`?")?;
    if let Some(captures) = qualified_table.captures(sql) {
        return Ok(captures.get(1).map(|capture| capture.as_str().to_string()));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use indoc::indoc;
    use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect};

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Select.to_string(), "select");
        assert_eq!(OperationKind::Insert.to_string(), "insert");
        assert_eq!(OperationKind::Update.to_string(), "update");
        assert_eq!(OperationKind::Delete.to_string(), "delete");
        assert_eq!(OperationKind::Create.to_string(), "create");
        assert_eq!(OperationKind::Alter.to_string(), "alter");
        assert_eq!(OperationKind::Drop.to_string(), "drop");
        assert_eq!(OperationKind::Truncate.to_string(), "truncate");
        assert_eq!(OperationKind::Other("use".to_string()).to_string(), "use");
    }

    #[test]
    fn test_write_gate_keyword() {
        assert_eq!(WriteGate::Insert.keyword(), "INSERT");
        assert_eq!(WriteGate::Update.keyword(), "UPDATE");
        assert_eq!(WriteGate::Delete.keyword(), "DELETE");
        assert_eq!(WriteGate::Ddl.keyword(), "DDL");
    }

    #[test]
    fn test_ddl_kinds_share_the_ddl_gate() {
        assert_eq!(OperationKind::Create.write_gate(), Some(WriteGate::Ddl));
        assert_eq!(OperationKind::Alter.write_gate(), Some(WriteGate::Ddl));
        assert_eq!(OperationKind::Drop.write_gate(), Some(WriteGate::Ddl));
        assert_eq!(OperationKind::Truncate.write_gate(), Some(WriteGate::Ddl));
    }

    #[test]
    fn test_ungated_kinds() {
        assert_eq!(OperationKind::Select.write_gate(), None);
        assert_eq!(OperationKind::Other("show".to_string()).write_gate(), None);
    }

    #[test]
    fn test_classify_select() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "SELECT 1", None)?;
        assert_eq!(parsed.kinds, vec![OperationKind::Select]);
        assert_eq!(parsed.schema, None);
        assert!(!parsed.has_writes());
        Ok(())
    }

    #[test]
    fn test_classify_insert() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "INSERT INTO users (id) VALUES (1)", None)?;
        assert_eq!(parsed.kinds, vec![OperationKind::Insert]);
        assert!(parsed.requires(WriteGate::Insert));
        assert!(!parsed.requires(WriteGate::Update));
        Ok(())
    }

    #[test]
    fn test_classify_update_and_delete() -> Result<()> {
        let parsed = classify(
            &MySqlDialect {},
            "UPDATE users SET name = 'a'; DELETE FROM users WHERE id = 1;",
            None,
        )?;
        assert_eq!(
            parsed.kinds,
            vec![OperationKind::Update, OperationKind::Delete]
        );
        assert!(parsed.requires(WriteGate::Update));
        assert!(parsed.requires(WriteGate::Delete));
        assert!(!parsed.requires(WriteGate::Ddl));
        Ok(())
    }

    #[test]
    fn test_classify_ddl_statements() -> Result<()> {
        let sql = indoc! {r"
            CREATE TABLE users (id INT);
            ALTER TABLE users ADD COLUMN name VARCHAR(50);
            TRUNCATE TABLE users;
            DROP TABLE users;
        "};
        let parsed = classify(&MySqlDialect {}, sql, None)?;
        assert_eq!(
            parsed.kinds,
            vec![
                OperationKind::Create,
                OperationKind::Alter,
                OperationKind::Truncate,
                OperationKind::Drop,
            ]
        );
        assert!(parsed.requires(WriteGate::Ddl));
        Ok(())
    }

    #[test]
    fn test_classify_use_statement() -> Result<()> {
        let parsed = classify(
            &MySqlDialect {},
            "USE analytics; INSERT INTO events (id) VALUES (1);",
            None,
        )?;
        assert_eq!(
            parsed.kinds,
            vec![
                OperationKind::Other("use".to_string()),
                OperationKind::Insert,
            ]
        );
        assert_eq!(parsed.schema, Some("analytics".to_string()));
        Ok(())
    }

    #[test]
    fn test_classify_show_is_ungated() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "SHOW TABLES", None)?;
        assert_eq!(parsed.kinds, vec![OperationKind::Other("show".to_string())]);
        assert!(!parsed.has_writes());
        Ok(())
    }

    #[test]
    fn test_classify_create_role_lands_on_ddl_gate() -> Result<()> {
        let parsed = classify(&PostgreSqlDialect {}, "CREATE ROLE admin", None)?;
        assert_eq!(parsed.kinds, vec![OperationKind::Create]);
        assert!(parsed.requires(WriteGate::Ddl));
        Ok(())
    }

    #[test]
    fn test_classify_parse_error() {
        let result = classify(&MySqlDialect {}, "SELEC * FORM users", None);
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn test_classify_postgresql_dialect() -> Result<()> {
        let parsed = classify(
            &PostgreSqlDialect {},
            "SELECT * FROM users WHERE tags @> ARRAY['a']",
            None,
        )?;
        assert_eq!(parsed.kinds, vec![OperationKind::Select]);
        Ok(())
    }

    #[test]
    fn test_fixed_schema_wins_over_use() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "USE analytics; SELECT 1;", Some("main"))?;
        assert_eq!(parsed.schema, Some("main".to_string()));
        Ok(())
    }

    #[test]
    fn test_use_wins_over_qualified_table() -> Result<()> {
        let parsed = classify(
            &MySqlDialect {},
            "USE analytics; SELECT * FROM reporting.events;",
            None,
        )?;
        assert_eq!(parsed.schema, Some("analytics".to_string()));
        Ok(())
    }

    #[test]
    fn test_schema_from_qualified_table() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "SELECT * FROM reporting.events", None)?;
        assert_eq!(parsed.schema, Some("reporting".to_string()));
        Ok(())
    }

    #[test]
    fn test_schema_from_backticked_qualified_table() -> Result<()> {
        let parsed = classify(
            &MySqlDialect {},
            "SELECT * FROM `reporting`.`events`",
            None,
        )?;
        assert_eq!(parsed.schema, Some("reporting".to_string()));
        Ok(())
    }

    #[test]
    fn test_no_schema_inferred() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "SELECT * FROM users", None)?;
        assert_eq!(parsed.schema, None);
        Ok(())
    }

    #[test]
    fn test_classify_empty_sql() -> Result<()> {
        let parsed = classify(&MySqlDialect {}, "", None)?;
        assert!(parsed.kinds.is_empty());
        assert!(!parsed.has_writes());
        Ok(())
    }
}
