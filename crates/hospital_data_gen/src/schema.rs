//! Schema model for the operational (RDBMS) tables.
//!
//! Describes tables, columns, keys and relationships, and renders them as
//! DDL that DuckDB (and other ANSI-leaning engines) accept.

use std::collections::HashMap;
use std::fmt::Write as _;

/// SQL data types
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    /// Variable-length string
    VarChar(u16),
    /// Fixed-length string
    Char(u16),
    /// Decimal with precision and scale
    Decimal(u8, u8),
    /// Timestamp without time zone
    Timestamp,
    /// Date only
    Date,
}

impl SqlType {
    pub fn to_sql(&self) -> String {
        match self {
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::VarChar(n) => format!("VARCHAR({})", n),
            SqlType::Char(n) => format!("CHAR({})", n),
            SqlType::Decimal(p, s) => format!("DECIMAL({},{})", p, s),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Date => "DATE".to_string(),
        }
    }
}

/// Foreign key constraint
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub to_table: String,
    pub to_column: String,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub check: Option<String>,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
            check: None,
            foreign_key: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Column-level CHECK expression
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            to_table: table.into(),
            to_column: column.into(),
        });
        self.not_null = true;
        self
    }

    fn to_sql(&self) -> String {
        let mut def = format!("{} {}", self.name, self.sql_type.to_sql());
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(ref expr) = self.check {
            let _ = write!(def, " CHECK ({})", expr);
        }
        if let Some(ref fk) = self.foreign_key {
            let _ = write!(def, " REFERENCES {}({})", fk.to_table, fk.to_column);
        }
        def
    }
}

/// Table definition
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        self.columns.push(col);
        self
    }

    /// Get all foreign key relationships
    pub fn foreign_keys(&self) -> Vec<(&str, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c.name.as_str(), fk)))
            .collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn create_statement(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.to_sql()))
            .collect();
        format!("CREATE TABLE {} (\n{}\n);", self.name, cols.join(",\n"))
    }
}

/// Complete schema definition
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Vec<Table>,
    table_index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        let idx = self.tables.len();
        self.table_index.insert(table.name.clone(), idx);
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_index.get(name).map(|&idx| &self.tables[idx])
    }

    /// Get tables in topological order (dependencies first)
    pub fn tables_in_order(&self) -> Vec<&Table> {
        let mut visited = vec![false; self.tables.len()];
        let mut result = Vec::with_capacity(self.tables.len());

        fn visit<'a>(
            idx: usize,
            tables: &'a [Table],
            table_index: &HashMap<String, usize>,
            visited: &mut [bool],
            result: &mut Vec<&'a Table>,
        ) {
            if visited[idx] {
                return;
            }
            visited[idx] = true;

            for (_, fk) in tables[idx].foreign_keys() {
                if let Some(&dep_idx) = table_index.get(&fk.to_table) {
                    visit(dep_idx, tables, table_index, visited, result);
                }
            }

            result.push(&tables[idx]);
        }

        for idx in 0..self.tables.len() {
            visit(
                idx,
                &self.tables,
                &self.table_index,
                &mut visited,
                &mut result,
            );
        }

        result
    }

    /// DROP (children first) then CREATE (parents first), so a rerun starts clean
    pub fn render_ddl(&self) -> String {
        let ordered = self.tables_in_order();
        let mut out = String::from("-- Operational schema\n");

        for table in ordered.iter().rev() {
            let _ = writeln!(out, "DROP TABLE IF EXISTS {};", table.name);
        }
        out.push('\n');
        for table in &ordered {
            out.push_str(&table.create_statement());
            out.push_str("\n\n");
        }
        out
    }
}

/// The operational hospital schema the generated data loads into
pub fn hospital_schema() -> Schema {
    use SqlType::*;

    Schema::new()
        .table(
            Table::new("specialties")
                .column(Column::new("specialty_id", Integer).primary_key())
                .column(Column::new("specialty_name", VarChar(100)).not_null())
                .column(Column::new("specialty_code", VarChar(10)).not_null()),
        )
        .table(
            Table::new("departments")
                .column(Column::new("department_id", Integer).primary_key())
                .column(Column::new("department_name", VarChar(100)).not_null())
                .column(Column::new("floor", Integer))
                .column(Column::new("capacity", Integer).check("capacity >= 0")),
        )
        .table(
            Table::new("providers")
                .column(Column::new("provider_id", Integer).primary_key())
                .column(Column::new("first_name", VarChar(100)).not_null())
                .column(Column::new("last_name", VarChar(100)).not_null())
                .column(Column::new("credential", VarChar(20)))
                .column(
                    Column::new("specialty_id", Integer).references("specialties", "specialty_id"),
                )
                .column(
                    Column::new("department_id", Integer)
                        .references("departments", "department_id"),
                ),
        )
        .table(
            Table::new("patients")
                .column(Column::new("patient_id", Integer).primary_key())
                .column(Column::new("first_name", VarChar(100)).not_null())
                .column(Column::new("last_name", VarChar(100)).not_null())
                .column(Column::new("date_of_birth", Date).not_null())
                .column(Column::new("gender", Char(1)).check("gender IN ('M', 'F')"))
                .column(Column::new("mrn", VarChar(20)).not_null().unique()),
        )
        .table(
            Table::new("diagnoses")
                .column(Column::new("diagnosis_id", Integer).primary_key())
                .column(Column::new("icd10_code", VarChar(10)).not_null())
                .column(Column::new("icd10_description", VarChar(200))),
        )
        .table(
            Table::new("procedures")
                .column(Column::new("procedure_id", Integer).primary_key())
                .column(Column::new("cpt_code", VarChar(10)).not_null())
                .column(Column::new("cpt_description", VarChar(200))),
        )
        .table(
            Table::new("encounters")
                .column(Column::new("encounter_id", Integer).primary_key())
                .column(Column::new("patient_id", Integer).references("patients", "patient_id"))
                .column(Column::new("provider_id", Integer).references("providers", "provider_id"))
                .column(
                    Column::new("encounter_type", VarChar(20))
                        .not_null()
                        .check("encounter_type IN ('Outpatient', 'Inpatient', 'ER')"),
                )
                .column(Column::new("encounter_date", Timestamp).not_null())
                .column(Column::new("discharge_date", Timestamp))
                .column(
                    Column::new("department_id", Integer)
                        .references("departments", "department_id"),
                ),
        )
        .table(
            Table::new("encounter_diagnoses")
                .column(Column::new("encounter_diagnosis_id", Integer).primary_key())
                .column(
                    Column::new("encounter_id", Integer).references("encounters", "encounter_id"),
                )
                .column(
                    Column::new("diagnosis_id", Integer).references("diagnoses", "diagnosis_id"),
                )
                .column(
                    Column::new("diagnosis_sequence", Integer)
                        .not_null()
                        .check("diagnosis_sequence >= 1"),
                ),
        )
        .table(
            Table::new("encounter_procedures")
                .column(Column::new("encounter_procedure_id", Integer).primary_key())
                .column(
                    Column::new("encounter_id", Integer).references("encounters", "encounter_id"),
                )
                .column(
                    Column::new("procedure_id", Integer).references("procedures", "procedure_id"),
                )
                .column(Column::new("procedure_date", Date)),
        )
        .table(
            Table::new("billing")
                .column(Column::new("billing_id", Integer).primary_key())
                .column(
                    Column::new("encounter_id", Integer)
                        .unique()
                        .references("encounters", "encounter_id"),
                )
                .column(
                    Column::new("claim_amount", Decimal(12, 2))
                        .not_null()
                        .check("claim_amount >= 0"),
                )
                .column(
                    Column::new("allowed_amount", Decimal(12, 2))
                        .not_null()
                        .check("allowed_amount >= 0"),
                )
                .column(Column::new("claim_date", Date))
                .column(
                    Column::new("claim_status", VarChar(20))
                        .check("claim_status IN ('Paid', 'Pending', 'Denied')"),
                ),
        )
}
