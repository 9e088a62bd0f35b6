use crate::core::connection::PortRef;
use crate::core::error::{CoreError, CoreResult};
use crate::core::model::Model;
use crate::core::port::{PortValue, Slots};
use std::collections::BTreeMap;

/// One cell of an external tabular record
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Number(f64),
}

impl ColumnValue {
    fn to_slot_value(&self) -> String {
        match self {
            ColumnValue::Text(text) => text.clone(),
            ColumnValue::Number(number) => number.to_string(),
        }
    }

    fn to_number(&self) -> CoreResult<f64> {
        match self {
            ColumnValue::Number(number) => Ok(*number),
            ColumnValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                CoreError::InvalidArgument(format!(
                    "Value '{}' cannot be coerced to a number",
                    text
                ))
            }),
        }
    }
}

/// One external record, column name to cell
pub type Record = BTreeMap<String, ColumnValue>;

#[derive(Debug, Clone)]
struct InputMapping {
    column: String,
    port: PortRef,
    rename: Option<String>,
}

#[derive(Debug, Clone)]
struct OutputMapping {
    column: String,
    port: PortRef,
    extract: Option<String>,
}

/// Boundary contract between the core and an external tabular runner
///
/// The binding maps named data columns onto model ports. The runner
/// owns the table itself, its file format and any batch/fit logic; per
/// record it calls `process_record`, which writes the mapped inputs,
/// runs the model to stability once and reads the mapped outputs back.
#[derive(Debug, Clone, Default)]
pub struct TableBinding {
    columns: Vec<String>,
    inputs: Vec<InputMapping>,
    outputs: Vec<OutputMapping>,
}

impl TableBinding {
    /// Declare the columns the external data source exposes
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Map a data column onto an input port
    ///
    /// `rename` overrides the slot name used when merging into a
    /// symbolic port; numeric ports ignore it. Fails when the column is
    /// not declared or the address does not resolve to an input port.
    pub fn connect_input(
        &mut self,
        column: &str,
        model: &Model,
        port: PortRef,
        rename: Option<&str>,
    ) -> CoreResult<()> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(CoreError::UnknownColumn(column.to_string()));
        }
        model.input_port(&port)?;
        self.inputs.push(InputMapping {
            column: column.to_string(),
            port,
            rename: rename.map(str::to_string),
        });
        Ok(())
    }

    /// Map an output port back onto a data column
    ///
    /// `extract` names the slot read out of a symbolic port's mapping;
    /// it defaults to the column name. Fails when the column is not
    /// declared or the address does not resolve to an output port.
    pub fn connect_output(
        &mut self,
        column: &str,
        model: &Model,
        port: PortRef,
        extract: Option<&str>,
    ) -> CoreResult<()> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(CoreError::UnknownColumn(column.to_string()));
        }
        model.output_port(&port)?;
        self.outputs.push(OutputMapping {
            column: column.to_string(),
            port,
            extract: extract.map(str::to_string),
        });
        Ok(())
    }

    /// Drive the model with one external record
    ///
    /// Writes every mapped input column into its port (string merge for
    /// symbolic ports, numeric coercion for numeric ports), runs the
    /// model to stability once, then returns a copy of the record with
    /// the mapped output columns filled in. A symbolic output whose
    /// extract slot is absent (a retrieval miss, say) leaves its column
    /// unchanged.
    pub fn process_record(&self, model: &mut Model, record: &Record) -> CoreResult<Record> {
        for mapping in &self.inputs {
            let value = record.get(&mapping.column).ok_or_else(|| {
                CoreError::UnknownColumn(format!(
                    "Record is missing mapped column '{}'",
                    mapping.column
                ))
            })?;
            let port = model.input_port_mut(&mapping.port)?;
            match port.value() {
                PortValue::Symbolic(_) => {
                    let slot = mapping
                        .rename
                        .clone()
                        .unwrap_or_else(|| mapping.column.clone());
                    let mut partial = Slots::new();
                    partial.insert(slot, value.to_slot_value());
                    port.modify(&partial)?;
                }
                PortValue::Numeric(_) => {
                    port.set_numeric(value.to_number()?)?;
                }
            }
        }

        model.run()?;

        let mut result = record.clone();
        for mapping in &self.outputs {
            let port = model.output_port(&mapping.port)?;
            match port.value() {
                PortValue::Symbolic(slots) => {
                    let slot = mapping.extract.as_deref().unwrap_or(&mapping.column);
                    if let Some(found) = slots.get(slot) {
                        result.insert(mapping.column.clone(), ColumnValue::Text(found.clone()));
                    }
                }
                PortValue::Numeric(number) => {
                    result.insert(mapping.column.clone(), ColumnValue::Number(*number));
                }
            }
        }
        Ok(result)
    }
}
