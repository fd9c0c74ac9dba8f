//! Append-only field output.

use crate::field::Field;

/// Collects fields and the regions used for reconciliation
#[derive(Debug, Default, Clone)]
pub struct FieldSink {
    fields: Vec<Field>,
    regions: Vec<(usize, usize)>,
}

impl FieldSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field; zero-length fields are dropped
    pub fn emit(&mut self, field: Field) {
        if field.length > 0 {
            self.fields.push(field);
        }
    }

    /// Records a tagged region for reconciliation
    pub fn mark_region(&mut self, start: usize, end: usize) {
        if end > start {
            self.regions.push((start, end));
        }
    }

    /// Fields emitted so far
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Regions recorded so far
    pub fn regions(&self) -> &[(usize, usize)] {
        &self.regions
    }

    /// Splits the sink into its fields and regions
    pub fn into_parts(self) -> (Vec<Field>, Vec<(usize, usize)>) {
        (self.fields, self.regions)
    }
}
