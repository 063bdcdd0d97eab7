use serde::{Deserialize, Serialize};

/// Selectable field offered by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stable name stored in conditions.
    pub name: String,
    /// Display label shown in selectors.
    pub label: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Closed, ordered list of fields a condition may reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<FieldSpec>,
}

impl FieldCatalog {
    /// Builds a catalog, keeping the first entry when a name repeats.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let mut catalog = Self::default();
        for field in fields {
            if !catalog.contains(&field.name) {
                catalog.fields.push(field);
            }
        }
        catalog
    }

    /// Metric fields available when the host does not supply its own catalog.
    pub fn builtin() -> Self {
        Self::new(vec![
            FieldSpec::new("cpu", "CPU usage (%)"),
            FieldSpec::new("mem", "Memory usage (%)"),
            FieldSpec::new("disk", "Disk usage (%)"),
            FieldSpec::new("load", "Load average"),
            FieldSpec::new("error_rate", "Error rate"),
            FieldSpec::new("latency_ms", "Latency (ms)"),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Display label for `name`, or the name itself when it is not in the catalog.
    pub fn label_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map_or(name, |field| field.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
