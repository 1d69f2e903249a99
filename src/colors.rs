/// ANSI color codes for debug sink output
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub id: &'static str,        // Bold for the event id line
    pub name: &'static str,      // Cyan for field names
    pub equals: &'static str,    // White for = separator
    pub string: &'static str,    // Green for text-like values
    pub number: &'static str,    // Yellow for integers and floats
    pub timestamp: &'static str, // Blue for datetimes
    pub reset: &'static str,     // Reset to default color
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                id: "\x1b[1m",
                name: "\x1b[36m",
                equals: "\x1b[37m",
                string: "\x1b[32m",
                number: "\x1b[33m",
                timestamp: "\x1b[34m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                id: "",
                name: "",
                equals: "",
                string: "",
                number: "",
                timestamp: "",
                reset: "",
            }
        }
    }

    pub fn enabled(&self) -> bool {
        !self.reset.is_empty()
    }

    /// Color for a value of the given kind
    pub fn for_value(&self, value: &crate::event::Value) -> &'static str {
        use crate::event::Value;
        match value {
            Value::String(_) => self.string,
            Value::Integer(_) | Value::Float(_) => self.number,
            Value::Datetime(_) => self.timestamp,
        }
    }
}
