// src/filters/script.rs - Starlark expression filter
use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use crate::pipeline::context::FilterResult;
use crate::pipeline::stream::{Filter, Stage};
use starlark::collections::SmallMap;
use starlark::environment::{Globals, GlobalsBuilder, Module};
use starlark::eval::Evaluator;
use starlark::syntax::{AstModule, Dialect};
use starlark::values::dict::Dict;
use starlark::values::{Heap, Value};

/// Keeps events for which a Starlark expression is truthy.
///
/// The expression sees `message`, `origin`, `source` and `id` (strings, or
/// `None` when absent) plus `fields`, a dict of every non-reserved field name
/// to its stringified value.
pub struct ScriptFilter {
    globals: Globals,
    expression: String,
}

impl ScriptFilter {
    pub fn new() -> Self {
        ScriptFilter {
            globals: GlobalsBuilder::standard().build(),
            expression: String::new(),
        }
    }

    /// Filter for `expression`, checking its syntax up front
    pub fn from_expression(expression: &str) -> Result<Self, BuildError> {
        AstModule::parse("expression", expression.to_string(), &dialect())?;
        Ok(ScriptFilter {
            expression: expression.to_string(),
            ..Self::new()
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    fn matches(&self, event: &Event) -> anyhow::Result<bool> {
        let module = Module::new();
        let heap = module.heap();

        module.set("message", optional_str(heap, event.message().ok()));
        module.set("origin", optional_str(heap, event.origin().ok()));
        module.set("source", optional_str(heap, event.source().ok()));
        module.set("id", optional_str(heap, event.id()));

        let mut content = SmallMap::new();
        for (field, value) in event.fields() {
            let key = heap.alloc(field.name());
            content.insert_hashed(
                key.get_hashed().map_err(|e| anyhow::anyhow!("{}", e))?,
                heap.alloc(value.stringify()),
            );
        }
        module.set("fields", heap.alloc(Dict::new(content)));

        let ast = AstModule::parse("expression", self.expression.clone(), &dialect())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let mut eval = Evaluator::new(&module);
        let result = eval
            .eval_module(ast, &self.globals)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(result.to_bool())
    }
}

impl Default for ScriptFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn dialect() -> Dialect {
    Dialect {
        enable_f_strings: true,
        ..Dialect::Extended
    }
}

fn optional_str<'v>(heap: &'v Heap, value: Option<&str>) -> Value<'v> {
    match value {
        Some(s) => heap.alloc(s),
        None => Value::new_none(),
    }
}

impl Stage for ScriptFilter {
    fn name(&self) -> &str {
        "script_filter"
    }

    fn describe(&self) -> String {
        format!("script_filter(expression={:?})", self.expression)
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        let expression = section.get_string("expression").ok_or_else(|| {
            BuildError::ConfigError(format!("[{}] requires an 'expression' parameter", section.name()))
        })?;
        AstModule::parse("expression", expression.to_string(), &dialect())?;
        self.expression = expression.to_string();
        Ok(())
    }
}

impl Filter for ScriptFilter {
    fn filter(&mut self, event: Event) -> Result<FilterResult, ProcessingError> {
        match self.matches(&event) {
            Ok(true) => Ok(FilterResult::Pass(event)),
            Ok(false) => Ok(FilterResult::drop("rejected by expression")),
            Err(source) => Err(ProcessingError::ScriptError {
                stage: self.name().to_string(),
                source,
            }),
        }
    }
}
