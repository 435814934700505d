use std::fmt;

use crate::function::{BindingDirection, FunctionConfiguration};

/// Structural check of a single `function.json` before it is written.
pub trait ConfigurationValidator {
    /// Returns every problem found; an empty list means the configuration is valid.
    fn validate(&self, config: &FunctionConfiguration) -> Vec<String>;
}

/// Problems found in one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub function: String,
    pub problems: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.function, self.problems.join("; "))
    }
}

/// Rules enforced by the functions host when it indexes `function.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

const MAX_NAME_LEN: usize = 128;

impl ConfigurationValidator for DefaultValidator {
    fn validate(&self, config: &FunctionConfiguration) -> Vec<String> {
        let mut problems = Vec::new();

        if !is_valid_function_name(&config.name) {
            problems.push(format!(
                "function name '{}' must start with a letter and contain only letters, digits, '_' or '-' (max {MAX_NAME_LEN})",
                config.name
            ));
        }
        if config.script_file.trim().is_empty() {
            problems.push("scriptFile is empty".to_owned());
        }
        if !config.entry_point.contains('.') {
            problems.push(format!(
                "entryPoint '{}' is not a fully qualified method",
                config.entry_point
            ));
        }

        let triggers: Vec<_> = config
            .bindings
            .iter()
            .filter(|b| b.kind.is_trigger())
            .collect();
        match triggers.len() {
            0 => problems.push("no trigger binding".to_owned()),
            1 => {
                if triggers[0].direction != BindingDirection::In {
                    problems.push(format!(
                        "trigger binding '{}' must have direction 'in'",
                        triggers[0].name
                    ));
                }
            }
            n => problems.push(format!("{n} trigger bindings, expected exactly one")),
        }

        for binding in &config.bindings {
            if binding.name.trim().is_empty() {
                problems.push(format!("{} binding has no name", binding.kind));
            }
        }

        problems
    }
}

fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_NAME_LEN
        && first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validate all configurations, collecting problems for every function.
pub fn validate_all<V: ConfigurationValidator + ?Sized>(
    validator: &V,
    configs: &[FunctionConfiguration],
) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = configs
        .iter()
        .filter_map(|config| {
            let problems = validator.validate(config);
            (!problems.is_empty()).then(|| ValidationError {
                function: config.name.clone(),
                problems,
            })
        })
        .collect();

    let mut seen = std::collections::HashSet::new();
    for config in configs {
        if !seen.insert(config.name.to_ascii_lowercase()) {
            errors.push(ValidationError {
                function: config.name.clone(),
                problems: vec!["duplicate function name".to_owned()],
            });
        }
    }

    errors
}
