use serde_json::Value;

/// Reads an integer the way a loosely typed planner might have written one: a JSON
/// integer, a whole float, or a string holding an integer.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) enum DependencyList {
    Parsed {
        deps: Vec<i64>,
        rejected: Vec<Value>,
    },
    Invalid,
}

/// Missing or null means no dependencies. A lone scalar is read as a one-element list.
pub(crate) fn coerce_dependencies(value: Option<&Value>) -> DependencyList {
    let items = match value {
        None | Some(Value::Null) => return DependencyList::Parsed {
            deps: Vec::new(),
            rejected: Vec::new(),
        },
        Some(Value::Array(items)) => items.as_slice(),
        Some(scalar @ (Value::Number(_) | Value::String(_))) => std::slice::from_ref(scalar),
        Some(_) => return DependencyList::Invalid,
    };

    let mut deps = Vec::<i64>::new();
    let mut rejected = Vec::<Value>::new();
    for item in items {
        match coerce_int(item) {
            Some(dep) => {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
            None => rejected.push(item.clone()),
        }
    }
    DependencyList::Parsed { deps, rejected }
}

#[cfg(test)]
#[path = "coerce_test.rs"]
mod tests;
