//! Env command: shell exports for the experimental environment

use std::collections::BTreeMap;

use crate::error::Result;
use crate::inspect;

use super::{Context, Outcome, print_json};

fn shell_quote(value: &str) -> String {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-:\\".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

pub fn run(ctx: &Context) -> Result<Outcome> {
    let vars = inspect::environment_variables(&ctx.config);
    if ctx.json {
        let map: BTreeMap<&str, &str> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        print_json(&map)?;
    } else {
        for (key, value) in &vars {
            println!("export {key}={}", shell_quote(value));
        }
    }
    Ok(Outcome::Success)
}
