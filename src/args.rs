use std::collections::HashMap;

use anyhow::{bail, Result};

/// Record the option at `args[i]`, reading its value from `--key=value` or
/// from the following argument. Returns the index of the next unread arg.
fn process_option(
    prefix: &str,
    args: &[String],
    i: usize,
    options: &mut HashMap<String, String>,
) -> Result<usize> {
    let arg = &args[i];
    let body = arg.trim_start_matches(prefix);

    if let Some((key, value)) = body.split_once('=') {
        if key.is_empty() {
            bail!("Invalid option: {}", arg);
        }
        options.insert(key.to_string(), value.to_string());
        return Ok(i + 1);
    }

    if body.is_empty() {
        bail!("Invalid option: {}", arg);
    }

    match args.get(i + 1) {
        Some(value) if !value.starts_with('-') || value == "-" => {
            options.insert(body.to_string(), value.clone());
            Ok(i + 2)
        }
        _ => bail!("Option {} requires a value", arg),
    }
}

/// Collect `-k value`, `--key value` and `--key=value` options.
///
/// Positional arguments are skipped; `--` ends option parsing. When an
/// option repeats, the last value wins.
pub fn parse_args(args: &[String]) -> Result<HashMap<String, String>> {
    let mut options = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "--" {
            break;
        }

        i = if arg.starts_with("--") {
            process_option("--", args, i, &mut options)?
        } else if arg.starts_with('-') && arg.len() > 1 {
            process_option("-", args, i, &mut options)?
        } else {
            i + 1
        };
    }

    Ok(options)
}
