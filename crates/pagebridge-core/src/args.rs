//! Translation of an option mapping into emulator CLI arguments.

use crate::options::OptionValue;

/// Convert an ordered option mapping into CLI arguments for the emulator.
///
/// Rules, applied per option in mapping order:
///
/// - option names are converted from mixed case to hyphenated lower case
/// - `Bool(true)` emits a single bare `--flag`; `Bool(false)` emits nothing
/// - `List` emits one `--flag=item` per element, preserving order
/// - `Map` emits one `--flag=key=value` per entry, preserving order
/// - a non-empty `Str` emits `--flag=value`; the empty string emits nothing
pub fn to_cli_args(mapping: &[(String, OptionValue)]) -> Vec<String> {
    let mut args = Vec::new();

    for (name, value) in mapping {
        let flag = kebab_case(name);
        match value {
            OptionValue::Bool(true) => args.push(format!("--{flag}")),
            OptionValue::Bool(false) => {}
            OptionValue::Str(s) if s.is_empty() => {}
            OptionValue::Str(s) => args.push(format!("--{flag}={s}")),
            OptionValue::List(items) => {
                args.extend(items.iter().map(|item| format!("--{flag}={item}")));
            }
            OptionValue::Map(entries) => {
                args.extend(entries.iter().map(|(key, value)| format!("--{flag}={key}={value}")));
            }
        }
    }

    args
}

/// Lower-case a mixed-case option name, inserting a hyphen at each
/// lowercase-to-uppercase boundary (`compatibilityDate` -> `compatibility-date`).
fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('-');
        }
        prev_lower = ch.is_ascii_lowercase();
        out.push(ch.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn mapping(pairs: Vec<(&str, OptionValue)>) -> Vec<(String, OptionValue)> {
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    #[test]
    fn kebab_case_splits_lower_upper_boundaries() {
        assert_eq!(kebab_case("compatibilityDate"), "compatibility-date");
        assert_eq!(kebab_case("logLevel"), "log-level");
        assert_eq!(kebab_case("kv"), "kv");
        assert_eq!(kebab_case("d1"), "d1");
    }

    #[test]
    fn bool_true_emits_bare_flag_false_emits_nothing() {
        let args = to_cli_args(&mapping(vec![
            ("localProtocol", OptionValue::Bool(true)),
            ("liveReload", OptionValue::Bool(false)),
        ]));
        assert_eq!(args, ["--local-protocol"]);
    }

    #[test]
    fn empty_scalar_emits_nothing() {
        let args = to_cli_args(&mapping(vec![(
            "compatibilityDate",
            OptionValue::Str(String::new()),
        )]));
        assert!(args.is_empty());
    }

    #[test]
    fn list_emits_one_argument_per_element_in_order() {
        let args = to_cli_args(&mapping(vec![(
            "kv",
            OptionValue::List(vec!["SESSIONS".to_string(), "CACHE".to_string()]),
        )]));
        assert_eq!(args, ["--kv=SESSIONS", "--kv=CACHE"]);
    }

    #[test]
    fn map_emits_key_value_pairs_in_order() {
        let mut bindings = IndexMap::new();
        bindings.insert("API_KEY".to_string(), "secret".to_string());
        bindings.insert("MODE".to_string(), "dev".to_string());

        let args = to_cli_args(&mapping(vec![("binding", OptionValue::Map(bindings))]));
        assert_eq!(args, ["--binding=API_KEY=secret", "--binding=MODE=dev"]);
    }

    #[test]
    fn output_preserves_mapping_order() {
        let args = to_cli_args(&mapping(vec![
            ("logLevel", OptionValue::Str("warn".to_string())),
            ("compatibilityFlag", OptionValue::List(vec!["nodejs_compat".to_string()])),
            ("compatibilityDate", OptionValue::Str("2024-01-01".to_string())),
        ]));
        assert_eq!(
            args,
            [
                "--log-level=warn",
                "--compatibility-flag=nodejs_compat",
                "--compatibility-date=2024-01-01",
            ]
        );
    }
}
